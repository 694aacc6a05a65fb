//! Top-down projection of a point batch onto an 8-bit pixel surface.
//!
//! Sensor-forward maps to screen-up and sensor-left to screen-right; the
//! vertical component is discarded. The vehicle origin sits at 50% of the
//! width and 80% of the height so most of the frame shows what is ahead of
//! the sensor. Every render is a full clear-and-redraw.

use crate::decode::Point3D;

/// Visible radius of the projection in metres.
pub const DEFAULT_MAX_RANGE_M: f32 = 50.0;

/// Radius of the vehicle marker in pixels.
const VEHICLE_MARKER_RADIUS: i32 = 4;

/// Grayscale palette. Rings stay dim so the point field reads clearly,
/// and the vehicle marker is the brightest thing on screen.
pub const BACKGROUND: u8 = 0x00;
pub const RING: u8 = 0x33;
pub const POINT: u8 = 0xb4;
pub const VEHICLE: u8 = 0xff;

/// Fixed-size grayscale pixel buffer, row-major, one byte per pixel.
///
/// Recreate the surface when the presentation area resizes; it is not
/// persisted across frames in any other way.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl RasterSurface {
    pub fn new(width: usize, height: usize) -> Self {
        RasterSurface {
            width,
            height,
            data: vec![BACKGROUND; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major pixel data, suitable for `Image::from_l8`.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u8> {
        if x < self.width && y < self.height {
            Some(self.data[y * self.width + x])
        } else {
            None
        }
    }

    fn clear(&mut self) {
        self.data.fill(BACKGROUND);
    }

    /// Write one pixel if it lies strictly inside the surface.
    fn put(&mut self, x: i32, y: i32, value: u8) {
        if x >= 0 && (x as usize) < self.width && y >= 0 && (y as usize) < self.height {
            self.data[y as usize * self.width + x as usize] = value;
        }
    }

    /// Filled disc, clipped to the surface.
    fn fill_circle(&mut self, cx: i32, cy: i32, radius: i32, value: u8) {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius * radius {
                    self.put(cx + dx, cy + dy, value);
                }
            }
        }
    }

    /// One-pixel circle outline via the midpoint algorithm, clipped.
    fn stroke_circle(&mut self, cx: i32, cy: i32, radius: i32, value: u8) {
        if radius <= 0 {
            return;
        }
        let mut x = radius;
        let mut y = 0;
        let mut err = 1 - radius;
        while x >= y {
            for (px, py) in [
                (cx + x, cy + y),
                (cx - x, cy + y),
                (cx + x, cy - y),
                (cx - x, cy - y),
                (cx + y, cy + x),
                (cx - y, cy + x),
                (cx + y, cy - x),
                (cx - y, cy - x),
            ] {
                self.put(px, py, value);
            }
            y += 1;
            if err < 0 {
                err += 2 * y + 1;
            } else {
                x -= 1;
                err += 2 * (y - x) + 1;
            }
        }
    }
}

/// Render a point batch as a top-down scatter with origin marker and
/// 10-metre range rings. Deterministic for identical inputs and dimensions.
pub fn render(points: &[Point3D], surface: &mut RasterSurface, max_range_m: f32) {
    let w = surface.width();
    let h = surface.height();
    if w == 0 || h == 0 {
        return;
    }

    surface.clear();

    // Origin biased toward the bottom of the frame, forward-facing sensor.
    let origin_x = w as f32 * 0.5;
    let origin_y = h as f32 * 0.8;
    let px_per_m = w.min(h) as f32 / (2.0 * max_range_m);

    // Vehicle marker first so dense point fields paint over it consistently.
    surface.fill_circle(
        origin_x as i32,
        origin_y as i32,
        VEHICLE_MARKER_RADIUS,
        VEHICLE,
    );

    for p in points {
        // Forward (x) goes up the screen, left (y) goes right; z is dropped.
        let sx = (origin_x + p.y * px_per_m).round() as i64;
        let sy = (origin_y - p.x * px_per_m).round() as i64;
        if sx >= 0 && (sx as usize) < w && sy >= 0 && (sy as usize) < h {
            surface.put(sx as i32, sy as i32, POINT);
        }
    }

    // Rings last so the range grid stays visible over any point density.
    let mut range = 10.0f32;
    while range <= max_range_m {
        surface.stroke_circle(
            origin_x as i32,
            origin_y as i32,
            (range * px_per_m).round() as i32,
            RING,
        );
        range += 10.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(surface: &RasterSurface, value: u8) -> usize {
        surface.data().iter().filter(|&&p| p == value).count()
    }

    #[test]
    fn vehicle_marker_sits_at_biased_origin() {
        let mut surface = RasterSurface::new(200, 100);
        render(&[], &mut surface, DEFAULT_MAX_RANGE_M);
        assert_eq!(surface.pixel(100, 80), Some(VEHICLE));
        // Geometric center is not the origin.
        assert_ne!(surface.pixel(100, 50), Some(VEHICLE));
    }

    #[test]
    fn forward_point_lands_above_origin() {
        let mut surface = RasterSurface::new(100, 100);
        // 100px / (2 * 50m) = 1 px/m; 23m ahead => 23 rows above origin.
        render(&[Point3D::new(23.0, 0.0, 3.0)], &mut surface, 50.0);
        assert_eq!(surface.pixel(50, 57), Some(POINT));
    }

    #[test]
    fn left_point_lands_right_of_origin() {
        let mut surface = RasterSurface::new(100, 100);
        render(&[Point3D::new(0.0, 25.0, 0.0)], &mut surface, 50.0);
        assert_eq!(surface.pixel(75, 80), Some(POINT));
    }

    #[test]
    fn vertical_component_is_ignored() {
        let mut a = RasterSurface::new(100, 100);
        let mut b = RasterSurface::new(100, 100);
        render(&[Point3D::new(10.0, 5.0, 0.0)], &mut a, 50.0);
        render(&[Point3D::new(10.0, 5.0, -40.0)], &mut b, 50.0);
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn out_of_frame_points_paint_nothing() {
        let mut surface = RasterSurface::new(100, 100);
        render(
            &[
                Point3D::new(500.0, 0.0, 0.0),
                Point3D::new(-500.0, 0.0, 0.0),
                Point3D::new(0.0, 500.0, 0.0),
                Point3D::new(0.0, -500.0, 0.0),
                Point3D::new(f32::MAX, f32::MAX, 0.0),
            ],
            &mut surface,
            50.0,
        );
        assert_eq!(count(&surface, POINT), 0);
    }

    #[test]
    fn render_clears_previous_frame() {
        let mut surface = RasterSurface::new(100, 100);
        render(&[Point3D::new(23.0, 0.0, 0.0)], &mut surface, 50.0);
        assert_eq!(surface.pixel(50, 57), Some(POINT));
        render(&[Point3D::new(0.0, 25.0, 0.0)], &mut surface, 50.0);
        // The old point is gone after the full redraw.
        assert_ne!(surface.pixel(50, 57), Some(POINT));
        assert_eq!(surface.pixel(75, 80), Some(POINT));
    }

    #[test]
    fn range_rings_overlay_points() {
        let mut surface = RasterSurface::new(100, 100);
        // Saturate the frame with points, rings must still be visible.
        let mut points = Vec::new();
        for fx in -50..50 {
            for fy in -50..50 {
                points.push(Point3D::new(fx as f32, fy as f32, 0.0));
            }
        }
        render(&points, &mut surface, 50.0);
        assert!(count(&surface, RING) > 0);
        // Ring at 10m with 1 px/m: directly above the origin at radius 10.
        assert_eq!(surface.pixel(50, 70), Some(RING));
    }

    #[test]
    fn render_is_deterministic() {
        let points = vec![
            Point3D::new(1.5, -2.0, 0.0),
            Point3D::new(30.0, 12.0, 1.0),
            Point3D::ZERO,
        ];
        let mut a = RasterSurface::new(320, 180);
        let mut b = RasterSurface::new(320, 180);
        render(&points, &mut a, DEFAULT_MAX_RANGE_M);
        render(&points, &mut b, DEFAULT_MAX_RANGE_M);
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn degenerate_surface_does_not_panic() {
        let mut surface = RasterSurface::new(0, 0);
        render(&[Point3D::new(1.0, 1.0, 1.0)], &mut surface, 50.0);
        assert!(surface.data().is_empty());
    }
}
