//! Binary point-cloud decoder.
//!
//! Turns a [`PointCloud2`] message plus its decoded payload bytes into a
//! bounded batch of 3D points. The decoder never fails: truncated payloads,
//! bogus strides and non-finite floats all degrade to zeroed points rather
//! than errors, because a live perception stream must keep rendering under
//! malformed input.

use crate::msg::{PointCloud2, PointField};

/// Decode-boundary cap on points per message.
pub const DEFAULT_MAX_POINTS: usize = 50_000;

/// One decoded Cartesian point. All components are finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3D {
    pub const ZERO: Point3D = Point3D { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Point3D { x, y, z }
    }
}

/// Byte offsets of the x/y/z fields within one point stride.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldOffsets {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl FieldOffsets {
    /// Standard packed-float layout assumed when descriptors omit an axis.
    pub const PACKED: FieldOffsets = FieldOffsets { x: 0, y: 4, z: 8 };

    /// Scan the field descriptors for `"x"`, `"y"` and `"z"`.
    ///
    /// First occurrence in declared order wins per axis; names other than
    /// x/y/z may coexist and are ignored. Unmatched axes keep the
    /// [`PACKED`](Self::PACKED) defaults.
    pub fn resolve(fields: &[PointField]) -> Self {
        let mut offsets = Self::PACKED;
        let mut seen = (false, false, false);
        for field in fields {
            match field.name.as_str() {
                "x" if !seen.0 => {
                    offsets.x = field.offset as usize;
                    seen.0 = true;
                }
                "y" if !seen.1 => {
                    offsets.y = field.offset as usize;
                    seen.1 = true;
                }
                "z" if !seen.2 => {
                    offsets.z = field.offset as usize;
                    seen.2 = true;
                }
                _ => {}
            }
        }
        offsets
    }
}

/// Decode up to `max_points` points from a message payload.
///
/// The batch length is `min(declared count, max_points)` regardless of how
/// much payload actually arrived: a read that would run past `data` produces
/// a non-finite value, and any point with a non-finite component is emitted
/// as `(0, 0, 0)` instead of being dropped, so the count is stable for a
/// given message.
pub fn decode_pcd(msg: &PointCloud2, data: &[u8], max_points: usize) -> Vec<Point3D> {
    let f32_from_bytes = if msg.is_bigendian {
        f32::from_be_bytes
    } else {
        f32::from_le_bytes
    };

    let offsets = FieldOffsets::resolve(&msg.fields);
    let point_step = msg.point_step as usize;
    if point_step == 0 {
        // A zero stride cannot address any point; degrade to an empty batch.
        return Vec::new();
    }

    // Organized clouds declare a grid; unorganized publishers leave the
    // dimensions at zero and the payload length is authoritative.
    let declared = if msg.width > 0 && msg.height > 0 {
        msg.width as usize * msg.height as usize
    } else {
        data.len() / point_step
    };
    let count = declared.min(max_points);

    let read = |base: usize, offset: usize| -> f32 {
        match base.checked_add(offset) {
            Some(start) if start + 4 <= data.len() => {
                let bytes = [data[start], data[start + 1], data[start + 2], data[start + 3]];
                f32_from_bytes(bytes)
            }
            _ => f32::NAN,
        }
    };

    let mut points = Vec::with_capacity(count);
    for i in 0..count {
        let base = i * point_step;
        let x = read(base, offsets.x);
        let y = read(base, offsets.y);
        let z = read(base, offsets.z);
        if x.is_finite() && y.is_finite() && z.is_finite() {
            points.push(Point3D::new(x, y, z));
        } else {
            points.push(Point3D::ZERO);
        }
    }
    points
}
