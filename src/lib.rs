//! Top-down lidar point-cloud monitor.
//!
//! Decodes `PointCloud2`-style messages from a pub/sub bridge and renders a
//! bounded top-down scatter for a live dashboard. See [`decode`] for the
//! binary decoder, [`raster`] for the projection and [`session`] for the
//! subscribe/reconnect lifecycle.

use clap::Parser;
use serde_json::json;
use zenoh::config::{Config, WhatAmI};

pub mod decode;
pub mod msg;
pub mod raster;
pub mod session;

pub use decode::{DEFAULT_MAX_POINTS, Point3D, decode_pcd};
pub use msg::{PointCloud2, PointField};
pub use raster::{DEFAULT_MAX_RANGE_M, RasterSurface, render};
pub use session::{Session, SessionState, Status, Transport};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Rerun parameters
    #[cfg(feature = "rerun")]
    #[command(flatten)]
    pub rerun: rerun::clap::RerunArgs,

    /// zenoh connection mode
    #[arg(long, default_value = "client")]
    mode: WhatAmI,

    /// connect to zenoh endpoints
    #[arg(short, long, default_value = "tcp/127.0.0.1:7447")]
    connect: Vec<String>,

    /// point-cloud topic key
    #[arg(long, default_value = session::POINTCLOUD_TOPIC)]
    pub topic: String,

    /// cap on decoded points per message
    #[arg(long, default_value_t = decode::DEFAULT_MAX_POINTS)]
    pub max_points: usize,

    /// visualized range in meters
    #[arg(long, default_value_t = raster::DEFAULT_MAX_RANGE_M)]
    pub max_range: f32,

    /// delay before reconnecting after the transport closes, in milliseconds
    #[arg(long, default_value_t = 2000)]
    pub reconnect_ms: u64,

    /// raster surface width in pixels
    #[arg(long, default_value_t = 640)]
    pub width: usize,

    /// raster surface height in pixels
    #[arg(long, default_value_t = 480)]
    pub height: usize,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        let mut config = Config::default();

        config
            .insert_json5("mode", &json!(args.mode).to_string())
            .unwrap();

        if !args.connect.is_empty() {
            config
                .insert_json5("connect/endpoints", &json!(args.connect).to_string())
                .unwrap();
        }

        config
    }
}
