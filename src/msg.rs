//! Wire message types for the point-cloud topic.
//!
//! The bridge publishes a JSON rendition of `sensor_msgs/PointCloud2` where
//! the packed point payload travels as a base64 string. Grid dimensions are
//! optional on the wire: publishers of unorganized clouds omit them and the
//! decoder falls back to counting points from the payload length.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::Deserialize;

/// One field descriptor inside a point stride, e.g. `{"name": "x", "offset": 0}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PointField {
    pub name: String,
    pub offset: u32,
}

/// Metadata plus opaque payload for one point-cloud message.
///
/// The producer does not guarantee `data` is long enough for
/// `width * height` points; consumers must bounds-check every read.
#[derive(Debug, Clone, Deserialize)]
pub struct PointCloud2 {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    pub point_step: u32,
    #[serde(default)]
    pub is_bigendian: bool,
    #[serde(default)]
    pub fields: Vec<PointField>,
    /// Base64-encoded packed point data.
    pub data: String,
}

impl PointCloud2 {
    /// Decode the base64 payload into raw bytes.
    pub fn payload(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(&self.data)
    }
}
