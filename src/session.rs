//! Stream session lifecycle.
//!
//! [`Session`] owns the subscribe/connect/reconnect state machine that sits
//! between the pub/sub transport and the decoder. Transport callbacks drive
//! every transition; the session never blocks and never errors out. Its
//! observable outputs are the [`Status`] string and the rendered surface.

use std::fmt;
use std::time::Duration;

use crate::decode::decode_pcd;
use crate::msg::PointCloud2;
use crate::raster::{RasterSurface, render};

/// Well-known key of the point-cloud topic.
pub const POINTCLOUD_TOPIC: &str = "rt/lidar/points";

/// Schema names for the point-cloud message, tried in order. The legacy
/// convention comes first, the namespaced one second.
pub const MESSAGE_TYPE_CANDIDATES: [&str; 2] =
    ["sensor_msgs/PointCloud2", "sensor_msgs/msg/PointCloud2"];

/// Delay before a reconnect attempt after the transport closes.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(2000);

/// Lifecycle state of the stream session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Subscribed,
    Error,
}

/// Human-readable status signal, updated on every transition and every
/// successful decode. This string is the session's only output besides the
/// rendered surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Connected,
    Disconnected,
    Error,
    TopicError,
    DecodeError,
    Ok(usize),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Connected => write!(f, "(connected)"),
            Status::Disconnected => write!(f, "(disconnected)"),
            Status::Error => write!(f, "(error)"),
            Status::TopicError => write!(f, "(topic error)"),
            Status::DecodeError => write!(f, "(decode error)"),
            Status::Ok(n) => write!(f, "(ok: {n} pts)"),
        }
    }
}

/// Subscription construction on the underlying pub/sub client.
///
/// The transport itself (connection handling, delivery, reconnection of the
/// socket) is assumed given; the session only asks it to construct a
/// subscription for a topic under a schema name, which may fail
/// synchronously when the schema convention is not understood.
pub trait Transport {
    type Error: fmt::Display;

    fn subscribe(&mut self, topic: &str, message_type: &str) -> Result<(), Self::Error>;
}

/// Outcome of one schema-candidate subscription attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    Constructed { message_type: &'static str },
    ConstructionFailed { message_type: &'static str },
}

/// Token handed out when a reconnect is scheduled. The timer presents it
/// back when the delay elapses; a stale epoch means a newer close superseded
/// this timer and it must do nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconnect {
    epoch: u64,
    pub delay: Duration,
}

/// Owned session value; pass `&mut Session` through every transport
/// callback rather than sharing it ambiently.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    status: Status,
    epoch: u64,
    topic: String,
    max_points: usize,
    max_range_m: f32,
    reconnect_delay: Duration,
}

impl Session {
    pub fn new(max_points: usize, max_range_m: f32, reconnect_delay: Duration) -> Self {
        Session {
            state: SessionState::Disconnected,
            status: Status::Disconnected,
            epoch: 0,
            topic: POINTCLOUD_TOPIC.to_string(),
            max_points,
            max_range_m,
            reconnect_delay,
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Session start (or a due reconnect): begin dialing the transport.
    pub fn connect_started(&mut self) {
        self.state = SessionState::Connecting;
    }

    /// Transport reports the connection is up. Immediately walks the schema
    /// candidates: the first one whose subscription constructs without error
    /// wins and the session is `Subscribed`; a failed construction moves on
    /// to the next candidate. Only exhausting the whole list reports
    /// `(topic error)` and leaves no subscription until the next reconnect
    /// cycle.
    pub fn connection_established<T: Transport>(&mut self, transport: &mut T) -> Vec<Attempt> {
        self.state = SessionState::Connected;
        self.status = Status::Connected;

        let mut attempts = Vec::new();
        for message_type in MESSAGE_TYPE_CANDIDATES {
            match transport.subscribe(&self.topic, message_type) {
                Ok(()) => {
                    attempts.push(Attempt::Constructed { message_type });
                    self.state = SessionState::Subscribed;
                    break;
                }
                Err(_) => {
                    attempts.push(Attempt::ConstructionFailed { message_type });
                }
            }
        }
        // A failed candidate is only an error once the whole list is spent;
        // a later candidate succeeding leaves the session healthy.
        if self.state != SessionState::Subscribed {
            self.status = Status::TopicError;
        }
        attempts
    }

    /// Transport error signal. Does not schedule anything by itself; the
    /// close signal that follows drives reconnection.
    pub fn connection_error(&mut self) {
        self.state = SessionState::Error;
        self.status = Status::Error;
    }

    /// Transport closed, gracefully or not. Always schedules one reconnect:
    /// bumping the epoch invalidates any timer still pending from an
    /// earlier close, so attempts never stack.
    pub fn connection_closed(&mut self) -> Reconnect {
        self.state = SessionState::Disconnected;
        self.status = Status::Disconnected;
        self.epoch += 1;
        Reconnect {
            epoch: self.epoch,
            delay: self.reconnect_delay,
        }
    }

    /// A reconnect timer fired. Returns true when the caller should dial
    /// again; a stale token or an already-moved-on session is a no-op.
    pub fn reconnect_due(&mut self, token: Reconnect) -> bool {
        if token.epoch == self.epoch && self.state == SessionState::Disconnected {
            self.connect_started();
            true
        } else {
            false
        }
    }

    /// Handle one raw data message from the subscription.
    ///
    /// Structural failures (bad JSON, bad base64) drop the whole batch and
    /// report `(decode error)`; the previous raster is left untouched. A
    /// decodable message is rendered and reported as `(ok: N pts)`.
    /// Returns the decoded point count when a frame was rendered.
    pub fn handle_message(&mut self, raw: &[u8], surface: &mut RasterSurface) -> Option<usize> {
        if self.state != SessionState::Subscribed {
            return None;
        }

        let msg: PointCloud2 = match serde_json::from_slice(raw) {
            Ok(v) => v,
            Err(_) => {
                self.status = Status::DecodeError;
                return None;
            }
        };
        let data = match msg.payload() {
            Ok(v) => v,
            Err(_) => {
                self.status = Status::DecodeError;
                return None;
            }
        };

        let points = decode_pcd(&msg, &data, self.max_points);
        let count = points.len();
        render(&points, surface, self.max_range_m);
        self.status = Status::Ok(count);
        Some(count)
    }
}
