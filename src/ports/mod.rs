//! Ports: trait seams between the realtime layer and its collaborators.

mod realtime_publisher;
mod session_validator;
mod stream_connector;

pub use realtime_publisher::RealtimePublisher;
pub use session_validator::SessionValidator;
pub use stream_connector::{FrameStream, StreamConnector, StreamFrame, TransportError};
