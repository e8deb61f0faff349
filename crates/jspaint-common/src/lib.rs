pub mod bytes;
pub mod errors;
pub mod launch;
pub mod protocol;

pub use bytes::ByteBuffer;
pub use errors::{ConfigError, InstanceError, PlatformError, ProtocolError};
pub use launch::{resolve_launch_path, ForwardedLaunch, LaunchRequest, FORWARD_PROTOCOL_VERSION};
pub use protocol::{Command, ResponseCode};
