use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("path error: {0}")]
    PathError(String),
}

/// Failures of the single-instance handshake.
///
/// Every variant is fatal at startup: the process reports it and exits
/// with a non-zero code.
#[derive(Debug, thiserror::Error)]
pub enum InstanceError {
    #[error("instance lock error: {0}")]
    Lock(#[source] std::io::Error),

    #[error("instance channel error: {0}")]
    Channel(#[source] std::io::Error),

    #[error("could not reach the running instance after {attempts} attempts")]
    ForwardExhausted { attempts: u32 },

    #[error("running instance rejected forwarded launch: {0}")]
    Rejected(String),

    /// The primary is alive but could not take the launch (it is shutting
    /// down). The secondary retries and may take the lock itself.
    #[error("running instance cannot take launches: {0}")]
    Unavailable(String),

    #[error("unsupported forward protocol version {0}")]
    UnsupportedVersion(u32),

    #[error("malformed forwarded launch: {0}")]
    Malformed(String),
}

/// A UI request that could not be turned into a command.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("unknown kind: {0}")]
    UnknownKind(String),

    #[error("invalid payload for {kind}: {reason}")]
    InvalidPayload { kind: String, reason: String },
}
