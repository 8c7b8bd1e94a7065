//! Error types for DrishtiIO

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// DrishtiIO error types
///
/// The fatal/recoverable split is behavioral, not structural: camera
/// initialization errors halt the process, capture errors skip a cycle,
/// link errors degrade the session. Callers decide; variants carry the
/// diagnostic.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Serial port error
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file parse error
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Device initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Frame capture failed (transient, retried next cycle)
    #[error("Capture failed: {0}")]
    Capture(String),

    /// Invalid reply from a peripheral
    #[error("Invalid reply: {0}")]
    InvalidReply(String),

    /// Communication timeout
    #[error("Communication timeout")]
    Timeout,

    /// Frame payload exceeds the u32 length prefix
    #[error("Frame too large for framing: {0} bytes")]
    FrameTooLarge(usize),
}
