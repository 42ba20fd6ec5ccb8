//! Error types for the device client
use thiserror::Error;

/// Device client errors
#[derive(Error, Debug)]
pub enum ControlError {
    /// Server unreachable, handshake timeout or connection lost
    #[error("Connection error: {0}")]
    Connection(String),

    /// No usable device on the server
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The server answered with an `Error` message
    #[error("Server error {code}: {message}")]
    Server {
        /// Buttplug error code
        code: i64,
        /// Message text from the server
        message: String,
    },

    /// Unexpected or malformed message
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Websocket transport error
    #[error("Websocket error: {0}")]
    Websocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Command issued without an active connection
    #[error("Not connected")]
    NotConnected,

    /// The client task has exited
    #[error("Command channel closed")]
    ChannelClosed,
}

/// Result type for device client operations
pub type Result<T> = std::result::Result<T, ControlError>;
