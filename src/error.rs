//! Error handling for the chat server

use std::fmt;

/// Result type alias for server operations
pub type Result<T> = std::result::Result<T, ServerError>;

/// Server error types
#[derive(Debug, Clone)]
pub enum ServerError {
    /// Network-related errors (bind, accept, read, write)
    Network(String),
    /// Protocol errors (malformed or oversized frames)
    Protocol(String),
    /// Connection errors (closed or disposed peers)
    Connection(String),
    /// Configuration error
    Config(String),
}

impl ServerError {
    /// Create a network error
    pub fn network<T: Into<String>>(msg: T) -> Self {
        ServerError::Network(msg.into())
    }

    /// Create a protocol error
    pub fn protocol<T: Into<String>>(msg: T) -> Self {
        ServerError::Protocol(msg.into())
    }

    /// Create a connection error
    pub fn connection<T: Into<String>>(msg: T) -> Self {
        ServerError::Connection(msg.into())
    }

    /// Create a configuration error
    pub fn config<T: Into<String>>(msg: T) -> Self {
        ServerError::Config(msg.into())
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Network(msg) => write!(f, "Network error: {}", msg),
            ServerError::Protocol(msg) => write!(f, "Protocol error: {}", msg),
            ServerError::Connection(msg) => write!(f, "Connection error: {}", msg),
            ServerError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Network(format!("IO error: {}", err))
    }
}
