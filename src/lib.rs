//! TCP chat/voice relay server with a length-prefixed binary protocol
//!
//! This library provides a small real-time chat server: clients connect over
//! a persistent TCP socket, announce a username, join or create chatrooms,
//! exchange text and voice payloads, and can be randomly paired into private
//! rooms through a matchmaking queue.

pub mod audio;
pub mod error;
pub mod protocol;
pub mod server;

pub use error::{Result, ServerError};
pub use server::server_manager::ServerManager;

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds between the UNIX epoch and 2016-01-01T00:00:00Z, the
/// protocol's keep-alive epoch.
const KEEPALIVE_EPOCH_MS: u128 = 1_451_606_400_000;

/// Current server time in milliseconds since 2016-01-01 UTC, truncated to
/// fit the keep-alive packet's i32 field.
pub fn server_time() -> i32 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    now.saturating_sub(KEEPALIVE_EPOCH_MS) as i32
}

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Maximum accepted frame size in bytes (also the receive buffer size)
    pub max_frame_size: usize,
    /// Maximum number of frames extracted from a single socket read
    pub max_frames_per_read: usize,
    /// Log every handled/unhandled packet at debug level
    pub log_packets: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 7777,
            max_frame_size: 4096,
            max_frames_per_read: 10,
            log_packets: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_time_positive() {
        assert!(server_time() > 0);
    }

    #[test]
    fn test_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 7777);
        assert_eq!(config.max_frame_size, 4096);
        assert_eq!(config.max_frames_per_read, 10);
    }
}
