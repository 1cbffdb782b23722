//! Packet id to handler dispatch

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::debug;

use crate::protocol::PacketReader;
use crate::server::connection::Connection;
use crate::server::handlers;
use crate::server::server_manager::ServerManager;

type HandlerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Handler invoked for one received packet.
pub type PacketHandler =
    fn(Arc<ServerManager>, Arc<Connection>, PacketReader) -> HandlerFuture;

/// Routes received packets to their handlers by packet id.
pub struct PacketManager {
    handlers: HashMap<u16, PacketHandler>,
    log_packets: bool,
}

impl PacketManager {
    /// Build a manager with the default handler table registered
    pub fn new(log_packets: bool) -> Self {
        let mut manager = Self {
            handlers: HashMap::new(),
            log_packets,
        };
        handlers::register_defaults(&mut manager);
        manager
    }

    /// Register a handler for a packet id. The first registration wins;
    /// returns false if the id was already taken.
    pub fn register(&mut self, packet_id: u16, handler: PacketHandler) -> bool {
        if self.handlers.contains_key(&packet_id) {
            return false;
        }
        self.handlers.insert(packet_id, handler);
        true
    }

    /// Invoke the handler for the packet, if one is registered.
    /// Unhandled packets are logged and dropped.
    pub async fn dispatch(
        &self,
        server: Arc<ServerManager>,
        conn: Arc<Connection>,
        reader: PacketReader,
    ) {
        let packet_id = reader.packet_id();
        match self.handlers.get(&packet_id) {
            Some(handler) => {
                if self.log_packets {
                    debug!(packet_id, connection_id = conn.id(), "handling packet");
                }
                handler(server, conn, reader).await;
            }
            None => {
                debug!(packet_id, connection_id = conn.id(), "unhandled packet");
            }
        }
    }
}
