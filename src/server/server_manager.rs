//! Top-level server wiring
//!
//! Owns every subsystem and hands each a weak back-reference so components
//! can reach their siblings without a reference cycle.

use std::sync::Arc;

use tracing::info;

use crate::audio::{Passthrough, VoiceTranscoder};
use crate::error::Result;
use crate::server::chatroom_manager::ChatroomManager;
use crate::server::connection::Connection;
use crate::server::connection_controller::ConnectionController;
use crate::server::packet_manager::PacketManager;
use crate::server::private_room_manager::PrivateRoomManager;
use crate::server::repository::{ClientRepository, MemoryRepository};
use crate::ServerConfig;

pub struct ServerManager {
    config: ServerConfig,
    packet_manager: PacketManager,
    connections: ConnectionController,
    chatrooms: ChatroomManager,
    private_rooms: PrivateRoomManager,
    repository: Arc<dyn ClientRepository>,
    transcoder: Arc<dyn VoiceTranscoder>,
}

impl ServerManager {
    /// Build a server with the in-memory account store and a passthrough
    /// voice transcoder
    pub fn new(config: ServerConfig) -> Arc<Self> {
        Self::with_parts(config, Arc::new(MemoryRepository::new()), Arc::new(Passthrough))
    }

    /// Build a server with explicit account and transcoder backends
    pub fn with_parts(
        config: ServerConfig,
        repository: Arc<dyn ClientRepository>,
        transcoder: Arc<dyn VoiceTranscoder>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            packet_manager: PacketManager::new(config.log_packets),
            connections: ConnectionController::new(&config, weak.clone()),
            chatrooms: ChatroomManager::new(weak.clone()),
            private_rooms: PrivateRoomManager::new(weak.clone()),
            repository,
            transcoder,
            config,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn packet_manager(&self) -> &PacketManager {
        &self.packet_manager
    }

    pub fn connections(&self) -> &ConnectionController {
        &self.connections
    }

    pub fn chatrooms(&self) -> &ChatroomManager {
        &self.chatrooms
    }

    pub fn private_rooms(&self) -> &PrivateRoomManager {
        &self.private_rooms
    }

    pub fn repository(&self) -> &Arc<dyn ClientRepository> {
        &self.repository
    }

    pub fn transcoder(&self) -> &Arc<dyn VoiceTranscoder> {
        &self.transcoder
    }

    /// Run the accept loop until stopped
    pub async fn run(&self) -> Result<()> {
        info!(port = self.config.port, "starting chat server");
        self.connections.start().await
    }

    /// Tear down everything a disconnected client was part of: the
    /// connection registry, the matchmaking queue, and every room
    pub async fn handle_disconnect(&self, conn: &Arc<Connection>) {
        self.connections.remove(conn.id()).await;
        self.private_rooms.remove(conn).await;
        self.chatrooms.leave_all(conn).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::packets::server_packets;
    use crate::server::connection::test_support::{connection_pair, drain_packets};
    use std::time::Duration;

    #[tokio::test]
    async fn test_disconnect_cleans_every_registry() {
        let server = ServerManager::new(ServerConfig::default());
        let (alice, _arx) = connection_pair(1, Arc::downgrade(&server));
        let (bob, mut bob_rx) = connection_pair(2, Arc::downgrade(&server));
        alice.data().set_username("alice".into()).await;
        server.connections().register(alice.clone()).await;
        server.connections().register(bob.clone()).await;

        let room = server
            .chatrooms()
            .create_chatroom(bob.clone(), "lobby".into(), String::new(), String::new())
            .await;
        server
            .chatrooms()
            .join_chatroom(alice.clone(), room.id(), "")
            .await;
        server.private_rooms().enqueue(alice.clone()).await;
        drain_packets(&mut bob_rx);

        server.handle_disconnect(&alice).await;
        assert!(server.connections().get(alice.id()).await.is_none());
        assert_eq!(server.private_rooms().len().await, 0);
        assert!(!room.contains(&alice).await);

        let packets = drain_packets(&mut bob_rx);
        let departures = packets
            .iter()
            .filter(|p| p.packet_id() == server_packets::BROADCAST_CHAT_MESSAGE)
            .count();
        assert_eq!(departures, 1);
    }

    #[tokio::test]
    async fn test_dispose_triggers_cleanup_exactly_once() {
        let server = ServerManager::new(ServerConfig::default());
        let (alice, _arx) = connection_pair(1, Arc::downgrade(&server));
        let (bob, mut bob_rx) = connection_pair(2, Arc::downgrade(&server));
        alice.data().set_username("alice".into()).await;
        server.connections().register(alice.clone()).await;

        let room = server
            .chatrooms()
            .create_chatroom(bob.clone(), "lobby".into(), String::new(), String::new())
            .await;
        server
            .chatrooms()
            .join_chatroom(alice.clone(), room.id(), "")
            .await;
        drain_packets(&mut bob_rx);

        alice.dispose();
        alice.dispose();
        // Cleanup runs on a spawned task.
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(server.connections().get(alice.id()).await.is_none());
        assert!(!room.contains(&alice).await);
        let departures = drain_packets(&mut bob_rx)
            .iter()
            .filter(|p| p.packet_id() == server_packets::BROADCAST_CHAT_MESSAGE)
            .count();
        assert_eq!(departures, 1);
    }
}
