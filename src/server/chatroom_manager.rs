//! Registry of live chatrooms
//!
//! Owns the authoritative room map and the room id sequence. Empty rooms are
//! reaped when their last member leaves, and list changes are pushed to every
//! connected client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Weak};

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::protocol::packets::server_packets;
use crate::protocol::{JoinState, MessageWriter};
use crate::server::chatroom::Chatroom;
use crate::server::connection::Connection;
use crate::server::server_manager::ServerManager;

pub struct ChatroomManager {
    rooms: RwLock<HashMap<i32, Arc<Chatroom>>>,
    next_room_id: AtomicI32,
    server: Weak<ServerManager>,
}

impl ChatroomManager {
    pub fn new(server: Weak<ServerManager>) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            next_room_id: AtomicI32::new(1),
            server,
        }
    }

    /// Reserve the next room id. Shared by public and private rooms so ids
    /// never collide.
    pub fn allocate_room_id(&self) -> i32 {
        self.next_room_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Look up a room by id
    pub async fn get(&self, room_id: i32) -> Option<Arc<Chatroom>> {
        self.rooms.read().await.get(&room_id).cloned()
    }

    /// Number of live rooms
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Create a public room with its creator as first member and push the
    /// updated list to everyone
    pub async fn create_chatroom(
        &self,
        creator: Arc<Connection>,
        name: String,
        description: String,
        password: String,
    ) -> Arc<Chatroom> {
        let id = self.allocate_room_id();
        let room = Arc::new(Chatroom::new(id, name, description, password, creator.id()));
        room.join(creator).await;
        self.rooms.write().await.insert(id, room.clone());
        info!(room_id = id, name = room.name(), "chatroom created");
        self.broadcast_room_list().await;
        room
    }

    /// Register a matchmade private room; hidden rooms never trigger a list
    /// broadcast
    pub async fn insert_private(&self, room: Arc<Chatroom>) {
        self.rooms.write().await.insert(room.id(), room);
    }

    /// Resolve a join request against the room's password and membership
    pub async fn join_chatroom(
        &self,
        conn: Arc<Connection>,
        room_id: i32,
        password: &str,
    ) -> JoinState {
        let Some(room) = self.get(room_id).await else {
            return JoinState::Error;
        };
        if !room.allows(password, conn.id()) {
            return JoinState::WrongPassword;
        }
        room.join(conn).await;
        JoinState::Ok
    }

    /// Drop a room, pushing the updated list unless the room was hidden
    /// (private rooms never appear in it, so clients see no change)
    pub async fn remove_chatroom(&self, room_id: i32) {
        let removed = self.rooms.write().await.remove(&room_id);
        if let Some(room) = removed {
            info!(room_id, "chatroom deleted");
            if !room.is_private() {
                self.broadcast_room_list().await;
            }
        }
    }

    /// Remove a member from one room, reaping the room if it empties
    pub async fn leave_room(&self, conn: &Arc<Connection>, room_id: i32) {
        let Some(room) = self.get(room_id).await else {
            return;
        };
        if room.leave(conn).await {
            warn!(room_id, "last member left, reaping empty chatroom");
            self.remove_chatroom(room_id).await;
        }
    }

    /// Remove a member from every room they are in; used on disconnect
    pub async fn leave_all(&self, conn: &Arc<Connection>) {
        let rooms: Vec<Arc<Chatroom>> = self.rooms.read().await.values().cloned().collect();
        for room in rooms {
            if room.contains(conn).await {
                self.leave_room(conn, room.id()).await;
            }
        }
    }

    /// Route a chat line to its room
    pub async fn send_chat(&self, conn: &Arc<Connection>, room_id: i32, text: &str) {
        if let Some(room) = self.get(room_id).await {
            room.send_chat(conn, text).await;
        }
    }

    /// Route a voice payload to its room
    pub async fn send_voice(&self, conn: &Arc<Connection>, room_id: i32, voice: &[u8]) {
        if let Some(room) = self.get(room_id).await {
            room.send_voice(conn, voice).await;
        }
    }

    /// Send the current room list to one client
    pub async fn initialize_chatrooms(&self, conn: &Arc<Connection>) {
        conn.send(&self.room_list_message().await);
    }

    /// Compose the room list packet: count followed by one descriptor per
    /// public room
    pub async fn room_list_message(&self) -> MessageWriter {
        let rooms: Vec<Arc<Chatroom>> = self
            .rooms
            .read()
            .await
            .values()
            .filter(|r| !r.is_private())
            .cloned()
            .collect();
        let mut msg = MessageWriter::new(server_packets::INITIALIZE_CHATROOMS);
        msg.write_i32(rooms.len() as i32);
        for room in rooms {
            room.describe(&mut msg).await;
        }
        msg
    }

    /// Push the room list to every connected client
    async fn broadcast_room_list(&self) {
        let Some(server) = self.server.upgrade() else {
            return;
        };
        let msg = self.room_list_message().await;
        server.connections().broadcast(&msg).await;
    }
}
