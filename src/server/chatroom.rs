//! A single chatroom and its member list

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info};

use crate::protocol::{composers, BroadcastKind, MessageWriter};
use crate::server::connection::Connection;

/// One room: a named member list that messages fan out across.
///
/// Message ids are a per-room sequence shared by chat, voice and system
/// announcements.
pub struct Chatroom {
    id: i32,
    name: String,
    description: String,
    password: String,
    owner: i32,
    private: bool,
    members: RwLock<Vec<Arc<Connection>>>,
    next_message_id: AtomicI32,
}

impl Chatroom {
    /// Create a public room
    pub fn new(id: i32, name: String, description: String, password: String, owner: i32) -> Self {
        Self {
            id,
            name,
            description,
            password,
            owner,
            private: false,
            members: RwLock::new(Vec::new()),
            next_message_id: AtomicI32::new(1),
        }
    }

    /// Create a matchmade private room; hidden from the room list
    pub fn private_room(id: i32) -> Self {
        Self {
            id,
            name: format!("Private Room ({})", id),
            description: String::new(),
            password: String::new(),
            owner: 0,
            private: true,
            members: RwLock::new(Vec::new()),
            next_message_id: AtomicI32::new(1),
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    /// Current member count
    pub async fn member_count(&self) -> usize {
        self.members.read().await.len()
    }

    /// Whether the connection is currently a member
    pub async fn contains(&self, conn: &Arc<Connection>) -> bool {
        self.members
            .read()
            .await
            .iter()
            .any(|m| m.id() == conn.id())
    }

    /// Whether the given password (or ownership) admits this connection
    pub fn allows(&self, password: &str, conn_id: i32) -> bool {
        self.password.is_empty() || self.password == password || self.owner == conn_id
    }

    fn next_message_id(&self) -> i32 {
        self.next_message_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Add a member. Joining twice is a no-op. Existing members of a public
    /// room are told about the arrival before it appears in the list, so the
    /// newcomer never receives their own join announcement.
    pub async fn join(&self, conn: Arc<Connection>) {
        if self.contains(&conn).await {
            return;
        }
        if !self.private {
            self.broadcast(&conn, BroadcastKind::UserJoined).await;
        }
        {
            let mut members = self.members.write().await;
            // The announcement ran unlocked; another join may have raced us.
            if members.iter().any(|m| m.id() == conn.id()) {
                return;
            }
            members.push(conn.clone());
        }
        info!(
            room_id = self.id,
            connection_id = conn.id(),
            "member joined chatroom"
        );
    }

    /// Remove a member, announcing the departure to everyone still present
    /// (the departing member included). Returns true when the room is left
    /// empty.
    pub async fn leave(&self, conn: &Arc<Connection>) -> bool {
        self.broadcast(conn, BroadcastKind::UserLeft).await;
        let mut members = self.members.write().await;
        let before = members.len();
        members.retain(|m| m.id() != conn.id());
        if members.len() == before {
            error!(
                room_id = self.id,
                connection_id = conn.id(),
                "leave requested for a connection that is not a member"
            );
        } else {
            info!(
                room_id = self.id,
                connection_id = conn.id(),
                "member left chatroom"
            );
        }
        if self.private {
            conn.send(&composers::remove_private_room(self.id));
        }
        members.is_empty()
    }

    /// Relay a chat line from a member to the whole room
    pub async fn send_chat(&self, from: &Arc<Connection>, text: &str) {
        if !self.contains(from).await {
            return;
        }
        let message_id = self.next_message_id();
        let username = from.data().username().await;
        let msg = composers::chat_message(self.id, message_id, from.id(), &username, text);
        self.fan_out(&msg).await;
    }

    /// Relay a voice payload from a member to the whole room
    pub async fn send_voice(&self, from: &Arc<Connection>, voice: &[u8]) {
        if !self.contains(from).await {
            return;
        }
        let message_id = self.next_message_id();
        let username = from.data().username().await;
        let msg = composers::voice_message(self.id, message_id, from.id(), &username, voice);
        self.fan_out(&msg).await;
    }

    /// Announce a membership change as a system chat line
    async fn broadcast(&self, about: &Arc<Connection>, kind: BroadcastKind) {
        let message_id = self.next_message_id();
        let username = about.data().username().await;
        let text = kind.message(&username);
        let msg = composers::broadcast_chat_message(self.id, message_id, about.id(), &text);
        self.fan_out(&msg).await;
    }

    async fn fan_out(&self, msg: &MessageWriter) {
        let members = self.members.read().await.clone();
        for member in members {
            member.send(msg);
        }
    }

    /// Append this room's descriptor: id, name, description, whether a
    /// password is set, then the member roster
    pub async fn describe(&self, msg: &mut MessageWriter) {
        msg.write_i32(self.id);
        msg.write_string(&self.name);
        msg.write_string(&self.description);
        msg.write_bool(!self.password.is_empty());
        let members = self.members.read().await.clone();
        msg.write_i32(members.len() as i32);
        for member in members {
            msg.write_i32(member.id());
            msg.write_string(&member.data().username().await);
        }
    }
}
