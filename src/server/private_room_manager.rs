//! Matchmaking queue for private rooms
//!
//! Clients opt into a FIFO queue; as soon as enough are waiting they are
//! paired off into a hidden room that is torn down like any other once it
//! empties.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Weak};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::protocol::{composers, JoinState};
use crate::server::chatroom::Chatroom;
use crate::server::connection::Connection;
use crate::server::server_manager::ServerManager;

/// Members per matchmade room.
const PAIR_SIZE: usize = 2;

struct QueueInner {
    list: VecDeque<Arc<Connection>>,
    ids: HashSet<i32>,
}

pub struct PrivateRoomManager {
    queue: Mutex<QueueInner>,
    server: Weak<ServerManager>,
}

impl PrivateRoomManager {
    pub fn new(server: Weak<ServerManager>) -> Self {
        Self {
            queue: Mutex::new(QueueInner {
                list: VecDeque::new(),
                ids: HashSet::new(),
            }),
            server,
        }
    }

    /// Clients currently waiting
    pub async fn len(&self) -> usize {
        self.queue.lock().await.list.len()
    }

    /// Add a client to the queue, pairing a batch off if it fills.
    /// Queueing twice is a no-op.
    pub async fn enqueue(&self, conn: Arc<Connection>) {
        let batch = {
            let mut queue = self.queue.lock().await;
            if !queue.ids.insert(conn.id()) {
                debug!(connection_id = conn.id(), "already queued for matchmaking");
                return;
            }
            info!(connection_id = conn.id(), "queued for matchmaking");
            queue.list.push_back(conn);
            if queue.list.len() < PAIR_SIZE {
                None
            } else {
                let mut batch = Vec::with_capacity(PAIR_SIZE);
                for _ in 0..PAIR_SIZE {
                    if let Some(next) = queue.list.pop_front() {
                        queue.ids.remove(&next.id());
                        batch.push(next);
                    }
                }
                Some(batch)
            }
        };
        if let Some(batch) = batch {
            self.create_private_room(batch).await;
        }
    }

    /// Drop a client from the queue; absent clients are a no-op
    pub async fn remove(&self, conn: &Arc<Connection>) {
        let mut queue = self.queue.lock().await;
        if queue.ids.remove(&conn.id()) {
            queue.list.retain(|c| c.id() != conn.id());
            info!(connection_id = conn.id(), "left the matchmaking queue");
        }
    }

    /// Build a hidden room for a matched batch and walk each member in.
    /// Descriptors are composed per member, so later members see everyone
    /// who joined before them.
    async fn create_private_room(&self, batch: Vec<Arc<Connection>>) {
        let Some(server) = self.server.upgrade() else {
            return;
        };
        let room_id = server.chatrooms().allocate_room_id();
        let room = Arc::new(Chatroom::private_room(room_id));
        server.chatrooms().insert_private(room.clone()).await;
        info!(room_id, members = batch.len(), "private room matched");

        for member in batch {
            room.join(member.clone()).await;
            let mut offer = composers::create_private_room(room.name());
            room.describe(&mut offer).await;
            member.send(&offer);
            member.send(&composers::join_chatroom(room_id, JoinState::Ok));
        }
    }
}
