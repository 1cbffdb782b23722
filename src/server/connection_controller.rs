//! TCP accept loop and the registry of live connections

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Weak};

use tokio::net::TcpListener;
use tokio::sync::{mpsc, RwLock};
use tracing::{error, info};

use crate::error::Result;
use crate::protocol::MessageWriter;
use crate::server::connection::Connection;
use crate::server::server_manager::ServerManager;
use crate::ServerConfig;

pub struct ConnectionController {
    connections: RwLock<HashMap<i32, Arc<Connection>>>,
    next_connection_id: AtomicI32,
    connected: AtomicBool,
    port: u16,
    max_frame_size: usize,
    max_frames_per_read: usize,
    server: Weak<ServerManager>,
}

impl ConnectionController {
    pub fn new(config: &ServerConfig, server: Weak<ServerManager>) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            next_connection_id: AtomicI32::new(1),
            connected: AtomicBool::new(false),
            port: config.port,
            max_frame_size: config.max_frame_size,
            max_frames_per_read: config.max_frames_per_read,
            server,
        }
    }

    /// Bind the listener and accept connections until stopped
    pub async fn start(&self) -> Result<()> {
        let listener = TcpListener::bind(("0.0.0.0", self.port)).await?;
        self.connected.store(true, Ordering::SeqCst);
        info!(port = self.port, "listening for connections");

        while self.connected.load(Ordering::SeqCst) {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let id = self.next_connection_id.fetch_add(1, Ordering::SeqCst);
                    let (tx, rx) = mpsc::unbounded_channel();
                    let conn = Connection::new(id, peer.ip(), tx, self.server.clone());
                    info!(connection_id = id, peer = %peer, "connection accepted");
                    self.connections.write().await.insert(id, conn.clone());
                    conn.spawn_io(stream, rx, self.max_frame_size, self.max_frames_per_read);
                }
                Err(err) => {
                    error!(error = %err, "failed to accept connection");
                }
            }
        }
        Ok(())
    }

    /// Stop accepting after the next accept resolves
    pub fn stop(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Send one packet to every live connection
    pub async fn broadcast(&self, msg: &MessageWriter) {
        let connections: Vec<Arc<Connection>> =
            self.connections.read().await.values().cloned().collect();
        for conn in connections {
            conn.send(msg);
        }
    }

    /// Look up a connection by id
    pub async fn get(&self, id: i32) -> Option<Arc<Connection>> {
        self.connections.read().await.get(&id).cloned()
    }

    /// Drop a connection from the registry
    pub async fn remove(&self, id: i32) -> Option<Arc<Connection>> {
        self.connections.write().await.remove(&id)
    }

    /// Number of live connections
    pub async fn count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Insert an already-built connection; accepts normally do this
    pub(crate) async fn register(&self, conn: Arc<Connection>) {
        self.connections.write().await.insert(conn.id(), conn);
    }
}
