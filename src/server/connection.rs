//! Per-client connection state and socket IO tasks
//!
//! Each accepted socket gets a [`Connection`] plus two tasks: a read loop
//! that reassembles frames and dispatches packets, and a write loop that
//! drains the outbound channel. Disposal is idempotent and never blocks the
//! caller; cleanup runs on its own task.

use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Notify, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::protocol::{FrameCodec, MessageWriter, PacketReader};
use crate::server::server_manager::ServerManager;

/// Mutable per-client data announced after the handshake.
pub struct ConnectionData {
    client_ip: IpAddr,
    username: RwLock<String>,
    user_data: RwLock<Vec<(String, String)>>,
}

impl ConnectionData {
    fn new(client_ip: IpAddr) -> Self {
        Self {
            client_ip,
            // Placeholder until the client announces a real name.
            username: RwLock::new(Uuid::new_v4().to_string()),
            user_data: RwLock::new(Vec::new()),
        }
    }

    /// Remote address of the client
    pub fn client_ip(&self) -> IpAddr {
        self.client_ip
    }

    /// Current display name
    pub async fn username(&self) -> String {
        self.username.read().await.clone()
    }

    /// Replace the display name
    pub async fn set_username(&self, username: String) {
        *self.username.write().await = username;
    }

    /// Append one client-supplied key/value pair
    pub async fn push_user_data(&self, key: String, value: String) {
        self.user_data.write().await.push((key, value));
    }

    /// Snapshot of all client-supplied pairs
    pub async fn user_data(&self) -> Vec<(String, String)> {
        self.user_data.read().await.clone()
    }
}

/// One connected client.
pub struct Connection {
    id: i32,
    data: ConnectionData,
    disposed: AtomicBool,
    outbound: mpsc::UnboundedSender<Bytes>,
    shutdown: Notify,
    me: Weak<Connection>,
    server: Weak<ServerManager>,
}

impl Connection {
    /// Create a connection; the paired receiver feeds the write loop
    pub fn new(
        id: i32,
        client_ip: IpAddr,
        outbound: mpsc::UnboundedSender<Bytes>,
        server: Weak<ServerManager>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            id,
            data: ConnectionData::new(client_ip),
            disposed: AtomicBool::new(false),
            outbound,
            shutdown: Notify::new(),
            me: me.clone(),
            server,
        })
    }

    /// Server-assigned connection id
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Per-client announced data
    pub fn data(&self) -> &ConnectionData {
        &self.data
    }

    /// Whether this connection has been torn down
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Queue a packet for the write loop. Sends after disposal are dropped.
    pub fn send(&self, msg: &MessageWriter) {
        if self.is_disposed() {
            return;
        }
        if self.outbound.send(msg.to_bytes()).is_err() {
            // Write loop is gone, the socket is effectively dead.
            self.dispose();
        }
    }

    /// Tear down the connection exactly once.
    ///
    /// Marks the connection dead, wakes the IO loops, and moves registry and
    /// room cleanup onto a fresh task so disposal can be called from inside
    /// a broadcast without deadlocking.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shutdown.notify_waiters();
        info!(connection_id = self.id, "connection disposed");
        let (Some(me), Some(server)) = (self.me.upgrade(), self.server.upgrade()) else {
            return;
        };
        tokio::spawn(async move {
            server.handle_disconnect(&me).await;
        });
    }

    /// Spawn the read and write loops for an accepted socket
    pub fn spawn_io(
        self: &Arc<Self>,
        stream: TcpStream,
        outbound_rx: mpsc::UnboundedReceiver<Bytes>,
        max_frame_size: usize,
        max_frames_per_read: usize,
    ) {
        let (read_half, write_half) = stream.into_split();
        let conn = self.clone();
        tokio::spawn(async move {
            conn.read_loop(read_half, max_frame_size, max_frames_per_read)
                .await;
        });
        let conn = self.clone();
        tokio::spawn(async move {
            conn.write_loop(write_half, outbound_rx).await;
        });
    }

    async fn read_loop(
        self: Arc<Self>,
        mut read_half: tokio::net::tcp::OwnedReadHalf,
        max_frame_size: usize,
        max_frames_per_read: usize,
    ) {
        let Some(server) = self.server.upgrade() else {
            return;
        };
        let mut codec = FrameCodec::new(max_frame_size);
        let mut buf = vec![0u8; max_frame_size];

        loop {
            if self.is_disposed() {
                break;
            }
            let read = tokio::select! {
                _ = self.shutdown.notified() => break,
                read = read_half.read(&mut buf) => read,
            };
            match read {
                Ok(0) => {
                    debug!(connection_id = self.id, "client closed the connection");
                    self.dispose();
                    break;
                }
                Ok(n) => {
                    codec.feed(&buf[..n]);
                    for _ in 0..max_frames_per_read {
                        match codec.next_frame() {
                            Ok(Some(frame)) => {
                                let reader = PacketReader::new(frame);
                                server
                                    .packet_manager()
                                    .dispatch(server.clone(), self.clone(), reader)
                                    .await;
                            }
                            Ok(None) => break,
                            Err(err) => {
                                warn!(
                                    connection_id = self.id,
                                    error = %err,
                                    "dropping malformed input"
                                );
                                codec.clear();
                                break;
                            }
                        }
                    }
                }
                Err(err) => {
                    debug!(connection_id = self.id, error = %err, "socket read failed");
                    self.dispose();
                    break;
                }
            }
        }
    }

    async fn write_loop(
        self: Arc<Self>,
        mut write_half: tokio::net::tcp::OwnedWriteHalf,
        mut outbound_rx: mpsc::UnboundedReceiver<Bytes>,
    ) {
        loop {
            if self.is_disposed() {
                break;
            }
            let next = tokio::select! {
                _ = self.shutdown.notified() => break,
                next = outbound_rx.recv() => next,
            };
            match next {
                Some(frame) => {
                    if let Err(err) = write_half.write_all(&frame).await {
                        debug!(connection_id = self.id, error = %err, "socket write failed");
                        self.dispose();
                        break;
                    }
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::net::Ipv4Addr;

    /// Connection with no socket; the returned receiver exposes every frame
    /// queued by `send`.
    pub fn connection_pair(
        id: i32,
        server: Weak<ServerManager>,
    ) -> (Arc<Connection>, mpsc::UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = Connection::new(id, IpAddr::V4(Ipv4Addr::LOCALHOST), tx, server);
        (conn, rx)
    }

    /// Decode all frames currently queued for a connection.
    pub fn drain_packets(rx: &mut mpsc::UnboundedReceiver<Bytes>) -> Vec<PacketReader> {
        let mut packets = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            packets.push(PacketReader::new(frame.slice(4..)));
        }
        packets
    }
}
