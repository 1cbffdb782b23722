//! Default handlers for every client packet

use std::sync::Arc;

use tracing::debug;

use crate::protocol::packets::client_packets;
use crate::protocol::{composers, PacketReader};
use crate::server::connection::Connection;
use crate::server::packet_manager::PacketManager;
use crate::server::server_manager::ServerManager;
use crate::server_time;

/// Register the full default handler table
pub fn register_defaults(manager: &mut PacketManager) {
    manager.register(client_packets::INITIALIZE_CONNECTION, |s, c, r| {
        Box::pin(initialize_connection(s, c, r))
    });
    manager.register(client_packets::KEEP_ALIVE, |s, c, r| {
        Box::pin(keep_alive(s, c, r))
    });
    manager.register(client_packets::CONNECTION_DATA, |s, c, r| {
        Box::pin(connection_data(s, c, r))
    });
    manager.register(client_packets::CHAT_MESSAGE, |s, c, r| {
        Box::pin(chat_message(s, c, r))
    });
    manager.register(client_packets::JOIN_CHATROOM, |s, c, r| {
        Box::pin(join_chatroom(s, c, r))
    });
    manager.register(client_packets::VOICE_MESSAGE, |s, c, r| {
        Box::pin(voice_message(s, c, r))
    });
    manager.register(client_packets::CREATE_ROOM, |s, c, r| {
        Box::pin(create_room(s, c, r))
    });
    manager.register(client_packets::LEAVE_CHATROOM, |s, c, r| {
        Box::pin(leave_chatroom(s, c, r))
    });
    manager.register(client_packets::JOIN_QUEUE, |s, c, r| {
        Box::pin(join_queue(s, c, r))
    });
    manager.register(client_packets::REGISTER_ACCOUNT, |s, c, r| {
        Box::pin(register_account(s, c, r))
    });
    manager.register(client_packets::LOGIN_ACCOUNT, |s, c, r| {
        Box::pin(login_account(s, c, r))
    });
}

/// Handshake: the client announces its username and receives its assigned
/// id plus the current room list.
async fn initialize_connection(
    server: Arc<ServerManager>,
    conn: Arc<Connection>,
    mut reader: PacketReader,
) {
    let username = reader.read_string();
    if !username.is_empty() {
        conn.data().set_username(username).await;
    }
    conn.send(&composers::initialize_connection(conn.id()));
    server.chatrooms().initialize_chatrooms(&conn).await;
}

async fn keep_alive(_server: Arc<ServerManager>, conn: Arc<Connection>, mut reader: PacketReader) {
    let client_time = reader.read_i32();
    conn.send(&composers::keep_alive(client_time, server_time()));
}

/// Free-form key/value pairs the client attaches to its session.
async fn connection_data(
    _server: Arc<ServerManager>,
    conn: Arc<Connection>,
    mut reader: PacketReader,
) {
    while reader.remaining_len() > 0 {
        let key = reader.read_string();
        let value = reader.read_string();
        conn.data().push_user_data(key, value).await;
    }
}

async fn chat_message(server: Arc<ServerManager>, conn: Arc<Connection>, mut reader: PacketReader) {
    let text = reader.read_string();
    let room_id = reader.read_i32();
    server.chatrooms().send_chat(&conn, room_id, &text).await;
}

async fn join_chatroom(
    server: Arc<ServerManager>,
    conn: Arc<Connection>,
    mut reader: PacketReader,
) {
    let room_id = reader.read_i32();
    let password = reader.read_string();
    let state = server
        .chatrooms()
        .join_chatroom(conn.clone(), room_id, &password)
        .await;
    conn.send(&composers::join_chatroom(room_id, state));
}

async fn voice_message(
    server: Arc<ServerManager>,
    conn: Arc<Connection>,
    mut reader: PacketReader,
) {
    let length = reader.read_i32().max(0) as usize;
    let voice = reader.read_bytes(length);
    let room_id = reader.read_i32();
    let transcoded = server.transcoder().transcode(&voice);
    server
        .chatrooms()
        .send_voice(&conn, room_id, &transcoded)
        .await;
}

async fn create_room(server: Arc<ServerManager>, conn: Arc<Connection>, mut reader: PacketReader) {
    let name = reader.read_string();
    let description = reader.read_string();
    let password = reader.read_string();
    if name.trim().is_empty() {
        debug!(connection_id = conn.id(), "ignoring room with empty name");
        return;
    }
    let room = server
        .chatrooms()
        .create_chatroom(conn.clone(), name, description, password)
        .await;
    conn.send(&composers::join_chatroom(
        room.id(),
        crate::protocol::JoinState::Ok,
    ));
}

async fn leave_chatroom(
    server: Arc<ServerManager>,
    conn: Arc<Connection>,
    mut reader: PacketReader,
) {
    // The client echoes its own id ahead of the room id.
    let _user_id = reader.read_i32();
    let room_id = reader.read_i32();
    server.chatrooms().leave_room(&conn, room_id).await;
}

async fn join_queue(server: Arc<ServerManager>, conn: Arc<Connection>, mut reader: PacketReader) {
    match reader.read_i32() {
        0 => server.private_rooms().enqueue(conn).await,
        1 => server.private_rooms().remove(&conn).await,
        other => {
            debug!(
                connection_id = conn.id(),
                action = other,
                "unknown matchmaking action"
            );
        }
    }
}

async fn register_account(
    server: Arc<ServerManager>,
    conn: Arc<Connection>,
    mut reader: PacketReader,
) {
    let username = reader.read_string();
    let password = reader.read_string();
    let state = server.repository().register(&username, &password);
    conn.send(&composers::register_account(state));
}

async fn login_account(
    server: Arc<ServerManager>,
    conn: Arc<Connection>,
    mut reader: PacketReader,
) {
    let account_id = reader.read_i32();
    let password = reader.read_string();
    let state = server.repository().login(account_id, &password);
    conn.send(&composers::login_account(state));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::packets::server_packets;
    use crate::protocol::{JoinState, MessageWriter};
    use crate::server::connection::test_support::{connection_pair, drain_packets};
    use crate::server::repository::{LoginState, RegisterState};
    use crate::ServerConfig;

    async fn dispatch(server: &Arc<ServerManager>, conn: &Arc<Connection>, msg: MessageWriter) {
        let reader = PacketReader::new(msg.to_bytes().slice(4..));
        server
            .packet_manager()
            .dispatch(server.clone(), conn.clone(), reader)
            .await;
    }

    #[tokio::test]
    async fn test_handshake_sets_username_and_replies() {
        let server = ServerManager::new(ServerConfig::default());
        let (conn, mut rx) = connection_pair(7, Arc::downgrade(&server));

        let mut msg = MessageWriter::new(client_packets::INITIALIZE_CONNECTION);
        msg.write_string("alice");
        dispatch(&server, &conn, msg).await;

        assert_eq!(conn.data().username().await, "alice");
        let mut packets = drain_packets(&mut rx);
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].packet_id(), server_packets::INITIALIZE_CONNECTION);
        assert_eq!(packets[0].read_i32(), 7);
        assert_eq!(packets[1].packet_id(), server_packets::INITIALIZE_CHATROOMS);
    }

    #[tokio::test]
    async fn test_handshake_keeps_placeholder_for_empty_name() {
        let server = ServerManager::new(ServerConfig::default());
        let (conn, _rx) = connection_pair(1, Arc::downgrade(&server));
        let placeholder = conn.data().username().await;

        let mut msg = MessageWriter::new(client_packets::INITIALIZE_CONNECTION);
        msg.write_string("");
        dispatch(&server, &conn, msg).await;
        assert_eq!(conn.data().username().await, placeholder);
    }

    #[tokio::test]
    async fn test_keep_alive_echoes_client_time() {
        let server = ServerManager::new(ServerConfig::default());
        let (conn, mut rx) = connection_pair(1, Arc::downgrade(&server));

        let mut msg = MessageWriter::new(client_packets::KEEP_ALIVE);
        msg.write_i32(555);
        dispatch(&server, &conn, msg).await;

        let mut packets = drain_packets(&mut rx);
        assert_eq!(packets.len(), 1);
        let reply = &mut packets[0];
        assert_eq!(reply.packet_id(), server_packets::KEEP_ALIVE);
        assert_eq!(reply.read_i32(), 555);
        assert!(reply.read_i32() > 0);
    }

    #[tokio::test]
    async fn test_connection_data_collects_pairs() {
        let server = ServerManager::new(ServerConfig::default());
        let (conn, _rx) = connection_pair(1, Arc::downgrade(&server));

        let mut msg = MessageWriter::new(client_packets::CONNECTION_DATA);
        msg.write_string("client");
        msg.write_string("desktop");
        msg.write_string("version");
        msg.write_string("2.1");
        dispatch(&server, &conn, msg).await;

        let data = conn.data().user_data().await;
        assert_eq!(data.len(), 2);
        assert_eq!(data[0], ("client".to_string(), "desktop".to_string()));
        assert_eq!(data[1], ("version".to_string(), "2.1".to_string()));
    }

    #[tokio::test]
    async fn test_create_room_rejects_empty_name() {
        let server = ServerManager::new(ServerConfig::default());
        let (conn, mut rx) = connection_pair(1, Arc::downgrade(&server));

        let mut msg = MessageWriter::new(client_packets::CREATE_ROOM);
        msg.write_string("   ");
        msg.write_string("desc");
        msg.write_string("");
        dispatch(&server, &conn, msg).await;

        assert_eq!(server.chatrooms().room_count().await, 0);
        assert!(drain_packets(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_create_then_join_flow() {
        let server = ServerManager::new(ServerConfig::default());
        let (creator, mut creator_rx) = connection_pair(1, Arc::downgrade(&server));
        let (guest, mut guest_rx) = connection_pair(2, Arc::downgrade(&server));
        server.connections().register(creator.clone()).await;
        server.connections().register(guest.clone()).await;

        let mut create = MessageWriter::new(client_packets::CREATE_ROOM);
        create.write_string("lobby");
        create.write_string("general chat");
        create.write_string("");
        dispatch(&server, &creator, create).await;

        let packets = drain_packets(&mut creator_rx);
        assert!(packets
            .iter()
            .any(|p| p.packet_id() == server_packets::JOIN_CHATROOM));

        let room_list = drain_packets(&mut guest_rx);
        assert!(room_list
            .iter()
            .any(|p| p.packet_id() == server_packets::INITIALIZE_CHATROOMS));

        let room_id = 1;
        let mut join = MessageWriter::new(client_packets::JOIN_CHATROOM);
        join.write_i32(room_id);
        join.write_string("");
        dispatch(&server, &guest, join).await;

        let mut packets = drain_packets(&mut guest_rx);
        let reply = packets
            .iter_mut()
            .find(|p| p.packet_id() == server_packets::JOIN_CHATROOM)
            .unwrap();
        assert_eq!(reply.read_i32(), room_id);
        assert_eq!(reply.read_i32(), JoinState::Ok.as_i32());
    }

    #[tokio::test]
    async fn test_chat_message_relays_to_room() {
        let server = ServerManager::new(ServerConfig::default());
        let (alice, mut alice_rx) = connection_pair(1, Arc::downgrade(&server));
        alice.data().set_username("alice".into()).await;
        let room = server
            .chatrooms()
            .create_chatroom(alice.clone(), "lobby".into(), String::new(), String::new())
            .await;
        drain_packets(&mut alice_rx);

        let mut msg = MessageWriter::new(client_packets::CHAT_MESSAGE);
        msg.write_string("hello room");
        msg.write_i32(room.id());
        dispatch(&server, &alice, msg).await;

        let mut packets = drain_packets(&mut alice_rx);
        assert_eq!(packets.len(), 1);
        let relay = &mut packets[0];
        assert_eq!(relay.packet_id(), server_packets::CHAT_MESSAGE);
        assert_eq!(relay.read_i32(), room.id());
        relay.read_i32();
        assert_eq!(relay.read_i32(), alice.id());
        assert_eq!(relay.read_string(), "alice");
        assert_eq!(relay.read_string(), "hello room");
    }

    #[tokio::test]
    async fn test_voice_message_relays_payload() {
        let server = ServerManager::new(ServerConfig::default());
        let (alice, mut alice_rx) = connection_pair(1, Arc::downgrade(&server));
        let room = server
            .chatrooms()
            .create_chatroom(alice.clone(), "lobby".into(), String::new(), String::new())
            .await;
        drain_packets(&mut alice_rx);

        let voice = [1u8, 2, 3];
        let mut msg = MessageWriter::new(client_packets::VOICE_MESSAGE);
        msg.write_i32(voice.len() as i32);
        msg.write_bytes(&voice);
        msg.write_i32(room.id());
        dispatch(&server, &alice, msg).await;

        let mut packets = drain_packets(&mut alice_rx);
        assert_eq!(packets.len(), 1);
        let relay = &mut packets[0];
        assert_eq!(relay.packet_id(), server_packets::VOICE_MESSAGE);
        relay.read_i32();
        relay.read_i32();
        relay.read_i32();
        let len = relay.read_i32() as usize;
        relay.read_string();
        assert_eq!(&relay.read_bytes(len)[..], &voice[..]);
    }

    #[tokio::test]
    async fn test_leave_chatroom_removes_member() {
        let server = ServerManager::new(ServerConfig::default());
        let (alice, _arx) = connection_pair(1, Arc::downgrade(&server));
        let (bob, _brx) = connection_pair(2, Arc::downgrade(&server));
        let room = server
            .chatrooms()
            .create_chatroom(alice.clone(), "lobby".into(), String::new(), String::new())
            .await;
        server
            .chatrooms()
            .join_chatroom(bob.clone(), room.id(), "")
            .await;

        let mut msg = MessageWriter::new(client_packets::LEAVE_CHATROOM);
        msg.write_i32(bob.id());
        msg.write_i32(room.id());
        dispatch(&server, &bob, msg).await;
        assert!(!room.contains(&bob).await);
        assert!(room.contains(&alice).await);
    }

    #[tokio::test]
    async fn test_join_queue_actions() {
        let server = ServerManager::new(ServerConfig::default());
        let (alice, _rx) = connection_pair(1, Arc::downgrade(&server));

        let mut enter = MessageWriter::new(client_packets::JOIN_QUEUE);
        enter.write_i32(0);
        dispatch(&server, &alice, enter).await;
        assert_eq!(server.private_rooms().len().await, 1);

        let mut exit = MessageWriter::new(client_packets::JOIN_QUEUE);
        exit.write_i32(1);
        dispatch(&server, &alice, exit).await;
        assert_eq!(server.private_rooms().len().await, 0);
    }

    #[tokio::test]
    async fn test_register_and_login_accounts() {
        let server = ServerManager::new(ServerConfig::default());
        let (conn, mut rx) = connection_pair(1, Arc::downgrade(&server));

        let mut register = MessageWriter::new(client_packets::REGISTER_ACCOUNT);
        register.write_string("alice");
        register.write_string("secret");
        dispatch(&server, &conn, register).await;

        let mut packets = drain_packets(&mut rx);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].packet_id(), server_packets::REGISTER_ACCOUNT);
        assert_eq!(packets[0].read_i32(), RegisterState::Ok.as_i32());

        let account_id = server.repository().lookup(1).unwrap().id;
        let mut login = MessageWriter::new(client_packets::LOGIN_ACCOUNT);
        login.write_i32(account_id);
        login.write_string("wrong");
        dispatch(&server, &conn, login).await;

        let mut packets = drain_packets(&mut rx);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].packet_id(), server_packets::LOGIN_ACCOUNT);
        assert_eq!(packets[0].read_i32(), LoginState::WrongPassword.as_i32());
    }
}
