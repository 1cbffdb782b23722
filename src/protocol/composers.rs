//! Builders for outgoing server packets
//!
//! Each composer returns a [`MessageWriter`] so callers can append further
//! fields (room descriptors, for instance) before sending.

use crate::protocol::packets::{server_packets, JoinState};
use crate::protocol::wire::MessageWriter;
use crate::server::repository::{LoginState, RegisterState};

/// Handshake reply carrying the id assigned to the new connection.
pub fn initialize_connection(connection_id: i32) -> MessageWriter {
    let mut msg = MessageWriter::new(server_packets::INITIALIZE_CONNECTION);
    msg.write_i32(connection_id);
    msg
}

/// Keep-alive reply echoing the client's timestamp alongside the server's.
pub fn keep_alive(client_time: i32, server_time: i32) -> MessageWriter {
    let mut msg = MessageWriter::new(server_packets::KEEP_ALIVE);
    msg.write_i32(client_time);
    msg.write_i32(server_time);
    msg
}

/// Chat line relayed to every member of a room.
pub fn chat_message(
    room_id: i32,
    message_id: i32,
    user_id: i32,
    username: &str,
    text: &str,
) -> MessageWriter {
    let mut msg = MessageWriter::new(server_packets::CHAT_MESSAGE);
    msg.write_i32(room_id);
    msg.write_i32(message_id);
    msg.write_i32(user_id);
    msg.write_string(username);
    msg.write_string(text);
    msg
}

/// Voice payload relayed to every member of a room.
pub fn voice_message(
    room_id: i32,
    message_id: i32,
    user_id: i32,
    username: &str,
    voice: &[u8],
) -> MessageWriter {
    let mut msg = MessageWriter::new(server_packets::VOICE_MESSAGE);
    msg.write_i32(room_id);
    msg.write_i32(message_id);
    msg.write_i32(user_id);
    msg.write_i32(voice.len() as i32);
    msg.write_string(username);
    msg.write_bytes(voice);
    msg
}

/// System announcement line; carries no username field, the text already
/// names the subject.
pub fn broadcast_chat_message(
    room_id: i32,
    message_id: i32,
    user_id: i32,
    text: &str,
) -> MessageWriter {
    let mut msg = MessageWriter::new(server_packets::BROADCAST_CHAT_MESSAGE);
    msg.write_i32(room_id);
    msg.write_i32(message_id);
    msg.write_i32(user_id);
    msg.write_string(text);
    msg
}

/// Join response for a room join attempt.
pub fn join_chatroom(room_id: i32, state: JoinState) -> MessageWriter {
    let mut msg = MessageWriter::new(server_packets::JOIN_CHATROOM);
    msg.write_i32(room_id);
    msg.write_i32(state.as_i32());
    msg
}

/// Private room offer; the caller appends the room descriptor.
pub fn create_private_room(name: &str) -> MessageWriter {
    let mut msg = MessageWriter::new(server_packets::CREATE_PRIVATE_ROOM);
    msg.write_string(name);
    msg
}

/// Tells a departing member their private room is gone.
pub fn remove_private_room(room_id: i32) -> MessageWriter {
    let mut msg = MessageWriter::new(server_packets::REMOVE_PRIVATE_ROOM);
    msg.write_i32(room_id);
    msg
}

/// Account registration outcome.
pub fn register_account(state: RegisterState) -> MessageWriter {
    let mut msg = MessageWriter::new(server_packets::REGISTER_ACCOUNT);
    msg.write_i32(state.as_i32());
    msg
}

/// Account login outcome.
pub fn login_account(state: LoginState) -> MessageWriter {
    let mut msg = MessageWriter::new(server_packets::LOGIN_ACCOUNT);
    msg.write_i32(state.as_i32());
    msg
}
