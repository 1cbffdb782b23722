//! Packet id tables and protocol enums
//!
//! Ids below 100 are connection lifecycle, the 100 range is chat and rooms,
//! and the 200 range is accounts. Server and client tables overlap only where
//! both sides use the same id for a request/response pair.

/// Ids of packets the server sends.
pub mod server_packets {
    pub const INITIALIZE_CONNECTION: u16 = 1;
    pub const KEEP_ALIVE: u16 = 3;
    pub const CHAT_MESSAGE: u16 = 100;
    pub const INITIALIZE_CHATROOMS: u16 = 102;
    pub const JOIN_CHATROOM: u16 = 103;
    pub const VOICE_MESSAGE: u16 = 105;
    pub const BROADCAST_CHAT_MESSAGE: u16 = 107;
    pub const CREATE_PRIVATE_ROOM: u16 = 108;
    pub const REMOVE_PRIVATE_ROOM: u16 = 110;
    pub const REGISTER_ACCOUNT: u16 = 200;
    pub const LOGIN_ACCOUNT: u16 = 201;
}

/// Ids of packets the server receives.
pub mod client_packets {
    pub const INITIALIZE_CONNECTION: u16 = 2;
    pub const KEEP_ALIVE: u16 = 4;
    pub const CONNECTION_DATA: u16 = 5;
    pub const CHAT_MESSAGE: u16 = 101;
    pub const JOIN_CHATROOM: u16 = 104;
    pub const VOICE_MESSAGE: u16 = 106;
    pub const CREATE_ROOM: u16 = 109;
    pub const LEAVE_CHATROOM: u16 = 111;
    pub const JOIN_QUEUE: u16 = 112;
    pub const REGISTER_ACCOUNT: u16 = 200;
    pub const LOGIN_ACCOUNT: u16 = 201;
}

/// Outcome of a join request, sent back in the join response packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinState {
    Error,
    Ok,
    WrongPassword,
}

impl JoinState {
    /// Wire value for this outcome
    pub fn as_i32(self) -> i32 {
        match self {
            JoinState::Error => 0,
            JoinState::Ok => 1,
            JoinState::WrongPassword => 2,
        }
    }
}

/// Membership change announced to a room as a system chat line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BroadcastKind {
    UserJoined,
    UserLeft,
}

impl BroadcastKind {
    /// Announcement text for the given username
    pub fn message(self, username: &str) -> String {
        match self {
            BroadcastKind::UserJoined => format!("{} has joined the chatroom.", username),
            BroadcastKind::UserLeft => format!("{} has left the chatroom.", username),
        }
    }
}
