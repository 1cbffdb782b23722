//! Server runtime: connections, packet dispatch, rooms and matchmaking

pub mod chatroom;
pub mod chatroom_manager;
pub mod connection;
pub mod connection_controller;
pub mod handlers;
pub mod packet_manager;
pub mod private_room_manager;
pub mod repository;
pub mod server_manager;

pub use chatroom::Chatroom;
pub use connection::Connection;
pub use server_manager::ServerManager;
