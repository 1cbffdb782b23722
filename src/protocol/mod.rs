//! Wire protocol: framing, primitive encodings, packet ids and composers
//!
//! Every protocol message is one frame: a 4-byte little-endian length prefix
//! followed by a 2-byte packet id and the packet's payload. The length counts
//! everything after the prefix.

pub mod composers;
pub mod frame;
pub mod packets;
pub mod wire;

pub use frame::FrameCodec;
pub use packets::{BroadcastKind, JoinState};
pub use wire::{MessageWriter, PacketReader};
