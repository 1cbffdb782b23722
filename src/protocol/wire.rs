//! Primitive encodings for outgoing and incoming packets
//!
//! All integers are little-endian. Strings are an i32 UTF-8 byte-length
//! prefix followed by the bytes; raw byte blobs are delimited by an explicit
//! i32 the caller writes beforehand.

use bytes::{BufMut, Bytes, BytesMut};

/// Builder for one outgoing packet.
///
/// The writer accumulates the packet id and payload; [`MessageWriter::to_bytes`]
/// prepends the length prefix and yields the complete frame.
#[derive(Debug, Clone)]
pub struct MessageWriter {
    packet_id: u16,
    buf: BytesMut,
}

impl MessageWriter {
    /// Start a new packet with the given id
    pub fn new(packet_id: u16) -> Self {
        let mut buf = BytesMut::with_capacity(64);
        buf.put_u16_le(packet_id);
        Self { packet_id, buf }
    }

    /// Packet id this writer was started with
    pub fn packet_id(&self) -> u16 {
        self.packet_id
    }

    /// Append a 4-byte signed integer
    pub fn write_i32(&mut self, value: i32) {
        self.buf.put_i32_le(value);
    }

    /// Append a single 0/1 byte
    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(value as u8);
    }

    /// Append a length-prefixed UTF-8 string
    pub fn write_string(&mut self, value: &str) {
        self.write_i32(value.len() as i32);
        self.buf.put_slice(value.as_bytes());
    }

    /// Append raw bytes (caller is responsible for writing a preceding length)
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.buf.put_slice(value);
    }

    /// Encode the complete frame: length prefix, packet id, payload
    pub fn to_bytes(&self) -> Bytes {
        let mut framed = BytesMut::with_capacity(4 + self.buf.len());
        framed.put_u32_le(self.buf.len() as u32);
        framed.extend_from_slice(&self.buf);
        framed.freeze()
    }
}

/// Cursor over one received frame body (packet id plus payload).
///
/// Decoding is defensive: reads past the end of the frame never panic and
/// never fail, they return a zero value (or a truncated string/blob) and
/// consume whatever remains, so malformed input degrades instead of killing
/// the connection.
#[derive(Debug)]
pub struct PacketReader {
    frame: Bytes,
    pos: usize,
    packet_id: u16,
}

impl PacketReader {
    /// Wrap a frame body and read its leading 2-byte packet id
    pub fn new(frame: Bytes) -> Self {
        let mut reader = Self {
            frame,
            pos: 0,
            packet_id: 0,
        };
        reader.packet_id = reader.read_u16();
        reader
    }

    /// Packet id read from the head of the frame
    pub fn packet_id(&self) -> u16 {
        self.packet_id
    }

    /// Bytes left unread in this frame
    pub fn remaining_len(&self) -> usize {
        self.frame.len() - self.pos
    }

    fn read_u16(&mut self) -> u16 {
        if self.remaining_len() < 2 {
            self.pos = self.frame.len();
            return 0;
        }
        let value = u16::from_le_bytes([self.frame[self.pos], self.frame[self.pos + 1]]);
        self.pos += 2;
        value
    }

    /// Read a 4-byte signed integer, or 0 when fewer than 4 bytes remain
    pub fn read_i32(&mut self) -> i32 {
        if self.remaining_len() < 4 {
            self.pos = self.frame.len();
            return 0;
        }
        let value = i32::from_le_bytes([
            self.frame[self.pos],
            self.frame[self.pos + 1],
            self.frame[self.pos + 2],
            self.frame[self.pos + 3],
        ]);
        self.pos += 4;
        value
    }

    /// Read a single boolean byte, or false when the frame is exhausted
    pub fn read_bool(&mut self) -> bool {
        let byte = self.read_bytes(1);
        byte.first() == Some(&1)
    }

    /// Read a length-prefixed UTF-8 string; truncated or invalid input
    /// yields the readable portion
    pub fn read_string(&mut self) -> String {
        let length = self.read_i32().max(0) as usize;
        let bytes = self.read_bytes(length);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Read up to `length` raw bytes, truncated to what remains
    pub fn read_bytes(&mut self, length: usize) -> Bytes {
        let take = length.min(self.remaining_len());
        let bytes = self.frame.slice(self.pos..self.pos + take);
        self.pos += take;
        bytes
    }
}
