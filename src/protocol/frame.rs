//! Streaming frame extraction from raw socket reads

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{Result, ServerError};

/// Minimum frame body: the 2-byte packet id.
const MIN_FRAME_LEN: usize = 2;

/// Reassembles length-prefixed frames from an arbitrary byte stream.
///
/// Socket reads rarely line up with frame boundaries; the codec buffers
/// whatever arrives and yields complete frame bodies (packet id plus payload,
/// length prefix stripped) in order.
#[derive(Debug)]
pub struct FrameCodec {
    buffer: BytesMut,
    max_frame: usize,
}

impl FrameCodec {
    /// Create a codec that rejects frames longer than `max_frame` bytes
    pub fn new(max_frame: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(max_frame),
            max_frame,
        }
    }

    /// Append freshly read bytes to the reassembly buffer
    pub fn feed(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Extract the next complete frame body, if one is buffered.
    ///
    /// Returns `Ok(None)` when more bytes are needed. A declared length
    /// larger than the configured maximum, or too small to hold a packet id,
    /// is a protocol error; the caller should clear the buffer and abandon
    /// the current read, the connection itself stays open.
    pub fn next_frame(&mut self) -> Result<Option<Bytes>> {
        if self.buffer.len() < 4 {
            return Ok(None);
        }
        let declared =
            u32::from_le_bytes([self.buffer[0], self.buffer[1], self.buffer[2], self.buffer[3]])
                as usize;
        if declared > self.max_frame {
            return Err(ServerError::protocol(format!(
                "frame length {} exceeds maximum {}",
                declared, self.max_frame
            )));
        }
        if declared < MIN_FRAME_LEN {
            return Err(ServerError::protocol(format!(
                "frame length {} too small to hold a packet id",
                declared
            )));
        }
        if self.buffer.len() < 4 + declared {
            return Ok(None);
        }
        self.buffer.advance(4);
        Ok(Some(self.buffer.split_to(declared).freeze()))
    }

    /// Discard all buffered bytes
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Bytes currently awaiting reassembly
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }
}
