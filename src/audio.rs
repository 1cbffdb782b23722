//! Voice payload transcoding seam
//!
//! Voice packets pass through the server opaque by default; a transcoder can
//! be plugged in to re-encode payloads on the way through.

/// Converts voice payloads between the client codec and raw PCM.
pub trait VoiceTranscoder: Send + Sync {
    /// Encode raw PCM into the client codec
    fn encode(&self, pcm: &[u8]) -> Vec<u8>;

    /// Decode a client payload into raw PCM
    fn decode(&self, data: &[u8]) -> Vec<u8>;

    /// Re-encode a payload for relaying
    fn transcode(&self, data: &[u8]) -> Vec<u8> {
        self.encode(&self.decode(data))
    }
}

/// Relays voice payloads unchanged.
pub struct Passthrough;

impl VoiceTranscoder for Passthrough {
    fn encode(&self, pcm: &[u8]) -> Vec<u8> {
        pcm.to_vec()
    }

    fn decode(&self, data: &[u8]) -> Vec<u8> {
        data.to_vec()
    }
}
