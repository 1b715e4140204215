use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// First start-marker byte.
pub const START1: u8 = 0x0E;

/// Second start-marker byte.
pub const START2: u8 = 0xFF;

/// Both marker bytes in wire order.
pub const START_MARKER: [u8; 2] = [START1, START2];

/// Payload length of a status frame.
pub const PAYLOAD_LEN: usize = 56;

/// Marker plus payload.
pub const FRAME_LEN: usize = START_MARKER.len() + PAYLOAD_LEN;

/// Encode a status frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────┬──────────┬──────────────────────┐
/// │ START1   │ START2   │ Payload              │
/// │ 0x0E     │ 0xFF     │ (payload_len bytes)  │
/// └──────────┴──────────┴──────────────────────┘
/// ```
pub fn encode_frame(payload: &[u8], payload_len: usize, dst: &mut BytesMut) -> Result<()> {
    if payload.len() != payload_len {
        return Err(FrameError::PayloadLength {
            expected: payload_len,
            actual: payload.len(),
        });
    }
    dst.reserve(START_MARKER.len() + payload.len());
    dst.put_slice(&START_MARKER);
    dst.put_slice(payload);
    Ok(())
}

/// Configuration for frame reading and writing.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Payload bytes following the start marker. Default: 56.
    pub payload_len: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            payload_len: PAYLOAD_LEN,
        }
    }
}
