// [libs/infra/wire/src/miniheader.rs]
//! Post-link mini-header message framing: `type` (u16 LE) · `size` (u32 LE)
//! · `size` bytes of body.

use crate::error::WireError;
use crate::MAX_FRAME_BODY_BYTES;
use byteorder::{ByteOrder, LittleEndian};

pub const HEADER_LEN: usize = 6;

/// A decoded mini-header frame, borrowed from its originating buffer.
#[derive(Debug, Clone, Copy)]
pub struct MiniHeaderFrame<'a> {
    pub message_type: u16,
    pub body: &'a [u8],
    /// Total bytes this frame occupies in the source buffer (header + body).
    pub total_len: usize,
}

/// Attempt to decode one frame from the front of `buffered`.
///
/// Returns `Ok(None)` when there is not yet a full frame (caller should
/// wait for more bytes) and never indexes past `buffered.len()`.
pub fn try_parse(buffered: &[u8]) -> Result<Option<MiniHeaderFrame<'_>>, WireError> {
    if buffered.len() < HEADER_LEN {
        return Ok(None);
    }

    let message_type = LittleEndian::read_u16(&buffered[0..2]);
    let size = LittleEndian::read_u32(&buffered[2..6]);

    if size > MAX_FRAME_BODY_BYTES {
        return Err(WireError::FrameTooLarge(size));
    }

    let total_len = HEADER_LEN + size as usize;
    if buffered.len() < total_len {
        return Ok(None);
    }

    Ok(Some(MiniHeaderFrame {
        message_type,
        body: &buffered[HEADER_LEN..total_len],
        total_len,
    }))
}

/// Encode a mini-header frame (used when the proxy must itself emit a
/// message, e.g. an inserted frame — see `inspect::Parsed::inserted_count`).
pub fn encode(message_type: u16, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    let mut header = [0u8; HEADER_LEN];
    LittleEndian::write_u16(&mut header[0..2], message_type);
    LittleEndian::write_u32(&mut header[2..6], body.len() as u32);
    out.extend_from_slice(&header);
    out.extend_from_slice(body);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_header_yields_none() {
        let buf = [0u8, 1, 2];
        assert!(try_parse(&buf).unwrap().is_none());
    }

    #[test]
    fn zero_body_ack_parses_to_six_bytes() {
        // type = 2 (ack), size = 0
        let buf = [2u8, 0, 0, 0, 0, 0];
        let frame = try_parse(&buf).unwrap().unwrap();
        assert_eq!(frame.message_type, 2);
        assert_eq!(frame.total_len, 6);
        assert!(frame.body.is_empty());
    }

    #[test]
    fn split_read_then_completes() {
        let full = encode(7, b"hello");
        let (head, tail) = full.split_at(4);
        assert!(try_parse(head).unwrap().is_none());
        let mut joined = head.to_vec();
        joined.extend_from_slice(tail);
        let frame = try_parse(&joined).unwrap().unwrap();
        assert_eq!(frame.message_type, 7);
        assert_eq!(frame.body, b"hello");
    }

    #[test]
    fn oversized_declared_body_is_rejected() {
        let mut buf = vec![0u8; HEADER_LEN];
        LittleEndian::write_u32(&mut buf[2..6], MAX_FRAME_BODY_BYTES + 1);
        assert!(matches!(try_parse(&buf), Err(WireError::FrameTooLarge(_))));
    }
}
