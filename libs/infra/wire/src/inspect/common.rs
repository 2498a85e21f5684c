// [libs/infra/wire/src/inspect/common.rs]
//! Shared mini-header message accounting. Both the client→server and
//! server→client common-message tables (ack/ping/migrate/notify/...)
//! apply identically regardless of which channel they ride on.

use crate::constants::client_common;
use crate::constants::server_common;
use crate::error::WireError;
use crate::miniheader;
use byteorder::{ByteOrder, LittleEndian};

/// The result of inspecting one frame's worth of traffic.
#[derive(Debug, Clone)]
pub struct Parsed {
    /// What should actually be written to the peer. Identical to the
    /// consumed input bytes unless traffic inspection mutated the frame.
    pub bytes_to_forward: Vec<u8>,
    /// How many bytes of the input buffer this frame consumed.
    pub bytes_consumed: usize,
    /// Extra whole frames appended after `bytes_to_forward` that did not
    /// exist in the input stream (used by the display "warning border"
    /// feature; zero while that feature is disabled).
    pub inserted_count: usize,
    /// True if this frame is a zero-body ack, which the proxy's
    /// ack-absorption accounting must not double count.
    pub is_ack: bool,
}

impl Parsed {
    fn passthrough(buffered: &[u8], consumed: usize) -> Self {
        Parsed {
            bytes_to_forward: buffered[..consumed].to_vec(),
            bytes_consumed: consumed,
            inserted_count: 0,
            is_ack: false,
        }
    }

    fn ack(buffered: &[u8], consumed: usize) -> Self {
        let mut parsed = Self::passthrough(buffered, consumed);
        parsed.is_ack = true;
        parsed
    }
}

/// Try to handle a frame using the client→server common message table.
/// Returns `None` when `message_type` is channel-specific, leaving the
/// frame for the caller's own table.
pub fn process_common_client_message(
    buffered: &[u8],
    message_type: u16,
    message_size: u32,
    total_len: usize,
) -> Option<Parsed> {
    if message_size == 0 {
        return Some(Parsed::ack(buffered, total_len));
    }

    match client_common::name(message_type) {
        Some("ack_sync") | Some("pong") | Some("migrate_flush_mark") | Some("migrate_data") => {
            Some(Parsed::passthrough(buffered, total_len))
        }
        Some("ack") => Some(Parsed::ack(buffered, total_len)),
        Some("disconnecting") => Some(Parsed::passthrough(buffered, total_len)),
        _ => None,
    }
}

/// Try to handle a frame using the server→client common message table.
pub fn process_common_server_message(
    buffered: &[u8],
    message_type: u16,
    message_size: u32,
    total_len: usize,
) -> Option<Parsed> {
    if message_size == 0 {
        return Some(Parsed::passthrough(buffered, total_len));
    }

    match server_common::name(message_type) {
        Some("migrate") | Some("migrate_data") | Some("set_ack") | Some("ping")
        | Some("wait_for_channels") | Some("disconnecting") | Some("notify") => {
            Some(Parsed::passthrough(buffered, total_len))
        }
        _ => None,
    }
}

/// Read the 6-byte mini-header without consuming it, for callers that
/// need `message_type`/`message_size` before delegating.
pub fn peek_header(buffered: &[u8]) -> Result<Option<(u16, u32)>, WireError> {
    match miniheader::try_parse(buffered)? {
        Some(frame) => {
            let size = LittleEndian::read_u32(&buffered[2..6]);
            Ok(Some((frame.message_type, size)))
        }
        None => Ok(None),
    }
}

pub fn passthrough_frame(buffered: &[u8], total_len: usize) -> Parsed {
    Parsed::passthrough(buffered, total_len)
}

pub fn insert_frames(parsed: &mut Parsed, extra_frames: Vec<Vec<u8>>) {
    parsed.inserted_count += extra_frames.len();
    for frame in extra_frames {
        parsed.bytes_to_forward.extend_from_slice(&frame);
    }
}
