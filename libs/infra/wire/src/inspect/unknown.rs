// [libs/infra/wire/src/inspect/unknown.rs]
//! Channels this proxy was not told how to interpret (playback, record,
//! tunnel, webdav, or any future channel type). Still mini-header framed
//! — `MiniHeader` is the only capability this proxy advertises — so
//! frames can be counted and forwarded without understanding their
//! payload.

use super::common::{self, Parsed};
use crate::error::WireError;
use crate::miniheader;
use tracing::trace;

#[derive(Debug, Default)]
pub struct UnknownInspector;

impl UnknownInspector {
    pub fn new() -> Self {
        UnknownInspector
    }

    pub fn inspect_client(&mut self, buffered: &[u8]) -> Result<Option<Parsed>, WireError> {
        self.inspect(buffered)
    }

    pub fn inspect_server(&mut self, buffered: &[u8]) -> Result<Option<Parsed>, WireError> {
        self.inspect(buffered)
    }

    fn inspect(&mut self, buffered: &[u8]) -> Result<Option<Parsed>, WireError> {
        let frame = match miniheader::try_parse(buffered)? {
            Some(f) => f,
            None => return Ok(None),
        };
        let is_ack = frame.body.is_empty();
        trace!(message_type = frame.message_type, is_ack, "unknown channel frame");

        let mut parsed = common::passthrough_frame(buffered, frame.total_len);
        parsed.is_ack = is_ack;
        Ok(Some(parsed))
    }
}
