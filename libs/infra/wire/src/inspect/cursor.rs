// [libs/infra/wire/src/inspect/cursor.rs]
//! Cursor channel. `move`/`set`/`init` coordinates decode only under
//! intimate inspection; every other message is name-logged and forwarded
//! untouched.

use super::common::{self, Parsed};
use crate::constants::cursor_types;
use crate::error::WireError;
use crate::miniheader;
use byteorder::{ByteOrder, LittleEndian};
use tracing::trace;

#[derive(Debug, Default)]
pub struct CursorInspector;

impl CursorInspector {
    pub fn new() -> Self {
        CursorInspector
    }

    pub fn inspect_client(&mut self, buffered: &[u8]) -> Result<Option<Parsed>, WireError> {
        let frame = match miniheader::try_parse(buffered)? {
            Some(f) => f,
            None => return Ok(None),
        };
        let message_size = frame.body.len() as u32;
        if let Some(parsed) =
            common::process_common_client_message(buffered, frame.message_type, message_size, frame.total_len)
        {
            return Ok(Some(parsed));
        }
        trace!(message_type = frame.message_type, "cursor channel client frame undecoded");
        Ok(Some(common::passthrough_frame(buffered, frame.total_len)))
    }

    pub fn inspect_server(&mut self, buffered: &[u8], intimate: bool) -> Result<Option<Parsed>, WireError> {
        let frame = match miniheader::try_parse(buffered)? {
            Some(f) => f,
            None => return Ok(None),
        };
        let message_size = frame.body.len() as u32;
        if let Some(parsed) =
            common::process_common_server_message(buffered, frame.message_type, message_size, frame.total_len)
        {
            return Ok(Some(parsed));
        }

        if intimate {
            match frame.message_type {
                cursor_types::server::MOVE if frame.body.len() >= 4 => {
                    let x = LittleEndian::read_u16(&frame.body[0..2]);
                    let y = LittleEndian::read_u16(&frame.body[2..4]);
                    trace!(x, y, "cursor move");
                }
                cursor_types::server::SET if frame.body.len() >= 5 => {
                    let x = LittleEndian::read_u16(&frame.body[0..2]);
                    let y = LittleEndian::read_u16(&frame.body[2..4]);
                    let visible = frame.body[4] != 0;
                    trace!(x, y, visible, "cursor set");
                }
                cursor_types::server::INIT if frame.body.len() >= 9 => {
                    let x = LittleEndian::read_u16(&frame.body[0..2]);
                    let y = LittleEndian::read_u16(&frame.body[2..4]);
                    trace!(x, y, "cursor init");
                }
                _ => trace!(
                    message_type = frame.message_type,
                    name = cursor_types::server::name(frame.message_type).unwrap_or("undecoded"),
                    "cursor channel server frame"
                ),
            }
        } else {
            trace!(
                message_type = frame.message_type,
                name = cursor_types::server::name(frame.message_type).unwrap_or("undecoded"),
                "cursor channel server frame"
            );
        }

        Ok(Some(common::passthrough_frame(buffered, frame.total_len)))
    }
}
