// [libs/infra/wire/src/inspect/main.rs]
//! Main channel: session bootstrap (`init`, `channels_list`,
//! `attach_channels`). Never mutated; the proxy only ever observes it.

use super::common::{self, Parsed};
use crate::constants::main_types;
use crate::error::WireError;
use crate::miniheader;
use tracing::trace;

#[derive(Debug, Default)]
pub struct MainInspector;

impl MainInspector {
    pub fn new() -> Self {
        MainInspector
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

        trace!(
            message_type = frame.message_type,
            name = main_types::client::name(frame.message_type).unwrap_or("undecoded"),
            "main channel client frame"
        );
        Ok(Some(common::passthrough_frame(buffered, frame.total_len)))
    }

    pub fn inspect_server(&mut self, buffered: &[u8]) -> Result<Option<Parsed>, WireError> {
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

        trace!(
            message_type = frame.message_type,
            name = main_types::server::name(frame.message_type).unwrap_or("undecoded"),
            "main channel server frame"
        );
        Ok(Some(common::passthrough_frame(buffered, frame.total_len)))
    }
}
