// [libs/infra/wire/src/inspect/inputs.rs]
//! Inputs channel. Keystrokes, scancodes and mouse events decode down to
//! scancode/coordinate level only when `TRAFFIC_INSPECTION_INTIMATE` is
//! set — this is the channel where that flag matters most, since it is
//! what keystroke logging would mean.

use super::common::{self, Parsed};
use crate::constants::inputs_types;
use crate::error::WireError;
use crate::miniheader;
use byteorder::{ByteOrder, LittleEndian};
use tracing::trace;

#[derive(Debug, Default)]
pub struct InputsInspector;

impl InputsInspector {
    pub fn new() -> Self {
        InputsInspector
    }

    pub fn inspect_client(&mut self, buffered: &[u8], intimate: bool) -> Result<Option<Parsed>, WireError> {
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

        if intimate {
            self.log_client_intimate(frame.message_type, frame.body);
        } else {
            trace!(
                message_type = frame.message_type,
                name = inputs_types::client::name(frame.message_type).unwrap_or("undecoded"),
                "inputs channel client frame"
            );
        }

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

        if intimate && frame.message_type == inputs_types::server::KEY_MODIFIERS {
            self.log_key_modifiers(frame.body);
        } else {
            trace!(
                message_type = frame.message_type,
                name = inputs_types::server::name(frame.message_type).unwrap_or("undecoded"),
                "inputs channel server frame"
            );
        }

        Ok(Some(common::passthrough_frame(buffered, frame.total_len)))
    }

    fn log_client_intimate(&self, message_type: u16, body: &[u8]) {
        match message_type {
            inputs_types::client::KEY_DOWN | inputs_types::client::KEY_UP if body.len() >= 4 => {
                let scancode = LittleEndian::read_u32(&body[0..4]);
                trace!(scancode = format!("0x{scancode:02x}"), "inputs key event");
            }
            inputs_types::client::KEY_MODIFIERS => self.log_key_modifiers(body),
            inputs_types::client::KEY_SCANCODE => {
                for &scancode in body {
                    trace!(scancode = format!("0x{scancode:02x}"), "inputs scancode");
                }
            }
            inputs_types::client::MOUSE_MOTION if body.len() >= 10 => {
                let x = LittleEndian::read_i32(&body[0..4]);
                let y = LittleEndian::read_i32(&body[4..8]);
                let buttons = LittleEndian::read_u16(&body[8..10]);
                trace!(x, y, buttons, "mouse motion delta");
            }
            inputs_types::client::MOUSE_POSITION if body.len() >= 11 => {
                let x = LittleEndian::read_u32(&body[0..4]);
                let y = LittleEndian::read_u32(&body[4..8]);
                let buttons = LittleEndian::read_u16(&body[8..10]);
                let display_id = body[10];
                trace!(x, y, buttons, display_id, "mouse position");
            }
            inputs_types::client::MOUSE_PRESS | inputs_types::client::MOUSE_RELEASE if body.len() >= 3 => {
                let buttons = LittleEndian::read_u16(&body[0..2]);
                let display_id = body[2];
                trace!(buttons, display_id, "mouse button event");
            }
            _ => trace!(message_type, "inputs client frame undecoded"),
        }
    }

    fn log_key_modifiers(&self, body: &[u8]) {
        if body.len() < 2 {
            return;
        }
        let modifiers = LittleEndian::read_u16(&body[0..2]);
        trace!(
            scroll_lock = modifiers & 1 != 0,
            num_lock = modifiers & 2 != 0,
            caps_lock = modifiers & 4 != 0,
            "key modifiers"
        );
    }
}
