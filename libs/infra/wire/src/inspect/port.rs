// [libs/infra/wire/src/inspect/port.rs]
//! Port channel (USB redirection passthrough and webdav). The wire
//! message table is identical in both directions. `vmc_data` carries a
//! nested usb_redir sub-protocol header; only its `usb_redir_hello`
//! variant (version string + capability bitmask) is decoded, and only
//! under intimate inspection — everything else in the usb_redir stream
//! is opaque device traffic this proxy has no business parsing.

use super::common::{self, Parsed};
use crate::constants::{port_types, usb_redir};
use crate::error::WireError;
use crate::miniheader;
use byteorder::{ByteOrder, LittleEndian};
use tracing::trace;

#[derive(Debug, Default)]
pub struct PortInspector;

impl PortInspector {
    pub fn new() -> Self {
        PortInspector
    }

    pub fn inspect_client(&mut self, buffered: &[u8], intimate: bool) -> Result<Option<Parsed>, WireError> {
        self.inspect(buffered, intimate, common::process_common_client_message)
    }

    pub fn inspect_server(&mut self, buffered: &[u8], intimate: bool) -> Result<Option<Parsed>, WireError> {
        // The reference implementation's server-side port inspector is
        // literally the client one reused; the vmc_data/vmc_compressed_data
        // table is shared in both directions.
        self.inspect(buffered, intimate, common::process_common_client_message)
    }

    fn inspect(
        &mut self,
        buffered: &[u8],
        intimate: bool,
        process_common: fn(&[u8], u16, u32, usize) -> Option<Parsed>,
    ) -> Result<Option<Parsed>, WireError> {
        let frame = match miniheader::try_parse(buffered)? {
            Some(f) => f,
            None => return Ok(None),
        };
        let message_size = frame.body.len() as u32;

        if let Some(parsed) = process_common(buffered, frame.message_type, message_size, frame.total_len) {
            return Ok(Some(parsed));
        }

        match frame.message_type {
            port_types::VMC_DATA if frame.body.len() >= 12 => {
                let vmc_type = LittleEndian::read_u32(&frame.body[0..4]);
                let vmc_length = LittleEndian::read_u32(&frame.body[4..8]);
                let vmc_id = LittleEndian::read_u32(&frame.body[8..12]);
                trace!(name = usb_redir::name(vmc_type), vmc_length, vmc_id, "vmc_data");

                if intimate && vmc_type == usb_redir::HELLO && frame.body.len() >= 12 + 68 {
                    let version_bytes = &frame.body[12..12 + 64];
                    let nul = version_bytes.iter().position(|&b| b == 0).unwrap_or(version_bytes.len());
                    let version = String::from_utf8_lossy(&version_bytes[..nul]);
                    let capabilities = LittleEndian::read_u32(&frame.body[12 + 64..12 + 68]);
                    trace!(%version, capabilities, "usb_redir_hello");
                }
            }
            port_types::VMC_COMPRESSED_DATA => {
                trace!("vmc_compressed_data (undocumented, left opaque)");
            }
            _ => trace!(message_type = frame.message_type, "port channel frame undecoded"),
        }

        Ok(Some(common::passthrough_frame(buffered, frame.total_len)))
    }
}
