// [libs/infra/wire/src/inspect/display.rs]
//! Display channel. Two server→client message types are mutated when
//! `traffic_inspection` is on, as a visible "this session is being
//! inspected" marker: `surface_create` grows the surface by 20x20 and
//! `draw_copy` shifts its target rectangle by 10x10. The companion
//! warning-border frame *insertion* stays dormant — the source project
//! carried it disabled (it triggered hypervisor-side OOM) and this port
//! keeps that call: `inserted_count` is always zero here.

use super::common::{self, Parsed};
use crate::constants::{display_forensics, display_types};
use crate::error::WireError;
use crate::miniheader;
use byteorder::{ByteOrder, LittleEndian};
use tracing::trace;

#[derive(Debug, Default)]
pub struct DisplayInspector;

impl DisplayInspector {
    pub fn new() -> Self {
        DisplayInspector
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
            name = display_types::client::name(frame.message_type).unwrap_or("undecoded"),
            "display channel client frame"
        );
        Ok(Some(common::passthrough_frame(buffered, frame.total_len)))
    }

    pub fn inspect_server(
        &mut self,
        buffered: &[u8],
        traffic_inspection: bool,
        intimate: bool,
    ) -> Result<Option<Parsed>, WireError> {
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

        let name = display_types::server::name(frame.message_type).unwrap_or("undecoded");

        if frame.message_type == display_types::server::SURFACE_CREATE && traffic_inspection {
            return Ok(Some(self.mutate_surface_create(buffered, frame.total_len)?));
        }

        if frame.message_type == display_types::server::DRAW_COPY {
            if intimate {
                self.log_draw_copy(frame.body);
            }
            if traffic_inspection {
                return Ok(Some(self.mutate_draw_copy(buffered, frame.total_len)?));
            }
        }

        trace!(message_type = frame.message_type, name, "display channel server frame");
        Ok(Some(common::passthrough_frame(buffered, frame.total_len)))
    }

    fn mutate_surface_create(&self, buffered: &[u8], total_len: usize) -> Result<Parsed, WireError> {
        let mut out = buffered[..total_len].to_vec();
        let body = &mut out[6..total_len];
        if body.len() < 20 {
            return Err(WireError::ProtocolError("surface_create body too short".into()));
        }
        let surface_id = LittleEndian::read_u32(&body[0..4]);
        let width = LittleEndian::read_u32(&body[4..8]);
        let height = LittleEndian::read_u32(&body[8..12]);
        let format = LittleEndian::read_u32(&body[12..16]);
        let flags = LittleEndian::read_u32(&body[16..20]);

        LittleEndian::write_u32(&mut body[4..8], width + 20);
        LittleEndian::write_u32(&mut body[8..12], height + 20);

        trace!(
            surface_id,
            width,
            height,
            format,
            flags,
            "surface_create altered to advertise inspection"
        );

        Ok(Parsed {
            bytes_to_forward: out,
            bytes_consumed: total_len,
            inserted_count: 0,
            is_ack: false,
        })
    }

    fn mutate_draw_copy(&self, buffered: &[u8], total_len: usize) -> Result<Parsed, WireError> {
        let mut out = buffered[..total_len].to_vec();
        let body = &mut out[6..total_len];
        if body.len() < 21 {
            return Err(WireError::ProtocolError("draw_copy body too short".into()));
        }
        let surface_id = LittleEndian::read_u32(&body[0..4]);
        let top = LittleEndian::read_u32(&body[4..8]);
        let left = LittleEndian::read_u32(&body[8..12]);
        let bottom = LittleEndian::read_u32(&body[12..16]);
        let right = LittleEndian::read_u32(&body[16..20]);
        let clip_type = body[20];

        LittleEndian::write_u32(&mut body[4..8], top + 10);
        LittleEndian::write_u32(&mut body[8..12], left + 10);
        LittleEndian::write_u32(&mut body[12..16], bottom + 10);
        LittleEndian::write_u32(&mut body[16..20], right + 10);

        trace!(surface_id, top, left, bottom, right, clip_type, "draw_copy rectangle shifted");

        Ok(Parsed {
            bytes_to_forward: out,
            bytes_consumed: total_len,
            inserted_count: 0,
            is_ack: false,
        })
    }

    fn log_draw_copy(&self, body: &[u8]) {
        if body.len() < 27 {
            return;
        }
        let surface_id = LittleEndian::read_u32(&body[0..4]);
        let clip_type = body[20];
        trace!(
            surface_id,
            clip = display_forensics::clip_type_name(clip_type),
            "draw_copy intimate decode (header only, pixels never decompressed)"
        );
    }
}
