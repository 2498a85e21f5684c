// [libs/infra/wire/src/inspect/mod.rs]
//! Per-channel traffic inspection. One `ChannelInspector` is constructed
//! per proxied channel, picked by `channel_type` at link time, and lives
//! for the channel's whole lifetime so stateful channels (none currently
//! need state, but the shape allows it) can track across frames.

pub mod common;
pub mod cursor;
pub mod display;
pub mod inputs;
pub mod main;
pub mod port;
pub mod unknown;

pub use common::Parsed;

use crate::constants::channel;
use crate::error::WireError;

/// A closed sum type over the six channel-specific parsers, dispatched
/// once at channel-open time instead of via a trait object.
pub enum ChannelInspector {
    Main(main::MainInspector),
    Display(display::DisplayInspector),
    Inputs(inputs::InputsInspector),
    Cursor(cursor::CursorInspector),
    Port(port::PortInspector),
    Unknown(unknown::UnknownInspector),
}

impl ChannelInspector {
    pub fn for_channel_type(channel_type: u8) -> Self {
        match channel_type {
            channel::MAIN => ChannelInspector::Main(main::MainInspector::new()),
            channel::DISPLAY => ChannelInspector::Display(display::DisplayInspector::new()),
            channel::INPUTS => ChannelInspector::Inputs(inputs::InputsInspector::new()),
            channel::CURSOR => ChannelInspector::Cursor(cursor::CursorInspector::new()),
            channel::PORT | channel::USBREDIR | channel::WEBDAV => {
                ChannelInspector::Port(port::PortInspector::new())
            }
            _ => ChannelInspector::Unknown(unknown::UnknownInspector::new()),
        }
    }

    /// Inspect the next client→server frame at the front of `buffered`.
    /// Returns `Ok(None)` when a full frame has not yet arrived.
    pub fn inspect_client(&mut self, buffered: &[u8], intimate: bool) -> Result<Option<Parsed>, WireError> {
        match self {
            ChannelInspector::Main(s) => s.inspect_client(buffered),
            ChannelInspector::Display(s) => s.inspect_client(buffered),
            ChannelInspector::Inputs(s) => s.inspect_client(buffered, intimate),
            ChannelInspector::Cursor(s) => s.inspect_client(buffered),
            ChannelInspector::Port(s) => s.inspect_client(buffered, intimate),
            ChannelInspector::Unknown(s) => s.inspect_client(buffered),
        }
    }

    /// Inspect the next server→client frame. `traffic_inspection` gates
    /// the display channel's size/rectangle mutation; `intimate` gates
    /// deeper forensic decoding on every channel.
    pub fn inspect_server(
        &mut self,
        buffered: &[u8],
        traffic_inspection: bool,
        intimate: bool,
    ) -> Result<Option<Parsed>, WireError> {
        match self {
            ChannelInspector::Main(s) => s.inspect_server(buffered),
            ChannelInspector::Display(s) => s.inspect_server(buffered, traffic_inspection, intimate),
            ChannelInspector::Inputs(s) => s.inspect_server(buffered, intimate),
            ChannelInspector::Cursor(s) => s.inspect_server(buffered, intimate),
            ChannelInspector::Port(s) => s.inspect_server(buffered, intimate),
            ChannelInspector::Unknown(s) => s.inspect_server(buffered),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miniheader;

    #[test]
    fn unknown_channel_marks_zero_body_as_ack() {
        let mut inspector = ChannelInspector::for_channel_type(99);
        let frame = miniheader::encode(2, &[]);
        let parsed = inspector.inspect_client(&frame, false).unwrap().unwrap();
        assert!(parsed.is_ack);
        assert_eq!(parsed.bytes_consumed, frame.len());
    }

    #[test]
    fn display_surface_create_grows_when_inspection_enabled() {
        use byteorder::{ByteOrder, LittleEndian};
        let mut body = [0u8; 20];
        LittleEndian::write_u32(&mut body[0..4], 1); // surface id
        LittleEndian::write_u32(&mut body[4..8], 800); // width
        LittleEndian::write_u32(&mut body[8..12], 600); // height
        let frame = miniheader::encode(crate::constants::display_types::server::SURFACE_CREATE, &body);

        let mut inspector = ChannelInspector::for_channel_type(crate::constants::channel::DISPLAY);
        let parsed = inspector.inspect_server(&frame, true, false).unwrap().unwrap();

        let out_body = &parsed.bytes_to_forward[6..];
        let width = LittleEndian::read_u32(&out_body[4..8]);
        let height = LittleEndian::read_u32(&out_body[8..12]);
        assert_eq!(width, 820);
        assert_eq!(height, 620);
        assert_eq!(parsed.inserted_count, 0);
    }

    #[test]
    fn display_surface_create_untouched_when_inspection_disabled() {
        use byteorder::{ByteOrder, LittleEndian};
        let mut body = [0u8; 20];
        LittleEndian::write_u32(&mut body[4..8], 800);
        LittleEndian::write_u32(&mut body[8..12], 600);
        let frame = miniheader::encode(crate::constants::display_types::server::SURFACE_CREATE, &body);

        let mut inspector = ChannelInspector::for_channel_type(crate::constants::channel::DISPLAY);
        let parsed = inspector.inspect_server(&frame, false, false).unwrap().unwrap();
        assert_eq!(parsed.bytes_to_forward, frame);
    }
}
