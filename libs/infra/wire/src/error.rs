// [libs/infra/wire/src/error.rs]
use thiserror::Error;

/// Errors the codec and link state machine distinguish. A peer is not a
/// conformant SPICE endpoint on the three magic/version variants; those
/// never retry. `ProtocolError` covers malformed post-header content.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("[WIRE_BAD_MAGIC] expected REDQ, got {0:?}")]
    BadMagic([u8; 4]),
    #[error("[WIRE_BAD_MAJOR] expected protocol major 2, got {0}")]
    BadMajor(u32),
    #[error("[WIRE_BAD_MINOR] expected protocol minor 2, got {0}")]
    BadMinor(u32),
    #[error("[WIRE_PROTOCOL_FAULT] {0}")]
    ProtocolError(String),
    #[error("[WIRE_FRAME_TOO_LARGE] declared body size {0} exceeds the safety ceiling")]
    FrameTooLarge(u32),
}
