// [libs/infra/wire/src/lib.rs]
/*!
 * =================================================================
 * APARATO: KERBSIDE WIRE CODEC (V1.0 - BIT-EXACT STRATUM)
 * CLASIFICACIÓN: INFRASTRUCTURE PRIMITIVE (ESTRATO L2)
 * RESPONSABILIDAD: CODIFICACIÓN/DECODIFICACIÓN DEL PROTOCOLO SPICE
 *
 * Dos capas: el enlace (una vez por conexión) y la mini-cabecera
 * (una vez por mensaje). Ningún parser indexa más allá de lo que
 * el buffer realmente contiene: "faltan bytes" es un resultado
 * distinto de "mensaje malformado".
 * =================================================================
 */

pub mod auth;
pub mod constants;
pub mod error;
pub mod inspect;
pub mod link;
pub mod miniheader;

pub use error::WireError;
pub use inspect::{ChannelInspector, Parsed};
pub use link::{SpiceLinkMess, SpiceLinkReply};
pub use miniheader::MiniHeaderFrame;

/// Hard ceiling on a single mini-header frame's declared body size.
///
/// SPICE does not itself bound message size; a hostile or buggy peer
/// claiming a multi-gigabyte `size` field would otherwise make the proxy
/// buffer without limit. Mirrors the "10MB packet size limit to prevent
/// DoS" guard this workspace's binary transport layer has always carried.
pub const MAX_FRAME_BODY_BYTES: u32 = 10 * 1024 * 1024;
