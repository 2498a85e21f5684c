// [libs/infra/wire/src/link.rs]
//! The link layer: one `SpiceLinkMess` / `SpiceLinkReply` exchange per
//! connection, before any mini-header traffic flows.

use crate::error::WireError;
use byteorder::{ByteOrder, LittleEndian};

pub const MAGIC: [u8; 4] = *b"REDQ";
pub const PROTOCOL_MAJOR: u32 = 2;
pub const PROTOCOL_MINOR: u32 = 2;
const HEADER_LEN: usize = 16; // magic(4) + major(4) + minor(4) + size(4)

/// The client → server link message: which channel is being opened and
/// with which capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiceLinkMess {
    pub connection_id: u32,
    pub channel_type: u8,
    pub channel_id: u8,
    pub common_caps: Vec<u32>,
    pub channel_caps: Vec<u32>,
}

/// The server → client link reply: the server's keypair and capabilities,
/// or an error code redirecting/declining the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiceLinkReply {
    pub error_code: u32,
    pub public_key_der: [u8; 162],
    pub common_caps: Vec<u32>,
    pub channel_caps: Vec<u32>,
}

fn validate_header(magic: [u8; 4], major: u32, minor: u32) -> Result<(), WireError> {
    if magic != MAGIC {
        return Err(WireError::BadMagic(magic));
    }
    if major != PROTOCOL_MAJOR {
        return Err(WireError::BadMajor(major));
    }
    if minor != PROTOCOL_MINOR {
        return Err(WireError::BadMinor(minor));
    }
    Ok(())
}

/// Read the `caps_offset`-relative list of capability words out of `body`.
fn read_caps(body: &[u8], offset: usize, count: u32) -> Result<Vec<u32>, WireError> {
    let mut caps = Vec::with_capacity(count as usize);
    let mut cursor = offset;
    for _ in 0..count {
        let end = cursor
            .checked_add(4)
            .ok_or_else(|| WireError::ProtocolError("capability offset overflow".into()))?;
        let word = body
            .get(cursor..end)
            .ok_or_else(|| WireError::ProtocolError("capability list truncated".into()))?;
        caps.push(LittleEndian::read_u32(word));
        cursor = end;
    }
    Ok(caps)
}

impl SpiceLinkMess {
    /// Decode a full link message (header + body) from the front of
    /// `buffered`. Returns `Ok(None)` if the full frame has not arrived yet.
    pub fn try_parse(buffered: &[u8]) -> Result<Option<(Self, usize)>, WireError> {
        if buffered.len() < HEADER_LEN {
            return Ok(None);
        }

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&buffered[0..4]);
        let major = LittleEndian::read_u32(&buffered[4..8]);
        let minor = LittleEndian::read_u32(&buffered[8..12]);
        validate_header(magic, major, minor)?;

        let body_size = LittleEndian::read_u32(&buffered[12..16]) as usize;
        let total_len = HEADER_LEN + body_size;
        if buffered.len() < total_len {
            return Ok(None);
        }

        let body = &buffered[HEADER_LEN..total_len];
        if body.len() < 18 {
            return Err(WireError::ProtocolError(
                "link message body shorter than fixed fields".into(),
            ));
        }

        let connection_id = LittleEndian::read_u32(&body[0..4]);
        let channel_type = body[4];
        let channel_id = body[5];
        let num_common_caps = LittleEndian::read_u32(&body[6..10]);
        let num_channel_caps = LittleEndian::read_u32(&body[10..14]);
        let caps_offset = LittleEndian::read_u32(&body[14..18]) as usize;

        let common_caps = read_caps(body, caps_offset, num_common_caps)?;
        let channel_caps = read_caps(
            body,
            caps_offset + (num_common_caps as usize) * 4,
            num_channel_caps,
        )?;

        Ok(Some((
            SpiceLinkMess {
                connection_id,
                channel_type,
                channel_id,
                common_caps,
                channel_caps,
            },
            total_len,
        )))
    }

    pub fn encode(&self) -> Vec<u8> {
        let caps_offset: u32 = 18;
        let mut body = vec![0u8; 18];
        LittleEndian::write_u32(&mut body[0..4], self.connection_id);
        body[4] = self.channel_type;
        body[5] = self.channel_id;
        LittleEndian::write_u32(&mut body[6..10], self.common_caps.len() as u32);
        LittleEndian::write_u32(&mut body[10..14], self.channel_caps.len() as u32);
        LittleEndian::write_u32(&mut body[14..18], caps_offset);

        for cap in self.common_caps.iter().chain(self.channel_caps.iter()) {
            let mut word = [0u8; 4];
            LittleEndian::write_u32(&mut word, *cap);
            body.extend_from_slice(&word);
        }

        let mut out = Vec::with_capacity(HEADER_LEN + body.len());
        out.extend_from_slice(&MAGIC);
        let mut word = [0u8; 4];
        LittleEndian::write_u32(&mut word, PROTOCOL_MAJOR);
        out.extend_from_slice(&word);
        LittleEndian::write_u32(&mut word, PROTOCOL_MINOR);
        out.extend_from_slice(&word);
        LittleEndian::write_u32(&mut word, body.len() as u32);
        out.extend_from_slice(&word);
        out.extend_from_slice(&body);
        out
    }
}

impl SpiceLinkReply {
    pub fn try_parse(buffered: &[u8]) -> Result<Option<(Self, usize)>, WireError> {
        if buffered.len() < HEADER_LEN {
            return Ok(None);
        }

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&buffered[0..4]);
        let major = LittleEndian::read_u32(&buffered[4..8]);
        let minor = LittleEndian::read_u32(&buffered[8..12]);
        validate_header(magic, major, minor)?;

        let body_size = LittleEndian::read_u32(&buffered[12..16]) as usize;
        let total_len = HEADER_LEN + body_size;
        if buffered.len() < total_len {
            return Ok(None);
        }

        let body = &buffered[HEADER_LEN..total_len];
        let error_code = LittleEndian::read_u32(
            body.get(0..4)
                .ok_or_else(|| WireError::ProtocolError("link reply missing error code".into()))?,
        );

        // The reply is always the full fixed structure, even on error: the
        // client reads a fixed-size body regardless of the error code, with
        // the key/caps fields zeroed when there is nothing meaningful to send.
        if body.len() < 4 + 162 + 12 {
            return Err(WireError::ProtocolError(
                "link reply missing public key / capability fields".into(),
            ));
        }

        let mut public_key_der = [0u8; 162];
        public_key_der.copy_from_slice(&body[4..166]);

        let num_common_caps = LittleEndian::read_u32(&body[166..170]);
        let num_channel_caps = LittleEndian::read_u32(&body[170..174]);
        let caps_offset = LittleEndian::read_u32(&body[174..178]) as usize;

        let common_caps = read_caps(body, caps_offset, num_common_caps)?;
        let channel_caps = read_caps(
            body,
            caps_offset + (num_common_caps as usize) * 4,
            num_channel_caps,
        )?;

        Ok(Some((
            SpiceLinkReply {
                error_code,
                public_key_der,
                common_caps,
                channel_caps,
            },
            total_len,
        )))
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut body = vec![0u8; 4];
        LittleEndian::write_u32(&mut body[0..4], self.error_code);

        // Always the full fixed structure: key blob and cap triple are
        // present (zeroed on error) regardless of `error_code`.
        body.extend_from_slice(&self.public_key_der);
        let caps_offset: u32 = 178;
        let mut fields = [0u8; 12];
        LittleEndian::write_u32(&mut fields[0..4], self.common_caps.len() as u32);
        LittleEndian::write_u32(&mut fields[4..8], self.channel_caps.len() as u32);
        LittleEndian::write_u32(&mut fields[8..12], caps_offset);
        body.extend_from_slice(&fields);
        for cap in self.common_caps.iter().chain(self.channel_caps.iter()) {
            let mut word = [0u8; 4];
            LittleEndian::write_u32(&mut word, *cap);
            body.extend_from_slice(&word);
        }

        let mut out = Vec::with_capacity(HEADER_LEN + body.len());
        out.extend_from_slice(&MAGIC);
        let mut word = [0u8; 4];
        LittleEndian::write_u32(&mut word, PROTOCOL_MAJOR);
        out.extend_from_slice(&word);
        LittleEndian::write_u32(&mut word, PROTOCOL_MINOR);
        out.extend_from_slice(&word);
        LittleEndian::write_u32(&mut word, body.len() as u32);
        out.extend_from_slice(&word);
        out.extend_from_slice(&body);
        out
    }

    /// Convenience constructor for the plaintext-port redirect shortcut
    /// and other pure-error replies (no key/caps payload).
    pub fn error(error_code: u32) -> Self {
        SpiceLinkReply {
            error_code,
            public_key_der: [0u8; 162],
            common_caps: Vec::new(),
            channel_caps: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_mess_round_trips() {
        let mess = SpiceLinkMess {
            connection_id: 0,
            channel_type: 1,
            channel_id: 0,
            common_caps: vec![11],
            channel_caps: vec![9],
        };
        let encoded = mess.encode();
        let (decoded, consumed) = SpiceLinkMess::try_parse(&encoded).unwrap().unwrap();
        assert_eq!(consumed, encoded.len());
        assert_eq!(decoded, mess);
    }

    #[test]
    fn capability_bitset_round_trips_to_eleven() {
        use crate::constants::common_caps;
        let bits = common_caps::AUTH_SELECTION | common_caps::AUTH_SPICE | common_caps::MINI_HEADER;
        assert_eq!(bits, 11);
        assert_eq!(common_caps::DEFAULT, 11);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut encoded = SpiceLinkMess {
            connection_id: 0,
            channel_type: 1,
            channel_id: 0,
            common_caps: vec![],
            channel_caps: vec![],
        }
        .encode();
        encoded[0] = b'X';
        assert!(matches!(
            SpiceLinkMess::try_parse(&encoded),
            Err(WireError::BadMagic(_))
        ));
    }

    #[test]
    fn need_secured_reply_round_trips_without_key() {
        let reply = SpiceLinkReply::error(crate::constants::error_code::NEED_SECURED);
        let encoded = reply.encode();
        let (decoded, _) = SpiceLinkReply::try_parse(&encoded).unwrap().unwrap();
        assert_eq!(decoded.error_code, 5);
    }
}
