// [libs/infra/wire/src/auth.rs]
//! SPICE ticket authentication: a fresh 1024-bit RSA keypair per client-
//! facing link, advertised to the client as a DER `SubjectPublicKeyInfo`
//! blob, and used to OAEP/SHA-1-decrypt the 128-byte ticket the client
//! sends back.
//!
//! The same primitives run in reverse when the proxy itself dials the
//! hypervisor as a SPICE client: it receives the hypervisor's public key
//! blob and re-encrypts the plaintext console ticket against it.

use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use thiserror::Error;

/// DER `SubjectPublicKeyInfo` length for a 1024-bit RSA key, the size
/// SPICE clients expect in the link reply's public-key field.
pub const PUBLIC_KEY_DER_LEN: usize = 162;

/// Ciphertext length for a 1024-bit RSA-OAEP ticket.
pub const TICKET_CIPHERTEXT_LEN: usize = 128;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("[AUTH_KEYGEN_FAULT] failed to generate RSA keypair: {0}")]
    KeyGen(String),
    #[error("[AUTH_ENCODE_FAULT] failed to encode public key as DER: {0}")]
    EncodePublicKey(String),
    #[error("[AUTH_DECODE_FAULT] failed to decode public key from DER: {0}")]
    DecodePublicKey(String),
    #[error("[AUTH_BAD_KEY_LEN] expected a {PUBLIC_KEY_DER_LEN}-byte public key, got {0}")]
    BadPublicKeyLen(usize),
    #[error("[AUTH_ENCRYPT_FAULT] ticket encryption failed: {0}")]
    Encrypt(String),
    #[error("[AUTH_DECRYPT_FAULT] ticket decryption failed: {0}")]
    Decrypt(String),
}

/// A keypair minted for exactly one client-facing link. Dropped once the
/// ticket has been decrypted; SPICE does not reuse link keypairs.
pub struct LinkKeypair {
    private: RsaPrivateKey,
    public_der: [u8; PUBLIC_KEY_DER_LEN],
}

impl LinkKeypair {
    /// Generate a fresh 1024-bit keypair.
    pub fn generate() -> Result<Self, AuthError> {
        let private = RsaPrivateKey::new(&mut OsRng, 1024).map_err(|e| AuthError::KeyGen(e.to_string()))?;
        let public = RsaPublicKey::from(&private);
        let der = public
            .to_public_key_der()
            .map_err(|e| AuthError::EncodePublicKey(e.to_string()))?;
        let bytes = der.as_bytes();
        if bytes.len() != PUBLIC_KEY_DER_LEN {
            return Err(AuthError::EncodePublicKey(format!(
                "unexpected DER length {} (wanted {PUBLIC_KEY_DER_LEN})",
                bytes.len()
            )));
        }
        let mut public_der = [0u8; PUBLIC_KEY_DER_LEN];
        public_der.copy_from_slice(bytes);
        Ok(LinkKeypair { private, public_der })
    }

    /// The DER `SubjectPublicKeyInfo` blob to embed in the link reply.
    pub fn public_key_der(&self) -> &[u8; PUBLIC_KEY_DER_LEN] {
        &self.public_der
    }

    /// Decrypt a ticket ciphertext the client sent after the link reply.
    pub fn decrypt_ticket(&self, ciphertext: &[u8]) -> Result<String, AuthError> {
        let padding = Oaep::new::<Sha1>();
        let plain = self
            .private
            .decrypt(padding, ciphertext)
            .map_err(|e| AuthError::Decrypt(e.to_string()))?;
        // The client pads the password/ticket field with trailing NULs to
        // the plaintext slot size; strip them before treating it as UTF-8.
        let trimmed = plain
            .iter()
            .position(|&b| b == 0)
            .map(|pos| &plain[..pos])
            .unwrap_or(&plain[..]);
        String::from_utf8(trimmed.to_vec()).map_err(|e| AuthError::Decrypt(e.to_string()))
    }
}

/// Parse a DER `SubjectPublicKeyInfo` blob received from a hypervisor's
/// own link reply (the proxy acting as a SPICE client).
pub fn parse_public_key_der(der: &[u8]) -> Result<RsaPublicKey, AuthError> {
    if der.len() != PUBLIC_KEY_DER_LEN {
        return Err(AuthError::BadPublicKeyLen(der.len()));
    }
    RsaPublicKey::from_public_key_der(der).map_err(|e| AuthError::DecodePublicKey(e.to_string()))
}

/// Encrypt a console ticket against a hypervisor's public key, for the
/// proxy's own outgoing link handshake.
pub fn encrypt_ticket(public_key: &RsaPublicKey, ticket: &str) -> Result<Vec<u8>, AuthError> {
    let padding = Oaep::new::<Sha1>();
    let mut plaintext = Vec::with_capacity(ticket.len() + 1);
    plaintext.extend_from_slice(ticket.as_bytes());
    plaintext.push(0);
    public_key
        .encrypt(&mut OsRng, padding, plaintext.as_slice())
        .map_err(|e| AuthError::Encrypt(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypair_exposes_correctly_sized_der() {
        let keypair = LinkKeypair::generate().expect("keygen");
        assert_eq!(keypair.public_key_der().len(), PUBLIC_KEY_DER_LEN);
    }

    #[test]
    fn ticket_round_trips_through_encrypt_decrypt() {
        let keypair = LinkKeypair::generate().expect("keygen");
        let public = RsaPublicKey::from(&keypair.private);
        let ciphertext = encrypt_ticket(&public, "s3cr3t-ticket").expect("encrypt");
        assert_eq!(ciphertext.len(), TICKET_CIPHERTEXT_LEN);
        let plain = keypair.decrypt_ticket(&ciphertext).expect("decrypt");
        assert_eq!(plain, "s3cr3t-ticket");
    }

    #[test]
    fn wrong_length_public_key_der_is_rejected() {
        let short = vec![0u8; 40];
        assert!(matches!(
            parse_public_key_der(&short),
            Err(AuthError::BadPublicKeyLen(40))
        ));
    }
}
