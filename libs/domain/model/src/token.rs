// [libs/domain/model/src/token.rs]
//! The short-lived mapping from a client-chosen secret to a console.

use serde::{Deserialize, Serialize};

/// Alphabet the original draws both `token` and `session_id` from.
pub const TOKEN_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

pub const TOKEN_LENGTH: usize = 48;
pub const SESSION_ID_LENGTH: usize = 12;

/// A short-lived mapping from a client-chosen secret (`token`) to a
/// console. `token` is the primary key; `session_id` is the externally
/// visible handle admin tooling and audit events reference.
///
/// A token is valid iff `expires > now`. It is not invalidated on first
/// use — multiple SPICE channels (main/display/inputs/...) reuse it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleToken {
    pub token: String,
    pub session_id: String,
    pub source: String,
    pub uuid: String,
    pub created: i64,
    pub expires: i64,
}

impl ConsoleToken {
    pub fn is_live(&self, now_unix_seconds: i64) -> bool {
        self.expires > now_unix_seconds
    }

    /// Draws a fresh random token from `TOKEN_ALPHABET`. Callers retry on
    /// primary-key collision rather than relying on this being unique alone.
    pub fn random_token() -> String {
        random_alphabet_string(TOKEN_LENGTH)
    }

    /// Draws a fresh random session id, independent of `random_token`.
    pub fn random_session_id() -> String {
        random_alphabet_string(SESSION_ID_LENGTH)
    }
}

fn random_alphabet_string(length: usize) -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..TOKEN_ALPHABET.len());
            TOKEN_ALPHABET[idx] as char
        })
        .collect()
}
