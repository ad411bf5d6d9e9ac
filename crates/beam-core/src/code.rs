//! Join code generation.
//!
//! Codes are the short handle a participant types to find a session. Only
//! the uniqueness contract matters to the hub; the alphabet skips lowercase
//! so codes survive being read aloud.

use crate::store::SessionStore;
use rand::Rng;

/// Join code length.
pub const CODE_LENGTH: usize = 6;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a random join code.
#[must_use]
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Generate a join code not held by any active session.
///
/// Retries until an unused code comes up; with a 36^6 code space and tens of
/// live sessions, collisions are vanishingly rare.
pub async fn unique_code(store: &dyn SessionStore) -> String {
    loop {
        let code = generate_code();
        if store.get_session_by_code(&code).await.is_none() {
            return code;
        }
    }
}
