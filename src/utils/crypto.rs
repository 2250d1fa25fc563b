// Cryptographic utilities for session ids and signed OAuth state

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Number of random bytes in a session id (192 bits)
pub const SESSION_ID_BYTES: usize = 24;

/// Generate an unguessable session id
///
/// 24 bytes from the thread-local CSPRNG, base64url encoded without padding
/// (32 characters). The id is also used as the OAuth `state`, so it must stay
/// URL-safe.
#[must_use]
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Binds the OAuth `state` to a session id with HMAC-SHA256
///
/// The signed form is `<session id>.<base64url mac>`. Verification recomputes
/// the expected state from the session id, so the browser can never choose
/// which session a state refers to.
#[derive(Clone)]
pub struct StateSigner {
    secret: Vec<u8>,
}

impl std::fmt::Debug for StateSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateSigner").finish_non_exhaustive()
    }
}

impl StateSigner {
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        Self {
            secret: secret.to_vec(),
        }
    }

    /// State to send to the authorization server for `session_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the HMAC key is rejected
    pub fn sign(&self, session_id: &str) -> Result<String> {
        let mac = self.mac(session_id)?.finalize().into_bytes();
        Ok(format!(
            "{session_id}.{}",
            general_purpose::URL_SAFE_NO_PAD.encode(mac)
        ))
    }

    /// Whether `state` is exactly the signed state for `session_id`
    ///
    /// The MAC part is compared in constant time.
    #[must_use]
    pub fn verify(&self, session_id: &str, state: &str) -> bool {
        let Some((id_part, mac_part)) = state.rsplit_once('.') else {
            return false;
        };
        if id_part != session_id {
            return false;
        }
        let Ok(received) = general_purpose::URL_SAFE_NO_PAD.decode(mac_part) else {
            return false;
        };
        // Reject non-canonical encodings so only one string is accepted per id.
        if general_purpose::URL_SAFE_NO_PAD.encode(&received) != mac_part {
            return false;
        }
        self.mac(session_id)
            .is_ok_and(|mac| mac.verify_slice(&received).is_ok())
    }

    fn mac(&self, session_id: &str) -> Result<HmacSha256> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.secret)
            .map_err(|_| anyhow!("Invalid HMAC key length"))?;
        mac.update(session_id.as_bytes());
        Ok(mac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &[u8] = b"test_secret_key_for_hmac_testing_32b";

    #[test]
    fn test_session_id_shape() {
        let id = generate_session_id();
        assert_eq!(id.len(), 32);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_session_ids_differ() {
        let ids: std::collections::HashSet<_> = (0..100).map(|_| generate_session_id()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_signed_state_round_trip() {
        let signer = StateSigner::new(TEST_SECRET);
        let state = signer.sign("abc").unwrap();
        assert!(state.starts_with("abc."));
        assert!(signer.verify("abc", &state));
    }

    #[test]
    fn test_signed_state_is_deterministic() {
        let signer = StateSigner::new(TEST_SECRET);
        assert_eq!(signer.sign("abc").unwrap(), signer.sign("abc").unwrap());
    }

    #[test]
    fn test_signed_state_rejects_other_session() {
        let signer = StateSigner::new(TEST_SECRET);
        let state = signer.sign("abc").unwrap();
        assert!(!signer.verify("abd", &state));
        assert!(!signer.verify("abc", "abc"));
        assert!(!signer.verify("abc", "abc."));
        assert!(!signer.verify("abc", &format!("{state}x")));
    }

    #[test]
    fn test_signed_state_rejects_other_secret() {
        let state = StateSigner::new(TEST_SECRET).sign("abc").unwrap();
        assert!(!StateSigner::new(b"another-secret").verify("abc", &state));
    }
}
