//! Payload signing
//!
//! HMAC-SHA256 signatures over outbound event payloads so the
//! consuming endpoint can authenticate the channel. The signature
//! covers `{timestamp}.{body}` to prevent replay.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the HMAC-SHA256 signature for an event payload.
///
/// Returns a hex-encoded signature string.
pub fn compute_signature(secret: &str, timestamp: &str, body: &[u8]) -> String {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");

    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);

    hex::encode(mac.finalize().into_bytes())
}

/// Verify a signature using constant-time comparison.
pub fn verify_signature(expected_hex: &str, secret: &str, timestamp: &str, body: &[u8]) -> bool {
    let computed = compute_signature(secret, timestamp, body);
    constant_time_eq(expected_hex.as_bytes(), computed.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_deterministic() {
        let sig1 = compute_signature("secret", "1754300000", b"payload");
        let sig2 = compute_signature("secret", "1754300000", b"payload");
        assert_eq!(sig1, sig2);
    }

    #[test]
    fn test_signature_changes_with_inputs() {
        let base = compute_signature("secret", "1754300000", b"payload");
        assert_ne!(base, compute_signature("other", "1754300000", b"payload"));
        assert_ne!(base, compute_signature("secret", "1754300001", b"payload"));
        assert_ne!(base, compute_signature("secret", "1754300000", b"other"));
    }

    #[test]
    fn test_signature_is_hex_encoded() {
        let sig = compute_signature("secret", "1754300000", b"payload");
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_verify_round_trip() {
        let sig = compute_signature("secret", "1754300000", b"body");
        assert!(verify_signature(&sig, "secret", "1754300000", b"body"));
        assert!(!verify_signature(&sig, "secret", "1754300000", b"tampered"));
        assert!(!verify_signature("bogus", "secret", "1754300000", b"body"));
    }
}
