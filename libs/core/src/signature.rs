//! Webhook body authentication.
//!
//! The platform signs the exact raw JSON body with HMAC-SHA256 and sends the
//! hex digest in the `authorization` header. This check is the endpoint's
//! sole trust boundary and must run before any body parsing.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn keyed_mac(secret: &str) -> Option<HmacSha256> {
    HmacSha256::new_from_slice(secret.as_bytes()).ok()
}

/// Hex HMAC-SHA256 of `body` under `secret`. Used by tests and tooling to
/// produce valid webhook signatures.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let Some(mut mac) = keyed_mac(secret) else {
        return String::new();
    };
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time comparison of the hex signature header against the body
/// digest. Any malformed header is a mismatch, not an error.
pub fn verify_signature(secret: &str, body: &[u8], header: &str) -> bool {
    let Ok(provided) = hex::decode(header.trim()) else {
        return false;
    };
    let Some(mut mac) = keyed_mac(secret) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&provided).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_signature() {
        let body = br#"{"event":{"type":"subscribe"}}"#;
        let sig = sign("secret", body);
        assert!(verify_signature("secret", body, &sig));
    }

    #[test]
    fn rejects_tampered_body() {
        let sig = sign("secret", b"original");
        assert!(!verify_signature("secret", b"tampered", &sig));
    }

    #[test]
    fn rejects_wrong_secret() {
        let body = b"payload";
        let sig = sign("secret", body);
        assert!(!verify_signature("other", body, &sig));
    }

    #[test]
    fn rejects_non_hex_header() {
        assert!(!verify_signature("secret", b"payload", "not hex at all"));
        assert!(!verify_signature("secret", b"payload", ""));
    }
}
