use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

pub const LINE_SIGNATURE_HEADER: &str = "x-line-signature";

/// Base64 HMAC-SHA256 of the raw request body keyed by the channel secret.
pub fn sign_body(channel_secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(channel_secret.as_bytes())
        .expect("HMAC accepts channel secret of any size");
    mac.update(body);
    STANDARD.encode(mac.finalize().into_bytes())
}

pub fn verify_signature(channel_secret: &str, body: &[u8], signature: &str) -> bool {
    let signature = signature.trim();
    if signature.is_empty() {
        return false;
    }

    constant_time_eq(&sign_body(channel_secret, body), signature)
}

fn constant_time_eq(left: &str, right: &str) -> bool {
    if left.len() != right.len() {
        return false;
    }

    let mut diff = 0_u8;
    for (lhs, rhs) in left.as_bytes().iter().zip(right.as_bytes().iter()) {
        diff |= lhs ^ rhs;
    }

    diff == 0
}
