use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Hex digest used as the store key for a state token.
pub(crate) fn hash_token(value: &str) -> String {
    Sha256::digest(value.as_bytes())
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

pub(crate) fn generate_secure_token(prefix: &str) -> String {
    format!(
        "{prefix}_{}_{}",
        Uuid::new_v4().as_simple(),
        Uuid::new_v4().as_simple()
    )
}
