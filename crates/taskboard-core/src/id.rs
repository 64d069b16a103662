//! ID generation for taskboard documents
//!
//! Hash-based IDs that stay short and URL-safe.
//! Format: <prefix>-xxxxxxxxxx (10 lowercase alphanumeric chars)

use sha2::{Digest, Sha256};
use uuid::Uuid;

pub const BOARD_PREFIX: &str = "board";
pub const LIST_PREFIX: &str = "list";
pub const CARD_PREFIX: &str = "card";
pub const LOG_PREFIX: &str = "log";

const ID_LEN: usize = 10;

/// Generate a document ID
///
/// Uses UUID + timestamp hash, encoded as Crockford base32 lowercase.
pub fn generate_id(prefix: &str) -> String {
    let uuid = Uuid::new_v4();
    let timestamp = chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0);

    let mut hasher = Sha256::new();
    hasher.update(uuid.as_bytes());
    hasher.update(timestamp.to_le_bytes());

    let hash = hasher.finalize();

    // 7 bytes give 56 bits, enough for 10 base32 chars
    let encoded = base32::encode(base32::Alphabet::Crockford, &hash[..7])
        .to_lowercase()
        .chars()
        .take(ID_LEN)
        .collect::<String>();

    format!("{}-{}", prefix, encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id() {
        let id = generate_id(CARD_PREFIX);
        assert!(id.starts_with("card-"));
        assert_eq!(id.len(), "card-".len() + ID_LEN);
        assert!(id.chars().all(|c| c == '-' || c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_id_is_unique() {
        let a = generate_id(LIST_PREFIX);
        let b = generate_id(LIST_PREFIX);
        assert_ne!(a, b);
    }
}
