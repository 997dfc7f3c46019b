//! API key generation.
//!
//! This module lives in `core` (zero internal deps) so it can be used by
//! both the API layer and any future CLI tooling. Every user gets a
//! personal key at registration and every project gets its own; project
//! keys authenticate widget submissions via the `X-API-Key` header.

use rand::Rng;

/// Length of a generated API key (alphanumeric characters).
pub const KEY_LENGTH: usize = 32;

/// Generate a new random alphanumeric API key.
pub fn generate_api_key() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(KEY_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_has_correct_length() {
        assert_eq!(generate_api_key().len(), KEY_LENGTH);
    }

    #[test]
    fn generated_keys_are_unique() {
        let a = generate_api_key();
        let b = generate_api_key();
        assert_ne!(a, b);
    }

    #[test]
    fn generated_key_is_alphanumeric() {
        assert!(generate_api_key().chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
