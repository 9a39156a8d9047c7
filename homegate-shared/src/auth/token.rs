/// Opaque token generation
///
/// Confirmation, refresh, and password-reset tokens are all 32 bytes of
/// OS-provided randomness rendered as a 64-character hex string. Collisions
/// are not checked here; uniqueness is enforced by the store's unique
/// constraints on the token columns.
use rand::{rngs::OsRng, RngCore};

/// Number of random bytes per token
const TOKEN_BYTES: usize = 32;

/// Generates a fresh opaque token
///
/// # Example
///
/// ```
/// use homegate_shared::auth::token::generate;
///
/// let token = generate();
/// assert_eq!(token.len(), 64);
/// ```
pub fn generate() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_length_and_charset() {
        let token = generate();
        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = generate();
        let b = generate();
        assert_ne!(a, b);
    }
}
