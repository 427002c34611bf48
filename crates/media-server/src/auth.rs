//! Upload credential generation and validation.

use rand::Rng;

/// Token length in bytes (produces 32 hex characters).
const TOKEN_BYTES: usize = 16;

/// Generates a CSPRNG token as a 32-character lowercase hex string.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Compares a received token against one accepted value in constant time.
pub fn validate_token(received: &str, expected: &str) -> bool {
    if received.len() != expected.len() {
        return false;
    }
    let mut diff = 0u8;
    for (a, b) in received.bytes().zip(expected.bytes()) {
        diff |= a ^ b;
    }
    diff == 0
}

/// Returns `true` if `received` matches any accepted token.
///
/// Every accepted token is compared, so the time taken does not reveal
/// which one matched.
pub fn is_authorized(received: Option<&str>, accepted: &[String]) -> bool {
    let Some(received) = received.filter(|t| !t.is_empty()) else {
        return false;
    };
    accepted
        .iter()
        .fold(false, |ok, expected| validate_token(received, expected) | ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_token_is_32_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn validate_matching_and_mismatched() {
        let token = generate_token();
        assert!(validate_token(&token, &token));
        assert!(!validate_token(&token, &generate_token()));
        assert!(!validate_token("short", "this_is_longer"));
    }

    #[test]
    fn authorized_against_any_accepted_token() {
        let accepted = vec!["alpha".to_string(), "bravo".to_string()];
        assert!(is_authorized(Some("alpha"), &accepted));
        assert!(is_authorized(Some("bravo"), &accepted));
        assert!(!is_authorized(Some("charlie"), &accepted));
        assert!(!is_authorized(None, &accepted));
    }

    #[test]
    fn empty_token_is_never_authorized() {
        let accepted = vec![String::new()];
        assert!(!is_authorized(Some(""), &accepted));
        assert!(!is_authorized(Some("x"), &[]));
    }
}
