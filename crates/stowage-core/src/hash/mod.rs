//! Content digest computation
//!
//! The store verifies upload integrity against a SHA-1 digest carried in a
//! request header; downloads can be checked against a previously recorded
//! digest by the caller.

use sha1::{Digest, Sha1};

/// Hex SHA-1 of the empty byte sequence, the digest every zero-length
/// upload must carry
pub const EMPTY_DIGEST: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

/// Compute the lowercase hex SHA-1 digest of a byte buffer.
///
/// Pure and deterministic; used both to populate the integrity header sent
/// with an upload and to verify downloaded bytes against a recorded digest.
pub fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Check a byte buffer against an expected hex digest.
///
/// Comparison is case-insensitive on the expected side since some callers
/// record uppercase hex.
pub fn verify(bytes: &[u8], expected: &str) -> bool {
    digest(bytes) == expected.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_known_vector() {
        // SHA-1("abc") from FIPS 180-1
        assert_eq!(digest(b"abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn test_empty_digest_constant() {
        assert_eq!(digest(b""), EMPTY_DIGEST);
    }

    #[test]
    fn test_verify_case_insensitive() {
        assert!(verify(b"abc", "A9993E364706816ABA3E25717850C26C9CD0D89D"));
        assert!(!verify(b"abc", EMPTY_DIGEST));
    }
}
