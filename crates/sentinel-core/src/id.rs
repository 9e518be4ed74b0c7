//! Random identifiers for requests and break-glass events.

use rand::RngCore;
use rand::rngs::OsRng;

/// Length of every Sentinel identifier, in hex characters.
pub const ID_LEN: usize = 16;

/// Generate a 16-character lowercase-hex identifier from the OS RNG.
///
/// There is no stateful generator and no monotonicity guarantee; collision
/// probability is negligible for any realistic id volume.
pub fn generate() -> String {
    let mut bytes = [0u8; ID_LEN / 2];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Check that `s` is a well-formed identifier (`^[0-9a-f]{16}$`).
pub fn validate(s: &str) -> bool {
    s.len() == ID_LEN && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_validate() {
        for _ in 0..64 {
            let id = generate();
            assert_eq!(id.len(), ID_LEN);
            assert!(validate(&id), "generated id failed validation: {id}");
        }
    }

    #[test]
    fn generated_ids_are_distinct() {
        let a = generate();
        let b = generate();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(!validate(""));
        assert!(!validate("abc"));
        assert!(!validate("0123456789abcdef0")); // too long
        assert!(!validate("0123456789ABCDEF")); // uppercase
        assert!(!validate("0123456789abcdeg")); // non-hex
        assert!(!validate("0123456789abcde ")); // whitespace
    }

    #[test]
    fn accepts_well_formed_ids() {
        assert!(validate("0123456789abcdef"));
        assert!(validate("ffffffffffffffff"));
        assert!(validate("0000000000000000"));
    }
}
