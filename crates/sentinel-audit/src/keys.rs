//! Key material loading. Keys are hex-encoded, inline or in a file;
//! surrounding whitespace is ignored.

use std::path::Path;

use crate::error::AuditError;

pub fn from_hex(raw: &str) -> Result<Vec<u8>, AuditError> {
    hex::decode(raw.trim()).map_err(|e| AuditError::Key(format!("invalid hex key: {e}")))
}

pub fn from_file(path: &Path) -> Result<Vec<u8>, AuditError> {
    let contents = std::fs::read_to_string(path)?;
    from_hex(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_hex_with_surrounding_whitespace() {
        let key = from_hex("  00ff10ab  \n").unwrap();
        assert_eq!(key, vec![0x00, 0xff, 0x10, 0xab]);
    }

    #[test]
    fn rejects_non_hex() {
        assert!(from_hex("not-hex").is_err());
    }
}
