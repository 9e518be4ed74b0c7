use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use hmac::Mac;

use crate::canonical::to_canonical_json;
use crate::entry::SignedEntry;
use crate::error::AuditError;
use crate::signer::HmacSha256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineVerdict {
    Valid,
    /// Malformed line: bad JSON, missing envelope fields, non-hex signature.
    ParseError(String),
    /// Envelope parsed but the HMAC does not match.
    InvalidSignature,
}

#[derive(Debug, Clone)]
pub struct LineResult {
    /// 1-based, matching what an operator sees in an editor.
    pub line_no: usize,
    pub verdict: LineVerdict,
}

#[derive(Debug, Clone)]
pub struct VerifyReport {
    pub total: usize,
    pub valid: usize,
    pub failures: Vec<LineResult>,
    /// Heuristic: every line failed its HMAC, which is what verifying a
    /// healthy file with the wrong secret looks like.
    pub wrong_key: bool,
}

impl VerifyReport {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Verifies streams written by [`crate::AuditLog`]. Holds one or more keys
/// indexed by `key_id`, so files spanning a key rotation still verify.
pub struct Verifier {
    keys: HashMap<String, Vec<u8>>,
}

impl Verifier {
    pub fn new() -> Verifier {
        Verifier {
            keys: HashMap::new(),
        }
    }

    pub fn with_key(mut self, key_id: impl Into<String>, key: Vec<u8>) -> Verifier {
        self.keys.insert(key_id.into(), key);
        self
    }

    pub fn verify_line(&self, line: &str) -> LineVerdict {
        let signed: SignedEntry = match serde_json::from_str(line) {
            Ok(entry) => entry,
            Err(e) => return LineVerdict::ParseError(e.to_string()),
        };
        let Some(key) = self.keys.get(&signed.key_id) else {
            // An unknown key id cannot be checked; the bytes parsed, so
            // report it the way a bad signature is reported.
            return LineVerdict::InvalidSignature;
        };
        let canonical = match to_canonical_json(&signed.entry) {
            Ok(bytes) => bytes,
            Err(e) => return LineVerdict::ParseError(e.to_string()),
        };
        let signature = match hex::decode(&signed.signature) {
            Ok(bytes) => bytes,
            Err(_) => return LineVerdict::ParseError("signature is not hex".into()),
        };
        let mut mac = match HmacSha256::new_from_slice(key) {
            Ok(mac) => mac,
            Err(e) => return LineVerdict::ParseError(e.to_string()),
        };
        mac.update(&canonical);
        // verify_slice is constant-time
        match mac.verify_slice(&signature) {
            Ok(()) => LineVerdict::Valid,
            Err(_) => LineVerdict::InvalidSignature,
        }
    }

    /// Walk the whole file. Every line is checked even after a failure, so
    /// the report shows the full extent of any damage.
    pub fn verify_file(&self, path: &Path) -> Result<VerifyReport, AuditError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut total = 0;
        let mut valid = 0;
        let mut failures = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            total += 1;
            match self.verify_line(&line) {
                LineVerdict::Valid => valid += 1,
                verdict => {
                    tracing::warn!(line_no = index + 1, ?verdict, "audit line failed verification");
                    failures.push(LineResult {
                        line_no: index + 1,
                        verdict,
                    });
                }
            }
        }

        let wrong_key = total > 0
            && valid == 0
            && failures
                .iter()
                .all(|f| f.verdict == LineVerdict::InvalidSignature);

        Ok(VerifyReport {
            total,
            valid,
            failures,
            wrong_key,
        })
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}
