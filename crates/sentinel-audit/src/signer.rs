use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use hmac::{Hmac, Mac};
use jiff::Timestamp;
use serde_json::Value;
use sha2::Sha256;

use crate::canonical::to_canonical_json;
use crate::entry::SignedEntry;
use crate::error::AuditError;

pub(crate) type HmacSha256 = Hmac<Sha256>;

/// Minimum secret length. Shorter keys are rejected outright.
pub const MIN_KEY_LEN: usize = 32;

#[derive(Debug)]
pub struct Signer {
    key_id: String,
    key: Vec<u8>,
}

impl Signer {
    pub fn new(key_id: impl Into<String>, key: Vec<u8>) -> Result<Signer, AuditError> {
        if key.len() < MIN_KEY_LEN {
            return Err(AuditError::KeyTooShort {
                min: MIN_KEY_LEN,
                len: key.len(),
            });
        }
        Ok(Signer {
            key_id: key_id.into(),
            key,
        })
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn sign(&self, entry: &Value, now: Timestamp) -> Result<SignedEntry, AuditError> {
        let canonical = to_canonical_json(entry)?;
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| AuditError::Key(e.to_string()))?;
        mac.update(&canonical);
        let signature = hex::encode(mac.finalize().into_bytes());
        Ok(SignedEntry {
            entry: entry.clone(),
            signature,
            key_id: self.key_id.clone(),
            timestamp: now,
        })
    }
}

/// The append-only stream. One signed envelope per line; each append is a
/// single `write_all` so a verifier never observes a torn line from this
/// process. Rotation is truncate-then-reopen, out-of-band.
pub struct AuditLog {
    path: PathBuf,
    signer: Signer,
}

impl AuditLog {
    pub fn open(path: impl Into<PathBuf>, signer: Signer) -> AuditLog {
        AuditLog {
            path: path.into(),
            signer,
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn append(&self, entry: &Value) -> Result<(), AuditError> {
        let signed = self.signer.sign(entry, Timestamp::now())?;
        let mut line = serde_json::to_vec(&signed)?;
        line.push(b'\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&line)?;
        Ok(())
    }
}
