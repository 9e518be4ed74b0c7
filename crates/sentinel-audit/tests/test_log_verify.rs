use serde_json::json;

use sentinel_audit::{AuditLog, LineVerdict, MIN_KEY_LEN, Signer, Verifier};

fn key(fill: u8) -> Vec<u8> {
    vec![fill; MIN_KEY_LEN]
}

fn write_log(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("audit.log");
    let log = AuditLog::open(&path, Signer::new("primary", key(7)).unwrap());
    log.append(&json!({"event": "request.created", "actor": "alice"})).unwrap();
    log.append(&json!({"event": "request.approved", "actor": "alice"})).unwrap();
    log.append(&json!({"event": "breakglass.invoked", "actor": "bob"})).unwrap();
    path
}

#[test]
fn untouched_log_verifies_clean() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(&dir);

    let report = Verifier::new()
        .with_key("primary", key(7))
        .verify_file(&path)
        .unwrap();
    assert_eq!(report.total, 3);
    assert_eq!(report.valid, 3);
    assert!(report.is_valid());
    assert!(!report.wrong_key);
}

#[test]
fn single_byte_mutation_is_detected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(&dir);

    // Tamper with the payload of line 2 only.
    let contents = std::fs::read_to_string(&path).unwrap();
    let tampered = contents.replacen("alice", "evil!", 2).replacen("evil!", "alice", 1);
    assert_ne!(contents, tampered);
    std::fs::write(&path, tampered).unwrap();

    let report = Verifier::new()
        .with_key("primary", key(7))
        .verify_file(&path)
        .unwrap();
    assert!(!report.is_valid());
    assert_eq!(report.valid, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].line_no, 2);
    assert_eq!(report.failures[0].verdict, LineVerdict::InvalidSignature);
    assert!(!report.wrong_key, "a single bad line is tampering, not a key mismatch");
}

#[test]
fn malformed_line_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(&dir);

    let mut contents = std::fs::read_to_string(&path).unwrap();
    contents.push_str("{not json\n");
    std::fs::write(&path, contents).unwrap();

    let report = Verifier::new()
        .with_key("primary", key(7))
        .verify_file(&path)
        .unwrap();
    assert_eq!(report.total, 4);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0].verdict, LineVerdict::ParseError(_)));
}

#[test]
fn wrong_key_is_reported_when_every_line_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(&dir);

    let report = Verifier::new()
        .with_key("primary", key(9))
        .verify_file(&path)
        .unwrap();
    assert_eq!(report.valid, 0);
    assert_eq!(report.failures.len(), 3);
    assert!(report.wrong_key);
}

#[test]
fn rotated_keys_verify_by_key_id() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.log");

    let old = AuditLog::open(&path, Signer::new("2025-q1", key(1)).unwrap());
    old.append(&json!({"event": "request.created"})).unwrap();
    let new = AuditLog::open(&path, Signer::new("2025-q2", key(2)).unwrap());
    new.append(&json!({"event": "request.approved"})).unwrap();

    let report = Verifier::new()
        .with_key("2025-q1", key(1))
        .with_key("2025-q2", key(2))
        .verify_file(&path)
        .unwrap();
    assert!(report.is_valid());

    // Missing one of the keys fails only that key's lines.
    let partial = Verifier::new()
        .with_key("2025-q2", key(2))
        .verify_file(&path)
        .unwrap();
    assert_eq!(partial.valid, 1);
    assert_eq!(partial.failures.len(), 1);
    assert_eq!(partial.failures[0].line_no, 1);
}

#[test]
fn envelope_reordering_does_not_break_signatures() {
    // The signature covers the canonical payload bytes, not the envelope
    // serialization, so a re-serialized envelope still verifies.
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(&dir);

    let contents = std::fs::read_to_string(&path).unwrap();
    let reordered: String = contents
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            // round-trip through a Value re-sorts object keys
            format!("{value}\n")
        })
        .collect();
    std::fs::write(&path, reordered).unwrap();

    let report = Verifier::new()
        .with_key("primary", key(7))
        .verify_file(&path)
        .unwrap();
    assert!(report.is_valid());
}
