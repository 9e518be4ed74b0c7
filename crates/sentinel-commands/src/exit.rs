//! Process exit codes for the reporting commands.
//!
//! 0 — success / compliant / nothing found.
//! 1 — generic error, HIGH findings, untracked sessions, or a log that
//!     fails verification.
//! 2 — MEDIUM findings with no HIGH, or a declined confirmation.

use sentinel_audit::VerifyReport;
use sentinel_detect::DetectionReport;
use sentinel_trust::RoleReport;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FINDINGS: i32 = 1;
pub const EXIT_WARNINGS: i32 = 2;

pub fn trust_exit_code(reports: &[RoleReport]) -> i32 {
    let any_high = reports
        .iter()
        .any(|r| r.risk_summary.high > 0 || r.error.is_some());
    let any_medium = reports.iter().any(|r| r.risk_summary.medium > 0);
    if any_high {
        EXIT_FINDINGS
    } else if any_medium {
        EXIT_WARNINGS
    } else {
        EXIT_OK
    }
}

pub fn detect_exit_code(report: &DetectionReport) -> i32 {
    if report.untracked.is_empty() {
        EXIT_OK
    } else {
        EXIT_FINDINGS
    }
}

pub fn verify_exit_code(report: &VerifyReport) -> i32 {
    if report.is_valid() { EXIT_OK } else { EXIT_FINDINGS }
}

#[cfg(test)]
mod tests {
    use sentinel_trust::{Analyzer, TrustDocument};

    use super::*;

    fn report_for(doc: &str) -> RoleReport {
        Analyzer::default().analyze(
            "arn:aws:iam::123456789012:role/x",
            &TrustDocument::parse(doc).unwrap(),
        )
    }

    #[test]
    fn trust_codes_track_severity() {
        let full = report_for(
            r#"{"Statement": [{
                "Effect": "Allow",
                "Principal": {"AWS": "arn:aws:iam::123456789012:user/broker"},
                "Action": "sts:AssumeRole",
                "Condition": {"StringLike": {"sts:SourceIdentity": "sentinel:*"}}
            }]}"#,
        );
        assert_eq!(trust_exit_code(&[full.clone()]), EXIT_OK);

        let medium = report_for(
            r#"{"Statement": [{
                "Effect": "Allow",
                "Principal": {"AWS": "arn:aws:iam::123456789012:user/broker"},
                "Action": "sts:AssumeRole",
                "Condition": {"StringLike": {"sts:SourceIdentity": "legacy:*"}}
            }]}"#,
        );
        assert_eq!(trust_exit_code(&[full.clone(), medium.clone()]), EXIT_WARNINGS);

        let none = report_for(
            r#"{"Statement": [{
                "Effect": "Allow",
                "Principal": {"AWS": "arn:aws:iam::123456789012:root"},
                "Action": "sts:AssumeRole"
            }]}"#,
        );
        assert_eq!(trust_exit_code(&[full, medium, none]), EXIT_FINDINGS);
    }

    #[test]
    fn fetch_failures_are_findings() {
        let failed = RoleReport::failed("arn:aws:iam::123456789012:role/x", "no such role");
        assert_eq!(trust_exit_code(&[failed]), EXIT_FINDINGS);
    }

    #[test]
    fn untracked_sessions_fail_the_detection_run() {
        let clean = sentinel_detect::correlate(&[], &[]);
        assert_eq!(detect_exit_code(&clean), EXIT_OK);

        let event = sentinel_detect::TrailEvent {
            event_id: "e1".into(),
            event_time: jiff::Timestamp::UNIX_EPOCH,
            role_arn: None,
            source_ip: None,
            source_identity: None,
        };
        let dirty = sentinel_detect::correlate(&[event], &[]);
        assert_eq!(detect_exit_code(&dirty), EXIT_FINDINGS);
    }
}
