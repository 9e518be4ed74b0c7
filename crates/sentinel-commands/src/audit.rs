//! Audit-side commands: untracked-session detection and log verification.

use std::path::Path;

use jiff::Timestamp;
use sentinel_audit::{Verifier, VerifyReport};
use sentinel_core::{BreakGlassStatus, RequestStatus};
use sentinel_detect::{
    DetectionReport, DetectionWindow, TrackedSession, correlate, sessions_in_window,
};

use crate::CommandContext;
use crate::error::CommandError;

/// Upper bound on the session rows pulled per status while building the
/// correlation set. Windows wide enough to exceed this deserve narrower
/// detection runs, not silent truncation.
const SESSION_SCAN_LIMIT: i32 = 1000;

#[derive(Debug, Clone)]
pub struct DetectParams {
    pub start: Timestamp,
    pub end: Timestamp,
    pub role_arn: Option<String>,
    pub profile: Option<String>,
}

/// Run the untracked-session detection: CloudTrail events in the window
/// against the sessions the store knows about. Pure read path — neither
/// the store nor the trail is mutated.
pub async fn detect_untracked(
    ctx: &CommandContext,
    trail: &aws_sdk_cloudtrail::Client,
    params: DetectParams,
) -> Result<DetectionReport, CommandError> {
    if params.end <= params.start {
        return Err(CommandError::InvalidInput(
            "detection window must end after it starts".into(),
        ));
    }
    let window = DetectionWindow {
        start: params.start,
        end: params.end,
        role_arn: params.role_arn,
        profile: params.profile,
    };

    let events = sentinel_detect::lookup_assume_role_events(trail, &window).await?;

    // An issued credential counts as a session whatever its current
    // status — a closed or expired grant still explains trail events from
    // when it was live. Approved requests issued credentials too; pending
    // and denied ones never did.
    let mut issued: Vec<TrackedSession> = Vec::new();
    for status in BreakGlassStatus::ALL {
        issued.extend(
            ctx.break_glass
                .list_by_status(status, SESSION_SCAN_LIMIT)
                .await?
                .iter()
                .map(TrackedSession::from),
        );
    }
    issued.extend(
        ctx.requests
            .list_by_status(RequestStatus::Approved, SESSION_SCAN_LIMIT)
            .await?
            .iter()
            .map(TrackedSession::from),
    );
    let sessions = sessions_in_window(issued, &window);

    let report = correlate(&events, &sessions);
    tracing::info!(
        total = report.total_events,
        tracked = report.tracked,
        untracked = report.untracked.len(),
        orphaned = report.orphaned.len(),
        compliance = report.compliance_rate,
        "detection complete"
    );
    Ok(report)
}

/// Verify a signed log file with the supplied verifier.
pub fn verify_log(verifier: &Verifier, path: &Path) -> Result<VerifyReport, CommandError> {
    Ok(verifier.verify_file(path)?)
}
