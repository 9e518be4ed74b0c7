//! The partition at the heart of the detector. Pure: given the observed
//! events and the tracked sessions, every event lands in exactly one of
//! tracked/untracked, and orphaned covers sessions with no event.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::session::TrackedSession;
use crate::trail::TrailEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UntrackedReason {
    /// The event carries no source identity at all.
    NoSourceIdentity,
    /// A well-formed identity with our prefix, but no session matches it.
    UnknownIdentity,
    /// An identity that does not carry the expected prefix.
    WrongPrefix,
}

/// An `AssumeRole` event that did not go through the tracked path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UntrackedSession {
    pub event: TrailEvent,
    pub reason: UntrackedReason,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    pub total_events: usize,
    pub tracked: usize,
    pub untracked: Vec<UntrackedSession>,
    /// Sessions issued but never observed in the trail. Informational —
    /// a credential that was requested and not used is not a failure.
    pub orphaned: Vec<TrackedSession>,
    /// `tracked / total_events` as a percentage; 100 when the window had
    /// no events at all.
    pub compliance_rate: f64,
}

impl DetectionReport {
    pub fn untracked_count(&self) -> usize {
        self.untracked.len()
    }
}

pub fn correlate(events: &[TrailEvent], sessions: &[TrackedSession]) -> DetectionReport {
    let prefix = format!("{}:", sentinel_core::SOURCE_IDENTITY_PREFIX);

    // Key sessions by correlation id; duplicate store ids collapse.
    let mut by_correlation: HashMap<&str, &TrackedSession> = HashMap::new();
    let mut session_ids: HashSet<&str> = HashSet::new();
    for session in sessions {
        if session_ids.insert(&session.id) {
            by_correlation.insert(&session.correlation_id, session);
        }
    }

    let mut seen_events: HashSet<&str> = HashSet::new();
    let mut matched: HashSet<&str> = HashSet::new();
    let mut tracked = 0usize;
    let mut untracked = Vec::new();

    for event in events {
        if !seen_events.insert(&event.event_id) {
            continue;
        }
        let reason = match &event.source_identity {
            None => Some(UntrackedReason::NoSourceIdentity),
            Some(identity) => match identity.strip_prefix(&prefix) {
                None => Some(UntrackedReason::WrongPrefix),
                Some(correlation_id) => match by_correlation.get(correlation_id) {
                    Some(session) => {
                        matched.insert(session.id.as_str());
                        tracked += 1;
                        None
                    }
                    None => Some(UntrackedReason::UnknownIdentity),
                },
            },
        };
        if let Some(reason) = reason {
            untracked.push(UntrackedSession {
                event: event.clone(),
                reason,
            });
        }
    }

    let total_events = tracked + untracked.len();
    let compliance_rate = if total_events == 0 {
        100.0
    } else {
        tracked as f64 / total_events as f64 * 100.0
    };

    let mut orphaned: Vec<TrackedSession> = Vec::new();
    let mut orphan_ids: HashSet<&str> = HashSet::new();
    for session in sessions {
        if !matched.contains(session.id.as_str()) && orphan_ids.insert(&session.id) {
            orphaned.push(session.clone());
        }
    }

    DetectionReport {
        total_events,
        tracked,
        untracked,
        orphaned,
        compliance_rate,
    }
}
