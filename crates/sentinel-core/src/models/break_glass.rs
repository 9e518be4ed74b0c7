use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id;

/// Hard ceiling on a break-glass grant. Half the normal request ceiling —
/// emergencies are short by definition.
pub const MAX_BREAK_GLASS_DURATION: SignedDuration = SignedDuration::from_hours(4);

pub const MIN_JUSTIFICATION: usize = 20;
pub const MAX_JUSTIFICATION: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    Incident,
    Maintenance,
    Security,
    Recovery,
    Other,
}

impl ReasonCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ReasonCode::Incident => "incident",
            ReasonCode::Maintenance => "maintenance",
            ReasonCode::Security => "security",
            ReasonCode::Recovery => "recovery",
            ReasonCode::Other => "other",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReasonCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incident" => Ok(ReasonCode::Incident),
            "maintenance" => Ok(ReasonCode::Maintenance),
            "security" => Ok(ReasonCode::Security),
            "recovery" => Ok(ReasonCode::Recovery),
            "other" => Ok(ReasonCode::Other),
            other => Err(CoreError::UnknownLabel {
                kind: "reason code",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakGlassStatus {
    Active,
    Closed,
    Expired,
}

impl BreakGlassStatus {
    pub const ALL: [BreakGlassStatus; 3] = [
        BreakGlassStatus::Active,
        BreakGlassStatus::Closed,
        BreakGlassStatus::Expired,
    ];

    pub fn is_terminal(self) -> bool {
        !matches!(self, BreakGlassStatus::Active)
    }

    pub fn can_transition_to(self, target: BreakGlassStatus) -> bool {
        match self {
            BreakGlassStatus::Active => {
                matches!(target, BreakGlassStatus::Closed | BreakGlassStatus::Expired)
            }
            BreakGlassStatus::Closed | BreakGlassStatus::Expired => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BreakGlassStatus::Active => "active",
            BreakGlassStatus::Closed => "closed",
            BreakGlassStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for BreakGlassStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BreakGlassStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(BreakGlassStatus::Active),
            "closed" => Ok(BreakGlassStatus::Closed),
            "expired" => Ok(BreakGlassStatus::Expired),
            other => Err(CoreError::UnknownLabel {
                kind: "break-glass status",
                value: other.to_string(),
            }),
        }
    }
}

/// An immediately-active emergency grant.
///
/// `request_id` is a second random id stamped into the STS source identity
/// so CloudTrail events can be correlated back to this event. At most one
/// active event may exist per `(invoker, profile)` — the store enforces
/// that at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakGlassEvent {
    pub id: String,
    pub invoker: String,
    pub profile: String,
    pub reason_code: ReasonCode,
    pub justification: String,
    #[serde(with = "crate::duration::serde_secs")]
    pub duration: SignedDuration,
    pub status: BreakGlassStatus,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub closed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub closed_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub expires_at: Timestamp,
}

impl BreakGlassEvent {
    /// Create an active event. Clamps `duration` to
    /// [`MAX_BREAK_GLASS_DURATION`]; `expires_at` is `created_at + duration`
    /// since the grant starts immediately.
    pub fn new(
        invoker: &str,
        profile: &str,
        reason_code: ReasonCode,
        justification: &str,
        duration: SignedDuration,
        now: Timestamp,
    ) -> Result<BreakGlassEvent, CoreError> {
        if duration <= SignedDuration::ZERO {
            return Err(CoreError::InvalidDuration(
                "break-glass duration must be positive".into(),
            ));
        }
        let duration = duration.min(MAX_BREAK_GLASS_DURATION);
        let event = BreakGlassEvent {
            id: id::generate(),
            invoker: invoker.to_string(),
            profile: profile.to_string(),
            reason_code,
            justification: justification.to_string(),
            duration,
            status: BreakGlassStatus::Active,
            request_id: id::generate(),
            closed_by: None,
            closed_reason: None,
            created_at: now,
            updated_at: now,
            expires_at: now
                .saturating_add(duration)
                .map_err(|e| CoreError::InvalidDuration(e.to_string()))?,
        };
        event.validate()?;
        Ok(event)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !id::validate(&self.id) {
            return Err(CoreError::InvalidId(self.id.clone()));
        }
        if !id::validate(&self.request_id) {
            return Err(CoreError::InvalidId(self.request_id.clone()));
        }
        if self.invoker.is_empty() {
            return Err(CoreError::MissingField("invoker"));
        }
        if self.profile.is_empty() {
            return Err(CoreError::MissingField("profile"));
        }
        let len = self.justification.chars().count();
        if !(MIN_JUSTIFICATION..=MAX_JUSTIFICATION).contains(&len) {
            return Err(CoreError::JustificationLength {
                min: MIN_JUSTIFICATION,
                max: MAX_JUSTIFICATION,
                len,
            });
        }
        if self.duration <= SignedDuration::ZERO || self.duration > MAX_BREAK_GLASS_DURATION {
            return Err(CoreError::InvalidDuration(format!(
                "duration out of range: {}s",
                self.duration.as_secs()
            )));
        }
        match self.status {
            BreakGlassStatus::Closed => {
                if self.closed_by.is_none() || self.closed_reason.is_none() {
                    return Err(CoreError::MissingField("closed_by/closed_reason"));
                }
            }
            _ => {
                if self.closed_by.is_some() || self.closed_reason.is_some() {
                    return Err(CoreError::Invariant("closed_by set without closed status"));
                }
            }
        }
        if self.created_at > self.updated_at {
            return Err(CoreError::Invariant("updated_at precedes created_at"));
        }
        Ok(())
    }

    /// The STS source identity stamped on credentials issued for this event.
    pub fn source_identity(&self) -> String {
        format!("{}:{}", crate::SOURCE_IDENTITY_PREFIX, self.request_id)
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }

    pub fn transition(&mut self, target: BreakGlassStatus) -> Result<(), CoreError> {
        if !self.status.can_transition_to(target) {
            return Err(CoreError::IllegalTransition {
                from: self.status.as_str(),
                to: target.as_str(),
            });
        }
        self.status = target;
        Ok(())
    }

    /// Close the event. Any identity may close; the closer and a non-empty
    /// reason are mandatory and recorded.
    pub fn close(&mut self, closed_by: &str, reason: &str) -> Result<(), CoreError> {
        if reason.trim().is_empty() {
            return Err(CoreError::MissingField("closed_reason"));
        }
        self.transition(BreakGlassStatus::Closed)?;
        self.closed_by = Some(closed_by.to_string());
        self.closed_reason = Some(reason.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(now: Timestamp) -> BreakGlassEvent {
        BreakGlassEvent::new(
            "alice",
            "prod",
            ReasonCode::Incident,
            "production outage, paging gave no responder",
            SignedDuration::from_hours(2),
            now,
        )
        .unwrap()
    }

    #[test]
    fn new_event_is_active_and_expires_after_duration() {
        let now = Timestamp::UNIX_EPOCH;
        let e = sample(now);
        assert_eq!(e.status, BreakGlassStatus::Active);
        assert_eq!(e.expires_at, now.saturating_add(SignedDuration::from_hours(2)).expect("fixed test offset"));
        assert_ne!(e.id, e.request_id);
    }

    #[test]
    fn duration_is_clamped_to_four_hours() {
        let e = BreakGlassEvent::new(
            "alice",
            "prod",
            ReasonCode::Maintenance,
            "emergency patching of the prod fleet",
            SignedDuration::from_hours(12),
            Timestamp::UNIX_EPOCH,
        )
        .unwrap();
        assert_eq!(e.duration, MAX_BREAK_GLASS_DURATION);
    }

    #[test]
    fn close_requires_a_reason() {
        let mut e = sample(Timestamp::UNIX_EPOCH);
        assert!(e.close("bob", "  ").is_err());
        e.close("bob", "incident resolved").unwrap();
        assert_eq!(e.status, BreakGlassStatus::Closed);
        assert_eq!(e.closed_by.as_deref(), Some("bob"));
        e.validate().unwrap();
    }

    #[test]
    fn closed_event_admits_no_transitions() {
        let mut e = sample(Timestamp::UNIX_EPOCH);
        e.close("bob", "done").unwrap();
        assert!(e.transition(BreakGlassStatus::Expired).is_err());
        assert!(e.transition(BreakGlassStatus::Active).is_err());
    }

    #[test]
    fn transition_table_is_total() {
        for from in BreakGlassStatus::ALL {
            for to in BreakGlassStatus::ALL {
                let legal = from.can_transition_to(to);
                assert_eq!(legal, from == BreakGlassStatus::Active && to != from);
            }
        }
    }

    #[test]
    fn source_identity_carries_the_prefix() {
        let e = sample(Timestamp::UNIX_EPOCH);
        assert_eq!(e.source_identity(), format!("sentinel:{}", e.request_id));
    }

    #[test]
    fn short_justification_is_rejected() {
        let err = BreakGlassEvent::new(
            "alice",
            "prod",
            ReasonCode::Other,
            "too short",
            SignedDuration::from_hours(1),
            Timestamp::UNIX_EPOCH,
        );
        assert!(err.is_err());
    }
}
