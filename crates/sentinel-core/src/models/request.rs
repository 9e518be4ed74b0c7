use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id;

/// Hard ceiling on how long an approved grant may last. Larger requested
/// durations are clamped at creation, not rejected.
pub const MAX_REQUEST_DURATION: SignedDuration = SignedDuration::from_hours(8);

/// Lifetime of the request row itself — distinct from the granted
/// `duration`. The store's TTL purges the row after this.
pub const DEFAULT_REQUEST_TTL: SignedDuration = SignedDuration::from_hours(24);

pub const MIN_JUSTIFICATION: usize = 10;
pub const MAX_JUSTIFICATION: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Denied,
    Expired,
    Cancelled,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 5] = [
        RequestStatus::Pending,
        RequestStatus::Approved,
        RequestStatus::Denied,
        RequestStatus::Expired,
        RequestStatus::Cancelled,
    ];

    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }

    /// Whether the state machine permits moving to `target`. Total over
    /// every pair of statuses; terminal states admit nothing.
    pub fn can_transition_to(self, target: RequestStatus) -> bool {
        match self {
            RequestStatus::Pending => matches!(
                target,
                RequestStatus::Approved
                    | RequestStatus::Denied
                    | RequestStatus::Expired
                    | RequestStatus::Cancelled
            ),
            RequestStatus::Approved
            | RequestStatus::Denied
            | RequestStatus::Expired
            | RequestStatus::Cancelled => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Denied => "denied",
            RequestStatus::Expired => "expired",
            RequestStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "denied" => Ok(RequestStatus::Denied),
            "expired" => Ok(RequestStatus::Expired),
            "cancelled" => Ok(RequestStatus::Cancelled),
            other => Err(CoreError::UnknownLabel {
                kind: "request status",
                value: other.to_string(),
            }),
        }
    }
}

/// A user's ask for timed access to a named profile.
///
/// `updated_at` doubles as the optimistic-concurrency token: entity methods
/// never touch it, the store compares it on update and stamps the new value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    pub requester: String,
    pub profile: String,
    pub justification: String,
    #[serde(with = "crate::duration::serde_secs")]
    pub duration: SignedDuration,
    pub status: RequestStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub approver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub approver_comment: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub expires_at: Timestamp,
}

impl Request {
    /// Create a pending request. Clamps `duration` to
    /// [`MAX_REQUEST_DURATION`] and stamps all three timestamps from `now`.
    pub fn new(
        requester: &str,
        profile: &str,
        justification: &str,
        duration: SignedDuration,
        now: Timestamp,
    ) -> Result<Request, CoreError> {
        if duration <= SignedDuration::ZERO {
            return Err(CoreError::InvalidDuration(
                "requested duration must be positive".into(),
            ));
        }
        let request = Request {
            id: id::generate(),
            requester: requester.to_string(),
            profile: profile.to_string(),
            justification: justification.to_string(),
            duration: duration.min(MAX_REQUEST_DURATION),
            status: RequestStatus::Pending,
            approver: None,
            approver_comment: None,
            created_at: now,
            updated_at: now,
            expires_at: now
                .saturating_add(DEFAULT_REQUEST_TTL)
                .map_err(|e| CoreError::InvalidDuration(e.to_string()))?,
        };
        request.validate()?;
        Ok(request)
    }

    /// Enforce the field invariants. Called at creation and by the store
    /// before persisting anything it was handed.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !id::validate(&self.id) {
            return Err(CoreError::InvalidId(self.id.clone()));
        }
        if self.requester.is_empty() {
            return Err(CoreError::MissingField("requester"));
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
        if self.duration <= SignedDuration::ZERO || self.duration > MAX_REQUEST_DURATION {
            return Err(CoreError::InvalidDuration(format!(
                "duration out of range: {}s",
                self.duration.as_secs()
            )));
        }
        if self.approver.is_some()
            && !matches!(self.status, RequestStatus::Approved | RequestStatus::Denied)
        {
            return Err(CoreError::Invariant("approver set without a decision status"));
        }
        if self.created_at > self.updated_at {
            return Err(CoreError::Invariant("updated_at precedes created_at"));
        }
        Ok(())
    }

    /// The STS source identity stamped on credentials issued for an
    /// approved request. Requests carry no second correlation id the way
    /// break-glass events do; the row id itself is the correlator.
    pub fn source_identity(&self) -> String {
        format!("{}:{}", crate::SOURCE_IDENTITY_PREFIX, self.id)
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }

    /// Move to `target` if the state machine allows it. Does not stamp
    /// `updated_at` — that is the store's job on persist.
    pub fn transition(&mut self, target: RequestStatus) -> Result<(), CoreError> {
        if !self.status.can_transition_to(target) {
            return Err(CoreError::IllegalTransition {
                from: self.status.as_str(),
                to: target.as_str(),
            });
        }
        self.status = target;
        Ok(())
    }

    pub fn approve(&mut self, approver: &str, comment: Option<&str>) -> Result<(), CoreError> {
        self.transition(RequestStatus::Approved)?;
        self.approver = Some(approver.to_string());
        self.approver_comment = comment.map(str::to_string);
        Ok(())
    }

    pub fn deny(&mut self, approver: &str, comment: Option<&str>) -> Result<(), CoreError> {
        self.transition(RequestStatus::Denied)?;
        self.approver = Some(approver.to_string());
        self.approver_comment = comment.map(str::to_string);
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), CoreError> {
        self.transition(RequestStatus::Cancelled)
    }
}
