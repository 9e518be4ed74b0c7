//! Store-side projection of issued credentials: approved requests and
//! break-glass events both count as sessions.

use jiff::{SignedDuration, Timestamp};
use sentinel_core::{BreakGlassEvent, Request};
use serde::{Deserialize, Serialize};

use crate::DetectionWindow;

/// Clock-skew tolerance applied when bounding the session query. A
/// credential issued moments before the window opened can produce events
/// inside it.
pub const CLOCK_SKEW: SignedDuration = SignedDuration::from_mins(5);

/// An issued credential as recorded by the store. `correlation_id` is the
/// suffix the issuer stamped into the STS source identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedSession {
    pub id: String,
    pub correlation_id: String,
    pub profile: String,
    pub invoker: String,
    pub created_at: jiff::Timestamp,
}

impl From<&BreakGlassEvent> for TrackedSession {
    fn from(event: &BreakGlassEvent) -> Self {
        TrackedSession {
            id: event.id.clone(),
            correlation_id: event.request_id.clone(),
            profile: event.profile.clone(),
            invoker: event.invoker.clone(),
            created_at: event.created_at,
        }
    }
}

impl From<&Request> for TrackedSession {
    /// Requests have no second correlation id; the row id itself is what
    /// gets stamped into the source identity (`Request::source_identity`).
    fn from(request: &Request) -> Self {
        TrackedSession {
            id: request.id.clone(),
            correlation_id: request.id.clone(),
            profile: request.profile.clone(),
            invoker: request.requester.clone(),
            created_at: request.created_at,
        }
    }
}

/// Project issued credentials into sessions, keeping only those whose
/// `created_at` falls inside the window widened by [`CLOCK_SKEW`], and
/// honoring the window's profile filter. Accepts anything that projects
/// to a [`TrackedSession`] — approved requests, break-glass events, or
/// sessions already projected.
pub fn sessions_in_window<I, T>(items: I, window: &DetectionWindow) -> Vec<TrackedSession>
where
    I: IntoIterator<Item = T>,
    T: Into<TrackedSession>,
{
    let start = window.start.saturating_sub(CLOCK_SKEW).unwrap_or(Timestamp::MIN);
    let end = window.end.saturating_add(CLOCK_SKEW).unwrap_or(Timestamp::MAX);

    items
        .into_iter()
        .map(Into::into)
        .filter(|session| session.created_at >= start && session.created_at <= end)
        .filter(|session| match &window.profile {
            Some(profile) => &session.profile == profile,
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use sentinel_core::ReasonCode;

    use super::*;

    fn event_at(offset: SignedDuration) -> BreakGlassEvent {
        BreakGlassEvent::new(
            "alice",
            "prod",
            ReasonCode::Incident,
            "production outage, paging gave no responder",
            SignedDuration::from_hours(1),
            Timestamp::UNIX_EPOCH.saturating_add(offset).expect("fixed test offset"),
        )
        .unwrap()
    }

    fn window(hours: i64) -> DetectionWindow {
        DetectionWindow {
            start: Timestamp::UNIX_EPOCH,
            end: Timestamp::UNIX_EPOCH.saturating_add(SignedDuration::from_hours(hours)).expect("fixed test offset"),
            role_arn: None,
            profile: None,
        }
    }

    #[test]
    fn skew_widens_the_window() {
        let just_before = event_at(SignedDuration::from_mins(-3));
        let way_before = event_at(SignedDuration::from_hours(-2));
        let inside = event_at(SignedDuration::from_mins(30));

        let sessions =
            sessions_in_window([&just_before, &way_before, &inside], &window(1));
        assert_eq!(sessions.len(), 2);
    }

    #[test]
    fn profile_filter_applies_to_sessions() {
        let event = event_at(SignedDuration::from_mins(10));
        let mut w = window(1);
        w.profile = Some("staging".into());
        assert!(sessions_in_window([&event], &w).is_empty());
        w.profile = Some("prod".into());
        assert_eq!(sessions_in_window([&event], &w).len(), 1);
    }

    #[test]
    fn correlation_id_is_the_request_id() {
        let event = event_at(SignedDuration::ZERO);
        let sessions = sessions_in_window([&event], &window(1));
        assert_eq!(sessions[0].correlation_id, event.request_id);
    }

    #[test]
    fn approved_requests_project_with_their_row_id() {
        let request = Request::new(
            "alice",
            "prod",
            "incident INC-1 needs prod access",
            SignedDuration::from_hours(2),
            Timestamp::UNIX_EPOCH.saturating_add(SignedDuration::from_mins(10)).expect("fixed test offset"),
        )
        .unwrap();

        let sessions = sessions_in_window([&request], &window(1));
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].correlation_id, request.id);
        assert_eq!(sessions[0].invoker, "alice");
        assert_eq!(sessions[0].profile, "prod");
    }
}
