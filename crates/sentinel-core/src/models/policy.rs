//! Approval policy and the matching rules commands evaluate.
//!
//! The rule grammar is deliberately narrow: profile lists, approver lists,
//! user allow-lists, and a max-duration bound. Policies are immutable
//! configuration loaded once at command start.

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApprovalPolicy {
    #[serde(default)]
    pub rules: Vec<ApprovalRule>,
}

impl ApprovalPolicy {
    pub fn from_json(raw: &str) -> Result<ApprovalPolicy, CoreError> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRule {
    pub name: String,
    pub profiles: Vec<String>,
    pub approvers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub auto_approve: Option<AutoApproveCondition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoApproveCondition {
    pub users: Vec<String>,
    #[serde(with = "crate::duration::serde_secs")]
    pub max_duration: SignedDuration,
}

/// First rule whose `profiles` contains `profile` wins; later rules are not
/// evaluated. Matching is exact string equality.
///
/// A profile with no matching rule is an *allow* at the approve site — any
/// authenticated user may approve. That open-by-default semantic exists for
/// migration and must not change; deployments that want closed-by-default
/// configure a catch-all rule with an empty approver list.
pub fn find_rule<'a>(policy: &'a ApprovalPolicy, profile: &str) -> Option<&'a ApprovalRule> {
    policy
        .rules
        .iter()
        .find(|rule| rule.profiles.iter().any(|p| p == profile))
}

pub fn can_approve(rule: &ApprovalRule, user: &str) -> bool {
    rule.approvers.iter().any(|a| a == user)
}

/// Whether a freshly-created request should skip straight to approved.
/// Pure in its inputs. `now` is reserved for time-window conditions and
/// currently unused; callers must pass it through regardless.
pub fn should_auto_approve(
    rule: &ApprovalRule,
    user: &str,
    _now: Timestamp,
    duration: SignedDuration,
) -> bool {
    match &rule.auto_approve {
        Some(cond) => cond.users.iter().any(|u| u == user) && duration <= cond.max_duration,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ApprovalPolicy {
        ApprovalPolicy {
            rules: vec![
                ApprovalRule {
                    name: "prod".into(),
                    profiles: vec!["prod".into(), "prod-eu".into()],
                    approvers: vec!["bob".into()],
                    auto_approve: Some(AutoApproveCondition {
                        users: vec!["alice".into()],
                        max_duration: SignedDuration::from_hours(2),
                    }),
                },
                ApprovalRule {
                    name: "catch-all".into(),
                    profiles: vec!["prod".into()],
                    approvers: vec!["carol".into()],
                    auto_approve: None,
                },
            ],
        }
    }

    #[test]
    fn first_matching_rule_wins() {
        let p = policy();
        let rule = find_rule(&p, "prod").unwrap();
        assert_eq!(rule.name, "prod");
    }

    #[test]
    fn no_rule_for_unknown_profile() {
        let p = policy();
        assert!(find_rule(&p, "staging").is_none());
    }

    #[test]
    fn profile_matching_is_exact() {
        let p = policy();
        assert!(find_rule(&p, "prod-").is_none());
        assert!(find_rule(&p, "PROD").is_none());
        assert!(find_rule(&p, "prod-eu").is_some());
    }

    #[test]
    fn can_approve_is_membership() {
        let p = policy();
        let rule = find_rule(&p, "prod").unwrap();
        assert!(can_approve(rule, "bob"));
        assert!(!can_approve(rule, "carol"));
    }

    #[test]
    fn auto_approve_requires_user_and_duration() {
        let p = policy();
        let rule = find_rule(&p, "prod").unwrap();
        let now = Timestamp::UNIX_EPOCH;

        assert!(should_auto_approve(rule, "alice", now, SignedDuration::from_hours(1)));
        assert!(should_auto_approve(rule, "alice", now, SignedDuration::from_hours(2)));
        // above the rule's max duration
        assert!(!should_auto_approve(rule, "alice", now, SignedDuration::from_hours(3)));
        // not in the allow-list
        assert!(!should_auto_approve(rule, "bob", now, SignedDuration::from_hours(1)));
    }

    #[test]
    fn auto_approve_is_pure() {
        let p = policy();
        let rule = find_rule(&p, "prod").unwrap();
        let now = Timestamp::UNIX_EPOCH;
        let first = should_auto_approve(rule, "alice", now, SignedDuration::from_hours(1));
        for _ in 0..8 {
            assert_eq!(
                should_auto_approve(rule, "alice", now, SignedDuration::from_hours(1)),
                first
            );
        }
    }

    #[test]
    fn missing_auto_approve_never_fires() {
        let rule = ApprovalRule {
            name: "plain".into(),
            profiles: vec!["dev".into()],
            approvers: vec!["bob".into()],
            auto_approve: None,
        };
        assert!(!should_auto_approve(
            &rule,
            "bob",
            Timestamp::UNIX_EPOCH,
            SignedDuration::from_mins(1)
        ));
    }

    #[test]
    fn policy_parses_from_json() {
        let raw = r#"{
            "rules": [
                {
                    "name": "prod",
                    "profiles": ["prod"],
                    "approvers": ["bob"],
                    "auto_approve": {"users": ["alice"], "max_duration": 7200}
                }
            ]
        }"#;
        let p = ApprovalPolicy::from_json(raw).unwrap();
        assert_eq!(p.rules.len(), 1);
        let cond = p.rules[0].auto_approve.as_ref().unwrap();
        assert_eq!(cond.max_duration, SignedDuration::from_hours(2));
    }
}
