//! Trust-document generation: the three canonical statement patterns a
//! deployment attaches to a brokered role. Independent of the analyzer.

use std::collections::BTreeMap;

use sentinel_core::SOURCE_IDENTITY_PREFIX;
use serde_json::json;

use crate::document::{
    ASSUME_ROLE_ACTION, Effect, Principal, Statement, StringOrVec, TrustDocument,
};
use crate::error::TrustError;

/// Besides assuming the role, the broker must be allowed to stamp the
/// source identity it later audits.
const SET_SOURCE_IDENTITY_ACTION: &str = "sts:SetSourceIdentity";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustPattern {
    /// Any identity the broker vouches for: a single statement conditioned
    /// on the `sentinel:*` source-identity prefix.
    AnySentinel,
    /// Same condition, but the principal is pinned to an explicit user
    /// list instead of the broker principal alone.
    SpecificUsers,
    /// Transitional: the sentinel-conditioned statement plus an
    /// unconditioned one for the legacy principal. Scores PARTIAL by
    /// construction and is meant to be temporary.
    Migration,
}

impl TrustPattern {
    pub fn as_str(self) -> &'static str {
        match self {
            TrustPattern::AnySentinel => "any-sentinel",
            TrustPattern::SpecificUsers => "specific-users",
            TrustPattern::Migration => "migration",
        }
    }
}

impl std::fmt::Display for TrustPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TrustPattern {
    type Err = TrustError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any-sentinel" => Ok(TrustPattern::AnySentinel),
            "specific-users" => Ok(TrustPattern::SpecificUsers),
            "migration" => Ok(TrustPattern::Migration),
            other => Err(TrustError::Document(format!("unknown trust pattern: {other}"))),
        }
    }
}

/// Build a trust document for `pattern`.
///
/// `users` is consulted only by `specific-users`; `legacy_principal` only
/// by `migration` (where it is required).
pub fn generate(
    pattern: TrustPattern,
    principal_arn: &str,
    users: &[String],
    legacy_principal: Option<&str>,
) -> Result<TrustDocument, TrustError> {
    let statements = match pattern {
        TrustPattern::AnySentinel => vec![sentinel_statement(
            "SentinelBrokered",
            &[principal_arn.to_string()],
        )],
        TrustPattern::SpecificUsers => {
            if users.is_empty() {
                return Err(TrustError::Document(
                    "specific-users pattern needs at least one user ARN".into(),
                ));
            }
            vec![sentinel_statement("SentinelSpecificUsers", users)]
        }
        TrustPattern::Migration => {
            let legacy = legacy_principal.ok_or_else(|| {
                TrustError::Document("migration pattern needs a legacy principal".into())
            })?;
            vec![
                sentinel_statement("SentinelBrokered", &[principal_arn.to_string()]),
                Statement {
                    sid: Some("LegacyDirectAccess".into()),
                    effect: Effect::Allow,
                    principal: Some(aws_principal(&[legacy.to_string()])),
                    action: StringOrVec::One(ASSUME_ROLE_ACTION.into()),
                    condition: None,
                },
            ]
        }
    };

    Ok(TrustDocument {
        version: "2012-10-17".into(),
        statements,
    })
}

fn aws_principal(arns: &[String]) -> Principal {
    let mut map = BTreeMap::new();
    let value = match arns {
        [single] => StringOrVec::One(single.clone()),
        many => StringOrVec::Many(many.to_vec()),
    };
    map.insert("AWS".to_string(), value);
    Principal::Map(map)
}

fn sentinel_statement(sid: &str, principals: &[String]) -> Statement {
    Statement {
        sid: Some(sid.to_string()),
        effect: Effect::Allow,
        principal: Some(aws_principal(principals)),
        action: StringOrVec::Many(vec![
            ASSUME_ROLE_ACTION.into(),
            SET_SOURCE_IDENTITY_ACTION.into(),
        ]),
        condition: Some(json!({
            "StringLike": {
                "sts:SourceIdentity": format!("{SOURCE_IDENTITY_PREFIX}:*")
            }
        })),
    }
}
