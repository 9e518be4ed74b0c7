//! IAM trust-document parsing.
//!
//! IAM returns `AssumeRolePolicyDocument` URL-encoded, so parsing always
//! percent-decodes first — plain JSON passes through the decoder
//! unchanged. The grammar is permissive where IAM is: `Statement`,
//! `Action`, and principal values all accept either a single string or an
//! array.

use std::collections::BTreeMap;

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use crate::error::TrustError;

pub const ASSUME_ROLE_ACTION: &str = "sts:AssumeRole";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustDocument {
    #[serde(rename = "Version", default = "default_version")]
    pub version: String,
    #[serde(rename = "Statement", default, deserialize_with = "one_or_many")]
    pub statements: Vec<Statement>,
}

fn default_version() -> String {
    "2012-10-17".to_string()
}

impl TrustDocument {
    /// Percent-decode and parse. Malformed JSON is a [`TrustError::Document`]
    /// carrying enough detail to name the offending role in batch output.
    pub fn parse(raw: &str) -> Result<TrustDocument, TrustError> {
        let decoded = percent_decode_str(raw)
            .decode_utf8()
            .map_err(|e| TrustError::Document(format!("bad percent-encoding: {e}")))?;
        serde_json::from_str(&decoded).map_err(|e| TrustError::Document(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, TrustError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    #[serde(rename = "Sid", skip_serializing_if = "Option::is_none", default)]
    pub sid: Option<String>,
    #[serde(rename = "Effect")]
    pub effect: Effect,
    #[serde(rename = "Principal", skip_serializing_if = "Option::is_none", default)]
    pub principal: Option<Principal>,
    #[serde(rename = "Action", default)]
    pub action: StringOrVec,
    #[serde(rename = "Condition", skip_serializing_if = "Option::is_none", default)]
    pub condition: Option<serde_json::Value>,
}

impl Statement {
    pub fn is_allow(&self) -> bool {
        self.effect == Effect::Allow
    }

    pub fn grants_assume_role(&self) -> bool {
        self.action.iter().any(|a| a == ASSUME_ROLE_ACTION || a == "sts:*")
    }

    pub fn principal_is_wildcard(&self) -> bool {
        match &self.principal {
            Some(Principal::Wildcard(s)) => s == "*",
            Some(Principal::Map(map)) => map
                .values()
                .any(|values| values.iter().any(|v| v == "*")),
            None => false,
        }
    }

    /// The `StringLike` values bound to `sts:SourceIdentity`, if any.
    pub fn source_identity_patterns(&self) -> Vec<&str> {
        let Some(condition) = &self.condition else {
            return Vec::new();
        };
        let Some(string_like) = condition.get("StringLike") else {
            return Vec::new();
        };
        match string_like.get("sts:SourceIdentity") {
            Some(serde_json::Value::String(s)) => vec![s.as_str()],
            Some(serde_json::Value::Array(items)) => {
                items.iter().filter_map(|v| v.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// `Principal` is either the bare wildcard string or a map of principal
/// type to one-or-many values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Principal {
    Wildcard(String),
    Map(BTreeMap<String, StringOrVec>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrVec {
    One(String),
    Many(Vec<String>),
}

impl StringOrVec {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        match self {
            StringOrVec::One(s) => std::slice::from_ref(s).iter().map(String::as_str),
            StringOrVec::Many(items) => items.as_slice().iter().map(String::as_str),
        }
    }
}

impl Default for StringOrVec {
    fn default() -> Self {
        StringOrVec::Many(Vec::new())
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<Statement>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(Box<Statement>),
        Many(Vec<Statement>),
    }

    match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(statement) => Ok(vec![*statement]),
        OneOrMany::Many(statements) => Ok(statements),
    }
}
