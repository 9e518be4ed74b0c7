//! The fixed rule set scored against each trust document.

use sentinel_core::SOURCE_IDENTITY_PREFIX;
use serde::{Deserialize, Serialize};

use crate::document::{Statement, TrustDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// How completely a trust document funnels role assumption through
/// Sentinel. Ordered: `None < Partial < Full`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementLevel {
    None,
    Partial,
    Full,
}

#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub rule_id: &'static str,
    pub risk: RiskLevel,
    /// Index of the offending statement; `None` for role-level findings.
    pub statement: Option<usize>,
    pub message: String,
    pub recommendation: &'static str,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RiskSummary {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl RiskSummary {
    fn count(&mut self, risk: RiskLevel) {
        match risk {
            RiskLevel::High => self.high += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::Low => self.low += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleReport {
    pub role_arn: String,
    pub level: EnforcementLevel,
    pub findings: Vec<Finding>,
    pub risk_summary: RiskSummary,
    /// Set when the role's document could not be fetched or parsed; the
    /// findings are then empty and the report is non-compliant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RoleReport {
    pub fn compliant(&self) -> bool {
        self.error.is_none() && self.risk_summary.high == 0
    }

    pub fn failed(role_arn: impl Into<String>, error: impl Into<String>) -> RoleReport {
        RoleReport {
            role_arn: role_arn.into(),
            level: EnforcementLevel::None,
            findings: Vec::new(),
            risk_summary: RiskSummary::default(),
            error: Some(error.into()),
        }
    }
}

pub struct Analyzer {
    source_identity_prefix: String,
}

impl Default for Analyzer {
    fn default() -> Self {
        Analyzer::new(SOURCE_IDENTITY_PREFIX)
    }
}

/// How a single allow-statement relates to the required condition.
enum Coverage {
    /// Carries a source-identity pattern under our prefix.
    Enforced,
    /// Carries source-identity patterns, all under other prefixes.
    Foreign,
    /// No source-identity condition at all.
    Missing,
}

impl Analyzer {
    pub fn new(prefix: impl Into<String>) -> Analyzer {
        Analyzer {
            source_identity_prefix: prefix.into(),
        }
    }

    fn coverage(&self, statement: &Statement) -> Coverage {
        let wanted = format!("{}:", self.source_identity_prefix);
        let patterns = statement.source_identity_patterns();
        if patterns.is_empty() {
            Coverage::Missing
        } else if patterns.iter().any(|p| p.starts_with(&wanted)) {
            Coverage::Enforced
        } else {
            Coverage::Foreign
        }
    }

    /// Score one trust document. Only allow-statements granting
    /// `sts:AssumeRole` participate; deny-statements and unrelated actions
    /// are ignored.
    pub fn analyze(&self, role_arn: &str, doc: &TrustDocument) -> RoleReport {
        let mut findings = Vec::new();
        let mut enforced = 0usize;
        let mut unenforced = 0usize;

        for (index, statement) in doc.statements.iter().enumerate() {
            if !statement.is_allow() || !statement.grants_assume_role() {
                continue;
            }

            if statement.principal_is_wildcard() {
                findings.push(Finding {
                    rule_id: "TRUST-02",
                    risk: RiskLevel::High,
                    statement: Some(index),
                    message: "assume-role statement trusts the wildcard principal".into(),
                    recommendation:
                        "replace the wildcard principal with the specific principals that may assume this role",
                });
            }

            match self.coverage(statement) {
                Coverage::Enforced => enforced += 1,
                Coverage::Foreign => {
                    unenforced += 1;
                    findings.push(Finding {
                        rule_id: "TRUST-03",
                        risk: RiskLevel::Medium,
                        statement: Some(index),
                        message: format!(
                            "sts:SourceIdentity is conditioned on a prefix other than {}:*",
                            self.source_identity_prefix
                        ),
                        recommendation:
                            "narrow the sts:SourceIdentity pattern to the sentinel:* prefix",
                    });
                }
                Coverage::Missing => {
                    unenforced += 1;
                    findings.push(Finding {
                        rule_id: "TRUST-01",
                        risk: RiskLevel::High,
                        statement: Some(index),
                        message: "assume-role statement carries no sts:SourceIdentity condition"
                            .into(),
                        recommendation:
                            "add a StringLike condition on sts:SourceIdentity scoped to the sentinel:* prefix",
                    });
                }
            }
        }

        let level = match (enforced, unenforced) {
            (_, 0) => EnforcementLevel::Full,
            (0, _) => EnforcementLevel::None,
            _ => EnforcementLevel::Partial,
        };

        if level == EnforcementLevel::Partial {
            findings.push(Finding {
                rule_id: "TRUST-04",
                risk: RiskLevel::Medium,
                statement: None,
                message: "some allow-statements carry the source-identity condition and some do not"
                    .into(),
                recommendation:
                    "apply the source-identity condition to every allow-statement, not just some",
            });
        }

        let mut risk_summary = RiskSummary::default();
        for finding in &findings {
            risk_summary.count(finding.risk);
        }

        RoleReport {
            role_arn: role_arn.to_string(),
            level,
            findings,
            risk_summary,
            error: None,
        }
    }
}
