//! Trust-validation command: thin wrapper over the analyzer batch.

use sentinel_trust::{Analyzer, RoleReport};

use crate::error::CommandError;

/// Validate a batch of roles against the enforcement rules.
pub async fn validate_trust(
    iam: &aws_sdk_iam::Client,
    analyzer: &Analyzer,
    role_arns: &[String],
) -> Result<Vec<RoleReport>, CommandError> {
    if role_arns.is_empty() {
        return Err(CommandError::InvalidInput(
            "at least one role ARN is required".into(),
        ));
    }
    let reports = sentinel_trust::validate_roles(iam, analyzer, role_arns).await;
    let non_compliant = reports.iter().filter(|r| !r.compliant()).count();
    tracing::info!(
        roles = reports.len(),
        non_compliant,
        "trust validation complete"
    );
    Ok(reports)
}
