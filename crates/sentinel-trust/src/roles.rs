//! Batch validation of live roles via IAM.

use aws_sdk_iam::Client;
use sentinel_core::arn;

use crate::analyzer::{Analyzer, RoleReport};
use crate::document::TrustDocument;

/// Fetch each role's trust document and score it. A role that cannot be
/// fetched or parsed yields a failed report; the batch carries on.
pub async fn validate_roles(
    client: &Client,
    analyzer: &Analyzer,
    role_arns: &[String],
) -> Vec<RoleReport> {
    let mut reports = Vec::with_capacity(role_arns.len());

    for role_arn in role_arns {
        let role_name = arn::role_name(role_arn);
        let resp = match client.get_role().role_name(role_name).send().await {
            Ok(resp) => resp,
            Err(e) => {
                let err = e.into_service_error();
                tracing::warn!(role = %role_arn, error = %err, "failed to fetch role");
                reports.push(RoleReport::failed(role_arn, err.to_string()));
                continue;
            }
        };

        let document = resp
            .role()
            .and_then(|role| role.assume_role_policy_document());
        let Some(raw) = document else {
            reports.push(RoleReport::failed(role_arn, "role has no trust document"));
            continue;
        };

        match TrustDocument::parse(raw) {
            Ok(doc) => reports.push(analyzer.analyze(role_arn, &doc)),
            Err(e) => {
                tracing::warn!(role = %role_arn, error = %e, "unparseable trust document");
                reports.push(RoleReport::failed(role_arn, e.to_string()));
            }
        }
    }

    reports
}
