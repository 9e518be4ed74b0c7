//! ARN helpers.

/// Extract the username from a caller ARN.
///
/// Takes the last `/`-separated segment, so `arn:aws:iam::123:user/alice`
/// yields `alice` and `arn:aws:sts::123:assumed-role/Ops/alice` yields the
/// *session name* `alice`. Strings without a `/` are returned unchanged.
/// Approval rules that want to match an underlying role must rely on the
/// session-name convention.
pub fn username(arn: &str) -> &str {
    arn.rsplit('/').next().unwrap_or(arn)
}

/// Extract the resource name from a role ARN
/// (`arn:aws:iam::123:role/Deploy` yields `Deploy`).
pub fn role_name(role_arn: &str) -> &str {
    username(role_arn)
}
