//! Caller identity resolution.

use std::future::Future;
use std::pin::Pin;

use sentinel_core::arn;

use crate::error::CommandError;

type Bf<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub arn: String,
    pub account_id: String,
    pub user_id: String,
}

impl CallerIdentity {
    /// The name approval rules match against: the last `/` segment of the
    /// ARN, which is the session name for assumed-role callers.
    pub fn username(&self) -> &str {
        arn::username(&self.arn)
    }
}

pub trait IdentityProvider: Send + Sync {
    fn caller_identity(&self) -> Bf<'_, Result<CallerIdentity, CommandError>>;
}

/// The production provider: STS `GetCallerIdentity`.
pub struct StsIdentityProvider {
    client: aws_sdk_sts::Client,
}

impl StsIdentityProvider {
    pub fn new(config: &aws_config::SdkConfig) -> StsIdentityProvider {
        StsIdentityProvider {
            client: aws_sdk_sts::Client::new(config),
        }
    }
}

impl IdentityProvider for StsIdentityProvider {
    fn caller_identity(&self) -> Bf<'_, Result<CallerIdentity, CommandError>> {
        Box::pin(async {
            let resp = self
                .client
                .get_caller_identity()
                .send()
                .await
                .map_err(|e| CommandError::Sts(format!("GetCallerIdentity failed: {e}")))?;

            Ok(CallerIdentity {
                arn: resp.arn().unwrap_or_default().to_string(),
                account_id: resp.account().unwrap_or_default().to_string(),
                user_id: resp.user_id().unwrap_or_default().to_string(),
            })
        })
    }
}

/// Fixed identity for tests and local dry runs.
pub struct StaticIdentity(pub CallerIdentity);

impl StaticIdentity {
    pub fn user(name: &str) -> StaticIdentity {
        StaticIdentity(CallerIdentity {
            arn: format!("arn:aws:iam::123456789012:user/{name}"),
            account_id: "123456789012".into(),
            user_id: format!("AIDA{}", name.to_uppercase()),
        })
    }
}

impl IdentityProvider for StaticIdentity {
    fn caller_identity(&self) -> Bf<'_, Result<CallerIdentity, CommandError>> {
        let identity = self.0.clone();
        Box::pin(async move { Ok(identity) })
    }
}
