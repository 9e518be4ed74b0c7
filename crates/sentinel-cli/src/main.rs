//! `sentinel` — the command-line entry point.
//!
//! Deliberately thin: flag parsing, config and policy loading, wiring the
//! command context, and mapping results to exit codes. Everything with
//! behavior lives in the library crates.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use jiff::Timestamp;
use tracing_subscriber::EnvFilter;

use sentinel_audit::{AuditLog, Signer, Verifier, keys};
use sentinel_commands::exit::{
    EXIT_FINDINGS, EXIT_OK, detect_exit_code, trust_exit_code, verify_exit_code,
};
use sentinel_commands::{
    BreakGlassFilter, CommandContext, CommandError, CreateRequestParams, DetectParams,
    InvokeParams, RequestFilter, StsIdentityProvider, TracingNotifier, run_with_deadline,
};
use sentinel_core::models::policy::ApprovalPolicy;
use sentinel_core::{BreakGlassStatus, ReasonCode, RequestStatus, duration};
use sentinel_store::{
    DynamoBreakGlassStore, DynamoRequestStore, NotifyBreakGlassStore, NotifyRequestStore,
    TracingObserver,
};
use sentinel_trust::{Analyzer, TrustPattern, generator};

mod config;

use config::SentinelConfig;

#[derive(Parser)]
#[command(
    name = "sentinel",
    about = "Privileged-access control plane for AWS IAM credentials",
    version
)]
struct Cli {
    /// Config file (defaults to the OS config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overall command deadline, e.g. "1m" (duration grammar: d/h/m)
    #[arg(long, global = true)]
    timeout: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Request timed access to a profile
    Request {
        profile: String,
        #[arg(long)]
        justification: String,
        #[arg(long, default_value = "1h")]
        duration: String,
    },
    /// Approve a pending request
    Approve {
        request_id: String,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Deny a pending request
    Deny {
        request_id: String,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Cancel your own pending request
    Cancel { request_id: String },
    /// List requests (defaults to your own)
    List {
        #[arg(long)]
        requester: Option<String>,
        /// pending, approved, denied, expired, or cancelled
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        profile: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: i32,
    },
    /// Emergency access without the approval step
    #[command(subcommand)]
    BreakGlass(BreakGlassCommand),
    /// Detect sessions that bypassed the broker
    Detect {
        /// Window start, RFC 3339
        #[arg(long)]
        start: String,
        /// Window end, RFC 3339
        #[arg(long)]
        end: String,
        #[arg(long)]
        role_arn: Option<String>,
        #[arg(long)]
        profile: Option<String>,
    },
    /// Trust-document analysis and generation
    #[command(subcommand)]
    Trust(TrustCommand),
    /// Verify the signed audit log
    Verify {
        /// Log file (defaults to the configured audit_log_path)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum BreakGlassCommand {
    /// Open an immediately-active emergency grant
    Invoke {
        profile: String,
        /// One of: incident, maintenance, security, recovery, other
        #[arg(long)]
        reason: String,
        #[arg(long)]
        justification: String,
        #[arg(long, default_value = "1h")]
        duration: String,
    },
    /// Close an active grant
    Close {
        event_id: String,
        #[arg(long)]
        reason: String,
    },
    /// List break-glass events (defaults to your own)
    List {
        #[arg(long)]
        invoker: Option<String>,
        /// active, closed, or expired
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        profile: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: i32,
    },
}

#[derive(Subcommand)]
enum TrustCommand {
    /// Score live roles against the enforcement rules
    Validate {
        #[arg(required = true)]
        role_arns: Vec<String>,
    },
    /// Emit a trust document for a role
    Generate {
        /// One of: any-sentinel, specific-users, migration
        #[arg(long)]
        pattern: String,
        /// The broker principal ARN
        #[arg(long)]
        principal: String,
        /// User ARNs (specific-users pattern)
        #[arg(long = "user")]
        users: Vec<String>,
        /// Legacy principal ARN (migration pattern)
        #[arg(long)]
        legacy_principal: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            EXIT_FINDINGS
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32, CommandError> {
    let config = config::load(cli.config.as_deref())?;
    let deadline = match &cli.timeout {
        Some(raw) => {
            let parsed = duration::parse(raw)?;
            Some(Duration::from_secs(parsed.as_secs().max(0) as u64))
        }
        None => None,
    };

    match cli.command {
        Command::Request {
            profile,
            justification,
            duration: raw_duration,
        } => {
            let params = CreateRequestParams {
                profile,
                justification,
                duration: duration::parse(&raw_duration)?,
            };
            let ctx = build_context(&config).await?;
            let request = run_with_deadline(
                deadline,
                sentinel_commands::create_request(&ctx, params),
            )
            .await?;
            print_json(&request)?;
            Ok(EXIT_OK)
        }
        Command::Approve {
            request_id,
            comment,
        } => {
            let ctx = build_context(&config).await?;
            let request = run_with_deadline(
                deadline,
                sentinel_commands::approve_request(&ctx, &request_id, comment),
            )
            .await?;
            print_json(&request)?;
            Ok(EXIT_OK)
        }
        Command::Deny {
            request_id,
            comment,
        } => {
            let ctx = build_context(&config).await?;
            let request = run_with_deadline(
                deadline,
                sentinel_commands::deny_request(&ctx, &request_id, comment),
            )
            .await?;
            print_json(&request)?;
            Ok(EXIT_OK)
        }
        Command::Cancel { request_id } => {
            let ctx = build_context(&config).await?;
            let request = run_with_deadline(
                deadline,
                sentinel_commands::cancel_request(&ctx, &request_id),
            )
            .await?;
            print_json(&request)?;
            Ok(EXIT_OK)
        }
        Command::List {
            requester,
            status,
            profile,
            limit,
        } => {
            let filter = match (requester, status, profile) {
                (Some(requester), None, None) => RequestFilter::Requester(requester),
                (None, Some(status), None) => {
                    RequestFilter::Status(status.parse::<RequestStatus>()?)
                }
                (None, None, Some(profile)) => RequestFilter::Profile(profile),
                (None, None, None) => RequestFilter::Mine,
                _ => {
                    return Err(CommandError::InvalidInput(
                        "pick at most one of --requester, --status, --profile".into(),
                    ));
                }
            };
            let ctx = build_context(&config).await?;
            let rows = run_with_deadline(
                deadline,
                sentinel_commands::list_requests(&ctx, filter, limit),
            )
            .await?;
            print_json(&rows)?;
            Ok(EXIT_OK)
        }
        Command::BreakGlass(BreakGlassCommand::Invoke {
            profile,
            reason,
            justification,
            duration: raw_duration,
        }) => {
            let params = InvokeParams {
                profile,
                reason_code: reason.parse::<ReasonCode>()?,
                justification,
                duration: duration::parse(&raw_duration)?,
            };
            let ctx = build_context(&config).await?;
            let event = run_with_deadline(
                deadline,
                sentinel_commands::invoke_break_glass(&ctx, params),
            )
            .await?;
            print_json(&event)?;
            Ok(EXIT_OK)
        }
        Command::BreakGlass(BreakGlassCommand::Close { event_id, reason }) => {
            let ctx = build_context(&config).await?;
            let event = run_with_deadline(
                deadline,
                sentinel_commands::close_break_glass(&ctx, &event_id, &reason),
            )
            .await?;
            print_json(&event)?;
            Ok(EXIT_OK)
        }
        Command::BreakGlass(BreakGlassCommand::List {
            invoker,
            status,
            profile,
            limit,
        }) => {
            let filter = match (invoker, status, profile) {
                (Some(invoker), None, None) => BreakGlassFilter::Invoker(invoker),
                (None, Some(status), None) => {
                    BreakGlassFilter::Status(status.parse::<BreakGlassStatus>()?)
                }
                (None, None, Some(profile)) => BreakGlassFilter::Profile(profile),
                (None, None, None) => BreakGlassFilter::Mine,
                _ => {
                    return Err(CommandError::InvalidInput(
                        "pick at most one of --invoker, --status, --profile".into(),
                    ));
                }
            };
            let ctx = build_context(&config).await?;
            let rows = run_with_deadline(
                deadline,
                sentinel_commands::list_break_glass(&ctx, filter, limit),
            )
            .await?;
            print_json(&rows)?;
            Ok(EXIT_OK)
        }
        Command::Detect {
            start,
            end,
            role_arn,
            profile,
        } => {
            let params = DetectParams {
                start: parse_timestamp(&start)?,
                end: parse_timestamp(&end)?,
                role_arn,
                profile,
            };
            let ctx = build_context(&config).await?;
            let trail = aws_sdk_cloudtrail::Client::new(&sdk_config(&config).await);
            let report = run_with_deadline(
                deadline,
                sentinel_commands::detect_untracked(&ctx, &trail, params),
            )
            .await?;
            print_json(&report)?;
            Ok(detect_exit_code(&report))
        }
        Command::Trust(TrustCommand::Validate { role_arns }) => {
            let iam = aws_sdk_iam::Client::new(&sdk_config(&config).await);
            let analyzer = Analyzer::default();
            let reports = run_with_deadline(
                deadline,
                sentinel_commands::validate_trust(&iam, &analyzer, &role_arns),
            )
            .await?;
            print_json(&reports)?;
            Ok(trust_exit_code(&reports))
        }
        Command::Trust(TrustCommand::Generate {
            pattern,
            principal,
            users,
            legacy_principal,
        }) => {
            let pattern = pattern.parse::<TrustPattern>()?;
            let doc = generator::generate(
                pattern,
                &principal,
                &users,
                legacy_principal.as_deref(),
            )?;
            println!("{}", doc.to_json_pretty().map_err(CommandError::Trust)?);
            Ok(EXIT_OK)
        }
        Command::Verify { path } => {
            let path = path
                .or_else(|| config.audit_log_path.clone())
                .ok_or_else(|| {
                    CommandError::InvalidInput(
                        "no log path given and no audit_log_path configured".into(),
                    )
                })?;
            let verifier = build_verifier(&config)?;
            let report = sentinel_commands::verify_log(&verifier, &path)?;
            print_json(&verify_summary(&report))?;
            Ok(verify_exit_code(&report))
        }
    }
}

async fn sdk_config(config: &SentinelConfig) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = &config.region {
        loader = loader.region(aws_config::Region::new(region.clone()));
    }
    loader.load().await
}

async fn build_context(config: &SentinelConfig) -> Result<CommandContext, CommandError> {
    let sdk = sdk_config(config).await;
    let dynamo = aws_sdk_dynamodb::Client::new(&sdk);

    let policy = match &config.policy_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|e| {
                CommandError::InvalidInput(format!(
                    "failed to read policy at {}: {e}",
                    path.display()
                ))
            })?;
            ApprovalPolicy::from_json(&raw)?
        }
        None => {
            tracing::warn!("no approval policy configured; approvals are open to any caller");
            ApprovalPolicy::default()
        }
    };

    let audit = match (&config.audit_log_path, &config.audit_key_file) {
        (Some(log_path), Some(key_file)) => {
            let key = keys::from_file(key_file)?;
            let signer = Signer::new(config.audit_key_id.clone(), key)?;
            Some(AuditLog::open(log_path, signer))
        }
        (Some(_), None) => {
            return Err(CommandError::InvalidInput(
                "audit_log_path is set but audit_key_file is not".into(),
            ));
        }
        _ => {
            tracing::warn!("audit logging disabled; no audit_log_path configured");
            None
        }
    };

    let observer = Arc::new(TracingObserver);
    Ok(CommandContext {
        requests: Arc::new(NotifyRequestStore::new(
            DynamoRequestStore::new(dynamo.clone(), config.requests_table.clone()),
            observer.clone(),
        )),
        break_glass: Arc::new(NotifyBreakGlassStore::new(
            DynamoBreakGlassStore::new(dynamo, config.break_glass_table.clone()),
            observer,
        )),
        identity: Arc::new(StsIdentityProvider::new(&sdk)),
        notifier: Arc::new(TracingNotifier),
        policy,
        audit,
    })
}

fn build_verifier(config: &SentinelConfig) -> Result<Verifier, CommandError> {
    let key_file = config.audit_key_file.as_ref().ok_or_else(|| {
        CommandError::InvalidInput("no audit_key_file configured".into())
    })?;
    let key = keys::from_file(key_file)?;
    Ok(Verifier::new().with_key(config.audit_key_id.clone(), key))
}

fn parse_timestamp(raw: &str) -> Result<Timestamp, CommandError> {
    raw.parse()
        .map_err(|e| CommandError::InvalidInput(format!("bad timestamp {raw:?}: {e}")))
}

fn verify_summary(report: &sentinel_audit::VerifyReport) -> serde_json::Value {
    serde_json::json!({
        "total": report.total,
        "valid": report.valid,
        "wrong_key": report.wrong_key,
        "failures": report
            .failures
            .iter()
            .map(|f| serde_json::json!({
                "line": f.line_no,
                "verdict": format!("{:?}", f.verdict),
            }))
            .collect::<Vec<_>>(),
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CommandError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| CommandError::InvalidInput(format!("failed to render output: {e}")))?;
    println!("{rendered}");
    Ok(())
}
