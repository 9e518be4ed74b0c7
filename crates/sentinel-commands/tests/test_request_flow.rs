use std::path::Path;
use std::sync::Arc;

use jiff::SignedDuration;
use sentinel_audit::{AuditLog, MIN_KEY_LEN, Signer};
use sentinel_commands::{
    CommandContext, CommandError, CreateRequestParams, RequestFilter, StaticIdentity,
    TracingNotifier, approve_request, cancel_request, create_request, deny_request, list_requests,
};
use sentinel_core::models::policy::{ApprovalPolicy, ApprovalRule, AutoApproveCondition};
use sentinel_core::RequestStatus;
use sentinel_store::{BreakGlassStore, MemoryBreakGlassStore, MemoryRequestStore, RequestStore};

fn prod_policy(auto: Option<AutoApproveCondition>) -> ApprovalPolicy {
    ApprovalPolicy {
        rules: vec![ApprovalRule {
            name: "prod".into(),
            profiles: vec!["prod".into()],
            approvers: vec!["bob".into()],
            auto_approve: auto,
        }],
    }
}

fn context(
    requests: Arc<dyn RequestStore>,
    break_glass: Arc<dyn BreakGlassStore>,
    policy: ApprovalPolicy,
    user: &str,
    audit_path: Option<&Path>,
) -> CommandContext {
    let audit = audit_path.map(|path| {
        AuditLog::open(path, Signer::new("primary", vec![7u8; MIN_KEY_LEN]).unwrap())
    });
    CommandContext {
        requests,
        break_glass,
        identity: Arc::new(StaticIdentity::user(user)),
        notifier: Arc::new(TracingNotifier),
        policy,
        audit,
    }
}

fn audit_events(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["entry"]["event"].as_str().unwrap().to_string()
        })
        .collect()
}

fn create_params(duration_hours: i64) -> CreateRequestParams {
    CreateRequestParams {
        profile: "prod".into(),
        justification: "incident INC-1 needs prod access".into(),
        duration: SignedDuration::from_hours(duration_hours),
    }
}

#[tokio::test]
async fn approve_happy_path_emits_both_events() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("audit.log");
    let requests: Arc<dyn RequestStore> = Arc::new(MemoryRequestStore::new());
    let break_glass: Arc<dyn BreakGlassStore> = Arc::new(MemoryBreakGlassStore::new());

    let alice = context(
        requests.clone(),
        break_glass.clone(),
        prod_policy(None),
        "alice",
        Some(&log_path),
    );
    let request = create_request(&alice, create_params(2)).await.unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.requester, "alice");

    let bob = context(
        requests.clone(),
        break_glass,
        prod_policy(None),
        "bob",
        Some(&log_path),
    );
    let approved = approve_request(&bob, &request.id, Some("ok".into())).await.unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
    assert_eq!(approved.approver.as_deref(), Some("bob"));
    assert_eq!(approved.approver_comment.as_deref(), Some("ok"));

    assert_eq!(audit_events(&log_path), vec!["request.created", "request.approved"]);
}

#[tokio::test]
async fn unauthorized_approver_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("audit.log");
    let requests: Arc<dyn RequestStore> = Arc::new(MemoryRequestStore::new());
    let break_glass: Arc<dyn BreakGlassStore> = Arc::new(MemoryBreakGlassStore::new());

    let alice = context(
        requests.clone(),
        break_glass.clone(),
        prod_policy(None),
        "alice",
        Some(&log_path),
    );
    let request = create_request(&alice, create_params(2)).await.unwrap();

    let charlie = context(
        requests.clone(),
        break_glass,
        prod_policy(None),
        "charlie",
        Some(&log_path),
    );
    let err = approve_request(&charlie, &request.id, None).await.unwrap_err();
    assert!(matches!(err, CommandError::Unauthorized(_)));

    let stored = requests.get(&request.id).await.unwrap();
    assert_eq!(stored.status, RequestStatus::Pending);
    // no approval entry was emitted
    assert_eq!(audit_events(&log_path), vec!["request.created"]);
}

#[tokio::test]
async fn no_matching_rule_lets_anyone_approve() {
    let requests: Arc<dyn RequestStore> = Arc::new(MemoryRequestStore::new());
    let break_glass: Arc<dyn BreakGlassStore> = Arc::new(MemoryBreakGlassStore::new());

    // Policy only covers "prod"; this request is for "staging".
    let alice = context(
        requests.clone(),
        break_glass.clone(),
        prod_policy(None),
        "alice",
        None,
    );
    let request = create_request(
        &alice,
        CreateRequestParams {
            profile: "staging".into(),
            justification: "reproduce customer bug in staging".into(),
            duration: SignedDuration::from_hours(1),
        },
    )
    .await
    .unwrap();

    let charlie = context(requests, break_glass, prod_policy(None), "charlie", None);
    let approved = approve_request(&charlie, &request.id, None).await.unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
    assert_eq!(approved.approver.as_deref(), Some("charlie"));
}

#[tokio::test]
async fn auto_approve_within_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("audit.log");
    let requests: Arc<dyn RequestStore> = Arc::new(MemoryRequestStore::new());
    let break_glass: Arc<dyn BreakGlassStore> = Arc::new(MemoryBreakGlassStore::new());

    let policy = prod_policy(Some(AutoApproveCondition {
        users: vec!["alice".into()],
        max_duration: SignedDuration::from_hours(2),
    }));

    let alice = context(
        requests.clone(),
        break_glass,
        policy,
        "alice",
        Some(&log_path),
    );
    let approved = create_request(&alice, create_params(1)).await.unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
    assert_eq!(approved.approver.as_deref(), Some("alice"));
    assert_eq!(
        approved.approver_comment.as_deref(),
        Some("auto-approved by policy")
    );
    assert_eq!(audit_events(&log_path), vec!["request.created", "request.approved"]);

    let stored = requests.get(&approved.id).await.unwrap();
    assert_eq!(stored.status, RequestStatus::Approved);
}

#[tokio::test]
async fn auto_approve_above_max_duration_stays_pending() {
    let requests: Arc<dyn RequestStore> = Arc::new(MemoryRequestStore::new());
    let break_glass: Arc<dyn BreakGlassStore> = Arc::new(MemoryBreakGlassStore::new());

    let policy = prod_policy(Some(AutoApproveCondition {
        users: vec!["alice".into()],
        max_duration: SignedDuration::from_hours(2),
    }));

    let alice = context(requests, break_glass, policy, "alice", None);
    let request = create_request(&alice, create_params(3)).await.unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert!(request.approver.is_none());
}

#[tokio::test]
async fn only_the_requester_may_cancel() {
    let requests: Arc<dyn RequestStore> = Arc::new(MemoryRequestStore::new());
    let break_glass: Arc<dyn BreakGlassStore> = Arc::new(MemoryBreakGlassStore::new());

    let alice = context(
        requests.clone(),
        break_glass.clone(),
        prod_policy(None),
        "alice",
        None,
    );
    let request = create_request(&alice, create_params(2)).await.unwrap();

    let bob = context(
        requests.clone(),
        break_glass.clone(),
        prod_policy(None),
        "bob",
        None,
    );
    let err = cancel_request(&bob, &request.id).await.unwrap_err();
    assert!(matches!(err, CommandError::Unauthorized(_)));

    let cancelled = cancel_request(&alice, &request.id).await.unwrap();
    assert_eq!(cancelled.status, RequestStatus::Cancelled);

    // terminal: a later decision is an illegal transition
    let err = deny_request(&bob, &request.id, None).await.unwrap_err();
    assert!(matches!(
        err,
        CommandError::Core(sentinel_core::CoreError::IllegalTransition { .. })
    ));
}

#[tokio::test]
async fn listing_projects_expired_rows_for_display() {
    let requests: Arc<dyn RequestStore> = Arc::new(MemoryRequestStore::new());
    let break_glass: Arc<dyn BreakGlassStore> = Arc::new(MemoryBreakGlassStore::new());

    // A row created long ago: past its 24h TTL but still stored as pending
    // because expiry is a purge, not a transition.
    let stale = sentinel_core::Request::new(
        "alice",
        "prod",
        "stale request from last month",
        SignedDuration::from_hours(2),
        jiff::Timestamp::UNIX_EPOCH,
    )
    .unwrap();
    requests.create(&stale).await.unwrap();

    let alice = context(
        requests.clone(),
        break_glass.clone(),
        prod_policy(None),
        "alice",
        None,
    );
    let fresh = create_request(&alice, create_params(1)).await.unwrap();

    let rows = list_requests(&alice, RequestFilter::Mine, 10).await.unwrap();
    assert_eq!(rows.len(), 2);
    let by_id = |id: &str| rows.iter().find(|r| r.id == id).unwrap();
    assert_eq!(by_id(&stale.id).status, RequestStatus::Expired);
    assert_eq!(by_id(&fresh.id).status, RequestStatus::Pending);

    // the projection is display-only — the stored row is untouched
    assert_eq!(
        requests.get(&stale.id).await.unwrap().status,
        RequestStatus::Pending
    );
}

#[tokio::test]
async fn malformed_id_is_invalid_input() {
    let requests: Arc<dyn RequestStore> = Arc::new(MemoryRequestStore::new());
    let break_glass: Arc<dyn BreakGlassStore> = Arc::new(MemoryBreakGlassStore::new());
    let bob = context(requests, break_glass, prod_policy(None), "bob", None);

    let err = approve_request(&bob, "not-an-id", None).await.unwrap_err();
    assert!(matches!(err, CommandError::InvalidInput(_)));
}
