use std::time::Duration;

use serde_json::json;
use swarm_application::{DriveOutcome, SessionService};
use swarm_core::session::{
    FailureKind, QueryRequest, SessionFailure, SessionStatus, StreamUpdate,
};
use swarm_core::task::{TaskMutation, TaskSpec, TaskStatus};
use swarm_core::{Layout, Reference};
use swarm_interaction::ScriptedProvider;

const TRANSCRIPT: &str = "[SWARM_LOG] Scout: mapping the area\n\
[LAYOUT: SPATIAL_SPLIT]\n\
# Coffee in Lisbon\n\
Three places stand out.\n\
[DATA_BOUNDARY]\n\
{\"places\": [\"Fábrica\", \"Copenhagen\"]}";

#[tokio::test]
async fn test_full_session_completes() {
    let provider = ScriptedProvider::from_transcript(TRANSCRIPT, 7)
        .with_mutations_at(
            0,
            vec![TaskMutation::bulk(vec![
                TaskSpec::new("scan", "Scan neighbourhoods", TaskStatus::InProgress),
                TaskSpec::new("rank", "Rank cafes", TaskStatus::Pending),
            ])],
        )
        .with_mutations_at(
            3,
            vec![
                TaskMutation::update("scan", None, Some(TaskStatus::Completed)),
                TaskMutation::delete("rank"),
                TaskMutation::delete("missing"),
            ],
        )
        .with_references_from(2, vec![Reference::web("https://a.example", "A")]);
    let service = SessionService::new(provider);

    let handle = service.submit(QueryRequest::new("coffee in lisbon")).await.unwrap();
    let session_id = handle.session_id().to_string();
    assert_eq!(handle.wait().await.unwrap(), DriveOutcome::Completed);

    let snapshot = service.snapshot(&session_id).await.unwrap();
    let session = snapshot.session;
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.report, "# Coffee in Lisbon\nThree places stand out.\n");
    assert_eq!(session.log_lines, vec!["Scout: mapping the area"]);
    assert_eq!(session.layout, Layout::SpatialSplit);
    assert_eq!(
        session.structured_payload,
        Some(json!({"places": ["Fábrica", "Copenhagen"]}))
    );
    assert_eq!(session.references.len(), 1);
    assert!(session.failure.is_none());

    assert_eq!(snapshot.tasks.len(), 1);
    assert_eq!(snapshot.tasks[0].id, "scan");
    assert_eq!(snapshot.tasks[0].status, TaskStatus::Completed);
    assert!(!service.is_active(&session_id).await);
}

#[tokio::test]
async fn test_failure_keeps_partial_state_and_retry_starts_fresh() {
    let provider = ScriptedProvider::from_transcript(TRANSCRIPT, 10).failing_after(
        8,
        SessionFailure::classify(Some(429), "RESOURCE_EXHAUSTED: quota"),
    );
    let service = SessionService::new(provider.clone());

    let handle = service.submit(QueryRequest::new("coffee")).await.unwrap();
    let first_id = handle.session_id().to_string();
    assert_eq!(handle.wait().await.unwrap(), DriveOutcome::Failed);

    let failed = service.snapshot(&first_id).await.unwrap().session;
    assert_eq!(failed.status, SessionStatus::Failed);
    assert_eq!(failed.failure.as_ref().unwrap().kind, FailureKind::RateLimited);
    assert_eq!(failed.log_lines, vec!["Scout: mapping the area"]);
    assert!(!failed.report.is_empty());

    let retry = service.retry(&first_id).await.unwrap();
    let second_id = retry.session_id().to_string();
    assert_ne!(first_id, second_id);
    assert_eq!(retry.wait().await.unwrap(), DriveOutcome::Failed);
    assert_eq!(provider.open_count(), 2);

    let sessions = service.list().await;
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].id, first_id);
    assert_eq!(sessions[1].query, "coffee");

    // The original session is untouched by the retry.
    assert_eq!(service.snapshot(&first_id).await.unwrap().session, failed);
}

#[tokio::test]
async fn test_open_failure_fails_session() {
    let provider = ScriptedProvider::default()
        .failing_on_open(SessionFailure::classify(Some(401), "API key not valid"));
    let service = SessionService::new(provider);

    let handle = service.submit(QueryRequest::new("q")).await.unwrap();
    let id = handle.session_id().to_string();
    assert_eq!(handle.wait().await.unwrap(), DriveOutcome::Failed);

    let session = service.snapshot(&id).await.unwrap().session;
    assert_eq!(session.status, SessionStatus::Failed);
    assert_eq!(session.failure.unwrap().kind, FailureKind::Unauthorized);
    assert!(session.report.is_empty());
}

#[tokio::test]
async fn test_stream_without_final_update_completes() {
    let provider = ScriptedProvider::new(vec![
        Ok(StreamUpdate::text("first line\n")),
        Ok(StreamUpdate::text("first line\nsecond")),
    ]);
    let service = SessionService::new(provider);

    let handle = service.submit(QueryRequest::new("q")).await.unwrap();
    let id = handle.session_id().to_string();
    assert_eq!(handle.wait().await.unwrap(), DriveOutcome::Completed);

    let session = service.snapshot(&id).await.unwrap().session;
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.report, "first line\nsecond");
}

#[tokio::test]
async fn test_cancel_stops_consumption_without_rollback() {
    let provider =
        ScriptedProvider::from_transcript(TRANSCRIPT, 2).with_delay(Duration::from_millis(20));
    let service = SessionService::new(provider);
    let mut updates = service.subscribe().await;

    let handle = service.submit(QueryRequest::new("q")).await.unwrap();
    let id = handle.session_id().to_string();

    while let Some(snapshot) = updates.recv().await {
        if snapshot.session.status == SessionStatus::Streaming {
            break;
        }
    }
    assert!(service.cancel(&id).await);
    assert_eq!(handle.wait().await.unwrap(), DriveOutcome::Cancelled);

    let cancelled = service.snapshot(&id).await.unwrap().session;
    assert_eq!(cancelled.status, SessionStatus::Streaming);

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(service.snapshot(&id).await.unwrap().session, cancelled);
    assert!(!service.is_active(&id).await);
    assert!(!service.cancel(&id).await);
}

#[tokio::test]
async fn test_retry_rejected_while_streaming() {
    let provider =
        ScriptedProvider::from_transcript(TRANSCRIPT, 1).with_delay(Duration::from_millis(20));
    let service = SessionService::new(provider);

    let handle = service.submit(QueryRequest::new("q")).await.unwrap();
    let err = service.retry(handle.session_id()).await.unwrap_err();
    assert!(err.is_session_active());

    handle.cancel();
    assert_eq!(handle.wait().await.unwrap(), DriveOutcome::Cancelled);

    let err = service.retry("unknown").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_concurrent_sessions_are_isolated() {
    let provider = ScriptedProvider::from_transcript("alpha\nbeta\n", 3)
        .with_mutations_at(
            0,
            vec![TaskMutation::create("t1", "Shared id", TaskStatus::Pending)],
        )
        .with_delay(Duration::from_millis(5));
    let service = SessionService::new(provider);

    let a = service.submit(QueryRequest::new("a")).await.unwrap();
    let b = service.submit(QueryRequest::new("b")).await.unwrap();
    let (a_id, b_id) = (a.session_id().to_string(), b.session_id().to_string());

    let (a_outcome, b_outcome) = tokio::join!(a.wait(), b.wait());
    assert_eq!(a_outcome.unwrap(), DriveOutcome::Completed);
    assert_eq!(b_outcome.unwrap(), DriveOutcome::Completed);

    for id in [&a_id, &b_id] {
        let snapshot = service.snapshot(id).await.unwrap();
        assert_eq!(snapshot.session.report, "alpha\nbeta\n");
        assert_eq!(snapshot.tasks.len(), 1);
        assert_eq!(&snapshot.tasks[0].session_id, id);
    }
}

#[tokio::test]
async fn test_subscribers_see_monotonic_reports() {
    let provider = ScriptedProvider::from_transcript(TRANSCRIPT, 3);
    let service = SessionService::new(provider);
    let mut updates = service.subscribe().await;

    let handle = service.submit(QueryRequest::new("q")).await.unwrap();
    handle.wait().await.unwrap();

    let mut previous = String::new();
    let mut statuses = Vec::new();
    while let Ok(snapshot) = updates.try_recv() {
        assert!(snapshot.session.report.starts_with(&previous));
        previous = snapshot.session.report.clone();
        statuses.push(snapshot.session.status);
    }

    assert_eq!(statuses.first(), Some(&SessionStatus::Initializing));
    assert_eq!(statuses.last(), Some(&SessionStatus::Completed));
}

#[tokio::test]
async fn test_shutdown_cancels_all_drivers() {
    let provider =
        ScriptedProvider::from_transcript(TRANSCRIPT, 1).with_delay(Duration::from_millis(20));
    let service = SessionService::new(provider);

    let a = service.submit(QueryRequest::new("a")).await.unwrap();
    let b = service.submit(QueryRequest::new("b")).await.unwrap();
    service.shutdown();

    let a_id = a.session_id().to_string();
    assert_eq!(a.wait().await.unwrap(), DriveOutcome::Cancelled);
    assert_eq!(b.wait().await.unwrap(), DriveOutcome::Cancelled);

    let err = service.submit(QueryRequest::new("late")).await.unwrap_err();
    assert!(err.is_shut_down());
    let err = service.retry(&a_id).await.unwrap_err();
    assert!(err.is_shut_down());
    assert_eq!(service.list().await.len(), 2);
}
