//! Tests for the sequential package install queue
//!
//! These tests verify:
//! - Submission order is preserved and requests never overlap
//! - Failures do not stop the queue
//! - Submitting during a drain appends to the tail
//! - The drain loop yields instead of blocking

mod common;

use common::{collect_events, MockService, Script};
use projsetup::{
    DrainState, InstallEvent, ManifestPackageService, PackageIdentifier, PackageInstallQueue,
    QueueTiming,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn timing() -> QueueTiming {
    QueueTiming::default()
}

// =============================================================================
// Ordering and outcome tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_success_then_failure_scenario() {
    let service = MockService::with_scripts([
        ("pkgA", Script::success(2, "pkgA-resolved")),
        ("pkgB", Script::failure(1, "conflict")),
    ]);
    let (queue, mut events) = PackageInstallQueue::new(service.clone(), timing());

    queue.submit(["pkgA", "pkgB"]);
    queue.wait_idle().await;

    let lines: Vec<String> = collect_events(&mut events)
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(lines, vec!["Installed: pkgA-resolved", "ERROR!!!! conflict"]);

    assert_eq!(service.submitted_ids(), vec!["pkgA", "pkgB"]);
    assert_eq!(queue.state(), DrainState::Done);
    assert!(queue.is_idle());

    // Nothing else happens once the queue is empty
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(service.submitted_ids().len(), 2);
    assert!(collect_events(&mut events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_events_carry_requested_identifier() {
    let service = MockService::with_scripts([("git+https://x/Repo.git", Script::success(1, "repo@git+https://x/Repo.git"))]);
    let (queue, mut events) = PackageInstallQueue::new(service, timing());

    queue.submit(["git+https://x/Repo.git"]);
    queue.wait_idle().await;

    let events = collect_events(&mut events);
    assert_eq!(
        events,
        vec![InstallEvent::Installed {
            requested: PackageIdentifier::from("git+https://x/Repo.git"),
            resolved: "repo@git+https://x/Repo.git".to_string(),
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_failure_does_not_stop_queue() {
    let service = MockService::with_scripts([
        ("x", Script::success(1, "x-resolved")),
        ("y", Script::failure(3, "not found")),
        ("z", Script::success(2, "z-resolved")),
    ]);
    let (queue, mut events) = PackageInstallQueue::new(service.clone(), timing());

    queue.submit(["x", "y", "z"]);
    queue.wait_idle().await;

    let events = collect_events(&mut events);
    assert_eq!(events.len(), 3);
    assert!(events[0].is_success());
    assert!(!events[1].is_success());
    assert_eq!(events[1].requested().as_str(), "y");
    assert!(events[2].is_success());
    assert_eq!(service.submitted_ids(), vec!["x", "y", "z"]);
}

#[tokio::test(start_paused = true)]
async fn test_requests_never_overlap() {
    let service = MockService::with_scripts([
        ("a", Script::success(4, "a")),
        ("b", Script::failure(2, "b")),
        ("c", Script::success(7, "c")),
    ]);
    let (queue, _events) = PackageInstallQueue::new(service.clone(), timing());

    queue.submit(["a", "b", "c"]);
    queue.wait_idle().await;

    assert!(!service.overlapped());

    let log = service.log.lock().unwrap();
    assert_eq!(log.status_reads, 3);
    for k in 0..log.submissions.len() - 1 {
        let (done_id, done_at) = &log.completions[k];
        let (next_id, next_at) = &log.submissions[k + 1];
        assert_eq!(done_id, &log.submissions[k].0);
        assert!(
            next_at >= done_at,
            "{next_id} was submitted before {done_id} completed"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_separates_requests() {
    let service = MockService::with_scripts([("a", Script::success(2, "a"))]);
    let timing = QueueTiming {
        poll_interval: Duration::from_millis(10),
        cooldown: Duration::from_millis(1000),
    };
    let (queue, _events) = PackageInstallQueue::new(service.clone(), timing);

    queue.submit(["a", "b"]);
    queue.wait_idle().await;

    let log = service.log.lock().unwrap();
    let first = log.submissions[0].1;
    let second = log.submissions[1].1;
    // One poll interval while "a" completes, then the cooldown
    assert!(second - first >= Duration::from_millis(1010));
}

#[tokio::test(start_paused = true)]
async fn test_no_cooldown_after_last_item() {
    let service = MockService::default();
    let (queue, _events) = PackageInstallQueue::new(service, timing());

    let start = tokio::time::Instant::now();
    queue.submit(["only"]);
    queue.wait_idle().await;

    assert!(start.elapsed() < Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_duplicates_are_processed_independently() {
    let service = MockService::default();
    let (queue, mut events) = PackageInstallQueue::new(service.clone(), timing());

    queue.submit(["dup", "dup"]);
    queue.wait_idle().await;

    assert_eq!(service.submitted_ids(), vec!["dup", "dup"]);
    assert_eq!(collect_events(&mut events).len(), 2);
}

// =============================================================================
// Submit semantics
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_empty_submit_is_noop() {
    let service = MockService::default();
    let (queue, mut events) = PackageInstallQueue::new(service.clone(), timing());

    queue.submit(Vec::<PackageIdentifier>::new());

    assert!(queue.is_idle());
    assert_eq!(queue.state(), DrainState::Idle);
    assert_eq!(queue.pending_len(), 0);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(service.submitted_ids().is_empty());
    assert!(collect_events(&mut events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_submit_during_drain_appends_to_tail() {
    let service = MockService::with_scripts([("a", Script::success(5, "a"))]);
    let (queue, mut events) = PackageInstallQueue::new(service.clone(), timing());

    queue.submit(["a", "b"]);
    tokio::time::sleep(Duration::from_millis(15)).await;

    // "a" is still in flight
    assert_eq!(queue.state(), DrainState::Polling);
    assert_eq!(service.submitted_ids(), vec!["a"]);
    assert_eq!(queue.pending_len(), 1);

    queue.submit(["c"]);
    assert_eq!(queue.pending_len(), 2);
    queue.wait_idle().await;

    assert_eq!(service.submitted_ids(), vec!["a", "b", "c"]);
    assert!(!service.overlapped());
    let requested: Vec<String> = collect_events(&mut events)
        .iter()
        .map(|e| e.requested().to_string())
        .collect();
    assert_eq!(requested, vec!["a", "b", "c"]);
}

#[tokio::test(start_paused = true)]
async fn test_queue_restarts_after_draining() {
    let service = MockService::default();
    let (queue, mut events) = PackageInstallQueue::new(service.clone(), timing());

    queue.submit(["first"]);
    queue.wait_idle().await;
    assert_eq!(queue.state(), DrainState::Done);

    queue.submit(["second"]);
    assert!(!queue.is_idle());
    queue.wait_idle().await;

    assert_eq!(service.submitted_ids(), vec!["first", "second"]);
    assert_eq!(collect_events(&mut events).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_submit_moves_state_to_dispatching_immediately() {
    let service = MockService::default();
    let (queue, _events) = PackageInstallQueue::new(service, timing());

    queue.submit(["a"]);
    assert_eq!(queue.state(), DrainState::Dispatching);
    queue.wait_idle().await;
    assert_eq!(queue.state(), DrainState::Done);

    // Drain task has not run yet: the package is still queued
    queue.submit(["b"]);
    assert_eq!(queue.state(), DrainState::Dispatching);
    assert!(!queue.is_idle());
    assert_eq!(queue.pending_len(), 1);

    queue.wait_idle().await;
    assert_eq!(queue.state(), DrainState::Done);
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_state_is_observable() {
    let service = MockService::default();
    let (queue, _events) = PackageInstallQueue::new(service, timing());

    queue.submit(["a", "b"]);
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(queue.state(), DrainState::Cooldown);

    queue.wait_idle().await;
    assert_eq!(queue.state(), DrainState::Done);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_event_receiver_does_not_stall_queue() {
    let service = MockService::default();
    let (queue, events) = PackageInstallQueue::new(service.clone(), timing());
    drop(events);

    queue.submit(["a", "b"]);
    queue.wait_idle().await;
    assert_eq!(service.submitted_ids(), vec!["a", "b"]);
}

// =============================================================================
// Cooperative scheduling
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_other_tasks_run_while_polling() {
    let service = MockService::with_scripts([("slow", Script::success(50, "slow"))]);
    let (queue, _events) = PackageInstallQueue::new(service, timing());

    let ticks = Arc::new(AtomicUsize::new(0));
    let ticker = {
        let ticks = Arc::clone(&ticks);
        tokio::spawn(async move {
            loop {
                ticks.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
    };

    queue.submit(["slow"]);
    queue.wait_idle().await;
    ticker.abort();

    // 50 checks, 10ms apart: the ticker got scheduled throughout
    assert!(ticks.load(Ordering::SeqCst) > 50);
}

// =============================================================================
// Manifest-backed service
// =============================================================================

#[tokio::test]
async fn test_manifest_service_through_queue() {
    let dir = tempfile::tempdir().unwrap();
    let service = ManifestPackageService::for_project(dir.path());
    let timing = QueueTiming {
        poll_interval: Duration::from_millis(1),
        cooldown: Duration::ZERO,
    };
    let (queue, mut events) = PackageInstallQueue::new(service.clone(), timing);

    queue.submit([
        "git+https://github.com/adammyhre/Unity-Utils.git",
        "not a package",
        "com.unity.inputsystem@1.7.0",
    ]);
    queue.wait_idle().await;

    let lines: Vec<String> = collect_events(&mut events)
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        lines,
        vec![
            "Installed: unity-utils@git+https://github.com/adammyhre/Unity-Utils.git",
            "ERROR!!!! Unable to resolve package identifier: not a package",
            "Installed: com.unity.inputsystem@1.7.0",
        ]
    );

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(service.manifest_path()).unwrap()).unwrap();
    assert_eq!(manifest["dependencies"]["com.unity.inputsystem"], "1.7.0");
    assert_eq!(
        manifest["dependencies"]["unity-utils"],
        "git+https://github.com/adammyhre/Unity-Utils.git"
    );
}
