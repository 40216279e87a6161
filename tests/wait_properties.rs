//! Completion waiter tests
//!
//! Drives the waiters against the mock cloud with virtual time:
//! - single simulation: fetch counts, progress, terminal detection
//! - simulation lists: terminal members are never fetched
//! - executions: reconciliation of simulations spawned mid-flight
//! - opt-in hardening: deadline, cancellation, retry

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use prepost::cloud::{CloudClient, CloudError, CloudTransport, MockTransport};
use prepost::mock::FailureConfig;
use prepost::signal::SignalState;
use prepost::wait::{
    reconcile, ManualClock, PollConfig, ProgressEvent, RecordingReporter, WaitError,
    WaitSummary, Waiter,
};
use prepost_cloud::{Simulation, SimulationStatus, TERMINAL_STATUSES};

struct Harness {
    transport: Arc<MockTransport>,
    clock: Arc<ManualClock>,
    reporter: Arc<RecordingReporter>,
}

impl Harness {
    fn new() -> Self {
        Self {
            transport: Arc::new(MockTransport::new()),
            clock: Arc::new(ManualClock::new()),
            reporter: Arc::new(RecordingReporter::new()),
        }
    }

    fn waiter(&self) -> Waiter {
        self.waiter_with(PollConfig::default())
    }

    fn waiter_with(&self, config: PollConfig) -> Waiter {
        let transport: Arc<dyn CloudTransport> = self.transport.clone();
        Waiter::new(CloudClient::new(transport), config)
            .with_clock(self.clock.clone())
            .with_reporter(self.reporter.clone())
    }

    fn member(&self, id: &str, execution: &str, statuses: &[&str]) {
        self.transport
            .cloud()
            .add_simulation_with_progression(Simulation::new(id, statuses[0]).with_execution(execution), statuses);
    }
}

fn id_set(ids: &[&str]) -> HashSet<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// Terminal statuses
// =============================================================================

#[test]
fn test_failed_is_finished_and_queued_is_not() {
    assert!(SimulationStatus::from("Failed").is_terminal());
    assert!(!SimulationStatus::from("Queued").is_terminal());
    for status in TERMINAL_STATUSES {
        assert!(Simulation::new("s", status).is_terminal(), "{} should be terminal", status);
    }
    assert!(!Simulation::new("s", "SomethingNew").is_terminal());
}

// =============================================================================
// Single simulation
// =============================================================================

#[test]
fn test_initially_terminal_polls_once() {
    let h = Harness::new();
    h.transport.cloud().add_simulation(Simulation::new("s1", "Cancelled"));

    let sim = h.waiter().wait_simulation("s1").unwrap();

    assert_eq!(sim.status, SimulationStatus::Cancelled);
    assert_eq!(h.transport.cloud().fetch_count("s1"), 1);
    assert_eq!(h.clock.sleep_count(), 0);
}

#[test]
fn test_running_running_success_takes_three_fetches() {
    let h = Harness::new();
    h.transport.cloud().add_simulation_with_progression(
        Simulation::new("s1", "Running"),
        &["Running", "Running", "CompletedSuccess"],
    );

    let sim = h.waiter().wait_simulation("s1").unwrap();

    assert_eq!(sim.status, SimulationStatus::CompletedSuccess);
    assert_eq!(h.transport.cloud().fetch_count("s1"), 3);
    assert_eq!(h.clock.sleeps(), vec![Duration::from_secs(5), Duration::from_secs(5)]);
    assert_eq!(h.reporter.transcript(), "\nRunning.\nCompletedSuccess\nDone: CompletedSuccess\n");
}

#[test]
fn test_custom_interval_is_used() {
    let h = Harness::new();
    h.transport.cloud().add_simulation_with_progression(
        Simulation::new("s1", "Queued"),
        &["Queued", "CompletedError"],
    );

    let config = PollConfig::default().with_interval(Duration::from_secs(30));
    h.waiter_with(config).wait_simulation("s1").unwrap();

    assert_eq!(h.clock.sleeps(), vec![Duration::from_secs(30)]);
}

#[test]
fn test_unknown_simulation_error_names_id() {
    let h = Harness::new();
    let err = h.waiter().wait_simulation("missing-id").unwrap_err();
    assert_eq!(err.to_string(), "Could not find simulation with Id: missing-id");
}

// =============================================================================
// Simulation lists
// =============================================================================

#[test]
fn test_all_terminal_list_makes_no_fetches() {
    let h = Harness::new();
    let list = vec![
        Simulation::new("a", "CompletedSuccess"),
        Simulation::new("b", "Failed"),
        Simulation::new("c", "CompletedError"),
    ];

    let finished = h.waiter().wait_simulations(&list).unwrap();

    assert_eq!(finished, list);
    assert!(h.transport.cloud().commands().is_empty());
}

#[test]
fn test_list_continues_after_failed_member() {
    let h = Harness::new();
    h.transport.cloud().add_simulation_with_progression(
        Simulation::new("a", "Running"),
        &["Running", "Failed"],
    );
    h.transport.cloud().add_simulation_with_progression(
        Simulation::new("b", "Queued"),
        &["Running", "CompletedSuccess"],
    );

    let finished = h
        .waiter()
        .wait_simulations(&[Simulation::new("a", "Running"), Simulation::new("b", "Queued")])
        .unwrap();

    let statuses: Vec<&str> = finished.iter().map(|s| s.status.as_str()).collect();
    assert_eq!(statuses, vec!["Failed", "CompletedSuccess"]);

    let waiting: Vec<ProgressEvent> = h
        .reporter
        .events()
        .into_iter()
        .filter(|e| matches!(e, ProgressEvent::Waiting { .. }))
        .collect();
    assert_eq!(waiting.len(), 2);
}

#[test]
fn test_list_aborts_on_fetch_error() {
    let h = Harness::new();
    h.transport.cloud().add_simulation(Simulation::new("b", "Running"));

    let err = h
        .waiter()
        .wait_simulations(&[Simulation::new("ghost", "Running"), Simulation::new("b", "Running")])
        .unwrap_err();

    assert!(matches!(err, WaitError::Cloud(CloudError::SimulationNotFound { .. })));
    assert_eq!(h.transport.cloud().fetch_count("b"), 0);
}

// =============================================================================
// Executions
// =============================================================================

#[test]
fn test_reconcile_finds_new_members() {
    let refreshed = vec![
        Simulation::new("A", "CompletedSuccess"),
        Simulation::new("B", "CompletedSuccess"),
        Simulation::new("C", "Queued"),
        Simulation::new("D", "Running"),
    ];

    let unchecked = reconcile(&id_set(&["A", "B"]), &refreshed);
    let ids: Vec<&str> = unchecked.iter().map(|s| s.id()).collect();
    assert_eq!(ids, vec!["C", "D"]);
}

#[test]
fn test_execution_waits_only_for_new_subset() {
    let h = Harness::new();
    h.member("A", "exec", &["Running", "CompletedSuccess"]);
    h.member("B", "exec", &["Queued", "Running", "CompletedSuccess"]);
    h.transport.cloud().add_late_simulation(
        Simulation::new("C", "Queued").with_execution("exec"),
        &["Queued", "CompletedSuccess"],
        2,
    );
    h.transport.cloud().add_late_simulation(
        Simulation::new("D", "Running").with_execution("exec"),
        &["Running", "Failed"],
        2,
    );

    let finished = h.waiter().wait_execution("exec").unwrap();

    let ids: Vec<&str> = finished.iter().map(|s| s.id()).collect();
    assert_eq!(ids, vec!["A", "B", "C", "D"]);
    assert_eq!(h.transport.cloud().execution_list_count("exec"), 3);

    // Original members are not polled again after the first round
    assert_eq!(h.transport.cloud().fetch_count("A"), 2);
    assert_eq!(h.transport.cloud().fetch_count("B"), 3);
    assert_eq!(h.transport.cloud().fetch_count("C"), 2);
    assert_eq!(h.transport.cloud().fetch_count("D"), 2);

    let reconciled: Vec<ProgressEvent> = h
        .reporter
        .events()
        .into_iter()
        .filter(|e| matches!(e, ProgressEvent::Reconciled { .. }))
        .collect();
    assert_eq!(
        reconciled,
        vec![ProgressEvent::Reconciled {
            execution_id: "exec".to_string(),
            new_ids: vec!["C".to_string(), "D".to_string()],
        }]
    );

    let summary = WaitSummary::from_records(&finished);
    assert_eq!(summary.unsuccessful, vec!["D".to_string()]);
}

#[test]
fn test_single_new_member_is_waited_for() {
    let h = Harness::new();
    h.member("A", "exec", &["CompletedSuccess"]);
    h.transport.cloud().add_late_simulation(
        Simulation::new("B", "Running").with_execution("exec"),
        &["Running", "Running", "CompletedSuccess"],
        2,
    );

    let finished = h.waiter().wait_execution("exec").unwrap();

    assert_eq!(h.transport.cloud().fetch_count("B"), 3);
    assert!(finished.iter().all(|s| s.status.is_success()));
}

#[test]
fn test_execution_twice_without_new_members_is_stable() {
    let h = Harness::new();
    h.member("A", "exec", &["Running", "CompletedSuccess"]);
    h.member("B", "exec", &["Failed"]);

    let first = h.waiter().wait_execution("exec").unwrap();
    let second = h.waiter().wait_execution("exec").unwrap();

    assert_eq!(first, second);
    assert_eq!(h.transport.cloud().execution_list_count("exec"), 6);
}

#[test]
fn test_unknown_execution() {
    let h = Harness::new();
    let err = h.waiter().wait_execution("nope").unwrap_err();
    assert_eq!(err.to_string(), "Could not find execution with Id: nope");
}

// =============================================================================
// Deadline, cancellation, retry
// =============================================================================

#[test]
fn test_deadline_stops_unbounded_wait() {
    let h = Harness::new();
    h.transport.cloud().add_simulation(Simulation::new("s1", "Running"));

    let config = PollConfig::default().with_deadline(Duration::from_secs(60));
    let err = h.waiter_with(config).wait_simulation("s1").unwrap_err();

    match err {
        WaitError::DeadlineExceeded { id, elapsed, .. } => {
            assert_eq!(id, "s1");
            assert_eq!(elapsed, Duration::from_secs(60));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(h.transport.cloud().fetch_count("s1"), 13);
}

#[test]
fn test_cancel_requested_stops_at_next_poll() {
    let h = Harness::new();
    h.transport.cloud().add_simulation(Simulation::new("s1", "Queued"));
    let state = Arc::new(SignalState::new());
    state.handle_signal();

    let err = h
        .waiter()
        .with_cancellation(state)
        .wait_simulation("s1")
        .unwrap_err();

    assert!(matches!(err, WaitError::Cancelled { ref id } if id == "s1"));
    assert_eq!(h.clock.sleep_count(), 0);
}

#[test]
fn test_flaky_fetch_recovers_with_retries() {
    let h = Harness::new();
    h.transport.cloud().add_simulation_with_progression(
        Simulation::new("s1", "Running"),
        &["Running", "CompletedSuccess"],
    );
    h.transport
        .cloud()
        .inject_failure("simulation list", FailureConfig::transport("timeout").with_fail_count(1));

    let sim = h
        .waiter_with(PollConfig::default().with_fetch_retries(2))
        .wait_simulation("s1")
        .unwrap();

    assert!(sim.status.is_success());
    assert_eq!(
        h.clock.sleeps(),
        vec![Duration::from_secs(2), Duration::from_secs(5)]
    );
}

#[test]
fn test_failed_response_is_not_retried() {
    let h = Harness::new();
    h.transport.cloud().add_simulation(Simulation::new("s1", "Running"));
    h.transport
        .cloud()
        .inject_failure("simulation list", FailureConfig::response("access denied"));

    let err = h
        .waiter_with(PollConfig::default().with_fetch_retries(5))
        .wait_simulation("s1")
        .unwrap_err();

    assert!(matches!(err, WaitError::Cloud(CloudError::CommandFailed { .. })));
    assert_eq!(h.clock.sleep_count(), 0);
}
