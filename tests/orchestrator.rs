mod common;

use common::{detail_url, listed, roster_url, test_config, Login, Portal};
use conduct_roster::models::{CollectionResult, FacilityCode, UNAVAILABLE};
use conduct_roster::progress::{self, Progress, ProgressStream};
use conduct_roster::{CollectionOrchestrator, RunReport, RunState};
use tokio_util::sync::CancellationToken;

fn codes(list: &[&str]) -> Vec<FacilityCode> {
    list.iter().map(|c| FacilityCode::new(*c)).collect()
}

/// Two individuals in X1, nobody in X2, one in X3.
fn three_facilities() -> Portal {
    Portal::new()
        .roster("X1", vec![listed("1", "A01", "Ana"), listed("2", "A02", "Bia")])
        .roster("X2", Vec::new())
        .roster("X3", vec![listed("3", "C03", "Caio")])
        .conduct("1", "GOOD")
        .conduct("2", "EXCELLENT")
        .conduct("3", "BAD")
}

async fn run(portal: Portal, cancel: CancellationToken, facilities: &[&str]) -> (RunReport, ProgressStream) {
    let (sink, stream) = progress::channel();
    let orchestrator = CollectionOrchestrator::new(&test_config(), portal, sink, cancel);
    let report = orchestrator.run(&codes(facilities)).await;
    (report, stream)
}

struct Seen {
    statuses: Vec<String>,
    completed: Vec<CollectionResult>,
    auth_failures: Vec<String>,
}

fn seen(stream: &mut ProgressStream) -> Seen {
    let drained = stream.drain();
    assert!(drained.closed, "worker side should have hung up");
    let mut seen = Seen {
        statuses: Vec::new(),
        completed: Vec::new(),
        auth_failures: Vec::new(),
    };
    for message in drained.messages {
        match message {
            Progress::Status(line) => seen.statuses.push(line),
            Progress::Completed(result) => seen.completed.push(result),
            Progress::AuthenticationFailed(detail) => seen.auth_failures.push(detail),
        }
    }
    seen
}

#[tokio::test]
async fn every_selected_facility_is_a_key_even_when_empty() {
    let portal = three_facilities();
    let cancel = CancellationToken::new();
    let (report, mut stream) = run(portal.clone(), cancel.clone(), &["X1", "X2"]).await;

    assert_eq!(report.state, RunState::Done);
    let keys: Vec<&str> = report.result.facility_codes().map(FacilityCode::as_str).collect();
    assert_eq!(keys, vec!["X1", "X2"]);
    assert_eq!(report.result.get("X1").map(<[_]>::len), Some(2));
    assert_eq!(report.result.get("X2").map(<[_]>::len), Some(0));
    assert_eq!(report.result.get("X1").unwrap()[1].conduct, "EXCELLENT");

    let seen = seen(&mut stream);
    assert_eq!(seen.completed, vec![report.result.clone()]);
    assert!(seen.auth_failures.is_empty());
    assert!(seen
        .statuses
        .contains(&"Collection finished! 2 records from 2 facilities.".to_string()));
    assert_eq!(portal.closed(), 1);
    assert!(cancel.is_cancelled(), "run end must be observable through the token");
}

#[tokio::test]
async fn all_rosters_are_listed_before_any_detail() {
    let portal = three_facilities();
    run(portal.clone(), CancellationToken::new(), &["X1", "X2", "X3"]).await;

    assert_eq!(
        portal.visits(),
        vec![
            roster_url("X1"),
            roster_url("X2"),
            roster_url("X3"),
            detail_url("1"),
            detail_url("2"),
            detail_url("3"),
        ]
    );
}

#[tokio::test]
async fn remaining_count_reaches_zero_per_facility() {
    let (_, mut stream) = run(three_facilities(), CancellationToken::new(), &["X1"]).await;
    let statuses = seen(&mut stream).statuses;

    let x1_start = statuses
        .iter()
        .position(|l| l == "Collecting conduct for facility X1...")
        .expect("phase 2 start reported");
    assert_eq!(statuses[x1_start + 1], "1 - Ana, conduct GOOD, 1 remaining");
    assert_eq!(statuses[x1_start + 2], "2 - Bia, conduct EXCELLENT, 0 remaining");
    assert_eq!(
        statuses[x1_start + 3],
        "Conduct collected for every individual of facility X1."
    );
}

#[tokio::test]
async fn missing_conduct_keeps_the_individual() {
    let portal = Portal::new().roster("X1", vec![listed("9", "Z09", "Davi")]);
    let (report, _) = run(portal, CancellationToken::new(), &["X1"]).await;

    let records = report.result.get("X1").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].conduct, UNAVAILABLE);
    assert_eq!(report.result.unavailable_count(), 1);
}

#[tokio::test]
async fn cancelled_before_start_never_opens_a_session() {
    let portal = three_facilities();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let (report, mut stream) = run(portal.clone(), cancel, &["X1", "X2"]).await;

    assert_eq!(report.state, RunState::Aborted);
    assert!(report.result.is_empty());
    assert_eq!(portal.opened(), 0);
    assert_eq!(portal.closed(), 0);
    assert_eq!(seen(&mut stream).completed, vec![CollectionResult::new()]);
}

#[tokio::test]
async fn cancellation_mid_run_keeps_partial_results() {
    let cancel = CancellationToken::new();
    let portal = Portal::new()
        .roster("X1", vec![listed("1", "A01", "Ana"), listed("2", "A02", "Bia")])
        .roster("X2", vec![listed("3", "B01", "Caio"), listed("4", "B02", "Duda")])
        .roster("X3", vec![listed("5", "C01", "Enzo")])
        .conduct("1", "GOOD")
        .conduct("2", "GOOD")
        .conduct("3", "BAD")
        .conduct("4", "BAD")
        .conduct("5", "GOOD")
        .cancel_on_visit(detail_url("3"), cancel.clone());

    let (report, mut stream) = run(portal.clone(), cancel, &["X1", "X2", "X3"]).await;

    assert_eq!(report.state, RunState::Aborted);
    assert_eq!(report.result.get("X1").map(<[_]>::len), Some(2));
    // the lookup in flight when the token was set still lands
    assert_eq!(report.result.get("X2").map(<[_]>::len), Some(1));
    assert!(!report.result.contains("X3"));
    assert!(!portal.visits().contains(&detail_url("4")));
    assert_eq!(portal.closed(), 1);

    let seen = seen(&mut stream);
    assert_eq!(seen.completed.len(), 1);
    assert!(seen
        .statuses
        .iter()
        .any(|l| l.starts_with("Collection cancelled, partial results kept.")));
}

#[tokio::test]
async fn cancellation_during_listing_keeps_listed_facilities() {
    let cancel = CancellationToken::new();
    let portal = three_facilities().cancel_on_visit(roster_url("X2"), cancel.clone());

    let (report, _) = run(portal.clone(), cancel, &["X1", "X2", "X3"]).await;

    assert_eq!(report.state, RunState::Aborted);
    let keys: Vec<&str> = report.result.facility_codes().map(FacilityCode::as_str).collect();
    assert_eq!(keys, vec!["X1", "X2"]);
    assert_eq!(report.result.record_count(), 0);
    assert!(!portal.visits().contains(&roster_url("X3")));
    assert!(!portal.visits().contains(&detail_url("1")));
    assert_eq!(portal.closed(), 1);
}

#[tokio::test]
async fn abandoned_login_fails_without_result() {
    let portal = three_facilities().login(Login::Abandon);
    let cancel = CancellationToken::new();

    let (report, mut stream) = run(portal.clone(), cancel.clone(), &["X1"]).await;

    assert_eq!(report.state, RunState::Failed);
    assert!(report.result.is_empty());
    let seen = seen(&mut stream);
    assert!(seen.completed.is_empty());
    assert_eq!(seen.auth_failures, vec!["Login abandoned, collection cancelled.".to_string()]);
    assert!(portal.visits().is_empty());
    assert!(cancel.is_cancelled());
}

#[tokio::test]
async fn rejected_login_reports_the_cause() {
    let portal = three_facilities().login(Login::Reject);
    let (report, mut stream) = run(portal, CancellationToken::new(), &["X1"]).await;

    assert_eq!(report.state, RunState::Failed);
    let failures = seen(&mut stream).auth_failures;
    assert_eq!(failures.len(), 1);
    assert!(failures[0].starts_with("Login failed: login was rejected"));
}

#[tokio::test]
async fn roster_navigation_failure_ends_the_run_cleanly() {
    let portal = three_facilities().unreachable_roster("X2");
    let (report, mut stream) = run(portal.clone(), CancellationToken::new(), &["X1", "X2", "X3"]).await;

    assert_eq!(report.state, RunState::Done);
    assert!(report.result.is_empty());
    assert_eq!(portal.closed(), 1);

    let seen = seen(&mut stream);
    assert_eq!(seen.completed.len(), 1);
    let fatal: Vec<&String> = seen
        .statuses
        .iter()
        .filter(|l| l.starts_with("Collection error: facility X2"))
        .collect();
    assert_eq!(fatal.len(), 1);
}

#[tokio::test]
async fn panic_in_a_lookup_still_closes_the_session() {
    let portal = three_facilities().panic_on_detail("2");
    let (report, mut stream) = run(portal.clone(), CancellationToken::new(), &["X1", "X3"]).await;

    assert_eq!(report.state, RunState::Done);
    assert_eq!(portal.closed(), 1);
    assert_eq!(report.result.get("X1").map(<[_]>::len), Some(1));
    assert!(!report.result.contains("X3"));
    assert!(seen(&mut stream)
        .statuses
        .iter()
        .any(|l| l.contains("renderer crashed")));
}

#[tokio::test]
async fn close_failure_is_reported_and_result_kept() {
    let portal = three_facilities().failing_close();
    let (report, mut stream) = run(portal.clone(), CancellationToken::new(), &["X1"]).await;

    assert_eq!(report.state, RunState::Done);
    assert_eq!(report.result.get("X1").map(<[_]>::len), Some(2));
    assert_eq!(portal.closed(), 1);

    let seen = seen(&mut stream);
    assert_eq!(seen.completed, vec![report.result.clone()]);
    assert!(seen
        .statuses
        .contains(&"Error closing the browser: browser shutdown failed: browser process already gone".to_string()));
    assert!(seen
        .statuses
        .contains(&"Collection finished! 2 records from 1 facilities.".to_string()));
}

#[tokio::test]
async fn cancellation_while_listing_the_last_facility_keeps_it() {
    let cancel = CancellationToken::new();
    let portal = three_facilities().cancel_on_visit(roster_url("X3"), cancel.clone());

    let (report, _) = run(portal, cancel, &["X1", "X3"]).await;

    assert_eq!(report.state, RunState::Aborted);
    let keys: Vec<&str> = report.result.facility_codes().map(FacilityCode::as_str).collect();
    assert_eq!(keys, vec!["X1", "X3"]);
}
