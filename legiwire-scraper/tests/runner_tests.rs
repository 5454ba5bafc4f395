//! Runner orchestration: session precheck, ordering, isolation, flags

mod helpers;

use std::sync::Arc;

use helpers::{TestHarness, TestScraper};
use legiwire_common::events::ScrapeEvent;
use legiwire_common::Error;
use legiwire_scraper::runner::{RunnerOptions, ScrapeRunner};

fn options(sessions: &[&str], concurrency: usize) -> RunnerOptions {
    RunnerOptions {
        sessions: sessions.iter().map(|s| s.to_string()).collect(),
        concurrency,
        ..RunnerOptions::default()
    }
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<ScrapeEvent>) -> Vec<ScrapeEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_unknown_session_aborts_before_dispatch() {
    let harness = TestHarness::new("ak", &["20252026r"]);
    let scraper = TestScraper::new("ak", "20252026r", &["HB 1", "HB 2"]);
    let order = Arc::clone(&scraper.scrape_order);
    let runner = ScrapeRunner::new(scraper, harness.context("ak"));

    let err = runner
        .run(options(&["20252026r", "2031s"], 2))
        .await
        .unwrap_err();

    match err {
        Error::InvalidSession {
            locality,
            requested,
            suggestions,
        } => {
            assert_eq!(locality, "ak");
            assert_eq!(requested, "2031s");
            assert_eq!(suggestions, vec!["20252026r"]);
        }
        other => panic!("expected InvalidSession, got {:?}", other),
    }
    // All-or-nothing: the valid session was not scraped either
    assert!(order.lock().unwrap().is_empty());
    assert!(harness.publisher.items().is_empty());
}

#[tokio::test]
async fn test_failing_bill_does_not_disturb_siblings() {
    let harness = TestHarness::new("az", &["2025r"]);
    let ids = ["HB 1", "HB 2", "HB 3", "HB 4", "HB 5", "HB 6", "HB 7", "HB 8"];
    let scraper = TestScraper::new("az", "2025r", &ids).fail_on("HB 3");
    let runner = ScrapeRunner::new(scraper, harness.context("az"));
    let mut rx = harness.event_bus.subscribe();

    let summary = runner.run(options(&["2025r"], 4)).await.unwrap();

    assert_eq!(summary.scraped, 7);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.expected_failures, 0);

    let published = harness.publisher.items();
    assert_eq!(published.len(), 7);
    assert!(published.iter().all(|(topic, _, _)| topic == "bills"));
    assert!(!published
        .iter()
        .any(|(_, _, payload)| payload["id"] == "HB 3"));

    let events = drain(&mut rx);
    let failures: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ScrapeEvent::BillFailed { bill_id, error, .. } => Some((bill_id, error)),
            _ => None,
        })
        .collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "HB 3");
    assert!(failures[0].1.contains("RuntimeError"));
}

#[tokio::test]
async fn test_sequential_run_dispatches_in_sorted_order() {
    let harness = TestHarness::new("nm", &["2025r"]);
    let scraper = TestScraper::new("nm", "2025r", &["SB 2", "HB 3", "HB 1", "SB 1", "HB 2"]);
    let order = Arc::clone(&scraper.scrape_order);
    let runner = ScrapeRunner::new(scraper, harness.context("nm"));

    let summary = runner.run(options(&["2025r"], 1)).await.unwrap();

    assert_eq!(summary.scraped, 5);
    assert_eq!(
        *order.lock().unwrap(),
        vec!["HB 1", "HB 2", "HB 3", "SB 1", "SB 2"]
    );
}

#[tokio::test]
async fn test_empty_sessions_is_a_config_error() {
    let harness = TestHarness::new("ak", &["2025r"]);
    let runner = ScrapeRunner::new(
        TestScraper::new("ak", "2025r", &["HB 1"]),
        harness.context("ak"),
    );

    let err = runner.run(options(&[], 1)).await.unwrap_err();
    assert!(err.is_configuration());
}

#[tokio::test]
async fn test_explicit_bill_ids_require_one_session() {
    let harness = TestHarness::new("ak", &["2025r", "2026r"]);
    let runner = ScrapeRunner::new(
        TestScraper::new("ak", "2025r", &["HB 1"]),
        harness.context("ak"),
    );

    let mut opts = options(&["2025r", "2026r"], 1);
    opts.bill_ids = Some([("HB 1".to_string(), None)].into_iter().collect());
    let err = runner.run(opts).await.unwrap_err();
    assert!(err.is_configuration());
    assert!(harness.publisher.items().is_empty());
}

#[tokio::test]
async fn test_explicit_bill_ids_bypass_enumeration() {
    let harness = TestHarness::new("ak", &["2025r"]);
    // The scraper has no listing for this session; explicit ids never ask
    let scraper = TestScraper::new("ak", "other", &["HB 9"]);
    let runner = ScrapeRunner::new(scraper, harness.context("ak"));

    let mut opts = options(&["2025r"], 1);
    opts.bill_ids = Some(
        [
            ("hb1".to_string(), None),
            ("SB 2".to_string(), Some(serde_json::json!({"year": 2025}))),
        ]
        .into_iter()
        .collect(),
    );
    let summary = runner.run(opts).await.unwrap();

    assert_eq!(summary.scraped, 2);
    let published = harness.publisher.items();
    let mut ids: Vec<_> = published
        .iter()
        .map(|(_, _, payload)| payload["id"].as_str().unwrap().to_string())
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["HB 1", "SB 2"]);
}

#[tokio::test]
async fn test_filter_restricts_the_enumeration() {
    let harness = TestHarness::new("wy", &["2025r"]);
    let scraper = TestScraper::new("wy", "2025r", &["HB 1", "HB 2", "SB 1"]);
    let order = Arc::clone(&scraper.scrape_order);
    let runner = ScrapeRunner::new(scraper, harness.context("wy"));

    let mut opts = options(&["2025r"], 1);
    // Raw filter entries go through the same normalization as the listing
    opts.filter_bill_ids = vec!["hb2".to_string(), "SB 1".to_string()];
    let summary = runner.run(opts).await.unwrap();

    assert_eq!(summary.scraped, 2);
    assert_eq!(*order.lock().unwrap(), vec!["HB 2", "SB 1"]);
}

#[tokio::test]
async fn test_filter_id_missing_from_enumeration_is_fatal() {
    let harness = TestHarness::new("wy", &["2025r"]);
    let runner = ScrapeRunner::new(
        TestScraper::new("wy", "2025r", &["HB 1"]),
        harness.context("wy"),
    );

    let mut opts = options(&["2025r"], 1);
    opts.filter_bill_ids = vec!["HB 99".to_string()];
    let err = runner.run(opts).await.unwrap_err();
    assert!(err.is_configuration());
    assert!(harness.publisher.items().is_empty());
}

#[tokio::test]
async fn test_expected_error_is_downgraded() {
    let harness = TestHarness::new("pr", &["2025r"]);
    let scraper = TestScraper::new("pr", "2025r", &["HB 1", "HB 2"])
        .fail_on("HB 2")
        .expect_error("2025r", "HB 2", "scripted failure");
    let runner = ScrapeRunner::new(scraper, harness.context("pr"));
    let mut rx = harness.event_bus.subscribe();

    let summary = runner.run(options(&["2025r"], 1)).await.unwrap();

    assert_eq!(summary.scraped, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.expected_failures, 1);

    let events = drain(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, ScrapeEvent::ExpectedFailure { bill_id, .. } if bill_id == "HB 2")));
    assert!(!events
        .iter()
        .any(|e| matches!(e, ScrapeEvent::BillFailed { .. })));
}

#[tokio::test]
async fn test_duplicate_listing_variants_dispatch_once() {
    let harness = TestHarness::new("ct", &["2025r"]);
    // "HB1" and "HB 1" are the same bill once normalized
    let scraper = TestScraper::new("ct", "2025r", &["HB1", "HB 1", "HB 2"]);
    let order = Arc::clone(&scraper.scrape_order);
    let runner = ScrapeRunner::new(scraper, harness.context("ct"));
    let mut rx = harness.event_bus.subscribe();

    let summary = runner.run(options(&["2025r"], 1)).await.unwrap();

    assert_eq!(summary.scraped, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(*order.lock().unwrap(), vec!["HB 1", "HB 2"]);
    assert_eq!(harness.publisher.items().len(), 2);

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        ScrapeEvent::ExtractionIssue { policy, bill_id: Some(id), .. }
            if policy == "bill_list" && id == "HB 1"
    )));
}

#[tokio::test]
async fn test_duplicate_listing_keeps_the_context() {
    let harness = TestHarness::new("ct", &["2025r"]);
    let scraper = TestScraper::new("ct", "2025r", &[]);
    let context_seen = Arc::clone(&scraper.context_seen);
    let runner = ScrapeRunner::new(scraper, harness.context("ct"));

    // Explicit ids take the same collapse path; the entry with context wins
    let mut opts = options(&["2025r"], 1);
    opts.bill_ids = Some(
        [
            ("HB1".to_string(), None),
            ("HB 1".to_string(), Some(serde_json::json!({"year": 2025}))),
        ]
        .into_iter()
        .collect(),
    );
    let summary = runner.run(opts).await.unwrap();

    assert_eq!(summary.scraped, 1);
    assert_eq!(harness.publisher.items().len(), 1);
    assert!(context_seen.lock().unwrap()["HB 1"]);
}

#[tokio::test]
async fn test_enumeration_failure_is_a_run_failure() {
    let harness = TestHarness::new("ak", &["2025r"]);
    // The scraper has no listing for the requested session
    let scraper = TestScraper::new("ak", "other", &["HB 1"]);
    let runner = ScrapeRunner::new(scraper, harness.context("ak"));
    let mut rx = harness.event_bus.subscribe();

    // The run completes normally; the failed enumeration is in the summary
    let summary = runner.run(options(&["2025r"], 1)).await.unwrap();

    assert_eq!(summary.scraped, 0);
    assert_eq!(summary.failed, 1);
    assert!(harness.publisher.items().is_empty());

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        ScrapeEvent::ExtractionIssue { policy, .. } if policy == "bill_list"
    )));
    assert!(matches!(
        events.last(),
        Some(ScrapeEvent::RunCompleted { .. })
    ));
}

#[tokio::test]
async fn test_malformed_listing_id_is_skipped_and_counted() {
    let harness = TestHarness::new("ct", &["2025r"]);
    let scraper = TestScraper::new("ct", "2025r", &["HB 1", "Joint Resolution"]);
    let runner = ScrapeRunner::new(scraper, harness.context("ct"));
    let mut rx = harness.event_bus.subscribe();

    let summary = runner.run(options(&["2025r"], 1)).await.unwrap();

    assert_eq!(summary.scraped, 1);
    assert_eq!(summary.failed, 1);
    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        ScrapeEvent::ExtractionIssue { policy, .. } if policy == "bill_list"
    )));
}

#[tokio::test]
async fn test_run_lifecycle_events() {
    let harness = TestHarness::new("ak", &["2025r"]);
    let scraper = TestScraper::new("ak", "2025r", &["HB 1"]);
    let runner = ScrapeRunner::new(scraper, harness.context("ak"));
    let mut rx = harness.event_bus.subscribe();

    runner.run(options(&["2025r"], 1)).await.unwrap();

    let events = drain(&mut rx);
    assert!(matches!(
        events.first(),
        Some(ScrapeEvent::RunStarted { concurrency: 1, .. })
    ));
    assert!(matches!(
        events.last(),
        Some(ScrapeEvent::RunCompleted { scraped: 1, .. })
    ));
    assert!(events
        .iter()
        .any(|e| matches!(e, ScrapeEvent::BillSaved { bill_id, .. } if bill_id == "HB 1")));
}

#[tokio::test]
async fn test_cancellation_stops_new_dispatch() {
    let harness = TestHarness::new("ak", &["2025r"]);
    let scraper = TestScraper::new("ak", "2025r", &["HB 1", "HB 2", "HB 3"]);
    let runner = ScrapeRunner::new(scraper, harness.context("ak"));

    runner.cancellation_token().cancel();
    let summary = runner.run(options(&["2025r"], 1)).await.unwrap();

    assert_eq!(summary.scraped, 0);
    assert_eq!(summary.failed, 0);
    assert!(harness.publisher.items().is_empty());
}
