mod utils;

use stampede::prelude::*;
use std::collections::HashSet;
use std::time::{Duration, Instant};

#[tokio::test]
async fn healthy_target_yields_all_successes() {
    utils::init();
    let addr = mock_service::spawn().await;

    let config = RunConfig::get(format!("http://{addr}/ok"))
        .virtual_users(5)
        .duration(Duration::from_millis(700));
    let report = Runner::new(config).run().await.unwrap();

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.exit_code(), 0);
    assert!(report.summary.total_iterations > 0);
    assert_eq!(report.summary.success_count, report.summary.total_requests);
    assert!(report.summary.error_counts.is_empty());
    assert!(report.summary.latency_p50 <= report.summary.latency_p90);
    assert!(report.summary.latency_p90 <= report.summary.latency_p99);
}

#[tokio::test]
async fn every_virtual_user_contributes_outcomes() {
    utils::init();
    let addr = mock_service::spawn().await;

    // Delay keeps per-VU iteration counts small enough to eyeball, but every
    // VU still gets through several iterations.
    let config = RunConfig::get(format!("http://{addr}/delay/ms/10"))
        .virtual_users(8)
        .duration(Duration::from_millis(500));
    let summary = Runner::new(config).run().await.unwrap().summary;

    assert_eq!(summary.virtual_users, 8);
    // 8 VUs x ~50 iterations each; far more than one apiece.
    assert!(summary.total_iterations >= 8);
}

#[tokio::test]
async fn error_statuses_are_data_not_failures() {
    utils::init();
    let addr = mock_service::spawn().await;

    let config = RunConfig::get(format!("http://{addr}/status/503"))
        .virtual_users(3)
        .duration(Duration::from_millis(400));
    let report = Runner::new(config).run().await.unwrap();

    assert_eq!(report.summary.success_count, 0);
    assert_eq!(
        report.summary.error_counts["http_503"],
        report.summary.total_requests
    );
    // Received responses complete their iterations; the run is not a failure.
    assert!(report.summary.total_iterations > 0);
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test]
async fn refused_connections_are_recorded_and_exit_zero() {
    utils::init();
    // Bind and drop a listener so the port is very likely unoccupied.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = RunConfig::get(format!("http://{addr}/"))
        .virtual_users(2)
        .duration(Duration::from_millis(300));
    let report = Runner::new(config).run().await.unwrap();

    assert_eq!(report.summary.success_count, 0);
    assert_eq!(report.summary.error_rate(), 1.0);
    assert!(report
        .summary
        .error_counts
        .keys()
        .all(|k| k.starts_with("transport_")));
    // 100% error rate, but the harness itself did not fail.
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test]
async fn wall_clock_time_is_bounded() {
    utils::init();
    let addr = mock_service::spawn().await;

    let duration = Duration::from_millis(400);
    let config = RunConfig::get(format!("http://{addr}/delay/ms/20"))
        .virtual_users(4)
        .duration(duration)
        .drain_timeout(Duration::from_secs(2));
    let started = Instant::now();
    let report = Runner::new(config).run().await.unwrap();
    let elapsed = started.elapsed();

    assert!(report.summary.achieved_duration >= duration);
    // Bounded by duration + one in-flight iteration + drain, with slack.
    assert!(elapsed < duration + Duration::from_secs(3));
}

#[tokio::test]
async fn abort_midway_stops_the_run_promptly() {
    utils::init();
    let addr = mock_service::spawn().await;

    let config = RunConfig::get(format!("http://{addr}/delay/ms/10"))
        .virtual_users(3)
        .duration(Duration::from_secs(30));
    let runner = Runner::new(config);
    let abort = runner.abort_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(400)).await;
        abort.cancel();
    });

    let started = Instant::now();
    let report = runner.run().await.unwrap();

    assert_eq!(report.state, RunState::Aborted);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(report.summary.achieved_duration < Duration::from_secs(5));
    assert!(report.summary.total_iterations > 0);
}

#[tokio::test]
async fn multi_step_scenarios_hit_each_route() {
    utils::init();
    let addr = mock_service::spawn().await;

    let scenario = vec![
        RequestSpec::get(format!("http://{addr}/ok")),
        RequestSpec::get(format!("http://{addr}/status/404")),
    ];
    let config = RunConfig::new(scenario)
        .virtual_users(2)
        .duration(Duration::from_secs(30))
        .max_iterations(10);
    let summary = Runner::new(config).run().await.unwrap().summary;

    assert_eq!(summary.total_iterations, 20);
    assert_eq!(summary.total_requests, 40);
    assert_eq!(summary.success_count, 20);
    assert_eq!(summary.error_counts["http_404"], 20);
}

#[tokio::test]
async fn flaky_target_splits_the_breakdown() {
    utils::init();
    let addr = mock_service::spawn().await;

    let config = RunConfig::get(format!("http://{addr}/flaky/50"))
        .virtual_users(4)
        .duration(Duration::from_millis(500));
    let summary = Runner::new(config).run().await.unwrap().summary;

    let errors: u64 = summary.error_counts.values().sum();
    assert_eq!(summary.success_count + errors, summary.total_requests);
    // Hundreds of coin flips; both sides show up.
    assert!(summary.success_count > 0);
    assert!(errors > 0);
}

#[tokio::test]
async fn summary_serializes_for_machine_consumers() {
    utils::init();
    let addr = mock_service::spawn().await;

    let config = RunConfig::get(format!("http://{addr}/ok"))
        .virtual_users(2)
        .duration(Duration::from_secs(30))
        .max_iterations(5);
    let summary = Runner::new(config).run().await.unwrap().summary;

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["total_iterations"], 10);
    assert!(json["latency_p99"].is_number());
    assert!(json["achieved_duration"].is_number());
}

#[tokio::test]
async fn invalid_config_issues_no_requests() {
    utils::init();
    let addr = mock_service::spawn().await;
    let hits_url = format!("http://{addr}/hits");
    let before = hits(&hits_url).await;

    let config = RunConfig::get(format!("http://{addr}/ok"))
        .virtual_users(0)
        .duration(Duration::from_secs(1));
    let err = Runner::new(config).run().await.unwrap_err();
    assert!(matches!(err, RunError::Config(_)));

    assert_eq!(hits(&hits_url).await, before);
}

/// Reads the mock service's request counter; the probe itself is not counted.
async fn hits(url: &str) -> u64 {
    let body = reqwest::Client::new()
        .get(url)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    body.trim().parse().unwrap()
}

#[tokio::test]
async fn distinct_vu_ids_match_the_configured_count() {
    utils::init();
    let addr = mock_service::spawn().await;

    let config = std::sync::Arc::new(
        RunConfig::get(format!("http://{addr}/ok"))
            .virtual_users(6)
            .duration(Duration::from_millis(300)),
    );
    let handle = stampede::pool::VuPool::start(config, HttpTransport::new());
    tokio::time::sleep(handle.deadline().remaining()).await;

    let mut aggregator = stampede::aggregator::Aggregator::new(handle.launched());
    handle.drain(&mut aggregator).await;

    let ids: HashSet<u32> = aggregator.outcomes().iter().map(|o| o.vu_id).collect();
    assert_eq!(ids.len(), 6);
}
