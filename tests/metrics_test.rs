//! Comprehensive unit tests for metrics.rs module

use std::sync::Arc;
use std::time::Duration;

use auditor_dashboard::api_client::ApiClient;
use auditor_dashboard::error::ErrorKind;
use auditor_dashboard::fixtures::DEFAULT_AUDITOR_ID;
use auditor_dashboard::metrics::{ApiMetrics, MetricsTimer};
use auditor_dashboard::mock_store::MockBehavior;
use auditor_dashboard::models::{MessageStatus, RefinementInput};

#[test]
fn test_metrics_default() {
    let metrics = ApiMetrics::default();
    assert_eq!(metrics.calls_total(), 0);
    assert_eq!(metrics.errors_total(), 0);
    assert_eq!(metrics.rejections_total(), 0);
}

#[test]
fn test_record_call_success() {
    let metrics = ApiMetrics::new();
    metrics.record_call("get_messages", Duration::from_millis(100), None);
    assert_eq!(metrics.calls_total(), 1);
    assert_eq!(metrics.errors_total(), 0);
}

#[test]
fn test_record_call_failure() {
    let metrics = ApiMetrics::new();
    metrics.record_call("get_message", Duration::from_millis(100), Some(ErrorKind::NotFound));
    assert_eq!(metrics.calls_total(), 1);
    assert_eq!(metrics.errors_total(), 1);
}

#[test]
fn test_record_multiple_calls() {
    let metrics = ApiMetrics::new();
    metrics.record_call("get_messages", Duration::from_millis(50), None);
    metrics.record_call("update_message_status", Duration::from_millis(100), None);
    metrics.record_call("regenerate_response", Duration::from_millis(75), Some(ErrorKind::NetworkFailure));

    assert_eq!(metrics.calls_total(), 3);
    assert_eq!(metrics.errors_total(), 1);
}

#[test]
fn test_record_rejection() {
    let metrics = ApiMetrics::new();
    metrics.record_rejection("regenerate_response");
    assert_eq!(metrics.rejections_total(), 1);
    assert_eq!(metrics.calls_total(), 0);
}

#[test]
fn test_metrics_timer_finish_success() {
    let metrics = ApiMetrics::new();
    let timer = MetricsTimer::new(&metrics, "get_knowledge_items");
    std::thread::sleep(Duration::from_millis(5));
    timer.finish(None);
    assert_eq!(metrics.calls_total(), 1);
    assert_eq!(metrics.errors_total(), 0);
}

#[test]
fn test_metrics_timer_finish_failure() {
    let metrics = ApiMetrics::new();
    MetricsTimer::new(&metrics, "add_knowledge_item").finish(Some(ErrorKind::NetworkFailure));
    assert_eq!(metrics.calls_total(), 1);
    assert_eq!(metrics.errors_total(), 1);
}

#[test]
fn test_metrics_concurrent_updates() {
    let metrics = Arc::new(ApiMetrics::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let metrics = Arc::clone(&metrics);
            std::thread::spawn(move || {
                for _ in 0..25 {
                    metrics.record_call("get_messages", Duration::from_millis(1), None);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(metrics.calls_total(), 100);
}

#[tokio::test]
async fn test_client_records_calls_and_failures() {
    let client = ApiClient::mock(MockBehavior::instant());
    client.get_messages(DEFAULT_AUDITOR_ID, Some(MessageStatus::Pending)).await.unwrap();
    assert!(client.get_message("missing").await.is_err());

    assert_eq!(client.metrics().calls_total(), 2);
    assert_eq!(client.metrics().errors_total(), 1);
}

#[tokio::test]
async fn test_client_rejections_skip_backend() {
    let client = ApiClient::mock(MockBehavior::instant());
    assert!(client.get_message("").await.is_err());
    let blank = RefinementInput { message_id: "1".to_string(), guidance: String::new() };
    assert!(client.regenerate_response(&blank).await.is_err());

    assert_eq!(client.metrics().calls_total(), 0);
    assert_eq!(client.metrics().rejections_total(), 2);
}
