//! End-to-end refresh tests against a mocked prediction service.

use chrono::{DateTime, TimeZone, Utc};
use mockito::Matcher;
use pawsense::client::PredictionClient;
use pawsense::config::{PawsenseConfig, ServiceConfig};
use pawsense::fallback::FallbackGenerator;
use pawsense::types::BoardSource;
use pawsense::{CollarController, CountdownStyle, PredictionPipeline, PredictionRequest};
use pretty_assertions::assert_eq;

fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 9, h, m, s).unwrap()
}

fn pipeline_for(base_url: String, endpoint: &str) -> PredictionPipeline {
    let service = ServiceConfig {
        base_url,
        endpoint: endpoint.to_string(),
        timeout_secs: Some(5),
    };
    PredictionPipeline::with_parts(
        PredictionClient::new(&service).unwrap(),
        FallbackGenerator::new(Some(17)),
        CountdownStyle::Compact,
    )
}

#[tokio::test]
async fn test_simple_response_end_to_end() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/predict_next")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "current_activity": "Feeding"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"predictionList": [{"activity": "Walking", "average_start_time": "14:30:00"}]}"#)
        .create_async()
        .await;

    let mut pipeline = pipeline_for(server.url(), "/predict_next");
    let board = pipeline
        .refresh(&PredictionRequest::new("Feeding"), &at(14, 0, 0))
        .await;

    mock.assert_async().await;
    assert_eq!(board.source, BoardSource::Live);
    assert_eq!(board.entries.len(), 1);
    assert_eq!(board.entries[0].label, "Walking");
    assert_eq!(board.entries[0].minutes_until, 30);
    assert_eq!(board.entries[0].display_text, "in 30 min");
}

#[tokio::test]
async fn test_simple_response_after_start_time() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/predict_next")
        .with_status(200)
        .with_body(r#"{"predictionList": [{"activity": "Walking", "average_start_time": "14:30:00"}]}"#)
        .create_async()
        .await;

    let mut pipeline = pipeline_for(server.url(), "/predict_next");
    let board = pipeline
        .refresh(&PredictionRequest::new("Feeding"), &at(15, 0, 0))
        .await;

    let entry = &board.entries[0];
    assert_eq!(
        entry.resolved_time,
        Utc.with_ymd_and_hms(2025, 8, 10, 14, 30, 0).unwrap()
    );
    assert_eq!(entry.minutes_until, 1410);
    assert_eq!(entry.display_text, "in 23h 30m");
}

#[tokio::test]
async fn test_chain_response_sends_full_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/predict_chain")
        .match_body(Matcher::Json(serde_json::json!({
            "current_activity": "Feeding",
            "last_activity_time": "2025-08-09T13:00:00Z",
            "max_depth": 6
        })))
        .with_status(200)
        .with_body(
            r#"{"predictions": [
                {"next_activity": "Potty", "time_to_next_minutes": 75, "probability": 0.55},
                {"next_activity": "Sleep", "time_to_next_minutes": 200, "probability": 0.35}
            ]}"#,
        )
        .create_async()
        .await;

    let request = PredictionRequest::new("Feeding")
        .with_last_activity_time(at(13, 0, 0))
        .with_max_depth(6);
    let mut pipeline = pipeline_for(server.url(), "/predict_chain");
    let board = pipeline.refresh(&request, &at(14, 0, 0)).await;

    mock.assert_async().await;
    assert_eq!(board.source, BoardSource::Live);
    let shown: Vec<_> = board
        .entries
        .iter()
        .map(|e| (e.label.as_str(), e.display_text.as_str()))
        .collect();
    assert_eq!(shown, vec![("Potty", "in 15 min"), ("Sleep", "in 2h 20m")]);
}

#[tokio::test]
async fn test_default_request_carries_last_activity_time() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/predict_chain")
        .match_body(Matcher::Json(serde_json::json!({
            "current_activity": "Feeding",
            "last_activity_time": "2025-08-09T14:00:00Z",
            "max_depth": 6
        })))
        .with_status(200)
        .with_body(
            r#"{"predictions": [
                {"next_activity": "Potty", "time_to_next_minutes": 45, "probability": 0.7}
            ]}"#,
        )
        .create_async()
        .await;

    let request = PawsenseConfig::default().request();
    assert_eq!(request.last_activity_time, None);

    let mut pipeline = pipeline_for(server.url(), "/predict_chain");
    let board = pipeline.refresh(&request, &at(14, 0, 0)).await;

    mock.assert_async().await;
    assert_eq!(board.source, BoardSource::Live);
    assert_eq!(board.entries[0].label, "Potty");
    assert_eq!(board.entries[0].display_text, "in 45 min");
}

#[tokio::test]
async fn test_server_error_status_falls_back() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/predict_chain")
        .with_status(503)
        .create_async()
        .await;

    let mut pipeline = pipeline_for(server.url(), "/predict_chain");
    let board = pipeline
        .refresh(&PredictionRequest::new("Feeding"), &at(14, 0, 0))
        .await;

    let BoardSource::Fallback { reason } = &board.source else {
        panic!("expected fallback board");
    };
    assert!(reason.contains("503"));
    assert!(!board.entries.is_empty());
    assert!(board.entries.len() <= 6);

    let mut last_offset = 0;
    for entry in &board.entries {
        let probability = entry.probability.unwrap();
        assert!((0.4..1.0).contains(&probability));
        let offset = entry.minutes_from_start.unwrap();
        assert!(offset > last_offset);
        last_offset = offset;
    }
}

#[tokio::test]
async fn test_service_error_body_falls_back() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/predict_chain")
        .with_status(200)
        .with_body(r#"{"error": "No Last Activity Time Provided"}"#)
        .create_async()
        .await;

    let mut pipeline = pipeline_for(server.url(), "/predict_chain");
    let board = pipeline
        .refresh(&PredictionRequest::new("Feeding"), &at(14, 0, 0))
        .await;

    assert!(board.source.is_fallback());
}

#[tokio::test]
async fn test_unreachable_service_falls_back() {
    // Port 9 (discard) is closed on test hosts
    let mut pipeline = pipeline_for("http://127.0.0.1:9".to_string(), "/predict_chain");
    let board = pipeline
        .refresh(&PredictionRequest::new("Walk").with_max_depth(3), &at(14, 0, 0))
        .await;

    assert!(board.source.is_fallback());
    assert_eq!(board.entries.len(), 3);
}

#[tokio::test]
async fn test_board_reaches_controller_snapshot() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/predict_next")
        .with_status(200)
        .with_body(r#"{"predictionList": [{"activity": "Walking", "average_start_time": "14:30:00"}]}"#)
        .create_async()
        .await;

    let mut pipeline = pipeline_for(server.url(), "/predict_next");
    let mut controller = CollarController::new(Some(5));

    let board = pipeline
        .refresh(&PredictionRequest::new("Feeding"), &at(14, 0, 0))
        .await;
    controller.apply_board(board.clone());
    controller.tick();

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.predictions, Some(board));
}
