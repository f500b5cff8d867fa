// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Job visualization polling against a mock backend.

use common::{square, MockBackend, MockResponse, RecordingBackend};
use minewatch::models::JobStatus;
use minewatch::render::{OverlayInput, OverlayRenderer};
use minewatch::services::{JobListTracker, VisualizationTracker};
use std::time::Duration;

mod common;

fn payload(job_id: &str, status: &str) -> serde_json::Value {
    serde_json::json!({
        "job_id": job_id,
        "status": status,
        "layers": {
            "legal_boundary": square(77.0, 28.0, 1.0),
            "illegal_polygons": [square(77.2, 28.2, 0.1)],
            "depth_polygons": [{"geometry": square(77.2, 28.2, 0.05), "properties": {"depth": 12}}]
        },
        "metrics": {"area_illegal": 0.4, "volume_cubic_m": null},
        "aoi_bbox": [77.0, 28.0, 78.0, 29.0]
    })
}

#[tokio::test]
async fn test_stale_response_for_previous_job_is_discarded() {
    let backend = MockBackend::start().await;
    backend.route(
        "GET",
        "/visualization/job-a",
        vec![MockResponse::json(payload("job-a", "completed")).delayed(Duration::from_millis(400))],
    );
    backend.route(
        "GET",
        "/visualization/job-b",
        vec![MockResponse::json(payload("job-b", "running"))],
    );

    let mut tracker = VisualizationTracker::new(backend.client(), Duration::from_secs(10));
    tracker.select(Some("job-a".to_string()));
    tokio::time::sleep(Duration::from_millis(50)).await;
    tracker.select(Some("job-b".to_string()));
    tokio::time::sleep(Duration::from_millis(800)).await;

    let current = tracker.current().expect("job-b payload applied");
    assert_eq!(current.job_id, "job-b");
    assert_eq!(current.status, JobStatus::Running);
    assert_eq!(tracker.selected(), Some("job-b"));
    assert_eq!(backend.requests_to("/visualization/job-a").len(), 1);
}

#[tokio::test]
async fn test_failed_tick_keeps_previous_payload() {
    let backend = MockBackend::start().await;
    backend.route(
        "GET",
        "/visualization/job-1",
        vec![
            MockResponse::json(payload("job-1", "completed")),
            MockResponse::error(500, "database unavailable"),
        ],
    );

    let mut tracker = VisualizationTracker::new(backend.client(), Duration::from_millis(100));
    let mut rx = tracker.subscribe();
    tracker.select(Some("job-1".to_string()));
    tokio::time::timeout(Duration::from_secs(2), rx.changed())
        .await
        .expect("first payload in time")
        .unwrap();
    tokio::time::sleep(Duration::from_millis(450)).await;

    assert!(backend.requests_to("/visualization/job-1").len() >= 3);
    let current = tracker.current().expect("payload kept");
    assert_eq!(current.job_id, "job-1");
    assert_eq!(current.metric("area_illegal"), Some(0.4));
    tracker.stop();
}

#[tokio::test]
async fn test_deselect_stops_polling_and_clears() {
    let backend = MockBackend::start().await;
    backend.route(
        "GET",
        "/visualization/job-1",
        vec![MockResponse::json(payload("job-1", "completed"))],
    );

    let mut tracker = VisualizationTracker::new(backend.client(), Duration::from_millis(100));
    tracker.select(Some("job-1".to_string()));
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(tracker.current().is_some());

    tracker.select(None);
    assert!(tracker.current().is_none());
    let polled = backend.requests().len();
    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(backend.requests().len(), polled);
}

#[tokio::test]
async fn test_payload_renders_all_layers() {
    let backend = MockBackend::start().await;
    backend.route(
        "GET",
        "/visualization/job-1",
        vec![MockResponse::json(payload("job-1", "completed"))],
    );
    let payload = backend
        .client()
        .get_visualization("job-1")
        .await
        .unwrap();

    let mut renderer = OverlayRenderer::new(RecordingBackend::default());
    let rendered = renderer.update(&OverlayInput::from(&payload)).unwrap();
    assert_eq!(rendered, 3);
    assert_eq!(
        renderer.backend().fits[0].0,
        minewatch::models::Bbox::from([77.0, 28.0, 78.0, 29.0])
    );
}

#[tokio::test]
async fn test_job_list_tracker_refreshes() {
    let backend = MockBackend::start().await;
    backend.route(
        "GET",
        "/ai/models/jobs",
        vec![
            MockResponse::json(serde_json::json!([{"id": "j1", "status": "running"}])),
            MockResponse::json(serde_json::json!([
                {"id": "j1", "status": "completed"},
                {"id": "j2", "status": "queued"}
            ])),
        ],
    );

    let tracker = JobListTracker::start(backend.client(), Duration::from_millis(100));
    tokio::time::sleep(Duration::from_millis(250)).await;

    let jobs = tracker.jobs();
    assert_eq!(jobs.len(), 2);
    assert_eq!(
        minewatch::services::preselect(&jobs, None).map(|j| j.id.as_str()),
        Some("j1")
    );
    tracker.stop();
}

#[tokio::test]
async fn test_job_detail() {
    let backend = MockBackend::start().await;
    backend.route(
        "GET",
        "/ai/models/jobs/j1",
        vec![MockResponse::json(serde_json::json!({
            "id": "j1",
            "status": "completed",
            "created_at": "2026-03-01T10:15:00.123456",
            "completed_at": "2026-03-01T10:20:00",
            "area_illegal": 3.5,
            "result_map_url": "/authority/terrain3d?job=j1"
        }))],
    );

    let detail = backend.client().get_detection_job("j1").await.unwrap();
    assert_eq!(detail.status, JobStatus::Completed);
    assert_eq!(detail.area_illegal, Some(3.5));
    let took = detail.completed_at.unwrap() - detail.created_at.unwrap();
    assert_eq!(took.num_seconds(), 299);
}

#[tokio::test]
async fn test_job_ids_are_encoded_in_paths() {
    let backend = MockBackend::start().await;
    backend.route(
        "GET",
        "/visualization/job%231",
        vec![MockResponse::json(payload("job#1", "running"))],
    );
    backend.route(
        "GET",
        "/ai/models/jobs/job%231",
        vec![MockResponse::json(serde_json::json!({"id": "job#1", "status": "running"}))],
    );
    let client = backend.client();

    let payload = client.get_visualization("job#1").await.unwrap();
    assert_eq!(payload.job_id, "job#1");
    let detail = client.get_detection_job("job#1").await.unwrap();
    assert_eq!(detail.id, "job#1");

    let paths: Vec<String> = backend.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(paths, ["/visualization/job%231", "/ai/models/jobs/job%231"]);
}
