// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use minewatch::config::Session;
use minewatch::models::geometry::{Bbox, LngLat, PolygonRings};
use minewatch::render::{
    FitMode, HeatSample, LineStyle, MarkerStyle, PolygonStyle, RenderBackend, RenderError,
};
use minewatch::services::{ApiClient, Notice, Notifier};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A canned response for one route.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub delay: Option<Duration>,
}

impl MockResponse {
    pub fn json(value: serde_json::Value) -> Self {
        Self {
            status: 200,
            body: value.to_string(),
            delay: None,
        }
    }

    pub fn error(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A request as the mock backend saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    #[allow(dead_code)]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body should be JSON")
    }

    #[allow(dead_code)]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query
            .as_deref()
            .unwrap_or_default()
            .split('&')
            .filter(|kv| !kv.is_empty())
            .map(|kv| {
                let (k, v) = kv.split_once('=').unwrap_or((kv, ""));
                (k.to_string(), decode(v))
            })
            .collect()
    }
}

fn decode(v: &str) -> String {
    v.replace("%2C", ",").replace("%2c", ",").replace('+', " ")
}

#[derive(Default)]
struct MockState {
    // Each route replays its responses in order; the last one repeats.
    routes: Mutex<HashMap<(String, String), VecDeque<MockResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Local stand-in for the surveillance REST API.
pub struct MockBackend {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock backend");
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Serve `responses` in order on `method path`.
    pub fn route(&self, method: &str, path: &str, responses: Vec<MockResponse>) -> &Self {
        self.state.routes.lock().unwrap().insert(
            (method.to_string(), path.to_string()),
            responses.into_iter().collect(),
        );
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.base_url.clone(), Session::anonymous())
    }

    #[allow(dead_code)]
    pub fn client_with_token(&self, token: &str) -> ApiClient {
        ApiClient::new(self.base_url.clone(), Session::with_token(token))
    }
}

async fn handle(State(state): State<Arc<MockState>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .map(|b| b.to_vec())
        .unwrap_or_default();
    let header_value = |name: header::HeaderName| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    state.requests.lock().unwrap().push(RecordedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        authorization: header_value(header::AUTHORIZATION),
        content_type: header_value(header::CONTENT_TYPE),
        body,
    });

    let response = {
        let mut routes = state.routes.lock().unwrap();
        routes
            .get_mut(&(parts.method.to_string(), parts.uri.path().to_string()))
            .and_then(|queue| {
                if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                }
            })
    };

    let Some(response) = response else {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    };
    if let Some(delay) = response.delay {
        tokio::time::sleep(delay).await;
    }
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        response.body,
    )
        .into_response()
}

/// Notifier that keeps every notice.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    #[allow(dead_code)]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

/// Render backend that records what it was asked to draw.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next: u32,
    pub live: Vec<u32>,
    pub polygons: Vec<PolygonRings>,
    pub markers: Vec<LngLat>,
    pub fits: Vec<(Bbox, FitMode)>,
    pub heat: Vec<HeatSample>,
}

impl RecordingBackend {
    fn add(&mut self) -> u32 {
        self.next += 1;
        self.live.push(self.next);
        self.next
    }
}

impl RenderBackend for RecordingBackend {
    type Handle = u32;
    type Pointer = LngLat;

    fn add_polygon(
        &mut self,
        rings: &PolygonRings,
        _style: &PolygonStyle,
    ) -> Result<u32, RenderError> {
        self.polygons.push(rings.clone());
        Ok(self.add())
    }

    fn add_polyline(&mut self, _points: &[LngLat], _style: &LineStyle) -> Result<u32, RenderError> {
        Ok(self.add())
    }

    fn add_marker(&mut self, at: LngLat, _style: &MarkerStyle) -> Result<u32, RenderError> {
        self.markers.push(at);
        Ok(self.add())
    }

    fn add_heat(&mut self, samples: &[HeatSample]) -> Result<Vec<u32>, RenderError> {
        self.heat = samples.to_vec();
        Ok(vec![self.add()])
    }

    fn remove(&mut self, handle: u32) -> bool {
        let before = self.live.len();
        self.live.retain(|h| *h != handle);
        before != self.live.len()
    }

    fn fit_view(&mut self, bbox: Bbox, mode: FitMode) -> Result<(), RenderError> {
        self.fits.push((bbox, mode));
        Ok(())
    }

    fn unproject(&self, pointer: &LngLat) -> Option<LngLat> {
        Some(*pointer)
    }

    fn destroy(&mut self) {
        self.live.clear();
    }
}

/// `{id, geometry}` detection as the backend returns it.
#[allow(dead_code)]
pub fn detection(id: u32, geometry: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "report_id": "rep-1",
        "geometry": geometry,
        "properties": {"confidence": 0.9}
    })
}

/// Closed square polygon geometry with its south-west corner at `(x, y)`.
#[allow(dead_code)]
pub fn square(x: f64, y: f64, size: f64) -> serde_json::Value {
    serde_json::json!({
        "type": "Polygon",
        "coordinates": [[[x, y], [x + size, y], [x + size, y + size], [x, y + size], [x, y]]]
    })
}
