// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! REST client for the surveillance backend.
//!
//! Handles:
//! - Boundary breach queries
//! - Detection browsing, job listings and visualization payloads
//! - Heatmap points
//! - Boundary file conversion and saved areas of interest
//!
//! Every request goes through [`ApiClient::with_auth`], which attaches the
//! session's bearer token when there is one. Nothing is retried.

use crate::config::{Config, Session};
use crate::error::{AppError, Result};
use crate::models::{
    Aoi, BreachFilters, ConvertedUpload, CreatedAoi, DeletedAoi, DetectionFeature, DetectionJob,
    DetectionPage, HeatMetric, HeatPoint, JobDetail, NewAoi, QueryMode, VisualizationPayload,
};
use geojson::GeoJson;
use serde::de::DeserializeOwned;

/// Largest heatmap page the backend serves.
pub const MAX_HEATMAP_LIMIT: u32 = 5000;

/// Surveillance API client.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: Session) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            session,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_base_url.clone(), config.session.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL of `prefix/{id}` with `id` percent-encoded as one path segment.
    fn item_url(&self, prefix: &str, id: &str) -> String {
        format!("{}{}/{}", self.base_url, prefix, urlencoding::encode(id))
    }

    /// Attach `Authorization: Bearer` when the session carries a token.
    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Detections that breach `boundary` under `mode`.
    ///
    /// The boundary is posted as-is. An empty list is a valid answer.
    pub async fn query_breaches(
        &self,
        boundary: &GeoJson,
        mode: QueryMode,
        filters: &BreachFilters,
    ) -> Result<Vec<DetectionFeature>> {
        let mut query = vec![("mode", mode.as_str().to_string())];
        query.extend(filters.query_pairs());

        let request = self
            .http
            .post(self.url("/mining/illegal/by-boundary"))
            .query(&query)
            .json(boundary);
        let detections: Vec<DetectionFeature> = self.send_json(request).await?;

        tracing::debug!(%mode, count = detections.len(), "Breach query complete");
        Ok(detections)
    }

    /// One page of detections for a report.
    pub async fn list_detections(&self, page: &DetectionPage) -> Result<Vec<DetectionFeature>> {
        let request = self
            .http
            .get(self.url("/mining/detections"))
            .query(&page.query_pairs());
        self.send_json(request).await
    }

    pub async fn get_visualization(&self, job_id: &str) -> Result<VisualizationPayload> {
        let request = self.http.get(self.item_url("/visualization", job_id));
        self.send_json(request).await
    }

    /// Heatmap points. The limit is clamped to what the backend accepts.
    pub async fn get_heatmap_points(
        &self,
        limit: u32,
        metric: Option<HeatMetric>,
    ) -> Result<Vec<HeatPoint>> {
        let mut query = vec![("limit", limit.clamp(1, MAX_HEATMAP_LIMIT).to_string())];
        if let Some(metric) = metric {
            query.push(("metric", metric.as_str().to_string()));
        }
        let request = self
            .http
            .get(self.url("/visualization/heatmap"))
            .query(&query);
        self.send_json(request).await
    }

    /// Have the backend convert a zipped shapefile or KML file to GeoJSON.
    pub async fn upload_convert_geojson(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<ConvertedUpload> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let request = self
            .http
            .post(self.url("/gis/upload/convert-geojson"))
            .multipart(form);
        self.send_json(request).await
    }

    pub async fn create_aoi(&self, aoi: &NewAoi) -> Result<CreatedAoi> {
        let request = self.http.post(self.url("/gis/aois")).json(aoi);
        self.send_json(request).await
    }

    pub async fn list_aois(&self) -> Result<Vec<Aoi>> {
        self.send_json(self.http.get(self.url("/gis/aois"))).await
    }

    pub async fn delete_aoi(&self, id: &str) -> Result<DeletedAoi> {
        let request = self.http.delete(self.item_url("/gis/aois", id));
        self.send_json(request).await
    }

    pub async fn list_detection_jobs(&self) -> Result<Vec<DetectionJob>> {
        self.send_json(self.http.get(self.url("/ai/models/jobs"))).await
    }

    pub async fn get_detection_job(&self, id: &str) -> Result<JobDetail> {
        let request = self.http.get(self.item_url("/ai/models/jobs", id));
        self.send_json(request).await
    }

    /// Send with auth and parse the JSON body of a successful response.
    async fn send_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = self.with_auth(request).send().await?;
        self.check_response_json(response).await
    }

    /// Check response status and parse JSON body.
    ///
    /// Non-2xx responses become [`AppError::Http`] carrying the response body
    /// so the server's message reaches the user verbatim.
    async fn check_response_json<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = if body.trim().is_empty() {
                status.to_string()
            } else {
                body
            };
            tracing::warn!(status = status.as_u16(), "API request rejected");
            return Err(AppError::Http {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Decode(format!("JSON parse error: {}", e)))
    }
}
