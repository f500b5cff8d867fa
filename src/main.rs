// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Minewatch command-line client
//!
//! Checks lease boundaries against the surveillance backend, converts
//! boundary uploads, follows detection jobs and inspects heatmaps. Results
//! are printed to stdout as JSON; logs go to stderr.

use clap::{Parser, Subcommand};
use minewatch::{
    config::Config,
    models::{BreachFilters, DetectionPage, HeatMetric, QueryMode},
    render::OverlayInput,
    services::{api::MAX_HEATMAP_LIMIT, preselect, TracingNotifier},
    AppState,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Mining surveillance boundary client")]
struct Args {
    /// Backend base URL (overrides MINEWATCH_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a GeoJSON boundary file for breaching detections
    Check {
        file: PathBuf,

        /// within | intersects
        #[arg(long, default_value = "within")]
        mode: QueryMode,

        #[arg(long)]
        report_id: Option<String>,

        /// Detection geometry types to include (repeatable)
        #[arg(long = "geometry-type")]
        geometry_types: Vec<String>,

        #[arg(long)]
        with_centroid: bool,

        /// Drop point and line detections from the result
        #[arg(long)]
        only_polygons: bool,

        /// Render on the globe instead of the tile map
        #[arg(long)]
        globe: bool,
    },

    /// Convert a .zip shapefile or .kml file into a boundary
    Upload {
        file: PathBuf,

        /// Save the converted boundary as an area of interest with this name
        #[arg(long)]
        save_as: Option<String>,
    },

    /// Browse detections of a report page by page
    Browse {
        report_id: String,

        #[arg(long, default_value_t = 0)]
        page: u32,

        #[arg(long, default_value_t = 100)]
        page_size: u32,
    },

    /// Follow the visualization of a detection job
    Watch {
        /// Job to follow; defaults to the latest completed job
        job_id: Option<String>,

        /// Stop after this many updates (0 = until interrupted)
        #[arg(long, default_value_t = 0)]
        updates: usize,
    },

    /// List detection jobs
    Jobs,

    /// Show one detection job
    Job { id: String },

    /// Fetch heatmap points and show which pass the threshold
    Heatmap {
        #[arg(long)]
        limit: Option<u32>,

        /// density | volume | violations | depth
        #[arg(long)]
        metric: Option<HeatMetric>,

        /// Intensity threshold, 0-100
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// List saved areas of interest
    Aois,

    /// Delete a saved area of interest
    DeleteAoi { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(url) = args.api_url {
        config.api_base_url = url.trim_end_matches('/').to_string();
    }
    tracing::debug!(api = %config.api_base_url, "Starting minewatch");

    let state = AppState::new(config, Arc::new(TracingNotifier));

    match args.command {
        Command::Check {
            file,
            mode,
            report_id,
            geometry_types,
            with_centroid,
            only_polygons,
            globe,
        } => {
            let text = tokio::fs::read_to_string(&file).await?;
            let filters = BreachFilters {
                report_id,
                geometry_types,
                with_centroid,
            };
            let check = state.boundary_check();
            let report = if globe {
                let mut renderer = state.globe_renderer();
                check
                    .run(&text, mode, &filters, only_polygons, &mut renderer)
                    .await?
            } else {
                let mut renderer = state.map_renderer();
                check
                    .run(&text, mode, &filters, only_polygons, &mut renderer)
                    .await?
            };
            print_json(&json!({
                "mode": mode,
                "count": report.detections.len(),
                "union": format!("{:?}", report.union),
                "bbox": report.bbox,
                "detections": report.detections,
            }))?;
        }

        Command::Upload { file, save_as } => {
            let check = state.boundary_check();
            let uploaded = check.upload_boundary(&file).await?;
            let saved = match (save_as, &uploaded.outcome.boundary) {
                (Some(name), geojson::GeoJson::Geometry(g)) => {
                    Some(check.save_aoi(Some(name), g.clone()).await?.id)
                }
                (Some(_), _) => {
                    tracing::warn!("Converted boundary is not a single geometry; not saved");
                    None
                }
                (None, _) => None,
            };
            print_json(&json!({
                "id": uploaded.id,
                "union": format!("{:?}", uploaded.outcome.status),
                "boundary": uploaded.outcome.boundary,
                "saved_aoi": saved,
            }))?;
        }

        Command::Browse {
            report_id,
            page,
            page_size,
        } => {
            let mut renderer = state.map_renderer();
            let detections = state
                .boundary_check()
                .browse(&DetectionPage::new(report_id, page, page_size), &mut renderer)
                .await?;
            let viewport = renderer.backend().viewport();
            print_json(&json!({
                "count": detections.len(),
                "center": [viewport.center.lng, viewport.center.lat],
                "zoom": viewport.zoom,
                "detections": detections,
            }))?;
        }

        Command::Watch { job_id, updates } => {
            let job = match job_id {
                Some(id) => id,
                None => {
                    let jobs = state.api.list_detection_jobs().await?;
                    let Some(job) = preselect(&jobs, None) else {
                        anyhow::bail!("no detection jobs available");
                    };
                    job.id.clone()
                }
            };

            let mut renderer = state.globe_renderer();
            let mut tracker = state.visualization_tracker();
            let mut rx = tracker.subscribe();
            tracker.select(Some(job));

            let mut seen = 0;
            while rx.changed().await.is_ok() {
                let Some(payload) = rx.borrow_and_update().clone() else {
                    continue;
                };
                let rendered = renderer.update(&OverlayInput::from(&payload))?;
                print_json(&json!({
                    "job_id": payload.job_id,
                    "status": payload.status,
                    "rendered": rendered,
                    "illegal": payload.layers.illegal().len(),
                    "depth_polygons": payload.layers.depth_polygons.len(),
                    "metrics": payload.metrics,
                    "map_url": payload.map_url,
                }))?;
                seen += 1;
                if updates > 0 && seen >= updates {
                    break;
                }
            }
            tracker.stop();
        }

        Command::Jobs => {
            let jobs = state.api.list_detection_jobs().await?;
            let selected = preselect(&jobs, None).map(|j| j.id.clone());
            print_json(&json!({ "jobs": jobs, "preselected": selected }))?;
        }

        Command::Job { id } => {
            let job = state.api.get_detection_job(&id).await?;
            print_json(&serde_json::to_value(&job)?)?;
        }

        Command::Heatmap {
            limit,
            metric,
            threshold,
        } => {
            if let Some(limit) = limit {
                warn_if_clamped(limit);
            }
            let feed = state.heatmap_feed(limit, metric);
            let mut renderer = state.map_renderer();
            if let Some(threshold) = threshold {
                renderer.set_heat_threshold(threshold);
            }
            let shown = feed.toggle(&mut renderer, true).await;
            let points = feed.points();
            let passing = points
                .iter()
                .filter(|p| p.intensity >= renderer.heat_threshold())
                .count();
            print_json(&json!({
                "shown": shown,
                "threshold": renderer.heat_threshold(),
                "fetched": points.len(),
                "above_threshold": passing,
            }))?;
        }

        Command::Aois => {
            let aois = state.api.list_aois().await?;
            print_json(&json!({ "count": aois.len(), "aois": aois }))?;
        }

        Command::DeleteAoi { id } => {
            let deleted = state.api.delete_aoi(&id).await?;
            print_json(&json!({ "id": deleted.id, "deleted": deleted.deleted }))?;
        }
    }

    Ok(())
}

fn warn_if_clamped(limit: u32) {
    if !(1..=MAX_HEATMAP_LIMIT).contains(&limit) {
        tracing::warn!(
            limit,
            max = MAX_HEATMAP_LIMIT,
            "Heatmap limit out of range; clamping"
        );
    }
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initialize structured JSON logging on stderr.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("minewatch=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
