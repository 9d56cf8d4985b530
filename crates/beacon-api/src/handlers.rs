//! REST endpoint handlers.
//!
//! Handlers are thin: they validate input, call one [`RecordStore`]
//! operation, and serialize the result. Records are returned as the
//! camelCase JSON defined by [`Record`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/health` | Liveness check (no auth) |
//! | `POST` | `/api/notify` | Ingest one event |
//! | `GET` | `/api/servers` | All active records |
//! | `GET` | `/api/servers/filter` | Active records with `value >= minValue` |
//! | `GET` | `/api/servers/{jobId}` | Active records for one job |
//! | `DELETE` | `/api/servers/{jobId}` | Remove every record for one job |
//! | `GET` | `/api/stats` | Counters and uptime |
//!
//! [`RecordStore`]: beacon_core::RecordStore

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use beacon_core::uptime::format_uptime;
use beacon_core::{Record, Stats};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::ingest::{NotifyRequest, leading_integer, validate_job_id};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

/// Query parameters for `GET /api/servers/filter`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterQuery {
    /// Minimum value, parsed leniently; absent means 0.
    pub min_value: Option<String>,
}

/// Body returned by `POST /api/notify`.
#[derive(Debug, Serialize)]
pub struct StoredResponse {
    /// Always `"Notification stored"`.
    pub message: &'static str,
    /// The record as stored.
    pub server: Record,
}

/// Body returned by `DELETE /api/servers/{jobId}`.
#[derive(Debug, Serialize)]
pub struct RemovedResponse {
    /// Always `"Server removed"`.
    pub message: &'static str,
    /// Every record that was removed.
    pub removed: Vec<Record>,
}

/// Body returned by `GET /api/stats`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Raw counters.
    #[serde(flatten)]
    pub stats: Stats,
    /// Human-readable uptime, e.g. `"1h 2m 3s"`.
    pub uptime_formatted: String,
}

// ---------------------------------------------------------------------------
// GET /api/health
// ---------------------------------------------------------------------------

/// Liveness check. Reports process uptime in fractional seconds.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "uptime": state.booted_at.elapsed().as_secs_f64(),
    }))
}

// ---------------------------------------------------------------------------
// POST /api/notify
// ---------------------------------------------------------------------------

/// Store a reported event and relay it without waiting on the sink.
pub async fn notify(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NotifyRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::Validation(e.body_text()))?;
    let candidate = request.into_candidate()?;

    let record = state.store.insert(candidate);
    // Detached: the response never waits on delivery.
    drop(state.notifier.dispatch(record.clone()));

    info!(job_id = record.job_id, value = %record.value_formatted, "POST /api/notify");
    Ok(Json(StoredResponse {
        message: "Notification stored",
        server: record,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/servers, GET /api/servers/filter
// ---------------------------------------------------------------------------

/// All active records in insertion order.
pub async fn list_servers(State(state): State<Arc<AppState>>) -> Json<Vec<Record>> {
    let records = state.store.active_records();
    debug!(count = records.len(), "GET /api/servers");
    Json(records)
}

/// Active records with `value >= minValue`.
pub async fn filter_servers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterQuery>,
) -> Json<Vec<Record>> {
    let min_value = params.min_value.as_deref().map_or(0, leading_integer);
    let records = state.store.filter_by_min_value(min_value);
    debug!(min_value, count = records.len(), "GET /api/servers/filter");
    Json(records)
}

// ---------------------------------------------------------------------------
// GET / DELETE /api/servers/{jobId}
// ---------------------------------------------------------------------------

/// Active records for one job.
pub async fn get_servers(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<Vec<Record>>, ApiError> {
    validate_job_id(&job_id)?;
    let records = state.store.records_by_key(&job_id);
    if records.is_empty() {
        return Err(ApiError::NotFound("Server not found or expired".to_owned()));
    }
    debug!(job_id, count = records.len(), "GET /api/servers/{{jobId}}");
    Ok(Json(records))
}

/// Remove every record for one job, expired or not.
pub async fn delete_servers(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_job_id(&job_id)?;
    let removed = state.store.remove_by_key(&job_id);
    if removed.is_empty() {
        return Err(ApiError::NotFound("Server not found".to_owned()));
    }
    Ok(Json(RemovedResponse {
        message: "Server removed",
        removed,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/stats
// ---------------------------------------------------------------------------

/// Counters, active count, and uptime.
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let stats = state.store.stats();
    Json(StatsResponse {
        uptime_formatted: format_uptime(stats.uptime),
        stats,
    })
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

/// Any unmatched route.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not found".to_owned())
}
