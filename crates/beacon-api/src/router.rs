//! Axum router construction.
//!
//! Assembles the dashboard, the `/api` routes, and the fallback into a
//! single [`Router`], with CORS and request tracing on every route.

use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{API_KEY_HEADER, require_api_key};
use crate::dashboard;
use crate::handlers;
use crate::rate_limit::limit_requests;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- dashboard shell
/// - `GET /api/health` -- liveness check (rate limited, no auth)
/// - `POST /api/notify` -- ingest
/// - `GET /api/servers` -- active records
/// - `GET /api/servers/filter` -- active records above a value
/// - `GET /api/servers/{jobId}` -- active records for one job
/// - `DELETE /api/servers/{jobId}` -- remove one job's records
/// - `GET /api/stats` -- counters and uptime
///
/// Everything under `/api` is rate limited per client; everything but
/// health also requires `X-API-Key`. Unmatched paths get a JSON 404.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)]);

    let protected = Router::new()
        .route("/notify", post(handlers::notify))
        .route("/servers", get(handlers::list_servers))
        .route("/servers/filter", get(handlers::filter_servers))
        .route(
            "/servers/{job_id}",
            get(handlers::get_servers).delete(handlers::delete_servers),
        )
        .route("/stats", get(handlers::stats))
        .route_layer(from_fn_with_state(Arc::clone(&state), require_api_key));

    let api = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected)
        .route_layer(from_fn_with_state(Arc::clone(&state), limit_requests));

    Router::new()
        .route("/", get(dashboard::index))
        .nest("/api", api)
        .fallback(handlers::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
