//! Static dashboard page.
//!
//! The page is a self-contained HTML shell embedded at compile time. It
//! asks for the API key once, then polls `/api/stats` and `/api/servers`
//! every five seconds. Each row has a Join button that copies the
//! record's teleport script to the clipboard and then deletes the job.
//! No server-side rendering happens here, so the route itself needs no
//! authentication.

use axum::response::Html;

const DASHBOARD_HTML: &str = include_str!("../assets/dashboard.html");

/// Serve the dashboard shell.
pub async fn index() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}
