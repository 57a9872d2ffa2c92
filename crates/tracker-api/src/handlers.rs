//! REST API endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/objects` | Snapshot of every live object |
//! | `GET` | `/objects/{id}` | Single object |
//! | `POST` | `/api/auth` | Check the shared access code |
//! | `GET` | `/api/config/map` | Bounding box and map center |
//! | `GET` | `/api/status` | Simulation and scheduler counters |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse};
use tracker_types::ObjectId;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/auth`.
#[derive(Debug, serde::Deserialize)]
pub struct AuthRequest {
    /// The access code typed by the user.
    pub code: String,
}

/// JSON status of the running simulation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StatusResponse {
    /// Number of live objects.
    pub objects: usize,
    /// Number of attached event-stream subscribers.
    pub subscribers: usize,
    /// Total events published since start.
    pub events_published: u64,
    /// Whether a scheduler is attached.
    pub scheduler_attached: bool,
    /// Whether the scheduler is paused.
    pub paused: bool,
    /// Ticks that mutated state.
    pub ticks_applied: u64,
    /// Ticks whose target did not resolve.
    pub ticks_skipped: u64,
    /// Seconds since the scheduler started.
    pub uptime_seconds: u64,
    /// ISO 8601 timestamp of when the scheduler started.
    pub started_at: Option<String>,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing server status and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let object_count = state.simulation.object_count().await;
    let subscribers = state.simulation.subscriber_count();
    let events = state.simulation.events_published();
    let center = state.map.center;
    let paused = state.control.as_ref().is_some_and(|c| c.is_paused());
    let status = if paused { "PAUSED" } else { "RUNNING" };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Objects Tracker</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        .status {{ color: #3fb950; font-weight: bold; }}
    </style>
</head>
<body>
    <h1>Objects Tracker</h1>
    <p class="subtitle">Simulated objects moving across Europe</p>

    <p>Status: <span class="status">{status}</span></p>

    <div>
        <div class="metric">
            <div class="label">Objects</div>
            <div class="value">{object_count}</div>
        </div>
        <div class="metric">
            <div class="label">Subscribers</div>
            <div class="value">{subscribers}</div>
        </div>
        <div class="metric">
            <div class="label">Events</div>
            <div class="value">{events}</div>
        </div>
        <div class="metric">
            <div class="label">Map center</div>
            <div class="value">{lat:.1}, {lng:.1}</div>
        </div>
    </div>

    <h2>API Endpoints</h2>
    <ul>
        <li>GET <a href="/objects">/objects</a> -- Snapshot of all objects</li>
        <li>GET <a href="/objects/event">/objects/event</a> -- Live event stream (SSE)</li>
        <li>GET <a href="/api/config/map">/api/config/map</a> -- Bounds and map center</li>
        <li>GET <a href="/api/status">/api/status</a> -- Simulation counters</li>
        <li>POST /api/auth -- Check access code</li>
    </ul>
</body>
</html>"#,
        lat = center.lat,
        lng = center.lng,
    ))
}

// ---------------------------------------------------------------------------
// GET /objects -- snapshot
// ---------------------------------------------------------------------------

/// Return every live object as a JSON array, in creation order.
pub async fn list_objects(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.snapshots.read().await)
}

/// Return a single object by id.
pub async fn get_object(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, ApiError> {
    let object = state
        .simulation
        .get(ObjectId(id))
        .await
        .ok_or_else(|| ApiError::NotFound(format!("object {id}")))?;
    Ok(Json(object))
}

// ---------------------------------------------------------------------------
// POST /api/auth -- placeholder access gate
// ---------------------------------------------------------------------------

/// Check the presented access code.
///
/// This is a shared-code gate in front of the map view, not a security
/// model: the snapshot and stream endpoints stay open.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AuthRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if state.check_access_code(&request.code) {
        Ok(Json(serde_json::json!({ "authenticated": true })))
    } else {
        Err(ApiError::Unauthorized)
    }
}

// ---------------------------------------------------------------------------
// GET /api/config/map
// ---------------------------------------------------------------------------

/// Return the bounding box and map center.
pub async fn map_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.map)
}

// ---------------------------------------------------------------------------
// GET /api/status
// ---------------------------------------------------------------------------

/// Return simulation and scheduler counters.
pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let report = state.control.as_ref().map(|c| c.report()).unwrap_or_default();
    Json(StatusResponse {
        objects: state.simulation.object_count().await,
        subscribers: state.simulation.subscriber_count(),
        events_published: state.simulation.events_published(),
        scheduler_attached: state.control.is_some(),
        paused: state.control.as_ref().is_some_and(|c| c.is_paused()),
        ticks_applied: report.ticks_applied,
        ticks_skipped: report.ticks_skipped,
        uptime_seconds: state.control.as_ref().map_or(0, |c| c.elapsed_seconds()),
        started_at: state.control.as_ref().map(|c| c.started_at().to_rfc3339()),
    })
}
