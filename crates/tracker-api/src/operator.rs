//! Operator REST API handlers for runtime scheduler control.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/operator/pause` | Discard scheduler ticks |
//! | `POST` | `/api/operator/resume` | Resume dispatching ticks |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use tracing::info;
use tracker_core::scheduler::SchedulerControl;

use crate::error::ApiError;
use crate::state::AppState;

/// Pause the scheduler. Timers keep running; their ticks are discarded.
pub async fn pause(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let control = require_control(&state)?;
    control.pause();
    info!("Scheduler paused by operator");
    Ok(Json(serde_json::json!({ "paused": true })))
}

/// Resume the scheduler.
pub async fn resume(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let control = require_control(&state)?;
    control.resume();
    info!("Scheduler resumed by operator");
    Ok(Json(serde_json::json!({ "paused": false })))
}

fn require_control(state: &AppState) -> Result<&Arc<SchedulerControl>, ApiError> {
    state
        .control
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable(String::from("no scheduler attached")))
}
