//! Axum router construction for the tracker API.
//!
//! Assembles all routes (REST + SSE) into a single [`Router`] with CORS
//! middleware enabled so a map client on another origin can connect.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::operator;
use crate::sse;
use crate::state::AppState;

/// Build the complete Axum router for the tracker server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /objects` -- snapshot of all live objects
/// - `GET /objects/event` -- SSE event stream
/// - `GET /objects/{id}` -- single object
/// - `POST /api/auth` -- access-code check
/// - `GET /api/config/map` -- bounds and map center
/// - `GET /api/status` -- simulation counters
/// - `POST /api/operator/pause` and `/resume` -- scheduler control
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // Objects
        .route("/objects", get(handlers::list_objects))
        .route("/objects/event", get(sse::object_events))
        .route("/objects/{id}", get(handlers::get_object))
        // API
        .route("/api/auth", post(handlers::authenticate))
        .route("/api/config/map", get(handlers::map_config))
        .route("/api/status", get(handlers::status))
        // Operator
        .route("/api/operator/pause", post(operator::pause))
        .route("/api/operator/resume", post(operator::resume))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
