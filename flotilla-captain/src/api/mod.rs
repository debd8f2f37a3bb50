//! API Module
//!
//! HTTP API layer for the captain. Each submodule handles endpoints for
//! a specific domain; handlers acquire the document locks only for the
//! duration of their mutation and never hold one across a sailor RPC.

pub mod chore;
pub mod crew;
pub mod error;
pub mod user;

use std::sync::Arc;

use axum::{
    Json,
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use flotilla_client::SailorApi;

use crate::config::Config;
use crate::store::Store;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub client: Arc<dyn SailorApi>,
    pub config: Arc<Config>,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        // Crew endpoints
        .route("/crew", get(crew::list_crew))
        .route("/api/crew/", get(crew::list_crew))
        .route("/prereg", post(crew::preregister_sailor))
        .route("/rmsailor", post(crew::remove_sailor))
        .route("/heartbeat", post(crew::heartbeat))
        // Chore endpoints
        .route("/chore", post(chore::submit_chore))
        .route("/cancel", post(chore::cancel_chore))
        .route("/api/chores/", get(chore::list_chores))
        .route("/me/chores", get(chore::list_owned_chores))
        // User endpoints
        .route("/users", get(user::list_users))
        .route("/user-set", post(user::upsert_user))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// GET /
/// Basic liveness answer for probes and CLI discovery checks.
async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "ok": true,
        "message": "Captain is running",
        "endpoints": ["/crew", "/api/chores/", "/chore", "/cancel", "/users"],
    }))
}
