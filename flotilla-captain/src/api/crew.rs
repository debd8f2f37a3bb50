//! Crew API Handlers
//!
//! HTTP endpoints for crew listing, sailor administration, and the
//! inbound heartbeat.

use axum::{Json, extract::State};

use flotilla_core::dto::Ack;
use flotilla_core::dto::crew::{
    Heartbeat, HeartbeatReply, PreregisterSailor, RemoveSailor, SailorView,
};

use crate::api::AppState;
use crate::api::error::ApiResult;
use crate::service::crew as crew_service;

/// GET /crew (also /api/crew/)
/// List sailors with their derived status
pub async fn list_crew(State(state): State<AppState>) -> Json<Vec<SailorView>> {
    let deadline = state.config.heartbeat_deadline_secs();
    Json(crew_service::list(&state.store, deadline).await)
}

/// POST /prereg
/// Preregister a sailor (admin action)
pub async fn preregister_sailor(
    State(state): State<AppState>,
    Json(req): Json<PreregisterSailor>,
) -> ApiResult<Json<Ack>> {
    tracing::info!("Preregistering sailor: {}", req.name);

    crew_service::preregister(&state.store, req).await?;

    Ok(Json(Ack::ok()))
}

/// POST /rmsailor
/// Remove a sailor from the crew (admin action)
pub async fn remove_sailor(
    State(state): State<AppState>,
    Json(req): Json<RemoveSailor>,
) -> ApiResult<Json<Ack>> {
    tracing::info!("Removing sailor: {}", req.name);

    crew_service::remove(&state.store, &req.name).await?;

    Ok(Json(Ack::ok()))
}

/// POST /heartbeat
/// Sailor → captain liveness and state report; the reply carries the
/// work queued for the reporting sailor
pub async fn heartbeat(
    State(state): State<AppState>,
    Json(req): Json<Heartbeat>,
) -> ApiResult<Json<HeartbeatReply>> {
    tracing::debug!("Heartbeat from sailor: {}", req.name);

    let reply = crew_service::heartbeat(&state.store, req).await?;

    Ok(Json(reply))
}
