//! Chore API Handlers
//!
//! HTTP endpoints for chore submission, cancellation, and listing.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use flotilla_core::domain::chore::Chore;
use flotilla_core::dto::Ack;
use flotilla_core::dto::chore::{CancelChore, SubmitChore, SubmitReply};

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::service::chore as chore_service;

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub owner: Option<String>,
}

/// POST /chore
/// Submit a chore; 403 when the owner's chores limit is exhausted
pub async fn submit_chore(
    State(state): State<AppState>,
    Json(req): Json<SubmitChore>,
) -> ApiResult<Json<SubmitReply>> {
    tracing::info!("Chore submission from owner: {}", req.owner);

    let chore = chore_service::submit(&state.store, req).await?;

    Ok(Json(SubmitReply {
        chore_id: chore.chore_id,
    }))
}

/// POST /cancel
/// Cancel a chore; delivery to the sailor is best-effort
pub async fn cancel_chore(
    State(state): State<AppState>,
    Json(req): Json<CancelChore>,
) -> ApiResult<Json<Ack>> {
    tracing::info!("Cancel requested for chore: {}", req.chore_id);

    chore_service::cancel(
        &state.store,
        state.client.as_ref(),
        req.chore_id,
        req.reason,
    )
    .await?;

    Ok(Json(Ack::ok()))
}

/// GET /api/chores/
/// List chores, optionally filtered with ?owner=<uid>
pub async fn list_chores(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Json<Vec<Chore>> {
    Json(chore_service::list(&state.store, query.owner.as_deref()).await)
}

/// GET /me/chores?owner=<uid>
/// List one owner's chores; the owner query is required here
pub async fn list_owned_chores(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> ApiResult<Json<Vec<Chore>>> {
    let owner = query
        .owner
        .ok_or_else(|| ApiError::BadRequest("owner query parameter required".to_string()))?;

    Ok(Json(chore_service::list(&state.store, Some(&owner)).await))
}
