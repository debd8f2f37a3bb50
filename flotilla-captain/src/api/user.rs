//! User API Handlers
//!
//! HTTP endpoints for the user quota registry.

use axum::{Json, extract::State};

use flotilla_core::domain::user::User;
use flotilla_core::dto::Ack;
use flotilla_core::dto::user::UpsertUser;

use crate::api::AppState;
use crate::api::error::ApiResult;
use crate::service::user as user_service;

/// GET /users
/// List all users
pub async fn list_users(State(state): State<AppState>) -> Json<Vec<User>> {
    Json(user_service::list(&state.store).await)
}

/// POST /user-set
/// Create or update a user record
pub async fn upsert_user(
    State(state): State<AppState>,
    Json(req): Json<UpsertUser>,
) -> ApiResult<Json<Ack>> {
    tracing::info!("Upserting user: {}", req.uid);

    user_service::upsert(&state.store, req).await?;

    Ok(Json(Ack::ok()))
}
