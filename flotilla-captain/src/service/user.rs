//! User Service
//!
//! Upsert and listing of quota records, plus the time-budget overage
//! computation the control loop's user sweep runs.

use flotilla_core::domain::chore::Chore;
use flotilla_core::domain::user::User;
use flotilla_core::dto::user::UpsertUser;
use flotilla_core::duration;

use crate::repository::users as user_repository;
use crate::store::{Store, StoreError};

/// Service error type
#[derive(Debug)]
pub enum UserError {
    ValidationError(String),
    StoreError(StoreError),
}

impl From<StoreError> for UserError {
    fn from(err: StoreError) -> Self {
        UserError::StoreError(err)
    }
}

/// Create or update a user record. Fields not supplied keep their
/// stored values.
pub async fn upsert(store: &Store, req: UpsertUser) -> Result<User, UserError> {
    if req.uid.trim().is_empty() {
        return Err(UserError::ValidationError("uid cannot be empty".to_string()));
    }

    if let Some(time_limit) = &req.time_limit {
        duration::parse(time_limit)
            .map_err(|err| UserError::ValidationError(err.to_string()))?;
    }

    let user = store
        .users
        .with_lock(|doc| {
            let user = doc.entry(req.uid.clone()).or_insert_with(|| User {
                uid: req.uid.clone(),
                name: None,
                chores_limit: 0,
                time_limit: None,
                notes: None,
            });
            if let Some(name) = req.name.clone() {
                user.name = Some(name);
            }
            if let Some(limit) = req.chores_limit {
                user.chores_limit = limit;
            }
            if let Some(time_limit) = req.time_limit.clone() {
                user.time_limit = Some(time_limit);
            }
            if let Some(notes) = req.notes.clone() {
                user.notes = Some(notes);
            }
            user.clone()
        })
        .await?;

    tracing::info!("User {} updated", user.uid);

    Ok(user)
}

/// List all users in ascending UID order.
pub async fn list(store: &Store) -> Vec<User> {
    user_repository::list(store).await
}

/// Chores to cancel so the owner's cumulative active time falls back
/// within `limit_secs`.
///
/// Every active chore counts for `now - (start_time ?? submit_time)`
/// seconds. While the total exceeds the budget the newest-submitted
/// chores are selected, so long-running work survives a burst of fresh
/// submissions.
pub fn excess_by_time(chores: &[Chore], owner: &str, limit_secs: u64, now: i64) -> Vec<u64> {
    if limit_secs == duration::UNLIMITED {
        return Vec::new();
    }

    let mut active: Vec<(&Chore, u64)> = chores
        .iter()
        .filter(|chore| chore.owner == owner && chore.status.is_active())
        .map(|chore| {
            let since = chore.start_time.unwrap_or(chore.submit_time);
            (chore, (now - since).max(0) as u64)
        })
        .collect();

    // Newest submissions first; chore ids break submit-second ties.
    active.sort_by(|a, b| {
        (b.0.submit_time, b.0.chore_id).cmp(&(a.0.submit_time, a.0.chore_id))
    });

    let mut total: u64 = active.iter().map(|(_, secs)| secs).sum();
    let mut excess = Vec::new();
    for (chore, secs) in active {
        if total <= limit_secs {
            break;
        }
        excess.push(chore.chore_id);
        total -= secs;
    }
    excess
}
