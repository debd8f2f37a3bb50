//! Chore Service
//!
//! Submission, cancellation, and listing. The quota check and the
//! insert happen under the same chores lock, so a user can never slip
//! past `chores_limit` by submitting concurrently.

use flotilla_client::SailorApi;
use flotilla_core::domain::chore::{Chore, ChoreStatus, REASON_CANCELED_BY_USER};
use flotilla_core::dto::chore::SubmitChore;
use flotilla_core::now_ts;

use crate::repository::{chores as chore_repository, crew as crew_repository, users as user_repository};
use crate::store::{Store, StoreError};

/// Service error type
#[derive(Debug)]
pub enum ChoreError {
    NotFound(u64),
    InvalidState(String),
    QuotaExceeded(String),
    ValidationError(String),
    StoreError(StoreError),
}

impl From<StoreError> for ChoreError {
    fn from(err: StoreError) -> Self {
        ChoreError::StoreError(err)
    }
}

/// Submit a new chore.
///
/// Validates the request, enforces the owner's `chores_limit`, allocates
/// the next id, and persists the chore in PENDING.
pub async fn submit(store: &Store, req: SubmitChore) -> Result<Chore, ChoreError> {
    validate_submit(&req)?;

    // An explicitly requested sailor must exist; a typo'd name would
    // otherwise queue forever.
    if let Some(name) = &req.configuration.sailor {
        if !crew_repository::contains(store, name).await {
            return Err(ChoreError::ValidationError(format!(
                "unknown sailor: {}",
                name
            )));
        }
    }

    // Absent user record means unlimited.
    let limit = user_repository::find(store, &req.owner)
        .await
        .map(|user| user.chores_limit)
        .unwrap_or(0);

    let now = now_ts();
    let chore = store
        .chores
        .with_lock(|doc| {
            if limit > 0 {
                let active = chore_repository::active_count(doc, &req.owner);
                if active >= limit as usize {
                    return Err(ChoreError::QuotaExceeded(format!(
                        "user chores limit reached ({}/{})",
                        active, limit
                    )));
                }
            }

            let chore = Chore::new(
                chore_repository::allocate_id(doc),
                req.owner.clone(),
                req.script.clone(),
                req.configuration.clone(),
                now,
            );
            chore_repository::insert(doc, chore.clone());
            Ok(chore)
        })
        .await??;

    tracing::info!("Chore {} submitted by {}", chore.chore_id, chore.owner);

    Ok(chore)
}

/// Cancel a chore.
///
/// The chore is transitioned to CANCELED locally first; telling the
/// sailor is best-effort, and an unanswered cancel is redelivered
/// through the sailor's next heartbeat reply.
pub async fn cancel(
    store: &Store,
    client: &dyn SailorApi,
    chore_id: u64,
    reason: Option<String>,
) -> Result<Chore, ChoreError> {
    let now = now_ts();
    let reason = reason.unwrap_or_else(|| REASON_CANCELED_BY_USER.to_string());

    let canceled = store
        .chores
        .with_lock(|doc| {
            let chore = doc
                .get_mut(&chore_repository::key(chore_id))
                .ok_or(ChoreError::NotFound(chore_id))?;

            if !chore.status.can_transition(ChoreStatus::Canceled) {
                return Err(ChoreError::InvalidState(format!(
                    "cannot cancel chore {} in state {}",
                    chore_id, chore.status
                )));
            }

            chore.status = ChoreStatus::Canceled;
            chore.reason = Some(reason.clone());
            chore.end_time = Some(now);
            Ok(chore.clone())
        })
        .await??;

    tracing::info!("Chore {} canceled: {}", chore_id, reason);

    if let Some(sailor_name) = &canceled.sailor {
        let cpus = canceled.configuration.cpus;
        let gpus = canceled.configuration.gpus;
        store
            .crew
            .with_lock(|doc| crew_repository::release_usage(doc, sailor_name, cpus, gpus))
            .await?;

        // Best-effort delivery after every lock is released.
        if let Some(sailor) = crew_repository::find(store, sailor_name).await {
            if let Err(err) = client.cancel(&sailor, chore_id, &reason).await {
                tracing::warn!(
                    "Failed to deliver cancel of chore {} to {}: {}",
                    chore_id,
                    sailor_name,
                    err
                );
            }
        }
    }

    Ok(canceled)
}

/// List chores, optionally restricted to one owner.
pub async fn list(store: &Store, owner: Option<&str>) -> Vec<Chore> {
    chore_repository::list(store, owner).await
}

fn validate_submit(req: &SubmitChore) -> Result<(), ChoreError> {
    if req.owner.trim().is_empty() {
        return Err(ChoreError::ValidationError(
            "owner cannot be empty".to_string(),
        ));
    }

    if req.script.trim().is_empty() {
        return Err(ChoreError::ValidationError(
            "script cannot be empty".to_string(),
        ));
    }

    Ok(())
}
