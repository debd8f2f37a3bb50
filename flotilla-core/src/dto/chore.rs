//! Chore DTOs
//!
//! Bodies for chore submission and cancellation. `CancelChore` doubles as
//! the captain→sailor cancel body, so a re-sent cancel is always shaped
//! the same on both hops.

use serde::{Deserialize, Serialize};

use crate::domain::chore::ChoreRequest;

/// Request to submit a chore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitChore {
    /// Owner UID as a string key
    pub owner: String,

    /// Absolute path of the shell script to run
    pub script: String,

    #[serde(default)]
    pub configuration: ChoreRequest,
}

/// Reply to a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReply {
    pub chore_id: u64,
}

/// Request to cancel a chore. Idempotent on the sailor side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelChore {
    pub chore_id: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
