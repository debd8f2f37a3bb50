//! Chore domain types
//!
//! A chore is a user-submitted shell task with a resource request and an
//! owner. Its lifecycle is driven by the captain's control loop and by
//! sailor heartbeats; every transition goes through [`ChoreStatus::can_transition`].

use serde::{Deserialize, Serialize};

/// Reason set on freshly submitted chores until a sailor is found.
pub const REASON_NO_SAILOR: &str = "no available sailor";
/// Default reason for a user-initiated cancel.
pub const REASON_CANCELED_BY_USER: &str = "canceled by user";
/// Reason when a chore outlives its sailor's per-chore time limit.
pub const REASON_TIME_LIMIT: &str = "exceeded time limit";
/// Reason when a user's cumulative active time budget is exhausted.
pub const REASON_USER_TIME_LIMIT: &str = "exceeded user time limit";
/// Reason when the assigned sailor stops heartbeating or is removed.
pub const REASON_SAILOR_LOST: &str = "sailor lost";

/// Smallest chore id the captain ever hands out (nine-digit display).
pub const CHORE_ID_FLOOR: u64 = 100_000_000;

/// Resource request attached to a chore at submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChoreRequest {
    /// Required capability tag, if any (e.g. "GPU")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,

    /// Explicitly requested sailor name, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sailor: Option<String>,

    #[serde(default)]
    pub cpus: u32,
    #[serde(default)]
    pub gpus: u32,

    /// Output file path on the sailor side
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out: Option<String>,

    /// Working directory on the sailor side
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wd: Option<String>,
}

/// Chore execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChoreStatus {
    Pending,
    Assigned,
    Running,
    Completed,
    Failed,
    Canceled,
}

impl ChoreStatus {
    /// A chore is active while it still occupies (or may come to occupy)
    /// sailor resources.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            ChoreStatus::Pending | ChoreStatus::Assigned | ChoreStatus::Running
        )
    }

    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }

    /// Returns true iff moving from `self` to `to` is a legal lifecycle
    /// step. Terminal statuses never transition again.
    pub fn can_transition(self, to: ChoreStatus) -> bool {
        match (self, to) {
            (ChoreStatus::Pending, ChoreStatus::Assigned) => true,
            (ChoreStatus::Assigned, ChoreStatus::Running) => true,
            (ChoreStatus::Assigned | ChoreStatus::Running, ChoreStatus::Completed) => true,
            (ChoreStatus::Assigned | ChoreStatus::Running, ChoreStatus::Failed) => true,
            (from, ChoreStatus::Canceled) => from.is_active(),
            _ => false,
        }
    }
}

impl std::fmt::Display for ChoreStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChoreStatus::Pending => "PENDING",
            ChoreStatus::Assigned => "ASSIGNED",
            ChoreStatus::Running => "RUNNING",
            ChoreStatus::Completed => "COMPLETED",
            ChoreStatus::Failed => "FAILED",
            ChoreStatus::Canceled => "CANCELED",
        };
        write!(f, "{}", s)
    }
}

/// A user-submitted shell task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chore {
    /// Unique, monotonically assigned id
    pub chore_id: u64,

    /// Owner UID as a string key
    pub owner: String,

    /// Absolute path of the shell script, visible to the assigned sailor
    pub script: String,

    pub configuration: ChoreRequest,

    pub status: ChoreStatus,

    /// Name of the assigned sailor, once matched
    #[serde(default)]
    pub sailor: Option<String>,

    /// Process id reported by the sailor, once running
    #[serde(default)]
    pub pid: Option<u32>,

    /// Latest non-success explanation ("no available sailor", "sailor
    /// lost", ...); cleared on assignment
    #[serde(default)]
    pub reason: Option<String>,

    pub submit_time: i64,
    #[serde(default)]
    pub assign_time: Option<i64>,
    #[serde(default)]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub end_time: Option<i64>,

    /// Free-form latest status line from the sailor
    #[serde(default)]
    pub infos: Option<String>,
}

impl Chore {
    /// Creates a freshly submitted chore in PENDING with the standard
    /// "no available sailor" reason.
    pub fn new(
        chore_id: u64,
        owner: String,
        script: String,
        configuration: ChoreRequest,
        now: i64,
    ) -> Self {
        Self {
            chore_id,
            owner,
            script,
            configuration,
            status: ChoreStatus::Pending,
            sailor: None,
            pid: None,
            reason: Some(REASON_NO_SAILOR.to_string()),
            submit_time: now,
            assign_time: None,
            start_time: None,
            end_time: None,
            infos: None,
        }
    }

    /// Instant the chore started consuming wall-clock on its sailor:
    /// actual run start when known, otherwise the assignment instant,
    /// otherwise submission.
    pub fn active_since(&self) -> i64 {
        self.start_time
            .or(self.assign_time)
            .unwrap_or(self.submit_time)
    }
}
