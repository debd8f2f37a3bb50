//! User quota record
//!
//! Users are administered out-of-band; a missing record means default
//! (unlimited) limits.

use serde::{Deserialize, Serialize};

use crate::duration;

/// Per-user limits, keyed by UID string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub uid: String,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Maximum number of simultaneously active chores; 0 means unlimited
    #[serde(default)]
    pub chores_limit: u32,

    /// Cumulative active-time budget (`DD-hh:mm:ss`); empty or zero
    /// means unlimited
    #[serde(default)]
    pub time_limit: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,
}

impl User {
    /// Time budget in seconds; 0 means unlimited. An unparsable stored
    /// value is treated as unlimited rather than blocking the sweep.
    pub fn time_limit_secs(&self) -> u64 {
        self.time_limit
            .as_deref()
            .and_then(|s| duration::parse(s).ok())
            .unwrap_or(duration::UNLIMITED)
    }
}
