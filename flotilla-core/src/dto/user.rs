//! User DTOs

use serde::{Deserialize, Serialize};

/// Request to create or update a user record. Fields left out keep
/// their stored values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertUser {
    pub uid: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chores_limit: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
