//! Data Transfer Objects for the captain API and the sailor contract
//!
//! This module contains the request and reply bodies exchanged over HTTP:
//! user-facing captain endpoints, admin endpoints, and the inbound
//! heartbeat whose reply carries queued work for the reporting sailor.

pub mod chore;
pub mod crew;
pub mod user;

use serde::{Deserialize, Serialize};

/// Plain `{ok: true}` acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}
