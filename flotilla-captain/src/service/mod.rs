//! Service Module
//!
//! Business logic layer for the captain. Services enforce quotas and
//! lifecycle rules on top of the repositories; HTTP handlers and the
//! control loop both go through here.

pub mod chore;
pub mod crew;
pub mod user;
