//! Flotilla Core
//!
//! Core types and abstractions for the Flotilla chore scheduler.
//!
//! This crate contains:
//! - Domain types: Core business entities (Sailor, Chore, User)
//! - DTOs: Data transfer objects for the captain API and the sailor contract
//! - The `DD-hh:mm:ss` duration codec used for time limits

pub mod domain;
pub mod dto;
pub mod duration;

/// Current unix time in whole seconds.
///
/// All persisted timestamps (`last_seen`, `submit_time`, ...) are unix
/// seconds, so this is the only clock the captain uses.
pub fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}
