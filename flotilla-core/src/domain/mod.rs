//! Core domain types
//!
//! This module contains the core domain structures used across Flotilla
//! services. These types represent the fundamental business entities and are
//! shared between the captain (which persists them) and its clients.

pub mod chore;
pub mod sailor;
pub mod user;
