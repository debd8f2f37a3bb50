//! Crew repository
//!
//! Sailors are keyed by name; the BTreeMap keeps crew listings and the
//! matcher's sailor order deterministic.

use flotilla_core::domain::sailor::Sailor;

use crate::store::{CrewDoc, Store};

pub async fn find(store: &Store, name: &str) -> Option<Sailor> {
    store.crew.with_read(|doc| doc.get(name).cloned()).await
}

pub async fn contains(store: &Store, name: &str) -> bool {
    store.crew.with_read(|doc| doc.contains_key(name)).await
}

/// All sailors in ascending name order.
pub async fn list(store: &Store) -> Vec<Sailor> {
    store.crew.with_read(|doc| doc.values().cloned().collect()).await
}

/// Books resources against a sailor when a chore is assigned to it.
pub fn book_usage(doc: &mut CrewDoc, sailor: &str, cpus: u32, gpus: u32) {
    if let Some(s) = doc.get_mut(sailor) {
        s.used_cpus += cpus;
        s.used_gpus += gpus;
    }
}

/// Releases resources when a chore leaves a sailor. Bookkeeping only:
/// the next heartbeat carries the authoritative counters.
pub fn release_usage(doc: &mut CrewDoc, sailor: &str, cpus: u32, gpus: u32) {
    if let Some(s) = doc.get_mut(sailor) {
        s.used_cpus = s.used_cpus.saturating_sub(cpus);
        s.used_gpus = s.used_gpus.saturating_sub(gpus);
    }
}
