//! Chore repository
//!
//! Chores are keyed by their id rendered as a decimal string; ids are
//! allocated monotonically above a nine-digit floor so they sort and
//! display uniformly.

use flotilla_core::domain::chore::{CHORE_ID_FLOOR, Chore};

use crate::store::{ChoresDoc, Store};

/// Document key for a chore id.
pub fn key(chore_id: u64) -> String {
    chore_id.to_string()
}

/// Next chore id: one above the largest ever allocated, never below the
/// floor. Terminal chores still count, so ids are unique across history.
pub fn allocate_id(doc: &ChoresDoc) -> u64 {
    doc.values()
        .map(|chore| chore.chore_id + 1)
        .max()
        .unwrap_or(CHORE_ID_FLOOR)
        .max(CHORE_ID_FLOOR)
}

pub fn insert(doc: &mut ChoresDoc, chore: Chore) {
    doc.insert(key(chore.chore_id), chore);
}

/// Number of active chores owned by `owner`.
pub fn active_count(doc: &ChoresDoc, owner: &str) -> usize {
    doc.values()
        .filter(|chore| chore.owner == owner && chore.status.is_active())
        .count()
}

/// All chores, optionally filtered by owner, in ascending id order.
pub async fn list(store: &Store, owner: Option<&str>) -> Vec<Chore> {
    let mut chores: Vec<Chore> = store
        .chores
        .with_read(|doc| {
            doc.values()
                .filter(|chore| owner.is_none_or(|uid| chore.owner == uid))
                .cloned()
                .collect()
        })
        .await;
    chores.sort_by_key(|chore| chore.chore_id);
    chores
}
