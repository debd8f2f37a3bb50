//! User repository

use flotilla_core::domain::user::User;

use crate::store::Store;

pub async fn find(store: &Store, uid: &str) -> Option<User> {
    store.users.with_read(|doc| doc.get(uid).cloned()).await
}

/// All users in ascending UID order.
pub async fn list(store: &Store) -> Vec<User> {
    store.users.with_read(|doc| doc.values().cloned().collect()).await
}
