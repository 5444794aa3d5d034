//! Interface to the storage engine for physical reclamation.
//!
//! The catalog is the source of truth for what exists; the bridge is told
//! about physically consequential drops strictly after the catalog change
//! has committed. Notifications are fire-and-forget: a storage-side
//! failure never rolls the catalog back, and reclamation may still be in
//! flight when a client recreates a database of the same name.

use std::sync::Arc;

pub trait StorageBridge: std::fmt::Debug + Send + Sync {
    /// A database and its entire subtree were removed from the catalog.
    fn on_database_dropped(&self, database: &str);

    /// Series were removed from one measurement of `database`.
    fn on_series_dropped(&self, database: &str, measurement: &str, keys: &[Arc<str>]);
}

/// Bridge that ignores every notification, for catalogs running without a
/// storage engine attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStorageBridge;

impl StorageBridge for NoopStorageBridge {
    fn on_database_dropped(&self, _database: &str) {}

    fn on_series_dropped(&self, _database: &str, _measurement: &str, _keys: &[Arc<str>]) {}
}
