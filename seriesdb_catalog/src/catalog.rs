//! Implementation of the catalog that sits entirely in memory.
//!
//! The [`Catalog`] is the single shared mutable structure. Each mutation
//! takes the write lock, validates against the current state, and swaps in
//! a freshly built [`DatabaseSchema`] for the affected database, so readers
//! holding an `Arc` to a schema always see a committed snapshot and
//! mutations to different databases never observe each other mid-flight.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::retention::{RetentionPolicy, RetentionPolicyTable, RetentionPolicyUpdate};
use crate::series::{DroppedSeries, MeasurementMatcher, SeriesIndex, TagSet};
use crate::{CatalogError, Result, ident};

/// The number of committed catalog mutations. Bumped on every successful
/// write, never on a failed validation.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CatalogSequenceNumber(u64);

impl CatalogSequenceNumber {
    pub fn new(n: u64) -> Self {
        Self(n)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct Catalog {
    inner: RwLock<InnerCatalog>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct InnerCatalog {
    /// Databases by name. Name ordering here is what `SHOW DATABASES`
    /// renders, so the map must stay sorted.
    databases: BTreeMap<Arc<str>, Arc<DatabaseSchema>>,
    sequence: CatalogSequenceNumber,
}

/// Everything the catalog knows about one database: its retention policies
/// and its series index. Owned exclusively by the catalog; cloned wholesale
/// for copy-on-write updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSchema {
    pub name: Arc<str>,
    pub retention_policies: RetentionPolicyTable,
    pub series: SeriesIndex,
}

impl DatabaseSchema {
    pub fn new(name: Arc<str>) -> Self {
        Self {
            name,
            retention_policies: RetentionPolicyTable::default(),
            series: SeriesIndex::default(),
        }
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a database with an empty retention policy table and series
    /// index. With `if_not_exists`, an existing database makes this a
    /// no-op success.
    pub fn create_database(&self, name: &str, if_not_exists: bool) -> Result<()> {
        ident::validate_identifier(name)?;
        let mut inner = self.inner.write();
        if inner.databases.contains_key(name) {
            if if_not_exists {
                return Ok(());
            }
            return Err(CatalogError::DatabaseExists);
        }
        let db_name: Arc<str> = Arc::from(name);
        inner.databases.insert(
            Arc::clone(&db_name),
            Arc::new(DatabaseSchema::new(db_name)),
        );
        inner.sequence = inner.sequence.next();
        info!(name, "created database");
        Ok(())
    }

    /// Detach a database and its entire subtree of policies and series.
    /// Returns whether a database was actually removed, so the caller
    /// knows whether to tell the storage engine to reclaim its shards.
    pub fn drop_database(&self, name: &str, if_exists: bool) -> Result<bool> {
        let mut inner = self.inner.write();
        if inner.databases.remove(name).is_none() {
            if if_exists {
                return Ok(false);
            }
            return Err(CatalogError::DatabaseNotFound(name.to_string()));
        }
        inner.sequence = inner.sequence.next();
        info!(name, "dropped database");
        Ok(true)
    }

    /// The committed snapshot for one database, or `None` if it does not
    /// exist.
    pub fn db_schema(&self, name: &str) -> Option<Arc<DatabaseSchema>> {
        self.inner.read().databases.get(name).map(Arc::clone)
    }

    pub fn db_exists(&self, name: &str) -> bool {
        self.inner.read().databases.contains_key(name)
    }

    /// Database names in lexicographic order.
    pub fn list_databases(&self) -> Vec<Arc<str>> {
        self.inner.read().databases.keys().map(Arc::clone).collect()
    }

    pub fn create_retention_policy(
        &self,
        db_name: &str,
        name: &str,
        duration: Duration,
        replica_n: u64,
        default: bool,
    ) -> Result<()> {
        ident::validate_identifier(name)?;
        debug!(db_name, name, "create retention policy");
        self.update_db_schema(db_name, |schema| {
            schema
                .retention_policies
                .create(name, duration, replica_n, default)
        })
    }

    pub fn alter_retention_policy(
        &self,
        db_name: &str,
        name: &str,
        update: RetentionPolicyUpdate,
    ) -> Result<()> {
        debug!(db_name, name, "alter retention policy");
        self.update_db_schema(db_name, |schema| {
            schema.retention_policies.alter(name, update)
        })
    }

    pub fn drop_retention_policy(&self, db_name: &str, name: &str) -> Result<RetentionPolicy> {
        debug!(db_name, name, "drop retention policy");
        self.update_db_schema(db_name, |schema| schema.retention_policies.drop(name))
    }

    /// Retention policies of `db_name` in creation order.
    pub fn retention_policies(&self, db_name: &str) -> Result<Vec<RetentionPolicy>> {
        let schema = self
            .db_schema(db_name)
            .ok_or_else(|| CatalogError::DatabaseNotFound(db_name.to_string()))?;
        Ok(schema.retention_policies.iter().cloned().collect())
    }

    /// Record a series on the write path. Idempotent for an existing tag
    /// set; the write path is the only way series enter the catalog.
    pub fn record_series(&self, db_name: &str, measurement: &str, tags: TagSet) -> Result<()> {
        self.update_db_schema(db_name, |schema| {
            schema.series.record_series(measurement, tags);
            Ok(())
        })
    }

    /// Drop the series selected by `matcher` whose tags pass `filter`, and
    /// report what was dropped for storage reclamation. Matching zero
    /// measurements is a successful no-op.
    pub fn drop_series<F>(
        &self,
        db_name: &str,
        matcher: &MeasurementMatcher,
        filter: F,
    ) -> Result<Vec<DroppedSeries>>
    where
        F: Fn(&TagSet) -> bool,
    {
        debug!(db_name, "drop series");
        self.update_db_schema(db_name, |schema| Ok(schema.series.drop_series(matcher, filter)))
    }

    pub fn sequence_number(&self) -> CatalogSequenceNumber {
        self.inner.read().sequence
    }

    /// Copy-on-write update of one database: validate and mutate a clone
    /// of its schema, then swap it in and bump the sequence. An error from
    /// `update` discards the clone, leaving the catalog untouched.
    fn update_db_schema<T>(
        &self,
        db_name: &str,
        update: impl FnOnce(&mut DatabaseSchema) -> Result<T>,
    ) -> Result<T> {
        let mut inner = self.inner.write();
        let schema = inner
            .databases
            .get(db_name)
            .ok_or_else(|| CatalogError::DatabaseNotFound(db_name.to_string()))?;
        let mut updated = schema.as_ref().clone();
        let out = update(&mut updated)?;
        inner
            .databases
            .insert(Arc::clone(&updated.name), Arc::new(updated));
        inner.sequence = inner.sequence.next();
        Ok(out)
    }
}
