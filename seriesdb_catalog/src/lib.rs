//! In-memory metadata catalog for a time-series database.
//!
//! The catalog is the authoritative record of which databases exist, which
//! retention policies they carry, and which series (measurement plus tag
//! set) have been written. It is distinct from the storage engine that owns
//! the physical point data: the catalog commits a mutation first, and the
//! storage layer is told about physically consequential changes afterwards.
//!
//! All mutations validate end-to-end before touching catalog state, so a
//! failed command is indistinguishable from a no-op and concurrent readers
//! never observe a partially applied change.

pub mod catalog;
pub mod duration;
pub mod ident;
pub mod retention;
pub mod series;

use thiserror::Error;

use crate::duration::format_duration;
use crate::ident::IdentError;
use crate::retention::MIN_RETENTION_POLICY_DURATION;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("database already exists")]
    DatabaseExists,

    #[error("database not found: {0}")]
    DatabaseNotFound(String),

    #[error("retention policy already exists")]
    RetentionPolicyExists,

    #[error("retention policy not found")]
    RetentionPolicyNotFound,

    #[error("retention policy is default")]
    RetentionPolicyIsDefault,

    #[error(
        "retention policy duration must be at least {}",
        format_duration(MIN_RETENTION_POLICY_DURATION)
    )]
    RetentionPolicyDurationTooShort,

    #[error(transparent)]
    InvalidIdentifier(#[from] IdentError),
}

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;
