//! Command processing for the metadata catalog.
//!
//! This crate sits between the (external) query parser and the catalog: it
//! takes structured statements, validates them end-to-end against a catalog
//! snapshot, applies them atomically, notifies the storage engine of
//! physically consequential drops, and renders the JSON result model that
//! clients consume.

pub mod bridge;
pub mod predicate;
pub mod processor;
pub mod response;
pub mod statement;

use seriesdb_catalog::CatalogError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database name required")]
    DatabaseNameRequired,

    #[error("DROP SERIES doesn't support fields in WHERE clause")]
    DropSeriesFieldPredicate,

    #[error("DROP SERIES doesn't support time in WHERE clause")]
    DropSeriesTimePredicate,

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
