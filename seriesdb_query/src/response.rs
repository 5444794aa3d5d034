//! The JSON result model rendered to clients.
//!
//! Every response is `{"results": [...]}` with one element per statement.
//! The distinction between an omitted `series` array, a series block with
//! no rows, and a series block with rows is part of the wire contract:
//! `SHOW SERIES` over an empty database renders `{}`, while
//! `SHOW DATABASES` over an empty catalog renders a columns-only block.
//! The `skip_serializing_if` attributes below are what carry that
//! tri-state; do not replace them with empty collections.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// The full response to a batch of statements.
#[derive(Debug, Serialize, Default)]
pub struct QueryResponse {
    pub results: Vec<StatementResult>,
}

/// The outcome of one statement: nothing, a series list, or an error.
#[derive(Debug, Serialize, Default)]
pub struct StatementResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<Vec<Series>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatementResult {
    /// A contentless success, rendered as `{}`.
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn with_series(series: Vec<Series>) -> Self {
        Self {
            series: Some(series),
            ..Default::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }
}

/// One rendered block of rows, usually per measurement. `name` is omitted
/// for listings that have no per-block identity (retention policies), and
/// `values` is omitted when the block has columns but no rows.
#[derive(Debug, Serialize, Clone)]
pub struct Series {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Row>,
}

/// A single row in a series block.
#[derive(Debug, Serialize, Clone)]
pub struct Row(pub Vec<Value>);
