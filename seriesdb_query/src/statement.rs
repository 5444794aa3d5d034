//! The structured command surface handed to the processor by the query
//! parser.
//!
//! Parsing itself is out of scope; the parser delivers statements in this
//! form, with durations already turned into [`Duration`] values and regex
//! measurement matchers already compiled.

use std::time::Duration;

use seriesdb_catalog::retention::RetentionPolicyUpdate;
use seriesdb_catalog::series::MeasurementMatcher;

#[derive(Debug, Clone)]
pub enum Statement {
    CreateDatabase {
        name: String,
        if_not_exists: bool,
    },
    DropDatabase {
        name: String,
        if_exists: bool,
    },
    ShowDatabases,
    CreateRetentionPolicy {
        name: String,
        database: String,
        duration: Duration,
        replica_n: u64,
        default: bool,
    },
    AlterRetentionPolicy {
        name: String,
        database: String,
        update: RetentionPolicyUpdate,
    },
    DropRetentionPolicy {
        name: String,
        database: String,
    },
    ShowRetentionPolicies {
        database: String,
    },
    /// `DROP SERIES FROM <measurement>|/regex/ [WHERE <condition>]`. The
    /// target database comes from the request context.
    DropSeries {
        from: MeasurementMatcher,
        condition: Option<Expr>,
    },
    ShowSeries,
}

/// Minimal expression tree for `WHERE` conditions on `DROP SERIES`.
#[derive(Debug, Clone)]
pub enum Expr {
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// A bare identifier reference: a tag key, a field name, or `time`.
    VarRef(String),
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Literal(Literal),
}

impl Expr {
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self::VarRef(name.into())
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::Call {
            name: name.into(),
            args,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal(Literal::String(value.into()))
    }

    pub fn number(value: f64) -> Self {
        Self::Literal(Literal::Number(value))
    }

    pub fn duration(value: Duration) -> Self {
        Self::Literal(Literal::Duration(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Boolean(bool),
    Duration(Duration),
}
