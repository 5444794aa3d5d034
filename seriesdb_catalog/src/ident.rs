//! Validation of database, retention policy, and measurement names.
//!
//! A name is accepted only if the query language could spell it as an
//! unquoted identifier: a leading letter or underscore, alphanumerics or
//! underscores after that, and not a reserved word. The error text is part
//! of the external contract and is rendered verbatim to clients.

use thiserror::Error;

/// Words the query language reserves; none of them may be used as an
/// unquoted identifier.
const RESERVED_WORDS: &[&str] = &[
    "ALL",
    "ALTER",
    "AND",
    "AS",
    "ASC",
    "BEGIN",
    "BY",
    "CONTINUOUS",
    "CREATE",
    "DATABASE",
    "DATABASES",
    "DEFAULT",
    "DELETE",
    "DESC",
    "DROP",
    "DURATION",
    "END",
    "EXISTS",
    "EXPLAIN",
    "FIELD",
    "FROM",
    "GRANT",
    "GROUP",
    "IF",
    "IN",
    "INNER",
    "INSERT",
    "INTO",
    "KEY",
    "KEYS",
    "LIMIT",
    "MEASUREMENT",
    "MEASUREMENTS",
    "NOT",
    "OFFSET",
    "ON",
    "OR",
    "ORDER",
    "PASSWORD",
    "POLICIES",
    "POLICY",
    "PRIVILEGES",
    "QUERIES",
    "QUERY",
    "READ",
    "REPLICATION",
    "RETENTION",
    "REVOKE",
    "SELECT",
    "SERIES",
    "SHOW",
    "TAG",
    "TO",
    "USER",
    "USERS",
    "VALUES",
    "WHERE",
    "WITH",
    "WRITE",
];

/// Error produced when a name is not a valid identifier.
///
/// Positions are 1-based and relative to the start of the identifier; a
/// caller that knows where the identifier sat in a larger statement can
/// offset them before rendering.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("found {found}, expected identifier at line {line}, char {column}")]
pub struct IdentError {
    pub found: String,
    pub line: usize,
    pub column: usize,
}

/// Validate `name` against the identifier grammar. No side effects.
pub fn validate_identifier(name: &str) -> Result<(), IdentError> {
    let mut chars = name.chars().enumerate();
    match chars.next() {
        None => {
            return Err(IdentError {
                found: "EOF".to_string(),
                line: 1,
                column: 1,
            });
        }
        Some((_, c)) if !(c.is_ascii_alphabetic() || c == '_') => {
            return Err(IdentError {
                found: c.to_string(),
                line: 1,
                column: 1,
            });
        }
        Some(_) => {}
    }
    for (i, c) in chars {
        if !(c.is_ascii_alphanumeric() || c == '_') {
            return Err(IdentError {
                found: c.to_string(),
                line: 1,
                column: i + 1,
            });
        }
    }
    if let Some(word) = RESERVED_WORDS
        .iter()
        .find(|word| name.eq_ignore_ascii_case(word))
    {
        return Err(IdentError {
            found: (*word).to_string(),
            line: 1,
            column: 1,
        });
    }
    Ok(())
}
