//! Error types for the query engine.
//!
//! Errors are grouped by concern: clause construction, text escaping,
//! registry building, sanitizer configuration and configuration loading.
//! [`QueryError`] wraps all of them for callers that want a single type.
//!
//! User-supplied bad values are never reported through these types; they are
//! collected into a [`MessageSet`](crate::message::MessageSet) instead.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// Top-level error type for query engine operations.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Clause or operand construction errors
    #[error(transparent)]
    Clause(#[from] ClauseError),

    /// String escaping and decoding errors
    #[error(transparent)]
    Escape(#[from] EscapeError),

    /// Search handler registry errors
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Sanitizer configuration errors
    #[error(transparent)]
    Sanitize(#[from] SanitizeError),

    /// Configuration loading errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A form field has no registered clause names.
    #[error("no JQL clause is registered for field '{field_id}'")]
    UnknownField { field_id: String },
}

/// Invariant violations raised while constructing clauses and operands.
///
/// Apart from `UnknownOperator`, these indicate programmer errors rather than
/// bad user input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClauseError {
    /// An AND or OR clause was built without children.
    #[error("{kind} clause requires at least one child clause")]
    NoChildren { kind: &'static str },

    /// A terminal or history clause was built with an empty name.
    #[error("clause name must not be empty")]
    EmptyName,

    /// A multi-value operand was built without values.
    #[error("multi-value operand requires at least one value")]
    EmptyMultiValue,

    /// A function operand was built with an empty name.
    #[error("function name must not be empty")]
    EmptyFunctionName,

    /// A function operand was given an empty argument.
    #[error("argument {index} of function '{function}' must not be empty")]
    EmptyFunctionArgument { function: String, index: usize },

    /// A history predicate conjunction was built without children.
    #[error("history predicate conjunction requires at least one predicate")]
    EmptyPredicate,

    /// Operator text did not match any known operator.
    #[error("unknown operator '{operator}'")]
    UnknownOperator { operator: String },
}

/// Errors raised while decoding escaped query text.
///
/// Each variant carries the offending substring so callers can report it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EscapeError {
    /// The text ends with a lone backslash.
    #[error("unterminated escape sequence '\\' at position {position}")]
    UnterminatedEscape { position: usize },

    /// A backslash is followed by a character that is not a known escape.
    #[error("illegal escape sequence '{sequence}' at position {position}")]
    IllegalEscape { sequence: String, position: usize },

    /// A `\u` escape is not followed by exactly four hex digits.
    #[error("malformed unicode escape '{sequence}' at position {position}")]
    MalformedUnicodeEscape { sequence: String, position: usize },
}

/// Errors raised while building the search handler registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two system registrations claimed the same JQL clause name.
    #[error(
        "two system clauses are trying to register against the same JQL name '{clause_name}': existing '{existing}', new '{new}'"
    )]
    DuplicateSystemClause {
        clause_name: String,
        existing: String,
        new: String,
    },
}

/// Errors raised while configuring sanitizers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SanitizeError {
    /// A required lookup collaborator was not supplied.
    #[error("literal sanitizer '{sanitizer}' has no {collaborator} configured")]
    MissingCollaborator {
        sanitizer: String,
        collaborator: &'static str,
    },
}

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration from '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for the expected shape.
    #[error("failed to parse configuration from '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configuration parsed but is semantically invalid.
    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

/// Result alias for query engine operations.
pub type QueryResult<T> = Result<T, QueryError>;
