//! Error types for sparql-select.

use thiserror::Error;

use crate::validator::Accept;

/// The main error type for query building and rendering.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The expression matched none of the accepted categories.
    #[error("Expression '{expression}' matches none of the accepted categories: {accepted}")]
    NoCategoryMatched { expression: String, accepted: Accept },

    /// A quoted, numeric or boolean object could not be read as an RDF literal.
    #[error("Invalid literal: {0}")]
    InvalidLiteral(String),

    /// A prefix was declared with something other than an `<...>` IRI.
    #[error("Prefix '{label}' must be bound to an <IRI>, got '{iri}'")]
    InvalidPrefixIri { label: String, iri: String },

    /// `also` was called before any triple gave it a subject or predicate.
    #[error("Cannot continue a triple: no {missing} has been set yet")]
    NoCurrentTriple { missing: &'static str },

    /// A query was attached as its own subquery.
    #[error("A query cannot be a subquery of itself")]
    SelfReference,

    /// Attaching the subquery would close a cycle.
    #[error("Subquery already contains this query; attaching it would create a cycle")]
    CyclicSubquery,

    /// Prefixes used in the graph pattern or modifiers but never declared.
    #[error("Undefined prefix(es): {}", .0.join(", "))]
    UndefinedPrefix(Vec<String>),

    /// Variables selected or used by modifiers but never bound.
    #[error("Undefined variable(s): {}", .0.join(", "))]
    UndefinedVariable(Vec<String>),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML document.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl QueryError {
    /// Create a no-match error for the given expression and mask.
    pub fn no_match(expression: impl Into<String>, accepted: Accept) -> Self {
        Self::NoCategoryMatched {
            expression: expression.into(),
            accepted,
        }
    }
}

/// Result type alias for query operations.
pub type QueryResult<T> = Result<T, QueryError>;
