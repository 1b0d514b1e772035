//! Query documents and user configuration.
//!
//! A query can be described in TOML and built into a [`SelectQuery`]:
//!
//! ```toml
//! select = ["?name", "COUNT(?friend) AS ?friends"]
//! where = [
//!     ["?person", "foaf:name", "?name"],
//!     ["?person", "foaf:knows", "?friend"],
//! ]
//! group_by = ["?name"]
//! order_by = [{ expr = "?friends", direction = "desc" }]
//! limit = 10
//!
//! [prefixes]
//! foaf = "<http://xmlns.com/foaf/0.1/>"
//! ```
//!
//! Nested `[[subquery]]` tables use the same keys and see the prefixes of
//! their parent.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::modifier::Direction;
use crate::query::SelectQuery;

/// One ORDER BY key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderKey {
    pub expr: String,
    #[serde(default)]
    pub direction: Direction,
}

/// A whole SELECT query in declarative form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryDocument {
    pub prefixes: IndexMap<String, String>,
    pub select: Vec<String>,
    #[serde(rename = "where")]
    pub triples: Vec<[String; 3]>,
    pub filter: Vec<String>,
    pub group_by: Vec<String>,
    pub having: Vec<String>,
    pub order_by: Vec<OrderKey>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    #[serde(rename = "subquery")]
    pub subqueries: Vec<QueryDocument>,
}

impl QueryDocument {
    pub fn from_toml(content: &str) -> QueryResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> QueryResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading query document");
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Build the query using only the prefixes in the document.
    pub fn build(&self) -> QueryResult<SelectQuery> {
        self.build_with_prefixes(&IndexMap::new())
    }

    /// Build the query with `defaults` declared first; the document's own
    /// prefixes override them.
    pub fn build_with_prefixes(&self, defaults: &IndexMap<String, String>) -> QueryResult<SelectQuery> {
        let mut query = SelectQuery::with_prefixes(defaults)?;
        self.apply(&mut query)?;
        Ok(query)
    }

    fn apply(&self, query: &mut SelectQuery) -> QueryResult<()> {
        for (label, iri) in &self.prefixes {
            query.prefix(label, iri)?;
        }

        query.select(&self.select)?;

        for [subject, predicate, object] in &self.triples {
            query.where_(subject, predicate, object)?;
        }
        for expression in &self.filter {
            query.filter(expression)?;
        }

        for sub in &self.subqueries {
            let mut child = query.new_subquery();
            sub.apply(&mut child)?;
            query.subquery(&child)?;
        }

        for expression in &self.group_by {
            query.group_by(expression)?;
        }
        for expression in &self.having {
            query.having(expression)?;
        }
        for key in &self.order_by {
            query.order_by(&key.expr, key.direction)?;
        }
        if let Some(n) = self.limit {
            query.limit(n);
        }
        if let Some(n) = self.offset {
            query.offset(n);
        }
        Ok(())
    }
}

/// Prefixes every `build` starts from, read from the user's config directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrefixFile {
    pub prefixes: IndexMap<String, String>,
}

impl PrefixFile {
    /// Overrides the default location when set.
    pub const ENV_VAR: &'static str = "SPARQL_SELECT_PREFIXES";

    /// `$SPARQL_SELECT_PREFIXES`, else `<config dir>/sparql-select/prefixes.toml`.
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os(Self::ENV_VAR)
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|dir| dir.join("sparql-select").join("prefixes.toml")))
    }

    pub fn load(path: impl AsRef<Path>) -> QueryResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load the file at [`PrefixFile::default_path`], or nothing if the
    /// config dir holds none. A path named by the env var must exist.
    pub fn discover() -> QueryResult<Self> {
        Self::discover_from(std::env::var_os(Self::ENV_VAR).map(PathBuf::from))
    }

    fn discover_from(explicit: Option<PathBuf>) -> QueryResult<Self> {
        let path = match explicit {
            Some(path) if path.is_file() => path,
            Some(path) => {
                return Err(QueryError::Config(format!(
                    "prefix file '{}' does not exist",
                    path.display()
                )));
            }
            None => match Self::default_path() {
                Some(path) if path.is_file() => path,
                _ => return Ok(Self::default()),
            },
        };
        debug!(path = %path.display(), "loading prefix file");
        Self::load(path)
    }
}
