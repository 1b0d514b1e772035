//! Expression classification.
//!
//! Every token handed to a builder is checked here against a mask of accepted
//! [`Category`]s. Categories are tried in the fixed order of
//! [`Category::PRECEDENCE`] and the first one that matches the whole token wins.
//! Matching a category that can mention names also records those names, so a
//! builder can later compare what it used with what it declared.
//!
//! ```
//! use sparql_select::validator::{Accept, Category, ExpressionValidator};
//!
//! let mut validator = ExpressionValidator::new();
//! let category = validator
//!     .classify("COUNT(?book) AS ?books", Accept::VARIABLE | Accept::FUNCTION_AS)
//!     .unwrap();
//!
//! assert_eq!(category, Category::FunctionAs);
//! assert_eq!(validator.variables().len(), 1);
//! assert!(validator.variables().contains("book"));
//! ```

mod grammar;

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use indexmap::IndexSet;
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::{QueryError, QueryResult};

pub use grammar::BUILTIN_FUNCTIONS;
pub(crate) use grammar::{embedded_iri, full, iri, rdf_literal, split_binding, string_literal};

bitflags! {
    /// Set of categories a validation call accepts.
    ///
    /// The default mask accepts the three term categories used in triples.
    ///
    /// ```
    /// use sparql_select::validator::Accept;
    ///
    /// assert_eq!(Accept::default(), Accept::VARIABLE | Accept::IRI | Accept::PREFIXED_IRI);
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Accept: u8 {
        /// `?name` or `$name`.
        const VARIABLE = 1 << 0;
        /// `<...>` or the `a` keyword.
        const IRI = 1 << 1;
        /// `label:local`.
        const PREFIXED_IRI = 1 << 2;
        /// A bare `label`.
        const PREFIX = 1 << 3;
        /// A function call or other permissive expression.
        const FUNCTION = 1 << 4;
        /// `<function> AS ?target`.
        const FUNCTION_AS = 1 << 5;
    }
}

impl Default for Accept {
    fn default() -> Self {
        Self::VARIABLE | Self::IRI | Self::PREFIXED_IRI
    }
}

impl fmt::Display for Accept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Category::PRECEDENCE
            .iter()
            .filter(|c| self.contains(c.accept()))
            .map(|c| c.name())
            .collect();
        if names.is_empty() {
            f.write_str("nothing")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

impl FromStr for Accept {
    type Err = QueryError;

    /// Parse a comma separated list of category names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| name.parse::<Category>().map(|c| c.accept()))
            .collect()
    }
}

/// Grammatical category of an expression token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Variable,
    Iri,
    PrefixedIri,
    Prefix,
    Function,
    FunctionAs,
}

impl Category {
    /// Order in which categories are tried.
    pub const PRECEDENCE: [Category; 6] = [
        Category::Variable,
        Category::Iri,
        Category::PrefixedIri,
        Category::Prefix,
        Category::Function,
        Category::FunctionAs,
    ];

    /// Single-category mask.
    pub fn accept(self) -> Accept {
        match self {
            Category::Variable => Accept::VARIABLE,
            Category::Iri => Accept::IRI,
            Category::PrefixedIri => Accept::PREFIXED_IRI,
            Category::Prefix => Accept::PREFIX,
            Category::Function => Accept::FUNCTION,
            Category::FunctionAs => Accept::FUNCTION_AS,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::Variable => "variable",
            Category::Iri => "iri",
            Category::PrefixedIri => "prefixed-iri",
            Category::Prefix => "prefix",
            Category::Function => "function",
            Category::FunctionAs => "function-as",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::PRECEDENCE
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| QueryError::Config(format!("unknown category '{}'", s)))
    }
}

/// Classifies expression tokens and remembers the names they mention.
///
/// Both name sets only ever grow: a validator belongs to one builder for the
/// builder's whole life and is never reset.
#[derive(Debug, Clone, Default)]
pub struct ExpressionValidator {
    variables: IndexSet<String>,
    prefixes: IndexSet<String>,
}

impl ExpressionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `expression` under `accept`.
    ///
    /// Returns the first accepted category, in [`Category::PRECEDENCE`] order,
    /// whose grammar matches the whole token.
    pub fn classify(&mut self, expression: &str, accept: Accept) -> QueryResult<Category> {
        for category in Category::PRECEDENCE {
            if accept.contains(category.accept()) && self.matches(category, expression) {
                debug!(expression, %category, "classified expression");
                return Ok(category);
            }
        }
        Err(QueryError::no_match(expression, accept))
    }

    /// Variable names seen so far, sigil stripped, in first-seen order.
    pub fn variables(&self) -> &IndexSet<String> {
        &self.variables
    }

    /// Prefix labels seen so far, in first-seen order.
    pub fn prefixes(&self) -> &IndexSet<String> {
        &self.prefixes
    }

    fn matches(&mut self, category: Category, expression: &str) -> bool {
        match category {
            Category::Variable => match full(grammar::variable, expression) {
                Some(name) => {
                    self.track_variable(name);
                    true
                }
                None => false,
            },
            Category::Iri => full(grammar::iri, expression).is_some(),
            Category::PrefixedIri => match full(grammar::prefixed_iri, expression) {
                Some(label) => {
                    self.track_prefix(label);
                    true
                }
                None => false,
            },
            Category::Prefix => full(grammar::label, expression).is_some(),
            Category::Function => {
                let matched = grammar::is_function(expression);
                if matched {
                    self.track_mentions(expression);
                }
                matched
            }
            Category::FunctionAs => {
                let matched = split_binding(expression).is_some();
                if matched {
                    self.track_mentions(expression);
                }
                matched
            }
        }
    }

    fn track_variable(&mut self, name: &str) {
        if self.variables.insert(name.to_string()) {
            trace!(variable = name, "tracked variable");
        }
    }

    fn track_prefix(&mut self, label: &str) {
        if self.prefixes.insert(label.to_string()) {
            trace!(prefix = label, "tracked prefix");
        }
    }

    fn track_mentions(&mut self, expression: &str) {
        let found = grammar::mentions(expression);
        for name in found.variables {
            self.track_variable(name);
        }
        for label in found.prefixes {
            self.track_prefix(label);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(set: &IndexSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_variable_recorded_once() {
        let mut v = ExpressionValidator::new();
        assert_eq!(v.classify("?name", Accept::VARIABLE).unwrap(), Category::Variable);
        assert_eq!(v.classify("$name", Accept::VARIABLE).unwrap(), Category::Variable);
        assert_eq!(names(v.variables()), vec!["name"]);
    }

    #[test]
    fn test_default_mask() {
        let mut v = ExpressionValidator::new();
        assert_eq!(v.classify("?s", Accept::default()).unwrap(), Category::Variable);
        assert_eq!(v.classify("a", Accept::default()).unwrap(), Category::Iri);
        assert_eq!(
            v.classify("<http://schema.org/name>", Accept::default()).unwrap(),
            Category::Iri
        );
        assert_eq!(v.classify("schema:name", Accept::default()).unwrap(), Category::PrefixedIri);
        assert!(v.classify("schema", Accept::default()).is_err());
        assert!(v.classify("COUNT(?s)", Accept::default()).is_err());
        assert_eq!(names(v.prefixes()), vec!["schema"]);
    }

    #[test]
    fn test_mask_excludes_true_category() {
        let mut v = ExpressionValidator::new();
        let err = v.classify("?x", Accept::IRI | Accept::PREFIX).unwrap_err();
        assert!(matches!(err, QueryError::NoCategoryMatched { ref expression, .. } if expression == "?x"));
        assert!(v.variables().is_empty());
    }

    #[test]
    fn test_prefix_beats_function() {
        let mut v = ExpressionValidator::new();
        assert_eq!(
            v.classify("COUNT", Accept::PREFIX | Accept::FUNCTION).unwrap(),
            Category::Prefix
        );
        assert_eq!(v.classify("COUNT", Accept::FUNCTION).unwrap(), Category::Function);
    }

    #[test]
    fn test_variable_beats_function() {
        let mut v = ExpressionValidator::new();
        assert_eq!(
            v.classify("?x", Accept::VARIABLE | Accept::FUNCTION).unwrap(),
            Category::Variable
        );
    }

    #[test]
    fn test_function_is_permissive() {
        let mut v = ExpressionValidator::new();
        assert_eq!(v.classify("REGEX(?name, \"^A\"", Accept::FUNCTION).unwrap(), Category::Function);
        assert_eq!(v.classify("42 > ?age", Accept::FUNCTION).unwrap(), Category::Function);
        assert!(v.classify("!BOUND(?x)", Accept::FUNCTION).is_err());
        assert_eq!(names(v.variables()), vec!["name", "age"]);
    }

    #[test]
    fn test_function_as_skips_target() {
        let mut v = ExpressionValidator::new();
        let accept = Accept::VARIABLE | Accept::FUNCTION_AS;
        assert_eq!(
            v.classify("GROUP_CONCAT(?label) AS ?labels", accept).unwrap(),
            Category::FunctionAs
        );
        assert_eq!(names(v.variables()), vec!["label"]);
        assert!(v.classify("GROUP_CONCAT(?label)", accept).is_err());
    }

    #[test]
    fn test_function_harvests_prefixes() {
        let mut v = ExpressionValidator::new();
        v.classify("xsd:integer(?age) > 18 && LANG(?l) = \"en\"", Accept::FUNCTION)
            .unwrap();
        assert_eq!(names(v.variables()), vec!["age", "l"]);
        assert_eq!(names(v.prefixes()), vec!["xsd"]);
    }

    #[test]
    fn test_empty_token() {
        let mut v = ExpressionValidator::new();
        assert!(v.classify("", Accept::all()).is_err());
    }

    #[test]
    fn test_accept_from_str() {
        let accept: Accept = "variable, function-as".parse().unwrap();
        assert_eq!(accept, Accept::VARIABLE | Accept::FUNCTION_AS);
        assert!("variable,nope".parse::<Accept>().is_err());
        assert_eq!(accept.to_string(), "variable|function-as");
    }
}
