//! Basic graph pattern: triples and filters inside `WHERE { ... }`.

use indexmap::{IndexMap, IndexSet};

use crate::error::{QueryError, QueryResult};
use crate::validator::{Accept, ExpressionValidator, full, rdf_literal};

/// How [`GraphPattern::also`] continues from the previous triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation<'a> {
    /// Another object for the current subject and predicate.
    Object(&'a str),
    /// Another predicate and object for the current subject.
    PredicateObject(&'a str, &'a str),
    /// A complete new triple.
    Triple(&'a str, &'a str, &'a str),
}

impl<'a> From<&'a str> for Continuation<'a> {
    fn from(object: &'a str) -> Self {
        Continuation::Object(object)
    }
}

impl<'a> From<(&'a str, &'a str)> for Continuation<'a> {
    fn from((predicate, object): (&'a str, &'a str)) -> Self {
        Continuation::PredicateObject(predicate, object)
    }
}

impl<'a> From<(&'a str, &'a str, &'a str)> for Continuation<'a> {
    fn from((subject, predicate, object): (&'a str, &'a str, &'a str)) -> Self {
        Continuation::Triple(subject, predicate, object)
    }
}

/// Triples grouped by subject, then predicate, plus FILTER expressions.
///
/// Terms written into triples define variables; filters only use them.
#[derive(Debug, Clone, Default)]
pub struct GraphPattern {
    triples: IndexMap<String, IndexMap<String, Vec<String>>>,
    filters: Vec<String>,
    subject: Option<String>,
    predicate: Option<String>,
    definitions: ExpressionValidator,
    usages: ExpressionValidator,
}

impl GraphPattern {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the triple `subject predicate object`. Nothing is recorded unless
    /// all three terms are valid.
    ///
    /// # Example
    /// ```
    /// use sparql_select::pattern::GraphPattern;
    ///
    /// let mut graph = GraphPattern::new();
    /// graph
    ///     .where_("?person", "foaf:name", "?name").unwrap()
    ///     .also(("foaf:mbox", "?mbox")).unwrap();
    /// assert_eq!(graph.render(), " ?person foaf:name ?name ; foaf:mbox ?mbox .");
    /// ```
    pub fn where_(&mut self, subject: &str, predicate: &str, object: &str) -> QueryResult<&mut Self> {
        let mut definitions = self.definitions.clone();
        definitions.classify(subject, Accept::default())?;
        definitions.classify(predicate, Accept::default())?;
        classify_object(&mut definitions, object)?;
        self.definitions = definitions;

        self.triples
            .entry(subject.to_string())
            .or_default()
            .entry(predicate.to_string())
            .or_default()
            .push(object.to_string());
        self.subject = Some(subject.to_string());
        self.predicate = Some(predicate.to_string());
        Ok(self)
    }

    /// Continue from the last triple's subject (and predicate).
    pub fn also<'a>(&mut self, continuation: impl Into<Continuation<'a>>) -> QueryResult<&mut Self> {
        match continuation.into() {
            Continuation::Triple(s, p, o) => self.where_(s, p, o),
            Continuation::PredicateObject(p, o) => {
                let subject = self.current_subject()?;
                self.where_(&subject, p, o)
            }
            Continuation::Object(o) => {
                let subject = self.current_subject()?;
                let predicate = self
                    .predicate
                    .clone()
                    .ok_or(QueryError::NoCurrentTriple { missing: "predicate" })?;
                self.where_(&subject, &predicate, o)
            }
        }
    }

    /// Add `FILTER (<expression>)`.
    pub fn filter(&mut self, expression: &str) -> QueryResult<&mut Self> {
        self.usages.classify(expression, Accept::FUNCTION)?;
        self.filters.push(expression.to_string());
        Ok(self)
    }

    /// Variables bound by triples.
    pub fn defined_variables(&self) -> &IndexSet<String> {
        self.definitions.variables()
    }

    /// Variables read by filters.
    pub fn referenced_variables(&self) -> &IndexSet<String> {
        self.usages.variables()
    }

    /// Prefix labels used anywhere in the pattern.
    pub fn referenced_prefixes(&self) -> IndexSet<String> {
        self.definitions
            .prefixes()
            .iter()
            .chain(self.usages.prefixes())
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty() && self.filters.is_empty()
    }

    /// Pattern body: ` s p o , o ; p o .` per subject, then ` FILTER (...)`.
    pub fn render(&self) -> String {
        let mut sparql = String::new();
        for (subject, predicates) in &self.triples {
            let groups: Vec<String> = predicates
                .iter()
                .map(|(predicate, objects)| format!("{} {}", predicate, objects.join(" , ")))
                .collect();
            sparql.push(' ');
            sparql.push_str(subject);
            sparql.push(' ');
            sparql.push_str(&groups.join(" ; "));
            sparql.push_str(" .");
        }
        for filter in &self.filters {
            sparql.push_str(" FILTER (");
            sparql.push_str(filter);
            sparql.push(')');
        }
        sparql
    }

    fn current_subject(&self) -> QueryResult<String> {
        self.subject
            .clone()
            .ok_or(QueryError::NoCurrentTriple { missing: "subject" })
    }
}

/// Objects are terms or RDF literals; a typed literal's datatype must be an IRI.
fn classify_object(definitions: &mut ExpressionValidator, object: &str) -> QueryResult<()> {
    match full(rdf_literal, object) {
        Some(Some(datatype)) => {
            definitions
                .classify(datatype, Accept::IRI | Accept::PREFIXED_IRI)
                .map_err(|_| QueryError::InvalidLiteral(object.to_string()))?;
        }
        Some(None) => {}
        None if object.starts_with(['"', '\'']) => {
            return Err(QueryError::InvalidLiteral(object.to_string()));
        }
        None => {
            definitions.classify(object, Accept::default())?;
        }
    }
    Ok(())
}
