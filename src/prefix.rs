//! PREFIX declarations.

use indexmap::{IndexMap, IndexSet};

use crate::error::{QueryError, QueryResult};
use crate::validator::{Accept, ExpressionValidator};

/// Ordered mapping of prefix labels to absolute IRIs.
///
/// Cloning yields an independent copy; nothing links a clone to its source.
#[derive(Debug, Clone, Default)]
pub struct Prefixes {
    declared: IndexMap<String, String>,
    validator: ExpressionValidator,
}

impl Prefixes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `label -> <iri>` pairs, failing on the first invalid one.
    ///
    /// # Example
    /// ```
    /// use sparql_select::prefix::Prefixes;
    ///
    /// let prefixes = Prefixes::from_pairs([("foaf", "<http://xmlns.com/foaf/0.1/>")]).unwrap();
    /// assert_eq!(prefixes.render(), "PREFIX foaf: <http://xmlns.com/foaf/0.1/> ");
    /// ```
    pub fn from_pairs<I, K, V>(pairs: I) -> QueryResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut prefixes = Self::new();
        for (label, iri) in pairs {
            prefixes.declare(label.as_ref(), iri.as_ref())?;
        }
        Ok(prefixes)
    }

    /// Declare `label`, replacing the IRI if it is already declared.
    pub fn declare(&mut self, label: &str, iri: &str) -> QueryResult<&mut Self> {
        self.validator.classify(label, Accept::PREFIX)?;
        // `a` passes the IRI grammar but is a keyword, not an address.
        if iri == "a" || self.validator.classify(iri, Accept::IRI).is_err() {
            return Err(QueryError::InvalidPrefixIri {
                label: label.to_string(),
                iri: iri.to_string(),
            });
        }
        self.declared.insert(label.to_string(), iri.to_string());
        Ok(self)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.declared.contains_key(label)
    }

    pub fn iri(&self, label: &str) -> Option<&str> {
        self.declared.get(label).map(String::as_str)
    }

    /// Declared labels in declaration order.
    pub fn declared(&self) -> IndexSet<String> {
        self.declared.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.declared.iter().map(|(l, i)| (l.as_str(), i.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    /// Declaration header, one `PREFIX label: <iri> ` per entry.
    pub fn render(&self) -> String {
        self.declared
            .iter()
            .map(|(label, iri)| format!("PREFIX {}: {} ", label, iri))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_order_is_kept() {
        let prefixes = Prefixes::from_pairs([
            ("schema", "<http://schema.org/>"),
            ("foaf", "<http://xmlns.com/foaf/0.1/>"),
        ])
        .unwrap();
        assert_eq!(
            prefixes.render(),
            "PREFIX schema: <http://schema.org/> PREFIX foaf: <http://xmlns.com/foaf/0.1/> "
        );
        assert_eq!(prefixes.declared().into_iter().collect::<Vec<_>>(), vec!["schema", "foaf"]);
    }

    #[test]
    fn test_redeclare_replaces_iri() {
        let mut prefixes = Prefixes::new();
        prefixes
            .declare("ex", "<http://example.org/>")
            .unwrap()
            .declare("ex", "<http://example.com/>")
            .unwrap();
        assert_eq!(prefixes.iri("ex"), Some("<http://example.com/>"));
        assert_eq!(prefixes.declared().len(), 1);
    }

    #[test]
    fn test_rejects_bad_label() {
        let err = Prefixes::from_pairs([("ex1", "<http://example.org/>")]).unwrap_err();
        assert!(matches!(err, QueryError::NoCategoryMatched { .. }));
    }

    #[test]
    fn test_rejects_bad_iri() {
        for iri in ["http://example.org/", "a", "ex:thing"] {
            let err = Prefixes::from_pairs([("ex", iri)]).unwrap_err();
            assert!(matches!(err, QueryError::InvalidPrefixIri { .. }), "{iri}");
        }
    }

    #[test]
    fn test_empty_renders_nothing() {
        assert_eq!(Prefixes::new().render(), "");
        assert!(Prefixes::new().is_empty());
    }
}
