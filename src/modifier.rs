//! Solution modifiers: GROUP BY, HAVING, ORDER BY, LIMIT and OFFSET.

use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::QueryResult;
use crate::validator::{Accept, ExpressionValidator};

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    #[serde(alias = "ASC")]
    Asc,
    #[serde(alias = "DESC")]
    Desc,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => write!(f, "ASC"),
            Direction::Desc => write!(f, "DESC"),
        }
    }
}

/// Modifiers applied after the WHERE block.
#[derive(Debug, Clone, Default)]
pub struct Modifiers {
    group_by: Vec<String>,
    having: Vec<String>,
    order_by: Vec<(String, Direction)>,
    limit: Option<u64>,
    offset: Option<u64>,
    validator: ExpressionValidator,
}

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a GROUP BY variable.
    pub fn group_by(&mut self, expression: &str) -> QueryResult<&mut Self> {
        self.validator.classify(expression, Accept::VARIABLE)?;
        self.group_by.push(expression.to_string());
        Ok(self)
    }

    /// Add a HAVING condition.
    pub fn having(&mut self, expression: &str) -> QueryResult<&mut Self> {
        self.validator.classify(expression, Accept::FUNCTION)?;
        self.having.push(expression.to_string());
        Ok(self)
    }

    /// Add an ORDER BY key; a variable or an expression.
    pub fn order_by(&mut self, expression: &str, direction: Direction) -> QueryResult<&mut Self> {
        self.validator
            .classify(expression, Accept::VARIABLE | Accept::FUNCTION)?;
        self.order_by.push((expression.to_string(), direction));
        Ok(self)
    }

    /// Set LIMIT; the last call wins.
    pub fn limit(&mut self, n: u64) -> &mut Self {
        self.limit = Some(n);
        self
    }

    /// Set OFFSET; the last call wins.
    pub fn offset(&mut self, n: u64) -> &mut Self {
        self.offset = Some(n);
        self
    }

    pub fn referenced_variables(&self) -> &IndexSet<String> {
        self.validator.variables()
    }

    pub fn referenced_prefixes(&self) -> &IndexSet<String> {
        self.validator.prefixes()
    }

    pub fn is_empty(&self) -> bool {
        self.group_by.is_empty()
            && self.having.is_empty()
            && self.order_by.is_empty()
            && self.limit.is_none()
            && self.offset.is_none()
    }

    /// Clause text in GROUP BY, HAVING, ORDER BY, LIMIT, OFFSET order, each
    /// clause preceded by a space.
    pub fn render(&self) -> String {
        let mut sparql = String::new();

        if !self.group_by.is_empty() {
            sparql.push_str(" GROUP BY ");
            sparql.push_str(&self.group_by.join(" "));
        }

        if !self.having.is_empty() {
            let conditions: Vec<String> = self.having.iter().map(|h| format!("({})", h)).collect();
            sparql.push_str(" HAVING ");
            sparql.push_str(&conditions.join(" "));
        }

        if !self.order_by.is_empty() {
            let keys: Vec<String> = self
                .order_by
                .iter()
                .map(|(expr, dir)| format!("{}({})", dir, expr))
                .collect();
            sparql.push_str(" ORDER BY ");
            sparql.push_str(&keys.join(" "));
        }

        if let Some(n) = self.limit {
            sparql.push_str(&format!(" LIMIT {}", n));
        }

        if let Some(n) = self.offset {
            sparql.push_str(&format!(" OFFSET {}", n));
        }

        sparql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;

    #[test]
    fn test_clause_order() {
        let mut m = Modifiers::new();
        m.offset(20)
            .limit(10)
            .order_by("?count", Direction::Desc)
            .unwrap()
            .having("COUNT(?book) > 2")
            .unwrap()
            .group_by("?author")
            .unwrap();
        assert_eq!(
            m.render(),
            " GROUP BY ?author HAVING (COUNT(?book) > 2) ORDER BY DESC(?count) LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn test_limit_last_call_wins() {
        let mut m = Modifiers::new();
        m.limit(5).limit(50);
        assert_eq!(m.render(), " LIMIT 50");
    }

    #[test]
    fn test_references() {
        let mut m = Modifiers::new();
        m.group_by("?a").unwrap();
        m.order_by("STRLEN(str(?b))", Direction::Asc).unwrap();
        m.having("?c > xsd:integer(\"1\")").unwrap();
        let vars: Vec<&str> = m.referenced_variables().iter().map(String::as_str).collect();
        assert_eq!(vars, vec!["a", "b", "c"]);
        assert!(m.referenced_prefixes().contains("xsd"));
    }

    #[test]
    fn test_group_by_rejects_expression() {
        let mut m = Modifiers::new();
        assert!(matches!(
            m.group_by("STR(?a)").unwrap_err(),
            QueryError::NoCategoryMatched { .. }
        ));
        assert!(m.is_empty());
    }

    #[test]
    fn test_direction_serde() {
        #[derive(Deserialize)]
        struct Key {
            direction: Direction,
        }
        let key: Key = toml::from_str("direction = \"DESC\"").unwrap();
        assert_eq!(key.direction, Direction::Desc);
        assert_eq!(Direction::default().to_string(), "ASC");
    }
}
