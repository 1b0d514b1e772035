//! SELECT query builder.
//!
//! A [`SelectQuery`] owns its projection list, a [`GraphPattern`], a set of
//! [`Modifiers`] and its [`Prefixes`], and may hold nested subqueries. Builder
//! calls validate their own tokens right away. Whether every prefix is declared
//! and every selected variable is bound can only be known once the query is
//! complete, so [`SelectQuery::render`] checks that on every call.
//!
//! # Example
//! ```
//! use sparql_select::query::SelectQuery;
//!
//! let mut query = SelectQuery::with_prefixes([("foaf", "<http://xmlns.com/foaf/0.1/>")]).unwrap();
//! query
//!     .select(["?name"]).unwrap()
//!     .where_("?person", "foaf:name", "?name").unwrap();
//!
//! assert_eq!(
//!     query.to_text().unwrap(),
//!     "PREFIX foaf: <http://xmlns.com/foaf/0.1/> SELECT ?name WHERE { ?person foaf:name ?name . }"
//! );
//! ```

use std::cell::{Ref, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::fmt::Formatter;
use crate::modifier::{Direction, Modifiers};
use crate::pattern::{Continuation, GraphPattern};
use crate::prefix::Prefixes;
use crate::validator::{Accept, Category, ExpressionValidator, split_binding};

/// One entry of the SELECT list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// `?name`, stored without the sigil.
    Variable(String),
    /// `(<expression> AS ?target)`.
    Binding { expression: String, target: String },
}

impl Projection {
    /// The variable this projection makes visible.
    pub fn name(&self) -> &str {
        match self {
            Projection::Variable(name) => name,
            Projection::Binding { target, .. } => target,
        }
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Projection::Variable(name) => write!(f, "?{}", name),
            Projection::Binding { expression, target } => write!(f, "({} AS ?{})", expression, target),
        }
    }
}

#[derive(Debug, Default)]
struct QueryState {
    projections: Vec<Projection>,
    subqueries: Vec<SelectQuery>,
    validator: ExpressionValidator,
    graph: GraphPattern,
    modifiers: Modifiers,
    prefixes: Prefixes,
}

/// Handle to a SELECT query.
///
/// Clones share the same query; that is how a subquery attached to a parent
/// can still be extended afterwards. Identity is by handle, see
/// [`SelectQuery::ptr_eq`].
#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    inner: Rc<RefCell<QueryState>>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a query with declared prefixes, `label -> <iri>`.
    pub fn with_prefixes<I, K, V>(prefixes: I) -> QueryResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let query = Self::new();
        query.inner.borrow_mut().prefixes = Prefixes::from_pairs(prefixes)?;
        Ok(query)
    }

    /// Declare one more prefix on this query.
    pub fn prefix(&mut self, label: &str, iri: &str) -> QueryResult<&mut Self> {
        self.inner.borrow_mut().prefixes.declare(label, iri)?;
        Ok(self)
    }

    /// Append variables (`?name`) or bindings (`<function> AS ?name`) to the
    /// SELECT list.
    ///
    /// Stops at the first invalid entry; entries before it stay selected.
    pub fn select<I, S>(&mut self, names: I) -> QueryResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        {
            let mut state = self.inner.borrow_mut();
            for name in names {
                let name = name.as_ref();
                let category = state
                    .validator
                    .classify(name, Accept::VARIABLE | Accept::FUNCTION_AS)?;
                let projection = match (category, split_binding(name)) {
                    (Category::FunctionAs, Some((expression, target))) => Projection::Binding {
                        expression: expression.to_string(),
                        target: target.to_string(),
                    },
                    _ => Projection::Variable(name[1..].to_string()),
                };
                state.projections.push(projection);
            }
        }
        Ok(self)
    }

    /// Append a single variable or binding.
    pub fn select_one(&mut self, name: &str) -> QueryResult<&mut Self> {
        self.select([name])
    }

    /// Attach `query` as a nested `{ SELECT ... }` block.
    pub fn subquery(&mut self, query: &SelectQuery) -> QueryResult<&mut Self> {
        if self.ptr_eq(query) {
            return Err(QueryError::SelfReference);
        }
        if query.contains_subquery(self) {
            return Err(QueryError::CyclicSubquery);
        }
        self.inner.borrow_mut().subqueries.push(query.clone());
        debug!(children = self.inner.borrow().subqueries.len(), "attached subquery");
        Ok(self)
    }

    /// Whether `query` is a child of this query or nested anywhere below one.
    pub fn contains_subquery(&self, query: &SelectQuery) -> bool {
        let mut stack: Vec<SelectQuery> = self.inner.borrow().subqueries.clone();
        let mut visited: HashSet<*const RefCell<QueryState>> = HashSet::new();

        while let Some(node) = stack.pop() {
            if node.ptr_eq(query) {
                return true;
            }
            if visited.insert(Rc::as_ptr(&node.inner)) {
                stack.extend(node.inner.borrow().subqueries.iter().cloned());
            }
        }
        false
    }

    /// A new empty query holding a copy of this query's prefixes.
    ///
    /// The copy is taken now: prefixes declared on this query later are not
    /// seen by the subquery.
    pub fn new_subquery(&self) -> SelectQuery {
        let child = SelectQuery::new();
        child.inner.borrow_mut().prefixes = self.inner.borrow().prefixes.clone();
        child
    }

    /// Add the triple `subject predicate object` to the graph pattern.
    pub fn where_(&mut self, subject: &str, predicate: &str, object: &str) -> QueryResult<&mut Self> {
        self.inner.borrow_mut().graph.where_(subject, predicate, object)?;
        Ok(self)
    }

    /// Continue the last triple, see [`Continuation`].
    pub fn also<'a>(&mut self, continuation: impl Into<Continuation<'a>>) -> QueryResult<&mut Self> {
        self.inner.borrow_mut().graph.also(continuation)?;
        Ok(self)
    }

    pub fn filter(&mut self, expression: &str) -> QueryResult<&mut Self> {
        self.inner.borrow_mut().graph.filter(expression)?;
        Ok(self)
    }

    pub fn group_by(&mut self, expression: &str) -> QueryResult<&mut Self> {
        self.inner.borrow_mut().modifiers.group_by(expression)?;
        Ok(self)
    }

    pub fn having(&mut self, expression: &str) -> QueryResult<&mut Self> {
        self.inner.borrow_mut().modifiers.having(expression)?;
        Ok(self)
    }

    pub fn order_by(&mut self, expression: &str, direction: Direction) -> QueryResult<&mut Self> {
        self.inner.borrow_mut().modifiers.order_by(expression, direction)?;
        Ok(self)
    }

    pub fn order_by_asc(&mut self, expression: &str) -> QueryResult<&mut Self> {
        self.order_by(expression, Direction::Asc)
    }

    pub fn order_by_desc(&mut self, expression: &str) -> QueryResult<&mut Self> {
        self.order_by(expression, Direction::Desc)
    }

    pub fn limit(&mut self, n: u64) -> &mut Self {
        self.inner.borrow_mut().modifiers.limit(n);
        self
    }

    pub fn offset(&mut self, n: u64) -> &mut Self {
        self.inner.borrow_mut().modifiers.offset(n);
        self
    }

    /// Render the query text.
    ///
    /// Fails with [`QueryError::UndefinedPrefix`] or
    /// [`QueryError::UndefinedVariable`], naming every offender, before any
    /// text is produced. Subqueries are rendered without their own PREFIX
    /// header.
    ///
    /// Nested subqueries are rendered recursively, one stack frame per level,
    /// so nesting depth is bounded by the thread's stack.
    pub fn render(&self, include_prefixes: bool) -> QueryResult<String> {
        let state = self.inner.borrow();
        state.check_prefixes()?;
        state.check_variables()?;

        let mut sparql = String::new();
        if include_prefixes {
            sparql.push_str(&state.prefixes.render());
        }

        sparql.push_str("SELECT ");
        if state.projections.is_empty() {
            sparql.push('*');
        } else {
            let projections: Vec<String> = state.projections.iter().map(|p| p.to_string()).collect();
            sparql.push_str(&projections.join(" "));
        }
        sparql.push_str(" WHERE {");

        for child in &state.subqueries {
            sparql.push_str(" { ");
            sparql.push_str(&child.render(false)?);
            sparql.push_str(" }");
        }

        sparql.push_str(&state.graph.render());
        sparql.push_str(" }");
        sparql.push_str(&state.modifiers.render());

        debug!(len = sparql.len(), include_prefixes, "rendered query");
        Ok(sparql)
    }

    /// Full query text including the PREFIX header.
    pub fn to_text(&self) -> QueryResult<String> {
        self.render(true)
    }

    /// Full query text, pretty printed.
    pub fn format(&self) -> QueryResult<String> {
        Ok(Formatter::new().format(&self.to_text()?))
    }

    /// Whether both handles refer to the same query.
    pub fn ptr_eq(&self, other: &SelectQuery) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Selected variable names, sigil stripped, in selection order.
    pub fn variables(&self) -> Vec<String> {
        self.inner
            .borrow()
            .projections
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    pub fn projections(&self) -> Vec<Projection> {
        self.inner.borrow().projections.clone()
    }

    /// Declared prefixes, `label -> <iri>`, in declaration order.
    pub fn prefixes(&self) -> IndexMap<String, String> {
        self.inner
            .borrow()
            .prefixes
            .iter()
            .map(|(l, i)| (l.to_string(), i.to_string()))
            .collect()
    }

    pub fn graph(&self) -> Ref<'_, GraphPattern> {
        Ref::map(self.inner.borrow(), |state| &state.graph)
    }

    pub fn modifiers(&self) -> Ref<'_, Modifiers> {
        Ref::map(self.inner.borrow(), |state| &state.modifiers)
    }

    /// Direct subqueries in attachment order.
    pub fn subqueries(&self) -> Vec<SelectQuery> {
        self.inner.borrow().subqueries.clone()
    }

    /// Variables this query exposes to an enclosing query: its projection, or
    /// everything in scope for `SELECT *`. Recurses through `SELECT *`
    /// children.
    pub fn projected_variables(&self) -> IndexSet<String> {
        let state = self.inner.borrow();
        if state.projections.is_empty() {
            state.defined_variables()
        } else {
            state.projections.iter().map(|p| p.name().to_string()).collect()
        }
    }
}

/// Writes [`SelectQuery::to_text`]. A query that fails validation makes the
/// write fail, so prefer `to_text` where the error matters.
impl fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_text().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl QueryState {
    /// Variables bound inside this query's WHERE block or by its SELECT list.
    fn defined_variables(&self) -> IndexSet<String> {
        let mut defined = self.graph.defined_variables().clone();
        for child in &self.subqueries {
            defined.extend(child.projected_variables());
        }
        for projection in &self.projections {
            if let Projection::Binding { target, .. } = projection {
                defined.insert(target.clone());
            }
        }
        defined
    }

    fn check_prefixes(&self) -> QueryResult<()> {
        let undefined: Vec<String> = self
            .graph
            .referenced_prefixes()
            .iter()
            .chain(self.modifiers.referenced_prefixes())
            .chain(self.validator.prefixes())
            .filter(|label| !self.prefixes.contains(label))
            .cloned()
            .collect::<IndexSet<String>>()
            .into_iter()
            .collect();

        if undefined.is_empty() {
            Ok(())
        } else {
            Err(QueryError::UndefinedPrefix(undefined))
        }
    }

    fn check_variables(&self) -> QueryResult<()> {
        let defined = self.defined_variables();
        let undefined: Vec<String> = self
            .validator
            .variables()
            .iter()
            .chain(self.modifiers.referenced_variables())
            .filter(|name| !defined.contains(*name))
            .cloned()
            .collect::<IndexSet<String>>()
            .into_iter()
            .collect();

        if undefined.is_empty() {
            Ok(())
        } else {
            Err(QueryError::UndefinedVariable(undefined))
        }
    }
}
