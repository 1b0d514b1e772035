//! # sparql-select
//!
//! Build SPARQL SELECT queries with chained calls and get text that is known to
//! be consistent: every token is classified when it is added, and every prefix
//! and variable the query uses is checked against what it declares and binds
//! before any text is produced.
//!
//! ## Quick Example
//!
//! ```
//! use sparql_select::prelude::*;
//!
//! let mut query = SelectQuery::with_prefixes([("foaf", "<http://xmlns.com/foaf/0.1/>")])?;
//! query
//!     .select(["?name", "COUNT(?friend) AS ?friends"])?
//!     .where_("?person", "foaf:name", "?name")?
//!     .also(("foaf:knows", "?friend"))?
//!     .group_by("?name")?
//!     .order_by_desc("?friends")?
//!     .limit(10);
//!
//! assert_eq!(
//!     query.to_text()?,
//!     "PREFIX foaf: <http://xmlns.com/foaf/0.1/> \
//!      SELECT ?name (COUNT(?friend) AS ?friends) WHERE { \
//!      ?person foaf:name ?name ; foaf:knows ?friend . } \
//!      GROUP BY ?name ORDER BY DESC(?friends) LIMIT 10"
//! );
//! # Ok::<(), sparql_select::error::QueryError>(())
//! ```
//!
//! ## Categories
//!
//! | Category       | Example                   | Records          |
//! |----------------|---------------------------|------------------|
//! | `variable`     | `?name`, `$name`          | the variable     |
//! | `iri`          | `<http://…>`, `a`         | nothing          |
//! | `prefixed-iri` | `foaf:name`               | the prefix       |
//! | `prefix`       | `foaf`                    | nothing          |
//! | `function`     | `STRLEN(?name) > 3`       | variables, prefixes |
//! | `function-as`  | `COUNT(?x) AS ?n`         | variables but the target, prefixes |

pub mod config;
pub mod error;
pub mod fmt;
pub mod modifier;
pub mod pattern;
pub mod prefix;
pub mod query;
pub mod validator;

pub mod prelude {
    pub use crate::config::{PrefixFile, QueryDocument};
    pub use crate::error::*;
    pub use crate::fmt::Formatter;
    pub use crate::modifier::{Direction, Modifiers};
    pub use crate::pattern::{Continuation, GraphPattern};
    pub use crate::prefix::Prefixes;
    pub use crate::query::{Projection, SelectQuery};
    pub use crate::validator::{Accept, Category, ExpressionValidator};
}

/// Start a query selecting `names`.
///
/// # Example
///
/// ```
/// let mut query = sparql_select::select(["?s"]).unwrap();
/// query.where_("?s", "?p", "?o").unwrap();
/// assert_eq!(query.to_text().unwrap(), "SELECT ?s WHERE { ?s ?p ?o . }");
/// ```
pub fn select<I, S>(names: I) -> error::QueryResult<query::SelectQuery>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut query = query::SelectQuery::new();
    query.select(names)?;
    Ok(query)
}
