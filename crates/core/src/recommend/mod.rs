//! Point recommendations from a mined rule set.
//!
//! A query of one to three items resolves to at most one recommended item:
//! the full query is matched as an exact antecedent first, then the first query
//! item alone.

mod query;
mod resolver;

pub use query::{parse_query, ParsedQuery, QueryError};
pub use resolver::{resolve, MatchKind, Recommendation};

/// Largest query the resolver is meant to see.
pub const MAX_QUERY_ITEMS: usize = 3;

/// Separator between items in free-form query input.
pub const DEFAULT_QUERY_DELIMITER: char = ',';
