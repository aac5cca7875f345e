//! Filter expression engine for work item queries.
//!
//! A bidirectional translator between a compact textual boolean query
//! grammar and a nested AND/OR expression tree, with incremental tree
//! merging that keeps same-connective runs flat, plus string-wise matching
//! of records against the flat active-filter list.

pub mod config;
pub mod expr;
pub mod joiner;
pub mod matcher;
pub mod parser;
pub mod serializer;
pub mod session;

pub use config::{FilterCatalog, FilterDefinition};
pub use expr::{Comparison, Connective, Expression, Predicate};
pub use joiner::{query_builder, query_joiner, FilterValue, InvalidJoin, InvalidOperator};
pub use parser::{parse, ParseError};
pub use serializer::{construct_query_url, serialize};
pub use session::{ActiveFilter, FilterSession};
