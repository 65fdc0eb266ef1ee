//! Boolean query tree consumed by the inverted-index engine.
//!
//! Notation used by `Display` and in comments throughout the crate:
//!
//! ```text
//! field=value             - term (exact match)
//! field=*                 - field exists
//! *                       - match all
//! &&(a, b, ...)           - conjunction
//! ||(a, b, ...)           - disjunction
//! !(a)                    - negation
//! ```

mod ast;
mod eval;
mod options;

pub use ast::QueryNode;
pub use eval::evaluate;
pub use options::{
    AggregationOptions, AggregationType, CompiledAggregation, CompiledQuery, QueryOptions,
};
