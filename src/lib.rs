//! tagquery - compile monitoring index requests into boolean index queries
//!
//! Requests name node ids, endpoints, metrics, counters and tag
//! constraints. Each is compiled into a [`QueryNode`] tree plus the options
//! (time window, limits, aggregation mode) an inverted-index engine needs.
//!
//! - `tagstring/` - `metric/k=v,...` and `k=v,...` decoding
//! - `query/` - query tree, options, document evaluation
//! - `filter/` - reusable filter fragments
//! - `compiler/` - request types and the per-request compilers
//! - `index` - interface of the engine executing compiled queries
//!
//! # Example
//!
//! ```
//! use tagquery::{CludeRecv, QueryCompiler, QueryNode};
//!
//! let compiler = QueryCompiler::default();
//! let compiled = compiler.query_index_by_clude(&CludeRecv::default());
//! assert_eq!(compiled.query, QueryNode::All);
//! ```

pub mod compiler;
pub mod config;
pub mod filter;
pub mod index;
pub mod query;
pub mod tagstring;

pub use compiler::{
    CludeRecv, EndpointMetricRecv, EndpointsRecv, IndexByFullTagsRecv, QueryCompiler, QueryData,
    QueryDataForUi, TagKv,
};
pub use config::{FieldNames, IndexConfig, Limits};
pub use filter::TagPair;
pub use index::{Document, SearchIndex, TagValues};
pub use query::{
    AggregationOptions, AggregationType, CompiledAggregation, CompiledQuery, QueryNode,
    QueryOptions, evaluate,
};
pub use tagstring::{ParsedCounter, decode_tags, parse_counter};
