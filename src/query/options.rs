//! Options paired with a query tree, and the compiled units returned to callers.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::ast::QueryNode;
use crate::config::Limits;

/// Search window and result limits. Window bounds serialize as Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    #[serde(with = "time::serde::timestamp")]
    pub start_inclusive: OffsetDateTime,
    #[serde(with = "time::serde::timestamp")]
    pub end_exclusive: OffsetDateTime,
    pub series_limit: usize,
    pub docs_limit: usize,
}

impl QueryOptions {
    pub fn window(start: OffsetDateTime, end: OffsetDateTime, limits: &Limits) -> Self {
        Self {
            start_inclusive: start,
            end_exclusive: end,
            series_limit: limits.series,
            docs_limit: limits.docs,
        }
    }

    /// `[epoch, now)`, used by the index lookups that ignore time.
    pub fn since_epoch(limits: &Limits) -> Self {
        Self::window(OffsetDateTime::UNIX_EPOCH, OffsetDateTime::now_utc(), limits)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationType {
    TagNames,
    TagNamesAndValues,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationOptions {
    #[serde(flatten)]
    pub query: QueryOptions,
    /// Restrict the aggregation to these fields; `None` aggregates all of them.
    pub field_filter: Option<Vec<String>>,
    pub aggregation_type: AggregationType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledQuery {
    pub query: QueryNode,
    pub options: QueryOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledAggregation {
    pub query: QueryNode,
    pub options: AggregationOptions,
}
