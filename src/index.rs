//! Interface of the index engine that executes compiled queries.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::query::{CompiledAggregation, CompiledQuery};

/// An indexed series: field -> value.
pub type Document = HashMap<String, String>;

/// One aggregated tag name with the distinct values seen for it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TagValues {
    pub name: String,
    pub values: Vec<String>,
}

pub trait SearchIndex: Send + Sync {
    /// Documents matching the tree inside the time window, capped by the
    /// series and docs limits.
    fn search(&self, query: &CompiledQuery) -> Result<Vec<Document>>;

    /// Tag names (and values) of the matching documents, restricted to the
    /// field filter when one is set.
    fn aggregate(&self, query: &CompiledAggregation) -> Result<Vec<TagValues>>;
}
