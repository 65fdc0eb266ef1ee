//! Compact tag-string encoding used by counters.
//!
//! Syntax:
//!   key=value,key=value         - tag set
//!   metric/key=value,...        - counter (metric plus tag set)

mod decode;

pub use decode::{decode_tags, encode_tags};

use std::collections::HashMap;
use std::fmt;

/// A counter split into its metric and tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCounter {
    pub metric: String,
    pub tags: HashMap<String, String>,
}

impl fmt::Display for ParsedCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.metric, encode_tags(&self.tags))
    }
}

/// Split a counter on its first `/`. Returns `None` when there is no `/`.
pub fn parse_counter(counter: &str) -> Option<ParsedCounter> {
    let (metric, tags) = counter.split_once('/')?;
    Some(ParsedCounter {
        metric: metric.to_string(),
        tags: decode_tags(tags),
    })
}
