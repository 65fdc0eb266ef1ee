//! Request types, one per compiler, in the JSON shape callers send.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::filter::{TagPair, null_as_default};

/// One series lookup of a batch data query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryData {
    /// Unix seconds, inclusive
    pub start: i64,
    /// Unix seconds, exclusive
    pub end: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub consol_func: String,
    #[serde(deserialize_with = "null_as_default")]
    pub endpoints: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub nids: Vec<String>,
    /// `metric/k=v,...`
    #[serde(deserialize_with = "null_as_default")]
    pub counters: Vec<String>,
    pub step: u32,
    #[serde(rename = "dstype", deserialize_with = "null_as_default")]
    pub ds_type: String,
}

/// Query issued by the dashboard for a single metric.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryDataForUi {
    pub start: i64,
    pub end: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub metric: String,
    #[serde(deserialize_with = "null_as_default")]
    pub endpoints: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub nids: Vec<String>,
    /// `k=v,...` expressions, any of which may match
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    pub step: u32,
    #[serde(rename = "dstype", deserialize_with = "null_as_default")]
    pub ds_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub group_key: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub aggr_func: String,
    #[serde(deserialize_with = "null_as_default")]
    pub consol_func: String,
    #[serde(deserialize_with = "null_as_default")]
    pub comparisons: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointsRecv {
    #[serde(deserialize_with = "null_as_default")]
    pub endpoints: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointMetricRecv {
    #[serde(deserialize_with = "null_as_default")]
    pub endpoints: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub metrics: Vec<String>,
}

/// Index lookup by included and excluded tag values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CludeRecv {
    #[serde(deserialize_with = "null_as_default")]
    pub endpoints: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub metric: String,
    #[serde(deserialize_with = "null_as_default")]
    pub include: Vec<TagPair>,
    #[serde(deserialize_with = "null_as_default")]
    pub exclude: Vec<TagPair>,
}

/// Index lookup by a complete tag set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct IndexByFullTagsRecv {
    #[serde(deserialize_with = "null_as_default")]
    pub endpoints: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub metric: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tagkv: TagKv,
}

/// Tag keys with their accepted values, either as a pair list
/// (`[{"tagk": "host", "tagv": ["a"]}]`) or a flat map (`{"host": ["a"]}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TagKv {
    Pairs(Vec<TagPair>),
    Map(BTreeMap<String, Vec<String>>),
}

impl Default for TagKv {
    fn default() -> Self {
        TagKv::Pairs(Vec::new())
    }
}

impl TagKv {
    pub fn is_empty(&self) -> bool {
        match self {
            TagKv::Pairs(pairs) => pairs.is_empty(),
            TagKv::Map(map) => map.is_empty(),
        }
    }

    pub fn to_pairs(&self) -> Vec<TagPair> {
        match self {
            TagKv::Pairs(pairs) => pairs.clone(),
            TagKv::Map(map) => map
                .iter()
                .map(|(key, values)| TagPair {
                    key: key.clone(),
                    values: values.clone(),
                })
                .collect(),
        }
    }
}
