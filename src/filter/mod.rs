//! Reusable filter fragments built from query primitives.
//!
//! Every builder degrades to `*` (match all) when it has nothing to filter
//! on, so that "no filter given" accepts everything instead of nothing.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::config::FieldNames;
use crate::query::QueryNode;
use crate::tagstring::{decode_tags, parse_counter};

/// A key with the values it may take: `key=v1|v2|...`
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct TagPair {
    #[serde(rename = "tagk")]
    pub key: String,
    #[serde(rename = "tagv", default, deserialize_with = "null_as_default")]
    pub values: Vec<String>,
}

/// Reads an explicit `null` as the default value, the way Go encodes nil
/// slices and maps.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl TagPair {
    pub fn new(key: impl Into<String>, values: &[&str]) -> Self {
        Self {
            key: key.into(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// `||(children...)`, or `*` when there are no children.
pub fn disjunction_or_all(children: Vec<QueryNode>) -> QueryNode {
    if children.is_empty() {
        QueryNode::all()
    } else {
        QueryNode::disjunction(children)
    }
}

/// `&&(children...)`, or `*` when there are no children.
pub fn conjunction_or_all(children: Vec<QueryNode>) -> QueryNode {
    if children.is_empty() {
        QueryNode::all()
    } else {
        QueryNode::conjunction(children)
    }
}

fn terms(field: &str, values: &[String]) -> Vec<QueryNode> {
    values.iter().map(|v| QueryNode::term(field, v)).collect()
}

/// Tag terms in key order.
fn tag_terms(tags: &HashMap<String, String>) -> Vec<QueryNode> {
    let mut pairs: Vec<(&String, &String)> = tags.iter().collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| QueryNode::term(k, v))
        .collect()
}

/// `||(nid=...)` when nids are given, else `||(endpoint=...)`, else `*`.
///
/// Node identifiers take precedence: endpoints are ignored whenever at
/// least one nid is present.
pub fn endpoints_filter(fields: &FieldNames, nids: &[String], endpoints: &[String]) -> QueryNode {
    if !nids.is_empty() {
        return QueryNode::disjunction(terms(&fields.nid, nids));
    }
    if !endpoints.is_empty() {
        return QueryNode::disjunction(terms(&fields.endpoint, endpoints));
    }
    QueryNode::all()
}

/// `metric=name`
pub fn metric_filter(fields: &FieldNames, metric: &str) -> QueryNode {
    QueryNode::term(&fields.metric, metric)
}

/// `||(metric=m1, metric=m2, ...)`. Callers pass a non-empty set; an empty
/// one yields `*`.
pub fn metrics_filter(fields: &FieldNames, metrics: &[String]) -> QueryNode {
    disjunction_or_all(terms(&fields.metric, metrics))
}

/// `||(&&(metric=m, k1=v1, ...), ...)` over the well-formed counters.
///
/// Counters without a `/` are dropped. `*` if none are left.
pub fn counter_filter(fields: &FieldNames, counters: &[String]) -> QueryNode {
    let mut q = Vec::with_capacity(counters.len());

    for raw in counters {
        let Some(counter) = parse_counter(raw) else {
            tracing::debug!("Filter: dropping malformed counter '{}'", raw);
            continue;
        };
        tracing::trace!("Filter: counter {}", counter);

        let mut conj = Vec::with_capacity(counter.tags.len() + 1);
        conj.push(metric_filter(fields, &counter.metric));
        conj.extend(tag_terms(&counter.tags));
        q.push(QueryNode::conjunction(conj));
    }

    disjunction_or_all(q)
}

/// `||(&&(k1=v1, k2=v2), ...)` over free-form tag expressions.
///
/// An expression that decodes to no tags is dropped. `*` if none are left.
pub fn tags_filter(expressions: &[String]) -> QueryNode {
    let mut q = Vec::with_capacity(expressions.len());

    for expr in expressions {
        let tags = decode_tags(expr);
        if tags.is_empty() {
            tracing::debug!("Filter: dropping empty tag expression '{}'", expr);
            continue;
        }
        q.push(QueryNode::conjunction(tag_terms(&tags)));
    }

    disjunction_or_all(q)
}

/// `&&(||(k1=a, k1=b), ||(k2=c), ...)`: every key must match one of its values.
///
/// Pairs without values contribute nothing. `*` if no pair has values.
pub fn include_tags_filter(pairs: &[TagPair]) -> QueryNode {
    let q = pairs
        .iter()
        .filter(|pair| !pair.values.is_empty())
        .map(|pair| QueryNode::disjunction(terms(&pair.key, &pair.values)))
        .collect();

    conjunction_or_all(q)
}

/// `&&(&&(!(k1=a), !(k1=b)), ...)`: none of the listed values may match.
///
/// Pairs without values contribute nothing. `*` if no pair has values.
pub fn exclude_tags_filter(pairs: &[TagPair]) -> QueryNode {
    let q = pairs
        .iter()
        .filter(|pair| !pair.values.is_empty())
        .map(|pair| {
            QueryNode::conjunction(
                pair.values
                    .iter()
                    .map(|v| QueryNode::negation(QueryNode::term(&pair.key, v)))
                    .collect(),
            )
        })
        .collect();

    conjunction_or_all(q)
}
