//! Tokenizer for compact `key=value,key=value` tag strings.

use std::collections::HashMap;
use winnow::combinator::{alt, separated, separated_pair};
use winnow::prelude::*;
use winnow::token::take_till;

// Manually define PResult for resilience against winnow version changes
type PResult<T> = Result<T, winnow::error::ErrMode<winnow::error::ContextError>>;

/// One comma-separated segment. `None` when the segment has no `=`.
fn segment<'s>(input: &mut &'s str) -> PResult<Option<(&'s str, &'s str)>> {
    alt((
        separated_pair(take_till(0.., ['=', ',']), '=', take_till(0.., ',')).map(Some),
        take_till(0.., ',').value(None),
    ))
    .parse_next(input)
}

fn segments<'s>(input: &mut &'s str) -> PResult<Vec<Option<(&'s str, &'s str)>>> {
    separated(0.., segment, ',').parse_next(input)
}

/// Decode a tag string into a key-unique map.
///
/// Spaces are removed before splitting. A segment without `=`, or with an
/// empty key, is skipped. The value is everything after the first `=`, so
/// `a=b=c` decodes to `a -> b=c`. Later duplicates of a key win.
pub fn decode_tags(input: &str) -> HashMap<String, String> {
    let stripped: String = input.chars().filter(|c| *c != ' ').collect();
    let mut tags = HashMap::new();
    if stripped.is_empty() {
        return tags;
    }

    let mut remaining = stripped.as_str();
    let parsed = match segments(&mut remaining) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!("Tags: failed to tokenize '{}': {:?}", input, e);
            return tags;
        }
    };

    for item in parsed {
        match item {
            Some((key, value)) if !key.is_empty() => {
                tags.insert(key.to_string(), value.to_string());
            }
            _ => tracing::debug!("Tags: skipping malformed segment in '{}'", input),
        }
    }

    tags
}

/// Encode tags as `k1=v1,k2=v2` with keys in sorted order.
pub fn encode_tags(tags: &HashMap<String, String>) -> String {
    let mut pairs: Vec<(&String, &String)> = tags.iter().collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}
