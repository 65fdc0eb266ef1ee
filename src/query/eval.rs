//! Evaluate a query tree against a single indexed document.

use super::ast::QueryNode;
use std::collections::HashMap;

/// Decide whether a document (field -> value) matches the tree.
pub fn evaluate(node: &QueryNode, doc: &HashMap<String, String>) -> bool {
    match node {
        QueryNode::All => true,

        QueryNode::Term { field, value } => doc.get(field).is_some_and(|v| v == value),

        QueryNode::Field { field } => doc.contains_key(field),

        QueryNode::Conjunction(children) => children.iter().all(|c| evaluate(c, doc)),

        QueryNode::Disjunction(children) => children.iter().any(|c| evaluate(c, doc)),

        QueryNode::Negation(inner) => !evaluate(inner, doc),
    }
}
