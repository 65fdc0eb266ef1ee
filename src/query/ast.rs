//! Query tree nodes handed to the index engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A node of the boolean query tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryNode {
    /// Exact equality: `field=value`
    Term { field: String, value: String },

    /// Field has any value: `field=*`
    Field { field: String },

    /// Matches every document
    All,

    /// Boolean AND over the children
    Conjunction(Vec<QueryNode>),

    /// Boolean OR over the children
    Disjunction(Vec<QueryNode>),

    /// Boolean NOT
    Negation(Box<QueryNode>),
}

impl QueryNode {
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        QueryNode::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn field(field: impl Into<String>) -> Self {
        QueryNode::Field {
            field: field.into(),
        }
    }

    pub fn all() -> Self {
        QueryNode::All
    }

    pub fn conjunction(children: Vec<QueryNode>) -> Self {
        QueryNode::Conjunction(children)
    }

    pub fn disjunction(children: Vec<QueryNode>) -> Self {
        QueryNode::Disjunction(children)
    }

    pub fn negation(child: QueryNode) -> Self {
        QueryNode::Negation(Box::new(child))
    }

    /// Rewrite the tree into a canonical form for comparison.
    ///
    /// Nested combinators of the same kind are flattened, single-child
    /// combinators are replaced by their child, and the children of every
    /// combinator are sorted and deduplicated. Trees that only differ in the
    /// order of commutative operands have the same canonical form.
    pub fn canonical(self) -> Self {
        match self {
            QueryNode::Conjunction(children) => {
                let mut flat = Vec::with_capacity(children.len());
                for child in children {
                    match child.canonical() {
                        QueryNode::Conjunction(inner) => flat.extend(inner),
                        other => flat.push(other),
                    }
                }
                flat.sort();
                flat.dedup();
                match flat.len() {
                    1 => flat.remove(0),
                    _ => QueryNode::Conjunction(flat),
                }
            }
            QueryNode::Disjunction(children) => {
                let mut flat = Vec::with_capacity(children.len());
                for child in children {
                    match child.canonical() {
                        QueryNode::Disjunction(inner) => flat.extend(inner),
                        other => flat.push(other),
                    }
                }
                flat.sort();
                flat.dedup();
                match flat.len() {
                    1 => flat.remove(0),
                    _ => QueryNode::Disjunction(flat),
                }
            }
            QueryNode::Negation(inner) => QueryNode::Negation(Box::new(inner.canonical())),
            other => other,
        }
    }
}

fn write_children(f: &mut fmt::Formatter<'_>, op: &str, children: &[QueryNode]) -> fmt::Result {
    write!(f, "{}(", op)?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", child)?;
    }
    write!(f, ")")
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryNode::Term { field, value } => write!(f, "{}={}", field, value),
            QueryNode::Field { field } => write!(f, "{}=*", field),
            QueryNode::All => write!(f, "*"),
            QueryNode::Conjunction(children) => write_children(f, "&&", children),
            QueryNode::Disjunction(children) => write_children(f, "||", children),
            QueryNode::Negation(inner) => write!(f, "!({})", inner),
        }
    }
}
