//! Canonical value model
//!
//! Classifying a tree node produces a [`NodeValue`]: a token stream of
//! [`Value`]s. A value is either a leaf token ([`Payload::Simple`]) or an
//! interior node ([`Payload::Complex`]) whose children interleave literal
//! punctuation with the values of sub-nodes, in the order a pretty-printer
//! would write them. Every value carries the [`NodeMeta`] of the node that
//! produced it.

use gex_common::SourceLocation;
use gex_ir::{TreeCode, TreeCodeClass};

/// Shared metadata of every value a node produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMeta {
    pub code: TreeCode,
    pub class: TreeCodeClass,
    pub is_expr: bool,
    /// Operand count of expression nodes; zero otherwise. Descriptive only.
    pub operand_length: usize,
    pub location: Option<SourceLocation>,
}

impl NodeMeta {
    pub fn new(code: TreeCode) -> Self {
        let class = code.class();
        Self {
            is_expr: class.is_expression(),
            code,
            class,
            operand_length: 0,
            location: None,
        }
    }

    /// Metadata attached to the `NULL` token of an absent node.
    pub fn null() -> Self {
        Self::new(TreeCode::ErrorMark)
    }

    pub fn code_name(&self) -> &str {
        self.code.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.class.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Simple(String),
    Complex(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    pub meta: NodeMeta,
    pub payload: Payload,
}

impl Value {
    pub fn simple(meta: NodeMeta, text: impl Into<String>) -> Self {
        Self {
            meta,
            payload: Payload::Simple(text.into()),
        }
    }

    pub fn complex(meta: NodeMeta, children: Vec<Value>) -> Self {
        Self {
            meta,
            payload: Payload::Complex(children),
        }
    }

    pub fn is_simple(&self) -> bool {
        matches!(self.payload, Payload::Simple(_))
    }

    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            Payload::Simple(text) => Some(text),
            Payload::Complex(_) => None,
        }
    }

    pub fn children(&self) -> &[Value] {
        match &self.payload {
            Payload::Simple(_) => &[],
            Payload::Complex(children) => children,
        }
    }

    /// Concatenated leaf text, depth first.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut String) {
        match &self.payload {
            Payload::Simple(text) => out.push_str(text),
            Payload::Complex(children) => children.iter().for_each(|child| child.render_into(out)),
        }
    }

    /// Number of values in this subtree, this one included.
    pub fn count(&self) -> usize {
        1 + self.children().iter().map(Value::count).sum::<usize>()
    }
}

/// The values produced by classifying one node
///
/// Never empty when produced by the classifier; an absent optional operand
/// is represented by an empty `NodeValue` only in records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeValue {
    pub values: Vec<Value>,
}

impl NodeValue {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// The first value; classification always yields at least one.
    pub fn first(&self) -> Option<&Value> {
        self.values.first()
    }

    pub fn render(&self) -> String {
        self.values.iter().map(Value::render).collect()
    }
}

impl From<Vec<Value>> for NodeValue {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}
