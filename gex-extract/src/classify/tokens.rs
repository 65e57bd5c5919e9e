//! Token accumulator for one node's rule

use crate::value::{NodeMeta, Value};

/// Children being collected for the node described by `meta`
///
/// Punctuation pushed through the helpers carries the node's own metadata,
/// as do the values of nested declarations printed inline.
pub(crate) struct Tokens {
    meta: NodeMeta,
    pub(crate) values: Vec<Value>,
}

impl Tokens {
    pub(crate) fn new(meta: NodeMeta) -> Self {
        Self {
            meta,
            values: Vec::new(),
        }
    }

    pub(crate) fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    pub(crate) fn text(&mut self, text: impl Into<String>) {
        self.values.push(Value::simple(self.meta.clone(), text));
    }

    pub(crate) fn space(&mut self) {
        self.text(" ");
    }

    pub(crate) fn comma(&mut self) {
        self.text(",");
    }

    /// `,` then ` `, the list separator.
    pub(crate) fn comma_space(&mut self) {
        self.comma();
        self.space();
    }

    pub(crate) fn colon(&mut self) {
        self.text(":");
    }

    pub(crate) fn semicolon(&mut self) {
        self.text(";");
    }

    pub(crate) fn lparen(&mut self) {
        self.text("(");
    }

    pub(crate) fn rparen(&mut self) {
        self.text(")");
    }

    pub(crate) fn lbracket(&mut self) {
        self.text("[");
    }

    pub(crate) fn rbracket(&mut self) {
        self.text("]");
    }

    pub(crate) fn lbrace(&mut self) {
        self.text("{");
    }

    pub(crate) fn rbrace(&mut self) {
        self.text("}");
    }

    pub(crate) fn greater(&mut self) {
        self.text(">");
    }

    pub(crate) fn equal(&mut self) {
        self.text("=");
    }

    pub(crate) fn dot(&mut self) {
        self.text(".");
    }

    pub(crate) fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Wrap the collected children into one complex value.
    pub(crate) fn complex(self) -> Value {
        Value::complex(self.meta, self.values)
    }

    pub(crate) fn into_values(self) -> Vec<Value> {
        self.values
    }
}
