//! Function records
//!
//! A [`FunctionRecord`] is everything extracted from one function, ready to
//! be handed to an encoder.

use crate::statement::Statement;
use crate::value::NodeValue;

/// A function argument with its SSA default definition
#[derive(Debug, Clone, PartialEq)]
pub struct ArgVariable {
    pub arg: NodeValue,
    pub declaration: NodeValue,
    /// Type of the default definition; empty without one.
    pub ty: NodeValue,
    pub default_def: NodeValue,
    /// Underlying variable of the default definition; empty without one.
    pub ssa_name_var: NodeValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalVariable {
    pub arg: NodeValue,
    pub declaration: NodeValue,
}

/// An SSA name with no underlying declaration
#[derive(Debug, Clone, PartialEq)]
pub struct SsaVariable {
    pub arg: NodeValue,
    pub ty: NodeValue,
}

/// One incoming edge of a phi merge
#[derive(Debug, Clone, PartialEq)]
pub struct PhiIncoming {
    /// -1 when the host reports no location.
    pub line: i64,
    pub column: i64,
    pub src: i32,
    pub value: NodeValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhiRecord {
    pub lhs: NodeValue,
    pub incoming: Vec<PhiIncoming>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockRecord {
    pub index: i32,
    pub edges: Vec<i32>,
    pub phis: Vec<PhiRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionRecord {
    pub name: String,
    /// Absolute path of the source file.
    pub filename: String,
    pub start_line: i64,
    pub end_line: i64,
    /// `(line number, text)` for every line of the function, in order.
    pub source_lines: Vec<(String, String)>,
    pub decl: NodeValue,
    pub ssa_names: Vec<NodeValue>,
    pub args: Vec<ArgVariable>,
    pub locals: Vec<LocalVariable>,
    pub ssa_variables: Vec<SsaVariable>,
    pub blocks: Vec<BlockRecord>,
    /// Statements of every block, in block order.
    pub statements: Vec<Statement>,
}

impl FunctionRecord {
    pub fn source_line(&self, line: i64) -> Option<&str> {
        let key = line.to_string();
        self.source_lines
            .iter()
            .find(|(number, _)| *number == key)
            .map(|(_, text)| text.as_str())
    }

    pub fn phi_count(&self) -> usize {
        self.blocks.iter().map(|bb| bb.phis.len()).sum()
    }
}
