//! GIMPLE statements
//!
//! A [`Gimple`] statement is one of the twelve statement kinds the extractor
//! understands, or [`GimpleKind::Other`] for the remaining host statement
//! codes. The query methods mirror the host accessors the extractor reads
//! (`gimple_code`, `gimple_expr_code`, `gimple_num_ops`, ...).

use crate::internal_fn::InternalFn;
use crate::tree::TreeId;
use crate::tree_code::TreeCode;
use gex_common::SourceLocation;
use serde::{Deserialize, Serialize};

/// Host statement code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GimpleCode {
    ErrorMark,
    Cond,
    Debug,
    Goto,
    Label,
    Switch,
    Assign,
    Asm,
    Call,
    Transaction,
    Return,
    Bind,
    Catch,
    EhFilter,
    EhMustNotThrow,
    EhElse,
    Resx,
    EhDispatch,
    Phi,
    Try,
    Nop,
    OmpParallel,
    OmpTask,
    OmpFor,
    OmpReturn,
    Predict,
    WithCleanupExpr,
}

impl GimpleCode {
    pub fn name(self) -> &'static str {
        match self {
            GimpleCode::ErrorMark => "gimple_error_mark",
            GimpleCode::Cond => "gimple_cond",
            GimpleCode::Debug => "gimple_debug",
            GimpleCode::Goto => "gimple_goto",
            GimpleCode::Label => "gimple_label",
            GimpleCode::Switch => "gimple_switch",
            GimpleCode::Assign => "gimple_assign",
            GimpleCode::Asm => "gimple_asm",
            GimpleCode::Call => "gimple_call",
            GimpleCode::Transaction => "gimple_transaction",
            GimpleCode::Return => "gimple_return",
            GimpleCode::Bind => "gimple_bind",
            GimpleCode::Catch => "gimple_catch",
            GimpleCode::EhFilter => "gimple_eh_filter",
            GimpleCode::EhMustNotThrow => "gimple_eh_must_not_throw",
            GimpleCode::EhElse => "gimple_eh_else",
            GimpleCode::Resx => "gimple_resx",
            GimpleCode::EhDispatch => "gimple_eh_dispatch",
            GimpleCode::Phi => "gimple_phi",
            GimpleCode::Try => "gimple_try",
            GimpleCode::Nop => "gimple_nop",
            GimpleCode::OmpParallel => "gimple_omp_parallel",
            GimpleCode::OmpTask => "gimple_omp_task",
            GimpleCode::OmpFor => "gimple_omp_for",
            GimpleCode::OmpReturn => "gimple_omp_return",
            GimpleCode::Predict => "gimple_predict",
            GimpleCode::WithCleanupExpr => "gimple_with_cleanup_expr",
        }
    }

    /// Statements with an operand vector.
    pub fn has_ops(self) -> bool {
        matches!(
            self,
            GimpleCode::Cond
                | GimpleCode::Debug
                | GimpleCode::Goto
                | GimpleCode::Label
                | GimpleCode::Switch
                | GimpleCode::Assign
                | GimpleCode::Asm
                | GimpleCode::Call
                | GimpleCode::Transaction
                | GimpleCode::Return
        )
    }

    /// Statements carrying virtual definition/use operands.
    pub fn has_mem_ops(self) -> bool {
        matches!(
            self,
            GimpleCode::Assign
                | GimpleCode::Asm
                | GimpleCode::Call
                | GimpleCode::Transaction
                | GimpleCode::Return
        )
    }

    pub fn has_substatements(self) -> bool {
        matches!(
            self,
            GimpleCode::Bind
                | GimpleCode::Catch
                | GimpleCode::EhFilter
                | GimpleCode::EhElse
                | GimpleCode::Try
                | GimpleCode::OmpParallel
                | GimpleCode::OmpTask
                | GimpleCode::OmpFor
                | GimpleCode::Transaction
                | GimpleCode::WithCleanupExpr
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gimple {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vdef: Option<TreeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vuse: Option<TreeId>,
    pub kind: GimpleKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GimpleKind {
    Asm(GimpleAsm),
    Assign(GimpleAssign),
    Bind(GimpleBind),
    Call(GimpleCall),
    Cond(GimpleCond),
    Label(GimpleLabel),
    Goto(GimpleGoto),
    Nop,
    Return(GimpleReturn),
    Switch(GimpleSwitch),
    Try(GimpleTry),
    Phi(GimplePhi),
    Other(GimpleOther),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GimpleAsm {
    pub string: String,
    pub volatile: bool,
    pub inline: bool,
    pub outputs: Vec<Option<TreeId>>,
    pub inputs: Vec<Option<TreeId>>,
    pub clobbers: Vec<Option<TreeId>>,
    pub labels: Vec<Option<TreeId>>,
}

/// `lhs = rhs[0] <rhs_code> rhs[1] ...`; one to three right-hand operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GimpleAssign {
    pub rhs_code: TreeCode,
    pub lhs: Option<TreeId>,
    pub rhs: Vec<Option<TreeId>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GimpleBind {
    pub vars: Vec<TreeId>,
    pub body: Vec<Gimple>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GimpleCall {
    pub lhs: Option<TreeId>,
    /// Callee; `None` for internal function calls.
    pub function: Option<TreeId>,
    pub internal_fn: Option<InternalFn>,
    pub args: Vec<Option<TreeId>>,
    pub static_chain: Option<TreeId>,
    pub return_slot_opt: bool,
    pub tail_call: bool,
    pub must_tail_call: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GimpleCond {
    pub code: TreeCode,
    pub lhs: Option<TreeId>,
    pub rhs: Option<TreeId>,
    #[serde(default)]
    pub true_label: Option<TreeId>,
    #[serde(default)]
    pub false_label: Option<TreeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GimpleLabel {
    pub label: TreeId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GimpleGoto {
    pub dest: Option<TreeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GimpleReturn {
    pub retval: Option<TreeId>,
}

/// `labels` holds the `CASE_LABEL_EXPR` nodes, default case first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GimpleSwitch {
    pub index: Option<TreeId>,
    pub labels: Vec<TreeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TryKind {
    Catch,
    Finally,
}

impl TryKind {
    pub fn name(self) -> &'static str {
        match self {
            TryKind::Catch => "GIMPLE_TRY_CATCH",
            TryKind::Finally => "GIMPLE_TRY_FINALLY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GimpleTry {
    pub kind: TryKind,
    #[serde(default)]
    pub eval: Vec<Gimple>,
    #[serde(default)]
    pub cleanup: Vec<Gimple>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhiArg {
    pub def: Option<TreeId>,
    /// Index of the block the incoming edge leaves.
    pub src: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GimplePhi {
    pub result: Option<TreeId>,
    pub args: Vec<PhiArg>,
}

/// A statement kind without a dedicated payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GimpleOther {
    pub code: GimpleCode,
    #[serde(default)]
    pub ops: Vec<Option<TreeId>>,
}

impl Gimple {
    pub fn new(kind: GimpleKind) -> Self {
        Self {
            location: None,
            vdef: None,
            vuse: None,
            kind,
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_vops(mut self, vdef: Option<TreeId>, vuse: Option<TreeId>) -> Self {
        self.vdef = vdef;
        self.vuse = vuse;
        self
    }

    pub fn code(&self) -> GimpleCode {
        match &self.kind {
            GimpleKind::Asm(_) => GimpleCode::Asm,
            GimpleKind::Assign(_) => GimpleCode::Assign,
            GimpleKind::Bind(_) => GimpleCode::Bind,
            GimpleKind::Call(_) => GimpleCode::Call,
            GimpleKind::Cond(_) => GimpleCode::Cond,
            GimpleKind::Label(_) => GimpleCode::Label,
            GimpleKind::Goto(_) => GimpleCode::Goto,
            GimpleKind::Nop => GimpleCode::Nop,
            GimpleKind::Return(_) => GimpleCode::Return,
            GimpleKind::Switch(_) => GimpleCode::Switch,
            GimpleKind::Try(_) => GimpleCode::Try,
            GimpleKind::Phi(_) => GimpleCode::Phi,
            GimpleKind::Other(other) => other.code,
        }
    }

    pub fn code_name(&self) -> &'static str {
        self.code().name()
    }

    /// Tree code of the computed expression: the right-hand side operator
    /// of an assignment, the predicate of a condition, `CALL_EXPR` for
    /// calls and `ERROR_MARK` for everything else.
    pub fn expr_code(&self) -> TreeCode {
        match &self.kind {
            GimpleKind::Assign(assign) => assign.rhs_code.clone(),
            GimpleKind::Cond(cond) => cond.code.clone(),
            GimpleKind::Call(_) => TreeCode::CallExpr,
            _ => TreeCode::ErrorMark,
        }
    }

    pub fn num_ops(&self) -> usize {
        match &self.kind {
            GimpleKind::Asm(asm) => {
                asm.outputs.len() + asm.inputs.len() + asm.clobbers.len() + asm.labels.len()
            }
            GimpleKind::Assign(assign) => 1 + assign.rhs.len(),
            GimpleKind::Call(call) => 3 + call.args.len(),
            GimpleKind::Cond(_) => 4,
            GimpleKind::Label(_) | GimpleKind::Goto(_) | GimpleKind::Return(_) => 1,
            GimpleKind::Switch(switch) => 1 + switch.labels.len(),
            GimpleKind::Other(other) => other.ops.len(),
            GimpleKind::Bind(_) | GimpleKind::Nop | GimpleKind::Try(_) | GimpleKind::Phi(_) => 0,
        }
    }

    pub fn line(&self) -> u32 {
        self.location.as_ref().map_or(0, |loc| loc.line)
    }

    /// Every tree id the statement refers to, nested statements included.
    pub fn tree_refs(&self) -> Vec<TreeId> {
        let mut refs: Vec<TreeId> = [self.vdef, self.vuse].into_iter().flatten().collect();
        match &self.kind {
            GimpleKind::Asm(asm) => {
                for ops in [&asm.outputs, &asm.inputs, &asm.clobbers, &asm.labels] {
                    refs.extend(ops.iter().flatten().copied());
                }
            }
            GimpleKind::Assign(assign) => {
                refs.extend(assign.lhs);
                refs.extend(assign.rhs.iter().flatten().copied());
            }
            GimpleKind::Bind(bind) => {
                refs.extend(bind.vars.iter().copied());
                refs.extend(bind.body.iter().flat_map(Gimple::tree_refs));
            }
            GimpleKind::Call(call) => {
                refs.extend([call.lhs, call.function, call.static_chain].into_iter().flatten());
                refs.extend(call.args.iter().flatten().copied());
            }
            GimpleKind::Cond(cond) => refs.extend(
                [cond.lhs, cond.rhs, cond.true_label, cond.false_label]
                    .into_iter()
                    .flatten(),
            ),
            GimpleKind::Label(label) => refs.push(label.label),
            GimpleKind::Goto(goto) => refs.extend(goto.dest),
            GimpleKind::Nop => {}
            GimpleKind::Return(ret) => refs.extend(ret.retval),
            GimpleKind::Switch(switch) => {
                refs.extend(switch.index);
                refs.extend(switch.labels.iter().copied());
            }
            GimpleKind::Try(try_) => {
                refs.extend(try_.eval.iter().flat_map(Gimple::tree_refs));
                refs.extend(try_.cleanup.iter().flat_map(Gimple::tree_refs));
            }
            GimpleKind::Phi(phi) => refs.extend(phi.tree_refs()),
            GimpleKind::Other(other) => refs.extend(other.ops.iter().flatten().copied()),
        }
        refs
    }
}

impl GimplePhi {
    pub fn tree_refs(&self) -> Vec<TreeId> {
        self.result
            .into_iter()
            .chain(self.args.iter().filter_map(|arg| arg.def))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assign(rhs: usize) -> Gimple {
        Gimple::new(GimpleKind::Assign(GimpleAssign {
            rhs_code: TreeCode::PlusExpr,
            lhs: Some(TreeId(0)),
            rhs: vec![Some(TreeId(1)); rhs],
        }))
    }

    #[test]
    fn test_assign_queries() {
        let stmt = assign(2);
        assert_eq!(stmt.code().name(), "gimple_assign");
        assert_eq!(stmt.expr_code(), TreeCode::PlusExpr);
        assert_eq!(stmt.num_ops(), 3);
        assert!(stmt.code().has_ops());
        assert!(stmt.code().has_mem_ops());
        assert!(!stmt.code().has_substatements());
    }

    #[test]
    fn test_non_expression_statements() {
        let nop = Gimple::new(GimpleKind::Nop);
        assert_eq!(nop.expr_code(), TreeCode::ErrorMark);
        assert_eq!(nop.num_ops(), 0);
        assert!(!nop.code().has_ops());

        let bind = Gimple::new(GimpleKind::Bind(GimpleBind::default()));
        assert!(bind.code().has_substatements());
    }

    #[test]
    fn test_tree_refs_include_nested() {
        let stmt = Gimple::new(GimpleKind::Try(GimpleTry {
            kind: TryKind::Finally,
            eval: vec![assign(1)],
            cleanup: vec![Gimple::new(GimpleKind::Goto(GimpleGoto { dest: Some(TreeId(7)) }))],
        }));
        assert_eq!(stmt.tree_refs(), vec![TreeId(0), TreeId(1), TreeId(7)]);
    }
}
