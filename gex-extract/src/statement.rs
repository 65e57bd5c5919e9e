//! Statement extraction
//!
//! [`StatementExtractor::extract`] turns one GIMPLE statement into a
//! [`Statement`]: the fields every statement has, plus a per-kind payload
//! whose operands are classified with the node classifier.

use crate::classify::Classifier;
use crate::value::{NodeValue, Value};
use gex_ir::{
    BuiltinFunction, Edge, Gimple, GimpleAsm, GimpleAssign, GimpleCall, GimpleCond, GimpleKind,
    GimplePhi, GimpleSwitch, GimpleTry, TargetSizes, TreeArena, TreeCode, TreeId,
};
use log::trace;

pub const NOP_MARKER: &str = "GIMPLE_NOP";

/// Transaction property bits of a `__builtin__ITM_beginTransaction` call,
/// in the order they are reported.
pub const TRANSACTION_PROPERTIES: &[(i128, &str)] = &[
    (0x1, "instrumentedCode"),
    (0x2, "uninstrumentedCode"),
    (0x4, "hasNoXMMUpdate"),
    (0x8, "hasNoAbort"),
    (0x20, "hasNoIrrevocable"),
    (0x40, "doesGoIrrevocable"),
    (0x80, "hasNoSimpleReads"),
    (0x100, "awBarriersOmitted"),
    (0x200, "RaRBarriersOmitted"),
    (0x400, "undoLogCode"),
    (0x800, "preferUninstrumented"),
    (0x1000, "exceptionBlock"),
    (0x2000, "hasElse"),
    (0x4000, "readOnly"),
];

/// One extracted statement
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub code_name: &'static str,
    /// Lower-case tree code name of the computed expression.
    pub expr_code: String,
    pub line: u32,
    pub has_substatements: bool,
    pub has_register_or_memory_operands: bool,
    pub has_memory_operands: bool,
    pub num_ops: usize,
    pub block_index: i32,
    pub block_edges: Vec<i32>,
    /// `# .MEM_2 = VDEF <.MEM_1>`; when set, `vuse` is not recorded.
    pub vdef: Option<NodeValue>,
    /// `# VUSE <.MEM_1>`
    pub vuse: Option<NodeValue>,
    pub args: StatementArgs,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementArgs {
    Asm(AsmArgs),
    Assign(AssignArgs),
    Bind(BindArgs),
    Call(Box<CallArgs>),
    Cond(CondArgs),
    Label { label: NodeValue, non_local: bool },
    Goto { dest: NodeValue },
    Nop,
    Return { value: Option<NodeValue> },
    Switch(SwitchArgs),
    Try(TryArgs),
    Phi(PhiArgs),
    /// Statement kinds without a payload.
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AsmArgs {
    pub string: String,
    pub inputs: Vec<NodeValue>,
    pub outputs: Vec<NodeValue>,
    pub clobbers: Vec<NodeValue>,
    pub labels: Vec<NodeValue>,
    pub volatile: bool,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignArgs {
    pub subcode: String,
    pub lhs: NodeValue,
    /// Right-hand operands; `None` past the operator's arity.
    pub rhs: [Option<NodeValue>; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub struct BindArgs {
    /// Every variable's declaration, one flat token sequence.
    pub vars: NodeValue,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallArgs {
    pub is_internal: bool,
    /// Empty unless the call is internal.
    pub internal_name: String,
    pub num_args: usize,
    pub lhs: Option<NodeValue>,
    pub is_tm_clone: bool,
    pub transaction_properties: Vec<String>,
    pub return_slot_opt: bool,
    pub tail_call: bool,
    pub must_tail_call: bool,
    pub static_chain: Option<NodeValue>,
    /// Empty for internal calls.
    pub function: NodeValue,
    pub args: Vec<NodeValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CondArgs {
    pub lhs: NodeValue,
    pub rhs: NodeValue,
    pub code_name: String,
    pub true_label: Option<NodeValue>,
    pub false_label: Option<NodeValue>,
    pub true_edge: Option<i32>,
    pub false_edge: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchArgs {
    pub index: NodeValue,
    pub case_labels: Vec<NodeValue>,
    /// Target label of each case, positionally paired with `case_labels`.
    pub labels: Vec<NodeValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryArgs {
    pub kind: &'static str,
    pub eval: Vec<Statement>,
    pub cleanup: Option<Vec<Statement>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhiArgs {
    pub lhs: NodeValue,
    pub args: Vec<NodeValue>,
    pub src_indices: Vec<i32>,
    /// `file:line` of each argument, empty when the host has none.
    pub locations: Vec<String>,
}

/// Block a statement is extracted in
#[derive(Debug, Clone, Copy)]
pub struct BlockRef<'b> {
    pub index: i32,
    pub successors: &'b [Edge],
}

impl BlockRef<'_> {
    fn edges(&self) -> Vec<i32> {
        self.successors.iter().map(|edge| edge.dest).collect()
    }
}

pub struct StatementExtractor<'a> {
    classifier: Classifier<'a>,
}

impl<'a> StatementExtractor<'a> {
    pub fn new(arena: &'a TreeArena, target: TargetSizes) -> Self {
        Self {
            classifier: Classifier::new(arena, target),
        }
    }

    pub fn classifier(&mut self) -> &mut Classifier<'a> {
        &mut self.classifier
    }

    fn arena(&self) -> &'a TreeArena {
        self.classifier.arena()
    }

    fn classify(&mut self, node: Option<TreeId>) -> NodeValue {
        self.classifier.classify(node)
    }

    fn classify_all(&mut self, nodes: &[Option<TreeId>]) -> Vec<NodeValue> {
        nodes.iter().map(|node| self.classify(*node)).collect()
    }

    /// Extract `stmt`, owned by `block`.
    ///
    /// # Panics
    ///
    /// Panics if an assignment does not have between one and three
    /// right-hand operands. [`gex_ir::FunctionIr::validate`] rejects such
    /// functions before extraction.
    pub fn extract(&mut self, stmt: &Gimple, block: BlockRef<'_>) -> Statement {
        let code = stmt.code();
        trace!("extracting {} in bb {}", code.name(), block.index);
        let (vdef, vuse) = self.memory_operands(stmt);
        let args = match &stmt.kind {
            GimpleKind::Asm(asm) => StatementArgs::Asm(self.asm(asm)),
            GimpleKind::Assign(assign) => StatementArgs::Assign(self.assign(assign)),
            GimpleKind::Bind(bind) => {
                let mut vars = Vec::new();
                for var in &bind.vars {
                    vars.extend(self.classifier.declaration(*var).values);
                }
                StatementArgs::Bind(BindArgs {
                    vars: NodeValue::new(vars),
                    body: self.extract_seq(&bind.body, block),
                })
            }
            GimpleKind::Call(call) => StatementArgs::Call(Box::new(self.call(call))),
            GimpleKind::Cond(cond) => StatementArgs::Cond(self.cond(cond, block)),
            GimpleKind::Label(label) => StatementArgs::Label {
                label: self.classify(Some(label.label)),
                non_local: self
                    .arena()
                    .decl_info(label.label)
                    .is_some_and(|info| info.nonlocal),
            },
            GimpleKind::Goto(goto) => StatementArgs::Goto {
                dest: self.classify(goto.dest),
            },
            GimpleKind::Nop => StatementArgs::Nop,
            GimpleKind::Return(ret) => StatementArgs::Return {
                value: ret.retval.map(|value| self.classify(Some(value))),
            },
            GimpleKind::Switch(switch) => StatementArgs::Switch(self.switch(switch)),
            GimpleKind::Try(try_) => StatementArgs::Try(self.try_region(try_, block)),
            GimpleKind::Phi(phi) => StatementArgs::Phi(self.phi(phi)),
            GimpleKind::Other(_) => StatementArgs::Other,
        };

        Statement {
            code_name: code.name(),
            expr_code: stmt.expr_code().name().to_string(),
            line: stmt.line(),
            has_substatements: code.has_substatements(),
            has_register_or_memory_operands: code.has_ops(),
            has_memory_operands: code.has_mem_ops(),
            num_ops: stmt.num_ops(),
            block_index: block.index,
            block_edges: block.edges(),
            vdef,
            vuse,
            args,
        }
    }

    /// Nested statements inherit the enclosing block.
    fn extract_seq(&mut self, seq: &[Gimple], block: BlockRef<'_>) -> Vec<Statement> {
        seq.iter().map(|stmt| self.extract(stmt, block)).collect()
    }

    fn memory_operands(&mut self, stmt: &Gimple) -> (Option<NodeValue>, Option<NodeValue>) {
        let c = &mut self.classifier;
        if let Some(vdef) = stmt.vdef {
            let meta = c.meta(vdef);
            let use_meta = c.meta_of(stmt.vuse);
            let def_values = c.classify(Some(vdef)).values;
            let use_values = c.classify(stmt.vuse).values;
            let values = vec![
                Value::simple(meta.clone(), "# "),
                Value::complex(meta.clone(), def_values),
                Value::simple(meta.clone(), " = VDEF <"),
                Value::complex(use_meta, use_values),
                Value::simple(meta, ">"),
            ];
            return (Some(NodeValue::new(values)), None);
        }
        if let Some(vuse) = stmt.vuse {
            let meta = c.meta(vuse);
            let use_values = c.classify(Some(vuse)).values;
            let values = vec![
                Value::simple(meta.clone(), "# VUSE <"),
                Value::complex(meta.clone(), use_values),
                Value::simple(meta, ">"),
            ];
            return (None, Some(NodeValue::new(values)));
        }
        (None, None)
    }

    fn asm(&mut self, asm: &GimpleAsm) -> AsmArgs {
        AsmArgs {
            string: asm.string.clone(),
            inputs: self.classify_all(&asm.inputs),
            outputs: self.classify_all(&asm.outputs),
            clobbers: self.classify_all(&asm.clobbers),
            labels: self.classify_all(&asm.labels),
            volatile: asm.volatile,
            inline: asm.inline,
        }
    }

    fn assign(&mut self, assign: &GimpleAssign) -> AssignArgs {
        assert!(
            (1..=3).contains(&assign.rhs.len()),
            "gimple_assign `{}` with {} operands",
            assign.rhs_code.name(),
            assign.rhs.len() + 1
        );
        let mut rhs: [Option<NodeValue>; 3] = [None, None, None];
        for (slot, operand) in rhs.iter_mut().zip(&assign.rhs) {
            *slot = Some(self.classify(*operand));
        }
        AssignArgs {
            subcode: assign.rhs_code.name().to_string(),
            lhs: self.classify(assign.lhs),
            rhs,
        }
    }

    /// The callee with any `&` stripped.
    fn callee_decl(&self, call: &GimpleCall) -> Option<TreeId> {
        let arena = self.arena();
        let function = call.function?;
        let decl = match arena.code(function) {
            TreeCode::AddrExpr => arena.operand(function, 0)?,
            _ => function,
        };
        (*arena.code(decl) == TreeCode::FunctionDecl).then_some(decl)
    }

    fn transaction_properties(&self, call: &GimpleCall) -> Vec<String> {
        let arena = self.arena();
        let starts_transaction = self
            .callee_decl(call)
            .and_then(|decl| arena.decl_info(decl))
            .is_some_and(|info| info.builtin == Some(BuiltinFunction::TmStart));
        if !starts_transaction {
            return Vec::new();
        }
        let Some(props) = call
            .args
            .first()
            .copied()
            .flatten()
            .and_then(|arg| arena.int_cst(arg))
        else {
            return Vec::new();
        };
        TRANSACTION_PROPERTIES
            .iter()
            .filter(|(bit, _)| props.value & bit != 0)
            .map(|(_, name)| name.to_string())
            .collect()
    }

    fn call_args(&mut self, call: &GimpleCall) -> Vec<NodeValue> {
        let arena = self.arena();
        let names = call
            .internal_fn
            .as_ref()
            .map_or(&[][..], |internal| internal.first_arg_names());
        let mut args = Vec::with_capacity(call.args.len());
        for (i, arg) in call.args.iter().enumerate() {
            let symbolic = (i == 0)
                .then_some(*arg)
                .flatten()
                .and_then(|arg| arena.int_cst(arg))
                .and_then(|cst| usize::try_from(cst.value).ok())
                .and_then(|index| names.get(index));
            match symbolic {
                Some(name) => {
                    let meta = self.classifier.meta_of(*arg);
                    args.push(NodeValue::new(vec![Value::simple(meta, *name)]));
                }
                None => args.push(self.classify(*arg)),
            }
        }
        args
    }

    fn call(&mut self, call: &GimpleCall) -> CallArgs {
        let is_tm_clone = self
            .callee_decl(call)
            .and_then(|decl| self.arena().decl_info(decl))
            .is_some_and(|info| info.tm_clone);
        let transaction_properties = self.transaction_properties(call);
        CallArgs {
            is_internal: call.internal_fn.is_some(),
            internal_name: call
                .internal_fn
                .as_ref()
                .map(|internal| internal.name().to_string())
                .unwrap_or_default(),
            num_args: call.args.len(),
            lhs: call.lhs.map(|lhs| self.classify(Some(lhs))),
            is_tm_clone,
            transaction_properties,
            return_slot_opt: call.return_slot_opt,
            tail_call: call.tail_call,
            must_tail_call: call.must_tail_call,
            static_chain: call.static_chain.map(|chain| self.classify(Some(chain))),
            function: match call.function {
                Some(function) => self.classify(Some(function)),
                None => NodeValue::empty(),
            },
            args: self.call_args(call),
        }
    }

    fn cond(&mut self, cond: &GimpleCond, block: BlockRef<'_>) -> CondArgs {
        let mut true_edge = None;
        let mut false_edge = None;
        for edge in block.successors {
            if edge.flags.true_value {
                true_edge = Some(edge.dest);
            } else if edge.flags.false_value {
                false_edge = Some(edge.dest);
            }
        }
        CondArgs {
            lhs: self.classify(cond.lhs),
            rhs: self.classify(cond.rhs),
            code_name: cond.code.name().to_string(),
            true_label: cond.true_label.map(|label| self.classify(Some(label))),
            false_label: cond.false_label.map(|label| self.classify(Some(label))),
            true_edge,
            false_edge,
        }
    }

    fn switch(&mut self, switch: &GimpleSwitch) -> SwitchArgs {
        let arena = self.arena();
        let mut case_labels = Vec::with_capacity(switch.labels.len());
        let mut labels = Vec::with_capacity(switch.labels.len());
        for case in &switch.labels {
            case_labels.push(self.classify(Some(*case)));
            labels.push(self.classify(arena.operand(*case, 2)));
        }
        SwitchArgs {
            index: self.classify(switch.index),
            case_labels,
            labels,
        }
    }

    fn try_region(&mut self, try_: &GimpleTry, block: BlockRef<'_>) -> TryArgs {
        let cleanup = if try_.cleanup.is_empty() {
            None
        } else {
            Some(self.extract_seq(&try_.cleanup, block))
        };
        TryArgs {
            kind: try_.kind.name(),
            eval: self.extract_seq(&try_.eval, block),
            cleanup,
        }
    }

    fn phi(&mut self, phi: &GimplePhi) -> PhiArgs {
        let mut args = Vec::with_capacity(phi.args.len());
        let mut src_indices = Vec::with_capacity(phi.args.len());
        let mut locations = Vec::with_capacity(phi.args.len());
        for arg in &phi.args {
            args.push(self.classify(arg.def));
            src_indices.push(arg.src);
            locations.push(
                arg.location
                    .as_ref()
                    .map(|loc| loc.file_line())
                    .unwrap_or_default(),
            );
        }
        PhiArgs {
            lhs: self.classify(phi.result),
            args,
            src_indices,
            locations,
        }
    }
}
