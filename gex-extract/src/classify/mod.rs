//! Node classifier
//!
//! [`Classifier::classify`] turns one tree node into the token stream a
//! pretty-printer would write for it, as a [`NodeValue`]. Each tree code has
//! one rule; the rules live in the submodules by family and all follow the
//! same shape: collect children into a [`Tokens`] carrying the node's
//! metadata, recursing through [`Classifier::value`] for sub-nodes, and wrap
//! them into a single complex value.
//!
//! The host graph may share nodes and may contain cycles. A node that is
//! re-entered while it is still being classified, or a nesting deeper than
//! [`MAX_DEPTH`], yields a `<recursive:code>` token instead of recursing.

mod constants;
mod decls;
mod exprs;
mod memref;
pub mod precedence;
mod statements;
mod tokens;
mod types;

pub use constants::{escape_string_bytes, format_integer, format_real};
pub use decls::fancy_name;

use crate::value::{NodeMeta, NodeValue, Value};
use gex_ir::{TargetSizes, TreeArena, TreeCode, TreeData, TreeId};
use std::collections::HashSet;
use tokens::Tokens;

/// Nesting limit of one classification.
pub const MAX_DEPTH: usize = 256;

pub struct Classifier<'a> {
    arena: &'a TreeArena,
    target: TargetSizes,
    active: HashSet<TreeId>,
    depth: usize,
}

impl<'a> Classifier<'a> {
    pub fn new(arena: &'a TreeArena, target: TargetSizes) -> Self {
        Self {
            arena,
            target,
            active: HashSet::new(),
            depth: 0,
        }
    }

    pub fn arena(&self) -> &'a TreeArena {
        self.arena
    }

    pub fn target(&self) -> TargetSizes {
        self.target
    }

    /// Classify `node`; an absent node is the single token `NULL`.
    pub fn classify(&mut self, node: Option<TreeId>) -> NodeValue {
        NodeValue::new(vec![self.value(node)])
    }

    /// Metadata of `node`. Locations are kept for expressions only.
    pub fn meta(&self, node: TreeId) -> NodeMeta {
        let tree = self.arena.get(node);
        let mut meta = NodeMeta::new(tree.code.clone());
        meta.operand_length = tree.operand_length();
        if meta.is_expr {
            meta.location = tree.location.clone();
        }
        meta
    }

    /// Metadata of an optional node, [`NodeMeta::null`] when absent.
    pub fn meta_of(&self, node: Option<TreeId>) -> NodeMeta {
        node.map_or_else(NodeMeta::null, |id| self.meta(id))
    }

    pub(crate) fn value(&mut self, node: Option<TreeId>) -> Value {
        let Some(id) = node else {
            return Value::simple(NodeMeta::null(), "NULL");
        };
        let meta = self.meta(id);
        if self.depth >= MAX_DEPTH || !self.active.insert(id) {
            let text = format!("<recursive:{}>", meta.code_name());
            return Value::simple(meta, text);
        }
        self.depth += 1;
        let value = self.dispatch(id, meta);
        self.depth -= 1;
        self.active.remove(&id);
        value
    }

    /// Append the value of `node` to `t`.
    fn sub(&mut self, t: &mut Tokens, node: Option<TreeId>) {
        let value = self.value(node);
        t.push(value);
    }

    /// Append `node`, parenthesised when `paren` holds.
    fn sub_paren(&mut self, t: &mut Tokens, node: Option<TreeId>, paren: bool) {
        if paren {
            t.lparen();
        }
        self.sub(t, node);
        if paren {
            t.rparen();
        }
    }

    fn op(&self, node: TreeId, index: usize) -> Option<TreeId> {
        self.arena.operand(node, index)
    }

    fn code_of(&self, node: Option<TreeId>) -> Option<&'a TreeCode> {
        node.map(|id| self.arena.code(id))
    }

    fn dispatch(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        use TreeCode::*;
        let code = meta.code.clone();
        match code {
            ErrorMark => Value::simple(meta, "<<< error >>>"),
            IdentifierNode => {
                let text = self.arena.identifier(id).unwrap_or_default().to_string();
                Value::simple(meta, text)
            }
            TreeList => self.tree_list(id, meta),
            TreeVec => self.tree_vec(id, meta),
            TreeBinfo => {
                let mut t = Tokens::new(meta);
                self.sub(&mut t, self.arena.ty(id));
                t.complex()
            }
            StatementList => self.statement_list(id, meta),

            OffsetType | LangType | WithCleanupExpr | RangeExpr => self.not_implemented(id),

            EnumeralType | BooleanType | IntegerType | RealType | FixedPointType | ComplexType
            | VectorType | VoidType => self.scalar_type(id, meta),
            PointerType | ReferenceType => self.pointer_type(id, meta),
            ArrayType => self.array_type(id, meta),
            RecordType | UnionType | QualUnionType => self.record_type(id, meta),
            FunctionType | MethodType => self.function_type(id, meta),

            IntegerCst => self.integer_cst(id, meta),
            PolyIntCst => self.poly_int_cst(id, meta),
            RealCst => self.real_cst(id, meta),
            FixedCst => {
                let text = match &self.arena.get(id).data {
                    TreeData::Fixed(text) => text.clone(),
                    _ => String::new(),
                };
                Value::simple(meta, text)
            }
            ComplexCst => self.complex_cst(id, meta),
            StringCst => self.string_cst(id, meta),
            VectorCst => self.vector_cst(id, meta),

            FunctionDecl | ConstDecl | VarDecl | ParmDecl | FieldDecl | DebugExprDecl
            | NamespaceDecl | NamelistDecl => {
                let mut t = Tokens::new(meta);
                self.dump_decl_name(id, &mut t);
                t.complex()
            }
            ResultDecl => {
                let mut t = Tokens::new(meta);
                t.text("<retval>");
                self.dump_decl_name(id, &mut t);
                t.complex()
            }
            LabelDecl => self.label_decl(id, meta),
            TypeDecl => self.type_decl(id, meta),

            SsaName => self.ssa_name(id, meta),
            ComponentRef => self.component_ref(id, meta),
            BitFieldRef => self.bracketed(id, meta, "BIT_FIELD_REF <", 3, ">"),
            BitInsertExpr => self.bit_insert(id, meta),
            ArrayRef | ArrayRangeRef => self.array_ref(id, meta),
            MemRef | TargetMemRef => self.mem_ref(id, meta),
            Constructor => self.constructor(id, meta),
            CompoundExpr => self.compound_expr(id, meta),
            ModifyExpr | InitExpr => self.assignment(id, meta),
            TargetExpr => self.bracketed_comma(id, meta, "TARGET_EXPR <"),
            DeclExpr => {
                let mut t = Tokens::new(meta);
                if let Some(decl) = self.op(id, 0) {
                    self.print_declaration(decl, &mut t);
                }
                t.complex()
            }
            CondExpr => self.cond_expr(id, meta),
            BindExpr => self.bind_expr(id, meta),
            CallExpr => self.call_expr(id, meta),
            CleanupPointExpr => self.wrapped(id, meta, "<<cleanup_point ", ">>"),
            PlaceholderExpr => {
                let mut t = Tokens::new(meta);
                t.text("<PLACEHOLDER_EXPR ");
                self.sub(&mut t, self.arena.ty(id));
                t.greater();
                t.complex()
            }

            WidenSumExpr | WidenMultExpr | MultExpr | MultHighpartExpr | PlusExpr
            | PointerPlusExpr | PointerDiffExpr | MinusExpr | TruncDivExpr | CeilDivExpr
            | FloorDivExpr | RoundDivExpr | TruncModExpr | CeilModExpr | FloorModExpr
            | RoundModExpr | RdivExpr | ExactDivExpr | LshiftExpr | RshiftExpr | LrotateExpr
            | RrotateExpr | WidenLshiftExpr | BitIorExpr | BitXorExpr | BitAndExpr
            | TruthAndifExpr | TruthOrifExpr | TruthAndExpr | TruthOrExpr | TruthXorExpr
            | LtExpr | LeExpr | GtExpr | GeExpr | EqExpr | NeExpr | UnltExpr | UnleExpr
            | UngtExpr | UngeExpr | UneqExpr | LtgtExpr | OrderedExpr | UnorderedExpr => {
                self.binary(id, meta)
            }
            NegateExpr | BitNotExpr | TruthNotExpr | AddrExpr | PredecrementExpr
            | PreincrementExpr | IndirectRef => self.unary(id, meta),
            PostdecrementExpr | PostincrementExpr => self.postfix(id, meta),

            MinExpr => self.bracketed(id, meta, "MIN_EXPR <", 2, ">"),
            MaxExpr => self.bracketed(id, meta, "MAX_EXPR <", 2, ">"),
            AbsExpr => self.bracketed(id, meta, "ABS_EXPR <", 1, ">"),
            AbsuExpr => self.bracketed(id, meta, "ABSU_EXPR <", 1, ">"),
            NonLvalueExpr => self.bracketed(id, meta, "NON_LVALUE_EXPR <", 1, ">"),
            SaveExpr => self.bracketed(id, meta, "SAVE_EXPR <", 1, ">"),
            ConjExpr => self.bracketed(id, meta, "CONJ_EXPR <", 1, ">"),
            RealpartExpr => self.bracketed(id, meta, "REALPART_EXPR <", 1, ">"),
            ImagpartExpr => self.bracketed(id, meta, "IMAGPART_EXPR <", 1, ">"),
            VaArgExpr => self.bracketed(id, meta, "VA_ARG_EXPR <", 1, ">"),
            ComplexExpr => self.bracketed(id, meta, "COMPLEX_EXPR <", 2, ">"),
            WithSizeExpr => self.bracketed(id, meta, "WITH_SIZE_EXPR <", 2, ">"),
            AssertExpr => self.bracketed(id, meta, "ASSERT_EXPR <", 2, ">"),
            RealignLoadExpr => self.bracketed(id, meta, "REALIGN_LOAD <", 3, ">"),
            VecCondExpr => self.spaced(id, meta, " VEC_COND_EXPR < ", " , "),
            VecPermExpr => self.spaced(id, meta, " VEC_PERM_EXPR < ", " , "),
            DotProdExpr => self.spaced(id, meta, " DOT_PROD_EXPR < ", ", "),
            WidenMultPlusExpr => self.spaced(id, meta, " WIDEN_MULT_PLUS_EXPR < ", ", "),
            WidenMultMinusExpr => self.spaced(id, meta, " WIDEN_MULT_MINUS_EXPR < ", ", "),

            AddrSpaceConvertExpr | FixedConvertExpr | FixTruncExpr | FloatExpr | NopExpr
            | ConvertExpr => self.conversion(id, meta),
            ViewConvertExpr => {
                let mut t = Tokens::new(meta);
                t.text("VIEW_CONVERT_EXPR<");
                self.sub(&mut t, self.arena.ty(id));
                t.text(">(");
                self.sub(&mut t, self.op(id, 0));
                t.rparen();
                t.complex()
            }
            ParenExpr => self.wrapped(id, meta, "((", "))"),
            ObjTypeRef => self.obj_type_ref(id, meta),
            ScevKnown => Value::simple(meta, "scev_known"),
            ScevNotKnown => Value::simple(meta, "scev_not_known"),
            PolynomialChrec => self.polynomial_chrec(id, meta),

            TryCatchExpr | TryFinallyExpr => self.try_expr(id, meta),
            CatchExpr => self.catch_expr(id, meta),
            EhFilterExpr => self.eh_filter(id, meta),
            LabelExpr => self.label_expr(id, meta),
            LoopExpr => self.wrapped_block(id, meta, "while (1)"),
            PredictExpr => self.predict_expr(id, meta),
            AnnotateExpr => self.annotate_expr(id, meta),
            ReturnExpr => self.return_expr(id, meta),
            ExitExpr => self.wrapped(id, meta, "if (", ") break"),
            SwitchExpr => self.switch_expr(id, meta),
            GotoExpr => self.goto_expr(id, meta),
            AsmExpr => self.asm_expr(id, meta),
            CaseLabelExpr => self.case_label(id, meta),

            Block | OmpClause | NullptrType | VoidCst | ImportedDecl | TranslationUnitDecl
            | FmaExpr | TransactionExpr | VecSeriesExpr | VecDuplicateExpr | EhElseExpr
            | LangSpecific(_) => {
                let text = format!("<<< Unknown tree: {} >>", meta.code_name());
                Value::simple(meta, text)
            }
        }
    }

    /// Rendering of a code without a dedicated rule: its name and, for
    /// expressions, every operand.
    fn not_implemented(&mut self, id: TreeId) -> Value {
        let meta = self.meta(id);
        let mut t = Tokens::new(meta);
        let name = t.meta().code_name().to_string();
        let is_expr = t.meta().is_expr;
        t.text("<<< Unknown tree: ");
        t.text(name);
        if is_expr {
            let operands = self.arena.get(id).operands.clone();
            for operand in operands {
                self.sub(&mut t, operand);
            }
        }
        t.text(" >>>");
        t.complex()
    }

    /// `open a, b, ... close` over the first `arity` operands.
    fn bracketed(&mut self, id: TreeId, meta: NodeMeta, open: &str, arity: usize, close: &str) -> Value {
        let mut t = Tokens::new(meta);
        t.text(open);
        for i in 0..arity {
            if i > 0 {
                t.text(", ");
            }
            self.sub(&mut t, self.op(id, i));
        }
        t.text(close);
        t.complex()
    }

    /// `open a sep b sep c > ` over three operands.
    fn spaced(&mut self, id: TreeId, meta: NodeMeta, open: &str, sep: &str) -> Value {
        let mut t = Tokens::new(meta);
        t.text(open);
        for i in 0..3 {
            if i > 0 {
                t.text(sep);
            }
            self.sub(&mut t, self.op(id, i));
        }
        t.text(" > ");
        t.complex()
    }

    /// `open a, b>` with the comma and space as separate tokens.
    fn bracketed_comma(&mut self, id: TreeId, meta: NodeMeta, open: &str) -> Value {
        let mut t = Tokens::new(meta);
        t.text(open);
        self.sub(&mut t, self.op(id, 0));
        t.comma_space();
        self.sub(&mut t, self.op(id, 1));
        t.greater();
        t.complex()
    }

    /// `open a close` around operand 0.
    fn wrapped(&mut self, id: TreeId, meta: NodeMeta, open: &str, close: &str) -> Value {
        let mut t = Tokens::new(meta);
        t.text(open);
        self.sub(&mut t, self.op(id, 0));
        t.text(close);
        t.complex()
    }

    /// `head { a }` around operand 0.
    fn wrapped_block(&mut self, id: TreeId, meta: NodeMeta, head: &str) -> Value {
        let mut t = Tokens::new(meta);
        t.text(head);
        t.lbrace();
        self.sub(&mut t, self.op(id, 0));
        t.rbrace();
        t.complex()
    }

    fn tree_list(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let mut t = Tokens::new(meta);
        let mut seen = HashSet::new();
        let mut current = Some(id);
        while let Some(link) = current {
            if !seen.insert(link) {
                break;
            }
            let TreeData::List(list) = &self.arena.get(link).data else {
                break;
            };
            let list = list.clone();
            if list.purpose.is_some() {
                self.sub(&mut t, list.purpose);
                t.space();
            }
            self.sub(&mut t, list.value);
            current = list.chain.filter(|next| {
                *self.arena.code(*next) == TreeCode::TreeList && !seen.contains(next)
            });
            if current.is_some() {
                t.comma_space();
            }
        }
        t.complex()
    }

    fn elements(&self, id: TreeId) -> Vec<Option<TreeId>> {
        match &self.arena.get(id).data {
            TreeData::Elements(elements) => elements.clone(),
            _ => Vec::new(),
        }
    }

    fn tree_vec(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let mut t = Tokens::new(meta);
        for (i, element) in self.elements(id).into_iter().enumerate() {
            if i > 0 {
                t.comma_space();
            }
            self.sub(&mut t, element);
        }
        t.complex()
    }

    fn statement_list(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let mut t = Tokens::new(meta);
        for element in self.elements(id) {
            self.sub(&mut t, element);
        }
        t.complex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gex_ir::{Tree, TreeBuilder, TreeListNode};
    use pretty_assertions::assert_eq;

    fn render(arena: &TreeArena, node: Option<TreeId>) -> String {
        Classifier::new(arena, TargetSizes::LP64).classify(node).render()
    }

    #[test]
    fn test_null_node() {
        let arena = TreeArena::new();
        let nv = Classifier::new(&arena, TargetSizes::LP64).classify(None);
        assert_eq!(nv.len(), 1);
        let value = &nv.values[0];
        assert_eq!(value.text(), Some("NULL"));
        assert_eq!(value.meta.code_name(), "error_mark");
    }

    #[test]
    fn test_unknown_code_is_a_simple_value() {
        let mut arena = TreeArena::new();
        let id = arena.add(Tree::new(TreeCode::LangSpecific("FOO_KIND".into())));
        let nv = Classifier::new(&arena, TargetSizes::LP64).classify(Some(id));
        assert_eq!(nv.values[0].text(), Some("<<< Unknown tree: FOO_KIND >>"));
    }

    #[test]
    fn test_not_implemented_lists_operands() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let lo = b.int_cst(int, 1);
        let hi = b.int_cst(int, 4);
        let range = b.binary(TreeCode::RangeExpr, int, lo, hi);
        let arena = b.finish();
        assert_eq!(render(&arena, Some(range)), "<<< Unknown tree: range_expr14 >>>");
    }

    #[test]
    fn test_expression_meta_keeps_location() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let x = b.var_decl("x", int);
        let neg = b.unary(TreeCode::NegateExpr, int, x);
        b.tree_mut(neg).location = Some(gex_common::SourceLocation::new("a.c", 3, 7));
        b.tree_mut(x).location = Some(gex_common::SourceLocation::new("a.c", 1, 5));
        let arena = b.finish();
        let classifier = Classifier::new(&arena, TargetSizes::LP64);
        let meta = classifier.meta(neg);
        assert_eq!(meta.location.map(|loc| loc.line), Some(3));
        assert_eq!(meta.operand_length, 1);
        assert!(classifier.meta(x).location.is_none());
    }

    #[test]
    fn test_self_referencing_list_is_cut() {
        let mut b = TreeBuilder::new();
        let id = b.add(Tree::new(TreeCode::TreeList));
        let value = b.identifier("v");
        b.tree_mut(id).data = TreeData::List(TreeListNode {
            purpose: Some(id),
            value: Some(value),
            chain: Some(id),
        });
        let arena = b.finish();
        assert_eq!(render(&arena, Some(id)), "<recursive:tree_list> v");
    }

    #[test]
    fn test_tree_list_chain() {
        let mut b = TreeBuilder::new();
        let x = b.identifier("x");
        let y = b.identifier("y");
        let second = b.add(Tree::new(TreeCode::TreeList).with_data(TreeData::List(TreeListNode {
            value: Some(y),
            ..TreeListNode::default()
        })));
        let first = b.add(Tree::new(TreeCode::TreeList).with_data(TreeData::List(TreeListNode {
            value: Some(x),
            chain: Some(second),
            ..TreeListNode::default()
        })));
        let arena = b.finish();
        assert_eq!(render(&arena, Some(first)), "x, y");
    }

    #[test]
    fn test_depth_limit() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let mut node = b.var_decl("leaf", int);
        for _ in 0..(MAX_DEPTH + 10) {
            node = b.unary(TreeCode::NegateExpr, int, node);
        }
        let arena = b.finish();
        let text = render(&arena, Some(node));
        assert!(text.contains("<recursive:negate_expr>"));
        assert!(!text.contains("leaf"));
    }

    #[test]
    fn test_shared_operand_is_not_recursive() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let x = b.var_decl("x", int);
        let sum = b.binary(TreeCode::PlusExpr, int, x, x);
        let arena = b.finish();
        assert_eq!(render(&arena, Some(sum)), "x + x");
    }
}
