//! Expression rules: operators, references, constructors and calls

use super::precedence::{op_prio, op_symbol};
use super::tokens::Tokens;
use super::Classifier;
use crate::value::{NodeMeta, Value};
use gex_ir::{CallInfo, ConstructorInfo, TreeCode, TreeData, TreeId};

impl Classifier<'_> {
    fn prio(&self, node: Option<TreeId>) -> u32 {
        op_prio(self.arena, node)
    }

    /// `IS_EMPTY_STMT`: a `NOP_EXPR` of type `void`.
    fn is_empty_stmt(&self, node: Option<TreeId>) -> bool {
        let arena = self.arena;
        node.is_some_and(|id| {
            *arena.code(id) == TreeCode::NopExpr
                && arena
                    .ty(id)
                    .is_some_and(|ty| *arena.code(ty) == TreeCode::VoidType)
        })
    }

    pub(super) fn binary(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let prio = self.prio(Some(id));
        let lhs = self.op(id, 0);
        let rhs = self.op(id, 1);
        let mut t = Tokens::new(meta);
        let paren = self.prio(lhs) <= prio;
        self.sub_paren(&mut t, lhs, paren);
        t.space();
        t.text(op_symbol(self.arena.code(id)));
        t.space();
        let paren = self.prio(rhs) <= prio;
        self.sub_paren(&mut t, rhs, paren);
        t.complex()
    }

    pub(super) fn unary(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let arena = self.arena;
        let code = arena.code(id);
        let operand = self.op(id, 0);
        let mut t = Tokens::new(meta);
        let implicit_address = *code == TreeCode::AddrExpr
            && matches!(
                self.code_of(operand),
                Some(TreeCode::StringCst) | Some(TreeCode::FunctionDecl)
            );
        if !implicit_address {
            t.text(op_symbol(code));
        }
        let paren = self.prio(operand) < self.prio(Some(id));
        self.sub_paren(&mut t, operand, paren);
        t.complex()
    }

    pub(super) fn postfix(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let operand = self.op(id, 0);
        let mut t = Tokens::new(meta);
        let paren = self.prio(operand) < self.prio(Some(id));
        self.sub_paren(&mut t, operand, paren);
        t.text(op_symbol(self.arena.code(id)));
        t.complex()
    }

    /// `(type) op`, the cast omitted when the operand already has the type.
    pub(super) fn conversion(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let arena = self.arena;
        let operand = self.op(id, 0);
        let ty = arena.ty(id);
        let mut t = Tokens::new(meta);
        if ty != operand.and_then(|op| arena.ty(op)) {
            t.lparen();
            self.sub(&mut t, ty);
            t.text(") ");
        }
        let paren = self.prio(operand) < self.prio(Some(id));
        self.sub_paren(&mut t, operand, paren);
        t.complex()
    }

    pub(super) fn component_ref(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let arena = self.arena;
        let mut object = self.op(id, 0);
        let mut accessor = ".";
        if let Some(base) = object {
            let through_pointer = match arena.code(base) {
                TreeCode::IndirectRef => true,
                TreeCode::MemRef => {
                    self.code_of(self.op(base, 0)) != Some(&TreeCode::AddrExpr)
                        && self.memref_is_canonical(base)
                }
                _ => false,
            };
            if through_pointer {
                object = self.op(base, 0);
                accessor = "->";
            }
        }

        let mut t = Tokens::new(meta);
        let paren = self.prio(object) < self.prio(Some(id));
        self.sub_paren(&mut t, object, paren);
        t.text(accessor);
        let field = self.op(id, 1);
        self.sub(&mut t, field);

        let offset = self.op(id, 2).or_else(|| {
            field
                .and_then(|field| arena.decl_info(field))
                .and_then(|info| info.field_offset)
        });
        if let Some(offset) = offset.filter(|offset| *arena.code(*offset) != TreeCode::IntegerCst) {
            t.text("{off: ");
            self.sub(&mut t, Some(offset));
            t.rbrace();
        }
        t.complex()
    }

    pub(super) fn bit_insert(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let arena = self.arena;
        let mut t = Tokens::new(meta);
        t.text("BIT_INSERT_EXPR <");
        self.sub(&mut t, self.op(id, 0));
        t.text(", ");
        self.sub(&mut t, self.op(id, 1));
        t.text(", ");
        self.sub(&mut t, self.op(id, 2));
        t.text(" (");
        let inserted_ty = self.op(id, 1).and_then(|value| arena.ty(value));
        match inserted_ty {
            Some(ty) if arena.code(ty).is_integral_type() => {
                t.text(arena.type_precision(ty).to_string());
            }
            _ => {
                let size = inserted_ty
                    .and_then(|ty| arena.type_info(ty))
                    .and_then(|info| info.size);
                self.sub(&mut t, size);
            }
        }
        t.text(" bits)>");
        t.complex()
    }

    pub(super) fn array_ref(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let arena = self.arena;
        let array = self.op(id, 0);
        let mut t = Tokens::new(meta.clone());
        let paren = self.prio(array) < self.prio(Some(id));
        self.sub_paren(&mut t, array, paren);
        t.lbracket();
        self.sub(&mut t, self.op(id, 1));
        if meta.code == TreeCode::ArrayRangeRef {
            t.text(" ...");
        }
        t.rbracket();

        let array_ty = array.and_then(|array| arena.ty(array));
        let low = self.op(id, 2).or_else(|| {
            array_ty
                .and_then(|ty| arena.type_info(ty))
                .and_then(|info| info.domain)
                .and_then(|domain| arena.type_info(domain))
                .and_then(|info| info.min_value)
        });
        let size = self.op(id, 3).or_else(|| {
            array_ty
                .and_then(|ty| arena.ty(ty))
                .and_then(|element| arena.type_info(element))
                .and_then(|info| info.size_unit)
        });
        let nonzero_low = low.is_some_and(|low| !arena.is_integer_zero(low));
        if nonzero_low || self.op(id, 2).is_some() || self.op(id, 3).is_some() {
            t.text("{lb: ");
            self.sub(&mut t, low);
            t.text(" sz: ");
            self.sub(&mut t, size);
            t.rbrace();
        }
        t.complex()
    }

    pub(super) fn constructor(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let arena = self.arena;
        let info = match &arena.get(id).data {
            TreeData::Constructor(info) => info.clone(),
            _ => ConstructorInfo::default(),
        };
        let ty = arena.ty(id);
        let mut t = Tokens::new(meta);
        t.text("_Literal (");
        self.sub(&mut t, ty);
        t.text(") ");
        t.lbrace();
        if let Some(clobber) = info.clobber {
            t.text("CLOBBER");
            if clobber == gex_ir::ClobberKind::Eol {
                t.text("(eol)");
            }
        }

        let ty_code = self.code_of(ty);
        let is_struct_init = matches!(
            ty_code,
            Some(TreeCode::RecordType) | Some(TreeCode::UnionType) | Some(TreeCode::QualUnionType)
        );
        let mut curidx = match ty_code {
            Some(TreeCode::ArrayType) => ty
                .and_then(|ty| arena.type_info(ty))
                .and_then(|info| info.domain)
                .and_then(|domain| arena.type_info(domain))
                .and_then(|info| info.min_value)
                .and_then(|min| arena.int_cst(min))
                .map(|min| min.value),
            _ => None,
        };
        let is_array_init = curidx.is_some();

        let count = info.elements.len();
        for (i, elt) in info.elements.into_iter().enumerate() {
            if let Some(field) = elt.index {
                if is_struct_init {
                    t.dot();
                    self.sub(&mut t, Some(field));
                    t.equal();
                } else if is_array_init {
                    let index = arena.int_cst(field).map(|cst| cst.value);
                    if index.is_none() || index != curidx {
                        t.lbracket();
                        if *arena.code(field) == TreeCode::RangeExpr {
                            self.sub(&mut t, self.op(field, 0));
                            t.text(" ... ");
                            let high = self.op(field, 1);
                            self.sub(&mut t, high);
                            if let Some(high) = high.and_then(|high| arena.int_cst(high)) {
                                curidx = Some(high.value);
                            }
                        } else {
                            self.sub(&mut t, Some(field));
                        }
                        if index.is_some() {
                            curidx = index;
                        }
                        t.text("]=");
                    }
                }
            }
            if is_array_init {
                curidx = curidx.map(|idx| idx + 1);
            }

            let mut value = elt.value;
            if let Some(addr) = value.filter(|v| *arena.code(*v) == TreeCode::AddrExpr) {
                if self.code_of(self.op(addr, 0)) == Some(&TreeCode::FunctionDecl) {
                    value = self.op(addr, 0);
                }
            }
            match value {
                Some(decl) if *arena.code(decl) == TreeCode::FunctionDecl => {
                    self.dump_decl_name(decl, &mut t);
                }
                _ => self.sub(&mut t, value),
            }
            if i + 1 != count {
                t.comma_space();
            }
        }
        t.rbrace();
        t.complex()
    }

    pub(super) fn compound_expr(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let mut t = Tokens::new(meta);
        self.sub(&mut t, self.op(id, 0));
        t.comma_space();
        let mut rest = self.op(id, 1);
        while let Some(next) = rest.filter(|next| *self.arena.code(*next) == TreeCode::CompoundExpr) {
            self.sub(&mut t, self.op(next, 0));
            t.comma_space();
            rest = self.op(next, 1);
        }
        self.sub(&mut t, rest);
        t.complex()
    }

    pub(super) fn assignment(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let mut t = Tokens::new(meta);
        self.sub(&mut t, self.op(id, 0));
        t.space();
        t.equal();
        t.space();
        self.sub(&mut t, self.op(id, 1));
        t.complex()
    }

    pub(super) fn cond_expr(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let arena = self.arena;
        let (cond, then, otherwise) = (self.op(id, 0), self.op(id, 1), self.op(id, 2));
        let mut t = Tokens::new(meta);

        let is_statement = arena
            .ty(id)
            .map_or(true, |ty| *arena.code(ty) == TreeCode::VoidType);
        if !is_statement {
            self.sub(&mut t, cond);
            t.space();
            t.text("?");
            t.space();
            self.sub(&mut t, then);
            t.space();
            t.colon();
            t.space();
            self.sub(&mut t, otherwise);
            return t.complex();
        }

        t.text("if (");
        self.sub(&mut t, cond);
        t.rparen();
        let simple_arm = |c: &Self, arm: Option<TreeId>| {
            arm.is_some()
                && (c.is_empty_stmt(arm) || c.code_of(arm) == Some(&TreeCode::GotoExpr))
        };
        if simple_arm(self, then) && simple_arm(self, otherwise) {
            t.space();
            self.sub(&mut t, then);
            if !self.is_empty_stmt(otherwise) {
                t.text(" else ");
                self.sub(&mut t, otherwise);
            }
        } else {
            if then.is_some() {
                t.lbrace();
                self.sub(&mut t, then);
                t.rbrace();
            }
            if otherwise.is_some() && !self.is_empty_stmt(otherwise) {
                t.text("else");
                t.lbrace();
                self.sub(&mut t, otherwise);
                t.rbrace();
            }
        }
        t.complex()
    }

    pub(super) fn bind_expr(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let vars = match &self.arena.get(id).data {
            TreeData::Bind(vars) => vars.clone(),
            _ => Vec::new(),
        };
        let mut t = Tokens::new(meta);
        t.lbrace();
        for var in vars {
            self.print_declaration(var, &mut t);
        }
        self.sub(&mut t, self.op(id, 1));
        t.rbrace();
        t.complex()
    }

    pub(super) fn call_expr(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let call = match &self.arena.get(id).data {
            TreeData::Call(call) => call.clone(),
            _ => CallInfo::default(),
        };
        let mut t = Tokens::new(meta);
        match (call.function, &call.internal_fn) {
            (Some(function), _) => self.print_call_name(function, &mut t),
            (None, Some(internal)) => {
                t.dot();
                t.text(internal.name());
            }
            (None, None) => self.sub(&mut t, None),
        }

        t.space();
        t.lparen();
        for (i, arg) in call.args.iter().enumerate() {
            if i > 0 {
                t.comma_space();
            }
            self.sub(&mut t, *arg);
        }
        if call.va_arg_pack {
            if !call.args.is_empty() {
                t.comma_space();
            }
            t.text("__builtin_va_arg_pack ()");
        }
        t.rparen();

        if call.static_chain.is_some() {
            t.text(" [static-chain: ");
            self.sub(&mut t, call.static_chain);
            t.rbracket();
        }
        if call.return_slot_opt {
            t.text(" [return slot optimization]");
        }
        if call.tail_call {
            t.text(" [tail call]");
        }
        t.complex()
    }

    pub(super) fn obj_type_ref(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let class = match &self.arena.get(id).data {
            TreeData::ObjTypeRef { class } => *class,
            _ => None,
        };
        let mut t = Tokens::new(meta);
        t.text("OBJ_TYPE_REF(");
        self.sub(&mut t, self.op(id, 0));
        t.semicolon();
        if class.is_some() {
            t.lparen();
            self.sub(&mut t, class);
            t.rparen();
        }
        self.sub(&mut t, self.op(id, 1));
        t.text("->");
        self.sub(&mut t, self.op(id, 2));
        t.rparen();
        t.complex()
    }

    pub(super) fn polynomial_chrec(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let variable = match &self.arena.get(id).data {
            TreeData::Chrec { variable } => *variable,
            _ => 0,
        };
        let mut t = Tokens::new(meta);
        t.lbrace();
        self.sub(&mut t, self.op(id, 0));
        t.text(", +, ");
        self.sub(&mut t, self.op(id, 1));
        t.text("}_");
        t.text(variable.to_string());
        t.complex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gex_ir::{
        ClobberKind, ConstructorElt, InternalFn, TargetSizes, Tree, TreeArena, TreeBuilder,
    };
    use pretty_assertions::assert_eq;

    fn render(arena: &TreeArena, node: TreeId) -> String {
        Classifier::new(arena, TargetSizes::LP64)
            .classify(Some(node))
            .render()
    }

    #[test]
    fn test_binary_precedence() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let x = b.var_decl("x", int);
        let y = b.var_decl("y", int);
        let sum = b.binary(TreeCode::PlusExpr, int, x, y);
        let product = b.binary(TreeCode::MultExpr, int, sum, y);
        let nested = b.binary(TreeCode::MinusExpr, int, x, sum);
        let arena = b.finish();
        assert_eq!(render(&arena, product), "(x + y) * y");
        assert_eq!(render(&arena, nested), "x - (x + y)");
    }

    #[test]
    fn test_unary_and_postfix() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let x = b.var_decl("x", int);
        let neg = b.unary(TreeCode::NegateExpr, int, x);
        let inc = b.unary(TreeCode::PostincrementExpr, int, x);
        let addr = b.addr_expr(x);
        let fn_ty = b.function_type(int, vec![]);
        let func = b.function_decl("main", fn_ty);
        let fn_addr = b.addr_expr(func);
        let sum = b.binary(TreeCode::PlusExpr, int, x, x);
        let neg_sum = b.unary(TreeCode::NegateExpr, int, sum);
        let arena = b.finish();
        assert_eq!(render(&arena, neg), "-x");
        assert_eq!(render(&arena, inc), "x++");
        assert_eq!(render(&arena, addr), "&x");
        assert_eq!(render(&arena, fn_addr), "main");
        assert_eq!(render(&arena, neg_sum), "-(x + x)");
    }

    #[test]
    fn test_conversion() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let long = b.integer_type(Some("long int"), 64, false);
        let x = b.var_decl("x", int);
        let widen = b.unary(TreeCode::NopExpr, long, x);
        let same = b.unary(TreeCode::ConvertExpr, int, x);
        let arena = b.finish();
        assert_eq!(render(&arena, widen), "(long int) x");
        assert_eq!(render(&arena, same), "x");
    }

    #[test]
    fn test_component_ref_through_pointer() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let rec = b.record_type(Some("point"));
        let field = b.field_decl("y", int);
        let s = b.var_decl("s", rec);
        let direct = b.component_ref(s, field);
        let ptr_ty = b.pointer_type(rec);
        let p = b.var_decl("p", ptr_ty);
        let deref = b.mem_ref(rec, p, 0);
        let arrow = b.component_ref(deref, field);
        let arena = b.finish();
        assert_eq!(render(&arena, direct), "s.y");
        assert_eq!(render(&arena, arrow), "p->y");
    }

    #[test]
    fn test_array_ref() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let arr_ty = b.array_type(int, Some(4));
        let a = b.var_decl("a", arr_ty);
        let i = b.var_decl("i", int);
        let elt = b.expr(TreeCode::ArrayRef, Some(int), vec![Some(a), Some(i), None, None]);
        let arena = b.finish();
        assert_eq!(render(&arena, elt), "a[i]");
    }

    #[test]
    fn test_array_ref_with_explicit_bounds() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let arr_ty = b.array_type(int, Some(4));
        let a = b.var_decl("a", arr_ty);
        let one = b.int_cst(int, 1);
        let four = b.int_cst(int, 4);
        let elt = b.expr(TreeCode::ArrayRef, Some(int), vec![Some(a), Some(one), Some(one), Some(four)]);
        let arena = b.finish();
        assert_eq!(render(&arena, elt), "a[1]{lb: 1 sz: 4}");
    }

    #[test]
    fn test_struct_and_array_constructors() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let rec = b.record_type(Some("pair"));
        let fa = b.field_decl("a", int);
        let one = b.int_cst(int, 1);
        let two = b.int_cst(int, 2);
        let five = b.int_cst(int, 5);
        let ctor = b.add(Tree::new(TreeCode::Constructor).with_type(rec).with_data(
            TreeData::Constructor(ConstructorInfo {
                elements: vec![ConstructorElt {
                    index: Some(fa),
                    value: Some(one),
                }],
                clobber: None,
            }),
        ));
        let arr_ty = b.array_type(int, Some(8));
        let long = b.integer_type(Some("long int"), 64, false);
        let idx0 = b.int_cst(long, 0);
        let idx5 = b.int_cst(long, 5);
        let arr = b.add(Tree::new(TreeCode::Constructor).with_type(arr_ty).with_data(
            TreeData::Constructor(ConstructorInfo {
                elements: vec![
                    ConstructorElt {
                        index: Some(idx0),
                        value: Some(one),
                    },
                    ConstructorElt {
                        index: Some(idx5),
                        value: Some(two),
                    },
                    ConstructorElt {
                        index: None,
                        value: Some(five),
                    },
                ],
                clobber: None,
            }),
        ));
        let clobber = b.add(Tree::new(TreeCode::Constructor).with_type(rec).with_data(
            TreeData::Constructor(ConstructorInfo {
                elements: Vec::new(),
                clobber: Some(ClobberKind::Eol),
            }),
        ));
        let arena = b.finish();
        assert_eq!(render(&arena, ctor), "_Literal (struct pair) {.a=1}");
        assert_eq!(render(&arena, arr), "_Literal (int[8]) {1, [5l]=2, 5}");
        assert_eq!(render(&arena, clobber), "_Literal (struct pair) {CLOBBER(eol)}");
    }

    #[test]
    fn test_compound_and_assignment() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let x = b.var_decl("x", int);
        let y = b.var_decl("y", int);
        let z = b.var_decl("z", int);
        let set = b.binary(TreeCode::ModifyExpr, int, x, y);
        let inner = b.binary(TreeCode::CompoundExpr, int, y, z);
        let outer = b.binary(TreeCode::CompoundExpr, int, set, inner);
        let arena = b.finish();
        assert_eq!(render(&arena, set), "x = y");
        assert_eq!(render(&arena, outer), "x = y, y, z");
    }

    #[test]
    fn test_cond_expr_forms() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let void = b.void_type();
        let c = b.var_decl("c", int);
        let x = b.var_decl("x", int);
        let y = b.var_decl("y", int);
        let ternary = b.expr(TreeCode::CondExpr, Some(int), vec![Some(c), Some(x), Some(y)]);
        let label = b.decl(TreeCode::LabelDecl, Some("done"), Some(void));
        let goto = b.expr(TreeCode::GotoExpr, Some(void), vec![Some(label)]);
        let empty = b.expr(TreeCode::NopExpr, Some(void), vec![]);
        let jump = b.expr(TreeCode::CondExpr, Some(void), vec![Some(c), Some(goto), Some(empty)]);
        let set = b.binary(TreeCode::ModifyExpr, int, x, y);
        let block = b.expr(TreeCode::CondExpr, None, vec![Some(c), Some(set), None]);
        let arena = b.finish();
        assert_eq!(render(&arena, ternary), "c ? x : y");
        assert_eq!(render(&arena, jump), "if (c) goto done");
        assert_eq!(render(&arena, block), "if (c){x = y}");
    }

    #[test]
    fn test_calls() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let fn_ty = b.function_type(int, vec![int, int]);
        let func = b.function_decl("max", fn_ty);
        let addr = b.addr_expr(func);
        let x = b.var_decl("x", int);
        let y = b.var_decl("y", int);
        let call = b.call_expr(int, addr, vec![x, y]);
        if let TreeData::Call(info) = &mut b.tree_mut(call).data {
            info.tail_call = true;
        }
        let internal = b.add(Tree::new(TreeCode::CallExpr).with_type(int).with_data(TreeData::Call(
            CallInfo {
                internal_fn: Some(InternalFn::Other("ADD_OVERFLOW".into())),
                args: vec![Some(x), Some(y)],
                ..CallInfo::default()
            },
        )));
        let arena = b.finish();
        assert_eq!(render(&arena, call), "max (x, y) [tail call]");
        assert_eq!(render(&arena, internal), ".ADD_OVERFLOW (x, y)");
    }

    #[test]
    fn test_polynomial_chrec() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let zero = b.int_cst(int, 0);
        let one = b.int_cst(int, 1);
        let chrec = b.expr(TreeCode::PolynomialChrec, Some(int), vec![Some(zero), Some(one)]);
        b.tree_mut(chrec).data = TreeData::Chrec { variable: 1 };
        let arena = b.finish();
        assert_eq!(render(&arena, chrec), "{0, +, 1}_1");
    }
}
