//! Declaration rules, declaration printing and callee names

use super::tokens::Tokens;
use super::Classifier;
use crate::value::{NodeMeta, NodeValue, Value};
use gex_ir::{DeclInfo, TreeCode, TreeId};

/// Rewrite every internal `D<digits>` token of a compiler-generated name to
/// `Dxxxx`. A token starts the name or follows a `$`, and ends the name or
/// precedes a `$`.
pub fn fancy_name(name: &str) -> String {
    let bytes = name.as_bytes();
    let mut out = String::with_capacity(name.len());
    let mut copied = 0;
    let mut i = 0;
    while i < bytes.len() {
        let at_token_start = i == 0 || bytes[i - 1] == b'$';
        if bytes[i] == b'D' && at_token_start && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
            let mut end = i + 2;
            while bytes.get(end).is_some_and(u8::is_ascii_digit) {
                end += 1;
            }
            if end == bytes.len() || bytes[end] == b'$' {
                out.push_str(&name[copied..i]);
                out.push_str("Dxxxx");
                copied = end;
            }
            i = end;
        } else {
            i += 1;
        }
    }
    out.push_str(&name[copied..]);
    out
}

fn is_loop_exit_name(name: Option<&str>) -> bool {
    matches!(name, Some("break") | Some("continue"))
}

impl Classifier<'_> {
    pub(super) fn decl_info_or_default(&self, id: TreeId) -> DeclInfo {
        self.arena.decl_info(id).cloned().unwrap_or_default()
    }

    /// Display name of a declaration.
    pub(super) fn dump_decl_name(&mut self, id: TreeId, t: &mut Tokens) {
        let arena = self.arena;
        let info = self.decl_info_or_default(id);

        match info.name {
            Some(name) => {
                if let Some(asm_name) = info.assembler_name {
                    t.text(arena.identifier(asm_name).unwrap_or_default());
                } else if info.nameless && info.ignored {
                    t.text("<synthetic>");
                } else if info.nameless {
                    t.text(fancy_name(arena.identifier(name).unwrap_or_default()));
                } else {
                    self.sub(t, Some(name));
                }
            }
            None => match arena.code(id) {
                TreeCode::LabelDecl if info.label_uid.is_some() => {
                    t.text(format!("L_{}", info.label_uid.unwrap_or_default()));
                }
                TreeCode::DebugExprDecl => t.text(format!("D#{}", info.uid)),
                TreeCode::ConstDecl => t.text(format!("C_{}", info.uid)),
                _ => t.text(format!("D_{}", info.uid)),
            },
        }

        if let Some(pt_uid) = info.pt_uid.filter(|pt_uid| *pt_uid != info.uid) {
            t.text(format!("ptD.{}", pt_uid));
        }
    }

    pub(super) fn label_decl(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let info = self.decl_info_or_default(id);
        let mut t = Tokens::new(meta);
        if info.name.is_some() {
            self.dump_decl_name(id, &mut t);
        } else if let Some(label_uid) = info.label_uid {
            t.text(format!("<L{}>", label_uid));
        } else {
            t.text(format!("<D{}>", info.uid));
        }
        t.complex()
    }

    pub(super) fn type_decl(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let arena = self.arena;
        let info = self.decl_info_or_default(id);
        let mut t = Tokens::new(meta);
        if info.undeclared_builtin {
            return t.complex();
        }
        if info.name.is_some() {
            self.dump_decl_name(id, &mut t);
            return t.complex();
        }
        match arena.ty(id) {
            Some(ty) if arena.type_name(ty) != Some(id) => {
                if *arena.code(ty) == TreeCode::UnionType {
                    t.text("union ");
                } else {
                    t.text("struct ");
                }
                self.sub(&mut t, Some(ty));
            }
            _ => t.text("<anon>"),
        }
        t.complex()
    }

    /// `name_N`, with `(D)` for default definitions and `(ab)` for names
    /// used in abnormal phis.
    pub(super) fn ssa_name(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let arena = self.arena;
        let info = arena.ssa_info(id).copied().unwrap_or_default();
        let mut t = Tokens::new(meta);
        if let Some(ident) = arena.ssa_identifier(id) {
            let nameless = arena
                .ssa_var(id)
                .and_then(|var| arena.decl_info(var))
                .is_some_and(|var| var.nameless);
            if nameless {
                t.text(fancy_name(arena.identifier(ident).unwrap_or_default()));
            } else {
                self.sub(&mut t, Some(ident));
            }
        }
        t.text("_");
        t.text(info.version.to_string());
        if info.default_def {
            t.text("(D)");
        }
        if info.occurs_in_abnormal_phi {
            t.text("(ab)");
        }
        t.complex()
    }

    /// The declaration of `decl` as a flat token sequence, e.g.
    /// ` static int n = 7;`. Every token carries the declaration's metadata.
    pub fn declaration(&mut self, decl: TreeId) -> NodeValue {
        let mut t = Tokens::new(self.meta(decl));
        self.print_declaration(decl, &mut t);
        NodeValue::new(t.into_values())
    }

    /// Full C declaration of `decl`, appended to `t`.
    pub(super) fn print_declaration(&mut self, decl: TreeId, t: &mut Tokens) {
        let arena = self.arena;
        let code = arena.code(decl);
        let info = self.decl_info_or_default(decl);
        t.space();

        if *code == TreeCode::NamelistDecl {
            t.text("namelist ");
            self.dump_decl_name(decl, t);
            t.semicolon();
            return;
        }

        if *code == TreeCode::TypeDecl {
            t.text("typedef ");
        }
        if info.register {
            t.text("register ");
        }
        if info.public && info.external {
            t.text("extern ");
        } else if info.is_static {
            t.text("static ");
        }

        let ty = arena.ty(decl);
        match ty {
            Some(array) if *arena.code(array) == TreeCode::ArrayType => {
                self.sub(t, self.innermost_element(array));
                t.space();
                self.sub(t, Some(decl));
                self.dump_array_dimensions(array, t);
            }
            Some(fn_type) if *code == TreeCode::FunctionDecl => {
                self.sub(t, arena.ty(fn_type));
                t.space();
                self.dump_decl_name(decl, t);
                self.dump_function_declaration(fn_type, t);
            }
            _ => {
                self.sub(t, ty);
                t.space();
                self.sub(t, Some(decl));
            }
        }

        if *code == TreeCode::VarDecl && info.hard_register {
            t.text(" __asm__ ");
            t.lparen();
            self.sub(t, info.assembler_name);
            t.rparen();
        }
        if *code != TreeCode::FunctionDecl && info.initial.is_some() {
            t.space();
            t.equal();
            t.space();
            self.sub(t, info.initial);
        }
        if *code == TreeCode::VarDecl && info.value_expr.is_some() {
            t.text(" [value-expr: ");
            self.sub(t, info.value_expr);
            t.rbracket();
        }
        t.semicolon();
    }

    /// The printable name of a callee declaration.
    fn dump_function_name(&mut self, decl: TreeId, t: &mut Tokens) {
        match self.arena.decl_name_str(decl) {
            Some(name) => t.text(name),
            None => self.dump_decl_name(decl, t),
        }
    }

    /// The callee operand of a call, stripped of address-of and
    /// conversions.
    pub(super) fn print_call_name(&mut self, callee: TreeId, t: &mut Tokens) {
        let arena = self.arena;
        let mut current = Some(callee);
        if *arena.code(callee) == TreeCode::NonLvalueExpr {
            current = arena.operand(callee, 0);
        }

        while let Some(op) = current {
            match arena.code(op) {
                TreeCode::VarDecl | TreeCode::ParmDecl | TreeCode::FunctionDecl => {
                    self.dump_function_name(op, t);
                    return;
                }
                TreeCode::AddrExpr | TreeCode::IndirectRef | TreeCode::NopExpr | TreeCode::ConvertExpr => {
                    current = arena.operand(op, 0);
                }
                TreeCode::CondExpr => {
                    t.lparen();
                    self.sub(t, arena.operand(op, 0));
                    t.text(") ? ");
                    self.sub(t, arena.operand(op, 1));
                    t.text(" : ");
                    self.sub(t, arena.operand(op, 2));
                    return;
                }
                TreeCode::ArrayRef => {
                    match arena.operand(op, 0) {
                        Some(base) if *arena.code(base) == TreeCode::VarDecl => {
                            self.dump_function_name(base, t)
                        }
                        _ => self.sub(t, Some(op)),
                    }
                    return;
                }
                TreeCode::MemRef
                    if arena.operand(op, 1).is_some_and(|offset| arena.is_integer_zero(offset)) =>
                {
                    current = arena.operand(op, 0);
                }
                TreeCode::MemRef | TreeCode::ComponentRef | TreeCode::SsaName | TreeCode::ObjTypeRef => {
                    self.sub(t, Some(op));
                    return;
                }
                _ => {
                    let value = self.not_implemented(callee);
                    t.push(value);
                    return;
                }
            }
        }
        self.sub(t, None);
    }

    /// Whether `label` is the artificial label of a `break` or `continue`.
    pub(super) fn is_loop_exit_label(&self, label: Option<TreeId>) -> bool {
        label.is_some_and(|label| {
            *self.arena.code(label) == TreeCode::LabelDecl
                && is_loop_exit_name(self.arena.decl_name_str(label))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gex_ir::{TargetSizes, TreeArena, TreeBuilder, TreeData};
    use pretty_assertions::assert_eq;

    fn render(arena: &TreeArena, node: TreeId) -> String {
        Classifier::new(arena, TargetSizes::LP64)
            .classify(Some(node))
            .render()
    }

    fn declaration(arena: &TreeArena, decl: TreeId) -> String {
        Classifier::new(arena, TargetSizes::LP64)
            .declaration(decl)
            .render()
    }

    #[test]
    fn test_fancy_name() {
        assert_eq!(fancy_name("D1234"), "Dxxxx");
        assert_eq!(fancy_name("foo$D12$bar"), "foo$Dxxxx$bar");
        assert_eq!(fancy_name("D12x"), "D12x");
        assert_eq!(fancy_name("xD12"), "xD12");
        assert_eq!(fancy_name("D"), "D");
        assert_eq!(fancy_name("plain"), "plain");
    }

    #[test]
    fn test_decl_names() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let named = b.var_decl("counter", int);
        let anon = b.decl(TreeCode::VarDecl, None, Some(int));
        let konst = b.decl(TreeCode::ConstDecl, None, Some(int));
        let debug = b.decl(TreeCode::DebugExprDecl, None, Some(int));
        let result = b.decl(TreeCode::ResultDecl, None, Some(int));
        let arena = b.finish();
        let uid = |id| arena.decl_info(id).map(|info| info.uid).unwrap_or_default();
        assert_eq!(render(&arena, named), "counter");
        assert_eq!(render(&arena, anon), format!("D_{}", uid(anon)));
        assert_eq!(render(&arena, konst), format!("C_{}", uid(konst)));
        assert_eq!(render(&arena, debug), format!("D#{}", uid(debug)));
        assert_eq!(render(&arena, result), format!("<retval>D_{}", uid(result)));
    }

    #[test]
    fn test_assembler_name_and_points_to_uid() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let var = b.var_decl("x", int);
        let asm_name = b.identifier("_x_sym");
        let nameless = b.var_decl("D1042", int);
        if let Some(info) = b.decl_info_mut(var) {
            info.assembler_name = Some(asm_name);
            info.pt_uid = Some(7);
        }
        if let Some(info) = b.decl_info_mut(nameless) {
            info.nameless = true;
        }
        let arena = b.finish();
        assert_eq!(render(&arena, var), "_x_symptD.7");
        assert_eq!(render(&arena, nameless), "Dxxxx");
    }

    #[test]
    fn test_decl_name_precedence() {
        // (name, nameless, ignored, assembler name, expected)
        let cases = [
            ("D1234", true, true, Some("real_sym"), "real_sym"),
            ("D1234", true, false, Some("real_sym"), "real_sym"),
            ("count", false, false, Some("real_sym"), "real_sym"),
            ("D1234", true, true, None, "<synthetic>"),
            ("D1234", true, false, None, "Dxxxx"),
            ("SR$D77$x", true, false, None, "SR$Dxxxx$x"),
            ("D1234", false, true, None, "D1234"),
            ("count", false, false, None, "count"),
        ];
        for (name, nameless, ignored, asm, expected) in cases {
            let mut b = TreeBuilder::new();
            let int = b.int_type();
            let var = b.var_decl(name, int);
            let asm_name = asm.map(|asm| b.identifier(asm));
            if let Some(info) = b.decl_info_mut(var) {
                info.nameless = nameless;
                info.ignored = ignored;
                info.assembler_name = asm_name;
            }
            let arena = b.finish();
            assert_eq!(
                render(&arena, var),
                expected,
                "name={} nameless={} ignored={} asm={:?}",
                name,
                nameless,
                ignored,
                asm
            );
        }
    }

    #[test]
    fn test_label_decls() {
        let mut b = TreeBuilder::new();
        let artificial = b.label_decl();
        let numbered = b.label_decl();
        if let Some(info) = b.decl_info_mut(numbered) {
            info.label_uid = Some(3);
        }
        let void = b.void_type();
        let user = b.decl(TreeCode::LabelDecl, Some("out"), Some(void));
        let arena = b.finish();
        let uid = arena.decl_info(artificial).map(|info| info.uid).unwrap_or_default();
        assert_eq!(render(&arena, artificial), format!("<D{}>", uid));
        assert_eq!(render(&arena, numbered), "<L3>");
        assert_eq!(render(&arena, user), "out");
    }

    #[test]
    fn test_type_decls() {
        let mut b = TreeBuilder::new();
        let rec = b.record_type(Some("node"));
        let anon = b.decl(TreeCode::TypeDecl, None, Some(rec));
        let builtin = b.decl(TreeCode::TypeDecl, Some("__int128"), None);
        if let Some(info) = b.decl_info_mut(builtin) {
            info.undeclared_builtin = true;
        }
        let arena = b.finish();
        assert_eq!(render(&arena, anon), "struct struct node");
        let nv = Classifier::new(&arena, TargetSizes::LP64).classify(Some(builtin));
        assert!(nv.values[0].children().is_empty());
        assert!(!nv.values[0].is_simple());
    }

    #[test]
    fn test_print_declaration_variants() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let seven = b.int_cst(int, 7);
        let local = b.var_decl("n", int);
        if let Some(info) = b.decl_info_mut(local) {
            info.initial = Some(seven);
            info.is_static = true;
        }
        let arr_ty = b.array_type(int, Some(8));
        let buf = b.var_decl("buf", arr_ty);
        if let Some(info) = b.decl_info_mut(buf) {
            info.public = true;
            info.external = true;
        }
        let fn_ty = b.function_type(int, vec![int]);
        let func = b.function_decl("square", fn_ty);
        let reg = b.var_decl("sp", int);
        let reg_name = b.identifier("rsp");
        if let Some(info) = b.decl_info_mut(reg) {
            info.register = true;
            info.hard_register = true;
            info.assembler_name = Some(reg_name);
        }
        let arena = b.finish();
        assert_eq!(declaration(&arena, local), " static int n = 7;");
        assert_eq!(declaration(&arena, buf), " extern int buf[8];");
        assert_eq!(declaration(&arena, func), " int square (int);");
        assert_eq!(declaration(&arena, reg), " register int rsp __asm__ (rsp);");
    }

    #[test]
    fn test_ssa_names() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let x = b.parm_decl("x", int);
        let def = b.default_def(x, 1);
        let anon = b.ssa_name(None, int, 7);
        let mem = b.virtual_ssa_name(3);
        let tmp = b.var_decl("D1234", int);
        if let Some(info) = b.decl_info_mut(tmp) {
            info.nameless = true;
        }
        let tmp_ssa = b.ssa_name(Some(tmp), int, 9);
        let abnormal = b.ssa_name(Some(x), int, 2);
        if let TreeData::Ssa(info) = &mut b.tree_mut(abnormal).data {
            info.occurs_in_abnormal_phi = true;
        }
        let arena = b.finish();
        assert_eq!(render(&arena, def), "x_1(D)");
        assert_eq!(render(&arena, anon), "_7");
        assert_eq!(render(&arena, mem), ".MEM_3");
        assert_eq!(render(&arena, tmp_ssa), "Dxxxx_9");
        assert_eq!(render(&arena, abnormal), "x_2(ab)");
    }

    #[test]
    fn test_call_names() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let fn_ty = b.function_type(int, vec![]);
        let func = b.function_decl("work", fn_ty);
        let addr = b.addr_expr(func);
        let fp_ty = b.pointer_type(fn_ty);
        let fp = b.var_decl("fp", fp_ty);
        let fp_ssa = b.ssa_name(Some(fp), fp_ty, 4);
        let arena = b.finish();
        let mut c = Classifier::new(&arena, TargetSizes::LP64);

        let mut t = Tokens::new(c.meta(addr));
        c.print_call_name(addr, &mut t);
        assert_eq!(t.complex().render(), "work");

        let mut t = Tokens::new(c.meta(fp_ssa));
        c.print_call_name(fp_ssa, &mut t);
        assert_eq!(t.complex().render(), "fp_4");
    }
}
