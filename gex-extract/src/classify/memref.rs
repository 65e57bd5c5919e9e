//! Memory reference rule

use super::tokens::Tokens;
use super::Classifier;
use crate::value::{NodeMeta, Value};
use gex_ir::{MemRefInfo, TreeCode, TreeData, TreeId};

impl Classifier<'_> {
    fn mem_ref_info(&self, id: TreeId) -> MemRefInfo {
        match &self.arena.get(id).data {
            TreeData::MemRef(info) => *info,
            _ => MemRefInfo::default(),
        }
    }

    /// Whether a memory reference is a plain dereference of its pointer,
    /// printable as `*p`.
    pub(super) fn memref_is_canonical(&self, id: TreeId) -> bool {
        let arena = self.arena;
        let (Some(ptr), Some(offset)) = (self.op(id, 0), self.op(id, 1)) else {
            return false;
        };
        if !arena.is_integer_zero(offset) || *arena.code(ptr) == TreeCode::IntegerCst {
            return false;
        }
        let (Some(ptr_ty), Some(offset_ty)) = (arena.ty(ptr), arena.ty(offset)) else {
            return false;
        };
        let ptr_info = arena.type_info(ptr_ty).cloned().unwrap_or_default();
        let offset_info = arena.type_info(offset_ty).cloned().unwrap_or_default();
        let pointee = arena.ty(offset_ty);

        arena.ty(ptr_ty) == pointee
            && ptr_info.mode == offset_info.mode
            && ptr_info.ref_can_alias_all == offset_info.ref_can_alias_all
            && arena.ty(id).map(|ty| arena.main_variant(ty)) == pointee.map(|ty| arena.main_variant(ty))
            && self.mem_ref_info(id).clique == 0
    }

    /// Whether two `TYPE_SIZE` trees denote the same size.
    fn same_size(&self, a: Option<TreeId>, b: Option<TreeId>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) if a == b => true,
            (Some(a), Some(b)) => match (self.arena.int_cst(a), self.arena.int_cst(b)) {
                (Some(a), Some(b)) => a.value == b.value,
                _ => false,
            },
            _ => false,
        }
    }

    pub(super) fn mem_ref(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let arena = self.arena;
        let ptr = self.op(id, 0);
        let offset = self.op(id, 1);
        let mut t = Tokens::new(meta);

        if self.memref_is_canonical(id) {
            match ptr {
                Some(ptr) if *arena.code(ptr) == TreeCode::AddrExpr => {
                    self.sub(&mut t, self.op(ptr, 0));
                }
                _ => {
                    let to_array = ptr
                        .and_then(|ptr| arena.ty(ptr))
                        .and_then(|ptr_ty| arena.ty(ptr_ty))
                        .is_some_and(|pointee| *arena.code(pointee) == TreeCode::ArrayType);
                    if to_array {
                        t.lparen();
                    }
                    t.text("*");
                    self.sub(&mut t, ptr);
                    if to_array {
                        t.rparen();
                    }
                }
            }
            return t.complex();
        }

        let size_of = |ty: Option<TreeId>| ty.and_then(|ty| arena.type_info(ty)).and_then(|info| info.size);
        let ty = arena.ty(id);
        let offset_ty = offset.and_then(|offset| arena.ty(offset)).map(|ty| arena.main_variant(ty));
        let pointee = offset_ty.and_then(|ty| arena.ty(ty));

        t.text("MEM");
        if !self.same_size(size_of(ty), size_of(pointee)) {
            t.text(" <");
            self.sub(&mut t, ty);
            t.text("> ");
        }
        t.text("[(");
        self.sub(&mut t, offset_ty);
        t.rparen();
        self.sub(&mut t, ptr);
        if offset.is_some_and(|offset| !arena.is_integer_zero(offset)) {
            t.text(" + ");
            self.sub(&mut t, offset);
        }
        let info = self.mem_ref_info(id);
        if info.clique != 0 {
            t.text(format!(" clique {} base {}", info.clique, info.base));
        }
        t.rbracket();
        t.complex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gex_ir::{TargetSizes, TreeArena, TreeBuilder};
    use pretty_assertions::assert_eq;

    fn render(arena: &TreeArena, node: TreeId) -> String {
        Classifier::new(arena, TargetSizes::LP64)
            .classify(Some(node))
            .render()
    }

    struct Fixture {
        builder: TreeBuilder,
        int: TreeId,
        p: TreeId,
    }

    fn fixture() -> Fixture {
        let mut builder = TreeBuilder::new();
        let int = builder.int_type();
        let size = builder.int_cst(int, 32);
        if let Some(info) = builder.type_info_mut(int) {
            info.size = Some(size);
        }
        let ptr_ty = builder.pointer_type(int);
        let p = builder.var_decl("p", ptr_ty);
        Fixture { builder, int, p }
    }

    #[test]
    fn test_canonical_dereference() {
        let Fixture { mut builder, int, p } = fixture();
        let deref = builder.mem_ref(int, p, 0);
        let arena = builder.finish();
        assert!(Classifier::new(&arena, TargetSizes::LP64).memref_is_canonical(deref));
        assert_eq!(render(&arena, deref), "*p");
    }

    #[test]
    fn test_address_of_object_prints_the_object() {
        let Fixture { mut builder, int, .. } = fixture();
        let x = builder.var_decl("x", int);
        let addr = builder.addr_expr(x);
        let deref = builder.mem_ref(int, addr, 0);
        let arena = builder.finish();
        assert_eq!(render(&arena, deref), "x");
    }

    #[test]
    fn test_offset_reference() {
        let Fixture { mut builder, int, p } = fixture();
        let access = builder.mem_ref(int, p, 4);
        let arena = builder.finish();
        assert_eq!(render(&arena, access), "MEM[(int *)p + _Literal (int *) 4B]");
    }

    #[test]
    fn test_size_mismatch_and_clique() {
        let Fixture { mut builder, int, p } = fixture();
        let char_ty = builder.integer_type(Some("char"), 8, false);
        let size = builder.int_cst(int, 8);
        if let Some(info) = builder.type_info_mut(char_ty) {
            info.size = Some(size);
        }
        let access = builder.mem_ref(char_ty, p, 0);
        builder.tree_mut(access).data = TreeData::MemRef(MemRefInfo { clique: 1, base: 2 });
        let arena = builder.finish();
        assert_eq!(render(&arena, access), "MEM <char> [(int *)p clique 1 base 2]");
    }
}
