//! Convenience constructors for host IR graphs
//!
//! [`TreeBuilder`] is what host adapters and tests use to assemble a
//! [`TreeArena`] without spelling out every payload. Declarations get fresh
//! uids in creation order.

use crate::target::TargetSizes;
use crate::tree::{
    CallInfo, DeclInfo, IntCst, RealCst, RealValue, SsaNameInfo, Tree, TreeArena, TreeData,
    TreeId, TypeInfo,
};
use crate::tree_code::TreeCode;

pub struct TreeBuilder {
    arena: TreeArena,
    target: TargetSizes,
    next_uid: u32,
    virtual_operand: Option<TreeId>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::with_target(TargetSizes::default())
    }

    pub fn with_target(target: TargetSizes) -> Self {
        Self {
            arena: TreeArena::new(),
            target,
            next_uid: 1000,
            virtual_operand: None,
        }
    }

    pub fn target(&self) -> TargetSizes {
        self.target
    }

    pub fn arena(&self) -> &TreeArena {
        &self.arena
    }

    pub fn tree_mut(&mut self, id: TreeId) -> &mut Tree {
        self.arena.get_mut(id)
    }

    pub fn finish(self) -> TreeArena {
        self.arena
    }

    pub fn add(&mut self, tree: Tree) -> TreeId {
        self.arena.add(tree)
    }

    fn new_uid(&mut self) -> u32 {
        let uid = self.next_uid;
        self.next_uid += 1;
        uid
    }

    pub fn identifier(&mut self, name: &str) -> TreeId {
        self.add(Tree::new(TreeCode::IdentifierNode).with_data(TreeData::Identifier(name.to_string())))
    }

    pub fn type_node(&mut self, code: TreeCode, info: TypeInfo) -> TreeId {
        self.add(Tree::new(code).with_data(TreeData::Type(Box::new(info))))
    }

    pub fn void_type(&mut self) -> TreeId {
        let name = self.identifier("void");
        self.type_node(
            TreeCode::VoidType,
            TypeInfo {
                name: Some(name),
                ..TypeInfo::default()
            },
        )
    }

    /// An integer type; `name` `None` builds an anonymous type.
    pub fn integer_type(&mut self, name: Option<&str>, precision: u32, unsigned: bool) -> TreeId {
        let name = name.map(|name| self.identifier(name));
        self.type_node(
            TreeCode::IntegerType,
            TypeInfo {
                name,
                precision,
                unsigned,
                ..TypeInfo::default()
            },
        )
    }

    /// `int` of the target.
    pub fn int_type(&mut self) -> TreeId {
        self.integer_type(Some("int"), self.target.int_bits, false)
    }

    pub fn pointer_type(&mut self, pointee: TreeId) -> TreeId {
        let precision = self.target.pointer_bits;
        self.add(
            Tree::new(TreeCode::PointerType)
                .with_type(pointee)
                .with_data(TreeData::Type(Box::new(TypeInfo {
                    precision,
                    unsigned: true,
                    mode: "DI".to_string(),
                    ..TypeInfo::default()
                }))),
        )
    }

    /// An array of `len` elements, or of unknown bound for `None`.
    pub fn array_type(&mut self, element: TreeId, len: Option<u64>) -> TreeId {
        let index_ty = self.integer_type(None, self.target.long_bits, false);
        let zero = self.int_cst(index_ty, 0);
        let max = len.map(|len| self.int_cst(index_ty, i128::from(len) - 1));
        let domain = self.type_node(
            TreeCode::IntegerType,
            TypeInfo {
                precision: self.target.long_bits,
                min_value: Some(zero),
                max_value: max,
                ..TypeInfo::default()
            },
        );
        self.add(
            Tree::new(TreeCode::ArrayType)
                .with_type(element)
                .with_data(TreeData::Type(Box::new(TypeInfo {
                    domain: Some(domain),
                    ..TypeInfo::default()
                }))),
        )
    }

    pub fn record_type(&mut self, name: Option<&str>) -> TreeId {
        let name = name.map(|name| self.identifier(name));
        let uid = self.new_uid();
        self.type_node(
            TreeCode::RecordType,
            TypeInfo {
                name,
                uid,
                ..TypeInfo::default()
            },
        )
    }

    /// A prototyped function type.
    pub fn function_type(&mut self, ret: TreeId, params: Vec<TreeId>) -> TreeId {
        self.add(
            Tree::new(TreeCode::FunctionType)
                .with_type(ret)
                .with_data(TreeData::Type(Box::new(TypeInfo {
                    params,
                    params_void_terminated: true,
                    ..TypeInfo::default()
                }))),
        )
    }

    pub fn int_cst(&mut self, ty: TreeId, value: i128) -> TreeId {
        self.add(
            Tree::new(TreeCode::IntegerCst)
                .with_type(ty)
                .with_data(TreeData::Int(IntCst { value, overflow: false })),
        )
    }

    pub fn real_cst(&mut self, ty: TreeId, value: f64) -> TreeId {
        self.add(
            Tree::new(TreeCode::RealCst)
                .with_type(ty)
                .with_data(TreeData::Real(RealCst {
                    value: RealValue::Finite(value),
                    overflow: false,
                })),
        )
    }

    pub fn string_cst(&mut self, ty: TreeId, bytes: &[u8]) -> TreeId {
        self.add(
            Tree::new(TreeCode::StringCst)
                .with_type(ty)
                .with_data(TreeData::Str(bytes.to_vec())),
        )
    }

    /// A declaration with a fresh uid.
    pub fn decl(&mut self, code: TreeCode, name: Option<&str>, ty: Option<TreeId>) -> TreeId {
        let name = name.map(|name| self.identifier(name));
        let uid = self.new_uid();
        let mut tree = Tree::new(code).with_data(TreeData::Decl(Box::new(DeclInfo {
            name,
            uid,
            ..DeclInfo::default()
        })));
        tree.ty = ty;
        self.add(tree)
    }

    pub fn var_decl(&mut self, name: &str, ty: TreeId) -> TreeId {
        self.decl(TreeCode::VarDecl, Some(name), Some(ty))
    }

    pub fn parm_decl(&mut self, name: &str, ty: TreeId) -> TreeId {
        self.decl(TreeCode::ParmDecl, Some(name), Some(ty))
    }

    pub fn function_decl(&mut self, name: &str, fn_type: TreeId) -> TreeId {
        self.decl(TreeCode::FunctionDecl, Some(name), Some(fn_type))
    }

    pub fn field_decl(&mut self, name: &str, ty: TreeId) -> TreeId {
        self.decl(TreeCode::FieldDecl, Some(name), Some(ty))
    }

    /// An artificial label (`<D.uid>` style).
    pub fn label_decl(&mut self) -> TreeId {
        let void = self.void_type();
        self.decl(TreeCode::LabelDecl, None, Some(void))
    }

    pub fn decl_info_mut(&mut self, decl: TreeId) -> Option<&mut DeclInfo> {
        match &mut self.arena.get_mut(decl).data {
            TreeData::Decl(info) => Some(info),
            _ => None,
        }
    }

    pub fn type_info_mut(&mut self, ty: TreeId) -> Option<&mut TypeInfo> {
        match &mut self.arena.get_mut(ty).data {
            TreeData::Type(info) => Some(info),
            _ => None,
        }
    }

    /// An SSA name of `var` (a declaration, an identifier or nothing).
    pub fn ssa_name(&mut self, var: Option<TreeId>, ty: TreeId, version: u32) -> TreeId {
        self.add(
            Tree::new(TreeCode::SsaName)
                .with_type(ty)
                .with_data(TreeData::Ssa(SsaNameInfo {
                    version,
                    var,
                    ..SsaNameInfo::default()
                })),
        )
    }

    /// The default definition of `var`, `var_N(D)`.
    pub fn default_def(&mut self, var: TreeId, version: u32) -> TreeId {
        let ty = self.arena.ty(var);
        let id = self.add(Tree::new(TreeCode::SsaName).with_data(TreeData::Ssa(SsaNameInfo {
            version,
            var: Some(var),
            default_def: true,
            ..SsaNameInfo::default()
        })));
        self.arena.get_mut(id).ty = ty;
        id
    }

    /// The function's single virtual operand declaration, `.MEM`.
    pub fn virtual_operand(&mut self) -> TreeId {
        if let Some(vop) = self.virtual_operand {
            return vop;
        }
        let void = self.void_type();
        let vop = self.var_decl(".MEM", void);
        self.virtual_operand = Some(vop);
        vop
    }

    /// A virtual operand `.MEM_N`.
    pub fn virtual_ssa_name(&mut self, version: u32) -> TreeId {
        let vop = self.virtual_operand();
        let void = self.void_type();
        self.add(
            Tree::new(TreeCode::SsaName)
                .with_type(void)
                .with_data(TreeData::Ssa(SsaNameInfo {
                    version,
                    var: Some(vop),
                    is_virtual: true,
                    ..SsaNameInfo::default()
                })),
        )
    }

    pub fn expr(&mut self, code: TreeCode, ty: Option<TreeId>, operands: Vec<Option<TreeId>>) -> TreeId {
        let mut tree = Tree::new(code).with_operands(operands);
        tree.ty = ty;
        self.add(tree)
    }

    pub fn binary(&mut self, code: TreeCode, ty: TreeId, lhs: TreeId, rhs: TreeId) -> TreeId {
        self.expr(code, Some(ty), vec![Some(lhs), Some(rhs)])
    }

    pub fn unary(&mut self, code: TreeCode, ty: TreeId, operand: TreeId) -> TreeId {
        self.expr(code, Some(ty), vec![Some(operand)])
    }

    /// `&object`, with a fresh pointer type.
    pub fn addr_expr(&mut self, object: TreeId) -> TreeId {
        let pointee = self.arena.ty(object);
        let ty = match pointee {
            Some(pointee) => Some(self.pointer_type(pointee)),
            None => None,
        };
        self.expr(TreeCode::AddrExpr, ty, vec![Some(object)])
    }

    /// `MEM[ptr + offset]`; the offset constant carries the pointer's type.
    pub fn mem_ref(&mut self, ty: TreeId, ptr: TreeId, offset: i128) -> TreeId {
        let ptr_ty = match self.arena.ty(ptr) {
            Some(ptr_ty) => ptr_ty,
            None => self.pointer_type(ty),
        };
        let offset = self.int_cst(ptr_ty, offset);
        self.expr(TreeCode::MemRef, Some(ty), vec![Some(ptr), Some(offset)])
    }

    pub fn component_ref(&mut self, object: TreeId, field: TreeId) -> TreeId {
        let ty = self.arena.ty(field);
        self.expr(TreeCode::ComponentRef, ty, vec![Some(object), Some(field), None])
    }

    pub fn call_expr(&mut self, ty: TreeId, function: TreeId, args: Vec<TreeId>) -> TreeId {
        self.add(
            Tree::new(TreeCode::CallExpr)
                .with_type(ty)
                .with_data(TreeData::Call(CallInfo {
                    function: Some(function),
                    args: args.into_iter().map(Some).collect(),
                    ..CallInfo::default()
                })),
        )
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decls_get_fresh_uids() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let a = b.var_decl("a", int);
        let c = b.var_decl("c", int);
        let arena = b.finish();
        let ua = arena.decl_info(a).map(|info| info.uid);
        let uc = arena.decl_info(c).map(|info| info.uid);
        assert_ne!(ua, uc);
        assert_eq!(arena.decl_name_str(a), Some("a"));
        assert_eq!(arena.ty(a), Some(int));
    }

    #[test]
    fn test_default_def_takes_var_type() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let x = b.parm_decl("x", int);
        let def = b.default_def(x, 1);
        let arena = b.finish();
        assert_eq!(arena.ty(def), Some(int));
        assert_eq!(arena.ssa_var(def), Some(x));
        assert!(arena.ssa_info(def).is_some_and(|info| info.default_def));
    }

    #[test]
    fn test_virtual_names_share_one_var_decl() {
        let mut b = TreeBuilder::new();
        let mem_1 = b.virtual_ssa_name(1);
        let mem_2 = b.virtual_ssa_name(2);
        let arena = b.finish();
        let vop = arena.ssa_var(mem_1).unwrap();
        assert_eq!(arena.ssa_var(mem_2), Some(vop));
        assert_eq!(*arena.code(vop), TreeCode::VarDecl);
        assert_eq!(arena.decl_name_str(vop), Some(".MEM"));
    }

    #[test]
    fn test_array_domain() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let arr = b.array_type(int, Some(10));
        let arena = b.finish();
        let domain = arena.type_info(arr).and_then(|info| info.domain).unwrap();
        let max = arena.type_info(domain).and_then(|info| info.max_value).unwrap();
        assert_eq!(arena.int_cst(max).map(|c| c.value), Some(9));
    }
}
