//! Type rules

use super::tokens::Tokens;
use super::Classifier;
use crate::value::{NodeMeta, Value};
use gex_ir::{TreeCode, TreeId, TypeInfo};

impl Classifier<'_> {
    fn type_info_or_default(&self, id: TreeId) -> TypeInfo {
        self.arena.type_info(id).cloned().unwrap_or_default()
    }

    /// `TYPE_NAME` of `ty`: the identifier itself, or the name of its type
    /// declaration.
    fn type_name_into(&mut self, name: TreeId, t: &mut Tokens) -> bool {
        match self.arena.code(name) {
            TreeCode::IdentifierNode => {
                self.sub(t, Some(name));
                true
            }
            TreeCode::TypeDecl if self.arena.decl_name(name).is_some() => {
                self.dump_decl_name(name, t);
                true
            }
            _ => false,
        }
    }

    pub(super) fn scalar_type(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let info = self.type_info_or_default(id);
        let mut t = Tokens::new(meta);
        if info.quals.atomic {
            t.text("atomic");
        }
        if info.quals.constant {
            t.text("const");
        }
        if info.quals.volatile {
            t.text("volatile");
        }
        if info.quals.restrict {
            t.text("restrict");
        }
        if info.address_space != 0 {
            t.text(format!("<address-space-{}>", info.address_space));
        }

        if let Some(name) = info.name {
            if !self.type_name_into(name, &mut t) {
                t.text("<unnamed type>");
            }
            return t.complex();
        }

        let precision = info.precision;
        match self.arena.code(id) {
            TreeCode::VectorType => {
                t.text("vector");
                t.lparen();
                t.text(info.vector_subparts.unwrap_or_default().to_string());
                t.text(") ");
                self.sub(&mut t, self.arena.ty(id));
            }
            TreeCode::IntegerType => self.unnamed_integer(&info, &mut t),
            TreeCode::ComplexType => {
                t.text("__complex__ ");
                self.sub(&mut t, self.arena.ty(id));
            }
            TreeCode::RealType => {
                t.text("<float:");
                t.text(precision.to_string());
                t.greater();
            }
            TreeCode::FixedPointType => {
                t.text("<fixed-point-");
                t.text(if info.saturating { "sat:" } else { "nonsat:" });
                t.text(precision.to_string());
                t.greater();
            }
            TreeCode::BooleanType => {
                t.text(if info.unsigned {
                    "<unsigned-boolean:"
                } else {
                    "<signed-boolean:"
                });
                t.text(precision.to_string());
                t.greater();
            }
            TreeCode::VoidType => t.text("void"),
            _ => t.text("<unnamed type>"),
        }
        t.complex()
    }

    /// C spelling of an anonymous integer type, by precision.
    fn unnamed_integer(&self, info: &TypeInfo, t: &mut Tokens) {
        let target = self.target;
        let precision = info.precision;
        let sign = if info.unsigned { "unsigned " } else { "signed " };
        let c_name = if precision == target.char_bits {
            Some("char")
        } else if precision == target.short_bits {
            Some("short")
        } else if precision == target.int_bits {
            Some("int")
        } else if precision == target.long_bits {
            Some("long")
        } else if precision == target.long_long_bits {
            Some("long long")
        } else {
            None
        };

        if let Some(c_name) = c_name {
            t.text(format!("{}{}", sign, c_name));
        } else if precision >= target.char_bits && precision.is_power_of_two() {
            t.text(if info.unsigned { "uint" } else { "int" });
            t.text(precision.to_string());
            t.text("_t");
        } else {
            t.text(if info.unsigned {
                "<unnamed-unsigned:"
            } else {
                "<unnamed-signed:"
            });
            t.text(precision.to_string());
            t.greater();
        }
    }

    pub(super) fn pointer_type(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let arena = self.arena;
        let info = self.type_info_or_default(id);
        let symbol = if *arena.code(id) == TreeCode::PointerType {
            "*"
        } else {
            "&"
        };
        let mut t = Tokens::new(meta);

        let Some(pointee) = arena.ty(id) else {
            t.text(symbol);
            t.text("<null type>");
            return t.complex();
        };

        if *arena.code(pointee) == TreeCode::FunctionType {
            self.sub(&mut t, arena.ty(pointee));
            t.space();
            t.lparen();
            t.text(symbol);
            if arena.type_identifier(id).is_some() {
                self.sub(&mut t, info.name);
            } else {
                t.text(format!("<T{:x}>", info.uid));
            }
            t.rparen();
            self.dump_function_declaration(pointee, &mut t);
            return t.complex();
        }

        self.sub(&mut t, Some(pointee));
        t.space();
        t.text(symbol);
        if info.quals.constant {
            t.text(" const");
        }
        if info.quals.volatile {
            t.text(" volatile");
        }
        if info.quals.restrict {
            t.text(" restrict");
        }
        if info.address_space != 0 {
            t.text(format!("<address-space-{}>", info.address_space));
        }
        if info.ref_can_alias_all {
            t.text(" {ref-all}");
        }
        t.complex()
    }

    /// ` (a, b)` parameter list of a function or method type; `(void)` for
    /// a prototype without parameters, a trailing `, ...` for varargs.
    pub(super) fn dump_function_declaration(&mut self, fn_type: TreeId, t: &mut Tokens) {
        let info = self.type_info_or_default(fn_type);
        t.space();
        t.lparen();
        for (i, param) in info.params.iter().enumerate() {
            if i > 0 {
                t.comma_space();
            }
            self.sub(t, Some(*param));
        }
        if info.params.is_empty() && info.params_void_terminated {
            t.text("void");
        } else if !info.params.is_empty() && !info.params_void_terminated {
            t.text(", ...");
        }
        t.rparen();
    }

    /// `[N]` of one array dimension.
    pub(super) fn dump_array_domain(&mut self, domain: Option<TreeId>, t: &mut Tokens) {
        let arena = self.arena;
        t.lbracket();
        match domain {
            Some(domain) => {
                let info = self.type_info_or_default(domain);
                let known_length = match (info.min_value, info.max_value) {
                    (Some(min), Some(max)) if arena.is_integer_zero(min) => arena.int_cst(max),
                    _ => None,
                };
                if let Some(max) = known_length {
                    t.text((max.value + 1).to_string());
                } else {
                    if info.min_value.is_some() {
                        self.sub(t, info.min_value);
                    }
                    t.colon();
                    if info.max_value.is_some() {
                        self.sub(t, info.max_value);
                    }
                }
            }
            None => t.text("<unknown>"),
        }
        t.rbracket();
    }

    /// Element type of the innermost dimension of an array type.
    pub(super) fn innermost_element(&self, array: TreeId) -> Option<TreeId> {
        let mut element = self.arena.ty(array);
        while let Some(ty) = element {
            if *self.arena.code(ty) != TreeCode::ArrayType {
                break;
            }
            element = self.arena.ty(ty);
        }
        element
    }

    /// Every dimension of a (possibly nested) array type.
    pub(super) fn dump_array_dimensions(&mut self, array: TreeId, t: &mut Tokens) {
        let mut current = Some(array);
        while let Some(ty) = current {
            if *self.arena.code(ty) != TreeCode::ArrayType {
                break;
            }
            let domain = self.arena.type_info(ty).and_then(|info| info.domain);
            self.dump_array_domain(domain, t);
            current = self.arena.ty(ty);
        }
    }

    pub(super) fn array_type(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let arena = self.arena;
        let info = self.type_info_or_default(id);
        let mut t = Tokens::new(meta);
        if info.quals.atomic {
            t.text("atomic ");
        }
        if info.quals.constant {
            t.text("const ");
        }
        if info.quals.volatile {
            t.text("volatile ");
        }

        let element = self.innermost_element(id);
        let points_back = element.is_some_and(|element| {
            *arena.code(element) == TreeCode::PointerType && arena.ty(element) == Some(id)
        });
        if !points_back {
            self.sub(&mut t, element);
        }
        self.dump_array_dimensions(id, &mut t);
        t.complex()
    }

    pub(super) fn record_type(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let info = self.type_info_or_default(id);
        let mut t = Tokens::new(meta);
        if info.quals.atomic {
            t.text("atomic ");
        }
        if info.quals.constant {
            t.text("const ");
        }
        if info.quals.volatile {
            t.text("volatile ");
        }
        if info.address_space != 0 {
            t.text(format!("<address-space-{}> ", info.address_space));
        }
        match self.arena.code(id) {
            TreeCode::RecordType => t.text("struct "),
            TreeCode::UnionType => t.text("union "),
            _ => {}
        }
        if info.name.is_some() {
            self.sub(&mut t, info.name);
        }
        t.complex()
    }

    pub(super) fn function_type(&mut self, id: TreeId, meta: NodeMeta) -> Value {
        let arena = self.arena;
        let info = self.type_info_or_default(id);
        let mut t = Tokens::new(meta);
        self.sub(&mut t, arena.ty(id));
        t.space();

        if *arena.code(id) == TreeCode::MethodType {
            match info.method_basetype.and_then(|base| arena.type_name(base)) {
                Some(base_name) => self.sub(&mut t, Some(base_name)),
                None => t.text("<null method basetype>"),
            }
            t.text("::");
        }

        let named = match info.name {
            Some(_) if arena.type_identifier(id).is_some() => {
                self.sub(&mut t, info.name);
                true
            }
            Some(name) if arena.decl_name(name).is_some() => {
                self.dump_decl_name(name, &mut t);
                true
            }
            _ => false,
        };
        if !named {
            t.text(format!("<T{:x}>", info.uid));
        }
        self.dump_function_declaration(id, &mut t);
        t.complex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gex_ir::{TargetSizes, TreeArena, TreeBuilder, TypeQuals};
    use pretty_assertions::assert_eq;

    fn render(arena: &TreeArena, node: TreeId) -> String {
        Classifier::new(arena, TargetSizes::LP64)
            .classify(Some(node))
            .render()
    }

    #[test]
    fn test_named_and_qualified_scalar() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let cint = b.int_type();
        if let Some(info) = b.type_info_mut(cint) {
            info.quals = TypeQuals {
                constant: true,
                ..TypeQuals::default()
            };
        }
        let arena = b.finish();
        assert_eq!(render(&arena, int), "int");
        assert_eq!(render(&arena, cint), "constint");
    }

    #[test]
    fn test_unnamed_integers() {
        let mut b = TreeBuilder::new();
        let uchar = b.integer_type(None, 8, true);
        let long = b.integer_type(None, 64, false);
        let u128 = b.integer_type(None, 128, true);
        let odd = b.integer_type(None, 24, false);
        let arena = b.finish();
        assert_eq!(render(&arena, uchar), "unsigned char");
        assert_eq!(render(&arena, long), "signed long");
        assert_eq!(render(&arena, u128), "uint128_t");
        assert_eq!(render(&arena, odd), "<unnamed-signed:24>");
    }

    #[test]
    fn test_unnamed_other_scalars() {
        let mut b = TreeBuilder::new();
        let real = b.type_node(
            TreeCode::RealType,
            TypeInfo {
                precision: 64,
                ..TypeInfo::default()
            },
        );
        let boolean = b.type_node(
            TreeCode::BooleanType,
            TypeInfo {
                precision: 1,
                unsigned: true,
                ..TypeInfo::default()
            },
        );
        let fixed = b.type_node(
            TreeCode::FixedPointType,
            TypeInfo {
                precision: 16,
                saturating: true,
                ..TypeInfo::default()
            },
        );
        let arena = b.finish();
        assert_eq!(render(&arena, real), "<float:64>");
        assert_eq!(render(&arena, boolean), "<unsigned-boolean:1>");
        assert_eq!(render(&arena, fixed), "<fixed-point-sat:16>");
    }

    #[test]
    fn test_pointer_types() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let ptr = b.pointer_type(int);
        let ptr_ptr = b.pointer_type(ptr);
        let restrict = b.pointer_type(int);
        if let Some(info) = b.type_info_mut(restrict) {
            info.quals.restrict = true;
            info.ref_can_alias_all = true;
        }
        let arena = b.finish();
        assert_eq!(render(&arena, ptr), "int *");
        assert_eq!(render(&arena, ptr_ptr), "int * *");
        assert_eq!(render(&arena, restrict), "int * restrict {ref-all}");
    }

    #[test]
    fn test_pointer_to_function() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let char_ty = b.integer_type(Some("char"), 8, false);
        let fn_ty = b.function_type(int, vec![int, char_ty]);
        let fn_ptr = b.pointer_type(fn_ty);
        if let Some(info) = b.type_info_mut(fn_ptr) {
            info.uid = 0x2a;
        }
        let varargs = b.function_type(int, vec![int]);
        if let Some(info) = b.type_info_mut(varargs) {
            info.params_void_terminated = false;
        }
        let varargs_ptr = b.pointer_type(varargs);
        let arena = b.finish();
        assert_eq!(render(&arena, fn_ptr), "int (*<T2a>) (int, char)");
        assert_eq!(render(&arena, varargs_ptr), "int (*<T0>) (int, ...)");
    }

    #[test]
    fn test_function_type_without_params() {
        let mut b = TreeBuilder::new();
        let void = b.void_type();
        let fn_ty = b.function_type(void, vec![]);
        let arena = b.finish();
        assert_eq!(render(&arena, fn_ty), "void <T0> (void)");
    }

    #[test]
    fn test_array_types() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let row = b.array_type(int, Some(4));
        let matrix = b.array_type(row, Some(3));
        let open = b.array_type(int, None);
        let arena = b.finish();
        assert_eq!(render(&arena, row), "int[4]");
        assert_eq!(render(&arena, matrix), "int[3][4]");
        assert_eq!(render(&arena, open), "int[0l:]");
    }

    #[test]
    fn test_record_types() {
        let mut b = TreeBuilder::new();
        let named = b.record_type(Some("point"));
        let anon = b.record_type(None);
        let arena = b.finish();
        assert_eq!(render(&arena, named), "struct point");
        assert_eq!(render(&arena, anon), "struct ");
    }
}
