//! Tree nodes of the host IR
//!
//! All nodes live in a [`TreeArena`] and refer to each other through
//! [`TreeId`] handles, so shared and cyclic graphs are representable. A node
//! is a [`TreeCode`], an optional type, an operand vector and a
//! code-specific [`TreeData`] payload.

use crate::internal_fn::InternalFn;
use crate::tree_code::TreeCode;
use gex_common::SourceLocation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of a node in a [`TreeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeId(pub u32);

impl TreeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub code: TreeCode,
    /// `TREE_TYPE`; for pointer, array, vector and complex types this is
    /// the pointed-to or element type, for function types the return type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<TreeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operands: Vec<Option<TreeId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    #[serde(default, skip_serializing_if = "TreeData::is_none")]
    pub data: TreeData,
}

impl Tree {
    pub fn new(code: TreeCode) -> Self {
        Self {
            code,
            ty: None,
            operands: Vec::new(),
            location: None,
            data: TreeData::None,
        }
    }

    pub fn with_type(mut self, ty: TreeId) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn with_operands(mut self, operands: Vec<Option<TreeId>>) -> Self {
        self.operands = operands;
        self
    }

    pub fn with_data(mut self, data: TreeData) -> Self {
        self.data = data;
        self
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Operand `index`, `None` when absent or out of range.
    pub fn operand(&self, index: usize) -> Option<TreeId> {
        self.operands.get(index).copied().flatten()
    }

    /// Number of operands an expression node reports; zero for anything
    /// that is not an expression.
    pub fn operand_length(&self) -> usize {
        if !self.code.is_expression() {
            return 0;
        }
        match &self.data {
            TreeData::Call(call) => 3 + call.args.len(),
            _ => self.operands.len(),
        }
    }
}

/// Code-specific payload of a node
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeData {
    #[default]
    None,
    Identifier(String),
    List(TreeListNode),
    /// `TREE_VEC` elements, `STATEMENT_LIST` statements and
    /// `POLY_INT_CST` coefficients.
    Elements(Vec<Option<TreeId>>),
    Int(IntCst),
    Real(RealCst),
    /// Fixed-point constant, already in decimal form.
    Fixed(String),
    Complex {
        real: Option<TreeId>,
        imag: Option<TreeId>,
    },
    /// String constant bytes, including the terminating NUL if the host
    /// stores one.
    Str(Vec<u8>),
    Vector(VectorCst),
    Type(Box<TypeInfo>),
    Decl(Box<DeclInfo>),
    Ssa(SsaNameInfo),
    Constructor(ConstructorInfo),
    Call(CallInfo),
    /// `BIND_EXPR` variables; the body is operand 1.
    Bind(Vec<TreeId>),
    MemRef(MemRefInfo),
    ObjTypeRef {
        /// Set for virtual method calls.
        class: Option<TreeId>,
    },
    Asm {
        volatile: bool,
    },
    Predict(PredictInfo),
    Chrec {
        variable: u32,
    },
}

impl TreeData {
    pub fn is_none(&self) -> bool {
        matches!(self, TreeData::None)
    }
}

/// One link of a `TREE_LIST` chain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeListNode {
    pub purpose: Option<TreeId>,
    pub value: Option<TreeId>,
    pub chain: Option<TreeId>,
}

/// Integer constant; `value` is the mathematical value under the
/// signedness of the constant's type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntCst {
    pub value: i128,
    pub overflow: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RealValue {
    Finite(f64),
    Infinity { negative: bool },
    Nan,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RealCst {
    pub value: RealValue,
    #[serde(default)]
    pub overflow: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorCst {
    pub elements: Vec<Option<TreeId>>,
    /// Scalable vectors only encode a prefix of their elements.
    pub variable_length: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeQuals {
    pub atomic: bool,
    pub constant: bool,
    pub volatile: bool,
    pub restrict: bool,
}

/// Payload of every type node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeInfo {
    /// `TYPE_NAME`: an identifier or a `TYPE_DECL`.
    pub name: Option<TreeId>,
    pub quals: TypeQuals,
    /// Zero is the generic address space.
    pub address_space: u8,
    pub precision: u32,
    pub unsigned: bool,
    pub saturating: bool,
    pub uid: u32,
    /// Machine mode name, e.g. `SI` or `DI`.
    pub mode: String,
    pub align: u32,
    /// `None` when the type is its own main variant.
    pub main_variant: Option<TreeId>,
    pub size: Option<TreeId>,
    pub size_unit: Option<TreeId>,
    pub min_value: Option<TreeId>,
    pub max_value: Option<TreeId>,
    /// Index type of an array type.
    pub domain: Option<TreeId>,
    pub vector_subparts: Option<u64>,
    pub method_basetype: Option<TreeId>,
    /// Argument types of a function or method type.
    pub params: Vec<TreeId>,
    /// Whether the argument list ends in `void` (prototyped, not varargs).
    pub params_void_terminated: bool,
    pub ref_can_alias_all: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinFunction {
    /// `__builtin__ITM_beginTransaction`
    TmStart,
    Other,
}

/// Payload of every declaration node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeclInfo {
    /// `DECL_NAME`, an identifier.
    pub name: Option<TreeId>,
    /// Set only when the host has fixed the assembler name.
    pub assembler_name: Option<TreeId>,
    /// `DECL_UID`; for debug expression decls the debug temp uid.
    pub uid: u32,
    /// Points-to uid when it differs from `uid`.
    pub pt_uid: Option<u32>,
    pub label_uid: Option<u32>,
    pub nameless: bool,
    pub ignored: bool,
    pub register: bool,
    pub public: bool,
    pub external: bool,
    pub is_static: bool,
    pub hard_register: bool,
    pub nonlocal: bool,
    /// Built-in type declarations are never printed.
    pub undeclared_builtin: bool,
    pub tm_clone: bool,
    pub builtin: Option<BuiltinFunction>,
    pub initial: Option<TreeId>,
    pub value_expr: Option<TreeId>,
    pub field_offset: Option<TreeId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsaNameInfo {
    pub version: u32,
    /// The underlying declaration, or a bare identifier for anonymous
    /// temporaries that still carry a name.
    pub var: Option<TreeId>,
    pub default_def: bool,
    pub occurs_in_abnormal_phi: bool,
    /// Memory-state SSA names (`.MEM`).
    pub is_virtual: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClobberKind {
    Undef,
    Eol,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstructorElt {
    /// Field decl, index constant or `RANGE_EXPR`.
    pub index: Option<TreeId>,
    pub value: Option<TreeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstructorInfo {
    pub elements: Vec<ConstructorElt>,
    pub clobber: Option<ClobberKind>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallInfo {
    /// Callee; `None` for internal functions.
    pub function: Option<TreeId>,
    pub internal_fn: Option<InternalFn>,
    pub args: Vec<Option<TreeId>>,
    pub static_chain: Option<TreeId>,
    pub va_arg_pack: bool,
    pub return_slot_opt: bool,
    pub tail_call: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemRefInfo {
    pub clique: u16,
    pub base: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictInfo {
    pub taken: bool,
    pub predictor: String,
}

/// Owner of all tree nodes of a snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeArena {
    nodes: Vec<Tree>,
}

impl TreeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tree: Tree) -> TreeId {
        let id = TreeId(self.nodes.len() as u32);
        self.nodes.push(tree);
        id
    }

    /// # Panics
    ///
    /// Panics if `id` was not produced by this arena. Snapshots are checked
    /// with [`TreeArena::contains`] before extraction.
    pub fn get(&self, id: TreeId) -> &Tree {
        &self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: TreeId) -> &mut Tree {
        &mut self.nodes[id.index()]
    }

    pub fn contains(&self, id: TreeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TreeId, &Tree)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, tree)| (TreeId(i as u32), tree))
    }

    pub fn code(&self, id: TreeId) -> &TreeCode {
        &self.get(id).code
    }

    pub fn ty(&self, id: TreeId) -> Option<TreeId> {
        self.get(id).ty
    }

    pub fn operand(&self, id: TreeId, index: usize) -> Option<TreeId> {
        self.get(id).operand(index)
    }

    pub fn identifier(&self, id: TreeId) -> Option<&str> {
        match &self.get(id).data {
            TreeData::Identifier(text) => Some(text),
            _ => None,
        }
    }

    pub fn type_info(&self, id: TreeId) -> Option<&TypeInfo> {
        match &self.get(id).data {
            TreeData::Type(info) => Some(info),
            _ => None,
        }
    }

    pub fn decl_info(&self, id: TreeId) -> Option<&DeclInfo> {
        match &self.get(id).data {
            TreeData::Decl(info) => Some(info),
            _ => None,
        }
    }

    pub fn ssa_info(&self, id: TreeId) -> Option<&SsaNameInfo> {
        match &self.get(id).data {
            TreeData::Ssa(info) => Some(info),
            _ => None,
        }
    }

    pub fn int_cst(&self, id: TreeId) -> Option<IntCst> {
        match &self.get(id).data {
            TreeData::Int(cst) if self.get(id).code == TreeCode::IntegerCst => Some(*cst),
            _ => None,
        }
    }

    /// `integer_zerop`
    pub fn is_integer_zero(&self, id: TreeId) -> bool {
        self.int_cst(id).is_some_and(|cst| cst.value == 0)
    }

    /// `DECL_NAME` of a declaration.
    pub fn decl_name(&self, id: TreeId) -> Option<TreeId> {
        self.decl_info(id).and_then(|info| info.name)
    }

    pub fn decl_name_str(&self, id: TreeId) -> Option<&str> {
        self.decl_name(id).and_then(|name| self.identifier(name))
    }

    pub fn type_name(&self, ty: TreeId) -> Option<TreeId> {
        self.type_info(ty).and_then(|info| info.name)
    }

    /// `TYPE_IDENTIFIER`: the type name if it is an identifier, else the
    /// name of its type declaration.
    pub fn type_identifier(&self, ty: TreeId) -> Option<TreeId> {
        let name = self.type_name(ty)?;
        if self.get(name).code == TreeCode::IdentifierNode {
            Some(name)
        } else {
            self.decl_name(name)
        }
    }

    pub fn main_variant(&self, ty: TreeId) -> TreeId {
        self.type_info(ty)
            .and_then(|info| info.main_variant)
            .unwrap_or(ty)
    }

    pub fn type_precision(&self, ty: TreeId) -> u32 {
        self.type_info(ty).map_or(0, |info| info.precision)
    }

    pub fn type_unsigned(&self, ty: TreeId) -> bool {
        self.type_info(ty).is_some_and(|info| info.unsigned)
    }

    /// `SSA_NAME_VAR`: the underlying declaration, if any.
    pub fn ssa_var(&self, id: TreeId) -> Option<TreeId> {
        let var = self.ssa_info(id)?.var?;
        if self.get(var).code == TreeCode::IdentifierNode {
            None
        } else {
            Some(var)
        }
    }

    /// `SSA_NAME_IDENTIFIER`
    pub fn ssa_identifier(&self, id: TreeId) -> Option<TreeId> {
        let var = self.ssa_info(id)?.var?;
        if self.get(var).code == TreeCode::IdentifierNode {
            Some(var)
        } else {
            self.decl_name(var)
        }
    }

    /// Whether every id referenced by node `id` exists in this arena.
    pub fn references_in_range(&self, id: TreeId) -> Result<(), TreeId> {
        let tree = self.get(id);
        let mut refs: Vec<TreeId> = tree.ty.into_iter().collect();
        refs.extend(tree.operands.iter().flatten().copied());
        match &tree.data {
            TreeData::List(list) => refs.extend([list.purpose, list.value, list.chain].into_iter().flatten()),
            TreeData::Elements(elements) => refs.extend(elements.iter().flatten().copied()),
            TreeData::Complex { real, imag } => refs.extend([*real, *imag].into_iter().flatten()),
            TreeData::Vector(vector) => refs.extend(vector.elements.iter().flatten().copied()),
            TreeData::Type(info) => {
                refs.extend(
                    [
                        info.name,
                        info.main_variant,
                        info.size,
                        info.size_unit,
                        info.min_value,
                        info.max_value,
                        info.domain,
                        info.method_basetype,
                    ]
                    .into_iter()
                    .flatten(),
                );
                refs.extend(info.params.iter().copied());
            }
            TreeData::Decl(info) => refs.extend(
                [
                    info.name,
                    info.assembler_name,
                    info.initial,
                    info.value_expr,
                    info.field_offset,
                ]
                .into_iter()
                .flatten(),
            ),
            TreeData::Ssa(info) => refs.extend(info.var),
            TreeData::Constructor(ctor) => {
                for elt in &ctor.elements {
                    refs.extend([elt.index, elt.value].into_iter().flatten());
                }
            }
            TreeData::Call(call) => {
                refs.extend([call.function, call.static_chain].into_iter().flatten());
                refs.extend(call.args.iter().flatten().copied());
            }
            TreeData::Bind(vars) => refs.extend(vars.iter().copied()),
            TreeData::ObjTypeRef { class } => refs.extend(*class),
            _ => {}
        }
        match refs.into_iter().find(|r| !self.contains(*r)) {
            Some(bad) => Err(bad),
            None => Ok(()),
        }
    }
}
