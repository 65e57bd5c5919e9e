//! Tree codes of the host compiler
//!
//! Every node of the host IR carries one [`TreeCode`]. The table below lists
//! each code together with its host name and its code class. Codes the
//! extractor has no rendering rule for are still listed so that a snapshot
//! can name them; anything a front end invents on top lands in
//! [`TreeCode::LangSpecific`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse category of a tree code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeCodeClass {
    Exceptional,
    Constant,
    Type,
    Declaration,
    Reference,
    Comparison,
    Unary,
    Binary,
    Statement,
    VlExp,
    Expression,
}

impl TreeCodeClass {
    pub fn as_str(self) -> &'static str {
        match self {
            TreeCodeClass::Exceptional => "exceptional",
            TreeCodeClass::Constant => "constant",
            TreeCodeClass::Type => "type",
            TreeCodeClass::Declaration => "declaration",
            TreeCodeClass::Reference => "reference",
            TreeCodeClass::Comparison => "comparison",
            TreeCodeClass::Unary => "unary",
            TreeCodeClass::Binary => "binary",
            TreeCodeClass::Statement => "statement",
            TreeCodeClass::VlExp => "vl_exp",
            TreeCodeClass::Expression => "expression",
        }
    }

    /// Reference, comparison, unary, binary, statement, vl_exp and
    /// expression codes are expressions; the rest are not.
    pub fn is_expression(self) -> bool {
        !matches!(
            self,
            TreeCodeClass::Exceptional
                | TreeCodeClass::Constant
                | TreeCodeClass::Type
                | TreeCodeClass::Declaration
        )
    }
}

impl fmt::Display for TreeCodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! tree_codes {
    ($($variant:ident => $name:literal, $class:ident;)*) => {
        /// Tree code of a host IR node
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum TreeCode {
            $($variant,)*
            /// A front-end specific code, kept by its raw name.
            LangSpecific(String),
        }

        impl TreeCode {
            /// Host name of the code, e.g. `integer_cst`.
            pub fn name(&self) -> &str {
                match self {
                    $(TreeCode::$variant => $name,)*
                    TreeCode::LangSpecific(name) => name,
                }
            }

            pub fn class(&self) -> TreeCodeClass {
                match self {
                    $(TreeCode::$variant => TreeCodeClass::$class,)*
                    TreeCode::LangSpecific(_) => TreeCodeClass::Exceptional,
                }
            }
        }
    };
}

tree_codes! {
    ErrorMark => "error_mark", Exceptional;
    IdentifierNode => "identifier_node", Exceptional;
    TreeList => "tree_list", Exceptional;
    TreeVec => "tree_vec", Exceptional;
    TreeBinfo => "tree_binfo", Exceptional;
    Block => "block", Exceptional;
    Constructor => "constructor", Exceptional;
    StatementList => "statement_list", Exceptional;
    SsaName => "ssa_name", Exceptional;
    PlaceholderExpr => "placeholder_expr", Exceptional;
    OmpClause => "omp_clause", Exceptional;

    OffsetType => "offset_type", Type;
    EnumeralType => "enumeral_type", Type;
    BooleanType => "boolean_type", Type;
    IntegerType => "integer_type", Type;
    RealType => "real_type", Type;
    PointerType => "pointer_type", Type;
    ReferenceType => "reference_type", Type;
    NullptrType => "nullptr_type", Type;
    FixedPointType => "fixed_point_type", Type;
    ComplexType => "complex_type", Type;
    VectorType => "vector_type", Type;
    ArrayType => "array_type", Type;
    RecordType => "record_type", Type;
    UnionType => "union_type", Type;
    QualUnionType => "qual_union_type", Type;
    VoidType => "void_type", Type;
    FunctionType => "function_type", Type;
    MethodType => "method_type", Type;
    LangType => "lang_type", Type;

    VoidCst => "void_cst", Constant;
    IntegerCst => "integer_cst", Constant;
    PolyIntCst => "poly_int_cst", Constant;
    RealCst => "real_cst", Constant;
    FixedCst => "fixed_cst", Constant;
    ComplexCst => "complex_cst", Constant;
    VectorCst => "vector_cst", Constant;
    StringCst => "string_cst", Constant;

    FunctionDecl => "function_decl", Declaration;
    LabelDecl => "label_decl", Declaration;
    FieldDecl => "field_decl", Declaration;
    VarDecl => "var_decl", Declaration;
    ConstDecl => "const_decl", Declaration;
    ParmDecl => "parm_decl", Declaration;
    TypeDecl => "type_decl", Declaration;
    ResultDecl => "result_decl", Declaration;
    DebugExprDecl => "debug_expr_decl", Declaration;
    NamespaceDecl => "namespace_decl", Declaration;
    NamelistDecl => "namelist_decl", Declaration;
    ImportedDecl => "imported_decl", Declaration;
    TranslationUnitDecl => "translation_unit_decl", Declaration;

    ComponentRef => "component_ref", Reference;
    BitFieldRef => "bit_field_ref", Reference;
    RealpartExpr => "realpart_expr", Reference;
    ImagpartExpr => "imagpart_expr", Reference;
    ArrayRef => "array_ref", Reference;
    ArrayRangeRef => "array_range_ref", Reference;
    ViewConvertExpr => "view_convert_expr", Reference;
    IndirectRef => "indirect_ref", Reference;
    MemRef => "mem_ref", Reference;
    TargetMemRef => "target_mem_ref", Reference;

    ObjTypeRef => "obj_type_ref", Expression;
    CondExpr => "cond_expr", Expression;
    VecCondExpr => "vec_cond_expr", Expression;
    VecPermExpr => "vec_perm_expr", Expression;
    BindExpr => "bind_expr", Expression;
    CallExpr => "call_expr", VlExp;
    WithCleanupExpr => "with_cleanup_expr", VlExp;
    CleanupPointExpr => "cleanup_point_expr", Expression;
    TargetExpr => "target_expr", Expression;
    CompoundExpr => "compound_expr", Expression;
    ModifyExpr => "modify_expr", Expression;
    InitExpr => "init_expr", Expression;
    SaveExpr => "save_expr", Expression;
    AddrExpr => "addr_expr", Expression;
    VaArgExpr => "va_arg_expr", Expression;
    PredecrementExpr => "predecrement_expr", Expression;
    PreincrementExpr => "preincrement_expr", Expression;
    PostdecrementExpr => "postdecrement_expr", Expression;
    PostincrementExpr => "postincrement_expr", Expression;
    TruthAndifExpr => "truth_andif_expr", Expression;
    TruthOrifExpr => "truth_orif_expr", Expression;
    TruthAndExpr => "truth_and_expr", Expression;
    TruthOrExpr => "truth_or_expr", Expression;
    TruthXorExpr => "truth_xor_expr", Expression;
    TruthNotExpr => "truth_not_expr", Expression;
    PredictExpr => "predict_expr", Expression;
    AnnotateExpr => "annotate_expr", Expression;
    PolynomialChrec => "polynomial_chrec", Expression;
    ScevKnown => "scev_known", Expression;
    ScevNotKnown => "scev_not_known", Expression;
    WithSizeExpr => "with_size_expr", Expression;
    AssertExpr => "assert_expr", Expression;
    RealignLoadExpr => "realign_load", Expression;
    DotProdExpr => "dot_prod_expr", Expression;
    WidenMultPlusExpr => "widen_mult_plus_expr", Expression;
    WidenMultMinusExpr => "widen_mult_minus_expr", Expression;
    BitInsertExpr => "bit_insert_expr", Expression;
    FmaExpr => "fma_expr", Expression;
    TransactionExpr => "transaction_expr", Expression;

    PlusExpr => "plus_expr", Binary;
    MinusExpr => "minus_expr", Binary;
    MultExpr => "mult_expr", Binary;
    PointerPlusExpr => "pointer_plus_expr", Binary;
    PointerDiffExpr => "pointer_diff_expr", Binary;
    MultHighpartExpr => "mult_highpart_expr", Binary;
    TruncDivExpr => "trunc_div_expr", Binary;
    CeilDivExpr => "ceil_div_expr", Binary;
    FloorDivExpr => "floor_div_expr", Binary;
    RoundDivExpr => "round_div_expr", Binary;
    TruncModExpr => "trunc_mod_expr", Binary;
    CeilModExpr => "ceil_mod_expr", Binary;
    FloorModExpr => "floor_mod_expr", Binary;
    RoundModExpr => "round_mod_expr", Binary;
    RdivExpr => "rdiv_expr", Binary;
    ExactDivExpr => "exact_div_expr", Binary;
    MinExpr => "min_expr", Binary;
    MaxExpr => "max_expr", Binary;
    LshiftExpr => "lshift_expr", Binary;
    RshiftExpr => "rshift_expr", Binary;
    LrotateExpr => "lrotate_expr", Binary;
    RrotateExpr => "rrotate_expr", Binary;
    BitIorExpr => "bit_ior_expr", Binary;
    BitXorExpr => "bit_xor_expr", Binary;
    BitAndExpr => "bit_and_expr", Binary;
    RangeExpr => "range_expr", Binary;
    ComplexExpr => "complex_expr", Binary;
    WidenSumExpr => "widen_sum_expr", Binary;
    WidenMultExpr => "widen_mult_expr", Binary;
    WidenLshiftExpr => "widen_lshift_expr", Binary;
    VecSeriesExpr => "vec_series_expr", Binary;

    LtExpr => "lt_expr", Comparison;
    LeExpr => "le_expr", Comparison;
    GtExpr => "gt_expr", Comparison;
    GeExpr => "ge_expr", Comparison;
    EqExpr => "eq_expr", Comparison;
    NeExpr => "ne_expr", Comparison;
    UnorderedExpr => "unordered_expr", Comparison;
    OrderedExpr => "ordered_expr", Comparison;
    UnltExpr => "unlt_expr", Comparison;
    UnleExpr => "unle_expr", Comparison;
    UngtExpr => "ungt_expr", Comparison;
    UngeExpr => "unge_expr", Comparison;
    UneqExpr => "uneq_expr", Comparison;
    LtgtExpr => "ltgt_expr", Comparison;

    FixTruncExpr => "fix_trunc_expr", Unary;
    FloatExpr => "float_expr", Unary;
    NegateExpr => "negate_expr", Unary;
    AbsExpr => "abs_expr", Unary;
    AbsuExpr => "absu_expr", Unary;
    BitNotExpr => "bit_not_expr", Unary;
    ConjExpr => "conj_expr", Unary;
    ParenExpr => "paren_expr", Unary;
    NopExpr => "nop_expr", Unary;
    ConvertExpr => "convert_expr", Unary;
    AddrSpaceConvertExpr => "addr_space_convert_expr", Unary;
    FixedConvertExpr => "fixed_convert_expr", Unary;
    NonLvalueExpr => "non_lvalue_expr", Unary;
    VecDuplicateExpr => "vec_duplicate_expr", Unary;

    DeclExpr => "decl_expr", Statement;
    LabelExpr => "label_expr", Statement;
    GotoExpr => "goto_expr", Statement;
    ReturnExpr => "return_expr", Statement;
    ExitExpr => "exit_expr", Statement;
    LoopExpr => "loop_expr", Statement;
    SwitchExpr => "switch_expr", Statement;
    CaseLabelExpr => "case_label_expr", Statement;
    AsmExpr => "asm_expr", Statement;
    TryCatchExpr => "try_catch_expr", Statement;
    TryFinallyExpr => "try_finally_expr", Statement;
    EhElseExpr => "eh_else_expr", Statement;
    CatchExpr => "catch_expr", Statement;
    EhFilterExpr => "eh_filter_expr", Statement;
}

impl TreeCode {
    pub fn is_expression(&self) -> bool {
        self.class().is_expression()
    }

    pub fn is_type(&self) -> bool {
        self.class() == TreeCodeClass::Type
    }

    pub fn is_decl(&self) -> bool {
        self.class() == TreeCodeClass::Declaration
    }

    /// `NOP_EXPR` or `CONVERT_EXPR`.
    pub fn is_convert(&self) -> bool {
        matches!(self, TreeCode::NopExpr | TreeCode::ConvertExpr)
    }

    pub fn is_pointer_type(&self) -> bool {
        matches!(self, TreeCode::PointerType | TreeCode::ReferenceType)
    }

    pub fn is_integral_type(&self) -> bool {
        matches!(
            self,
            TreeCode::IntegerType | TreeCode::EnumeralType | TreeCode::BooleanType
        )
    }
}

impl fmt::Display for TreeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_names_and_classes() {
        assert_eq!(TreeCode::IntegerCst.name(), "integer_cst");
        assert_eq!(TreeCode::IntegerCst.class(), TreeCodeClass::Constant);
        assert_eq!(TreeCode::CallExpr.class().as_str(), "vl_exp");
        assert_eq!(TreeCode::RealignLoadExpr.name(), "realign_load");
        assert!(TreeCode::MemRef.is_expression());
        assert!(!TreeCode::VarDecl.is_expression());
        assert!(TreeCode::PointerType.is_type());
    }

    #[test]
    fn test_lang_specific_code() {
        let code = TreeCode::LangSpecific("FOO_KIND".to_string());
        assert_eq!(code.name(), "FOO_KIND");
        assert_eq!(code.class(), TreeCodeClass::Exceptional);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&TreeCode::PointerPlusExpr).unwrap();
        assert_eq!(json, "\"POINTER_PLUS_EXPR\"");
        let code: TreeCode = serde_json::from_str("\"SSA_NAME\"").unwrap();
        assert_eq!(code, TreeCode::SsaName);
        let code: TreeCode = serde_json::from_str("{\"LANG_SPECIFIC\":\"baselink\"}").unwrap();
        assert_eq!(code.name(), "baselink");
    }
}
