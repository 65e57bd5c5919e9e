//! Operator priorities and symbols
//!
//! Priorities follow the C precedence ladder: a higher number binds
//! tighter. Operands are parenthesised against their parent's priority;
//! binary operators compare with `<=`, unary and postfix ones with `<`.

use gex_ir::{TreeArena, TreeCode, TreeId};

/// Priority of an absent operand; never parenthesised.
pub const NO_OPERAND_PRIO: u32 = 9999;

pub fn op_code_prio(code: &TreeCode) -> u32 {
    use TreeCode::*;
    match code {
        TreeList | CompoundExpr | BindExpr => 1,
        ModifyExpr | InitExpr => 2,
        CondExpr => 3,
        TruthOrExpr | TruthOrifExpr => 4,
        TruthAndExpr | TruthAndifExpr => 5,
        BitIorExpr => 6,
        BitXorExpr | TruthXorExpr => 7,
        BitAndExpr => 8,
        EqExpr | NeExpr => 9,
        UnltExpr | UnleExpr | UngtExpr | UngeExpr | UneqExpr | LtgtExpr | OrderedExpr
        | UnorderedExpr | LtExpr | LeExpr | GtExpr | GeExpr => 10,
        LshiftExpr | RshiftExpr | LrotateExpr | RrotateExpr | WidenLshiftExpr => 11,
        WidenSumExpr | PlusExpr | PointerPlusExpr | PointerDiffExpr | MinusExpr => 12,
        WidenMultExpr | DotProdExpr | WidenMultPlusExpr | WidenMultMinusExpr | MultExpr
        | MultHighpartExpr | TruncDivExpr | CeilDivExpr | FloorDivExpr | RoundDivExpr
        | RdivExpr | ExactDivExpr | TruncModExpr | CeilModExpr | FloorModExpr
        | RoundModExpr => 13,
        TruthNotExpr | BitNotExpr | PreincrementExpr | PredecrementExpr | NegateExpr
        | IndirectRef | AddrExpr | FloatExpr | NopExpr | ConvertExpr | FixTruncExpr
        | TargetExpr => 14,
        PostincrementExpr | PostdecrementExpr => 15,
        _ => 16,
    }
}

/// Priority of `node`; value-preserving wrappers take their operand's.
pub fn op_prio(arena: &TreeArena, node: Option<TreeId>) -> u32 {
    let mut current = node;
    while let Some(id) = current {
        match arena.code(id) {
            TreeCode::SaveExpr | TreeCode::NonLvalueExpr => current = arena.operand(id, 0),
            code => return op_code_prio(code),
        }
    }
    NO_OPERAND_PRIO
}

pub fn op_symbol(code: &TreeCode) -> &'static str {
    use TreeCode::*;
    match code {
        ModifyExpr | InitExpr => "=",
        TruthOrExpr | TruthOrifExpr => "||",
        TruthAndExpr | TruthAndifExpr => "&&",
        BitIorExpr => "|",
        TruthXorExpr | BitXorExpr => "^",
        AddrExpr | BitAndExpr => "&",
        OrderedExpr => "ord",
        UnorderedExpr => "unord",
        EqExpr => "==",
        UneqExpr => "u==",
        NeExpr => "!=",
        LtExpr => "<",
        UnltExpr => "u<",
        LeExpr => "<=",
        UnleExpr => "u<=",
        GtExpr => ">",
        UngtExpr => "u>",
        GeExpr => ">=",
        UngeExpr => "u>=",
        LtgtExpr => "<>",
        LshiftExpr => "<<",
        RshiftExpr => ">>",
        LrotateExpr => "r<<",
        RrotateExpr => "r>>",
        WidenLshiftExpr => "w<<",
        PointerPlusExpr | PlusExpr => "+",
        WidenSumExpr => "w+",
        WidenMultExpr => "w*",
        MultHighpartExpr => "h*",
        NegateExpr | MinusExpr | PointerDiffExpr => "-",
        BitNotExpr => "~",
        TruthNotExpr => "!",
        MultExpr | IndirectRef => "*",
        TruncDivExpr | RdivExpr => "/",
        CeilDivExpr => "/[cl]",
        FloorDivExpr => "/[fl]",
        RoundDivExpr => "/[rd]",
        ExactDivExpr => "/[ex]",
        TruncModExpr => "%",
        CeilModExpr => "%[cl]",
        FloorModExpr => "%[fl]",
        RoundModExpr => "%[rd]",
        PredecrementExpr | PostdecrementExpr => "--",
        PreincrementExpr | PostincrementExpr => "++",
        MaxExpr => "max",
        MinExpr => "min",
        _ => "<<< ??? >>>",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gex_ir::TreeBuilder;

    #[test]
    fn test_ladder() {
        assert!(op_code_prio(&TreeCode::MultExpr) > op_code_prio(&TreeCode::PlusExpr));
        assert!(op_code_prio(&TreeCode::PlusExpr) > op_code_prio(&TreeCode::EqExpr));
        assert_eq!(op_code_prio(&TreeCode::SsaName), 16);
        assert_eq!(op_code_prio(&TreeCode::PostincrementExpr), 15);
    }

    #[test]
    fn test_wrappers_take_operand_priority() {
        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let x = b.var_decl("x", int);
        let sum = b.binary(TreeCode::PlusExpr, int, x, x);
        let saved = b.unary(TreeCode::SaveExpr, int, sum);
        let arena = b.finish();
        assert_eq!(op_prio(&arena, Some(saved)), 12);
        assert_eq!(op_prio(&arena, None), NO_OPERAND_PRIO);
    }

    #[test]
    fn test_symbols() {
        assert_eq!(op_symbol(&TreeCode::PointerPlusExpr), "+");
        assert_eq!(op_symbol(&TreeCode::CeilModExpr), "%[cl]");
        assert_eq!(op_symbol(&TreeCode::UnorderedExpr), "unord");
        assert_eq!(op_symbol(&TreeCode::VarDecl), "<<< ??? >>>");
    }
}
