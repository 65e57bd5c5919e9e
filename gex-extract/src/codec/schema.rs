//! Wire schema
//!
//! Field names of the emitted records. Every encoder walks the same
//! `Serialize` impls, so the JSON and MessagePack outputs share one shape:
//! structs become maps, and an absent optional operand becomes an empty
//! map.

use crate::record::{
    ArgVariable, BlockRecord, FunctionRecord, LocalVariable, PhiIncoming, PhiRecord, SsaVariable,
};
use crate::statement::{Statement, StatementArgs};
use crate::value::{NodeValue, Payload, Value};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

/// Marker of absent statement operands
struct Empty;

impl Serialize for Empty {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_map(Some(0))?.end()
    }
}

/// `T` when present, else `{}`
struct OrEmpty<'a, T>(Option<&'a T>);

impl<T: Serialize> Serialize for OrEmpty<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Some(value) => value.serialize(serializer),
            None => Empty.serialize(serializer),
        }
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Value", 6)?;
        s.serialize_field("value_type", if self.is_simple() { "simple" } else { "complex" })?;
        s.serialize_field("code_class", self.meta.class_name())?;
        s.serialize_field("code_name", self.meta.code_name())?;
        s.serialize_field("is_expr", &self.meta.is_expr)?;
        s.serialize_field("operand_length", &self.meta.operand_length)?;
        match &self.payload {
            Payload::Simple(text) => s.serialize_field("value", text)?,
            Payload::Complex(children) => s.serialize_field("value", children)?,
        }
        s.end()
    }
}

impl Serialize for NodeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("NodeValue", 1)?;
        s.serialize_field("values", &self.values)?;
        s.end()
    }
}

impl Serialize for Statement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Statement", 12)?;
        s.serialize_field("gimple_code", self.code_name)?;
        s.serialize_field("gimple_expr_code", &self.expr_code)?;
        s.serialize_field("lineno", &self.line)?;
        s.serialize_field("has_substatements", flag(self.has_substatements))?;
        s.serialize_field(
            "has_register_or_memory_operands",
            flag(self.has_register_or_memory_operands),
        )?;
        s.serialize_field("has_memory_operands", flag(self.has_memory_operands))?;
        s.serialize_field("gimple_num_ops", &self.num_ops)?;
        s.serialize_field("basic_block_index", &self.block_index)?;
        s.serialize_field("basic_block_edges", &self.block_edges)?;
        s.serialize_field("vdef_value", &OrEmpty(self.vdef.as_ref()))?;
        s.serialize_field("vuse_value", &OrEmpty(self.vuse.as_ref()))?;
        s.serialize_field("args", &self.args)?;
        s.end()
    }
}

impl Serialize for StatementArgs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StatementArgs::Asm(asm) => {
                let mut s = serializer.serialize_struct("GimpleAsm", 7)?;
                s.serialize_field("gasm_string_code", &asm.string)?;
                s.serialize_field("gasm_input_operands", &asm.inputs)?;
                s.serialize_field("gasm_output_operands", &asm.outputs)?;
                s.serialize_field("gasm_clobber_operands", &asm.clobbers)?;
                s.serialize_field("gasm_labels", &asm.labels)?;
                s.serialize_field("gasm_volatile", &asm.volatile)?;
                s.serialize_field("gasm_inline", &asm.inline)?;
                s.end()
            }
            StatementArgs::Assign(assign) => {
                let [arg1, arg2, arg3] = &assign.rhs;
                let mut s = serializer.serialize_struct("GimpleAssign", 8)?;
                s.serialize_field("gassign_subcode", &assign.subcode)?;
                s.serialize_field("gassign_lhs_arg", &assign.lhs)?;
                s.serialize_field("gassign_has_rhs_arg1", &arg1.is_some())?;
                s.serialize_field("gassign_rhs_arg1", &OrEmpty(arg1.as_ref()))?;
                s.serialize_field("gassign_has_rhs_arg2", &arg2.is_some())?;
                s.serialize_field("gassign_rhs_arg2", &OrEmpty(arg2.as_ref()))?;
                s.serialize_field("gassign_has_rhs_arg3", &arg3.is_some())?;
                s.serialize_field("gassign_rhs_arg3", &OrEmpty(arg3.as_ref()))?;
                s.end()
            }
            StatementArgs::Bind(bind) => {
                let mut s = serializer.serialize_struct("GimpleBind", 2)?;
                s.serialize_field("gbind_bind_vars", &bind.vars)?;
                s.serialize_field("gbind_bind_body", &bind.body)?;
                s.end()
            }
            StatementArgs::Call(call) => {
                let mut s = serializer.serialize_struct("GimpleCall", 14)?;
                s.serialize_field("gcall_isinternal_only_function", &call.is_internal)?;
                s.serialize_field("gcall_internal_function_name", &call.internal_name)?;
                s.serialize_field("gcall_call_num_of_args", &call.num_args)?;
                s.serialize_field("gcall_has_lhs", &call.lhs.is_some())?;
                s.serialize_field("gcall_lhs_arg", &OrEmpty(call.lhs.as_ref()))?;
                s.serialize_field("gcall_is_tm_clone", &call.is_tm_clone)?;
                s.serialize_field(
                    "gcall_transaction_code_properties",
                    &call.transaction_properties,
                )?;
                s.serialize_field(
                    "gcall_is_marked_for_return_slot_optimization",
                    &call.return_slot_opt,
                )?;
                s.serialize_field("gcall_is_marked_as_a_tail_call", &call.tail_call)?;
                s.serialize_field(
                    "gcall_is_marked_as_requiring_tail_call_optimization",
                    &call.must_tail_call,
                )?;
                s.serialize_field(
                    "gcall_has_static_chain_for_call_statement",
                    &call.static_chain.is_some(),
                )?;
                s.serialize_field(
                    "gcall_static_chain_for_call_statement",
                    &OrEmpty(call.static_chain.as_ref()),
                )?;
                s.serialize_field("gcall_fn", &call.function)?;
                s.serialize_field("gcall_args", &call.args)?;
                s.end()
            }
            StatementArgs::Cond(cond) => {
                let mut s = serializer.serialize_struct("GimpleCond", 11)?;
                s.serialize_field("gcond_rhs", &cond.rhs)?;
                s.serialize_field("gcond_lhs", &cond.lhs)?;
                s.serialize_field("gcond_has_true_goto_label", &cond.true_label.is_some())?;
                s.serialize_field("gcond_true_goto_label", &OrEmpty(cond.true_label.as_ref()))?;
                s.serialize_field("gcond_has_false_else_goto_label", &cond.false_label.is_some())?;
                s.serialize_field(
                    "gcond_false_else_goto_label",
                    &OrEmpty(cond.false_label.as_ref()),
                )?;
                s.serialize_field("gcond_tree_code_name", &cond.code_name)?;
                s.serialize_field("gcond_has_goto_true_edge", &cond.true_edge.is_some())?;
                s.serialize_field("goto_true_edge", &cond.true_edge.unwrap_or(-1))?;
                s.serialize_field("gcond_has_else_goto_false_edge", &cond.false_edge.is_some())?;
                s.serialize_field("else_goto_false_edge", &cond.false_edge.unwrap_or(-1))?;
                s.end()
            }
            StatementArgs::Label { label, non_local } => {
                let mut s = serializer.serialize_struct("GimpleLabel", 2)?;
                s.serialize_field("glabel_label", label)?;
                s.serialize_field("glabel_is_non_local", non_local)?;
                s.end()
            }
            StatementArgs::Goto { dest } => {
                let mut s = serializer.serialize_struct("GimpleGoto", 1)?;
                s.serialize_field("ggoto_dest_goto_label", dest)?;
                s.end()
            }
            StatementArgs::Nop => {
                let mut s = serializer.serialize_struct("GimpleNop", 1)?;
                s.serialize_field("gnop_nop_str", crate::statement::NOP_MARKER)?;
                s.end()
            }
            StatementArgs::Return { value } => {
                let mut s = serializer.serialize_struct("GimpleReturn", 2)?;
                s.serialize_field("greturn_return_value", &OrEmpty(value.as_ref()))?;
                s.serialize_field("greturn_has_greturn_return_value", &value.is_some())?;
                s.end()
            }
            StatementArgs::Switch(switch) => {
                let mut s = serializer.serialize_struct("GimpleSwitch", 3)?;
                s.serialize_field("gswitch_switch_index", &switch.index)?;
                s.serialize_field("gswitch_switch_case_labels", &switch.case_labels)?;
                s.serialize_field("gswitch_switch_labels", &switch.labels)?;
                s.end()
            }
            StatementArgs::Try(try_) => {
                let mut s = serializer.serialize_struct("GimpleTry", 4)?;
                s.serialize_field("gtry_try_cleanup", &OrEmpty(try_.cleanup.as_ref()))?;
                s.serialize_field("gtry_try_eval", &try_.eval)?;
                s.serialize_field("gtry_try_type_kind", try_.kind)?;
                s.serialize_field("gtry_has_try_cleanup", &try_.cleanup.is_some())?;
                s.end()
            }
            StatementArgs::Phi(phi) => {
                let mut s = serializer.serialize_struct("GimplePhi", 4)?;
                s.serialize_field("gphi_lhs", &phi.lhs)?;
                s.serialize_field("gphi_phi_args", &phi.args)?;
                s.serialize_field("gphi_phi_args_basicblock_src_index", &phi.src_indices)?;
                s.serialize_field("gphi_phi_args_locations", &phi.locations)?;
                s.end()
            }
            StatementArgs::Other => Empty.serialize(serializer),
        }
    }
}

impl Serialize for ArgVariable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ArgVariable", 5)?;
        s.serialize_field("arg", &self.arg)?;
        s.serialize_field("var_type", &self.ty)?;
        s.serialize_field("var_declaration", &self.declaration)?;
        s.serialize_field("var_def", &self.default_def)?;
        s.serialize_field("var_ssa_name_var", &self.ssa_name_var)?;
        s.end()
    }
}

impl Serialize for LocalVariable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("LocalVariable", 2)?;
        s.serialize_field("arg", &self.arg)?;
        s.serialize_field("var_declaration", &self.declaration)?;
        s.end()
    }
}

impl Serialize for SsaVariable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("SsaVariable", 2)?;
        s.serialize_field("arg", &self.arg)?;
        s.serialize_field("var_type", &self.ty)?;
        s.end()
    }
}

impl Serialize for PhiIncoming {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("PhiIncoming", 4)?;
        s.serialize_field("line", &self.line)?;
        s.serialize_field("column", &self.column)?;
        s.serialize_field("basic_block_src_index", &self.src)?;
        s.serialize_field("phi_rhs", &self.value)?;
        s.end()
    }
}

impl Serialize for PhiRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("PhiRecord", 2)?;
        s.serialize_field("phi_lhs", &self.lhs)?;
        s.serialize_field("gimple_phi_rhs_list", &self.incoming)?;
        s.end()
    }
}

impl Serialize for BlockRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("BlockRecord", 3)?;
        s.serialize_field("bb_index", &self.index)?;
        s.serialize_field("bb_edges", &self.edges)?;
        s.serialize_field("phis", &self.phis)?;
        s.end()
    }
}

/// Line number to text, in line order
struct SourceLines<'a>(&'a [(String, String)]);

impl Serialize for SourceLines<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (number, text) in self.0 {
            map.serialize_entry(number, text)?;
        }
        map.end()
    }
}

struct FunctionInfo<'a>(&'a FunctionRecord);

impl Serialize for FunctionInfo<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let record = self.0;
        let mut s = serializer.serialize_struct("FunctionInfo", 10)?;
        s.serialize_field("fn_name", &record.name)?;
        s.serialize_field("fn_filename", &record.filename)?;
        s.serialize_field("fn_start_line_no", &record.start_line)?;
        s.serialize_field("fn_end_line_no", &record.end_line)?;
        s.serialize_field("fn_source_lines", &SourceLines(&record.source_lines))?;
        s.serialize_field("fn_decl", &record.decl)?;
        s.serialize_field("fn_ssa_names", &record.ssa_names)?;
        s.serialize_field("fn_args", &record.args)?;
        s.serialize_field("fn_local_variables", &record.locals)?;
        s.serialize_field("fn_ssa_variables", &record.ssa_variables)?;
        s.end()
    }
}

impl Serialize for FunctionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("FunctionRecord", 3)?;
        s.serialize_field("function_info", &FunctionInfo(self))?;
        s.serialize_field("gimples", &self.statements)?;
        s.serialize_field("basicblocks", &self.blocks)?;
        s.end()
    }
}
