//! Function assembler
//!
//! Collects one [`FunctionRecord`]: the source span, the declaration, every
//! variable the function introduces and its blocks and statements.

use crate::record::{
    ArgVariable, BlockRecord, FunctionRecord, LocalVariable, PhiIncoming, PhiRecord, SsaVariable,
};
use crate::statement::{BlockRef, Statement, StatementExtractor};
use crate::value::NodeValue;
use gex_common::{ExtractConfig, SkipReason};
use gex_ir::{BasicBlock, FunctionIr, TargetSizes, TreeArena, TreeId};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

pub struct Assembler<'a> {
    config: &'a ExtractConfig,
    arena: &'a TreeArena,
    extractor: StatementExtractor<'a>,
}

impl<'a> Assembler<'a> {
    pub fn new(config: &'a ExtractConfig, arena: &'a TreeArena, target: TargetSizes) -> Self {
        Self {
            config,
            arena,
            extractor: StatementExtractor::new(arena, target),
        }
    }

    fn classify(&mut self, node: Option<TreeId>) -> NodeValue {
        self.extractor.classifier().classify(node)
    }

    fn declaration(&mut self, decl: TreeId) -> NodeValue {
        self.extractor.classifier().declaration(decl)
    }

    /// The source file of `func` when it lies under the source root.
    fn resolve_source(&self, func: &FunctionIr) -> Result<PathBuf, SkipReason> {
        let filename = func.source_file().ok_or(SkipReason::NoSourceFile)?;
        let out_of_scope = || SkipReason::OutOfScope {
            filename: filename.to_string(),
        };
        let path = fs::canonicalize(filename).map_err(|_| out_of_scope())?;
        if path.starts_with(self.config.source_root()) {
            Ok(path)
        } else {
            Err(out_of_scope())
        }
    }

    pub fn assemble(&mut self, func: &FunctionIr) -> Result<FunctionRecord, SkipReason> {
        let path = self.resolve_source(func)?;
        let filename = path.display().to_string();
        info!("processing ... [{}] -- {}", filename, func.name);

        let start_line = func.start_location.as_ref().map_or(-1, |loc| i64::from(loc.line));
        let end_line = func.end_location.as_ref().map_or(-1, |loc| i64::from(loc.line));
        let source_lines = source_lines(&read_lines(&path), start_line, end_line);

        let decl = self.classify(Some(func.decl));
        let ssa_names = func
            .ssa_names
            .iter()
            .skip(1)
            .flatten()
            .map(|name| self.classify(Some(*name)))
            .collect();
        let args = func.arguments.iter().map(|arg| self.arg_variable(func, *arg)).collect();
        let locals = func
            .local_decls
            .iter()
            .flatten()
            .map(|local| LocalVariable {
                arg: self.classify(Some(*local)),
                declaration: self.declaration(*local),
            })
            .collect();
        let ssa_variables = self.ssa_variables(func);

        let mut blocks = Vec::with_capacity(func.blocks.len());
        let mut statements = Vec::new();
        for bb in &func.blocks {
            blocks.push(self.block(bb));
            statements.extend(self.block_statements(bb));
        }
        debug!(
            "{}: {} blocks, {} statements",
            func.name,
            blocks.len(),
            statements.len()
        );
        info!("done ... [{}] -- {}", filename, func.name);

        Ok(FunctionRecord {
            name: func.name.clone(),
            filename,
            start_line,
            end_line,
            source_lines,
            decl,
            ssa_names,
            args,
            locals,
            ssa_variables,
            blocks,
            statements,
        })
    }

    fn arg_variable(&mut self, func: &FunctionIr, arg: TreeId) -> ArgVariable {
        let arena = self.arena;
        let default_def = func.ssa_default_def(arena, arg);
        let (ty, def, ssa_name_var) = match default_def {
            Some(def) => (
                self.classify(arena.ty(def)),
                self.classify(Some(def)),
                self.classify(arena.ssa_var(def)),
            ),
            None => (NodeValue::empty(), NodeValue::empty(), NodeValue::empty()),
        };
        ArgVariable {
            arg: self.classify(Some(arg)),
            declaration: self.declaration(arg),
            ty,
            default_def: def,
            ssa_name_var,
        }
    }

    /// SSA names without an underlying declaration; only present once the
    /// function is in SSA form.
    fn ssa_variables(&mut self, func: &FunctionIr) -> Vec<SsaVariable> {
        if !func.in_ssa {
            return Vec::new();
        }
        let arena = self.arena;
        func.ssa_names
            .iter()
            .skip(1)
            .flatten()
            .filter(|name| arena.ssa_var(**name).is_none())
            .map(|name| SsaVariable {
                arg: self.classify(Some(*name)),
                ty: self.classify(arena.ty(*name)),
            })
            .collect()
    }

    fn block(&mut self, bb: &BasicBlock) -> BlockRecord {
        let arena = self.arena;
        let mut phis = Vec::with_capacity(bb.phis.len());
        for phi in &bb.phis {
            let is_virtual = phi
                .result
                .and_then(|result| arena.ssa_info(result))
                .is_some_and(|info| info.is_virtual);
            if is_virtual {
                continue;
            }
            let incoming = phi
                .args
                .iter()
                .map(|arg| PhiIncoming {
                    line: arg.location.as_ref().map_or(-1, |loc| i64::from(loc.line)),
                    column: arg.location.as_ref().map_or(-1, |loc| i64::from(loc.column)),
                    src: arg.src,
                    value: self.classify(arg.def),
                })
                .collect();
            phis.push(PhiRecord {
                lhs: self.classify(phi.result),
                incoming,
            });
        }
        BlockRecord {
            index: bb.index,
            edges: bb.successor_indices(),
            phis,
        }
    }

    fn block_statements(&mut self, bb: &BasicBlock) -> Vec<Statement> {
        let block = BlockRef {
            index: bb.index,
            successors: &bb.successors,
        };
        bb.statements
            .iter()
            .map(|stmt| self.extractor.extract(stmt, block))
            .collect()
    }
}

/// Lines of `path`; an unreadable file has none.
fn read_lines(path: &Path) -> Vec<String> {
    match fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).lines().map(str::to_string).collect(),
        Err(e) => {
            warn!("cannot read {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Numbered lines `start..=end`; lines past the end of the file are empty.
fn source_lines(lines: &[String], start: i64, end: i64) -> Vec<(String, String)> {
    if start < 0 || end < 0 {
        return Vec::new();
    }
    (start..=end)
        .map(|number| {
            let text = usize::try_from(number - 1)
                .ok()
                .and_then(|index| lines.get(index))
                .cloned()
                .unwrap_or_default();
            (number.to_string(), text)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::StatementArgs;
    use gex_common::{DataFormat, SourceLocation};
    use gex_ir::{
        Edge, Gimple, GimpleAssign, GimpleKind, GimplePhi, GimpleReturn, PhiArg, TreeBuilder,
        TreeCode,
    };
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn config_for(root: &Path) -> ExtractConfig {
        ExtractConfig::new(root, root.join("out"), DataFormat::Json)
    }

    fn lines(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(n, t)| (n.to_string(), t.to_string())).collect()
    }

    #[test]
    fn test_source_lines_window() {
        let file: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(source_lines(&file, 2, 4), lines(&[("2", "b"), ("3", "c"), ("4", "")]));
        assert_eq!(source_lines(&[], 1, 2), lines(&[("1", ""), ("2", "")]));
        assert!(source_lines(&file, -1, 3).is_empty());
        assert!(source_lines(&file, 3, 2).is_empty());
    }

    struct Fixture {
        dir: TempDir,
        arena: TreeArena,
        func: FunctionIr,
    }

    /// `int sum (int a) { int t; ... }` with one phi block.
    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("sum.c");
        fs::write(&source, "int sum (int a)\n{\n  return a + 1;\n}\n").unwrap();
        let filename = source.display().to_string();

        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let fn_ty = b.function_type(int, vec![int]);
        let decl = b.function_decl("sum", fn_ty);
        let a = b.parm_decl("a", int);
        let t = b.var_decl("t", int);
        let a_1 = b.default_def(a, 1);
        let tmp_2 = b.ssa_name(None, int, 2);
        let t_3 = b.ssa_name(Some(t), int, 3);
        let mem_4 = b.virtual_ssa_name(4);
        let mem_5 = b.virtual_ssa_name(5);
        let one = b.int_cst(int, 1);
        let arena = b.finish();

        let mut func = FunctionIr::new("sum", decl);
        func.start_location = Some(SourceLocation::new(&filename, 1, 5));
        func.end_location = Some(SourceLocation::new(&filename, 4, 1));
        func.arguments = vec![a];
        func.local_decls = vec![Some(t), None];
        func.ssa_names = vec![None, Some(a_1), Some(tmp_2), Some(t_3), Some(mem_4), Some(mem_5)];
        func.in_ssa = true;
        func.entry_successors = vec![Edge::fallthru(2)];

        let mut bb2 = gex_ir::BasicBlock::new(2).with_successors(vec![Edge::fallthru(3)]);
        bb2.push(Gimple::new(GimpleKind::Assign(GimpleAssign {
            rhs_code: TreeCode::PlusExpr,
            lhs: Some(tmp_2),
            rhs: vec![Some(a_1), Some(one)],
        })));
        let mut bb3 = gex_ir::BasicBlock::new(3).with_successors(vec![Edge::fallthru(1)]);
        bb3.push_phi(GimplePhi {
            result: Some(t_3),
            args: vec![PhiArg {
                def: Some(tmp_2),
                src: 2,
                location: Some(SourceLocation::new(&filename, 3, 12)),
            }],
        });
        bb3.push_phi(GimplePhi {
            result: Some(mem_5),
            args: vec![PhiArg {
                def: Some(mem_4),
                src: 2,
                location: None,
            }],
        });
        bb3.push(Gimple::new(GimpleKind::Return(GimpleReturn { retval: Some(t_3) })));
        func.blocks = vec![bb2, bb3];

        Fixture { dir, arena, func }
    }

    #[test]
    fn test_assemble_function() {
        let Fixture { dir, arena, func } = fixture();
        let config = config_for(dir.path());
        let record = Assembler::new(&config, &arena, TargetSizes::LP64)
            .assemble(&func)
            .unwrap();

        assert_eq!(record.name, "sum");
        assert!(record.filename.ends_with("sum.c"));
        assert_eq!((record.start_line, record.end_line), (1, 4));
        assert_eq!(record.source_lines.len(), 4);
        assert_eq!(record.source_line(3), Some("  return a + 1;"));
        assert_eq!(record.decl.render(), "sum");
        assert_eq!(record.ssa_names.len(), 5);

        let arg = &record.args[0];
        assert_eq!(arg.arg.render(), "a");
        assert_eq!(arg.declaration.render(), " int a;");
        assert_eq!(arg.default_def.render(), "a_1(D)");
        assert_eq!(arg.ty.render(), "int");
        assert_eq!(arg.ssa_name_var.render(), "a");

        assert_eq!(record.locals.len(), 1);
        assert_eq!(record.locals[0].arg.render(), "t");

        let ssa: Vec<String> = record.ssa_variables.iter().map(|v| v.arg.render()).collect();
        assert_eq!(ssa, vec!["_2"]);
    }

    #[test]
    fn test_blocks_and_statements() {
        let Fixture { dir, arena, func } = fixture();
        let config = config_for(dir.path());
        let record = Assembler::new(&config, &arena, TargetSizes::LP64)
            .assemble(&func)
            .unwrap();

        assert_eq!(record.blocks.len(), 2);
        assert_eq!(record.blocks[0].edges, vec![3]);
        assert_eq!(record.phi_count(), 1);
        let phi = &record.blocks[1].phis[0];
        assert_eq!(phi.lhs.render(), "t_3");
        assert_eq!(phi.incoming[0].line, 3);
        assert_eq!(phi.incoming[0].column, 12);
        assert_eq!(phi.incoming[0].src, 2);
        assert_eq!(phi.incoming[0].value.render(), "_2");

        let codes: Vec<&str> = record.statements.iter().map(|s| s.code_name).collect();
        assert_eq!(codes, vec!["gimple_assign", "gimple_return"]);
        assert_eq!(record.statements[1].block_index, 3);
        assert!(matches!(record.statements[0].args, StatementArgs::Assign(_)));
    }

    #[test]
    fn test_argument_without_default_def() {
        let Fixture { dir, arena, mut func } = fixture();
        func.ssa_names.truncate(1);
        func.blocks.clear();
        let config = config_for(dir.path());
        let record = Assembler::new(&config, &arena, TargetSizes::LP64)
            .assemble(&func)
            .unwrap();
        let arg = &record.args[0];
        assert!(arg.default_def.is_empty());
        assert!(arg.ty.is_empty());
        assert!(arg.ssa_name_var.is_empty());
        assert!(record.ssa_variables.is_empty());
    }

    #[test]
    fn test_skips() {
        let Fixture { dir, arena, mut func } = fixture();
        let elsewhere = TempDir::new().unwrap();
        let config = config_for(elsewhere.path());
        let skip = Assembler::new(&config, &arena, TargetSizes::LP64).assemble(&func);
        assert!(matches!(skip, Err(SkipReason::OutOfScope { .. })));

        let config = config_for(dir.path());
        func.start_location = None;
        func.decl_source_file = None;
        let skip = Assembler::new(&config, &arena, TargetSizes::LP64).assemble(&func);
        assert_eq!(skip, Err(SkipReason::NoSourceFile));
    }

    #[test]
    fn test_missing_end_location() {
        let Fixture { dir, arena, mut func } = fixture();
        func.end_location = None;
        let config = config_for(dir.path());
        let record = Assembler::new(&config, &arena, TargetSizes::LP64)
            .assemble(&func)
            .unwrap();
        assert_eq!(record.end_line, -1);
        assert!(record.source_lines.is_empty());
    }
}
