//! Functions and their control-flow graph

use crate::gimple::{Gimple, GimpleKind, GimplePhi};
use crate::tree::{TreeArena, TreeId};
use gex_common::{ExtractError, SourceLocation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Index of the entry block
pub const ENTRY_BLOCK: i32 = 0;
/// Index of the exit block
pub const EXIT_BLOCK: i32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeFlags {
    pub fallthru: bool,
    pub true_value: bool,
    pub false_value: bool,
    pub abnormal: bool,
}

/// A control-flow edge, stored with its source block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub dest: i32,
    #[serde(default)]
    pub flags: EdgeFlags,
}

impl Edge {
    pub fn new(dest: i32) -> Self {
        Self {
            dest,
            flags: EdgeFlags::default(),
        }
    }

    pub fn fallthru(dest: i32) -> Self {
        Self {
            dest,
            flags: EdgeFlags {
                fallthru: true,
                ..EdgeFlags::default()
            },
        }
    }

    pub fn true_value(dest: i32) -> Self {
        Self {
            dest,
            flags: EdgeFlags {
                true_value: true,
                ..EdgeFlags::default()
            },
        }
    }

    pub fn false_value(dest: i32) -> Self {
        Self {
            dest,
            flags: EdgeFlags {
                false_value: true,
                ..EdgeFlags::default()
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicBlock {
    pub index: i32,
    pub successors: Vec<Edge>,
    pub phis: Vec<GimplePhi>,
    pub statements: Vec<Gimple>,
}

impl BasicBlock {
    pub fn new(index: i32) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    pub fn with_successors(mut self, successors: Vec<Edge>) -> Self {
        self.successors = successors;
        self
    }

    pub fn push_phi(&mut self, phi: GimplePhi) {
        self.phis.push(phi);
    }

    pub fn push(&mut self, stmt: Gimple) {
        self.statements.push(stmt);
    }

    pub fn successor_indices(&self) -> Vec<i32> {
        self.successors.iter().map(|edge| edge.dest).collect()
    }
}

/// One compiled function as seen by the extraction pass
///
/// `blocks` holds the non-fixed blocks in layout order; the entry block is
/// represented only by its outgoing edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionIr {
    pub name: String,
    /// The `FUNCTION_DECL`.
    pub decl: TreeId,
    #[serde(default)]
    pub start_location: Option<SourceLocation>,
    #[serde(default)]
    pub end_location: Option<SourceLocation>,
    /// `DECL_SOURCE_FILE`, consulted when the start location has no file.
    #[serde(default)]
    pub decl_source_file: Option<String>,
    #[serde(default)]
    pub arguments: Vec<TreeId>,
    #[serde(default)]
    pub local_decls: Vec<Option<TreeId>>,
    /// SSA names indexed by version; slot 0 is always empty.
    #[serde(default)]
    pub ssa_names: Vec<Option<TreeId>>,
    #[serde(default)]
    pub in_ssa: bool,
    #[serde(default)]
    pub entry_successors: Vec<Edge>,
    #[serde(default)]
    pub blocks: Vec<BasicBlock>,
}

impl FunctionIr {
    pub fn new(name: &str, decl: TreeId) -> Self {
        Self {
            name: name.to_string(),
            decl,
            start_location: None,
            end_location: None,
            decl_source_file: None,
            arguments: Vec::new(),
            local_decls: Vec::new(),
            ssa_names: Vec::new(),
            in_ssa: false,
            entry_successors: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// Source file the function is attributed to: the start location's file,
    /// else the declaration's.
    pub fn source_file(&self) -> Option<&str> {
        self.start_location
            .as_ref()
            .map(|loc| loc.filename.as_str())
            .filter(|name| !name.is_empty())
            .or(self.decl_source_file.as_deref())
            .filter(|name| !name.is_empty())
    }

    /// `ssa_default_def`: the default definition of `decl`, if any.
    pub fn ssa_default_def(&self, arena: &TreeArena, decl: TreeId) -> Option<TreeId> {
        self.ssa_names.iter().flatten().copied().find(|&name| {
            arena
                .ssa_info(name)
                .is_some_and(|info| info.default_def && info.var == Some(decl))
        })
    }

    /// Number of control-flow edges reaching block `index`.
    pub fn predecessor_count(&self, index: i32) -> usize {
        self.entry_successors
            .iter()
            .chain(self.blocks.iter().flat_map(|bb| bb.successors.iter()))
            .filter(|edge| edge.dest == index)
            .count()
    }

    pub fn block(&self, index: i32) -> Option<&BasicBlock> {
        self.blocks.iter().find(|bb| bb.index == index)
    }

    /// Check the structural guarantees the host makes and the extractor
    /// relies on.
    pub fn validate(&self, arena: &TreeArena) -> Result<(), ExtractError> {
        let fail = |message: String| Err(ExtractError::invariant(format!("{}: {}", self.name, message)));

        let mut ids = vec![self.decl];
        ids.extend(self.arguments.iter().copied());
        ids.extend(self.local_decls.iter().flatten().copied());
        ids.extend(self.ssa_names.iter().flatten().copied());

        if let Some(Some(first)) = self.ssa_names.first() {
            return fail(format!("SSA name slot 0 is occupied by {}", first));
        }

        let mut seen = HashSet::new();
        for bb in &self.blocks {
            if !seen.insert(bb.index) {
                return fail(format!("duplicate basic block index {}", bb.index));
            }
            let preds = self.predecessor_count(bb.index);
            for phi in &bb.phis {
                if phi.args.len() != preds {
                    return fail(format!(
                        "phi in bb {} has {} arguments but the block has {} predecessors",
                        bb.index,
                        phi.args.len(),
                        preds
                    ));
                }
                ids.extend(phi.tree_refs());
            }
            for stmt in &bb.statements {
                check_statement(stmt).or_else(|message| fail(format!("bb {}: {}", bb.index, message)))?;
                ids.extend(stmt.tree_refs());
            }
        }

        match ids.into_iter().find(|id| !arena.contains(*id)) {
            Some(bad) => fail(format!("reference to missing tree {}", bad)),
            None => Ok(()),
        }
    }
}

fn check_statement(stmt: &Gimple) -> Result<(), String> {
    match &stmt.kind {
        GimpleKind::Assign(assign) if !(2..=4).contains(&stmt.num_ops()) => Err(format!(
            "assignment `{}` has {} operands",
            assign.rhs_code.name(),
            stmt.num_ops()
        )),
        GimpleKind::Bind(bind) => bind.body.iter().try_for_each(check_statement),
        GimpleKind::Try(try_) => try_
            .eval
            .iter()
            .chain(try_.cleanup.iter())
            .try_for_each(check_statement),
        _ => Ok(()),
    }
}
