//! Serialized host state
//!
//! A [`HostSnapshot`] is everything the extractor reads from the host for
//! one translation unit: the target's type sizes, the tree arena and the
//! functions compiled from it. Host adapters write snapshots as JSON.

use crate::function::FunctionIr;
use crate::target::TargetSizes;
use crate::tree::{TreeArena, TreeId};
use gex_common::ExtractError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostSnapshot {
    #[serde(default)]
    pub target: TargetSizes,
    pub trees: TreeArena,
    #[serde(default)]
    pub functions: Vec<FunctionIr>,
}

impl HostSnapshot {
    pub fn new(target: TargetSizes, trees: TreeArena, functions: Vec<FunctionIr>) -> Self {
        Self {
            target,
            trees,
            functions,
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, ExtractError> {
        serde_json::from_str(text).map_err(|e| ExtractError::snapshot(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ExtractError> {
        let text = fs::read_to_string(path).map_err(|e| ExtractError::io(path, &e))?;
        let snapshot = Self::from_json_str(&text)?;
        debug!(
            "loaded snapshot {} ({} trees, {} functions)",
            path.display(),
            snapshot.trees.len(),
            snapshot.functions.len()
        );
        Ok(snapshot)
    }

    pub fn to_json_string(&self) -> Result<String, ExtractError> {
        serde_json::to_string_pretty(self).map_err(|e| ExtractError::snapshot(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<(), ExtractError> {
        let text = self.to_json_string()?;
        fs::write(path, text).map_err(|e| ExtractError::io(path, &e))
    }

    pub fn function(&self, name: &str) -> Option<&FunctionIr> {
        self.functions.iter().find(|func| func.name == name)
    }

    /// Check that every tree reference resolves, then every function.
    pub fn validate(&self) -> Result<(), ExtractError> {
        for (id, _) in self.trees.iter() {
            self.trees
                .references_in_range(id)
                .map_err(|bad: TreeId| {
                    ExtractError::snapshot(format!("tree {} refers to missing tree {}", id, bad))
                })?;
        }
        self.functions
            .iter()
            .try_for_each(|func| func.validate(&self.trees))
    }
}
