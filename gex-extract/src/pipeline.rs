//! Per-function pipeline: assemble, encode, write.

use crate::assembler::Assembler;
use crate::codec::encoder_for;
use crate::record::FunctionRecord;
use crate::sink::FileSink;
use gex_common::{ExtractConfig, ExtractError};
use gex_ir::{FunctionIr, HostSnapshot, TargetSizes, TreeArena};
use log::{debug, info};
use std::path::PathBuf;

fn assemble(
    config: &ExtractConfig,
    arena: &TreeArena,
    target: TargetSizes,
    func: &FunctionIr,
) -> Option<FunctionRecord> {
    match Assembler::new(config, arena, target).assemble(func) {
        Ok(record) => Some(record),
        Err(reason) => {
            debug!("skipping {}: {}", func.name, reason);
            None
        }
    }
}

/// Encoded record of `func`, or `None` when it is skipped.
pub fn encode_function(
    config: &ExtractConfig,
    arena: &TreeArena,
    target: TargetSizes,
    func: &FunctionIr,
) -> Result<Option<Vec<u8>>, ExtractError> {
    let Some(record) = assemble(config, arena, target, func) else {
        return Ok(None);
    };
    encoder_for(config.data_format).encode(&record).map(Some)
}

/// Extract `func` into its output file and return the file's path, or
/// `None` when it is skipped.
pub fn extract_function(
    config: &ExtractConfig,
    arena: &TreeArena,
    target: TargetSizes,
    func: &FunctionIr,
) -> Result<Option<PathBuf>, ExtractError> {
    let Some(record) = assemble(config, arena, target, func) else {
        return Ok(None);
    };
    let bytes = encoder_for(config.data_format).encode(&record)?;
    FileSink::new(config)
        .write(&record.filename, &record.name, &bytes)
        .map(Some)
}

/// Extract every function of `snapshot`, or only those named in `filter`
/// when it is non-empty.
pub fn extract_snapshot(
    config: &ExtractConfig,
    snapshot: &HostSnapshot,
    filter: &[String],
) -> Result<Vec<PathBuf>, ExtractError> {
    snapshot.validate()?;
    let mut written = Vec::new();
    for func in &snapshot.functions {
        if !filter.is_empty() && !filter.contains(&func.name) {
            continue;
        }
        if let Some(path) = extract_function(config, &snapshot.trees, snapshot.target, func)? {
            written.push(path);
        }
    }
    info!(
        "extracted {} of {} functions",
        written.len(),
        snapshot.functions.len()
    );
    Ok(written)
}
