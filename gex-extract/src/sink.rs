//! Output files
//!
//! A function `N` from `<source_root>/dir/file.c` lands in
//! `<output_path>/dir/file_c/N.<ext>`.

use gex_common::{ExtractConfig, ExtractError};
use log::debug;
use std::fs;
use std::path::PathBuf;

pub struct FileSink<'a> {
    config: &'a ExtractConfig,
}

impl<'a> FileSink<'a> {
    pub fn new(config: &'a ExtractConfig) -> Self {
        Self { config }
    }

    /// Output path of function `name` defined in the absolute `filename`.
    pub fn path_for(&self, filename: &str, name: &str) -> PathBuf {
        let root = self.config.source_root().display().to_string();
        let relative = filename.strip_prefix(root.as_str()).unwrap_or(filename);
        let dir = relative.replace('.', "_");
        let file = format!(
            "{}.{}",
            name.replace([':', '~', '+'], "_"),
            self.config.data_format.extension()
        );
        self.config
            .output_path
            .join(dir.trim_start_matches('/'))
            .join(file)
    }

    /// Write `bytes`, creating the directories on the way.
    pub fn write(&self, filename: &str, name: &str, bytes: &[u8]) -> Result<PathBuf, ExtractError> {
        let path = self.path_for(filename, name);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| ExtractError::io(dir, &e))?;
        }
        fs::write(&path, bytes).map_err(|e| ExtractError::io(&path, &e))?;
        debug!("wrote {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}
