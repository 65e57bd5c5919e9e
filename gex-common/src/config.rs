//! Extraction configuration
//!
//! Built once at start-up and passed by reference to the assembler and the
//! sink. The host hands options over as `key=value` plugin arguments, which
//! [`ExtractConfig::from_plugin_args`] understands.

use crate::error::ExtractError;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_OUTPUT_PATH: &str = "__default_gimple_extract_output/";

/// Wire format of the emitted function records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    Json,
    #[default]
    MsgPack,
}

impl DataFormat {
    /// File extension of the output files, identical to the format name.
    pub fn extension(self) -> &'static str {
        match self {
            DataFormat::Json => "json",
            DataFormat::MsgPack => "msgpack",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for DataFormat {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(DataFormat::Json),
            "msgpack" => Ok(DataFormat::MsgPack),
            other => Err(ExtractError::config(format!(
                "unknown data format '{}', expected json or msgpack",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractConfig {
    /// Functions whose source file lies outside this root are skipped.
    pub source_path: PathBuf,
    /// Root directory of the emitted files.
    pub output_path: PathBuf,
    pub data_format: DataFormat,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("."),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            data_format: DataFormat::default(),
        }
    }
}

impl ExtractConfig {
    pub fn new(
        source_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        data_format: DataFormat,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            output_path: output_path.into(),
            data_format,
        }
    }

    /// Apply `key=value` plugin arguments on top of the defaults.
    ///
    /// `source_path` must exist. `output_path` is made absolute but may not
    /// exist yet. An unrecognised `data_format` value keeps the default.
    pub fn from_plugin_args<K, V>(args: &[(K, V)]) -> Result<Self, ExtractError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        for (key, value) in args {
            let value = value.as_ref();
            match key.as_ref() {
                "source_path" => {
                    config.source_path = std::fs::canonicalize(value).map_err(|e| {
                        ExtractError::config(format!("cannot resolve source_path {}: {}", value, e))
                    })?;
                }
                "output_path" => {
                    config.output_path = absolute_or_raw(Path::new(value));
                }
                "data_format" => match value.parse() {
                    Ok(format) => config.data_format = format,
                    Err(_) => warn!("ignoring data_format={}, keeping {}", value, config.data_format),
                },
                other => warn!("ignoring unknown plugin argument {}={}", other, value),
            }
        }
        Ok(config)
    }

    /// The source root as an absolute, symlink-free path when it exists.
    pub fn source_root(&self) -> PathBuf {
        std::fs::canonicalize(&self.source_path).unwrap_or_else(|_| self.source_path.clone())
    }
}

fn absolute_or_raw(path: &Path) -> PathBuf {
    std::fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
