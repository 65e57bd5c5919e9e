//! GIMPLE Extractor Driver
//!
//! `gex extract` runs the extractor over a host snapshot and writes one
//! record per function; `gex dump` writes one function's record to stdout.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gex_common::{DataFormat, ExtractConfig};
use gex_extract::{encode_function, extract_snapshot};
use gex_ir::HostSnapshot;
use log::{info, LevelFilter};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gex")]
#[command(about = "GIMPLE Extractor")]
#[command(version = "0.1.0")]
struct Cli {
    /// Log every skipped function and written file
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the functions of a host snapshot
    Extract {
        /// Host snapshot (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Only functions whose source file lies under this directory
        #[arg(long)]
        source_path: Option<PathBuf>,

        /// Root directory of the emitted files
        #[arg(long)]
        output_path: Option<PathBuf>,

        /// json or msgpack
        #[arg(long)]
        data_format: Option<String>,

        /// Host-style `key=value` option, applied before the flags above
        #[arg(short = 'p', long = "plugin-arg", value_name = "KEY=VALUE")]
        plugin_args: Vec<String>,

        /// Extract only the named functions
        #[arg(short, long = "function")]
        functions: Vec<String>,
    },

    /// Encode one function of a host snapshot to stdout
    Dump {
        /// Host snapshot (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,

        #[arg(short, long)]
        function: String,

        /// Source root; every function is in scope by default
        #[arg(long, default_value = "/")]
        source_path: PathBuf,

        /// json or msgpack
        #[arg(long, default_value = "json")]
        data_format: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Extract {
            snapshot,
            source_path,
            output_path,
            data_format,
            plugin_args,
            functions,
        } => {
            let options = Options {
                source_path,
                output_path,
                data_format,
                plugin_args,
            };
            extract_command(&snapshot, options, &functions)
        }
        Commands::Dump {
            snapshot,
            function,
            source_path,
            data_format,
        } => dump_command(&snapshot, &function, source_path, &data_format),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

struct Options {
    source_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    data_format: Option<String>,
    plugin_args: Vec<String>,
}

impl Options {
    /// Plugin arguments first, then the dedicated flags, so flags win.
    fn to_plugin_args(&self) -> Result<Vec<(String, String)>> {
        let mut args = Vec::new();
        for arg in &self.plugin_args {
            args.push(split_plugin_arg(arg)?);
        }
        if let Some(path) = &self.source_path {
            args.push(("source_path".to_string(), path.display().to_string()));
        }
        if let Some(path) = &self.output_path {
            args.push(("output_path".to_string(), path.display().to_string()));
        }
        if let Some(format) = &self.data_format {
            args.push(("data_format".to_string(), format.clone()));
        }
        Ok(args)
    }
}

fn split_plugin_arg(arg: &str) -> Result<(String, String)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => bail!("plugin argument '{}' is not of the form key=value", arg),
    }
}

fn load_snapshot(path: &Path) -> Result<HostSnapshot> {
    HostSnapshot::load(path).with_context(|| format!("Failed to load snapshot {}", path.display()))
}

fn extract_command(snapshot_path: &Path, options: Options, functions: &[String]) -> Result<()> {
    let args = options.to_plugin_args()?;
    let config =
        ExtractConfig::from_plugin_args(args.as_slice()).context("Invalid extractor options")?;
    let snapshot = load_snapshot(snapshot_path)?;

    let written = extract_snapshot(&config, &snapshot, functions)?;
    for path in &written {
        info!("wrote {}", path.display());
    }
    println!(
        "{} function(s) written to {}",
        written.len(),
        config.output_path.display()
    );
    Ok(())
}

fn dump_command(
    snapshot_path: &Path,
    name: &str,
    source_path: PathBuf,
    data_format: &str,
) -> Result<()> {
    let format = data_format.parse::<DataFormat>()?;
    let config = ExtractConfig {
        source_path,
        data_format: format,
        ..ExtractConfig::default()
    };
    let snapshot = load_snapshot(snapshot_path)?;
    let func = snapshot
        .function(name)
        .with_context(|| format!("No function '{}' in {}", name, snapshot_path.display()))?;
    func.validate(&snapshot.trees)?;

    let Some(bytes) = encode_function(&config, &snapshot.trees, snapshot.target, func)? else {
        bail!("'{}' is outside {}", name, config.source_path.display());
    };
    let mut stdout = io::stdout().lock();
    stdout.write_all(&bytes)?;
    if format == DataFormat::Json {
        writeln!(stdout)?;
    }
    Ok(())
}
