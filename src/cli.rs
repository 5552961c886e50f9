//! CLI argument definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::schema::AnalysisMode;

/// Structural API break detector with downstream impact matching
#[derive(Parser, Debug)]
#[command(name = "apidrift")]
#[command(about = "Detects breaking public-API changes between two source tree versions")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output format
    #[arg(short, long, global = true, default_value = "json", value_enum)]
    pub format: OutputFormat,

    /// Show verbose diagnostics on stderr
    #[arg(short, long, global = true, env = "APIDRIFT_VERBOSE")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Diff the public API surface between two versions (files or trees)
    Diff {
        /// Before version: file or directory
        before: PathBuf,
        /// After version: file or directory
        after: PathBuf,
        /// Analysis fidelity
        #[arg(long, value_enum, default_value = "api-snapshot")]
        mode: ModeArg,
        /// Explicit type-check config file (default: tsconfig.json at each root)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Build an identity-keyed API snapshot for an entrypoint
    Snapshot {
        /// Entrypoint source file
        entrypoint: PathBuf,
        #[arg(long, value_enum, default_value = "api-snapshot")]
        mode: ModeArg,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Name-level export diff between two files (no type shapes)
    ExportsDiff {
        before: PathBuf,
        after: PathBuf,
    },
    /// Match candidate files against changed symbols of a module
    Usage {
        /// The changed module
        #[arg(long)]
        module: PathBuf,
        /// Changed symbol names; empty activates the wide heuristic mode
        #[arg(long, value_delimiter = ',')]
        symbols: Vec<String>,
        /// Project root for discovery and module path resolution
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Candidate files (default: discovered under the root)
        candidates: Vec<PathBuf>,
    },
}

/// Analysis fidelity flag
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModeArg {
    /// Full identity-keyed snapshot with resolved shapes
    ApiSnapshot,
    /// Name-level export tracking only
    ExportsOnly,
}

impl From<ModeArg> for AnalysisMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::ApiSnapshot => AnalysisMode::ApiSnapshot,
            ModeArg::ExportsOnly => AnalysisMode::ExportsOnly,
        }
    }
}

/// Output format options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON - stable, byte-comparable output
    #[default]
    Json,
    /// Plain text for terminal reading
    Text,
}
