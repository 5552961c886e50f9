//! apidrift: structural API break detection with downstream impact matching
//!
//! Given two versions of a source tree, apidrift extracts a language-aware
//! model of each file's declared symbols and exports, diffs the two models,
//! classifies every change against a breaking-change rule catalog, and
//! determines which downstream files exercise the changed symbols.
//!
//! # Supported Languages
//!
//! - TypeScript, TSX - full type-shape extraction
//! - JavaScript, JSX - module-surface analysis (typed when the project
//!   opts in via `checkJs`)
//! - Python, Ruby - heuristic line scanning
//!
//! # Example
//!
//! ```ignore
//! use apidrift::analyzers::AnalyzerCache;
//! use apidrift::schema::AnalysisMode;
//! use apidrift::snapshot::build_api_snapshot;
//! use apidrift::{compute_api_diff, api_diff_to_findings};
//! use std::path::Path;
//!
//! let mut cache = AnalyzerCache::new("/repo");
//! let before = build_api_snapshot(Path::new("/repo/before/api.ts"), &mut cache, None, AnalysisMode::ApiSnapshot)?;
//! let after = build_api_snapshot(Path::new("/repo/after/api.ts"), &mut cache, None, AnalysisMode::ApiSnapshot)?;
//! let diff = compute_api_diff(&before.unwrap(), &after.unwrap());
//! for finding in api_diff_to_findings(&diff) {
//!     println!("{}: {}", finding.rule, finding.message);
//! }
//! ```

pub mod analyzers;
pub mod cli;
pub mod commands;
pub mod config;
pub mod diff;
pub mod error;
pub mod files;
pub mod lang;
pub mod report;
pub mod rules;
pub mod schema;
pub mod snapshot;
pub mod usage;
pub mod utils;

// Re-export commonly used types
pub use cli::{Cli, OutputFormat};
pub use config::TypeCheckConfig;
pub use diff::{
    compute_api_diff, compute_exports_diff, ApiDiff, ExportsDiff, RenameTolerance, ShapeDelta,
};
pub use error::{ApiDriftError, Result};
pub use lang::{Lang, LangFamily};
pub use report::{AnalysisResult, UsageReport};
pub use rules::{api_diff_to_findings, exports_diff_to_findings};
pub use schema::{
    AnalysisMode, ApiSnapshot, ExportKind, ExportRecord, Finding, MatchConfidence, Severity,
    Symbol, SymbolId, SymbolKind, SymbolShape, SymbolSnapshot, UsageMatch,
};
pub use snapshot::build_api_snapshot;
pub use usage::{file_uses_symbol, find_references, match_files};
