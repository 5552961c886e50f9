//! Command handlers wiring the analysis pipeline to the CLI
//!
//! Each handler returns the final stdout payload as a string; all
//! diagnostics go through tracing to stderr. Per-file problems are logged
//! and skipped so one bad file never aborts a tree diff.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::analyzers::AnalyzerCache;
use crate::cli::OutputFormat;
use crate::config::TypeCheckConfig;
use crate::diff::{compute_api_diff, compute_exports_diff};
use crate::error::{ApiDriftError, Result};
use crate::files::collect_source_files;
use crate::lang::Lang;
use crate::report::{AnalysisResult, UsageReport};
use crate::rules::{api_diff_to_findings, exports_diff_to_findings};
use crate::schema::{
    AnalysisMode, ApiSnapshot, Finding, ResolvedExport, SymbolSnapshot,
};
use crate::snapshot::build_api_snapshot;
use crate::usage;

/// Diff the public API surface between two versions
pub fn run_diff(
    before: &Path,
    after: &Path,
    mode: AnalysisMode,
    config_path: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    for path in [before, after] {
        if !path.exists() {
            return Err(ApiDriftError::FileNotFound {
                path: path.display().to_string(),
            });
        }
    }

    let findings = if before.is_dir() && after.is_dir() {
        diff_trees(before, after, mode, config_path)?
    } else if before.is_file() && after.is_file() {
        diff_files(before, after, mode, config_path)?
    } else {
        return Err(ApiDriftError::FileNotFound {
            path: "before and after must both be files or both be directories".to_string(),
        });
    };

    let result = AnalysisResult::from_findings(findings);
    render_json_or(format, &result, || result.render_text())
}

/// Build and serialize an API snapshot for one entrypoint
pub fn run_snapshot(
    entrypoint: &Path,
    mode: AnalysisMode,
    config_path: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    let root = parent_dir(entrypoint);
    let config = load_config(&root, config_path)?;
    let mut cache = AnalyzerCache::new(&root);

    let snapshot = build_api_snapshot(entrypoint, &mut cache, config.as_ref(), mode)?
        .ok_or_else(|| ApiDriftError::FileNotFound {
            path: entrypoint.display().to_string(),
        })?;

    render_json_or(format, &snapshot, || {
        let mut out = format!(
            "{} ({} exports{})\n",
            snapshot.entrypoint,
            snapshot.exports.len(),
            if snapshot.partial { ", partial" } else { "" }
        );
        for export in snapshot.exports.values() {
            out.push_str(&format!(
                "  {} [{}] {}\n",
                export.id.name,
                export.kind.label(),
                export.shape.render()
            ));
        }
        out
    })
}

/// Name-level export diff between two files
pub fn run_exports_diff(before: &Path, after: &Path, format: OutputFormat) -> Result<String> {
    for path in [before, after] {
        if !path.is_file() {
            return Err(ApiDriftError::FileNotFound {
                path: path.display().to_string(),
            });
        }
    }

    let label = file_label(after);
    let mut cache_before = AnalyzerCache::new(parent_dir(before));
    let mut cache_after = AnalyzerCache::new(parent_dir(after));
    let before_snap = analyze_file_or_empty(&mut cache_before, None, before, &label);
    let after_snap = analyze_file_or_empty(&mut cache_after, None, after, &label);

    let diff = compute_exports_diff(&before_snap, &after_snap);
    render_json_or(format, &diff, || {
        let mut out = String::new();
        for name in &diff.removed {
            out.push_str(&format!("- {}\n", name));
        }
        for name in &diff.added {
            out.push_str(&format!("+ {}\n", name));
        }
        for change in &diff.changed {
            out.push_str(&format!(
                "~ {} ({} -> {})\n",
                change.symbol,
                change.before_kind.label(),
                change.after_kind.label()
            ));
        }
        if out.is_empty() {
            out.push_str("No export changes.\n");
        }
        out
    })
}

/// Match candidate files against changed symbols of a module
pub fn run_usage(
    module: &Path,
    symbols: &[String],
    root: &Path,
    candidates: &[PathBuf],
    format: OutputFormat,
) -> Result<String> {
    if !module.is_file() {
        return Err(ApiDriftError::FileNotFound {
            path: module.display().to_string(),
        });
    }

    let discovered;
    let candidates = if candidates.is_empty() {
        discovered = collect_source_files(root);
        &discovered
    } else {
        candidates
    };

    let matches = usage::match_files(symbols, candidates, module, root);
    let report = UsageReport::from_matches(matches);
    render_json_or(format, &report, || report.render_text())
}

// ============================================================================
// Diff plumbing
// ============================================================================

fn diff_files(
    before: &Path,
    after: &Path,
    mode: AnalysisMode,
    config_path: Option<&Path>,
) -> Result<Vec<Finding>> {
    let before_root = parent_dir(before);
    let after_root = parent_dir(after);
    let config_before = load_config(&before_root, config_path)?;
    let config_after = load_config(&after_root, config_path)?;
    let mut cache_before = AnalyzerCache::new(&before_root);
    let mut cache_after = AnalyzerCache::new(&after_root);

    // Both versions represent the same module: label them identically so
    // identities line up
    let label = file_label(after);
    pair_findings(
        before,
        after,
        &label,
        &before_root,
        &after_root,
        mode,
        &mut cache_before,
        config_before.as_ref(),
        &mut cache_after,
        config_after.as_ref(),
    )
}

fn diff_trees(
    before_root: &Path,
    after_root: &Path,
    mode: AnalysisMode,
    config_path: Option<&Path>,
) -> Result<Vec<Finding>> {
    let config_before = load_config(before_root, config_path)?;
    let config_after = load_config(after_root, config_path)?;
    let mut cache_before = AnalyzerCache::new(before_root);
    let mut cache_after = AnalyzerCache::new(after_root);

    let before_files = files_by_relative_path(before_root);
    let after_files = files_by_relative_path(after_root);
    let all_paths: BTreeSet<&PathBuf> =
        before_files.keys().chain(after_files.keys()).collect();

    let mut findings = Vec::new();
    for relative in all_paths {
        let label = relative.display().to_string();
        let before_abs = before_root.join(relative);
        let after_abs = after_root.join(relative);
        match pair_findings(
            &before_abs,
            &after_abs,
            &label,
            before_root,
            after_root,
            mode,
            &mut cache_before,
            config_before.as_ref(),
            &mut cache_after,
            config_after.as_ref(),
        ) {
            Ok(mut file_findings) => findings.append(&mut file_findings),
            Err(e) => {
                tracing::warn!(file = %label, error = %e, "skipping file pair");
            }
        }
    }
    Ok(findings)
}

#[allow(clippy::too_many_arguments)]
fn pair_findings(
    before_abs: &Path,
    after_abs: &Path,
    label: &str,
    before_root: &Path,
    after_root: &Path,
    mode: AnalysisMode,
    cache_before: &mut AnalyzerCache,
    config_before: Option<&TypeCheckConfig>,
    cache_after: &mut AnalyzerCache,
    config_after: Option<&TypeCheckConfig>,
) -> Result<Vec<Finding>> {
    // Capability check: full shape diffing only where the typed analyzer
    // applies; everything else goes through the export-level fallback
    let typed = mode == AnalysisMode::ApiSnapshot
        && cache_after
            .analyzer_for(after_abs, config_after)
            .map(|a| a.supports_api_snapshot())
            .unwrap_or_else(|_| {
                cache_before
                    .analyzer_for(before_abs, config_before)
                    .map(|a| a.supports_api_snapshot())
                    .unwrap_or(false)
            });

    if typed {
        let before_api = build_api_snapshot(before_abs, cache_before, config_before, mode)?;
        let after_api = build_api_snapshot(after_abs, cache_after, config_after, mode)?;
        let before_api = relabel_api(before_api, before_abs, before_root, label, mode);
        let after_api = relabel_api(after_api, after_abs, after_root, label, mode);
        let diff = compute_api_diff(&before_api, &after_api);
        Ok(api_diff_to_findings(&diff))
    } else {
        let before_snap =
            analyze_file_or_empty(cache_before, config_before, before_abs, label);
        let after_snap = analyze_file_or_empty(cache_after, config_after, after_abs, label);
        let diff = compute_exports_diff(&before_snap, &after_snap);
        Ok(exports_diff_to_findings(&diff, &before_snap, &after_snap))
    }
}

/// Normalize identity file paths so the two sides of a diff line up:
/// the entrypoint becomes `label`, other declaring files become
/// root-relative
fn relabel_api(
    api: Option<ApiSnapshot>,
    entry_abs: &Path,
    root: &Path,
    label: &str,
    mode: AnalysisMode,
) -> ApiSnapshot {
    let Some(api) = api else {
        return ApiSnapshot::new(label, mode);
    };
    let entry_str = entry_abs.display().to_string();

    let mut relabeled = ApiSnapshot::new(label, api.analysis_mode);
    relabeled.partial = api.partial;
    relabeled.failed_shapes = api.failed_shapes;
    relabeled.failed_shape_names = api.failed_shape_names.clone();
    relabeled.module_system = api.module_system;

    for export in api.exports.into_values() {
        let mut id = export.id;
        id.file = if id.file == entry_str {
            label.to_string()
        } else {
            Path::new(&id.file)
                .strip_prefix(root)
                .map(|p| p.display().to_string())
                .unwrap_or(id.file)
        };
        let resolved = ResolvedExport {
            id: id.clone(),
            kind: export.kind,
            shape: export.shape,
        };
        relabeled.exports.entry(id.to_string()).or_insert(resolved);
    }
    relabeled
}

/// Analyze one file into a snapshot labeled with the diff-stable path;
/// missing or unreadable files yield an empty snapshot (batch continues)
fn analyze_file_or_empty(
    cache: &mut AnalyzerCache,
    config: Option<&TypeCheckConfig>,
    path: &Path,
    label: &str,
) -> SymbolSnapshot {
    let language = Lang::from_path(path)
        .map(|l| l.name().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    if !path.is_file() {
        return SymbolSnapshot::new(label, language);
    }
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "skipping unreadable file");
            return SymbolSnapshot::new(label, language);
        }
    };
    match cache
        .analyzer_for(path, config)
        .and_then(|a| a.analyze(Path::new(label), &content))
    {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "analysis failed, treating as empty");
            SymbolSnapshot::new(label, language)
        }
    }
}

fn files_by_relative_path(root: &Path) -> std::collections::BTreeMap<PathBuf, PathBuf> {
    collect_source_files(root)
        .into_iter()
        .filter_map(|abs| {
            abs.strip_prefix(root)
                .map(|rel| (rel.to_path_buf(), abs.clone()))
                .ok()
        })
        .collect()
}

fn load_config(root: &Path, explicit: Option<&Path>) -> Result<Option<TypeCheckConfig>> {
    match explicit {
        Some(path) => Ok(Some(TypeCheckConfig::load_from(root, path)?)),
        None => Ok(TypeCheckConfig::load(root)),
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn render_json_or<T: serde::Serialize>(
    format: OutputFormat,
    value: &T,
    text: impl FnOnce() -> String,
) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Text => Ok(text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_diff_files_breaking_param() {
        let dir = tempfile::tempdir().unwrap();
        let before = write(
            dir.path(),
            "before.ts",
            "export function add(a: number, b: number): number { return a + b; }\n",
        );
        let after = write(
            dir.path(),
            "after.ts",
            "export function add(a: number, b: number, c: number): number { return a + b + c; }\n",
        );

        let out = run_diff(
            &before,
            &after,
            AnalysisMode::ApiSnapshot,
            None,
            OutputFormat::Json,
        )
        .unwrap();
        let result: AnalysisResult = serde_json::from_str(&out).unwrap();
        assert_eq!(result.rule_ids, vec!["FN_PARAM_REQUIRED"]);
        assert_eq!(result.symbol_names, vec!["add"]);
        assert_eq!(result.severities, vec!["breaking"]);
    }

    #[test]
    fn test_diff_missing_input_errors() {
        let dir = tempfile::tempdir().unwrap();
        let exists = write(dir.path(), "a.ts", "export const x = 1;\n");
        let err = run_diff(
            &exists,
            &dir.path().join("missing.ts"),
            AnalysisMode::ApiSnapshot,
            None,
            OutputFormat::Json,
        )
        .unwrap_err();
        assert!(matches!(err, ApiDriftError::FileNotFound { .. }));
    }

    #[test]
    fn test_diff_trees_detects_removed_file() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "before/src/api.ts",
            "export function gone(): void {}\n",
        );
        fs::create_dir_all(dir.path().join("after/src")).unwrap();
        write(dir.path(), "after/src/other.ts", "export const kept = 1;\n");

        let out = run_diff(
            &dir.path().join("before"),
            &dir.path().join("after"),
            AnalysisMode::ApiSnapshot,
            None,
            OutputFormat::Json,
        )
        .unwrap();
        let result: AnalysisResult = serde_json::from_str(&out).unwrap();
        assert!(result.rule_ids.contains(&"FN_REMOVED".to_string()));
        assert!(result.rule_ids.contains(&"SYMBOL_ADDED".to_string()));
    }

    #[test]
    fn test_untyped_js_goes_heuristic() {
        let dir = tempfile::tempdir().unwrap();
        let before = write(
            dir.path(),
            "before.js",
            "export function foo() {}\nexport function bar() {}\n",
        );
        let after = write(dir.path(), "after.js", "export function bar() {}\n");

        let out = run_diff(
            &before,
            &after,
            AnalysisMode::ApiSnapshot,
            None,
            OutputFormat::Json,
        )
        .unwrap();
        let result: AnalysisResult = serde_json::from_str(&out).unwrap();
        assert_eq!(result.rule_ids, vec!["JSAPI_FN_REMOVED"]);
        assert_eq!(result.severities, vec!["warning"]);
        assert!(result.findings[0].message.contains("JavaScript heuristic"));
    }

    #[test]
    fn test_checkjs_promotes_js_to_typed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("tsconfig.json"),
            "{ \"compilerOptions\": { \"checkJs\": true } }",
        )
        .unwrap();
        let before = write(dir.path(), "before.js", "export function f(a) {}\n");
        let after = write(dir.path(), "after.js", "export function f(a, b) {}\n");

        let out = run_diff(
            &before,
            &after,
            AnalysisMode::ApiSnapshot,
            None,
            OutputFormat::Json,
        )
        .unwrap();
        let result: AnalysisResult = serde_json::from_str(&out).unwrap();
        // Typed rule set, not the JSAPI_ heuristic prefix
        assert_eq!(result.rule_ids, vec!["FN_PARAM_REQUIRED"]);
    }

    #[test]
    fn test_exports_diff_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let before = write(
            dir.path(),
            "before.js",
            "function foo() {}\nfunction bar() {}\nexport { foo, bar };\n",
        );
        let after = write(
            dir.path(),
            "after.js",
            "function bar() {}\nexport { bar };\n",
        );

        let out = run_exports_diff(&before, &after, OutputFormat::Json).unwrap();
        let diff: crate::diff::ExportsDiff = serde_json::from_str(&out).unwrap();
        assert_eq!(diff.removed, vec!["foo"]);
        assert!(diff.added.is_empty());
    }

    #[test]
    fn test_snapshot_missing_entrypoint() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_snapshot(
            &dir.path().join("nope.ts"),
            AnalysisMode::ApiSnapshot,
            None,
            OutputFormat::Json,
        )
        .unwrap_err();
        assert!(matches!(err, ApiDriftError::FileNotFound { .. }));
    }

    #[test]
    fn test_usage_command_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let module = write(
            dir.path(),
            "src/math.ts",
            "export function add(a: number, b: number): number { return a + b; }\n",
        );
        write(
            dir.path(),
            "tests/math.test.ts",
            "import { add } from \"../src/math\";\nadd(1, 2);\n",
        );
        write(
            dir.path(),
            "tests/unrelated.test.ts",
            "const add = (a: number) => a;\nadd(1);\n",
        );

        let out = run_usage(
            &module,
            &["add".to_string()],
            dir.path(),
            &[],
            OutputFormat::Json,
        )
        .unwrap();
        let report: UsageReport = serde_json::from_str(&out).unwrap();
        assert_eq!(report.impacted_files.len(), 1);
        assert!(report.impacted_files[0].ends_with("math.test.ts"));
    }
}
