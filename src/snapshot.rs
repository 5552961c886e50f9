//! Entrypoint API snapshot builder
//!
//! Resolves every export of an entrypoint to its declaring symbol, walking
//! re-export chains across files. Barrel files can form cycles in
//! malformed packages, so each resolution chain carries an explicit
//! visited set of (file, symbol) pairs instead of relying on unguarded
//! recursion. Per-file failures (unreadable, unparseable, unresolvable)
//! put the snapshot in partial mode; only a nonexistent entrypoint yields
//! the `None` sentinel.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::analyzers::AnalyzerCache;
use crate::config::TypeCheckConfig;
use crate::error::Result;
use crate::schema::{
    AnalysisMode, ApiSnapshot, ExportKind, ResolvedExport, Symbol, SymbolId, SymbolKind,
    SymbolShape,
};

/// Extensions tried when resolving an extensionless module specifier
const RESOLVE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

/// Build an identity-keyed API snapshot for an entrypoint.
///
/// Returns `Ok(None)` only when the entrypoint file does not exist.
pub fn build_api_snapshot(
    entrypoint: &Path,
    cache: &mut AnalyzerCache,
    config: Option<&TypeCheckConfig>,
    mode: AnalysisMode,
) -> Result<Option<ApiSnapshot>> {
    if !entrypoint.is_file() {
        return Ok(None);
    }
    let content = match fs::read_to_string(entrypoint) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(file = %entrypoint.display(), error = %e, "entrypoint unreadable");
            return Ok(None);
        }
    };

    let analyzer = cache.analyzer_for(entrypoint, config)?;
    let resolve_across_files =
        analyzer.supports_api_snapshot() && mode == AnalysisMode::ApiSnapshot;
    let local = analyzer.analyze(entrypoint, &content)?;

    let mut api = ApiSnapshot::new(entrypoint.display().to_string(), mode);
    api.module_system = local.module_system;

    for record in &local.exports {
        match record.kind {
            ExportKind::Named | ExportKind::Default | ExportKind::ReExport => {
                let target = record.local_name.as_deref().unwrap_or(&record.name);
                let symbol = if let Some(spec) = &record.source {
                    if resolve_across_files {
                        resolve_through_module(entrypoint, spec, target, cache, config)
                    } else {
                        None
                    }
                } else {
                    local.find_symbol(target).cloned()
                };

                match symbol {
                    Some(sym) => insert_export(&mut api, &record.name, record.kind, &sym),
                    None if record.source.is_some() && !resolve_across_files => {
                        // Exports-only fidelity: keep the name without a shape
                        let id = SymbolId {
                            name: record.name.clone(),
                            export_kind: record.kind,
                            file: api.entrypoint.clone(),
                            line: 0,
                        };
                        api.exports.entry(id.to_string()).or_insert(ResolvedExport {
                            id,
                            kind: SymbolKind::Variable,
                            shape: SymbolShape::Opaque,
                        });
                    }
                    None => api.record_failure(&record.name),
                }
            }
            ExportKind::Namespace if record.name == "*" => {
                // export * from "./mod": pull the source module's named
                // exports through (default is not re-exported)
                let Some(spec) = &record.source else {
                    continue;
                };
                if !resolve_across_files {
                    continue;
                }
                let Some(module_file) = resolve_module_file(entrypoint, spec) else {
                    api.record_failure(spec);
                    continue;
                };
                for name in star_export_names(&module_file, cache, config) {
                    match resolve_symbol(&module_file, &name, cache, config) {
                        Some(sym) => insert_export(&mut api, &name, ExportKind::ReExport, &sym),
                        None => api.record_failure(&name),
                    }
                }
            }
            ExportKind::Namespace => {
                // export * as ns from "./mod": one namespace-shaped export
                let file = record
                    .source
                    .as_deref()
                    .and_then(|spec| resolve_module_file(entrypoint, spec))
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| api.entrypoint.clone());
                let id = SymbolId {
                    name: record.name.clone(),
                    export_kind: ExportKind::Namespace,
                    file,
                    line: 0,
                };
                api.exports.entry(id.to_string()).or_insert(ResolvedExport {
                    id,
                    kind: SymbolKind::Variable,
                    shape: SymbolShape::Opaque,
                });
            }
        }
    }

    // Exported declarations without a matching record (heuristic analyzers
    // emit records for everything; the typed analyzer records them at
    // extraction time, so this is a safety net for direct declarations)
    let recorded: HashSet<String> = local
        .exports
        .iter()
        .filter_map(|r| r.local_name.clone().or_else(|| Some(r.name.clone())))
        .collect();
    for sym in local.all_symbols().filter(|s| s.is_exported) {
        if !recorded.contains(&sym.name) {
            insert_export(&mut api, &sym.name, ExportKind::Named, sym);
        }
    }

    Ok(Some(api))
}

fn insert_export(api: &mut ApiSnapshot, exported_name: &str, kind: ExportKind, sym: &Symbol) {
    let id = SymbolId {
        name: exported_name.to_string(),
        export_kind: kind,
        file: sym.file.clone(),
        line: sym.line,
    };
    api.exports.entry(id.to_string()).or_insert(ResolvedExport {
        id,
        kind: sym.kind,
        shape: sym.shape.clone(),
    });
}

/// Resolve `spec` from `from_file`, then resolve `name` inside it
fn resolve_through_module(
    from_file: &Path,
    spec: &str,
    name: &str,
    cache: &mut AnalyzerCache,
    config: Option<&TypeCheckConfig>,
) -> Option<Symbol> {
    let module_file = resolve_module_file(from_file, spec)?;
    resolve_symbol(&module_file, name, cache, config)
}

/// Resolve a symbol to its declaration, following re-export chains with a
/// fresh per-chain visited set
fn resolve_symbol(
    file: &Path,
    name: &str,
    cache: &mut AnalyzerCache,
    config: Option<&TypeCheckConfig>,
) -> Option<Symbol> {
    let mut visited = HashSet::new();
    resolve_symbol_guarded(file, name, cache, config, &mut visited)
}

fn resolve_symbol_guarded(
    file: &Path,
    name: &str,
    cache: &mut AnalyzerCache,
    config: Option<&TypeCheckConfig>,
    visited: &mut HashSet<(PathBuf, String)>,
) -> Option<Symbol> {
    if !visited.insert((file.to_path_buf(), name.to_string())) {
        tracing::warn!(
            file = %file.display(),
            symbol = name,
            "re-export cycle detected, stopping resolution"
        );
        return None;
    }

    let content = match fs::read_to_string(file) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(file = %file.display(), error = %e, "module unreadable during resolution");
            return None;
        }
    };
    let snapshot = match cache.analyzer_for(file, config).and_then(|a| a.analyze(file, &content)) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(file = %file.display(), error = %e, "module analysis failed during resolution");
            return None;
        }
    };

    if let Some(sym) = snapshot.find_symbol(name) {
        return Some(sym.clone());
    }

    // Follow explicit re-export records for this name
    for record in snapshot.exports.iter().filter(|r| r.name == name) {
        if let Some(spec) = &record.source {
            let target = record.local_name.as_deref().unwrap_or(name);
            if let Some(next) = resolve_module_file(file, spec) {
                if let Some(sym) =
                    resolve_symbol_guarded(&next, target, cache, config, visited)
                {
                    return Some(sym);
                }
            }
        } else if let Some(local) = &record.local_name {
            if let Some(sym) = snapshot.find_symbol(local) {
                return Some(sym.clone());
            }
        }
    }

    // Then star re-exports
    for record in snapshot
        .exports
        .iter()
        .filter(|r| r.kind == ExportKind::Namespace && r.name == "*")
    {
        if let Some(spec) = &record.source {
            if let Some(next) = resolve_module_file(file, spec) {
                if let Some(sym) =
                    resolve_symbol_guarded(&next, name, cache, config, visited)
                {
                    return Some(sym);
                }
            }
        }
    }

    None
}

/// Named exports a `export *` pulls through (default excluded)
fn star_export_names(
    file: &Path,
    cache: &mut AnalyzerCache,
    config: Option<&TypeCheckConfig>,
) -> Vec<String> {
    let Ok(content) = fs::read_to_string(file) else {
        return Vec::new();
    };
    let Ok(snapshot) = cache
        .analyzer_for(file, config)
        .and_then(|a| a.analyze(file, &content))
    else {
        return Vec::new();
    };
    // Export records carry the visible export names; a default-exported
    // declaration's local name must not leak through `export *`
    let mut names: Vec<String> = snapshot
        .exports
        .iter()
        .filter(|r| r.kind != ExportKind::Default)
        .map(|r| r.name.clone())
        .filter(|n| n != "default" && n != "*")
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Resolve a relative module specifier to a file on disk, trying the
/// usual extension and index candidates
fn resolve_module_file(from_file: &Path, spec: &str) -> Option<PathBuf> {
    if !spec.starts_with('.') {
        return None;
    }
    let base = from_file.parent()?.join(spec);

    if base.is_file() {
        return Some(base);
    }
    for ext in RESOLVE_EXTENSIONS {
        let candidate = PathBuf::from(format!("{}.{}", base.display(), ext));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    for ext in RESOLVE_EXTENSIONS {
        let candidate = base.join(format!("index.{}", ext));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}
