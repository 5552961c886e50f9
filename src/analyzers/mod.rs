//! Language-specific symbol analyzers
//!
//! Analyzers are organized by capability, not by a deep hierarchy:
//!
//! - `typescript`: full type-shape extraction for TS/TSX (and for JS files
//!   the project explicitly opted in to checking)
//! - `javascript`: module-surface (export-only) analysis for untyped JS/JSX
//! - `python`, `ruby` over `heuristic`: line-oriented regex scanning with
//!   indentation-tracked nesting
//!
//! The capability asymmetry is intentional: heuristic analysis of
//! loosely-typed files is unsound, so only the typed analyzer offers
//! `build_snapshot`, and callers must check `supports_api_snapshot()`
//! rather than assume uniform behavior.

pub mod heuristic;
pub mod javascript;
pub mod python;
pub mod ruby;
pub mod typescript;

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::TypeCheckConfig;
use crate::error::Result;
use crate::lang::{Lang, LangFamily};
use crate::schema::{ChangedElements, SymbolShape, SymbolSnapshot};

use heuristic::LineSyntax;
use javascript::JsAnalyzer;
use typescript::TsAnalyzer;

/// Regex-based analyzer for one scripting language
pub struct HeuristicAnalyzer {
    lang: Lang,
    syntax: LineSyntax,
}

impl HeuristicAnalyzer {
    pub fn new(lang: Lang) -> Self {
        let syntax = match lang.family() {
            LangFamily::Ruby => ruby::syntax(),
            _ => python::syntax(),
        };
        Self { lang, syntax }
    }

    pub fn language(&self) -> Lang {
        self.lang
    }

    pub fn analyze(&self, path: &Path, content: &str) -> SymbolSnapshot {
        heuristic::scan(path, content, self.lang, &self.syntax)
    }

    pub fn find_changed_elements(
        &self,
        before: &str,
        after: &str,
        path: &Path,
    ) -> ChangedElements {
        let before_snap = self.analyze(path, before);
        let after_snap = self.analyze(path, after);
        changed_elements_between(&before_snap, &after_snap)
    }
}

/// Tagged per-language analyzer with a shared minimal contract
pub enum LangAnalyzer {
    /// Full type-shape extraction (TS/TSX, opted-in JS)
    Typed(TsAnalyzer),
    /// Export-only module surface (untyped JS/JSX)
    ModuleSurface(JsAnalyzer),
    /// Line-oriented regex scanning (Python, Ruby)
    Heuristic(HeuristicAnalyzer),
}

impl LangAnalyzer {
    pub fn language(&self) -> Lang {
        match self {
            Self::Typed(a) => a.language(),
            Self::ModuleSurface(a) => a.language(),
            Self::Heuristic(a) => a.language(),
        }
    }

    /// Whether this analyzer can build identity-keyed API snapshots with
    /// resolved shapes. Only the typed analyzer can; callers must check
    /// instead of assuming.
    pub fn supports_api_snapshot(&self) -> bool {
        matches!(self, Self::Typed(_))
    }

    /// Extract a symbol snapshot from one file
    pub fn analyze(&mut self, path: &Path, content: &str) -> Result<SymbolSnapshot> {
        match self {
            Self::Typed(a) => a.analyze(path, content),
            Self::ModuleSurface(a) => a.analyze(path, content),
            Self::Heuristic(a) => Ok(a.analyze(path, content)),
        }
    }

    /// Declaration-level change detection between two file versions
    pub fn find_changed_elements(
        &mut self,
        before: &str,
        after: &str,
        path: &Path,
    ) -> Result<ChangedElements> {
        match self {
            Self::Typed(a) => a.find_changed_elements(before, after, path),
            Self::ModuleSurface(a) => a.find_changed_elements(before, after, path),
            Self::Heuristic(a) => Ok(a.find_changed_elements(before, after, path)),
        }
    }

    /// Whether `path` exercises `symbol` (delegates to the usage matcher)
    pub fn file_uses_symbol(&self, path: &Path, symbol: &str, root: &Path) -> bool {
        crate::usage::file_uses_symbol(path, symbol, root)
    }

    /// Files under `root` referencing `symbol` declared in `declaring_file`
    pub fn find_references(
        &self,
        symbol: &str,
        declaring_file: &Path,
        root: &Path,
    ) -> Vec<PathBuf> {
        crate::usage::find_references(symbol, declaring_file, root)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct AnalyzerKey {
    lang: Lang,
    typed: bool,
}

/// Per-extension analyzer cache owned by the orchestrator.
///
/// Analyzer instances hold reusable tree-sitter parsers, so they are worth
/// caching across files. The cache is tied to one project root; switching
/// roots clears it (the JS typed/untyped decision depends on that root's
/// config).
pub struct AnalyzerCache {
    root: PathBuf,
    analyzers: HashMap<AnalyzerKey, LangAnalyzer>,
}

impl AnalyzerCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            analyzers: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Point the cache at a different project root, invalidating all
    /// cached analyzer instances
    pub fn set_root(&mut self, root: impl Into<PathBuf>) {
        let root = root.into();
        if root != self.root {
            tracing::debug!(new_root = %root.display(), "analyzer cache invalidated");
            self.root = root;
            self.clear();
        }
    }

    pub fn clear(&mut self) {
        self.analyzers.clear();
    }

    /// Get or build the analyzer for a file.
    ///
    /// A JS/JSX file is analyzed by the typed analyzer only when the
    /// project config opts in to checking untyped files AND the config
    /// applies to this specific file - both independently verified.
    pub fn analyzer_for(
        &mut self,
        path: &Path,
        config: Option<&TypeCheckConfig>,
    ) -> Result<&mut LangAnalyzer> {
        let lang = Lang::from_path(path)?;
        let typed = match lang.family() {
            LangFamily::TypeScript => true,
            LangFamily::JavaScript => {
                config.is_some_and(|c| c.check_js() && c.applies_to(path))
            }
            LangFamily::Python | LangFamily::Ruby => false,
        };

        let key = AnalyzerKey { lang, typed };
        match self.analyzers.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let analyzer = build_analyzer(lang, typed)?;
                Ok(entry.insert(analyzer))
            }
        }
    }
}

fn build_analyzer(lang: Lang, typed: bool) -> Result<LangAnalyzer> {
    if typed {
        return Ok(LangAnalyzer::Typed(TsAnalyzer::new(lang)?));
    }
    Ok(match lang.family() {
        LangFamily::TypeScript => LangAnalyzer::Typed(TsAnalyzer::new(lang)?),
        LangFamily::JavaScript => LangAnalyzer::ModuleSurface(JsAnalyzer::new(lang)?),
        LangFamily::Python | LangFamily::Ruby => {
            LangAnalyzer::Heuristic(HeuristicAnalyzer::new(lang))
        }
    })
}

/// Shared declaration-level diff used by every analyzer's
/// `find_changed_elements`.
///
/// Functions compare by rendered signature (parameter list plus return
/// type); classes by member count and per-method signature. Disappearance
/// counts as change.
pub(crate) fn changed_elements_between(
    before: &SymbolSnapshot,
    after: &SymbolSnapshot,
) -> ChangedElements {
    let mut changed = ChangedElements::default();

    for func in &before.functions {
        match after.functions.iter().find(|f| f.name == func.name) {
            None => changed.changed_functions.push(func.name.clone()),
            Some(other) => {
                if func.shape.render() != other.shape.render() {
                    changed.changed_functions.push(func.name.clone());
                }
            }
        }
    }

    for class in &before.classes {
        let Some(other) = after.classes.iter().find(|c| c.name == class.name) else {
            changed.changed_classes.push(class.name.clone());
            continue;
        };
        let (SymbolShape::Class { members: bm }, SymbolShape::Class { members: am }) =
            (&class.shape, &other.shape)
        else {
            continue;
        };
        if bm.len() != am.len() {
            changed.changed_classes.push(class.name.clone());
            continue;
        }
        let method_changed = bm.iter().any(|m| {
            am.iter()
                .find(|o| o.name == m.name)
                .map_or(true, |o| o.signature != m.signature)
        });
        if method_changed {
            changed.changed_classes.push(class.name.clone());
        }
    }

    changed.changed_functions.sort();
    changed.changed_classes.sort();
    changed
}
