//! Shared data model for snapshots, findings, and usage matches
//!
//! Every analyzer produces a `SymbolSnapshot`; entrypoint analysis resolves
//! exports into an `ApiSnapshot` keyed by symbol identity. Snapshots are
//! rebuilt from scratch on every analysis call and never mutated after they
//! are returned.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed set of symbol kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Class,
    Interface,
    TypeAlias,
    Enum,
    Variable,
}

impl SymbolKind {
    /// Human-readable label used in finding messages
    pub fn label(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::TypeAlias => "type alias",
            Self::Enum => "enum",
            Self::Variable => "variable",
        }
    }
}

/// How a symbol leaves its module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportKind {
    Named,
    Default,
    Namespace,
    ReExport,
}

impl ExportKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Named => "named",
            Self::Default => "default",
            Self::Namespace => "namespace",
            Self::ReExport => "re-export",
        }
    }
}

/// One function/method parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    /// Annotated type, absent for untyped sources
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    /// Marked optional (`?`) or carrying a default value
    #[serde(default)]
    pub optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl Param {
    /// A caller may omit this argument
    pub fn is_omittable(&self) -> bool {
        self.optional || self.default_value.is_some()
    }
}

/// Class member kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Method,
    Property,
    Getter,
    Setter,
}

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

/// One class member (method or property)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMember {
    pub name: String,
    pub kind: MemberKind,
    pub visibility: Visibility,
    /// Rendered signature for methods, annotated type for properties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// One interface or object-type property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(default)]
    pub optional: bool,
}

/// Kind-specific structural shape of a symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum SymbolShape {
    Function {
        params: Vec<Param>,
        #[serde(skip_serializing_if = "Option::is_none")]
        return_type: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        type_params: Vec<String>,
        /// Additional declared signatures for overloaded functions
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        overloads: Vec<String>,
    },
    Class {
        members: Vec<ClassMember>,
    },
    Interface {
        properties: Vec<Property>,
    },
    TypeAlias {
        /// Populated when the alias resolves to an object type
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        properties: Vec<Property>,
        #[serde(skip_serializing_if = "Option::is_none")]
        aliased: Option<String>,
    },
    Enum {
        members: Vec<String>,
    },
    Variable {
        #[serde(skip_serializing_if = "Option::is_none")]
        ty: Option<String>,
    },
    /// Shape could not be determined (heuristic analyzers, resolution failure)
    Opaque,
}

impl SymbolShape {
    /// Render a compact one-line shape string for messages and reports
    pub fn render(&self) -> String {
        match self {
            Self::Function {
                params,
                return_type,
                type_params,
                ..
            } => {
                let tp = if type_params.is_empty() {
                    String::new()
                } else {
                    format!("<{}>", type_params.join(", "))
                };
                let ps: Vec<String> = params
                    .iter()
                    .map(|p| {
                        let mut s = p.name.clone();
                        if p.optional {
                            s.push('?');
                        }
                        if let Some(ty) = &p.ty {
                            s.push_str(": ");
                            s.push_str(ty);
                        }
                        if let Some(d) = &p.default_value {
                            s.push_str(" = ");
                            s.push_str(d);
                        }
                        s
                    })
                    .collect();
                let ret = return_type
                    .as_deref()
                    .map(|r| format!(" => {}", r))
                    .unwrap_or_default();
                format!("{}({}){}", tp, ps.join(", "), ret)
            }
            Self::Class { members } => {
                let ms: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
                format!("class {{ {} }}", ms.join(", "))
            }
            Self::Interface { properties } => {
                let ps: Vec<String> = properties
                    .iter()
                    .map(|p| {
                        format!(
                            "{}{}{}",
                            p.name,
                            if p.optional { "?" } else { "" },
                            p.ty.as_deref()
                                .map(|t| format!(": {}", t))
                                .unwrap_or_default()
                        )
                    })
                    .collect();
                format!("{{ {} }}", ps.join("; "))
            }
            Self::TypeAlias {
                properties,
                aliased,
            } => {
                if !properties.is_empty() {
                    Self::Interface {
                        properties: properties.clone(),
                    }
                    .render()
                } else {
                    aliased.clone().unwrap_or_else(|| "type".to_string())
                }
            }
            Self::Enum { members } => format!("enum {{ {} }}", members.join(", ")),
            Self::Variable { ty } => ty.clone().unwrap_or_else(|| "_".to_string()),
            Self::Opaque => "<unresolved>".to_string(),
        }
    }
}

/// One declared symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    /// Declaring file
    pub file: String,
    /// 1-based declaration line
    pub line: usize,
    /// 0-based declaration column
    pub column: usize,
    pub kind: SymbolKind,
    pub is_exported: bool,
    pub shape: SymbolShape,
}

/// One export of a module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Name visible to importers
    pub name: String,
    pub kind: ExportKind,
    /// Module specifier for re-exports (`export { x } from "./mod"`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Declared name in the source module when aliased
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_name: Option<String>,
}

/// Per-file aggregate of declared symbols and exports
///
/// Invariant: after `dedup()`, (kind, name) pairs are unique within one
/// snapshot. Ordering of the vecs is not significant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolSnapshot {
    pub file: String,
    pub language: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<Symbol>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<Symbol>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<Symbol>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_aliases: Vec<Symbol>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enums: Vec<Symbol>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<Symbol>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exports: Vec<ExportRecord>,
    #[serde(default)]
    pub module_system: ModuleSystem,
}

impl SymbolSnapshot {
    pub fn new(file: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            language: language.into(),
            ..Default::default()
        }
    }

    /// Iterate all symbols regardless of kind
    pub fn all_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.functions
            .iter()
            .chain(self.classes.iter())
            .chain(self.interfaces.iter())
            .chain(self.type_aliases.iter())
            .chain(self.enums.iter())
            .chain(self.variables.iter())
    }

    /// Find a symbol by name across all kinds, exported ones first
    pub fn find_symbol(&self, name: &str) -> Option<&Symbol> {
        self.all_symbols()
            .filter(|s| s.name == name)
            .max_by_key(|s| s.is_exported)
    }

    /// Push a symbol into the vec matching its kind
    pub fn push_symbol(&mut self, symbol: Symbol) {
        match symbol.kind {
            SymbolKind::Function => self.functions.push(symbol),
            SymbolKind::Class => self.classes.push(symbol),
            SymbolKind::Interface => self.interfaces.push(symbol),
            SymbolKind::TypeAlias => self.type_aliases.push(symbol),
            SymbolKind::Enum => self.enums.push(symbol),
            SymbolKind::Variable => self.variables.push(symbol),
        }
    }

    /// Enforce the (kind, name) uniqueness invariant, keeping the first
    /// occurrence of each pair
    pub fn dedup(&mut self) {
        fn dedup_vec(v: &mut Vec<Symbol>) {
            let mut seen = std::collections::HashSet::new();
            v.retain(|s| seen.insert(s.name.clone()));
        }
        dedup_vec(&mut self.functions);
        dedup_vec(&mut self.classes);
        dedup_vec(&mut self.interfaces);
        dedup_vec(&mut self.type_aliases);
        dedup_vec(&mut self.enums);
        dedup_vec(&mut self.variables);
    }

    /// Names of all exported symbols plus export records, sorted and deduped
    pub fn exported_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .all_symbols()
            .filter(|s| s.is_exported)
            .map(|s| s.name.clone())
            .chain(self.exports.iter().map(|e| e.name.clone()))
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Stable identity used to match symbols across two snapshots.
///
/// Two files can export symbols of the same name independently, so the
/// diff key is the full tuple, not the name alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolId {
    pub name: String,
    pub export_kind: ExportKind,
    /// Declaring file (after re-export resolution)
    pub file: String,
    /// Declaring line
    pub line: usize,
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}",
            self.name,
            self.export_kind.label(),
            self.file,
            self.line
        )
    }
}

/// Module system detected from export forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleSystem {
    EsModule,
    CommonJs,
    Mixed,
    Unknown,
}

impl Default for ModuleSystem {
    fn default() -> Self {
        Self::Unknown
    }
}

/// Requested analysis fidelity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisMode {
    /// Name-level export tracking only
    ExportsOnly,
    /// Full identity-keyed snapshot with resolved shapes
    ApiSnapshot,
}

/// One export resolved to its declaring symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedExport {
    pub id: SymbolId,
    pub kind: SymbolKind,
    pub shape: SymbolShape,
}

/// Entrypoint-scoped snapshot with exports resolved across files.
///
/// `exports` is keyed by rendered identity so serialization order is
/// deterministic. `partial` is true whenever at least one export's shape
/// could not be resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSnapshot {
    #[serde(rename = "entrypointPath")]
    pub entrypoint: String,
    pub exports: BTreeMap<String, ResolvedExport>,
    pub partial: bool,
    pub failed_shapes: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_shape_names: Vec<String>,
    pub module_system: ModuleSystem,
    pub analysis_mode: AnalysisMode,
}

impl ApiSnapshot {
    pub fn new(entrypoint: impl Into<String>, mode: AnalysisMode) -> Self {
        Self {
            entrypoint: entrypoint.into(),
            exports: BTreeMap::new(),
            partial: false,
            failed_shapes: 0,
            failed_shape_names: Vec::new(),
            module_system: ModuleSystem::Unknown,
            analysis_mode: mode,
        }
    }

    /// Record an export whose shape could not be resolved
    pub fn record_failure(&mut self, name: &str) {
        self.failed_shapes += 1;
        self.failed_shape_names.push(name.to_string());
        self.failed_shape_names.sort();
        self.partial = true;
    }
}

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Breaking,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Breaking => "breaking",
        }
    }
}

/// One classified API change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Rule id from the closed catalog
    pub rule: String,
    pub severity: Severity,
    pub symbol: String,
    pub file: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_shape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_shape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

/// Confidence tag on a usage match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchConfidence {
    /// Usage verified on identifier/property-access AST nodes
    AstVerified,
    /// Regex-level match on stripped text
    Heuristic,
}

/// A file determined to exercise one or more changed symbols
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageMatch {
    pub file: String,
    pub symbols: Vec<String>,
    pub confidence: MatchConfidence,
}

/// Result of `find_changed_elements` between two versions of one file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangedElements {
    pub changed_functions: Vec<String>,
    pub changed_classes: Vec<String>,
}

impl ChangedElements {
    pub fn is_empty(&self) -> bool {
        self.changed_functions.is_empty() && self.changed_classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fn(name: &str) -> Symbol {
        Symbol {
            name: name.to_string(),
            file: "a.ts".to_string(),
            line: 1,
            column: 0,
            kind: SymbolKind::Function,
            is_exported: true,
            shape: SymbolShape::Function {
                params: vec![],
                return_type: None,
                type_params: vec![],
                overloads: vec![],
            },
        }
    }

    #[test]
    fn test_identity_display() {
        let id = SymbolId {
            name: "add".to_string(),
            export_kind: ExportKind::Named,
            file: "src/math.ts".to_string(),
            line: 3,
        };
        assert_eq!(id.to_string(), "add|named|src/math.ts|3");
    }

    #[test]
    fn test_snapshot_dedup() {
        let mut snap = SymbolSnapshot::new("a.ts", "typescript");
        snap.push_symbol(sample_fn("foo"));
        snap.push_symbol(sample_fn("foo"));
        snap.push_symbol(sample_fn("bar"));
        snap.dedup();
        assert_eq!(snap.functions.len(), 2);
    }

    #[test]
    fn test_function_shape_render() {
        let shape = SymbolShape::Function {
            params: vec![
                Param {
                    name: "a".to_string(),
                    ty: Some("number".to_string()),
                    optional: false,
                    default_value: None,
                },
                Param {
                    name: "b".to_string(),
                    ty: Some("string".to_string()),
                    optional: true,
                    default_value: None,
                },
            ],
            return_type: Some("void".to_string()),
            type_params: vec![],
            overloads: vec![],
        };
        assert_eq!(shape.render(), "(a: number, b?: string) => void");
    }

    #[test]
    fn test_param_omittable() {
        let required = Param {
            name: "a".to_string(),
            ty: None,
            optional: false,
            default_value: None,
        };
        let defaulted = Param {
            name: "b".to_string(),
            ty: None,
            optional: false,
            default_value: Some("1".to_string()),
        };
        assert!(!required.is_omittable());
        assert!(defaulted.is_omittable());
    }

    #[test]
    fn test_exported_names_sorted_unique() {
        let mut snap = SymbolSnapshot::new("a.ts", "typescript");
        snap.push_symbol(sample_fn("zeta"));
        snap.push_symbol(sample_fn("alpha"));
        snap.exports.push(ExportRecord {
            name: "alpha".to_string(),
            kind: ExportKind::Named,
            source: None,
            local_name: None,
        });
        assert_eq!(snap.exported_names(), vec!["alpha", "zeta"]);
    }
}
