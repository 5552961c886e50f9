//! Module-surface analyzer for JavaScript/JSX
//!
//! Plain JavaScript carries no checkable type information, so unless the
//! project explicitly opts in to checking untyped files (see
//! `config::TypeCheckConfig`) a `.js`/`.jsx` file gets export-only
//! analysis: export names and kinds, module system, and JSX component
//! detection. Shapes are deliberately opaque - this analyzer must never
//! claim type-level precision it cannot deliver.

use std::collections::HashSet;
use std::path::Path;

use tree_sitter::{Node, Parser, Tree};

use super::typescript::{extract_top_level, mark_locally_exported, ExtractCtx};
use crate::error::{ApiDriftError, Result};
use crate::lang::Lang;
use crate::schema::{ChangedElements, SymbolKind, SymbolShape, SymbolSnapshot};

/// Export-only analyzer for untyped JavaScript family files
pub struct JsAnalyzer {
    lang: Lang,
    parser: Parser,
}

impl JsAnalyzer {
    pub fn new(lang: Lang) -> Result<Self> {
        let grammar = lang
            .tree_sitter_language()
            .ok_or_else(|| ApiDriftError::UnsupportedLanguage {
                extension: lang.name().to_string(),
            })?;
        let mut parser = Parser::new();
        parser
            .set_language(&grammar)
            .map_err(|e| ApiDriftError::ParseFailure {
                message: format!("failed to load {} grammar: {:?}", lang.name(), e),
            })?;
        Ok(Self { lang, parser })
    }

    pub fn language(&self) -> Lang {
        self.lang
    }

    fn parse(&mut self, content: &str) -> Result<Tree> {
        self.parser
            .parse(content, None)
            .ok_or_else(|| ApiDriftError::ParseFailure {
                message: format!("tree-sitter returned no tree for {}", self.lang.name()),
            })
    }

    /// Extract the module surface: exports, module system, symbol names and
    /// kinds, with shapes downgraded to opaque
    pub fn analyze(&mut self, path: &Path, content: &str) -> Result<SymbolSnapshot> {
        let tree = self.parse(content)?;
        let root = tree.root_node();

        let mut snapshot = SymbolSnapshot::new(path.display().to_string(), self.lang.name());
        let mut ctx = ExtractCtx::default();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            extract_top_level(&mut snapshot, &mut ctx, &child, content);
        }
        mark_locally_exported(&mut snapshot);
        snapshot.module_system = ctx.module_system();

        let jsx_components = if self.lang.supports_jsx() {
            collect_jsx_function_names(&root, content)
        } else {
            HashSet::new()
        };
        downgrade_shapes(&mut snapshot, &jsx_components);

        snapshot.dedup();
        Ok(snapshot)
    }

    /// Name-level change detection between two versions of one file
    pub fn find_changed_elements(
        &mut self,
        before: &str,
        after: &str,
        path: &Path,
    ) -> Result<ChangedElements> {
        let before_snap = self.analyze(path, before)?;
        let after_snap = self.analyze(path, after)?;
        Ok(super::changed_elements_between(&before_snap, &after_snap))
    }
}

/// Replace extracted shapes with opaque ones, keeping only the JSX
/// component marker (a function whose body produces JSX elements)
fn downgrade_shapes(snapshot: &mut SymbolSnapshot, jsx_components: &HashSet<String>) {
    for sym in snapshot
        .functions
        .iter_mut()
        .chain(snapshot.classes.iter_mut())
        .chain(snapshot.variables.iter_mut())
    {
        sym.shape = if sym.kind == SymbolKind::Function && jsx_components.contains(&sym.name) {
            SymbolShape::Function {
                params: vec![],
                return_type: Some("JSX.Element".to_string()),
                type_params: vec![],
                overloads: vec![],
            }
        } else {
            SymbolShape::Opaque
        };
    }
}

/// Names of top-level functions whose bodies contain JSX elements
fn collect_jsx_function_names(root: &Node, source: &str) -> HashSet<String> {
    let mut names = HashSet::new();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        let decl = if child.kind() == "export_statement" {
            child.child_by_field_name("declaration")
        } else {
            Some(child)
        };
        let Some(decl) = decl else { continue };
        match decl.kind() {
            "function_declaration" => {
                if let Some(name) = decl.child_by_field_name("name") {
                    if contains_jsx(&decl) {
                        names.insert(text(&name, source));
                    }
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                let mut inner = decl.walk();
                for declarator in decl.children(&mut inner) {
                    if declarator.kind() != "variable_declarator" {
                        continue;
                    }
                    let (Some(name), Some(value)) = (
                        declarator.child_by_field_name("name"),
                        declarator.child_by_field_name("value"),
                    ) else {
                        continue;
                    };
                    if matches!(value.kind(), "arrow_function" | "function_expression")
                        && contains_jsx(&value)
                    {
                        names.insert(text(&name, source));
                    }
                }
            }
            _ => {}
        }
    }
    names
}

fn contains_jsx(node: &Node) -> bool {
    if matches!(node.kind(), "jsx_element" | "jsx_self_closing_element") {
        return true;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if contains_jsx(&child) {
            return true;
        }
    }
    false
}

fn text(node: &Node, source: &str) -> String {
    node.utf8_text(source.as_bytes()).unwrap_or("").to_string()
}
