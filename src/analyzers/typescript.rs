//! Typed analyzer for the TypeScript/JavaScript family
//!
//! Extracts full symbol shapes from TS/TSX sources: parameter lists with
//! types, optionality, and defaults; return types; type parameters;
//! overload sets; class members with visibility; interface and type-alias
//! property lists; enum members. The same extraction runs over plain
//! JavaScript when the project opts in to checking untyped files - type
//! annotations are simply absent there.

use std::path::Path;

use tree_sitter::{Node, Parser, Tree};

use crate::error::{ApiDriftError, Result};
use crate::lang::Lang;
use crate::schema::{
    ChangedElements, ClassMember, ExportKind, ExportRecord, MemberKind, ModuleSystem, Param,
    Property, Symbol, SymbolKind, SymbolShape, SymbolSnapshot, Visibility,
};

/// AST-backed analyzer holding a reusable tree-sitter parser
pub struct TsAnalyzer {
    lang: Lang,
    parser: Parser,
}

impl TsAnalyzer {
    /// Create an analyzer for one language of the TS/JS family
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

    /// Extract a full symbol snapshot from one file
    pub fn analyze(&mut self, path: &Path, content: &str) -> Result<SymbolSnapshot> {
        let tree = self.parse(content)?;
        let mut snapshot = SymbolSnapshot::new(path.display().to_string(), self.lang.name());
        let root = tree.root_node();

        let mut ctx = ExtractCtx::default();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            extract_top_level(&mut snapshot, &mut ctx, &child, content);
        }

        attach_overloads(&mut snapshot, &ctx);
        mark_locally_exported(&mut snapshot);
        snapshot.module_system = ctx.module_system();
        snapshot.dedup();
        Ok(snapshot)
    }

    /// Diff two versions of one file at the declaration level.
    ///
    /// Functions compare by signature string and return type; classes by
    /// member count and per-method signature. A symbol present before and
    /// absent after counts as changed.
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

/// Per-file extraction bookkeeping
#[derive(Default)]
pub(super) struct ExtractCtx {
    /// Overload signatures collected from `function_signature` nodes
    overload_signatures: Vec<(String, String)>,
    pub(super) saw_esm: bool,
    pub(super) saw_cjs: bool,
}

impl ExtractCtx {
    pub(super) fn module_system(&self) -> ModuleSystem {
        match (self.saw_esm, self.saw_cjs) {
            (true, true) => ModuleSystem::Mixed,
            (true, false) => ModuleSystem::EsModule,
            (false, true) => ModuleSystem::CommonJs,
            (false, false) => ModuleSystem::Unknown,
        }
    }
}

pub(super) fn extract_top_level(
    snapshot: &mut SymbolSnapshot,
    ctx: &mut ExtractCtx,
    node: &Node,
    source: &str,
) {
    match node.kind() {
        "export_statement" => {
            ctx.saw_esm = true;
            extract_export_statement(snapshot, ctx, node, source);
        }
        "import_statement" => {
            ctx.saw_esm = true;
        }
        "function_declaration" | "generator_function_declaration" => {
            if let Some(sym) = function_symbol(node, source, &snapshot.file, false) {
                snapshot.functions.push(sym);
            }
        }
        "function_signature" => {
            if let Some(name) = field_text(node, "name", source) {
                ctx.overload_signatures
                    .push((name, render_callable(node, source)));
            }
        }
        "class_declaration" => {
            if let Some(sym) = class_symbol(node, source, &snapshot.file, false) {
                snapshot.classes.push(sym);
            }
        }
        "interface_declaration" => {
            if let Some(sym) = interface_symbol(node, source, &snapshot.file, false) {
                snapshot.interfaces.push(sym);
            }
        }
        "type_alias_declaration" => {
            if let Some(sym) = type_alias_symbol(node, source, &snapshot.file, false) {
                snapshot.type_aliases.push(sym);
            }
        }
        "enum_declaration" => {
            if let Some(sym) = enum_symbol(node, source, &snapshot.file, false) {
                snapshot.enums.push(sym);
            }
        }
        "lexical_declaration" | "variable_declaration" => {
            for sym in variable_symbols(node, source, &snapshot.file, false) {
                snapshot.push_symbol(sym);
            }
        }
        "expression_statement" => {
            extract_commonjs_exports(snapshot, ctx, node, source);
        }
        "ambient_declaration" => {
            // declare function/class/...: recurse into the inner declaration
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                extract_top_level(snapshot, ctx, &child, source);
            }
        }
        _ => {}
    }
}

fn extract_export_statement(
    snapshot: &mut SymbolSnapshot,
    ctx: &mut ExtractCtx,
    node: &Node,
    source: &str,
) {
    let is_default = has_child_kind(node, "default");
    let source_module = field_text(node, "source", source).map(|s| unquote(&s));

    if let Some(decl) = node.child_by_field_name("declaration") {
        // export [default] <declaration>
        let exported: Vec<Symbol> = match decl.kind() {
            "function_declaration" | "generator_function_declaration" => {
                function_symbol(&decl, source, &snapshot.file, true)
                    .into_iter()
                    .collect()
            }
            "function_signature" => {
                if let Some(name) = field_text(&decl, "name", source) {
                    ctx.overload_signatures
                        .push((name, render_callable(&decl, source)));
                }
                Vec::new()
            }
            "class_declaration" => class_symbol(&decl, source, &snapshot.file, true)
                .into_iter()
                .collect(),
            "interface_declaration" => interface_symbol(&decl, source, &snapshot.file, true)
                .into_iter()
                .collect(),
            "type_alias_declaration" => type_alias_symbol(&decl, source, &snapshot.file, true)
                .into_iter()
                .collect(),
            "enum_declaration" => enum_symbol(&decl, source, &snapshot.file, true)
                .into_iter()
                .collect(),
            "lexical_declaration" | "variable_declaration" => {
                variable_symbols(&decl, source, &snapshot.file, true)
            }
            _ => Vec::new(),
        };

        for sym in exported {
            snapshot.exports.push(ExportRecord {
                name: if is_default {
                    "default".to_string()
                } else {
                    sym.name.clone()
                },
                kind: if is_default {
                    ExportKind::Default
                } else {
                    ExportKind::Named
                },
                source: None,
                local_name: Some(sym.name.clone()),
            });
            snapshot.push_symbol(sym);
        }
        return;
    }

    // export { a, b as c } [from "./mod"]
    let mut handled = false;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "export_clause" => {
                handled = true;
                let mut spec_cursor = child.walk();
                for spec in child.children(&mut spec_cursor) {
                    if spec.kind() != "export_specifier" {
                        continue;
                    }
                    let local = field_text(&spec, "name", source);
                    let alias = field_text(&spec, "alias", source);
                    let exported_name = alias.clone().or_else(|| local.clone());
                    if let Some(name) = exported_name {
                        snapshot.exports.push(ExportRecord {
                            name,
                            kind: if source_module.is_some() {
                                ExportKind::ReExport
                            } else {
                                ExportKind::Named
                            },
                            source: source_module.clone(),
                            local_name: local,
                        });
                    }
                }
            }
            "namespace_export" => {
                // export * as ns from "./mod"
                handled = true;
                let ns_name = child
                    .named_child(0)
                    .map(|n| node_text(&n, source))
                    .unwrap_or_else(|| "*".to_string());
                snapshot.exports.push(ExportRecord {
                    name: ns_name,
                    kind: ExportKind::Namespace,
                    source: source_module.clone(),
                    local_name: None,
                });
            }
            "*" => {
                // export * from "./mod"
                handled = true;
                snapshot.exports.push(ExportRecord {
                    name: "*".to_string(),
                    kind: ExportKind::Namespace,
                    source: source_module.clone(),
                    local_name: None,
                });
            }
            _ => {}
        }
    }

    if !handled && is_default {
        // export default <expression>
        let mut value_cursor = node.walk();
        let value = node
            .named_children(&mut value_cursor)
            .find(|n| n.kind() != "comment");
        let local_name = value.and_then(|v| match v.kind() {
            "identifier" => Some(node_text(&v, source)),
            _ => None,
        });
        snapshot.exports.push(ExportRecord {
            name: "default".to_string(),
            kind: ExportKind::Default,
            source: None,
            local_name,
        });
    }
}

/// Recognize `module.exports = ...` and `exports.name = ...`
fn extract_commonjs_exports(
    snapshot: &mut SymbolSnapshot,
    ctx: &mut ExtractCtx,
    node: &Node,
    source: &str,
) {
    let Some(expr) = node.named_child(0) else {
        return;
    };
    if expr.kind() != "assignment_expression" {
        return;
    }
    let Some(left) = expr.child_by_field_name("left") else {
        return;
    };
    let target = node_text(&left, source);

    if target == "module.exports" {
        ctx.saw_cjs = true;
        let local_name = expr
            .child_by_field_name("right")
            .filter(|r| r.kind() == "identifier")
            .map(|r| node_text(&r, source));
        snapshot.exports.push(ExportRecord {
            name: "default".to_string(),
            kind: ExportKind::Default,
            source: None,
            local_name,
        });
    } else if let Some(name) = target
        .strip_prefix("module.exports.")
        .or_else(|| target.strip_prefix("exports."))
    {
        ctx.saw_cjs = true;
        snapshot.exports.push(ExportRecord {
            name: name.to_string(),
            kind: ExportKind::Named,
            source: None,
            local_name: None,
        });
    }
}

/// Mark symbols exported when a same-file export clause references them
pub(super) fn mark_locally_exported(snapshot: &mut SymbolSnapshot) {
    let local_names: Vec<String> = snapshot
        .exports
        .iter()
        .filter(|e| e.source.is_none())
        .filter_map(|e| e.local_name.clone().or_else(|| Some(e.name.clone())))
        .collect();

    for sym in snapshot
        .functions
        .iter_mut()
        .chain(snapshot.classes.iter_mut())
        .chain(snapshot.interfaces.iter_mut())
        .chain(snapshot.type_aliases.iter_mut())
        .chain(snapshot.enums.iter_mut())
        .chain(snapshot.variables.iter_mut())
    {
        if local_names.iter().any(|n| *n == sym.name) {
            sym.is_exported = true;
        }
    }
}

/// Attach collected overload signatures to their implementing functions
fn attach_overloads(snapshot: &mut SymbolSnapshot, ctx: &ExtractCtx) {
    for sym in snapshot.functions.iter_mut() {
        let sigs: Vec<String> = ctx
            .overload_signatures
            .iter()
            .filter(|(name, _)| *name == sym.name)
            .map(|(_, sig)| sig.clone())
            .collect();
        if sigs.is_empty() {
            continue;
        }
        if let SymbolShape::Function { overloads, .. } = &mut sym.shape {
            *overloads = sigs;
        }
    }
}

// ============================================================================
// Symbol builders
// ============================================================================

fn function_symbol(node: &Node, source: &str, file: &str, exported: bool) -> Option<Symbol> {
    let name = field_text(node, "name", source)?;
    let params = node
        .child_by_field_name("parameters")
        .map(|p| extract_params(&p, source))
        .unwrap_or_default();
    let return_type = return_type_text(node, source);
    let type_params = type_param_names(node, source);

    Some(Symbol {
        name,
        file: file.to_string(),
        line: node.start_position().row + 1,
        column: node.start_position().column,
        kind: SymbolKind::Function,
        is_exported: exported,
        shape: SymbolShape::Function {
            params,
            return_type,
            type_params,
            overloads: vec![],
        },
    })
}

fn class_symbol(node: &Node, source: &str, file: &str, exported: bool) -> Option<Symbol> {
    let name = field_text(node, "name", source)?;
    let members = node
        .child_by_field_name("body")
        .map(|b| extract_class_members(&b, source))
        .unwrap_or_default();

    Some(Symbol {
        name,
        file: file.to_string(),
        line: node.start_position().row + 1,
        column: node.start_position().column,
        kind: SymbolKind::Class,
        is_exported: exported,
        shape: SymbolShape::Class { members },
    })
}

fn extract_class_members(body: &Node, source: &str) -> Vec<ClassMember> {
    let mut members = Vec::new();
    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        match child.kind() {
            "method_definition" | "abstract_method_signature" => {
                let Some(name_node) = child.child_by_field_name("name") else {
                    continue;
                };
                let name = node_text(&name_node, source);
                let kind = if has_child_kind(&child, "get") {
                    MemberKind::Getter
                } else if has_child_kind(&child, "set") {
                    MemberKind::Setter
                } else {
                    MemberKind::Method
                };
                members.push(ClassMember {
                    visibility: member_visibility(&child, &name, source),
                    signature: Some(render_callable(&child, source)),
                    name,
                    kind,
                });
            }
            "public_field_definition" | "field_definition" | "property_signature" => {
                let Some(name_node) = child.child_by_field_name("name") else {
                    continue;
                };
                let name = node_text(&name_node, source);
                let ty = type_field_text(&child, source);
                members.push(ClassMember {
                    visibility: member_visibility(&child, &name, source),
                    signature: ty,
                    name,
                    kind: MemberKind::Property,
                });
            }
            _ => {}
        }
    }
    members
}

fn member_visibility(node: &Node, name: &str, source: &str) -> Visibility {
    if name.starts_with('#') {
        return Visibility::Private;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "accessibility_modifier" {
            return match node_text(&child, source).as_str() {
                "private" => Visibility::Private,
                "protected" => Visibility::Protected,
                _ => Visibility::Public,
            };
        }
    }
    Visibility::Public
}

fn interface_symbol(node: &Node, source: &str, file: &str, exported: bool) -> Option<Symbol> {
    let name = field_text(node, "name", source)?;
    let properties = node
        .child_by_field_name("body")
        .map(|b| extract_object_properties(&b, source))
        .unwrap_or_default();

    Some(Symbol {
        name,
        file: file.to_string(),
        line: node.start_position().row + 1,
        column: node.start_position().column,
        kind: SymbolKind::Interface,
        is_exported: exported,
        shape: SymbolShape::Interface { properties },
    })
}

/// Property list of an interface body or object type
fn extract_object_properties(body: &Node, source: &str) -> Vec<Property> {
    let mut properties = Vec::new();
    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        match child.kind() {
            "property_signature" => {
                let Some(name_node) = child.child_by_field_name("name") else {
                    continue;
                };
                properties.push(Property {
                    name: node_text(&name_node, source),
                    ty: type_field_text(&child, source),
                    optional: has_child_kind(&child, "?"),
                });
            }
            "method_signature" => {
                let Some(name_node) = child.child_by_field_name("name") else {
                    continue;
                };
                properties.push(Property {
                    name: node_text(&name_node, source),
                    ty: Some(render_callable(&child, source)),
                    optional: has_child_kind(&child, "?"),
                });
            }
            _ => {}
        }
    }
    properties
}

fn type_alias_symbol(node: &Node, source: &str, file: &str, exported: bool) -> Option<Symbol> {
    let name = field_text(node, "name", source)?;
    let value = node.child_by_field_name("value");

    let (properties, aliased) = match value {
        Some(v) if v.kind() == "object_type" => (extract_object_properties(&v, source), None),
        Some(v) => (Vec::new(), Some(normalize_ws(&node_text(&v, source)))),
        None => (Vec::new(), None),
    };

    Some(Symbol {
        name,
        file: file.to_string(),
        line: node.start_position().row + 1,
        column: node.start_position().column,
        kind: SymbolKind::TypeAlias,
        is_exported: exported,
        shape: SymbolShape::TypeAlias {
            properties,
            aliased,
        },
    })
}

fn enum_symbol(node: &Node, source: &str, file: &str, exported: bool) -> Option<Symbol> {
    let name = field_text(node, "name", source)?;
    let mut members = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            match child.kind() {
                "enum_assignment" => {
                    if let Some(n) = field_text(&child, "name", source) {
                        members.push(n);
                    }
                }
                "property_identifier" => members.push(node_text(&child, source)),
                "string" => members.push(unquote(&node_text(&child, source))),
                _ => {}
            }
        }
    }

    Some(Symbol {
        name,
        file: file.to_string(),
        line: node.start_position().row + 1,
        column: node.start_position().column,
        kind: SymbolKind::Enum,
        is_exported: exported,
        shape: SymbolShape::Enum { members },
    })
}

/// Symbols from a lexical/variable declaration; arrow functions and
/// function expressions count as functions
fn variable_symbols(node: &Node, source: &str, file: &str, exported: bool) -> Vec<Symbol> {
    let mut symbols = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "variable_declarator" {
            continue;
        }
        let Some(name_node) = child.child_by_field_name("name") else {
            continue;
        };
        if name_node.kind() != "identifier" {
            // Destructuring patterns do not declare one API symbol
            continue;
        }
        let name = node_text(&name_node, source);
        let value = child.child_by_field_name("value");

        let shape = match value {
            Some(v) if v.kind() == "arrow_function" || v.kind() == "function_expression" => {
                let params = v
                    .child_by_field_name("parameters")
                    .map(|p| extract_params(&p, source))
                    .unwrap_or_default();
                SymbolShape::Function {
                    params,
                    return_type: return_type_text(&v, source),
                    type_params: type_param_names(&v, source),
                    overloads: vec![],
                }
            }
            _ => SymbolShape::Variable {
                ty: type_field_text(&child, source),
            },
        };

        let kind = match &shape {
            SymbolShape::Function { .. } => SymbolKind::Function,
            _ => SymbolKind::Variable,
        };

        symbols.push(Symbol {
            name,
            file: file.to_string(),
            line: child.start_position().row + 1,
            column: child.start_position().column,
            kind,
            is_exported: exported,
            shape,
        });
    }
    symbols
}

// ============================================================================
// Node helpers
// ============================================================================

fn extract_params(params_node: &Node, source: &str) -> Vec<Param> {
    let mut out = Vec::new();
    let mut cursor = params_node.walk();
    for child in params_node.children(&mut cursor) {
        match child.kind() {
            // TypeScript grammar wraps each parameter
            "required_parameter" | "optional_parameter" => {
                let name = child
                    .child_by_field_name("pattern")
                    .map(|n| node_text(&n, source))
                    .unwrap_or_default();
                out.push(Param {
                    name,
                    ty: type_field_text(&child, source),
                    optional: child.kind() == "optional_parameter",
                    default_value: field_text(&child, "value", source),
                });
            }
            // Plain JavaScript parameters
            "identifier" => {
                out.push(Param {
                    name: node_text(&child, source),
                    ty: None,
                    optional: false,
                    default_value: None,
                });
            }
            "assignment_pattern" => {
                let name = child
                    .child_by_field_name("left")
                    .map(|n| node_text(&n, source))
                    .unwrap_or_default();
                out.push(Param {
                    name,
                    ty: None,
                    optional: true,
                    default_value: field_text(&child, "right", source),
                });
            }
            "rest_pattern" | "rest_parameter" => {
                let inner = child
                    .named_child(0)
                    .map(|n| node_text(&n, source))
                    .unwrap_or_default();
                out.push(Param {
                    name: format!("...{}", inner),
                    ty: type_field_text(&child, source),
                    optional: true,
                    default_value: None,
                });
            }
            "object_pattern" | "array_pattern" => {
                out.push(Param {
                    name: normalize_ws(&node_text(&child, source)),
                    ty: type_field_text(&child, source),
                    optional: false,
                    default_value: None,
                });
            }
            _ => {}
        }
    }
    out
}

/// Render `(params) => return` for any node with parameters/return_type
fn render_callable(node: &Node, source: &str) -> String {
    let params = node
        .child_by_field_name("parameters")
        .map(|p| extract_params(&p, source))
        .unwrap_or_default();
    SymbolShape::Function {
        params,
        return_type: return_type_text(node, source),
        type_params: type_param_names(node, source),
        overloads: vec![],
    }
    .render()
}

fn node_text(node: &Node, source: &str) -> String {
    node.utf8_text(source.as_bytes()).unwrap_or("").to_string()
}

fn field_text(node: &Node, field: &str, source: &str) -> Option<String> {
    node.child_by_field_name(field).map(|n| node_text(&n, source))
}

/// Text of a `type` field with the leading `:` annotation stripped
fn type_field_text(node: &Node, source: &str) -> Option<String> {
    node.child_by_field_name("type")
        .map(|n| normalize_ws(node_text(&n, source).trim_start_matches(':').trim()))
}

fn return_type_text(node: &Node, source: &str) -> Option<String> {
    node.child_by_field_name("return_type")
        .map(|n| normalize_ws(node_text(&n, source).trim_start_matches(':').trim()))
}

fn type_param_names(node: &Node, source: &str) -> Vec<String> {
    let Some(tp) = node.child_by_field_name("type_parameters") else {
        return Vec::new();
    };
    let mut names = Vec::new();
    let mut cursor = tp.walk();
    for child in tp.children(&mut cursor) {
        if child.kind() == "type_parameter" {
            names.push(normalize_ws(&node_text(&child, source)));
        }
    }
    names
}

fn has_child_kind(node: &Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == kind);
    found
}

fn unquote(s: &str) -> String {
    s.trim_matches(|c| c == '"' || c == '\'' || c == '`').to_string()
}

/// Collapse internal whitespace runs so multi-line types compare stably
fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
