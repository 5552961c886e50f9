//! Two-stage symbol usage matching
//!
//! Decides which candidate files (tests, consumers) exercise a set of
//! changed symbols. Stage 1 checks that the candidate imports the module
//! containing the symbols; stage 2 checks that at least one symbol is
//! actually used. Stage 2 only runs when stage 1 passes, and a file that
//! fails stage 1 is never returned even if symbol text occurs in it -
//! unrelated same-named symbols must not produce false positives.
//!
//! AST-capable languages are verified on identifier and property-access
//! nodes (string and comment subtrees ignored, `ns.symbol` resolved for
//! wildcard imports). Heuristic languages strip strings and comments
//! first, then regex-match import forms and call/property/index usage.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::{Node, Parser};

use crate::analyzers::heuristic::strip_strings_and_comments;
use crate::files::collect_source_files;
use crate::lang::{Lang, LangFamily};
use crate::schema::{MatchConfidence, UsageMatch};

static PY_FROM_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*from\s+([.\w]+)\s+import\s+(.+?)\s*$").expect("python from-import regex")
});
static PY_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*import\s+([.\w]+)(?:\s+as\s+(\w+))?\s*$").expect("python import regex")
});
static RB_REQUIRE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*require(?:_relative)?\s*\(?\s*['"]([^'"]+)['"]"#).expect("ruby require regex")
});

/// Which local bindings a candidate file holds for the changed module
#[derive(Debug, Default)]
struct ImportInfo {
    references_module: bool,
    /// local binding -> exported symbol name
    bound: HashMap<String, String>,
    /// locals bound as whole-module namespaces (`import * as ns`,
    /// `const m = require(...)`, `import module as m`)
    namespaces: Vec<String>,
    /// every changed symbol is bound directly (`from m import *`, Ruby
    /// require semantics)
    direct_all: bool,
}

/// Match candidate files against a set of changed symbols.
///
/// An empty `changed_symbols` slice activates the explicitly heuristic
/// wide mode: any reference to the module path matches, and every result
/// is tagged low-confidence.
pub fn match_files(
    changed_symbols: &[String],
    candidate_files: &[PathBuf],
    source_file: &Path,
    root: &Path,
) -> Vec<UsageMatch> {
    let mut matches = Vec::new();
    for candidate in candidate_files {
        if candidate == source_file {
            continue;
        }
        let content = match fs::read_to_string(candidate) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(file = %candidate.display(), error = %e, "skipping unreadable candidate");
                continue;
            }
        };
        if let Some(m) = match_content(candidate, &content, changed_symbols, source_file, root) {
            matches.push(m);
        }
    }
    matches.sort_by(|a, b| a.file.cmp(&b.file));
    matches
}

/// Match one candidate's content. Split out from `match_files` so the
/// two-stage logic is testable without touching the filesystem.
pub fn match_content(
    candidate: &Path,
    content: &str,
    changed_symbols: &[String],
    source_file: &Path,
    root: &Path,
) -> Option<UsageMatch> {
    let lang = Lang::from_path(candidate).ok()?;

    match lang.family() {
        LangFamily::TypeScript | LangFamily::JavaScript => {
            match_ast(candidate, content, changed_symbols, source_file, lang)
        }
        LangFamily::Python | LangFamily::Ruby => {
            match_heuristic(candidate, content, changed_symbols, source_file, root, lang)
        }
    }
}

/// Whether one file uses one symbol, with no import gate (direct
/// occurrence check used by `find_changed_elements` consumers)
pub fn file_uses_symbol(path: &Path, symbol: &str, _root: &Path) -> bool {
    let Ok(content) = fs::read_to_string(path) else {
        return false;
    };
    let Ok(lang) = Lang::from_path(path) else {
        return false;
    };

    match lang.family() {
        LangFamily::TypeScript | LangFamily::JavaScript => {
            let Some(tree) = parse_tree(lang, &content) else {
                return false;
            };
            let mut found = false;
            walk_code_nodes(&tree.root_node(), &mut |node| {
                if found {
                    return;
                }
                match node.kind() {
                    "identifier" | "property_identifier" => {
                        if node_text(node, &content) == symbol {
                            found = true;
                        }
                    }
                    _ => {}
                }
            });
            found
        }
        LangFamily::Python | LangFamily::Ruby => {
            let stripped = strip_strings_and_comments(&content, "#", None);
            usage_patterns_match(&stripped, symbol, true)
        }
    }
}

/// Files under `root` whose tests/consumers reference `symbol`
pub fn find_references(symbol: &str, declaring_file: &Path, root: &Path) -> Vec<PathBuf> {
    let candidates = collect_source_files(root);
    let symbols = vec![symbol.to_string()];
    match_files(&symbols, &candidates, declaring_file, root)
        .into_iter()
        .map(|m| PathBuf::from(m.file))
        .collect()
}

// ============================================================================
// AST matching (TypeScript/JavaScript family)
// ============================================================================

fn match_ast(
    candidate: &Path,
    content: &str,
    changed_symbols: &[String],
    source_file: &Path,
    lang: Lang,
) -> Option<UsageMatch> {
    let tree = parse_tree(lang, content)?;
    let root_node = tree.root_node();
    let imports = ts_collect_imports(&root_node, content, candidate, source_file);

    // Stage 1: the candidate must reference the changed module at all
    if !imports.references_module {
        return None;
    }

    // Explicitly heuristic wide mode: no symbol list supplied
    if changed_symbols.is_empty() {
        return Some(UsageMatch {
            file: candidate.display().to_string(),
            symbols: vec![],
            confidence: MatchConfidence::Heuristic,
        });
    }

    // Stage 2: at least one changed symbol must actually be used
    let matched = ts_usage(&root_node, content, changed_symbols, &imports);
    if matched.is_empty() {
        return None;
    }

    let mut symbols: Vec<String> = matched.into_iter().collect();
    symbols.sort();
    Some(UsageMatch {
        file: candidate.display().to_string(),
        symbols,
        confidence: MatchConfidence::AstVerified,
    })
}

fn parse_tree(lang: Lang, content: &str) -> Option<tree_sitter::Tree> {
    let grammar = lang.tree_sitter_language()?;
    let mut parser = Parser::new();
    parser.set_language(&grammar).ok()?;
    parser.parse(content, None)
}

fn ts_collect_imports(
    root: &Node,
    source: &str,
    candidate: &Path,
    source_file: &Path,
) -> ImportInfo {
    let mut info = ImportInfo::default();

    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "import_statement" => {
                let Some(spec) = child
                    .child_by_field_name("source")
                    .map(|n| unquote(&node_text(&n, source)))
                else {
                    continue;
                };
                if !specifier_matches_source(candidate, &spec, source_file) {
                    continue;
                }
                info.references_module = true;
                collect_import_clause(&child, source, &mut info);
            }
            "export_statement" => {
                // Re-exports reference the module too
                let Some(spec) = child
                    .child_by_field_name("source")
                    .map(|n| unquote(&node_text(&n, source)))
                else {
                    continue;
                };
                if !specifier_matches_source(candidate, &spec, source_file) {
                    continue;
                }
                info.references_module = true;
                let mut inner = child.walk();
                for part in child.children(&mut inner) {
                    if part.kind() == "export_clause" {
                        let mut spec_cursor = part.walk();
                        for spec_node in part.children(&mut spec_cursor) {
                            if spec_node.kind() == "export_specifier" {
                                if let Some(name) = field_text(&spec_node, "name", source) {
                                    info.bound.insert(name.clone(), name);
                                }
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    // CommonJS: const x = require("./mod"), const { a, b } = require("./mod")
    walk_code_nodes(root, &mut |node| {
        if node.kind() != "call_expression" {
            return;
        }
        let Some(callee) = node.child_by_field_name("function") else {
            return;
        };
        if node_text(&callee, source) != "require" {
            return;
        }
        let Some(args) = node.child_by_field_name("arguments") else {
            return;
        };
        let mut arg_cursor = args.walk();
        let Some(spec) = args
            .children(&mut arg_cursor)
            .find(|a| a.kind() == "string")
            .map(|a| unquote(&node_text(&a, source)))
        else {
            return;
        };
        if !specifier_matches_source(candidate, &spec, source_file) {
            return;
        }
        info.references_module = true;

        if let Some(parent) = node.parent() {
            if parent.kind() == "variable_declarator" {
                if let Some(name_node) = parent.child_by_field_name("name") {
                    match name_node.kind() {
                        "identifier" => info.namespaces.push(node_text(&name_node, source)),
                        "object_pattern" => {
                            let mut pat_cursor = name_node.walk();
                            for pat in name_node.children(&mut pat_cursor) {
                                if pat.kind() == "shorthand_property_identifier_pattern"
                                    || pat.kind() == "identifier"
                                {
                                    let name = node_text(&pat, source);
                                    info.bound.insert(name.clone(), name);
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    });

    info
}

fn collect_import_clause(import_stmt: &Node, source: &str, info: &mut ImportInfo) {
    let mut cursor = import_stmt.walk();
    for child in import_stmt.children(&mut cursor) {
        if child.kind() != "import_clause" {
            continue;
        }
        let mut clause_cursor = child.walk();
        for part in child.children(&mut clause_cursor) {
            match part.kind() {
                "identifier" => {
                    // Default import binds the module's default export
                    info.bound
                        .insert(node_text(&part, source), "default".to_string());
                }
                "named_imports" => {
                    let mut spec_cursor = part.walk();
                    for spec in part.children(&mut spec_cursor) {
                        if spec.kind() != "import_specifier" {
                            continue;
                        }
                        let Some(name) = field_text(&spec, "name", source) else {
                            continue;
                        };
                        let local = field_text(&spec, "alias", source).unwrap_or_else(|| name.clone());
                        info.bound.insert(local, name);
                    }
                }
                "namespace_import" => {
                    // import * as ns from "./mod"
                    let mut ns_cursor = part.walk();
                    let ident = part
                        .children(&mut ns_cursor)
                        .find(|n| n.kind() == "identifier");
                    if let Some(ident) = ident {
                        info.namespaces.push(node_text(&ident, source));
                    }
                }
                _ => {}
            }
        }
    }
}

/// Find actual uses of changed symbols on identifier and property-access
/// nodes, ignoring string/comment subtrees and import statements
fn ts_usage(
    root: &Node,
    source: &str,
    changed_symbols: &[String],
    imports: &ImportInfo,
) -> HashSet<String> {
    let mut matched = HashSet::new();

    // Locals whose use means a changed symbol is exercised
    let mut watched: HashMap<&str, &str> = HashMap::new();
    for (local, symbol) in &imports.bound {
        if changed_symbols.iter().any(|s| s == symbol) {
            watched.insert(local.as_str(), symbol.as_str());
        }
    }

    walk_code_nodes(root, &mut |node| {
        match node.kind() {
            "identifier" => {
                // Skip the binding position inside declarations handled by
                // import collection; plain use sites are what we want
                if let Some(symbol) = watched.get(node_text(node, source).as_str()) {
                    if !is_import_binding(node) {
                        matched.insert((*symbol).to_string());
                    }
                }
            }
            "member_expression" => {
                // ns.symbol via a wildcard/namespace import
                let (Some(object), Some(property)) = (
                    node.child_by_field_name("object"),
                    node.child_by_field_name("property"),
                ) else {
                    return;
                };
                if object.kind() != "identifier" {
                    return;
                }
                let object_name = node_text(&object, source);
                if !imports.namespaces.contains(&object_name) {
                    return;
                }
                let property_name = node_text(&property, source);
                if changed_symbols.iter().any(|s| *s == property_name) {
                    matched.insert(property_name);
                }
            }
            _ => {}
        }
    });

    matched
}

/// Identifier nodes that are the binding side of a require declarator
fn is_import_binding(node: &Node) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    parent.kind() == "variable_declarator"
        && parent
            .child_by_field_name("name")
            .is_some_and(|n| n.id() == node.id())
}

/// Depth-first walk skipping string/comment subtrees and import
/// statements; template substitutions are code and are descended into
fn walk_code_nodes<'a>(node: &Node<'a>, visit: &mut impl FnMut(&Node<'a>)) {
    match node.kind() {
        "comment" | "string" | "import_statement" => return,
        "template_string" => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if child.kind() == "template_substitution" {
                    walk_code_nodes(&child, visit);
                }
            }
            return;
        }
        _ => {}
    }
    visit(node);
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_code_nodes(&child, visit);
    }
}

// ============================================================================
// Heuristic matching (Python/Ruby)
// ============================================================================

fn match_heuristic(
    candidate: &Path,
    content: &str,
    changed_symbols: &[String],
    source_file: &Path,
    root: &Path,
    lang: Lang,
) -> Option<UsageMatch> {
    let imports = match lang.family() {
        LangFamily::Ruby => rb_collect_imports(content, candidate, source_file),
        _ => py_collect_imports(content, source_file, root),
    };

    if !imports.references_module {
        return None;
    }

    if changed_symbols.is_empty() {
        return Some(UsageMatch {
            file: candidate.display().to_string(),
            symbols: vec![],
            confidence: MatchConfidence::Heuristic,
        });
    }

    // Usage runs on stripped text with import lines blanked so the import
    // clause itself never counts as a use
    let stripped = strip_strings_and_comments(content, "#", None);
    let code: String = stripped
        .lines()
        .zip(content.lines())
        .map(|(stripped_line, original_line)| {
            if is_import_line(original_line, lang) {
                ""
            } else {
                stripped_line
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut matched: HashSet<String> = HashSet::new();
    for symbol in changed_symbols {
        // Direct bindings: named imports (under the local alias) or
        // whole-namespace semantics
        let direct_local = imports
            .bound
            .iter()
            .find(|(_, s)| *s == symbol)
            .map(|(local, _)| local.clone());
        if let Some(local) = direct_local {
            if usage_patterns_match(&code, &local, true) {
                matched.insert(symbol.clone());
                continue;
            }
        } else if imports.direct_all && usage_patterns_match(&code, symbol, true) {
            matched.insert(symbol.clone());
            continue;
        }

        // Namespace-qualified usage must match `ns.symbol` as a unit;
        // naive direct-name matching under-detects this case
        for ns in &imports.namespaces {
            let qualified = format!(r"\b{}\s*\.\s*{}\b", regex::escape(ns), regex::escape(symbol));
            if Regex::new(&qualified)
                .map(|re| re.is_match(&code))
                .unwrap_or(false)
            {
                matched.insert(symbol.clone());
                break;
            }
        }
    }

    if matched.is_empty() {
        return None;
    }
    let mut symbols: Vec<String> = matched.into_iter().collect();
    symbols.sort();
    Some(UsageMatch {
        file: candidate.display().to_string(),
        symbols,
        confidence: MatchConfidence::Heuristic,
    })
}

fn is_import_line(line: &str, lang: Lang) -> bool {
    match lang.family() {
        LangFamily::Ruby => RB_REQUIRE.is_match(line),
        _ => PY_FROM_IMPORT.is_match(line) || PY_IMPORT.is_match(line),
    }
}

/// Call, property, index, or (when directly bound) bare-name usage
fn usage_patterns_match(code: &str, name: &str, allow_bare: bool) -> bool {
    let escaped = regex::escape(name);
    let call = format!(r"\b{}\s*\(", escaped);
    let property = format!(r"\.\s*{}\b", escaped);
    let index = format!(r"\b{}\s*\[", escaped);
    for pattern in [&call, &property, &index] {
        if Regex::new(pattern).map(|re| re.is_match(code)).unwrap_or(false) {
            return true;
        }
    }
    if allow_bare {
        let bare = format!(r"\b{}\b", escaped);
        return Regex::new(&bare).map(|re| re.is_match(code)).unwrap_or(false);
    }
    false
}

fn py_collect_imports(content: &str, source_file: &Path, root: &Path) -> ImportInfo {
    let mut info = ImportInfo::default();

    for line in content.lines() {
        if let Some(caps) = PY_FROM_IMPORT.captures(line) {
            let module = caps[1].trim_start_matches('.');
            if !py_module_matches(module, source_file, root) {
                continue;
            }
            info.references_module = true;
            let items = &caps[2];
            if items.trim() == "*" {
                info.direct_all = true;
                continue;
            }
            for item in items.trim_matches(|c| c == '(' || c == ')').split(',') {
                let item = item.trim();
                if item.is_empty() {
                    continue;
                }
                match item.split_once(" as ") {
                    Some((name, alias)) => {
                        info.bound
                            .insert(alias.trim().to_string(), name.trim().to_string());
                    }
                    None => {
                        info.bound.insert(item.to_string(), item.to_string());
                    }
                }
            }
        } else if let Some(caps) = PY_IMPORT.captures(line) {
            let module = caps[1].trim_start_matches('.');
            if !py_module_matches(module, source_file, root) {
                continue;
            }
            info.references_module = true;
            let ns = caps
                .get(2)
                .map(|m| m.as_str().to_string())
                .or_else(|| module.rsplit('.').next().map(String::from));
            if let Some(ns) = ns {
                info.namespaces.push(ns);
            }
        }
    }

    info
}

/// Match a Python module specifier against the changed source file
fn py_module_matches(module: &str, source_file: &Path, root: &Path) -> bool {
    let relative = source_file.strip_prefix(root).unwrap_or(source_file);
    let dotted = relative
        .with_extension("")
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str().map(String::from),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(".");
    let stem = source_file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    module == dotted
        || module == stem
        || module.ends_with(&format!(".{}", stem)) && dotted.ends_with(module)
}

fn rb_collect_imports(content: &str, candidate: &Path, source_file: &Path) -> ImportInfo {
    let mut info = ImportInfo::default();
    let stem = source_file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    for line in content.lines() {
        let Some(caps) = RB_REQUIRE.captures(line) else {
            continue;
        };
        let spec = &caps[1];
        let matches = if spec.starts_with('.') || spec.contains('/') {
            // require_relative-style path: resolve against the candidate
            let resolved = lexical_normalize(
                &candidate
                    .parent()
                    .unwrap_or_else(|| Path::new(""))
                    .join(spec),
            );
            module_stem(&resolved) == module_stem(&lexical_normalize(source_file))
                || resolved.file_name().and_then(|s| s.to_str()) == Some(stem)
        } else {
            spec == stem
        };
        if matches {
            info.references_module = true;
            // Ruby require pulls definitions into scope directly
            info.direct_all = true;
        }
    }

    info
}

// ============================================================================
// Module path resolution
// ============================================================================

/// Resolve a relative import specifier against the importing file and
/// compare with the changed source file, tolerating extension and
/// `/index` differences. Bare package specifiers never match - matching
/// an unrelated package of the same name is exactly the false positive
/// this stage exists to avoid.
fn specifier_matches_source(candidate: &Path, spec: &str, source_file: &Path) -> bool {
    if !spec.starts_with('.') {
        return false;
    }
    let resolved = lexical_normalize(
        &candidate
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(spec),
    );
    module_stem(&resolved) == module_stem(&lexical_normalize(source_file))
}

/// Lexically normalize `.` and `..` components without touching the fs
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component> = Vec::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.last(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push(comp);
                }
            }
            other => out.push(other),
        }
    }
    out.iter().collect()
}

/// Path identity of a module: extension stripped, `/index` collapsed
fn module_stem(path: &Path) -> PathBuf {
    let stripped = path.with_extension("");
    if stripped.file_name().and_then(|s| s.to_str()) == Some("index") {
        stripped
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(stripped)
    } else {
        stripped
    }
}

fn node_text(node: &Node, source: &str) -> String {
    node.utf8_text(source.as_bytes()).unwrap_or("").to_string()
}

fn field_text(node: &Node, field: &str, source: &str) -> Option<String> {
    node.child_by_field_name(field).map(|n| node_text(&n, source))
}

fn unquote(s: &str) -> String {
    s.trim_matches(|c| c == '"' || c == '\'' || c == '`').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts_match(content: &str, symbols: &[&str]) -> Option<UsageMatch> {
        let symbols: Vec<String> = symbols.iter().map(|s| s.to_string()).collect();
        match_content(
            Path::new("/proj/tests/api.test.ts"),
            content,
            &symbols,
            Path::new("/proj/src/math.ts"),
            Path::new("/proj"),
        )
    }

    fn py_match(content: &str, symbols: &[&str]) -> Option<UsageMatch> {
        let symbols: Vec<String> = symbols.iter().map(|s| s.to_string()).collect();
        match_content(
            Path::new("/proj/tests/test_math.py"),
            content,
            &symbols,
            Path::new("/proj/src/math.py"),
            Path::new("/proj"),
        )
    }

    #[test]
    fn test_named_import_and_use() {
        let m = ts_match(
            "import { add } from \"../src/math\";\ntest(\"adds\", () => { expect(add(1, 2)).toBe(3); });\n",
            &["add"],
        )
        .unwrap();
        assert_eq!(m.symbols, vec!["add"]);
        assert_eq!(m.confidence, MatchConfidence::AstVerified);
    }

    #[test]
    fn test_import_without_use_excluded() {
        let m = ts_match(
            "import { add } from \"../src/math\";\ntest(\"unrelated\", () => { expect(1).toBe(1); });\n",
            &["add"],
        );
        assert!(m.is_none());
    }

    #[test]
    fn test_no_import_never_matches() {
        // Symbol text present, but the module is never imported
        let m = ts_match("const add = (a, b) => a + b;\nadd(1, 2);\n", &["add"]);
        assert!(m.is_none());
    }

    #[test]
    fn test_symbol_only_in_string_not_matched() {
        let m = ts_match(
            "import { add } from \"../src/math\";\nconsole.log(\"add is great\"); // add here too\nexport const keep = 1;\n",
            &["add"],
        );
        assert!(m.is_none());
    }

    #[test]
    fn test_namespace_import_resolved() {
        let m = ts_match(
            "import * as math from \"../src/math\";\nmath.add(1, 2);\n",
            &["add"],
        )
        .unwrap();
        assert_eq!(m.symbols, vec!["add"]);
    }

    #[test]
    fn test_aliased_import_maps_back() {
        let m = ts_match(
            "import { add as plus } from \"../src/math\";\nplus(1, 2);\n",
            &["add"],
        )
        .unwrap();
        assert_eq!(m.symbols, vec!["add"]);
    }

    #[test]
    fn test_require_destructuring() {
        let symbols = vec!["add".to_string()];
        let m = match_content(
            Path::new("/proj/tests/api.test.js"),
            "const { add } = require(\"../src/math\");\nadd(1, 2);\n",
            &symbols,
            Path::new("/proj/src/math.js"),
            Path::new("/proj"),
        )
        .unwrap();
        assert_eq!(m.symbols, vec!["add"]);
    }

    #[test]
    fn test_wide_mode_is_heuristic() {
        let m = ts_match("import { whatever } from \"../src/math\";\n", &[]).unwrap();
        assert_eq!(m.confidence, MatchConfidence::Heuristic);
        assert!(m.symbols.is_empty());
    }

    #[test]
    fn test_unrelated_module_same_symbol_excluded() {
        let m = ts_match(
            "import { add } from \"./other/math-helpers\";\nadd(1, 2);\n",
            &["add"],
        );
        assert!(m.is_none());
    }

    #[test]
    fn test_python_from_import_and_use() {
        let m = py_match(
            "from src.math import add\n\ndef test_add():\n    assert add(1, 2) == 3\n",
            &["add"],
        )
        .unwrap();
        assert_eq!(m.symbols, vec!["add"]);
        assert_eq!(m.confidence, MatchConfidence::Heuristic);
    }

    #[test]
    fn test_python_import_line_does_not_count_as_use() {
        let m = py_match("from src.math import add\n\nprint(\"nothing\")\n", &["add"]);
        assert!(m.is_none());
    }

    #[test]
    fn test_python_namespace_qualified_required() {
        // Module imported as namespace: bare symbol text must not match
        let m = py_match(
            "import src.math as math\n\nvalue = other.add(1)\n",
            &["add"],
        );
        assert!(m.is_none());

        let m = py_match(
            "import src.math as math\n\nvalue = math.add(1)\n",
            &["add"],
        )
        .unwrap();
        assert_eq!(m.symbols, vec!["add"]);
    }

    #[test]
    fn test_python_string_occurrence_ignored_with_import() {
        let m = py_match(
            "from src.math import add\n\nmessage = \"add(1, 2) failed\"\n",
            &["add"],
        );
        assert!(m.is_none());
    }

    #[test]
    fn test_specifier_resolution_index_and_ext() {
        assert!(specifier_matches_source(
            Path::new("/proj/tests/t.ts"),
            "../src/math",
            Path::new("/proj/src/math.ts"),
        ));
        assert!(specifier_matches_source(
            Path::new("/proj/tests/t.ts"),
            "../src/math/index",
            Path::new("/proj/src/math/index.ts"),
        ));
        assert!(!specifier_matches_source(
            Path::new("/proj/tests/t.ts"),
            "math",
            Path::new("/proj/src/math.ts"),
        ));
    }

    #[test]
    fn test_ruby_require_relative_and_call() {
        let symbols = vec!["charge".to_string()];
        let m = match_content(
            Path::new("/proj/spec/billing_spec.rb"),
            "require_relative \"../lib/billing\"\n\ndescribe do\n  it { charge(5) }\nend\n",
            &symbols,
            Path::new("/proj/lib/billing.rb"),
            Path::new("/proj"),
        )
        .unwrap();
        assert_eq!(m.symbols, vec!["charge"]);
    }
}
