//! Shared line-oriented scanner for heuristic analyzers
//!
//! Python and Ruby are analyzed without an AST: declaration lines are
//! recognized by regex and nesting is tracked by indentation depth. A
//! symbol is "inside" the nearest preceding class whose indentation is
//! smaller and which has not yet been closed by a code line at
//! equal-or-lower indentation. This is acknowledged as unsound; shapes
//! never claim type-level precision and findings built on them are
//! disclosed as heuristic.

use std::path::Path;

use regex::Regex;

use crate::lang::Lang;
use crate::schema::{
    ClassMember, ExportKind, ExportRecord, MemberKind, Param, Symbol, SymbolKind, SymbolShape,
    SymbolSnapshot, Visibility,
};

/// Regexes and conventions describing one scripting language's surface
pub struct LineSyntax {
    /// Declaration-line regex for functions.
    /// Groups: 1 = indent, 2 = name, 3 = params, 4 = optional return type
    pub function: &'static Regex,
    /// Declaration-line regex for classes. Groups: 1 = indent, 2 = name
    pub class: &'static Regex,
    /// Line comment prefix
    pub comment: char,
    /// Leading underscore marks a symbol private (Python convention)
    pub underscore_private: bool,
    /// Bare `private` / `public` lines flip subsequent method visibility
    /// (Ruby convention)
    pub visibility_markers: bool,
    /// Explicit export list declaration (Python `__all__`).
    /// Group 1 = bracketed body
    pub export_list: Option<&'static Regex>,
    /// Receiver names stripped from method parameter lists
    pub receivers: &'static [&'static str],
}

struct OpenClass {
    name: String,
    indent: usize,
    /// Index into the snapshot's classes vec
    slot: usize,
    /// Current visibility section (Ruby `private` marker)
    visibility: Visibility,
}

/// Scan a source file into a snapshot using line-oriented heuristics
pub fn scan(path: &Path, content: &str, lang: Lang, syntax: &LineSyntax) -> SymbolSnapshot {
    let mut snapshot = SymbolSnapshot::new(path.display().to_string(), lang.name());
    let mut stack: Vec<OpenClass> = Vec::new();
    let mut explicit_exports: Option<Vec<String>> = None;

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with(syntax.comment) {
            // Blank and comment lines never close a class body
            continue;
        }

        let indent = indent_width(line);

        // Close any class whose body this code line has left
        while let Some(top) = stack.last() {
            if indent <= top.indent {
                stack.pop();
            } else {
                break;
            }
        }

        if syntax.visibility_markers {
            if let Some(open) = stack.last_mut() {
                match trimmed.trim_end() {
                    "private" => {
                        open.visibility = Visibility::Private;
                        continue;
                    }
                    "public" => {
                        open.visibility = Visibility::Public;
                        continue;
                    }
                    _ => {}
                }
            }
        }

        if let Some(re) = syntax.export_list {
            if let Some(caps) = re.captures(line) {
                let names: Vec<String> = caps[1]
                    .split(',')
                    .map(|s| s.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                explicit_exports = Some(names);
                continue;
            }
        }

        if let Some(caps) = syntax.class.captures(line) {
            let name = caps[2].to_string();
            let exported = stack.is_empty()
                && indent == 0
                && !(syntax.underscore_private && name.starts_with('_'));

            snapshot.classes.push(Symbol {
                name: name.clone(),
                file: snapshot.file.clone(),
                line: line_no,
                column: indent,
                kind: SymbolKind::Class,
                is_exported: exported,
                shape: SymbolShape::Class { members: vec![] },
            });
            stack.push(OpenClass {
                name,
                indent,
                slot: snapshot.classes.len() - 1,
                visibility: Visibility::Public,
            });
            continue;
        }

        if let Some(caps) = syntax.function.captures(line) {
            let name = caps[2].to_string();
            let params = parse_params(caps.get(3).map_or("", |m| m.as_str()), syntax.receivers);
            let return_type = caps
                .get(4)
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty());

            if let Some(open) = stack.last() {
                // Method: qualify for tracing, then attach the bare name to
                // the owning class's member list
                let qualified = format!("{}.{}", open.name, name);
                tracing::trace!(symbol = %qualified, line = line_no, "heuristic method");

                let visibility = if syntax.underscore_private && name.starts_with('_') {
                    Visibility::Private
                } else {
                    open.visibility
                };
                let signature = SymbolShape::Function {
                    params: params.clone(),
                    return_type: return_type.clone(),
                    type_params: vec![],
                    overloads: vec![],
                }
                .render();

                let slot = open.slot;
                if let SymbolShape::Class { members } = &mut snapshot.classes[slot].shape {
                    members.push(ClassMember {
                        name,
                        kind: MemberKind::Method,
                        visibility,
                        signature: Some(signature),
                    });
                }
            } else {
                let exported = indent == 0
                    && !(syntax.underscore_private && name.starts_with('_'));
                snapshot.functions.push(Symbol {
                    name,
                    file: snapshot.file.clone(),
                    line: line_no,
                    column: indent,
                    kind: SymbolKind::Function,
                    is_exported: exported,
                    shape: SymbolShape::Function {
                        params,
                        return_type,
                        type_params: vec![],
                        overloads: vec![],
                    },
                });
            }
        }
    }

    // An explicit export list overrides the indentation inference
    if let Some(names) = explicit_exports {
        for sym in snapshot
            .functions
            .iter_mut()
            .chain(snapshot.classes.iter_mut())
        {
            sym.is_exported = names.contains(&sym.name);
        }
        snapshot.exports = names
            .into_iter()
            .map(|name| ExportRecord {
                name,
                kind: ExportKind::Named,
                source: None,
                local_name: None,
            })
            .collect();
    } else {
        let records: Vec<ExportRecord> = snapshot
            .all_symbols()
            .filter(|s| s.is_exported)
            .map(|s| ExportRecord {
                name: s.name.clone(),
                kind: ExportKind::Named,
                source: None,
                local_name: None,
            })
            .collect();
        snapshot.exports = records;
    }

    snapshot.dedup();
    snapshot
}

/// Indentation width of a line, tabs counted as four columns
fn indent_width(line: &str) -> usize {
    let mut width = 0;
    for c in line.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width += 4,
            _ => break,
        }
    }
    width
}

/// Parse a raw parameter list into params, stripping receivers and sigils
fn parse_params(raw: &str, receivers: &[&str]) -> Vec<Param> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| !receivers.contains(s))
        .map(|part| {
            let (head, default) = match split_once_top(part, '=') {
                Some((h, d)) => (h.trim(), Some(d.trim().to_string())),
                None => (part, None),
            };
            let (name, ty) = match head.split_once(':') {
                Some((n, t)) => (n.trim(), Some(t.trim().to_string())),
                None => (head, None),
            };
            let name = name
                .trim_start_matches("**")
                .trim_start_matches('*')
                .trim_start_matches('&')
                .to_string();
            Param {
                optional: default.is_some(),
                default_value: default,
                name,
                ty,
            }
        })
        .filter(|p| !p.name.is_empty())
        .collect()
}

/// Split on the first `sep` that is not doubled (so `==` in a default
/// expression is left alone)
fn split_once_top(s: &str, sep: char) -> Option<(&str, &str)> {
    let bytes = s.as_bytes();
    for (i, c) in s.char_indices() {
        if c == sep {
            let doubled = bytes.get(i + 1) == Some(&(sep as u8))
                || (i > 0 && bytes.get(i - 1) == Some(&(sep as u8)));
            if !doubled {
                return Some((&s[..i], &s[i + 1..]));
            }
        }
    }
    None
}

// ============================================================================
// Text stripping for usage matching
// ============================================================================

/// Strip comments and string bodies from source text, preserving line
/// structure so matches can still be located.
///
/// Handles line comments, block comments, single/double-quoted strings, and
/// one level of template-literal body. Replaced characters become spaces.
pub fn strip_strings_and_comments(
    source: &str,
    line_comment: &str,
    block_comment: Option<(&str, &str)>,
) -> String {
    let mut out = String::with_capacity(source.len());
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;

    let starts_with = |i: usize, pat: &str| -> bool {
        chars[i..].iter().take(pat.chars().count()).collect::<String>() == pat
    };

    while i < chars.len() {
        let c = chars[i];

        // Line comment: blank to end of line
        if !line_comment.is_empty() && starts_with(i, line_comment) {
            while i < chars.len() && chars[i] != '\n' {
                out.push(' ');
                i += 1;
            }
            continue;
        }

        // Block comment: blank to terminator, keeping newlines
        if let Some((open, close)) = block_comment {
            if starts_with(i, open) {
                while i < chars.len() && !starts_with(i, close) {
                    out.push(if chars[i] == '\n' { '\n' } else { ' ' });
                    i += 1;
                }
                for _ in 0..close.chars().count() {
                    if i < chars.len() {
                        out.push(' ');
                        i += 1;
                    }
                }
                continue;
            }
        }

        // Quoted strings and single-level template literals
        if c == '"' || c == '\'' || c == '`' {
            let quote = c;
            out.push(' ');
            i += 1;
            while i < chars.len() && chars[i] != quote {
                if chars[i] == '\\' && i + 1 < chars.len() {
                    out.push(' ');
                    out.push(' ');
                    i += 2;
                    continue;
                }
                out.push(if chars[i] == '\n' { '\n' } else { ' ' });
                i += 1;
            }
            if i < chars.len() {
                out.push(' ');
                i += 1;
            }
            continue;
        }

        out.push(c);
        i += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indent_width() {
        assert_eq!(indent_width("def f():"), 0);
        assert_eq!(indent_width("    def f():"), 4);
        assert_eq!(indent_width("\tdef f():"), 4);
    }

    #[test]
    fn test_parse_params_defaults_and_types() {
        let params = parse_params("a, b: int = 3, *args, **kwargs", &["self"]);
        assert_eq!(params.len(), 4);
        assert_eq!(params[0].name, "a");
        assert!(!params[0].optional);
        assert_eq!(params[1].name, "b");
        assert_eq!(params[1].ty.as_deref(), Some("int"));
        assert_eq!(params[1].default_value.as_deref(), Some("3"));
        assert!(params[1].optional);
        assert_eq!(params[2].name, "args");
        assert_eq!(params[3].name, "kwargs");
    }

    #[test]
    fn test_parse_params_strips_receiver() {
        let params = parse_params("self, value", &["self", "cls"]);
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "value");
    }

    #[test]
    fn test_strip_line_comments_and_strings() {
        let src = "call(x) # trailing note\nname = \"symbol_in_string\"";
        let stripped = strip_strings_and_comments(src, "#", None);
        assert!(stripped.contains("call(x)"));
        assert!(!stripped.contains("trailing"));
        assert!(!stripped.contains("symbol_in_string"));
        assert_eq!(stripped.lines().count(), src.lines().count());
    }

    #[test]
    fn test_strip_block_comments() {
        let src = "before /* uses foo() */ after";
        let stripped = strip_strings_and_comments(src, "//", Some(("/*", "*/")));
        assert!(stripped.contains("before"));
        assert!(stripped.contains("after"));
        assert!(!stripped.contains("foo"));
    }

    #[test]
    fn test_strip_template_literal() {
        let src = "const s = `calls symbolName here`; use(other)";
        let stripped = strip_strings_and_comments(src, "//", Some(("/*", "*/")));
        assert!(!stripped.contains("symbolName"));
        assert!(stripped.contains("use(other)"));
    }
}
