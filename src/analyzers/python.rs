//! Python heuristic analyzer
//!
//! Recognizes `def` and `class` declaration lines, tracks nesting by
//! indentation, and infers exports from top-level placement, the leading
//! underscore convention, and an explicit `__all__` list when present.

use once_cell::sync::Lazy;
use regex::Regex;

use super::heuristic::LineSyntax;

static FUNCTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\s*)(?:async\s+)?def\s+([A-Za-z_]\w*)\s*\(([^)]*)\)\s*(?:->\s*([^:]+?)\s*)?:")
        .expect("python function regex")
});

static CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\s*)class\s+([A-Za-z_]\w*)\s*(?:\([^)]*\))?\s*:").expect("python class regex")
});

static ALL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^__all__\s*=\s*\[([^\]]*)\]").expect("python __all__ regex"));

/// Line syntax description for Python
pub fn syntax() -> LineSyntax {
    LineSyntax {
        function: &*FUNCTION_RE,
        class: &*CLASS_RE,
        comment: '#',
        underscore_private: true,
        visibility_markers: false,
        export_list: Some(&*ALL_RE),
        receivers: &["self", "cls"],
    }
}

#[cfg(test)]
mod tests {
    use super::super::heuristic::scan;
    use super::*;
    use crate::lang::Lang;
    use crate::schema::{SymbolShape, Visibility};
    use std::path::Path;

    fn scan_py(source: &str) -> crate::schema::SymbolSnapshot {
        scan(Path::new("sample.py"), source, Lang::Python, &syntax())
    }

    #[test]
    fn test_top_level_function_exported() {
        let snap = scan_py("def process(items, limit=10):\n    return items[:limit]\n");
        assert_eq!(snap.functions.len(), 1);
        let f = &snap.functions[0];
        assert_eq!(f.name, "process");
        assert!(f.is_exported);
        match &f.shape {
            SymbolShape::Function { params, .. } => {
                assert_eq!(params.len(), 2);
                assert!(params[1].optional);
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn test_underscore_function_private() {
        let snap = scan_py("def _helper():\n    pass\n");
        assert!(!snap.functions[0].is_exported);
        assert!(snap.exports.is_empty());
    }

    #[test]
    fn test_methods_attach_to_class() {
        let source = "\
class Store:
    def put(self, key, value):
        pass

    def _evict(self):
        pass

def standalone():
    pass
";
        let snap = scan_py(source);
        assert_eq!(snap.classes.len(), 1);
        assert_eq!(snap.functions.len(), 1);
        assert_eq!(snap.functions[0].name, "standalone");

        match &snap.classes[0].shape {
            SymbolShape::Class { members } => {
                assert_eq!(members.len(), 2);
                // Bare names, not Store.put
                assert_eq!(members[0].name, "put");
                assert_eq!(members[1].name, "_evict");
                assert_eq!(members[1].visibility, Visibility::Private);
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn test_nested_class_closed_by_dedent() {
        let source = "\
class Outer:
    def method(self):
        pass

def after_class():
    pass
";
        let snap = scan_py(source);
        // after_class is top-level, not a method of Outer
        assert_eq!(snap.functions.len(), 1);
        assert!(snap.functions[0].is_exported);
    }

    #[test]
    fn test_all_list_overrides_inference() {
        let source = "\
__all__ = [\"visible\"]

def visible():
    pass

def hidden():
    pass
";
        let snap = scan_py(source);
        assert_eq!(snap.exported_names(), vec!["visible"]);
        let hidden = snap.functions.iter().find(|f| f.name == "hidden").unwrap();
        assert!(!hidden.is_exported);
    }

    #[test]
    fn test_return_annotation_captured() {
        let snap = scan_py("def load(path: str) -> dict:\n    return {}\n");
        match &snap.functions[0].shape {
            SymbolShape::Function { return_type, .. } => {
                assert_eq!(return_type.as_deref(), Some("dict"));
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn test_idempotent_rescan() {
        let source = "class A:\n    def m(self):\n        pass\n";
        assert_eq!(scan_py(source), scan_py(source));
    }
}
