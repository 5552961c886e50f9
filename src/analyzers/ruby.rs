//! Ruby heuristic analyzer
//!
//! Recognizes `def`, `class`, and `module` declaration lines. Conventional
//! two-space indentation drives nesting, and bare `private` / `public`
//! lines flip the visibility of subsequent methods.

use once_cell::sync::Lazy;
use regex::Regex;

use super::heuristic::LineSyntax;

static FUNCTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\s*)def\s+(?:self\.)?([A-Za-z_]\w*[?!]?)\s*(?:\(([^)]*)\))?\s*$")
        .expect("ruby function regex")
});

static CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\s*)(?:class|module)\s+([A-Z]\w*)").expect("ruby class regex")
});

/// Line syntax description for Ruby
pub fn syntax() -> LineSyntax {
    LineSyntax {
        function: &*FUNCTION_RE,
        class: &*CLASS_RE,
        comment: '#',
        underscore_private: false,
        visibility_markers: true,
        export_list: None,
        receivers: &[],
    }
}

#[cfg(test)]
mod tests {
    use super::super::heuristic::scan;
    use super::*;
    use crate::lang::Lang;
    use crate::schema::{SymbolShape, Visibility};
    use std::path::Path;

    fn scan_rb(source: &str) -> crate::schema::SymbolSnapshot {
        scan(Path::new("sample.rb"), source, Lang::Ruby, &syntax())
    }

    #[test]
    fn test_class_with_methods() {
        let source = "\
class Cart
  def add(item, quantity = 1)
  end

  def total
  end
end
";
        let snap = scan_rb(source);
        assert_eq!(snap.classes.len(), 1);
        match &snap.classes[0].shape {
            SymbolShape::Class { members } => {
                assert_eq!(members.len(), 2);
                assert_eq!(members[0].name, "add");
                assert_eq!(members[1].name, "total");
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn test_private_marker_flips_visibility() {
        let source = "\
class Session
  def open
  end

  private

  def seal
  end
end
";
        let snap = scan_rb(source);
        match &snap.classes[0].shape {
            SymbolShape::Class { members } => {
                assert_eq!(members[0].visibility, Visibility::Public);
                assert_eq!(members[1].visibility, Visibility::Private);
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn test_predicate_and_bang_names() {
        let source = "class Flag\n  def enabled?\n  end\n\n  def reset!\n  end\nend\n";
        let snap = scan_rb(source);
        match &snap.classes[0].shape {
            SymbolShape::Class { members } => {
                assert_eq!(members[0].name, "enabled?");
                assert_eq!(members[1].name, "reset!");
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn test_top_level_def_exported() {
        let snap = scan_rb("def helper(arg)\nend\n");
        assert_eq!(snap.functions.len(), 1);
        assert!(snap.functions[0].is_exported);
        assert_eq!(snap.exported_names(), vec!["helper"]);
    }

    #[test]
    fn test_module_recognized_as_container() {
        let source = "module Billing\n  def charge(amount)\n  end\nend\n";
        let snap = scan_rb(source);
        assert_eq!(snap.classes.len(), 1);
        assert_eq!(snap.classes[0].name, "Billing");
    }
}
