//! Language detection and tree-sitter grammar loading

use std::path::Path;
use tree_sitter::Language;

use crate::error::{ApiDriftError, Result};

/// Supported source languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    TypeScript,
    Tsx,
    JavaScript,
    Jsx,
    Python,
    Ruby,
}

impl Lang {
    /// Detect language from file path extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ApiDriftError::UnsupportedLanguage {
                extension: "none".to_string(),
            })?;

        Self::from_extension(ext)
    }

    /// Detect language from file extension string
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_lowercase().as_str() {
            "ts" => Ok(Self::TypeScript),
            "tsx" => Ok(Self::Tsx),
            "js" | "mjs" | "cjs" => Ok(Self::JavaScript),
            "jsx" => Ok(Self::Jsx),
            "py" | "pyi" => Ok(Self::Python),
            "rb" => Ok(Self::Ruby),
            _ => Err(ApiDriftError::UnsupportedLanguage {
                extension: ext.to_string(),
            }),
        }
    }

    /// Get the canonical name of the language
    pub fn name(&self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::JavaScript => "javascript",
            Self::Jsx => "jsx",
            Self::Python => "python",
            Self::Ruby => "ruby",
        }
    }

    /// Get the tree-sitter Language for parsing.
    ///
    /// Only the TypeScript/JavaScript family is AST-parsed; Python and Ruby
    /// go through the line-oriented heuristic scanner instead.
    pub fn tree_sitter_language(&self) -> Option<Language> {
        match self {
            Self::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Self::Tsx => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
            Self::JavaScript | Self::Jsx => Some(tree_sitter_javascript::LANGUAGE.into()),
            Self::Python | Self::Ruby => None,
        }
    }

    /// Get the language family for analyzer selection
    pub fn family(&self) -> LangFamily {
        match self {
            Self::TypeScript | Self::Tsx => LangFamily::TypeScript,
            Self::JavaScript | Self::Jsx => LangFamily::JavaScript,
            Self::Python => LangFamily::Python,
            Self::Ruby => LangFamily::Ruby,
        }
    }

    /// Check if this language supports JSX syntax
    pub fn supports_jsx(&self) -> bool {
        matches!(self, Self::Tsx | Self::Jsx)
    }

    /// Check if declarations carry checkable type annotations
    pub fn is_typed(&self) -> bool {
        matches!(self.family(), LangFamily::TypeScript)
    }

    /// Get common file extensions for this language
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::TypeScript => &["ts"],
            Self::Tsx => &["tsx"],
            Self::JavaScript => &["js", "mjs", "cjs"],
            Self::Jsx => &["jsx"],
            Self::Python => &["py", "pyi"],
            Self::Ruby => &["rb"],
        }
    }
}

/// Language families for grouping analyzer behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LangFamily {
    /// TypeScript, TSX - full type-shape extraction
    TypeScript,
    /// JavaScript, JSX - module-surface analysis unless checkJs opts in
    JavaScript,
    /// Python - heuristic line scanning
    Python,
    /// Ruby - heuristic line scanning
    Ruby,
}

impl LangFamily {
    /// Get the canonical name of the language family
    pub fn name(&self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::JavaScript => "javascript",
            Self::Python => "python",
            Self::Ruby => "ruby",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_language_detection() {
        assert_eq!(Lang::from_extension("ts").unwrap(), Lang::TypeScript);
        assert_eq!(Lang::from_extension("tsx").unwrap(), Lang::Tsx);
        assert_eq!(Lang::from_extension("js").unwrap(), Lang::JavaScript);
        assert_eq!(Lang::from_extension("mjs").unwrap(), Lang::JavaScript);
        assert_eq!(Lang::from_extension("jsx").unwrap(), Lang::Jsx);
        assert_eq!(Lang::from_extension("py").unwrap(), Lang::Python);
        assert_eq!(Lang::from_extension("rb").unwrap(), Lang::Ruby);
    }

    #[test]
    fn test_language_from_path() {
        let path = PathBuf::from("src/components/App.tsx");
        assert_eq!(Lang::from_path(&path).unwrap(), Lang::Tsx);

        let path = PathBuf::from("lib/models.py");
        assert_eq!(Lang::from_path(&path).unwrap(), Lang::Python);
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(Lang::from_extension("xyz").is_err());
        assert!(Lang::from_path(Path::new("Makefile")).is_err());
    }

    #[test]
    fn test_typed_families() {
        assert!(Lang::TypeScript.is_typed());
        assert!(Lang::Tsx.is_typed());
        assert!(!Lang::JavaScript.is_typed());
        assert!(!Lang::Python.is_typed());
        assert!(!Lang::Ruby.is_typed());
    }

    #[test]
    fn test_grammar_availability() {
        assert!(Lang::TypeScript.tree_sitter_language().is_some());
        assert!(Lang::Jsx.tree_sitter_language().is_some());
        assert!(Lang::Python.tree_sitter_language().is_none());
        assert!(Lang::Ruby.tree_sitter_language().is_none());
    }
}
