//! Project type-checking configuration
//!
//! The typed analyzer covers plain JavaScript only when the host project
//! opts in via its `tsconfig.json` (`checkJs`) and the file falls inside
//! the config's include set. Config files in the wild routinely carry
//! comments and trailing commas, so parsing goes through json5. A missing
//! or malformed config is not an error at the pipeline level - analysis
//! falls back to the module-surface analyzer.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ApiDriftError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    #[serde(default)]
    compiler_options: RawCompilerOptions,
    #[serde(default)]
    include: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompilerOptions {
    #[serde(default)]
    check_js: bool,
}

/// Loaded type-checking configuration scoped to one project root
#[derive(Debug, Clone)]
pub struct TypeCheckConfig {
    root: PathBuf,
    check_js: bool,
    include: Vec<String>,
    exclude: Vec<String>,
}

impl TypeCheckConfig {
    /// Load `tsconfig.json` from a project root.
    ///
    /// Returns `None` when the file is absent or malformed; malformed
    /// configs are logged so the degradation is visible.
    pub fn load(root: &Path) -> Option<Self> {
        let path = root.join("tsconfig.json");
        if !path.exists() {
            return None;
        }
        match Self::load_from(root, &path) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(
                    config = %path.display(),
                    error = %e,
                    "type-check config unreadable, falling back to heuristic analysis"
                );
                None
            }
        }
    }

    /// Load an explicitly named config file; failures are hard errors here
    /// because the caller asked for this exact file
    pub fn load_from(root: &Path, path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let raw: RawConfig =
            json5::from_str(&text).map_err(|e| ApiDriftError::ConfigError {
                message: format!("{}: {}", path.display(), e),
            })?;
        Ok(Self {
            root: root.to_path_buf(),
            check_js: raw.compiler_options.check_js,
            include: raw.include,
            exclude: raw.exclude,
        })
    }

    /// Build a config directly (tests, embedding callers)
    pub fn with_options(
        root: impl Into<PathBuf>,
        check_js: bool,
        include: Vec<String>,
        exclude: Vec<String>,
    ) -> Self {
        Self {
            root: root.into(),
            check_js,
            include,
            exclude,
        }
    }

    /// Whether the project opts in to type-checking untyped files
    pub fn check_js(&self) -> bool {
        self.check_js
    }

    /// Whether type-checking configuration covers this file.
    ///
    /// Include/exclude entries are treated as path prefixes after glob
    /// tails are stripped; an empty include list covers the whole root.
    pub fn applies_to(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);

        if self
            .exclude
            .iter()
            .any(|pattern| prefix_matches(pattern, relative))
        {
            return false;
        }
        if self.include.is_empty() {
            return true;
        }
        self.include
            .iter()
            .any(|pattern| prefix_matches(pattern, relative))
    }
}

/// Match a tsconfig include/exclude entry as a directory or file prefix
fn prefix_matches(pattern: &str, relative: &Path) -> bool {
    let prefix = pattern
        .trim_start_matches("./")
        .trim_end_matches("/**/*")
        .trim_end_matches("/**")
        .trim_end_matches("/*")
        .trim_end_matches('/');
    if prefix.is_empty() || prefix == "**" {
        return true;
    }
    relative.starts_with(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applies_to_with_include_prefix() {
        let config = TypeCheckConfig::with_options(
            "/proj",
            true,
            vec!["src/**/*".to_string()],
            vec![],
        );
        assert!(config.applies_to(Path::new("/proj/src/a.js")));
        assert!(!config.applies_to(Path::new("/proj/scripts/b.js")));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let config = TypeCheckConfig::with_options(
            "/proj",
            true,
            vec!["src".to_string()],
            vec!["src/legacy".to_string()],
        );
        assert!(config.applies_to(Path::new("/proj/src/new.js")));
        assert!(!config.applies_to(Path::new("/proj/src/legacy/old.js")));
    }

    #[test]
    fn test_empty_include_covers_root() {
        let config = TypeCheckConfig::with_options("/proj", false, vec![], vec![]);
        assert!(config.applies_to(Path::new("/proj/anything/file.js")));
        assert!(!config.check_js());
    }

    #[test]
    fn test_load_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TypeCheckConfig::load(dir.path()).is_none());
    }

    #[test]
    fn test_load_json5_with_comments() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("tsconfig.json"),
            "{\n  // enable JS checking\n  \"compilerOptions\": { \"checkJs\": true, },\n  \"include\": [\"src\"],\n}",
        )
        .unwrap();
        let config = TypeCheckConfig::load(dir.path()).unwrap();
        assert!(config.check_js());
        assert!(config.applies_to(&dir.path().join("src/x.js")));
    }

    #[test]
    fn test_load_malformed_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tsconfig.json"), "{ not valid").unwrap();
        assert!(TypeCheckConfig::load(dir.path()).is_none());
    }

    #[test]
    fn test_load_from_malformed_is_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tsconfig.json");
        fs::write(&path, "{ not valid").unwrap();
        assert!(TypeCheckConfig::load_from(dir.path(), &path).is_err());
    }
}
