//! Source file discovery
//!
//! Recursively collects analyzable files under a root, skipping VCS,
//! dependency, and build-output directories. Unreadable directories are
//! logged and skipped so one bad subtree does not abort the batch.

use std::fs;
use std::path::{Path, PathBuf};

use crate::lang::Lang;

/// Collect all supported source files under `root`, sorted by path so the
/// downstream report order is deterministic.
pub fn collect_source_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    collect_recursive(root, &mut files);
    files.sort();
    files
}

fn collect_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if should_skip_path(&path) {
            continue;
        }
        if path.is_dir() {
            collect_recursive(&path, files);
        } else if path.is_file() && Lang::from_path(&path).is_ok() {
            files.push(path);
        }
    }
}

/// Check if a path should be skipped during discovery.
///
/// Skips hidden entries and common dependency/build/VCS directories.
pub fn should_skip_path(path: &Path) -> bool {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => {
            name.starts_with('.')
                || name == "node_modules"
                || name == "target"
                || name == "dist"
                || name == "build"
                || name == "coverage"
                || name == "__pycache__"
                || name == "vendor"
                || name == "venv"
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_skip_common_dirs() {
        assert!(should_skip_path(Path::new(".git")));
        assert!(should_skip_path(Path::new("node_modules")));
        assert!(should_skip_path(Path::new("__pycache__")));
        assert!(!should_skip_path(Path::new("src")));
        assert!(!should_skip_path(Path::new("lib")));
    }

    #[test]
    fn test_collect_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::write(dir.path().join("src/b.ts"), "export const b = 1;").unwrap();
        fs::write(dir.path().join("src/a.py"), "x = 1").unwrap();
        fs::write(dir.path().join("src/notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join("node_modules/pkg/index.js"), "ignored").unwrap();

        let files = collect_source_files(dir.path());
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.py", "b.ts"]);
    }

    #[test]
    fn test_collect_missing_root_is_empty() {
        let files = collect_source_files(Path::new("/nonexistent/apidrift-test"));
        assert!(files.is_empty());
    }
}
