//! Shared fixture helpers for apidrift integration tests

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary source tree built from (path, content) pairs
pub struct TestTree {
    pub dir: TempDir,
}

impl TestTree {
    pub fn new(files: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        for (name, content) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create parent dirs");
            }
            fs::write(&path, content).expect("write fixture file");
        }
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}
