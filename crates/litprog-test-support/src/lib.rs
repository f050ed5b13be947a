//! Shared test harness utilities for litprog crates.

use std::fs;
use std::path::{Path, PathBuf};

use litprog_config::{Config, LoadOptions};
use tempfile::TempDir;

/// A throwaway documentation project on disk.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Project {
            dir: tempfile::tempdir().expect("create temp project"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directories");
        }
        fs::write(&path, contents).expect("write fixture");
        path
    }

    pub fn remove(&self, relative: &str) {
        fs::remove_file(self.dir.path().join(relative)).expect("remove fixture");
    }

    /// Configuration resolved with the project root as working directory.
    pub fn config(&self) -> Config {
        Config::load(LoadOptions::default().with_working_dir(self.dir.path()))
            .expect("load project config")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("_build")
    }

    pub fn read_output(&self, relative: &str) -> String {
        fs::read_to_string(self.output_dir().join(relative)).expect("read build output")
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

/// Markdown for one `litprog` directive holding `lines`, with optional
/// `:key:` option lines.
pub fn litprog_block(options: &[&str], lines: &[&str]) -> String {
    let mut block = String::from("```{litprog}\n");
    for option in options {
        block.push_str(option);
        block.push('\n');
    }
    if !options.is_empty() {
        block.push('\n');
    }
    for line in lines {
        block.push_str(line);
        block.push('\n');
    }
    block.push_str("```\n");
    block
}

/// Markdown for a `toctree` directive listing `entries`.
pub fn toctree_block(entries: &[&str]) -> String {
    let mut block = String::from("```{toctree}\n");
    for entry in entries {
        block.push_str(entry);
        block.push('\n');
    }
    block.push_str("```\n");
    block
}
