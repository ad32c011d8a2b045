//! Locating header files on disk.

use std::env;
use std::path::{Path, PathBuf};

/// Ordered include directories.
#[derive(Debug, Clone, Default)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn push(&mut self, dir: impl Into<PathBuf>) {
        self.dirs.push(dir.into());
    }

    /// Finds `name` for an `#include`.
    ///
    /// The quoted form looks next to the including file first; both forms
    /// then try every search directory in order.
    pub fn resolve(&self, name: &str, quoted: bool, including_dir: Option<&Path>) -> Option<PathBuf> {
        let local = including_dir
            .filter(|_| quoted)
            .map(|dir| dir.join(name));
        local
            .into_iter()
            .chain(self.dirs.iter().map(|dir| dir.join(name)))
            .find(|candidate| candidate.is_file())
    }
}

/// Include directories taken from the environment.
pub fn env_include_dirs() -> Vec<PathBuf> {
    include_dirs_from(env::var("INCLUDE").ok(), env::var("C_INCLUDE_PATH").ok())
}

/// `INCLUDE` is `;`-separated, `C_INCLUDE_PATH` `:`-separated; without either
/// the system directory is used.
pub fn include_dirs_from(include: Option<String>, c_include_path: Option<String>) -> Vec<PathBuf> {
    let split = |value: &str, sep: char| -> Vec<PathBuf> {
        value
            .split(sep)
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(PathBuf::from)
            .collect()
    };
    match (include, c_include_path) {
        (Some(dirs), _) if !dirs.trim().is_empty() => split(&dirs, ';'),
        (_, Some(dirs)) if !dirs.trim().is_empty() => split(&dirs, ':'),
        _ => vec![PathBuf::from("/usr/include")],
    }
}
