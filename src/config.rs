//! Optional JSON run configuration.
//!
//! ```json
//! { "include_dirs": ["vendor/include"], "endianness": "little",
//!   "strategy": "native", "env_include": false }
//! ```
//!
//! Every key is optional. Values given on the command line win.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::cli::Cli;
use crate::runtime::Endianness;
use crate::writer::Strategy;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub include_dirs: Vec<PathBuf>,
    pub endianness: Endianness,
    pub strategy: Strategy,
    /// Append directories from `INCLUDE` / `C_INCLUDE_PATH`.
    pub env_include: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include_dirs: Vec::new(),
            endianness: Endianness::default(),
            strategy: Strategy::default(),
            env_include: true,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Reading {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Parsing {}", path.display()))
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Layers command-line values over this configuration.
    pub fn merge_cli(mut self, cli: &Cli) -> Self {
        // Command-line directories are searched first.
        let mut dirs = cli.include.clone();
        dirs.append(&mut self.include_dirs);
        self.include_dirs = dirs;
        if let Some(e) = cli.endian {
            self.endianness = e;
        }
        if let Some(s) = cli.strategy {
            self.strategy = s;
        }
        if cli.no_env_include {
            self.env_include = false;
        }
        self
    }
}
