// SPDX-License-Identifier: GPL-3.0-or-later

//! Server configuration.
//!
//! Settings layer in the usual order: built-in defaults, then
//! `~/.config/palisade/config.toml`, then an explicit `--config` file,
//! then `PALISADE_*` environment variables.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Runtime settings for the sandbox and search tools.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Compare path components with ASCII case folding during containment
    /// checks. Enable only on deployments backed by a case-insensitive
    /// filesystem (default: false).
    #[serde(default)]
    pub case_insensitive_paths: bool,

    /// Maximum number of entries `search_files` returns (default: 1000).
    #[serde(default = "default_max_search_results")]
    pub max_search_results: usize,
}

const fn default_max_search_results() -> usize {
    1000
}

impl Config {
    /// Load configuration from standard paths or a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if a config source cannot be read or deserialized.
    pub fn load(explicit_file: Option<PathBuf>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // 1. Start with defaults
        builder = builder
            .set_default("case_insensitive_paths", false)?
            .set_default("max_search_results", 1000)?;

        // 2. Load from user config directory (~/.config/palisade/config.toml)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("palisade").join("config.toml");
            if config_path.exists() {
                builder = builder.add_source(config::File::from(config_path));
            }
        }

        // 3. Load from explicit file if provided
        if let Some(path) = explicit_file {
            builder = builder.add_source(config::File::from(path));
        }

        // 4. Load from environment variables (PALISADE_MAX_SEARCH_RESULTS, etc.)
        builder = builder.add_source(config::Environment::with_prefix("PALISADE"));

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            case_insensitive_paths: false,
            max_search_results: default_max_search_results(),
        }
    }
}
