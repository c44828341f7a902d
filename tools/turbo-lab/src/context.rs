//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use turbo_islands::StorefrontConfig;

use crate::output::Output;

const CONFIG_NAMES: [&str; 3] = ["storefront.toml", ".storefront.toml", "storefront.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// Page configuration.
    pub config: StorefrontConfig,
    /// Where the configuration came from, if a file.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
}

impl Context {
    /// Load the page config from `config_path`, the directory tree, or the
    /// built-in demo page.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        if let Some(path) = config_path {
            let config = StorefrontConfig::load(path)?;
            return Ok(Self {
                config,
                config_path: Some(PathBuf::from(path)),
                output,
            });
        }

        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        let (config, config_path) = match Self::find_config(&cwd) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Found storefront config");
                (StorefrontConfig::load(&path)?, Some(path))
            }
            None => {
                tracing::debug!("No storefront config found, using demo page");
                (StorefrontConfig::demo(), None)
            }
        };

        Ok(Self {
            config,
            config_path,
            output,
        })
    }

    /// Find a config file in the directory tree.
    fn find_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_NAMES {
                let candidate = current.join(name);
                if candidate.exists() {
                    return Some(candidate);
                }
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Human-readable config source.
    pub fn source(&self) -> String {
        match &self.config_path {
            Some(path) => path.display().to_string(),
            None => "built-in demo page".to_string(),
        }
    }
}
