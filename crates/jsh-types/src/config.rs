//! Shell configuration loaded from TOML.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{JshError, Result};

/// Session configuration for a shell.
///
/// Every field has a default, so an empty TOML document is a valid config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// User name shown by `\u` in the prompt and exported as `USER`.
    pub user: String,
    /// Host name shown by `\h` in the prompt and exported as `HOST`.
    pub host: String,
    /// Home directory, exported as `HOME` and used as the initial cwd.
    pub home: String,
    /// Colon-separated executable search path, exported as `PATH`.
    pub path: String,
    /// Prompt template, exported as `PS1`.
    pub prompt: String,
    /// History mirror file name, relative to the home directory.
    pub history_file: String,
    /// Startup script name, relative to the home directory.
    pub rc_file: String,
    /// Maximum nesting of sourced files and scripts.
    pub max_depth: usize,
    /// Maximum number of unquoted variable re-scans per parsed line.
    pub max_expansions: usize,
    /// Width used by text formatting commands when the host reports none.
    pub default_width: usize,
    /// Extra global variables seeded at startup.
    pub env: BTreeMap<String, String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            user: "user".to_string(),
            host: "jinux".to_string(),
            home: "/home/user".to_string(),
            path: "/usr/bin".to_string(),
            prompt: "\\u@\\h \\w$ ".to_string(),
            history_file: ".jsh_history".to_string(),
            rc_file: ".jshrc".to_string(),
            max_depth: 64,
            max_expansions: 1024,
            default_width: 80,
            env: BTreeMap::new(),
        }
    }
}

impl ShellConfig {
    /// Parse a configuration from a TOML string.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from the host filesystem.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    fn validate(&self) -> Result<()> {
        if !self.home.starts_with('/') {
            return Err(JshError::Config(format!(
                "home must be an absolute path, got '{}'",
                self.home
            )));
        }
        if self.max_depth == 0 {
            return Err(JshError::Config("max_depth must be at least 1".to_string()));
        }
        if self.history_file.contains('/') || self.rc_file.contains('/') {
            return Err(JshError::Config(
                "history_file and rc_file must be plain file names".to_string(),
            ));
        }
        Ok(())
    }
}
