// Credential defaults from ~/.pvetop: plain `key=value` lines for
// hostname, username, and password. Loading is explicit and returns a
// struct; nothing global.

use anyhow::Context;
use std::path::Path;

/// File name under the user's home directory.
pub const DEFAULTS_FILE: &str = ".pvetop";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CredentialDefaults {
    pub hostname: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl CredentialDefaults {
    pub fn load() -> anyhow::Result<Self> {
        match dirs::home_dir() {
            Some(home) => Self::load_from_path(&home.join(DEFAULTS_FILE)),
            None => Ok(Self::default()),
        }
    }

    /// A missing file just means no defaults; a present but unreadable
    /// file is an error.
    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Ok(Self::parse(&contents))
    }

    /// Parse `key=value` lines; blank lines, `#` comments, and unknown
    /// keys are ignored.
    pub fn parse(contents: &str) -> Self {
        let mut defaults = Self::default();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim().to_string();
            match key.trim() {
                "hostname" => defaults.hostname = Some(value),
                "username" => defaults.username = Some(value),
                "password" => defaults.password = Some(value),
                _ => {}
            }
        }
        defaults
    }

    /// The stored hostname/username pair fills the leading positionals
    /// only when both are present, matching the file's all-or-nothing
    /// contract.
    pub fn host_and_user(&self) -> Option<(&str, &str)> {
        match (&self.hostname, &self.username) {
            (Some(h), Some(u)) => Some((h, u)),
            _ => None,
        }
    }
}
