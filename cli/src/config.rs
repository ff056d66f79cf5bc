//! Optional `bots.toml` settings.
//!
//! ```toml
//! breakpoints = [3, 12]
//!
//! [vm]
//! step_over_limit = 500
//! default_budget = 20000
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;
use vm::VmConfig;

pub const DEFAULT_CONFIG_FILE: &str = "bots.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BotsConfig {
    pub vm: VmConfig,
    /// Lines the debugger stops at before any `--break` flags are added.
    pub breakpoints: Vec<u32>,
}

impl BotsConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid settings file")
    }

    /// An explicit path must exist; otherwise `./bots.toml` is used when
    /// present and defaults when not.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.exists() {
                    return Ok(Self::default());
                }
                fallback
            }
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::from_toml(&text)?;
        debug!(path = %path.display(), ?config, "loaded settings");
        Ok(config)
    }

    /// Instructions per tick: the flag wins over the file.
    pub fn budget(&self, flag: Option<usize>) -> usize {
        flag.unwrap_or(self.vm.default_budget).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let config = BotsConfig::from_toml("").unwrap();
        assert_eq!(config, BotsConfig::default());
        assert_eq!(config.vm.step_over_limit, 1000);
    }

    #[test]
    fn partial_vm_table_keeps_other_defaults() {
        let config = BotsConfig::from_toml("breakpoints = [2, 5]\n[vm]\nstep_over_limit = 7").unwrap();
        assert_eq!(config.breakpoints, vec![2, 5]);
        assert_eq!(config.vm.step_over_limit, 7);
        assert_eq!(config.vm.default_budget, VmConfig::default().default_budget);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(BotsConfig::from_toml("speed = 3").is_err());
    }

    #[test]
    fn budget_flag_overrides_file() {
        let config = BotsConfig::from_toml("[vm]\ndefault_budget = 50").unwrap();
        assert_eq!(config.budget(None), 50);
        assert_eq!(config.budget(Some(9)), 9);
        assert_eq!(config.budget(Some(0)), 1);
    }

    #[test]
    fn explicit_path_is_read() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        file.write_all(b"breakpoints = [4]").unwrap();
        let config = BotsConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.breakpoints, vec![4]);

        assert!(BotsConfig::load(Some(Path::new("/nonexistent/bots.toml"))).is_err());
    }
}
