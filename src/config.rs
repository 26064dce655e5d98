use crate::constants::{DEFAULT_GAUNTLET_COMMAND, DEFAULT_TEST_SUITE_NAME};
use crate::listener::LogListenerBuilder;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Run settings, usually read from a TOML file.
///
/// ```toml
/// root_path = 'D:\Build\++Game+Main\Sync\'
/// gauntlet_command = "RunUnrealTests"
/// collect_stats = true
/// output_dir = "artifacts"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub root_path: Option<String>,
    pub gauntlet_command: String,
    pub test_suite_name: String,
    pub collect_stats: bool,
    pub update_progress: bool,
    pub output_dir: Option<PathBuf>,
    pub echo: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            root_path: None,
            gauntlet_command: DEFAULT_GAUNTLET_COMMAND.to_string(),
            test_suite_name: DEFAULT_TEST_SUITE_NAME.to_string(),
            collect_stats: true,
            update_progress: true,
            output_dir: None,
            echo: true,
        }
    }
}

impl Settings {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid settings")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        let settings = Settings::from_toml_str(&text)
            .with_context(|| format!("in {}", path.display()))?;
        log::debug!("loaded settings from {}: {:?}", path.display(), settings);
        Ok(settings)
    }

    /// A listener builder configured from these settings.
    pub fn listener_builder(&self) -> LogListenerBuilder {
        LogListenerBuilder::new()
            .with_root_path(self.root_path.clone().unwrap_or_default())
            .with_stats(self.collect_stats)
            .with_gauntlet_command(self.gauntlet_command.clone())
            .with_test_suite_name(self.test_suite_name.clone())
            .with_update_progress(self.update_progress)
    }
}
