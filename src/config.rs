use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::system::source::ProcPaths;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub sources: SourcesConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub refresh_rate_ms: u64,
    /// Rows shown by the text report; 0 shows every process.
    pub max_processes: usize,
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            refresh_rate_ms: 2000,
            max_processes: 20,
            log_level: "warn".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub proc_root: PathBuf,
    pub os_release: PathBuf,
    pub passwd: PathBuf,
    /// Overrides the platform's clock ticks per second.
    pub clock_ticks: Option<u64>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        let paths = ProcPaths::default();
        SourcesConfig {
            proc_root: paths.proc_root,
            os_release: paths.os_release,
            passwd: paths.passwd,
            clock_ticks: None,
        }
    }
}

impl SourcesConfig {
    pub fn paths(&self) -> ProcPaths {
        ProcPaths {
            proc_root: self.proc_root.clone(),
            os_release: self.os_release.clone(),
            passwd: self.passwd.clone(),
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("procsnap").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), error = %err, "invalid config, using defaults");
            Config::default()
        }),
        Err(_) => Config::default(),
    }
}
