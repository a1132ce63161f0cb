use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::query::{EngineOptions, InstitutionMatch};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub data: Option<DataConfig>,
    pub query: Option<QueryConfig>,
    pub display: Option<DisplayConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Candidate dataset locations, tried in order (paths or http(s) URLs).
    pub sources: Option<Vec<String>>,
    pub sample_fallback: Option<bool>,
    pub sample_seed: Option<u64>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    pub case_insensitive_institutions: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub color: Option<bool>,
    pub abstract_preview_chars: Option<usize>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to write config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl ConfigFile {
    pub fn engine_options(&self) -> EngineOptions {
        let case_insensitive = self
            .query
            .as_ref()
            .and_then(|q| q.case_insensitive_institutions)
            .unwrap_or(false);
        EngineOptions {
            institution_match: if case_insensitive {
                InstitutionMatch::CaseInsensitive
            } else {
                InstitutionMatch::CaseSensitive
            },
        }
    }

    pub fn sources(&self) -> Option<&[String]> {
        self.data.as_ref().and_then(|d| d.sources.as_deref())
    }
}

/// Platform config directory path: `<config_dir>/paperscope/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("paperscope").join("config.toml"))
}

/// Load config by cascading CWD `.paperscope.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".paperscope.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        data: Some(DataConfig {
            sources: overlay
                .data
                .as_ref()
                .and_then(|d| d.sources.clone())
                .or_else(|| base.data.as_ref().and_then(|d| d.sources.clone())),
            sample_fallback: overlay
                .data
                .as_ref()
                .and_then(|d| d.sample_fallback)
                .or_else(|| base.data.as_ref().and_then(|d| d.sample_fallback)),
            sample_seed: overlay
                .data
                .as_ref()
                .and_then(|d| d.sample_seed)
                .or_else(|| base.data.as_ref().and_then(|d| d.sample_seed)),
            timeout_secs: overlay
                .data
                .as_ref()
                .and_then(|d| d.timeout_secs)
                .or_else(|| base.data.as_ref().and_then(|d| d.timeout_secs)),
        }),
        query: Some(QueryConfig {
            case_insensitive_institutions: overlay
                .query
                .as_ref()
                .and_then(|q| q.case_insensitive_institutions)
                .or_else(|| {
                    base.query
                        .as_ref()
                        .and_then(|q| q.case_insensitive_institutions)
                }),
        }),
        display: Some(DisplayConfig {
            color: overlay
                .display
                .as_ref()
                .and_then(|d| d.color)
                .or_else(|| base.display.as_ref().and_then(|d| d.color)),
            abstract_preview_chars: overlay
                .display
                .as_ref()
                .and_then(|d| d.abstract_preview_chars)
                .or_else(|| {
                    base.display
                        .as_ref()
                        .and_then(|d| d.abstract_preview_chars)
                }),
        }),
    }
}

/// Save the config to the platform config directory.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf, ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_to_path(config, &path)?;
    Ok(path)
}

pub fn save_to_path(config: &ConfigFile, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
