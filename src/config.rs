//! Grid configuration loaded from `gridedit.toml`.
//!
//! Every section is optional; a missing file or a partial file falls back to
//! defaults field by field. Unknown keys are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use tracing::info;

use crate::domain::validation::ValidationMessages;

pub const CONFIG_FILE_NAME: &str = "gridedit.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GridSection {
    pub new_row_id_prefix: String,
}

impl Default for GridSection {
    fn default() -> Self {
        Self {
            new_row_id_prefix: "new-".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub grid: GridSection,
    pub messages: ValidationMessages,
    pub storage: StorageSection,
}

impl GridConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("failed to parse grid config")
    }

    /// Missing file means defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(target: "config", path = %path.display(), "config file absent, using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let config = Self::from_toml_str(&raw)?;
        info!(target: "config", path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(path.clone()),
            None => default_db_path(),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "gridedit", "gridedit")
        .ok_or_else(|| anyhow!("failed to resolve project directories"))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join(CONFIG_FILE_NAME))
}

pub fn default_db_path() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join("grid.sqlite"))
}
