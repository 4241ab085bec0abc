//! JSON-backed service store
//!
//! Plays the host's part: keeps the saved services, the selected id and the
//! released-id pool in one file next to the global settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants::{config, defaults};
use crate::host::{HostState, ServiceInstance, ServiceStore};
use crate::profiles::ServiceId;

/// On-disk layout of the store file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: GlobalSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_service_id: Option<ServiceId>,
    #[serde(default)]
    pub available_ids: Vec<ServiceId>,
    #[serde(default)]
    pub services: Vec<ServiceInstance>,
}

/// Settings that apply to the whole store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSettings {
    #[serde(default = "default_service_limit")]
    pub service_limit: usize,
}

fn default_service_limit() -> usize {
    defaults::SERVICE_LIMIT
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            service_limit: default_service_limit(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            global: GlobalSettings::default(),
            selected_service_id: None,
            available_ids: Vec::new(),
            services: Vec::new(),
        }
    }
}

impl Config {
    /// Default store location, honoring the directory override variable
    pub fn path() -> PathBuf {
        let mut path = match std::env::var_os(config::DIR_ENV_VAR) {
            Some(dir) => PathBuf::from(dir),
            None => {
                let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
                path.push(config::APP_DIR);
                path
            }
        };
        path.push(config::FILENAME);
        path
    }

    /// Load the store file, creating it with defaults if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Service store not found, creating default at {:?}", path);
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read service store from {:?}", path))?;

        let config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON from {:?}", path))?;

        info!("Loaded service store with {} service(s)", config.services.len());
        Ok(config)
    }

    /// Write the store file through a temporary sibling and rename
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let json_string =
            serde_json::to_string_pretty(self).context("Failed to serialize service store to JSON")?;

        let tmp_path = path.with_extension(format!(
            "{}.{}",
            path.extension().and_then(|e| e.to_str()).unwrap_or_default(),
            config::TMP_SUFFIX
        ));
        fs::write(&tmp_path, json_string)
            .with_context(|| format!("Failed to write service store to {:?}", tmp_path))?;
        fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to move {:?} into place at {:?}", tmp_path, path))?;

        info!("Saved service store to {:?}", path);
        Ok(())
    }
}

/// [`ServiceStore`] over a single JSON file
pub struct JsonStore {
    path: PathBuf,
    config: Config,
}

impl JsonStore {
    /// Open (or create) the store at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = Config::load_from(&path)?;
        Ok(Self { path, config })
    }

    /// Open the store at the default location
    pub fn open_default() -> Result<Self> {
        Self::open(Config::path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl ServiceStore for JsonStore {
    fn load(&self) -> Result<HostState> {
        Ok(HostState {
            services: self.config.services.clone(),
            selected_id: self.config.selected_service_id,
            available_ids: self.config.available_ids.clone(),
        })
    }

    fn save(&mut self, state: &HostState) -> Result<()> {
        let mut updated = self.config.clone();
        updated.services = state.services.clone();
        updated.selected_service_id = state.selected_id;
        updated.available_ids = state.available_ids.clone();

        updated.save_to(&self.path)?;
        debug!(services = updated.services.len(), "Service store updated");
        self.config = updated;
        Ok(())
    }

    fn service_limit(&self) -> usize {
        self.config.global.service_limit
    }
}
