use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::store::FileStore;
use crate::Result;

/// Runtime settings.
///
/// Layered lowest to highest: built-in defaults, `<data_dir>/settings.json`,
/// then `ROUTEBOOK_*` environment variables (e.g. `ROUTEBOOK_DATA_DIR`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutebookConfig {
    /// Directory holding one JSON file per storage key.
    pub data_dir: PathBuf,
    /// Seed sample policies and user groups into an empty store on first list.
    pub seed_samples: bool,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for RoutebookConfig {
    fn default() -> Self {
        Self {
            data_dir: crate::data_dir(),
            seed_samples: true,
            log_filter: "info".to_string(),
        }
    }
}

impl RoutebookConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(&crate::data_dir())
    }

    /// Load using `dir` as the default data directory and settings location.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let defaults = Self {
            data_dir: dir.to_path_buf(),
            ..Self::default()
        };
        let cfg = Config::builder()
            .set_default("data_dir", defaults.data_dir.to_string_lossy().to_string())?
            .set_default("seed_samples", defaults.seed_samples)?
            .set_default("log_filter", defaults.log_filter)?
            .add_source(File::from(settings_path(dir)).required(false))
            .add_source(Environment::with_prefix("ROUTEBOOK").try_parsing(true))
            .build()?;
        Ok(cfg.try_deserialize()?)
    }

    pub fn file_store(&self) -> FileStore {
        FileStore::new(&self.data_dir)
    }
}

pub fn settings_path(dir: &Path) -> PathBuf {
    dir.join("settings.json")
}
