// ABOUTME: JSON file store for registry settings.
// ABOUTME: Missing file reads as defaults; writes replace the whole file atomically.

use super::settings::RegistrySettings;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

pub const DEFAULT_REGISTRY_FILE: &str = "config/registry.json";

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid registry settings in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Serializes access to the settings file within this process.
#[derive(Debug)]
pub struct RegistryStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl RegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<RegistrySettings, RegistryError> {
        let _guard = self.lock.lock();
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(RegistrySettings::default());
            }
            Err(source) => {
                return Err(RegistryError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_str(&content).map_err(|source| RegistryError::Json {
            path: self.path.clone(),
            source,
        })
    }

    pub fn save(&self, settings: &RegistrySettings) -> Result<(), RegistryError> {
        let _guard = self.lock.lock();
        let io_err = |source| RegistryError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(settings).map_err(|source| RegistryError::Json {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;

        tracing::info!(path = %self.path.display(), "registry settings saved");
        Ok(())
    }
}
