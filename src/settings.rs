//! Session settings.
//!
//! Carries the session-negotiated limits this core consumes. Values are
//! read-only input here; negotiation itself happens in the capability
//! exchange outside this crate.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// RemoteApp session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RailSettings {
    /// Number of icon caches granted by the server.
    pub num_icon_caches: u32,

    /// Entries per icon cache.
    pub num_icon_cache_entries: u32,
}

impl Default for RailSettings {
    fn default() -> Self {
        Self {
            num_icon_caches: 3,
            num_icon_cache_entries: 12,
        }
    }
}

impl RailSettings {
    /// Load settings from a TOML file, falling back to defaults on any error.
    pub fn load_from_file(path: &str) -> Result<Self> {
        debug!("Loading settings from {}", path);

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<RailSettings>(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {}", path);
                    Ok(settings)
                }
                Err(err) => {
                    warn!("Failed to parse settings file {}: {}, using defaults", path, err);
                    Ok(Self::default())
                }
            },
            Err(err) => {
                warn!("Failed to read settings file {}: {}, using defaults", path, err);
                Ok(Self::default())
            }
        }
    }
}
