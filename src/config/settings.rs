//! User settings for envelope-crypto
//!
//! Holds the default stretching cost, request service limits and the log
//! filter. Every field has a default so partial files load cleanly.

use serde::{Deserialize, Serialize};

use super::paths::EnvelopePaths;
use crate::crypto::kdf::RECOMMENDED_COST;
use crate::error::{EnvelopeError, EnvelopeResult};

/// Key derivation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfSettings {
    /// Iterations used when a request does not name a cost
    pub default_cost: u32,
    /// Requests asking for fewer iterations are refused
    pub min_cost: u32,
}

impl Default for KdfSettings {
    fn default() -> Self {
        Self {
            default_cost: RECOMMENDED_COST,
            min_cost: 1,
        }
    }
}

impl KdfSettings {
    /// Pick the requested cost or the default, refusing anything below `min_cost`
    pub fn resolve_cost(&self, requested: Option<u32>) -> EnvelopeResult<u32> {
        let cost = requested.unwrap_or(self.default_cost);
        if cost < self.min_cost {
            return Err(EnvelopeError::Format(format!(
                "Cost {} is below the configured minimum {}",
                cost, self.min_cost
            )));
        }
        Ok(cost)
    }
}

/// Request service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Deadline for one request, in seconds
    pub request_timeout_secs: u64,
    /// Requests allowed to execute at the same time
    pub max_in_flight: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_in_flight: 8,
        }
    }
}

/// User settings for envelope-crypto
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub kdf: KdfSettings,

    #[serde(default)]
    pub service: ServiceSettings,

    /// tracing filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            kdf: KdfSettings::default(),
            service: ServiceSettings::default(),
            log_filter: default_log_filter(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or use defaults if the file doesn't exist
    pub fn load_or_create(paths: &EnvelopePaths) -> Result<Self, EnvelopeError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| EnvelopeError::Io(format!("Failed to read settings file: {}", e)))?;

        let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
            EnvelopeError::Config(format!("Failed to parse settings file: {}", e))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self, paths: &EnvelopePaths) -> Result<(), EnvelopeError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| EnvelopeError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| EnvelopeError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        if self.kdf.min_cost == 0 {
            return Err(EnvelopeError::Config("kdf.min_cost must be at least 1".into()));
        }
        if self.kdf.default_cost < self.kdf.min_cost {
            return Err(EnvelopeError::Config(
                "kdf.default_cost is below kdf.min_cost".into(),
            ));
        }
        if self.service.max_in_flight == 0 {
            return Err(EnvelopeError::Config(
                "service.max_in_flight must be at least 1".into(),
            ));
        }
        if self.service.request_timeout_secs == 0 {
            return Err(EnvelopeError::Config(
                "service.request_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
