//! TOML-based configuration.
//!
//! Covers the prediction service endpoint, what to ask it for, how often the
//! telemetry simulation ticks, and an optional seed for reproducible runs.
//! Every field has a default, so an empty file is a valid configuration.
//! `PAWSENSE_SERVICE_URL` overrides `service.base_url`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::CollarError;
use crate::fallback::MAX_FALLBACK_STEPS;
use crate::types::{CountdownStyle, PredictionRequest};

/// Environment variable overriding the service base URL
pub const SERVICE_URL_ENV: &str = "PAWSENSE_SERVICE_URL";

/// Prediction service location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Request timeout; the HTTP client's own default applies when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// What to ask the service for and how to show it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionConfig {
    #[serde(default = "default_current_activity")]
    pub current_activity: String,
    #[serde(default = "default_max_depth")]
    pub max_depth: u8,
    #[serde(default)]
    pub style: CountdownStyle,
}

/// Periodic refresh settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_telemetry_interval")]
    pub telemetry_interval_secs: u64,
}

/// Randomness settings for mock telemetry and placeholder chains.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PawsenseConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub prediction: PredictionConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

fn default_base_url() -> String {
    "https://pawsense-ifaz.onrender.com".to_string()
}

fn default_endpoint() -> String {
    "/predict_chain".to_string()
}

fn default_current_activity() -> String {
    "Feeding".to_string()
}

fn default_max_depth() -> u8 {
    MAX_FALLBACK_STEPS
}

fn default_telemetry_interval() -> u64 {
    3
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            endpoint: default_endpoint(),
            timeout_secs: None,
        }
    }
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            current_activity: default_current_activity(),
            max_depth: default_max_depth(),
            style: CountdownStyle::default(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            telemetry_interval_secs: default_telemetry_interval(),
        }
    }
}

impl ServiceConfig {
    /// Full request URL: base joined with the endpoint path
    pub fn url(&self) -> Result<url::Url, CollarError> {
        let base = url::Url::parse(&self.base_url)
            .map_err(|e| CollarError::ConfigError(format!("service.base_url: {}", e)))?;
        base.join(&self.endpoint)
            .map_err(|e| CollarError::ConfigError(format!("service.endpoint: {}", e)))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl PawsenseConfig {
    /// Parse from TOML text and validate.
    pub fn from_toml_str(content: &str) -> Result<Self, CollarError> {
        let config: PawsenseConfig =
            toml::from_str(content).map_err(|e| CollarError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, CollarError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides(std::env::var(SERVICE_URL_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for runs without a config file.
    pub fn from_env() -> Result<Self, CollarError> {
        let mut config = Self::default();
        config.apply_env_overrides(std::env::var(SERVICE_URL_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self, service_url: Option<String>) {
        if let Some(url) = service_url.filter(|u| !u.trim().is_empty()) {
            self.service.base_url = url;
        }
    }

    pub fn validate(&self) -> Result<(), CollarError> {
        self.service.url()?;

        if self.prediction.current_activity.trim().is_empty() {
            return Err(CollarError::ConfigError(
                "prediction.current_activity must not be empty".to_string(),
            ));
        }

        if !(1..=MAX_FALLBACK_STEPS).contains(&self.prediction.max_depth) {
            return Err(CollarError::ConfigError(format!(
                "prediction.max_depth must be between 1 and {}",
                MAX_FALLBACK_STEPS
            )));
        }

        if self.refresh.telemetry_interval_secs == 0 {
            return Err(CollarError::ConfigError(
                "refresh.telemetry_interval_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// The request this configuration describes
    pub fn request(&self) -> PredictionRequest {
        PredictionRequest::new(self.prediction.current_activity.clone())
            .with_max_depth(self.prediction.max_depth)
    }

    pub fn telemetry_interval(&self) -> Duration {
        Duration::from_secs(self.refresh.telemetry_interval_secs)
    }
}
