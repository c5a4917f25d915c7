use crate::error::{AdpulseError, AdpulseResult};
use serde::Deserialize;

/// Root application configuration. Loaded from environment variables with
/// the prefix `ADPULSE__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub comparison: ComparisonConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Limits applied to ingest batches at the API boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    #[serde(default = "default_max_field_len")]
    pub max_field_len: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComparisonConfig {
    /// Trailing-window length substituted when a custom range is incomplete.
    #[serde(default = "default_fallback_days")]
    pub fallback_days: u32,
}

// Default functions
fn default_node_id() -> String {
    "adpulse-01".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_max_batch_size() -> usize {
    500_000
}
fn default_max_field_len() -> usize {
    256
}
fn default_fallback_days() -> u32 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            max_field_len: default_max_field_len(),
        }
    }
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            fallback_days: default_fallback_days(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            ingest: IngestConfig::default(),
            comparison: ComparisonConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> AdpulseResult<Self> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("ADPULSE")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder
            .build()
            .map_err(|e| AdpulseError::Config(e.to_string()))?;
        config
            .try_deserialize()
            .map_err(|e| AdpulseError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api.http_port, 8080);
        assert_eq!(config.ingest.max_batch_size, 500_000);
        assert_eq!(config.comparison.fallback_days, 30);
    }
}
