use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::fixtures::DEFAULT_AUDITOR_ID;
use crate::mock_store::MockBehavior;

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend selection
    pub api: ApiConfig,
    /// Mock backend behaviour
    pub mock: MockConfig,
    /// Signed-in auditor
    pub auditor: AuditorConfig,
    /// Upload rules
    pub knowledge: KnowledgeConfig,
    /// Dashboard layout
    pub dashboard: DashboardConfig,
    /// Logging output
    pub logging: LoggingConfig,
}

/// Backend selection. `use_mock` is the single mock/real toggle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Use the in-memory mock instead of HTTP
    pub use_mock: bool,
    /// Root URL of the REST backend
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

/// Latency and failure injection for the mock backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockConfig {
    /// Delay for ordinary calls
    pub latency_ms: u64,
    /// Delay for regeneration calls
    pub regenerate_latency_ms: u64,
    /// Probability of a simulated network failure
    pub failure_rate: f64,
}

/// Auditor whose data is shown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditorConfig {
    /// Auditor id used as the foreign key on messages and items
    pub id: String,
}

/// Knowledge base settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Upload extensions with a leading dot, e.g. `.txt`
    pub accepted_types: Vec<String>,
}

/// Dashboard settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Entries in the recent-activity feed
    pub recent_activity_limit: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum level (trace, debug, info, warn, error)
    pub level: String,
    /// Rolling log file, if any
    pub file_path: Option<String>,
    /// Console format: `text` or `json`
    pub format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                use_mock: true,
                base_url: "https://api.example.com".to_string(),
                timeout_secs: 30,
            },
            mock: MockConfig {
                latency_ms: 300,
                regenerate_latency_ms: 500,
                failure_rate: 0.0,
            },
            auditor: AuditorConfig { id: DEFAULT_AUDITOR_ID.to_string() },
            knowledge: KnowledgeConfig { accepted_types: vec![".txt".to_string()] },
            dashboard: DashboardConfig { recent_activity_limit: 4 },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// defaults, `config/default`, `config/local`, `extra_file`, then
    /// `AUDITOR_DASHBOARD__SECTION__KEY` environment variables.
    pub fn load(extra_file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        for (key, value) in Self::default().flatten() {
            builder = builder.set_default(key, value)?;
        }

        builder = builder
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = extra_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("AUDITOR_DASHBOARD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("knowledge.accepted_types"),
            )
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate API config
        if !self.api.use_mock {
            if self.api.base_url.trim().is_empty() {
                return Err(anyhow::anyhow!("base_url is required when use_mock is false"));
            }
            if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
                return Err(anyhow::anyhow!("base_url must start with http:// or https://"));
            }
        }
        if self.api.timeout_secs == 0 {
            return Err(anyhow::anyhow!("timeout_secs must be greater than 0"));
        }

        // Validate mock config
        if !(0.0..=1.0).contains(&self.mock.failure_rate) {
            return Err(anyhow::anyhow!("failure_rate must be between 0.0 and 1.0"));
        }

        if self.auditor.id.trim().is_empty() {
            return Err(anyhow::anyhow!("auditor id cannot be empty"));
        }

        // Validate knowledge config
        if self.knowledge.accepted_types.is_empty() {
            return Err(anyhow::anyhow!("accepted_types must list at least one extension"));
        }
        if let Some(bad) = self
            .knowledge
            .accepted_types
            .iter()
            .find(|ext| !ext.starts_with('.') || ext.len() < 2)
        {
            return Err(anyhow::anyhow!("Invalid accepted type: {}. Extensions must look like .txt", bad));
        }

        if self.dashboard.recent_activity_limit == 0 {
            return Err(anyhow::anyhow!("recent_activity_limit must be greater than 0"));
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        Ok(())
    }

    /// Mock backend behaviour derived from the `mock` section
    #[must_use]
    pub const fn mock_behavior(&self) -> MockBehavior {
        MockBehavior {
            latency: Duration::from_millis(self.mock.latency_ms),
            regenerate_latency: Duration::from_millis(self.mock.regenerate_latency_ms),
            failure_rate: self.mock.failure_rate,
        }
    }

    /// Per-request timeout for the HTTP backend
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Get log level from environment or config
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }

    /// Render the effective configuration as YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Flatten the configuration into dotted key-value pairs
    fn flatten(self) -> Vec<(&'static str, config::Value)> {
        let mut map = vec![
            ("api.use_mock", config::Value::from(self.api.use_mock)),
            ("api.base_url", config::Value::from(self.api.base_url)),
            ("api.timeout_secs", config::Value::from(self.api.timeout_secs)),
            ("mock.latency_ms", config::Value::from(self.mock.latency_ms)),
            ("mock.regenerate_latency_ms", config::Value::from(self.mock.regenerate_latency_ms)),
            ("mock.failure_rate", config::Value::from(self.mock.failure_rate)),
            ("auditor.id", config::Value::from(self.auditor.id)),
            ("knowledge.accepted_types", config::Value::from(self.knowledge.accepted_types)),
            ("dashboard.recent_activity_limit", config::Value::from(self.dashboard.recent_activity_limit as u64)),
            ("logging.level", config::Value::from(self.logging.level)),
            ("logging.format", config::Value::from(self.logging.format)),
        ];
        if let Some(file_path) = self.logging.file_path {
            map.push(("logging.file_path", config::Value::from(file_path)));
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.api.use_mock);
        assert_eq!(config.auditor.id, "auditor-1");
        assert_eq!(config.knowledge.accepted_types, vec![".txt"]);
    }

    #[test]
    fn test_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = AppConfig::default();
        config.mock.failure_rate = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_flatten_covers_required_keys() {
        let keys: Vec<_> = AppConfig::default().flatten().into_iter().map(|(k, _)| k).collect();
        assert!(keys.contains(&"api.use_mock"));
        assert!(keys.contains(&"knowledge.accepted_types"));
        assert!(!keys.contains(&"logging.file_path"));
    }
}
