//! SlidePilot configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main SlidePilot configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Plan and render service endpoints
    pub service: ServiceConfig,

    /// Where rendered decks are written
    pub output: OutputConfig,
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        let base_url = self.service.base_url.trim();
        if base_url.is_empty() {
            return Err(eyre::eyre!("service.base-url must not be empty"));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(eyre::eyre!(
                "service.base-url must start with http:// or https:// (got '{}')",
                base_url
            ));
        }

        let filename = self.output.filename.trim();
        if filename.is_empty() {
            return Err(eyre::eyre!("output.filename must not be empty"));
        }
        if filename != self.output.filename {
            return Err(eyre::eyre!(
                "output.filename must not have surrounding whitespace (got '{}')",
                self.output.filename
            ));
        }
        if filename.contains('/') || filename.contains('\\') {
            return Err(eyre::eyre!(
                "output.filename must be a bare file name, not a path (got '{}')",
                filename
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .slidepilot.yml
        let local_config = PathBuf::from(".slidepilot.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/slidepilot/slidepilot.yml
        if let Some(user_config) = user_config_path()
            && user_config.exists()
        {
            match Self::load_from_file(&user_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed here; `load` reports them once logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => [Some(PathBuf::from(".slidepilot.yml")), user_config_path()]
                .into_iter()
                .flatten()
                .collect(),
        };

        candidates
            .iter()
            .filter(|p| p.exists())
            .find_map(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Render the effective configuration as YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config")
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("slidepilot").join("slidepilot.yml"))
}

/// Plan and render service endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL shared by both services
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the plan generation endpoint
    #[serde(rename = "plan-path")]
    pub plan_path: String,

    /// Path of the deck rendering endpoint
    #[serde(rename = "render-path")]
    pub render_path: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            plan_path: "/api/generate-plan".to_string(),
            render_path: "/api/create-slides".to_string(),
            timeout_ms: 300_000,
        }
    }
}

impl ServiceConfig {
    pub fn plan_url(&self) -> String {
        join_url(&self.base_url, &self.plan_path)
    }

    pub fn render_url(&self) -> String {
        join_url(&self.base_url, &self.render_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim().trim_end_matches('/'),
        path.trim().trim_start_matches('/')
    )
}

/// Where rendered decks are written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the deck is saved into
    pub dir: PathBuf,

    /// Fixed file name of the saved deck
    pub filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            filename: crate::DEFAULT_FILENAME.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service.base_url, "http://localhost:8000");
        assert_eq!(config.output.filename, "presentation.pptx");
        assert_eq!(config.service.timeout_ms, 300_000);
        assert!(config.log_level.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_service_urls() {
        let service = ServiceConfig {
            base_url: "https://slides.example.com/".to_string(),
            ..Default::default()
        };
        assert_eq!(service.plan_url(), "https://slides.example.com/api/generate-plan");
        assert_eq!(service.render_url(), "https://slides.example.com/api/create-slides");
    }

    #[test]
    fn test_service_urls_ignore_surrounding_whitespace() {
        let service = ServiceConfig {
            base_url: " http://10.0.0.5:9000/ \n".to_string(),
            plan_path: " /api/generate-plan".to_string(),
            ..Default::default()
        };
        assert_eq!(service.plan_url(), "http://10.0.0.5:9000/api/generate-plan");
        assert_eq!(service.render_url(), "http://10.0.0.5:9000/api/create-slides");

        let config = Config {
            service,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_yaml_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("slidepilot.yml");
        fs::write(
            &path,
            "log-level: debug\nservice:\n  base-url: http://10.0.0.5:9000\noutput:\n  dir: /tmp/decks\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.service.base_url, "http://10.0.0.5:9000");
        assert_eq!(config.service.plan_path, "/api/generate-plan");
        assert_eq!(config.output.dir, PathBuf::from("/tmp/decks"));
        assert_eq!(config.output.filename, "presentation.pptx");

        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("debug"));
    }

    #[test]
    fn test_load_explicit_missing_file_errors() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.yml");
        assert!(Config::load(Some(&path)).is_err());
        assert!(Config::load_log_level(Some(&path)).is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.service.base_url = "localhost:8000".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.output.filename = "decks/out.pptx".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.output.filename = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.output.filename = " presentation.pptx".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_round_trip_uses_kebab_keys() {
        let yaml = Config::default().to_yaml().unwrap();
        assert!(yaml.contains("base-url"));
        assert!(yaml.contains("render-path"));
        assert!(!yaml.contains("log-level"));
    }
}
