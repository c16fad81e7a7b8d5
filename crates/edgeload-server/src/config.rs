//! Service configuration.
//!
//! Values are layered, later layers winning:
//!
//! - built-in defaults ([`ServerConfig::default`])
//! - an optional YAML file
//! - `EDGELOAD_*` environment variables, with `__` between nested keys
//!   (`EDGELOAD_LOADER__WIDEN_BATCHES=false` sets `loader.widen_batches`)
//!
//! ```ignore
//! let config = ServerConfig::load("edgeload.yaml")?;
//! let factory = RequestFactory::bootstrap(MemoryDataStore::new_shared(), &config).await?;
//! ```

use std::fmt;
use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use edgeload_domain::LoaderConfig;
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "EDGELOAD";

/// Top-level configuration. Every section may be omitted.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub environment: RuntimeEnvironment,
    pub loader: LoaderSettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
    pub seed: SeedSettings,
}

/// Deployment environment. Seeding only happens in `development`.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Test,
    Production,
}

impl fmt::Display for RuntimeEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RuntimeEnvironment::Development => "development",
            RuntimeEnvironment::Test => "test",
            RuntimeEnvironment::Production => "production",
        })
    }
}

/// Relation loader knobs, mirrored into [`LoaderConfig`] for each request.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoaderSettings {
    /// Remember ids that yielded no row, and parents whose children were
    /// fetched.
    pub negative_caching: bool,
    /// Widen each batch with siblings already in the request cache.
    pub widen_batches: bool,
    pub fetch_timeout_ms: u64,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        let loader = LoaderConfig::default();
        Self {
            negative_caching: loader.negative_caching,
            widen_batches: loader.widen_batches,
            fetch_timeout_ms: loader.fetch_timeout.as_millis() as u64,
        }
    }
}

impl LoaderSettings {
    pub fn to_loader_config(&self) -> LoaderConfig {
        LoaderConfig::default()
            .with_negative_caching(self.negative_caching)
            .with_widening(self.widen_batches)
            .with_fetch_timeout(Duration::from_millis(self.fetch_timeout_ms))
    }
}

/// Available data store implementations.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    /// `trace`, `debug`, `info`, `warn` or `error`; case-insensitive.
    pub level: String,
    /// One JSON object per line instead of compact text.
    pub json: bool,
    /// Log a close event with busy/idle timings for every span.
    pub span_timings: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            span_timings: false,
        }
    }
}

/// Demo client registered on startup in development.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SeedSettings {
    pub enabled: bool,
    pub client_name: String,
    pub client_id: String,
    /// Hash of the demo client's secret, produced by the auth layer.
    pub client_secret_hash: String,
}

impl Default for SeedSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            client_name: "Demo App".to_string(),
            client_id: "demo_client".to_string(),
            client_secret_hash: String::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigLoadError {
    fn invalid(message: impl Into<String>) -> Self {
        ConfigLoadError::Invalid {
            message: message.into(),
        }
    }
}

impl ServerConfig {
    /// Loads defaults, then `path`, then environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        Self::layered(Some(path))
    }

    /// Loads defaults, then environment overrides.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        Self::layered(None)
    }

    fn layered(file: Option<&Path>) -> Result<Self, ConfigLoadError> {
        let mut builder = Config::builder().add_source(Config::try_from(&ServerConfig::default())?);
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml));
        }
        let loaded: ServerConfig = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Checks constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.loader.fetch_timeout_ms == 0 {
            return Err(ConfigLoadError::invalid(
                "loader.fetch_timeout_ms must be greater than 0",
            ));
        }
        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(ConfigLoadError::invalid(format!(
                "logging.level is not a log level: {}",
                self.logging.level
            )));
        }
        if self.seed.enabled && self.seed.client_id.trim().is_empty() {
            return Err(ConfigLoadError::invalid(
                "seed.client_id is required when seeding is enabled",
            ));
        }
        Ok(())
    }

    /// Whether the demo client should be seeded on startup.
    pub fn should_seed(&self) -> bool {
        self.seed.enabled && self.environment == RuntimeEnvironment::Development
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn yaml_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    #[serial]
    fn test_yaml_file_sets_every_section() {
        // Arrange
        let file = yaml_file(
            r#"
environment: production
loader:
  negative_caching: false
  fetch_timeout_ms: 2500
storage:
  backend: memory
logging:
  level: debug
  json: true
  span_timings: true
seed:
  enabled: false
"#,
        );

        // Act
        let config = ServerConfig::load(file.path()).unwrap();

        // Assert
        assert_eq!(config.environment, RuntimeEnvironment::Production);
        assert!(!config.loader.negative_caching);
        assert!(config.loader.widen_batches, "unset keys keep their default");
        assert_eq!(config.loader.fetch_timeout_ms, 2500);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert!(config.logging.span_timings);
        assert!(!config.seed.enabled);
        assert_eq!(config.seed.client_id, "demo_client");
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        // Arrange
        let file = yaml_file("loader:\n  fetch_timeout_ms: 1000\nlogging:\n  level: info\n");
        std::env::set_var("EDGELOAD_LOADER__FETCH_TIMEOUT_MS", "750");
        std::env::set_var("EDGELOAD_LOGGING__LEVEL", "warn");

        // Act
        let config = ServerConfig::load(file.path());
        std::env::remove_var("EDGELOAD_LOADER__FETCH_TIMEOUT_MS");
        std::env::remove_var("EDGELOAD_LOGGING__LEVEL");

        // Assert
        let config = config.unwrap();
        assert_eq!(config.loader.fetch_timeout_ms, 750);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    #[serial]
    fn test_from_env_without_file() {
        std::env::set_var("EDGELOAD_ENVIRONMENT", "test");

        let config = ServerConfig::from_env();
        std::env::remove_var("EDGELOAD_ENVIRONMENT");

        let config = config.unwrap();
        assert_eq!(config.environment, RuntimeEnvironment::Test);
        assert_eq!(config.loader, LoaderSettings::default());
        assert!(!config.should_seed());
    }

    #[test]
    #[serial]
    fn test_unknown_backend_is_rejected() {
        let file = yaml_file("storage:\n  backend: postgres\n");

        let err = ServerConfig::load(file.path()).unwrap_err();

        assert!(matches!(err, ConfigLoadError::Load(_)));
    }

    #[test]
    #[serial]
    fn test_missing_or_malformed_file() {
        let err = ServerConfig::load("/nonexistent/edgeload.yaml").unwrap_err();
        assert!(matches!(err, ConfigLoadError::FileNotFound { .. }));

        let file = yaml_file("loader: [unclosed");
        let err = ServerConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Load(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ServerConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("logging.level"));

        let mut config = ServerConfig::default();
        config.loader.fetch_timeout_ms = 0;
        assert!(config.validate().unwrap_err().to_string().contains("fetch_timeout_ms"));

        let mut config = ServerConfig::default();
        config.seed.client_id = " ".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("seed.client_id"));

        // Blank client id is fine when seeding is off
        config.seed.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.environment, RuntimeEnvironment::Development);
        assert!(config.should_seed());
        assert_eq!(config.seed.client_name, "Demo App");
        assert_eq!(config.loader.to_loader_config(), LoaderConfig::default());
    }

    #[test]
    fn test_loader_settings_convert_to_loader_config() {
        let settings = LoaderSettings {
            negative_caching: false,
            widen_batches: false,
            fetch_timeout_ms: 1500,
        };

        let loader = settings.to_loader_config();

        assert!(!loader.negative_caching);
        assert!(!loader.widen_batches);
        assert_eq!(loader.fetch_timeout, Duration::from_millis(1500));
    }
}
