use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Disk,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,
    /// Seconds a refreshed rate stays valid
    #[serde(default = "default_life_time_secs")]
    pub life_time_secs: u64,
    /// Directory of the disk cache, defaults to the project data directory
    pub path: Option<String>,
}

fn default_life_time_secs() -> u64 {
    10
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            backend: CacheBackend::default(),
            life_time_secs: default_life_time_secs(),
            path: None,
        }
    }
}

impl CacheConfig {
    pub fn life_time(&self) -> Duration {
        Duration::from_secs(self.life_time_secs)
    }

    pub fn data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.path {
            return Ok(PathBuf::from(custom_path));
        }
        Ok(AppConfig::project_dirs()?.data_dir().join("cache"))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SourceConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub openrates: Option<SourceConfig>,
    pub exchange_rate: Option<SourceConfig>,
    #[serde(default = "default_retries")]
    pub retries: usize,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_retries() -> usize {
    2
}

fn default_retry_delay_ms() -> u64 {
    300
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            openrates: Some(SourceConfig {
                base_url: "http://api.openrates.io".to_string(),
            }),
            exchange_rate: Some(SourceConfig {
                base_url: "https://api.exchangerate-api.com".to_string(),
            }),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_supported_currencies() -> Vec<String> {
    ["USD", "EUR", "ILS"].iter().map(|c| c.to_string()).collect()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default = "default_supported_currencies")]
    pub supported_currencies: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            server: ServerConfig::default(),
            cache: CacheConfig::default(),
            providers: ProvidersConfig::default(),
            supported_currencies: default_supported_currencies(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, falling back to built-in
    /// defaults when no file exists there.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.yaml"))
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("io", "quotes", "quotes-api")
            .context("Could not determine project directories")
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.validate()?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.supported_currencies.len() < 2 {
            anyhow::bail!("At least two supported currencies are required");
        }
        if let Some(bad) = self
            .supported_currencies
            .iter()
            .find(|c| c.len() != 3 || !c.chars().all(|ch| ch.is_ascii_uppercase()))
        {
            anyhow::bail!("Invalid currency code in supported_currencies: {bad}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_defaults_from_empty_document() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.cache.life_time(), Duration::from_secs(10));
        assert_eq!(config.supported_currencies, vec!["USD", "EUR", "ILS"]);
        assert_eq!(
            config.providers.openrates.unwrap().base_url,
            "http://api.openrates.io"
        );
        assert_eq!(config.providers.retries, 2);
    }

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
server:
  port: 9000
cache:
  backend: disk
  life_time_secs: 60
  path: "/tmp/quotes-cache"
providers:
  openrates:
    base_url: "http://example.com/openrates"
  exchange_rate:
    base_url: "http://example.com/exchange"
  retries: 0
supported_currencies: ["USD", "GBP", "JPY", "EUR"]
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.cache.backend, CacheBackend::Disk);
        assert_eq!(config.cache.life_time_secs, 60);
        assert_eq!(
            config.cache.data_path().unwrap(),
            PathBuf::from("/tmp/quotes-cache")
        );
        assert_eq!(
            config.providers.exchange_rate.unwrap().base_url,
            "http://example.com/exchange"
        );
        assert_eq!(config.providers.retries, 0);
        assert_eq!(config.providers.retry_delay_ms, 300);
        assert_eq!(config.supported_currencies.len(), 4);
    }

    #[test]
    fn test_load_from_path_rejects_bad_currency_codes() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "supported_currencies: [\"USD\", \"eur\"]\n").unwrap();

        let err = AppConfig::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid currency code"));
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        let err = AppConfig::load_from_path("/nonexistent/quotes/config.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
