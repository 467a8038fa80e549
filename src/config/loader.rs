//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config.toml
//! structure. Secrets (API keys, the wallet cipher key) come from the
//! environment and override their config-file counterparts.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub solana: SolanaSection,
    pub ton: TonSection,
    #[serde(default)]
    pub jupiter: JupiterSection,
    #[serde(default)]
    pub stonfi: StonfiSection,
    #[serde(default)]
    pub pricing: PricingSection,
    #[serde(default)]
    pub executor: ExecutorSection,
    #[serde(default)]
    pub secrets: SecretsSection,
    pub logging: LoggingSection,
}

/// Solana RPC configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct SolanaSection {
    /// RPC endpoints in failover order (use a private RPC for production)
    pub rpc_urls: Vec<String>,
}

/// TON RPC configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct TonSection {
    /// toncenter-compatible endpoints in failover order
    pub toncenter_urls: Vec<String>,
    /// TonAPI base URL (jetton wallet resolution, jetton rates)
    #[serde(default = "default_tonapi_url")]
    pub tonapi_url: String,
    /// toncenter API key (TON_API_KEY env var overrides)
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_tonapi_url() -> String {
    "https://tonapi.io".to_string()
}

impl TonSection {
    /// API key with environment variable override
    pub fn get_api_key(&self) -> Option<String> {
        std::env::var("TON_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.is_empty()))
    }
}

/// Jupiter API configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct JupiterSection {
    /// Swap API base URL
    #[serde(default = "default_jupiter_swap_url")]
    pub api_url: String,
    /// Price API base URL
    #[serde(default = "default_jupiter_price_url")]
    pub price_api_url: String,
    /// Optional API key for higher rate limits (JUPITER_API_KEY overrides)
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_jupiter_swap_url() -> String {
    "https://api.jup.ag/swap/v1".to_string()
}

fn default_jupiter_price_url() -> String {
    "https://api.jup.ag".to_string()
}

impl Default for JupiterSection {
    fn default() -> Self {
        Self {
            api_url: default_jupiter_swap_url(),
            price_api_url: default_jupiter_price_url(),
            api_key: None,
        }
    }
}

impl JupiterSection {
    /// API key with environment variable override
    pub fn get_api_key(&self) -> Option<String> {
        std::env::var("JUPITER_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.is_empty()))
    }
}

/// STON.fi API configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct StonfiSection {
    #[serde(default = "default_stonfi_url")]
    pub api_url: String,
}

fn default_stonfi_url() -> String {
    "https://api.ston.fi".to_string()
}

impl Default for StonfiSection {
    fn default() -> Self {
        Self {
            api_url: default_stonfi_url(),
        }
    }
}

/// Quote router configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct PricingSection {
    /// Per-provider quote timeout in seconds
    #[serde(default = "default_quote_timeout_secs")]
    pub quote_timeout_secs: u64,
}

fn default_quote_timeout_secs() -> u64 {
    5
}

impl Default for PricingSection {
    fn default() -> Self {
        Self {
            quote_timeout_secs: default_quote_timeout_secs(),
        }
    }
}

impl PricingSection {
    pub fn quote_timeout(&self) -> Duration {
        Duration::from_secs(self.quote_timeout_secs)
    }
}

/// Swap executor configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorSection {
    /// Broadcast + acknowledgement deadline in seconds
    #[serde(default = "default_submit_timeout_secs")]
    pub submit_timeout_secs: u64,
    /// Total attempts on explicit network rejection
    #[serde(default = "default_max_submit_attempts")]
    pub max_submit_attempts: u32,
    /// Pause before the reconciliation balance read, in milliseconds
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

fn default_submit_timeout_secs() -> u64 {
    30
}

fn default_max_submit_attempts() -> u32 {
    3
}

fn default_settle_delay_ms() -> u64 {
    2_000
}

impl Default for ExecutorSection {
    fn default() -> Self {
        Self {
            submit_timeout_secs: default_submit_timeout_secs(),
            max_submit_attempts: default_max_submit_attempts(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

/// Custodial secrets configuration section
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SecretsSection {
    /// Base64-encoded 32-byte AES key. Prefer the COTRADER_ENCRYPTION_KEY
    /// env var over committing this to a file. The key is fixed for the
    /// lifetime of the deployment; rotating it orphans stored secrets.
    #[serde(default)]
    pub encryption_key: Option<String>,
}

impl SecretsSection {
    /// Cipher key with environment variable override
    pub fn get_encryption_key(&self) -> Option<String> {
        std::env::var("COTRADER_ENCRYPTION_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.encryption_key.clone().filter(|k| !k.is_empty()))
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.solana.rpc_urls.is_empty() {
            return Err(ConfigError::ValidationError(
                "solana.rpc_urls cannot be empty".to_string(),
            ));
        }

        if self.ton.toncenter_urls.is_empty() {
            return Err(ConfigError::ValidationError(
                "ton.toncenter_urls cannot be empty".to_string(),
            ));
        }

        if self.jupiter.api_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "jupiter.api_url cannot be empty".to_string(),
            ));
        }

        if self.stonfi.api_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "stonfi.api_url cannot be empty".to_string(),
            ));
        }

        if self.pricing.quote_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(format!(
                "pricing.quote_timeout_secs must be > 0, got {}",
                self.pricing.quote_timeout_secs
            )));
        }

        if self.executor.max_submit_attempts == 0 {
            return Err(ConfigError::ValidationError(format!(
                "executor.max_submit_attempts must be > 0, got {}",
                self.executor.max_submit_attempts
            )));
        }

        if self.executor.submit_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(format!(
                "executor.submit_timeout_secs must be > 0, got {}",
                self.executor.submit_timeout_secs
            )));
        }

        Ok(())
    }
}

// Conversion to the executor's runtime config
impl From<&ExecutorSection> for crate::application::ExecutorConfig {
    fn from(section: &ExecutorSection) -> Self {
        Self {
            submit_timeout: Duration::from_secs(section.submit_timeout_secs),
            max_submit_attempts: section.max_submit_attempts,
            settle_delay: Duration::from_millis(section.settle_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[solana]
rpc_urls = [
    "https://api.mainnet-beta.solana.com",
    "https://solana-rpc.publicnode.com",
]

[ton]
toncenter_urls = ["https://toncenter.com/api/v2"]
tonapi_url = "https://tonapi.io"

[jupiter]
api_url = "https://api.jup.ag/swap/v1"
price_api_url = "https://api.jup.ag"

[stonfi]
api_url = "https://api.ston.fi"

[pricing]
quote_timeout_secs = 5

[executor]
submit_timeout_secs = 30
max_submit_attempts = 3
settle_delay_ms = 2000

[secrets]
encryption_key = "MzI2NDUzMjE0NTY3ODkwMTIzNDU2Nzg5MDEyMzQ1Njc="

[logging]
level = "info"
"#
        .to_string()
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(create_valid_config().as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();

        assert_eq!(config.solana.rpc_urls.len(), 2);
        assert_eq!(config.ton.toncenter_urls.len(), 1);
        assert_eq!(config.pricing.quote_timeout_secs, 5);
        assert_eq!(config.executor.max_submit_attempts, 3);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.toml");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let minimal = r#"
[solana]
rpc_urls = ["https://api.mainnet-beta.solana.com"]

[ton]
toncenter_urls = ["https://toncenter.com/api/v2"]

[logging]
level = "warn"
"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(minimal.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.jupiter.api_url, "https://api.jup.ag/swap/v1");
        assert_eq!(config.stonfi.api_url, "https://api.ston.fi");
        assert_eq!(config.executor.submit_timeout_secs, 30);
        assert_eq!(config.pricing.quote_timeout_secs, 5);
    }

    #[test]
    fn test_empty_rpc_list_rejected() {
        let invalid = r#"
[solana]
rpc_urls = []

[ton]
toncenter_urls = ["https://toncenter.com/api/v2"]

[logging]
level = "info"
"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(invalid.as_bytes()).unwrap();

        let result = load_config(file.path());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let invalid =
            create_valid_config().replace("max_submit_attempts = 3", "max_submit_attempts = 0");
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(invalid.as_bytes()).unwrap();

        let result = load_config(file.path());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_executor_section_conversion() {
        let section = ExecutorSection {
            submit_timeout_secs: 10,
            max_submit_attempts: 2,
            settle_delay_ms: 500,
        };
        let config = crate::application::ExecutorConfig::from(&section);
        assert_eq!(config.submit_timeout, Duration::from_secs(10));
        assert_eq!(config.max_submit_attempts, 2);
        assert_eq!(config.settle_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_encryption_key_from_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(create_valid_config().as_bytes()).unwrap();
        let config = load_config(file.path()).unwrap();

        // Env var absent in tests: the config value wins
        if std::env::var("COTRADER_ENCRYPTION_KEY").is_err() {
            assert!(config.secrets.get_encryption_key().is_some());
        }
    }
}
