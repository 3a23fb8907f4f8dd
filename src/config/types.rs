use std::fmt;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::cache::CacheConfig;
use super::guards::{GuardConfig, RetryPolicy, RoutesConfig};
use super::logging::LoggingConfig;

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    pub bind_address: String,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub routes: RoutesConfig,
    #[serde(default)]
    pub guards: GuardConfig,
    #[serde(default)]
    pub reconciler: RetryPolicy,
    pub cache: CacheConfig,
}

/// A configuration that parsed but does not make sense.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    EscapeAfterTimeout { escape_after_ms: u64, loading_timeout_ms: u64 },
    DuplicateStoreName(String),
    EmptyValue(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EscapeAfterTimeout {
                escape_after_ms,
                loading_timeout_ms,
            } => write!(
                f,
                "guards.escape_after_ms ({}) must be lower than guards.loading_timeout_ms ({})",
                escape_after_ms, loading_timeout_ms
            ),
            ConfigError::DuplicateStoreName(name) => {
                write!(f, "cache store name '{}' is used more than once", name)
            }
            ConfigError::EmptyValue(field) => write!(f, "{} must not be empty", field),
        }
    }
}

impl std::error::Error for ConfigError {}

impl ConfigV1 {
    /// Checks the invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.guards.escape_after_ms >= self.guards.loading_timeout_ms {
            return Err(ConfigError::EscapeAfterTimeout {
                escape_after_ms: self.guards.escape_after_ms,
                loading_timeout_ms: self.guards.loading_timeout_ms,
            });
        }

        let cache = &self.cache;
        if cache.upstream.trim().is_empty() {
            return Err(ConfigError::EmptyValue("cache.upstream"));
        }
        if cache.static_store == cache.api_store {
            return Err(ConfigError::DuplicateStoreName(cache.static_store.clone()));
        }
        if cache.legacy_store == cache.static_store || cache.legacy_store == cache.api_store {
            return Err(ConfigError::DuplicateStoreName(cache.legacy_store.clone()));
        }
        Ok(())
    }
}

/// Build the figment used by `load_config`: "config.yaml" in the current
/// directory, overridden by `PORTALGATE_` environment variables
/// (nested keys separated by `__`).
pub fn figment() -> Figment {
    Figment::new()
        .merge(Yaml::file("./config.yaml"))
        .merge(Env::prefixed("PORTALGATE_").split("__"))
}

/// Extract and validate a config from any figment.
pub fn extract_config(figment: Figment) -> Result<ConfigV1, String> {
    let config = figment.extract::<Config>().map_err(|e| e.to_string())?;
    let config = match config {
        Config::ConfigV1(c) => c,
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Load config from "config.yaml" plus environment overrides.
pub fn load_config() -> ConfigV1 {
    match extract_config(figment()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() {
    let schema = schema_for!(Config);
    match serde_json::to_string_pretty(&schema) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Error rendering schema: {}", e),
    }
}
