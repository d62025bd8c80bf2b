//! Configuration management for the file storage server
//!
//! Settings come from built-in defaults, then an optional `config.toml`,
//! then `FILE_STORAGE_*` environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// IP address the HTTP listener binds to
    pub bind_address: String,

    pub port: u16,

    /// Directory all stored content lives under
    pub storage_root: String,

    /// Prefix for public file URLs, e.g. `http://localhost:8080/public`
    pub origin: String,

    /// Shared secret expected in the `X-Internal-Token` header
    pub internal_token: String,

    /// Maximum request body size in MB
    pub max_upload_mb: usize,
}

/// The part of the configuration handed to the storage core
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub root: PathBuf,
    pub origin: String,
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("bind_address", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("storage_root", "./files")?
            .set_default("origin", "http://127.0.0.1:8080/public")?
            .set_default("internal_token", "")?
            .set_default("max_upload_mb", 100)?
            .add_source(File::with_name(config_path).required(false))
            .add_source(Environment::with_prefix("FILE_STORAGE").try_parsing(true))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Message("port cannot be 0".into()));
        }

        if self.storage_root.trim().is_empty() {
            return Err(ConfigError::Message("storage_root cannot be empty".into()));
        }

        if self.origin.trim().is_empty() {
            return Err(ConfigError::Message("origin cannot be empty".into()));
        }

        if self.internal_token.is_empty() {
            return Err(ConfigError::Message(
                "internal_token must be set (FILE_STORAGE_INTERNAL_TOKEN)".into(),
            ));
        }

        if self.max_upload_mb == 0 {
            return Err(ConfigError::Message(
                "max_upload_mb must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Bind address and port as a socket address string
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn storage_root_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_root)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }

    pub fn storage(&self) -> StorageConfig {
        StorageConfig {
            root: self.storage_root_path(),
            origin: self.origin.clone(),
        }
    }
}
