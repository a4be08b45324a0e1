//! Configuration loading and management.
//!
//! Loads configuration from embedded config.toml. The `wu-token` binary also applies
//! environment variable overrides; the DLL never does, since its environment belongs to
//! whichever process loaded it.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use url::Url;
use uuid::Uuid;

/// Embedded configuration file content.
const CONFIG_TOML: &str = include_str!("../config.toml");

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub provider: ProviderConfig,
    pub request: RequestConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub authority_url: String,
    pub audience: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestConfig {
    pub target: String,
    pub client_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    /// Load configuration from embedded config.toml with environment variable overrides.
    ///
    /// Only the `wu-token` binary calls this.
    pub fn load() -> Result<Self> {
        let mut config = Self::embedded()?;

        if let Ok(authority) = env::var("WU_TOKEN_AUTHORITY") {
            config.provider.authority_url = authority;
        }

        if let Ok(audience) = env::var("WU_TOKEN_AUDIENCE") {
            config.provider.audience = audience;
        }

        if let Ok(target) = env::var("WU_TOKEN_TARGET") {
            config.request.target = target;
        }

        if let Ok(client_id) = env::var("WU_TOKEN_CLIENT_ID") {
            config.request.client_id = client_id;
        }

        if let Ok(log_level) = env::var("RUST_LOG") {
            config.logging.level = log_level;
        }

        config.validate()?;

        Ok(config)
    }

    /// The embedded defaults, validated. Used by the DLL export.
    pub fn embedded_validated() -> Result<Self> {
        let config = Self::embedded()?;
        config.validate()?;
        Ok(config)
    }

    /// The embedded defaults, without environment overrides.
    pub fn embedded() -> Result<Self> {
        toml::from_str(CONFIG_TOML).context("Failed to parse embedded config.toml")
    }

    /// Validate that the request constants are usable.
    fn validate(&self) -> Result<()> {
        let authority = Url::parse(&self.provider.authority_url).with_context(|| {
            format!(
                "Invalid provider authority URL: {}",
                self.provider.authority_url
            )
        })?;
        if authority.scheme() != "https" {
            anyhow::bail!(
                "Provider authority must use https, got {}",
                authority.scheme()
            );
        }

        if self.provider.audience.trim().is_empty() {
            anyhow::bail!("Provider audience not configured. Set WU_TOKEN_AUDIENCE");
        }

        if self.request.target.trim().is_empty() {
            anyhow::bail!("Token target not configured. Set WU_TOKEN_TARGET");
        }

        Uuid::parse_str(&self.request.client_id)
            .with_context(|| format!("Client id is not a GUID: {}", self.request.client_id))?;

        Ok(())
    }
}
