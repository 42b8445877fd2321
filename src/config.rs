//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (the extraction API key) are referenced by env-var name in
//! the config and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::types::RateSettings;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSection,
    pub server: ServerConfig,
    pub rates: RatesConfig,
    pub extraction: ExtractionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
    /// Directory holding the JSON stores.
    pub data_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

/// Default acquisition-fee and tax percentages (0–100 scale).
#[derive(Debug, Deserialize, Clone)]
pub struct RatesConfig {
    pub auctioneer_commission_rate: Decimal,
    pub itbi_rate: Decimal,
    pub registry_rate: Decimal,
    pub capital_gains_tax_rate: Decimal,
    /// Pre-fill for the per-analysis selling commission field.
    pub default_selling_commission_rate: Decimal,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            auctioneer_commission_rate: dec!(5),
            itbi_rate: dec!(3),
            registry_rate: dec!(1),
            capital_gains_tax_rate: dec!(15),
            default_selling_commission_rate: dec!(5),
        }
    }
}

impl RatesConfig {
    /// The four rates the computation core consumes.
    pub fn settings(&self) -> RateSettings {
        RateSettings {
            auctioneer_commission_rate: self.auctioneer_commission_rate,
            itbi_rate: self.itbi_rate,
            registry_rate: self.registry_rate,
            capital_gains_tax_rate: self.capital_gains_tax_rate,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractionConfig {
    pub enabled: bool,
    pub provider: String,
    pub model: String,
    pub api_key_env: String,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    pub fn users_path(&self) -> PathBuf {
        PathBuf::from(&self.app.data_dir).join("users.json")
    }

    pub fn analyses_path(&self) -> PathBuf {
        PathBuf::from(&self.app.data_dir).join("analyses.json")
    }

    pub fn settings_path(&self) -> PathBuf {
        PathBuf::from(&self.app.data_dir).join("settings.json")
    }
}
