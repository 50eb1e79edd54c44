//! Configuration management

use crate::core::{Error, Result, TariffDraft};
use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "utility-billing";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

        let app_config_dir = config_dir.join(APP_DIR);

        if !app_config_dir.exists() {
            fs::create_dir_all(&app_config_dir)?;
        }

        Ok(app_config_dir.join("config.toml"))
    }

    /// Load configuration from the default location, writing defaults on first run
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            let config = Self::default();
            config.save_to(&path)?;
            return Ok(config);
        }

        Self::load_from(&path)
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Language: "auto", "en", "fr"
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String { "auto".to_string() }

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
        }
    }
}

/// How monetary amounts are rounded to two decimals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingRule {
    /// Midpoint away from zero (373.275 -> 373.28)
    #[default]
    HalfUp,
    /// Banker's rounding (373.275 -> 373.28, 373.265 -> 373.26)
    HalfEven,
    /// Drop everything past the second decimal
    Truncate,
}

impl RoundingRule {
    pub fn strategy(&self) -> RoundingStrategy {
        match self {
            RoundingRule::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingRule::HalfEven => RoundingStrategy::MidpointNearestEven,
            RoundingRule::Truncate => RoundingStrategy::ToZero,
        }
    }
}

/// Billing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Currency code (INR, EUR, USD, etc.)
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Currency symbol
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default)]
    pub rounding: RoundingRule,
}

fn default_currency() -> String { "INR".to_string() }
fn default_currency_symbol() -> String { "\u{20B9}".to_string() } // Rupee sign

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            currency_symbol: default_currency_symbol(),
            rounding: RoundingRule::default(),
        }
    }
}

/// Database location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file; the platform data directory is used when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Tariff lookup cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds a resolved tariff stays cached
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_true() -> bool { true }
fn default_ttl_secs() -> u64 { 300 }
fn default_max_entries() -> usize { 256 }

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
        }
    }
}

/// A batch of tariff drafts, as read by `tariff import`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TariffFile {
    #[serde(default)]
    pub tariffs: Vec<TariffDraft>,
}

impl TariffFile {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse tariff file: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Category;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config: Config = toml::from_str("[billing]\nrounding = \"half_even\"\n").unwrap();

        assert_eq!(config.billing.rounding, RoundingRule::HalfEven);
        assert_eq!(config.billing.currency, "INR");
        assert_eq!(config.general.language, "auto");
        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl_secs, 300);
        assert!(config.database.path.is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = std::env::temp_dir().join(format!("utility-billing-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let mut config = Config::default();
        config.billing.rounding = RoundingRule::Truncate;
        config.cache.max_entries = 8;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.billing.rounding, RoundingRule::Truncate);
        assert_eq!(loaded.cache.max_entries, 8);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_unknown_rounding_rule_is_rejected() {
        assert!(toml::from_str::<Config>("[billing]\nrounding = \"sideways\"\n").is_err());
    }

    #[test]
    fn test_parse_tariff_file() {
        let file = TariffFile::parse(
            r#"
            [[tariffs]]
            category = "residential"
            fixed_charge = "25.00"
            electricity_duty_percent = "5"
            gst_percent = "18"
            effective_date = "2024-04-01"
            slabs = [
                { from = 0, to = 100, rate_per_unit = "3.50" },
                { from = 100, to = 300, rate_per_unit = "4.00" },
                { from = 300, rate_per_unit = "5.00" },
            ]
            "#,
        )
        .unwrap();

        assert_eq!(file.tariffs.len(), 1);
        let draft = &file.tariffs[0];
        assert_eq!(draft.category, Category::Residential);
        assert_eq!(draft.slabs.len(), 3);
        assert_eq!(draft.slabs[2].to, None);
        assert_eq!(draft.fixed_charge.to_string(), "25.00");
    }

    #[test]
    fn test_tariff_file_rejects_garbage() {
        assert!(matches!(TariffFile::parse("tariffs = 3"), Err(Error::Config(_))));
    }
}
