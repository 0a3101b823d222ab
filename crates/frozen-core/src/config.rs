use crate::category::CategoryDurationTable;
use crate::expiration::ExpirationThresholds;
use crate::query::{SortOrder, DEFAULT_HORIZON_DAYS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const APP_DIR: &str = "frozen-assets";

/// Main configuration structure
///
/// Loaded from the config file; CLI flags win over anything in here.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub expiration: ExpirationConfig,
    #[serde(default)]
    pub categories: CategoryConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    /// Load config from the default location, or defaults if there is none
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from a specific file; a missing file means defaults
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Save config to the default location
    pub fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// `<config_dir>/frozen-assets/config.toml`
    pub fn config_path() -> crate::Result<PathBuf> {
        Ok(dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join(APP_DIR)
            .join("config.toml"))
    }

    /// A duration table with the configured overrides applied
    ///
    /// Invalid overrides are skipped with a warning rather than refusing to
    /// start.
    pub fn duration_table(&self) -> CategoryDurationTable {
        let table = CategoryDurationTable::new();
        for (category, days) in &self.categories.durations {
            if let Err(e) = table.set_duration(category, *days) {
                warn!("Ignoring configured duration: {}", e);
            }
        }
        table
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StoreConfig {
    /// SQLite database file
    pub db_path: Option<PathBuf>,
}

impl StoreConfig {
    /// Configured path, or `<data_dir>/frozen-assets/inventory.db`
    pub fn resolved_db_path(&self) -> crate::Result<PathBuf> {
        match &self.db_path {
            Some(path) => Ok(path.clone()),
            None => Ok(dirs::data_dir()
                .ok_or_else(|| crate::Error::ConfigError("Could not find data directory".into()))?
                .join(APP_DIR)
                .join("inventory.db")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpirationConfig {
    /// Last day (inclusive) that counts as critical
    #[serde(default = "default_critical_days")]
    pub critical_days: i64,

    /// Last day (inclusive) that counts as a warning
    #[serde(default = "default_warning_days")]
    pub warning_days: i64,

    /// Horizon for the "expiring soon" list
    #[serde(default = "default_near_expiration_days")]
    pub near_expiration_days: u32,
}

fn default_critical_days() -> i64 {
    14 // two weeks
}

fn default_warning_days() -> i64 {
    60 // two months, near enough
}

fn default_near_expiration_days() -> u32 {
    DEFAULT_HORIZON_DAYS
}

impl Default for ExpirationConfig {
    fn default() -> Self {
        Self {
            critical_days: default_critical_days(),
            warning_days: default_warning_days(),
            near_expiration_days: default_near_expiration_days(),
        }
    }
}

impl ExpirationConfig {
    pub fn thresholds(&self) -> crate::Result<ExpirationThresholds> {
        if self.critical_days < 0 || self.warning_days < self.critical_days {
            return Err(crate::Error::ConfigError(format!(
                "expiration thresholds must satisfy 0 <= critical ({}) <= warning ({})",
                self.critical_days, self.warning_days
            )));
        }
        Ok(ExpirationThresholds {
            critical_days: self.critical_days,
            warning_days: self.warning_days,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CategoryConfig {
    /// Shelf-life overrides in days, keyed by category name
    #[serde(default)]
    pub durations: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DisplayConfig {
    #[serde(default)]
    pub default_sort: SortOrder,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.expiration.critical_days, 14);
        assert_eq!(config.expiration.warning_days, 60);
        assert_eq!(config.expiration.near_expiration_days, 60);
        assert_eq!(config.display.default_sort, SortOrder::Ascending);
        assert!(config.categories.durations.is_empty());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("critical_days"));
        assert!(toml.contains("default_sort"));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [expiration]
            critical_days = 7

            [categories.durations]
            Beef = 400
            "Ice Cream" = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.expiration.critical_days, 7);
        assert_eq!(config.expiration.warning_days, 60);
        assert_eq!(config.store.db_path, None);

        let table = config.duration_table();
        assert_eq!(table.duration_days("Beef"), 400);
        assert_eq!(table.duration_days("Ice Cream"), 60);
        assert_eq!(table.duration_days("Fish"), 180);
    }

    #[test]
    fn test_invalid_duration_override_is_skipped() {
        let config: Config = toml::from_str("[categories.durations]\nBeef = 0\n").unwrap();
        assert_eq!(config.duration_table().duration_days("Beef"), 365);
    }

    #[test]
    fn test_thresholds_validation() {
        let mut expiration = ExpirationConfig::default();
        assert_eq!(expiration.thresholds().unwrap(), ExpirationThresholds::default());

        expiration.warning_days = 10;
        assert!(expiration.thresholds().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.display.default_sort = SortOrder::Descending;
        config.store.db_path = Some(dir.path().join("items.db"));
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_explicit_db_path_wins() {
        let store = StoreConfig {
            db_path: Some(PathBuf::from("/tmp/freezer.db")),
        };
        assert_eq!(store.resolved_db_path().unwrap(), PathBuf::from("/tmp/freezer.db"));
    }
}
