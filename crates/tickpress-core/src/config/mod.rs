// Tickpress Configuration Store
// Persisted settings merged over built-in defaults

pub mod value;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

pub use value::{
    check_interval, check_lag, parse_interval, parse_lag, parse_pickup_key, ValueError,
};

pub const DEFAULT_PICKUP_KEY: &str = "f";
pub const DEFAULT_SYNC_INTERVAL: u32 = 10;
pub const DEFAULT_NON_HOST_LAG: f64 = 0.1;
pub const DEFAULT_HOST_MODE: bool = false;

pub const KEY_PICKUP_KEY: &str = "pickup_key";
pub const KEY_SYNC_INTERVAL: &str = "sync_interval";
pub const KEY_NON_HOST_LAG: &str = "non_host_lag";
pub const KEY_HOST_MODE: &str = "host_mode";

/// Keys read from and written to the settings file
pub const RECOGNIZED_KEYS: [&str; 4] = [
    KEY_PICKUP_KEY,
    KEY_SYNC_INTERVAL,
    KEY_NON_HOST_LAG,
    KEY_HOST_MODE,
];

/// The durable settings record.
///
/// Field names double as the keys of the settings file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Configuration {
    /// Key pressed when the engine fires
    pub pickup_key: String,
    /// Boundary period in seconds, counted from the top of each minute
    pub sync_interval: u32,
    /// Extra delay in seconds applied when not hosting
    pub non_host_lag: f64,
    /// Whether the operator is the timing authority (no lag)
    pub host_mode: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            pickup_key: DEFAULT_PICKUP_KEY.to_string(),
            sync_interval: DEFAULT_SYNC_INTERVAL,
            non_host_lag: DEFAULT_NON_HOST_LAG,
            host_mode: DEFAULT_HOST_MODE,
        }
    }
}

impl Configuration {
    /// Overlay recognized keys from a parsed table.
    ///
    /// A key whose value fails coercion keeps its current value and is
    /// reported through `meta` instead of aborting the whole load.
    fn overlay(&mut self, table: &toml::Table, meta: &mut ConfigMetadata) {
        for (key, value) in table {
            let applied = match key.as_str() {
                KEY_PICKUP_KEY => value::coerce_pickup_key(value).map(|v| self.pickup_key = v),
                KEY_SYNC_INTERVAL => value::coerce_interval(value).map(|v| self.sync_interval = v),
                KEY_NON_HOST_LAG => value::coerce_lag(value).map(|v| self.non_host_lag = v),
                KEY_HOST_MODE => value::coerce_bool(value).map(|v| self.host_mode = v),
                _ => {
                    log::debug!("Ignoring unknown settings key '{}'", key);
                    continue;
                }
            };

            match applied {
                Ok(()) => {
                    meta.overridden_keys.insert(key.clone());
                }
                Err(e) => meta.warn(format!("Ignoring '{}' in {}: {}", key, meta.path.display(), e)),
            }
        }
    }
}

/// Diagnostics describing where the active settings came from
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigMetadata {
    /// File the store reads and writes
    pub path: PathBuf,
    /// The file was present at load time
    pub existed: bool,
    /// The file existed, parsed as a table and was read without error
    pub loaded: bool,
    /// Recognized keys whose file value replaced the default
    pub overridden_keys: BTreeSet<String>,
    /// Recoverable problems found while loading
    pub warnings: Vec<String>,
}

impl ConfigMetadata {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            existed: false,
            loaded: false,
            overridden_keys: BTreeSet::new(),
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, message: String) {
        log::warn!("{}", message);
        self.warnings.push(message);
    }

    /// One-line description of the load provenance
    pub fn describe(&self) -> String {
        if !self.existed {
            format!("No settings file at {}, using defaults", self.path.display())
        } else if !self.loaded {
            format!("Could not read {}, using defaults", self.path.display())
        } else if self.overridden_keys.is_empty() {
            format!("Loaded {} (no overrides)", self.path.display())
        } else {
            let keys: Vec<&str> = self.overridden_keys.iter().map(String::as_str).collect();
            format!("Loaded {} (overrides: {})", self.path.display(), keys.join(", "))
        }
    }
}

/// Errors that can occur when reading or writing the settings file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(String),
}

/// Reads and writes the settings file at a fixed path.
///
/// Writes replace the whole file in place; a crash mid-write can leave it
/// truncated, in which case the next load falls back to defaults with a
/// warning.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Create a store for an explicit settings path
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Get the default settings path (~/.config/tickpress/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tickpress").join("config.toml"))
    }

    /// Store at the default location, or `tickpress.toml` in the working
    /// directory when no config directory is known.
    pub fn at_default_location() -> Self {
        Self::new(Self::default_path().unwrap_or_else(|| PathBuf::from("tickpress.toml")))
    }

    /// Path of the settings file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings merged over defaults. Never fails: every problem is
    /// recorded in the returned metadata and logged as a warning.
    pub fn load(&self) -> (Configuration, ConfigMetadata) {
        let mut config = Configuration::default();
        let mut meta = ConfigMetadata::new(&self.path);

        meta.existed = self.path.exists();
        if !meta.existed {
            log::debug!("No settings file at {}", self.path.display());
            return (config, meta);
        }

        match self.read_table() {
            Ok(table) => {
                meta.loaded = true;
                config.overlay(&table, &mut meta);
            }
            Err(e) => meta.warn(format!(
                "Could not load settings from {}: {}; using defaults",
                self.path.display(),
                e
            )),
        }

        (config, meta)
    }

    /// Write the full configuration, replacing the file.
    pub fn save(&self, config: &Configuration) -> Result<(), ConfigError> {
        let body =
            toml::to_string(config).map_err(|e| ConfigError::TomlSerialize(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, format!("{}{}", FILE_HEADER, body))?;
        log::debug!("Saved settings to {}", self.path.display());
        Ok(())
    }

    fn read_table(&self) -> Result<toml::Table, ConfigError> {
        let content = fs::read_to_string(&self.path)?;
        content
            .parse::<toml::Table>()
            .map_err(|e| ConfigError::TomlParse(e.to_string()))
    }
}

const FILE_HEADER: &str = "# Tickpress settings, rewritten whenever a setting changes\n";

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> ConfigStore {
        ConfigStore::new(dir.path().join("config.toml"))
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, meta) = store_in(&dir).load();

        assert_eq!(config, Configuration::default());
        assert!(!meta.existed);
        assert!(!meta.loaded);
        assert!(meta.overridden_keys.is_empty());
        assert!(meta.warnings.is_empty());
    }

    #[test]
    fn test_partial_file_overlays_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "pickup_key = \"e\"\nnon_host_lag = 0.12\n").unwrap();

        let (config, meta) = store.load();
        assert_eq!(config.pickup_key, "e");
        assert_eq!(config.non_host_lag, 0.12);
        assert_eq!(config.sync_interval, DEFAULT_SYNC_INTERVAL);
        assert_eq!(config.host_mode, DEFAULT_HOST_MODE);
        assert!(meta.existed && meta.loaded);
        assert_eq!(
            meta.overridden_keys.iter().map(String::as_str).collect::<Vec<_>>(),
            vec![KEY_NON_HOST_LAG, KEY_PICKUP_KEY]
        );
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "sync_interval = 15\nburst = 5\n[extra]\nx = 1\n").unwrap();

        let (config, meta) = store.load();
        assert_eq!(config.sync_interval, 15);
        assert!(meta.loaded);
        assert!(meta.warnings.is_empty());
        assert!(!meta.overridden_keys.contains("burst"));

        store.save(&config).unwrap();
        let written = fs::read_to_string(store.path()).unwrap();
        assert!(!written.contains("burst"));
        assert!(!written.contains("extra"));
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "this is [not toml").unwrap();

        let (config, meta) = store.load();
        assert_eq!(config, Configuration::default());
        assert!(meta.existed);
        assert!(!meta.loaded);
        assert_eq!(meta.warnings.len(), 1);
    }

    #[test]
    fn test_invalid_value_keeps_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(
            store.path(),
            "sync_interval = 0\nnon_host_lag = -1.0\npickup_key = \"\"\nhost_mode = \"yes\"\n",
        )
        .unwrap();

        let (config, meta) = store.load();
        assert_eq!(config.sync_interval, DEFAULT_SYNC_INTERVAL);
        assert_eq!(config.non_host_lag, DEFAULT_NON_HOST_LAG);
        assert_eq!(config.pickup_key, DEFAULT_PICKUP_KEY);
        assert!(config.host_mode);
        assert!(meta.loaded);
        assert_eq!(meta.warnings.len(), 3);
        assert_eq!(
            meta.overridden_keys.iter().cloned().collect::<Vec<_>>(),
            vec![KEY_HOST_MODE.to_string()]
        );
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let config = Configuration {
            pickup_key: "e".to_string(),
            sync_interval: 7,
            non_host_lag: 0.12,
            host_mode: true,
        };

        store.save(&config).unwrap();
        let (loaded, meta) = store.load();
        assert_eq!(loaded, config);
        assert_eq!(meta.overridden_keys.len(), RECOGNIZED_KEYS.len());
    }

    #[test]
    fn test_load_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "sync_interval = 20\nhost_mode = true\n").unwrap();

        let (first, _) = store.load();
        let (second, _) = store.load();
        assert_eq!(first, second);
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("nested").join("config.toml"));
        store.save(&Configuration::default()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_save_into_unwritable_location_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let store = ConfigStore::new(blocker.join("config.toml"));

        assert!(matches!(
            store.save(&Configuration::default()),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_describe_mentions_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "pickup_key = \"e\"\n").unwrap();

        let (_, meta) = store.load();
        assert!(meta.describe().contains("overrides: pickup_key"));
    }
}
