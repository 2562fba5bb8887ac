use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::json_store::JsonStore;

/// Root application configuration, loaded from `~/.config/libris/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub core: CoreConfig,
    pub store: StoreConfig,
    pub search: SearchConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Relative paths resolve against the working directory.
    pub library_file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub atomic_writes: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Use ranked fuzzy search instead of substring search by default.
    pub fuzzy: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is not set.
    pub level: String,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            library_file: "library.json".to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { atomic_writes: true }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/libris/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("LIBRIS_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("libris")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    // ─── Derived ───────────────────────────────────────────

    pub fn library_file(&self) -> PathBuf {
        PathBuf::from(&self.core.library_file)
    }

    pub fn set_library_file(&mut self, path: PathBuf) {
        self.core.library_file = path.to_string_lossy().to_string();
    }

    /// A store for the configured library file.
    pub fn open_store(&self) -> JsonStore {
        JsonStore::new(self.library_file()).with_atomic_writes(self.store.atomic_writes)
    }

    /// Flattened `section.key = value` pairs, for `libris config list`.
    pub fn key_values(&self) -> Vec<(&'static str, String)> {
        vec![
            ("core.library_file", self.core.library_file.clone()),
            ("store.atomic_writes", self.store.atomic_writes.to_string()),
            ("search.fuzzy", self.search.fuzzy.to_string()),
            ("log.level", self.log.level.clone()),
        ]
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.key_values()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }
}
