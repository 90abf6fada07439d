//! Runtime configuration resolved from the environment.
//!
//! # Responsibility
//! - Resolve database path, collection and logging settings with defaults.
//! - Derive the controller-level [`DashboardConfig`].

use crate::logging::default_log_level;
use crate::render::markdown::CARD_PREVIEW_LINES;
use crate::store::DEFAULT_COLLECTION;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "MOMDASH_DB_PATH";
pub const ENV_COLLECTION: &str = "MOMDASH_COLLECTION";
pub const ENV_LOG_LEVEL: &str = "MOMDASH_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "MOMDASH_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "momdash.sqlite3";

/// Controller settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Remote collection holding meeting documents.
    pub collection: String,
    /// Source lines rendered on each grid card.
    pub card_preview_lines: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            card_preview_lines: CARD_PREVIEW_LINES,
        }
    }
}

/// Process-level settings shared by the CLI and FFI hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub collection: String,
    pub log_level: String,
    /// Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            collection: DEFAULT_COLLECTION.to_string(),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Reads `MOMDASH_*` variables; blank values fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();
        Self {
            db_path: read(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            collection: read(ENV_COLLECTION).unwrap_or(defaults.collection),
            log_level: read(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_dir: read(ENV_LOG_DIR).map(PathBuf::from),
        }
    }

    pub fn dashboard(&self) -> DashboardConfig {
        DashboardConfig {
            collection: self.collection.clone(),
            ..DashboardConfig::default()
        }
    }
}
