//! Store configuration.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings applied by `SurveyStore::open`.
///
/// Every field is optional; the empty JSON object `{}` yields an in-memory
/// store without icon cache or file logging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// SQLite file; `None` opens an in-memory database.
    pub database_path: Option<PathBuf>,
    /// Directory holding cached campaign icons.
    pub icon_cache_dir: Option<PathBuf>,
    /// Log level; defaults to `default_log_level()` when `log_dir` is set.
    pub log_level: Option<String>,
    /// Absolute directory for rolling log files; logging stays off when unset.
    pub log_dir: Option<String>,
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn at_path(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: Some(database_path.into()),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> StoreResult<Self> {
        serde_json::from_str(json).map_err(|err| StoreError::Config(err.to_string()))
    }

    pub fn to_json_string(&self) -> StoreResult<String> {
        serde_json::to_string_pretty(self).map_err(|err| StoreError::Config(err.to_string()))
    }
}
