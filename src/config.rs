use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::malla::GridSize;

// Constants
const DEFAULT_AUTOSAVE_DELAY_MS: u64 = 300;
pub const AUTOSAVE_KEY: &str = "malla-draft";
pub const MASTERS_KEY: &str = "master-blocks";
pub const PROJECTS_KEY: &str = "projects";

/// Editor settings. Every key is optional in the JSON form; missing keys
/// take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Coarse grid of a newly created malla.
    pub default_grid: GridSize,
    pub autosave_delay_ms: u64,
    pub autosave_key: String,
    pub masters_key: String,
    pub projects_key: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            default_grid: GridSize::default(),
            autosave_delay_ms: DEFAULT_AUTOSAVE_DELAY_MS,
            autosave_key: AUTOSAVE_KEY.to_string(),
            masters_key: MASTERS_KEY.to_string(),
            projects_key: PROJECTS_KEY.to_string(),
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }
}
