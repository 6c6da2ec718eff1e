use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use personreid_core::shared::constants::{DEFAULT_MATCH_THRESHOLD, RESULTS_ROOT};

const SETTINGS_DIR: &str = "personreid";
const SETTINGS_FILE: &str = "settings.json";

/// Persistent defaults; command-line flags override every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub threshold: f64,
    pub seed: Option<u64>,
    pub threaded: bool,
    pub log_every: usize,
    pub results_root: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
            seed: None,
            threaded: false,
            log_every: 100,
            results_root: PathBuf::from(RESULTS_ROOT),
        }
    }
}

impl Settings {
    /// Loads `path` if given (and fails if it is unreadable), otherwise the
    /// per-user settings file if one exists, otherwise built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        match path {
            Some(p) => Self::load_from(p),
            None => match default_path() {
                Some(p) if p.exists() => Self::load_from(&p),
                _ => Ok(Self::default()),
            },
        }
    }

    fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = fs::read_to_string(path)
            .map_err(|e| format!("Cannot read settings {}: {e}", path.display()))?;
        let settings = serde_json::from_str(&data)
            .map_err(|e| format!("Invalid settings {}: {e}", path.display()))?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}

fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(SETTINGS_DIR).join(SETTINGS_FILE))
}
