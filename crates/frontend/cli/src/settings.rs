use romcheck_core::extract::DEFAULT_TIMEOUT;
use romcheck_core::WidthStrategy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides the settings file location
pub const CONFIG_ENV: &str = "ROMCHECK_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Explicit 7-zip binary; searched next to the executable and on PATH otherwise
    pub seven_zip_path: Option<String>,
    /// Verification threads; min(4, cores) when unset
    pub jobs: Option<usize>,
    pub ascii_status: bool,
    pub pause_on_exit: bool,
    pub extract_timeout_secs: u64,
    pub width_strategy: WidthStrategy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seven_zip_path: None,
            jobs: None,
            ascii_status: false,
            pause_on_exit: true,
            extract_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            width_strategy: WidthStrategy::Unicode,
        }
    }
}

impl Settings {
    /// `$ROMCHECK_CONFIG`, or romcheck.json next to the executable
    pub fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        let mut path = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));
        path.push("romcheck.json");
        path
    }

    /// Load settings, falling back to defaults on error
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    eprintln!(
                        "Warning: Failed to parse {}: {}. Using defaults.",
                        path.display(),
                        e
                    );
                    Self::default()
                }
            },
            Err(_) => {
                // File doesn't exist or can't be read, use defaults
                log::debug!("no settings at {}, using defaults", path.display());
                Self::default()
            }
        }
    }
}
