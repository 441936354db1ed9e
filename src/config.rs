use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid settings in {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write settings file {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Operator-tunable engine settings, persisted as JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub scrape_depth: u8,
    pub stealth_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scrape_depth: 1,
            stealth_mode: true,
        }
    }
}

impl Settings {
    pub const MIN_DEPTH: u8 = 1;
    pub const MAX_DEPTH: u8 = 3;

    /// Recursion depth limit, always within `MIN_DEPTH..=MAX_DEPTH`.
    pub fn depth(&self) -> u8 {
        self.scrape_depth.clamp(Self::MIN_DEPTH, Self::MAX_DEPTH)
    }

    pub fn depth_label(depth: u8) -> &'static str {
        match depth {
            1 => "Level 1 (Direct)",
            2 => "Level 2 (Extended)",
            _ => "Level 3 (Deep Net)",
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let mut settings: Self =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_owned(),
                source,
            })?;
        settings.scrape_depth = settings.depth();
        Ok(settings)
    }

    /// Loads `path` if it exists; a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |source: io::Error| ConfigError::Write {
            path: path.to_owned(),
            source,
        };
        let raw = serde_json::to_string_pretty(self)
            .map_err(|error| write_error(io::Error::other(error)))?;
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        fs::write(path, raw).map_err(write_error)
    }

    pub fn with_overrides(mut self, depth: Option<u8>, stealth: Option<bool>) -> Self {
        if let Some(depth) = depth {
            self.scrape_depth = depth;
        }
        if let Some(stealth) = stealth {
            self.stealth_mode = stealth;
        }
        self.scrape_depth = self.depth();
        self
    }
}
