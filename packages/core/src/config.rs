//! Runtime configuration.
//!
//! Read from `<config_dir>/usbmirror/config.json` when present. Every field
//! has a default so a partial file only overrides what it names.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::error::{ConfigParseSnafu, ConfigReadSnafu, Result};
use crate::executor::PrivilegeEscalation;

/// Directory name under the platform config dir.
pub const APP_DIR: &str = "usbmirror";

/// Default mount root under which `{mount_root}/{label}` directories live.
pub const DEFAULT_MOUNT_ROOT: &str = "/media";

/// Default group applied to mount directories.
pub const DEFAULT_MOUNT_GROUP: &str = "users";

/// Backup target name that never triggers the "not plugged in" warning.
pub const DEFAULT_IGNORE_DEVICE: &str = "MINIS_SDA";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mount_root: PathBuf,
    pub mount_group: String,
    pub escalation: PrivilegeEscalation,
    pub favorites_path: PathBuf,
    pub folders_path: PathBuf,
    pub ignore_device: String,
    pub poll_interval_ms: u64,
    /// Coalescing window for watch events. 0 syncs on every event.
    pub debounce_ms: u64,
    pub desktop_notifications: bool,
}

impl Default for Config {
    fn default() -> Self {
        let dir = app_config_dir();
        Self {
            mount_root: PathBuf::from(DEFAULT_MOUNT_ROOT),
            mount_group: DEFAULT_MOUNT_GROUP.to_string(),
            escalation: PrivilegeEscalation::Sudo,
            favorites_path: dir.join("favorites.json"),
            folders_path: dir.join("folders.json"),
            ignore_device: DEFAULT_IGNORE_DEVICE.to_string(),
            poll_interval_ms: 1000,
            debounce_ms: 0,
            desktop_notifications: true,
        }
    }
}

impl Config {
    /// Loads the config from an explicit path. The file must exist.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).context(ConfigReadSnafu { path })?;
        serde_json::from_str(&content).context(ConfigParseSnafu { path })
    }

    /// Loads `path` if given, else the default location if it exists, else
    /// the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = default_config_path();
                if default.exists() {
                    Self::from_file(&default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn debounce(&self) -> Option<Duration> {
        (self.debounce_ms > 0).then(|| Duration::from_millis(self.debounce_ms))
    }
}

/// `<config_dir>/usbmirror`, falling back to the working directory.
pub fn app_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

pub fn default_config_path() -> PathBuf {
    app_config_dir().join("config.json")
}
