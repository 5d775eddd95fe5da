//! Orchestration entry points: mount all favorites, unmount interactively,
//! list what is mounted.

use std::sync::Arc;

use log::warn;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::executor::CommandRunner;
use crate::favorites::FavoriteStore;
use crate::mount::{MountManager, MountOutcome, MountRecord, UnmountOutcome};
use crate::notice::Notifier;
use crate::prompt::Prompt;
use crate::scanner::DeviceScanner;

pub struct UsbActions {
    store: FavoriteStore,
    scanner: DeviceScanner,
    manager: MountManager,
    notifier: Arc<dyn Notifier>,
}

impl UsbActions {
    pub fn new(
        store: FavoriteStore,
        scanner: DeviceScanner,
        manager: MountManager,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            scanner,
            manager,
            notifier,
        }
    }

    /// Wires the components from a config.
    pub fn from_config(
        config: &Config,
        runner: Arc<dyn CommandRunner>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::new(
            FavoriteStore::new(&config.favorites_path),
            DeviceScanner::new(runner.clone(), notifier.clone()),
            MountManager::new(
                runner,
                notifier.clone(),
                &config.mount_root,
                &config.mount_group,
            ),
            notifier,
        )
    }

    /// Mounts every connected favorite.
    ///
    /// A fresh or empty store first asks for labels. Devices whose UUID
    /// cannot be resolved are reported and skipped. Returns the outcome for
    /// each device a mount was attempted on.
    pub fn mount_all_favorites(
        &self,
        prompt: &mut dyn Prompt,
    ) -> Result<Vec<(String, MountOutcome)>> {
        let favorites = self.store.load(prompt)?;
        let connected = self.scanner.connected_favorites(&favorites)?;

        if connected.is_empty() {
            self.notifier.warning("No favorite USB devices found!");
            self.notifier
                .warning("Plug it in or check the favorites list (usbmirror favorites -s)");
            return Ok(Vec::new());
        }

        let mut outcomes = Vec::new();
        for device in connected {
            let resolved = match self.scanner.resolve_uuid(&device.label) {
                Ok(resolved) => resolved,
                Err(e @ (Error::DeviceNotConnected { .. } | Error::UuidUnparsable { .. })) => {
                    self.notifier.warning(&e.to_string());
                    continue;
                }
                Err(e) => return Err(e),
            };
            let outcome = self.manager.mount(&resolved.uuid, &resolved.label)?;
            outcomes.push((resolved.label, outcome));
        }
        Ok(outcomes)
    }

    /// Asks, per mounted favorite, whether to unmount it.
    pub fn unmount_all_favorites(
        &self,
        prompt: &mut dyn Prompt,
    ) -> Result<Vec<(MountRecord, UnmountOutcome)>> {
        let favorites = self.store.show()?;
        self.manager.unmount_interactive(&favorites, prompt)
    }

    /// Mounted favorites; a fresh or empty store first asks for labels.
    pub fn list_mounted_favorites(
        &self,
        show_output: bool,
        prompt: &mut dyn Prompt,
    ) -> Result<Vec<MountRecord>> {
        let favorites = self.store.load(prompt)?;
        self.manager.list_mounted(&favorites, show_output)
    }

    /// Labels of mounted favorites for the advisory watch check.
    ///
    /// Never fails: an unreadable store or listing yields an empty list.
    pub fn mounted_labels(&self) -> Vec<String> {
        let favorites = match self.store.read() {
            Ok(favorites) => favorites,
            Err(e) => {
                warn!("cannot read favorites for the media check: {}", e);
                return Vec::new();
            }
        };
        if favorites.is_empty() {
            return Vec::new();
        }
        match self.manager.list_mounted(&favorites, false) {
            Ok(records) => records.into_iter().map(|r| r.label).collect(),
            Err(e) => {
                warn!("cannot list mounted devices: {}", e);
                Vec::new()
            }
        }
    }
}
