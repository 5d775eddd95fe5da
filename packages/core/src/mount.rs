//! Mount operations module.
//!
//! Mount directories live at `{mount_root}/{label}`. A directory existing
//! does not imply the device is mounted; the live `lsblk` listing is the
//! source of truth for [`MountManager::list_mounted`].

use std::path::PathBuf;
use std::sync::Arc;

use log::{info, warn};

use crate::disk::{self, BlockDevice};
use crate::error::{Error, Result};
use crate::executor::{CommandOutput, CommandRunner, CommandSpec};
use crate::notice::Notifier;
use crate::prompt::Prompt;

/// Exit codes `mount` uses when the target is already mounted (or busy).
const ALREADY_MOUNTED_CODES: [i32; 2] = [1, 32];

/// Classification of a `mount` exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    Mounted,
    AlreadyMounted,
    Unknown(i32),
}

impl MountOutcome {
    pub fn from_exit_code(code: i32) -> Self {
        match code {
            0 => MountOutcome::Mounted,
            c if ALREADY_MOUNTED_CODES.contains(&c) => MountOutcome::AlreadyMounted,
            c => MountOutcome::Unknown(c),
        }
    }
}

/// A favorite device that is currently mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountRecord {
    pub label: String,
    pub mount_directory: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnmountOutcome {
    /// Unmounted and mount directory removed.
    Unmounted,
    /// The user declined.
    Skipped,
    /// `umount` failed; the directory was left in place.
    Failed { code: i32, stderr: String },
}

pub struct MountManager {
    runner: Arc<dyn CommandRunner>,
    notifier: Arc<dyn Notifier>,
    mount_root: PathBuf,
    mount_group: String,
}

impl MountManager {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        notifier: Arc<dyn Notifier>,
        mount_root: impl Into<PathBuf>,
        mount_group: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            notifier,
            mount_root: mount_root.into(),
            mount_group: mount_group.into(),
        }
    }

    /// `{mount_root}/{label}`.
    pub fn mount_directory(&self, label: &str) -> PathBuf {
        self.mount_root.join(label)
    }

    fn run_privileged(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        self.runner
            .run(&CommandSpec::privileged(program, args.iter().copied()))
    }

    /// Creates the mount directory if needed and (re)applies permissive
    /// permissions and group ownership to it.
    pub fn ensure_mount_directory(&self, label: &str) -> Result<PathBuf> {
        let dir = self.mount_directory(label);
        let dir_str = dir.to_string_lossy().into_owned();

        if !dir.is_dir() {
            let output = self.run_privileged("mkdir", &["-p", dir_str.as_str()])?;
            if !output.success() {
                return Err(Error::CommandExit {
                    command: format!("mkdir -p {}", dir_str),
                    code: output.code,
                    stderr: output.stderr,
                });
            }
        }

        let chmod = self.run_privileged("chmod", &["-R", "777", dir_str.as_str()])?;
        if !chmod.success() {
            warn!("chmod on {} exited with {}: {}", dir_str, chmod.code, chmod.stderr.trim());
        }

        let chgrp = self.run_privileged("chgrp", &["-R", self.mount_group.as_str(), dir_str.as_str()])?;
        if !chgrp.success() {
            warn!("chgrp on {} exited with {}: {}", dir_str, chgrp.code, chgrp.stderr.trim());
        }

        Ok(dir)
    }

    /// Mounts the filesystem with `uuid` on `{mount_root}/{label}`.
    ///
    /// None of the outcomes is an error; each is reported to the notifier.
    pub fn mount(&self, uuid: &str, label: &str) -> Result<MountOutcome> {
        let dir = self.ensure_mount_directory(label)?;
        let dir_str = dir.to_string_lossy().into_owned();

        let output = self.run_privileged(
            "mount",
            &["--uuid", uuid, dir_str.as_str(), "-o", "umask=000"],
        )?;

        let outcome = MountOutcome::from_exit_code(output.code);
        match outcome {
            MountOutcome::Mounted => {
                info!("mounted {} ({}) on {}", label, uuid, dir.display());
                self.notifier
                    .success(&format!("USB [{}] mounted on: {}", label, dir.display()));
            }
            MountOutcome::AlreadyMounted => {
                self.notifier
                    .warning(&format!("USB [{}] was already mounted", label));
            }
            MountOutcome::Unknown(code) => {
                warn!("mount {} exited with {}: {}", label, code, output.stderr.trim());
                self.notifier
                    .warning(&format!("Unknown return code {} mounting USB [{}]", code, label));
            }
        }
        Ok(outcome)
    }

    /// Favorites that are currently mounted, in favorites-list order.
    ///
    /// A favorite counts as mounted when a partition with that label has a
    /// mount point, or when any partition is mounted at the conventional
    /// `{mount_root}/{label}`. The record carries the actual mount point.
    pub fn list_mounted(&self, favorites: &[String], show_output: bool) -> Result<Vec<MountRecord>> {
        let output = self
            .runner
            .run(&CommandSpec::new("lsblk", disk::LSBLK_ARGS))?;
        if !output.success() {
            return Err(Error::CommandExit {
                command: "lsblk".to_string(),
                code: output.code,
                stderr: output.stderr,
            });
        }
        let devices = disk::parse_lsblk(&output.stdout)?;

        let mut mounted = Vec::new();
        for label in favorites {
            if let Some(mount_directory) = self.find_mount_point(&devices, label) {
                if show_output {
                    self.notifier.success(&format!(
                        "USB [{}] mounted on: {}",
                        label,
                        mount_directory.display()
                    ));
                }
                mounted.push(MountRecord {
                    label: label.clone(),
                    mount_directory,
                });
            }
        }

        if mounted.is_empty() && show_output {
            self.notifier.warning("No favorite USB devices mounted!");
        }

        Ok(mounted)
    }

    fn find_mount_point(&self, devices: &[BlockDevice], label: &str) -> Option<PathBuf> {
        let conventional = self.mount_directory(label);
        devices
            .iter()
            .filter(|d| d.is_mounted())
            .find(|d| {
                d.label.as_deref() == Some(label) || d.mountpoint.as_deref() == Some(conventional.as_path())
            })
            .and_then(|d| d.mountpoint.clone())
    }

    /// Unmounts a single record and removes its mount directory.
    ///
    /// When `umount` fails the directory is kept and a warning is emitted.
    /// Only `{mount_root}/{label}` is ever removed; a favorite mounted
    /// elsewhere is unmounted and its mount point left alone.
    pub fn unmount(&self, record: &MountRecord) -> Result<UnmountOutcome> {
        let dir_str = record.mount_directory.to_string_lossy().into_owned();

        let output = self.run_privileged("umount", &[dir_str.as_str()])?;
        if !output.success() {
            warn!("umount {} exited with {}: {}", dir_str, output.code, output.stderr.trim());
            self.notifier.warning(&format!(
                "USB [{}] could not be unmounted, keeping {}",
                record.label, dir_str
            ));
            return Ok(UnmountOutcome::Failed {
                code: output.code,
                stderr: output.stderr,
            });
        }
        info!("unmounted {}", dir_str);
        self.notifier
            .info(&format!("USB [{}] unmounted", record.label));

        if record.mount_directory != self.mount_directory(&record.label) {
            warn!("{} is outside {}, not removing it", dir_str, self.mount_root.display());
            return Ok(UnmountOutcome::Unmounted);
        }

        let removal = self.run_privileged("rm", &["-rf", dir_str.as_str()])?;
        if !removal.success() {
            warn!("could not remove {}: {}", dir_str, removal.stderr.trim());
        }

        Ok(UnmountOutcome::Unmounted)
    }

    /// Lists mounted favorites and asks before unmounting each.
    pub fn unmount_interactive(
        &self,
        favorites: &[String],
        prompt: &mut dyn Prompt,
    ) -> Result<Vec<(MountRecord, UnmountOutcome)>> {
        let mut results = Vec::new();
        for record in self.list_mounted(favorites, true)? {
            let answer = prompt.ask(&format!(
                "Do you want to unmount {}? [Yes/No]: ",
                record.label
            ))?;
            let outcome = if matches!(answer.to_lowercase().as_str(), "y" | "yes") {
                self.unmount(&record)?
            } else {
                UnmountOutcome::Skipped
            };
            results.push((record, outcome));
        }
        Ok(results)
    }
}
