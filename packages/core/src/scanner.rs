//! Favorite-device discovery via `blkid`.

use std::sync::Arc;

use log::debug;

use crate::disk::{self, UuidParse};
use crate::error::{Error, Result};
use crate::executor::{CommandOutput, CommandRunner, CommandSpec};
use crate::notice::Notifier;

/// A favorite that was found in the block-device metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedDevice {
    pub label: String,
    pub connected: bool,
}

/// A connected favorite together with its filesystem UUID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUuid {
    pub label: String,
    pub uuid: String,
}

pub struct DeviceScanner {
    runner: Arc<dyn CommandRunner>,
    notifier: Arc<dyn Notifier>,
}

impl DeviceScanner {
    pub fn new(runner: Arc<dyn CommandRunner>, notifier: Arc<dyn Notifier>) -> Self {
        Self { runner, notifier }
    }

    /// Runs the metadata query and returns the lines mentioning `label`, or
    /// `None` when the query fails or nothing matches.
    fn query(&self, label: &str) -> Result<Option<String>> {
        let output: CommandOutput = self
            .runner
            .run(&CommandSpec::privileged("blkid", Vec::<String>::new()))?;
        if !output.success() {
            debug!("blkid exited with {} while looking for {}", output.code, label);
            return Ok(None);
        }
        let lines = disk::blkid_lines_matching(&output.stdout, label);
        if lines.is_empty() {
            return Ok(None);
        }
        Ok(Some(lines.join("\n")))
    }

    /// Favorites currently plugged in, in favorites-list order.
    ///
    /// Devices that are not connected produce no entry.
    pub fn connected_favorites(&self, favorites: &[String]) -> Result<Vec<ConnectedDevice>> {
        let mut connected = Vec::new();
        for label in favorites {
            if self.query(label)?.is_some() {
                self.notifier.success(&format!("USB [{}] connected", label));
                connected.push(ConnectedDevice {
                    label: label.clone(),
                    connected: true,
                });
            }
        }
        Ok(connected)
    }

    /// Resolves the filesystem UUID of a connected favorite.
    ///
    /// # Errors
    /// - [`Error::DeviceNotConnected`] when the label is absent from the metadata
    /// - [`Error::UuidUnparsable`] when it is present but carries no `UUID=` field
    pub fn resolve_uuid(&self, label: &str) -> Result<ResolvedUuid> {
        let Some(text) = self.query(label)? else {
            return Err(Error::DeviceNotConnected {
                label: label.to_string(),
            });
        };

        match disk::parse_uuid(&text) {
            UuidParse::Found(uuid) => {
                self.notifier
                    .success(&format!("Found: USB [{}] with id: {}", label, uuid));
                Ok(ResolvedUuid {
                    label: label.to_string(),
                    uuid,
                })
            }
            UuidParse::NoMatch => Err(Error::DeviceNotConnected {
                label: label.to_string(),
            }),
            UuidParse::Malformed => Err(Error::UuidUnparsable {
                label: label.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::fake::FakeRunner;
    use crate::notice::MemoryNotifier;

    const BLKID: &str = concat!(
        "/dev/sdb1: LABEL=\"BACKUP\" UUID=\"5E2A-9C1F\" TYPE=\"exfat\"\n",
        "/dev/sdc1: LABEL=\"NOUUID\" TYPE=\"vfat\"\n",
    );

    fn scanner(runner: FakeRunner) -> (DeviceScanner, Arc<MemoryNotifier>) {
        let notifier = Arc::new(MemoryNotifier::new());
        (
            DeviceScanner::new(Arc::new(runner), notifier.clone()),
            notifier,
        )
    }

    fn favorites(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_connected_excludes_absent_labels() {
        let (scanner, notifier) = scanner(FakeRunner::new().program("blkid", BLKID, 0));
        let connected = scanner
            .connected_favorites(&favorites(&["MISSING", "BACKUP", "OTHER"]))
            .unwrap();

        assert_eq!(
            connected,
            vec![ConnectedDevice {
                label: "BACKUP".to_string(),
                connected: true
            }]
        );
        assert_eq!(notifier.messages(), ["USB [BACKUP] connected"]);
    }

    #[test]
    fn test_connected_keeps_favorites_order() {
        let (scanner, _) = scanner(FakeRunner::new().program("blkid", BLKID, 0));
        let connected = scanner
            .connected_favorites(&favorites(&["NOUUID", "BACKUP"]))
            .unwrap();
        let labels: Vec<_> = connected.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["NOUUID", "BACKUP"]);
    }

    #[test]
    fn test_blkid_failure_means_nothing_connected() {
        let (scanner, _) = scanner(FakeRunner::new().program("blkid", BLKID, 2));
        assert!(scanner
            .connected_favorites(&favorites(&["BACKUP"]))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_blkid_runs_privileged() {
        let runner = Arc::new(FakeRunner::new().program("blkid", BLKID, 0));
        let scanner = DeviceScanner::new(runner.clone(), Arc::new(MemoryNotifier::new()));
        scanner.resolve_uuid("BACKUP").unwrap();
        assert!(runner.calls().iter().all(|c| c.privileged));
    }

    #[test]
    fn test_resolve_uuid() {
        let (scanner, _) = scanner(FakeRunner::new().program("blkid", BLKID, 0));
        let resolved = scanner.resolve_uuid("BACKUP").unwrap();
        assert_eq!(resolved.uuid, "5E2A-9C1F");
    }

    #[test]
    fn test_resolve_uuid_not_connected() {
        let (scanner, _) = scanner(FakeRunner::new().program("blkid", BLKID, 0));
        assert!(matches!(
            scanner.resolve_uuid("MISSING"),
            Err(Error::DeviceNotConnected { label }) if label == "MISSING"
        ));
    }

    #[test]
    fn test_resolve_uuid_unparsable() {
        let (scanner, _) = scanner(FakeRunner::new().program("blkid", BLKID, 0));
        assert!(matches!(
            scanner.resolve_uuid("NOUUID"),
            Err(Error::UuidUnparsable { .. })
        ));
    }
}
