//! Block-device metadata parsing.
//!
//! Pure text-to-structure functions over `blkid` and `lsblk --json`
//! output. Nothing here spawns a process, so every heuristic can be tested
//! against canned output.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};

/// `UUID=` preceded by whitespace, so `PARTUUID=` and `UUID_SUB=` never match.
static UUID_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\sUUID=(\S+)").expect("valid UUID regex"));

/// Outcome of extracting a filesystem UUID from `blkid` text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UuidParse {
    /// The UUID with surrounding quotes stripped.
    Found(String),
    /// No metadata text at all.
    NoMatch,
    /// Text was present but carried no `UUID=` token.
    Malformed,
}

/// Lines of `blkid` output that mention `label`.
///
/// This is a plain substring match, the same test `blkid | grep <label>`
/// performs; a label that is a substring of another device's line matches
/// that line too.
pub fn blkid_lines_matching<'a>(blkid_output: &'a str, label: &str) -> Vec<&'a str> {
    if label.is_empty() {
        return Vec::new();
    }
    blkid_output
        .lines()
        .filter(|line| line.contains(label))
        .collect()
}

/// Extracts the first `UUID=<token>` field from `blkid` text.
pub fn parse_uuid(text: &str) -> UuidParse {
    if text.trim().is_empty() {
        return UuidParse::NoMatch;
    }
    // A leading space lets a field at the very start of the text match too.
    let padded = format!(" {}", text);
    match UUID_FIELD.captures(&padded) {
        Some(caps) => {
            let uuid = caps[1].trim_matches('"');
            if uuid.is_empty() {
                UuidParse::Malformed
            } else {
                UuidParse::Found(uuid.to_string())
            }
        }
        None => UuidParse::Malformed,
    }
}

/// A partition as reported by `lsblk`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDevice {
    /// Device name (e.g., "sdb1").
    pub name: String,
    /// Volume label, if set.
    pub label: Option<String>,
    /// Filesystem UUID.
    pub uuid: Option<String>,
    /// Current mount point, if mounted.
    pub mountpoint: Option<PathBuf>,
}

impl BlockDevice {
    /// Returns true if this device is currently mounted.
    pub fn is_mounted(&self) -> bool {
        self.mountpoint.is_some()
    }
}

/// Arguments for the live listing consumed by [`parse_lsblk`].
pub const LSBLK_ARGS: [&str; 3] = ["--json", "--output", "NAME,LABEL,UUID,MOUNTPOINT"];

/// Raw JSON structure from lsblk output.
#[derive(Debug, Deserialize)]
struct LsblkOutput {
    blockdevices: Vec<LsblkDevice>,
}

#[derive(Debug, Deserialize)]
struct LsblkDevice {
    name: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    mountpoint: Option<String>,
    #[serde(default)]
    children: Option<Vec<LsblkDevice>>,
}

/// Parses `lsblk --json` output, flattening disks and their partitions.
pub fn parse_lsblk(json: &str) -> Result<Vec<BlockDevice>> {
    let output: LsblkOutput = serde_json::from_str(json).map_err(|e| Error::LsblkParse {
        message: e.to_string(),
    })?;

    let mut devices = Vec::new();
    collect_devices(&output.blockdevices, &mut devices);
    Ok(devices)
}

fn collect_devices(lsblk_devices: &[LsblkDevice], devices: &mut Vec<BlockDevice>) {
    for dev in lsblk_devices {
        devices.push(BlockDevice {
            name: dev.name.clone(),
            label: dev.label.clone().filter(|l| !l.is_empty()),
            uuid: dev.uuid.clone(),
            mountpoint: dev
                .mountpoint
                .as_deref()
                .filter(|m| !m.is_empty())
                .map(PathBuf::from),
        });

        if let Some(children) = &dev.children {
            collect_devices(children, devices);
        }
    }
}
