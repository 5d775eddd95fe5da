//! Unified error types for the usbmirror-core library.
//!
//! Uses SNAFU for context-rich error handling, especially useful when the same
//! underlying error type (like `std::io::Error`) appears in different contexts.
//!
//! Conditions that the interactive tools treat as "report and stop" (an empty
//! favorites store, a label that is not stored, a missing file) are ordinary
//! variants here. Only the CLI decides to terminate the process.

use snafu::{ResultExt, Snafu};
use std::path::PathBuf;

/// Result type alias using the library's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for all core library operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Failed to execute a system command.
    #[snafu(display("failed to execute command '{command}'"))]
    CommandExecution {
        command: String,
        source: std::io::Error,
    },

    /// Command executed but returned non-zero exit code.
    #[snafu(display("command '{command}' exited with code {code}: {stderr}"))]
    CommandExit {
        command: String,
        code: i32,
        stderr: String,
    },

    /// Failed to parse lsblk JSON output.
    #[snafu(display("failed to parse lsblk output: {message}"))]
    LsblkParse { message: String },

    /// The device label does not appear in the block-device metadata.
    #[snafu(display("USB [{label}] not connected"))]
    DeviceNotConnected { label: String },

    /// blkid listed the device but no `UUID=` field could be extracted.
    #[snafu(display("USB [{label}] found in block-device metadata but its UUID is unparsable"))]
    UuidUnparsable { label: String },

    /// The favorites store has no entries.
    #[snafu(display("the favorites store at {} is empty, add some devices first", path.display()))]
    EmptyStore { path: PathBuf },

    /// The favorites store file does not exist.
    #[snafu(display("the store {} does not exist, create a new one first", path.display()))]
    MissingStore { path: PathBuf },

    /// A label was not present in the favorites store.
    #[snafu(display("item '{item}' not found"))]
    NotFound { item: String },

    /// Failed to read a persisted store.
    #[snafu(display("failed to read {}", path.display()))]
    StoreRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write a persisted store.
    #[snafu(display("failed to write {}", path.display()))]
    StoreWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A persisted store held invalid JSON.
    #[snafu(display("failed to parse {}", path.display()))]
    StoreParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Could not take the advisory lock guarding a store.
    #[snafu(display("failed to lock {}", path.display()))]
    StoreLock {
        path: PathBuf,
        source: nix::errno::Errno,
    },

    /// Backup or restore copy failed.
    #[snafu(display("failed to copy {} to {}", from.display(), to.display()))]
    Backup {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    /// No folder entry carries the requested id.
    #[snafu(display("record not found for folder id '{id}'"))]
    RecordNotFound { id: String },

    /// A folder id in the registry is not numeric.
    #[snafu(display("invalid folder id '{id}'"))]
    InvalidFolderId { id: String },

    /// Unknown field name given to a folder edit.
    #[snafu(display("unknown folder field '{field}'"))]
    UnknownField { field: String },

    /// Failed to read the configuration file.
    #[snafu(display("failed to read config at {}", path.display()))]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse the configuration file.
    #[snafu(display("failed to parse config at {}", path.display()))]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Home directory not found.
    #[snafu(display("Could not determine home directory"))]
    HomeDirNotFound,

    /// Filesystem watcher could not be created or attached.
    #[snafu(display("failed to watch {}", path.display()))]
    Watch {
        path: PathBuf,
        source: notify::Error,
    },

    /// Installing the interrupt handler failed.
    #[snafu(display("failed to install signal handler"))]
    Signal { source: ctrlc::Error },

    /// Reading an answer from the user failed.
    #[snafu(display("failed to read user input"))]
    Prompt { source: dialoguer::Error },
}

/// Extension trait for adding context to io::Error results.
pub trait IoResultExt<T> {
    /// Add context for command execution errors.
    fn command_context(self, command: impl Into<String>) -> Result<T>;

    /// Add context for store read errors.
    fn store_read_context(self, path: impl Into<PathBuf>) -> Result<T>;

    /// Add context for store write errors.
    fn store_write_context(self, path: impl Into<PathBuf>) -> Result<T>;

    /// Add context for backup/restore copies.
    fn backup_context(self, from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, std::io::Error> {
    fn command_context(self, command: impl Into<String>) -> Result<T> {
        self.context(CommandExecutionSnafu {
            command: command.into(),
        })
    }

    fn store_read_context(self, path: impl Into<PathBuf>) -> Result<T> {
        self.context(StoreReadSnafu { path: path.into() })
    }

    fn store_write_context(self, path: impl Into<PathBuf>) -> Result<T> {
        self.context(StoreWriteSnafu { path: path.into() })
    }

    fn backup_context(self, from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Result<T> {
        self.context(BackupSnafu {
            from: from.into(),
            to: to.into(),
        })
    }
}
