//! usbmirror-core: favorite USB drive mounting and folder mirroring.
//!
//! This library detects a known set of "favorite" USB storage devices by
//! volume label, mounts and unmounts them under a common root, and keeps
//! local folders mirrored to backup destinations with `rsync` whenever
//! their contents change.
//!
//! # Modules
//!
//! - [`executor`]: External command execution with privilege escalation
//! - [`disk`]: `blkid`/`lsblk` output parsing
//! - [`scanner`]: Connected-favorite detection and UUID resolution
//! - [`mount`]: Mount directory handling, mount/unmount, mounted listing
//! - [`usb`]: Mount-all / unmount-all / list entry points
//! - [`favorites`]: Favorite-device store
//! - [`folders`]: Folder registry (source → destination pairs)
//! - [`sync`]: One-way mirror sync
//! - [`watch`]: Filesystem watch loop
//! - [`error`]: Error types
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use usbmirror_core::{Config, ConsoleNotifier, ExecutionContext, StdinPrompt, UsbActions};
//!
//! let config = Config::default();
//! let runner = Arc::new(ExecutionContext::with_escalation(config.escalation));
//! let actions = UsbActions::from_config(&config, runner, Arc::new(ConsoleNotifier));
//!
//! // Mount every connected favorite under /media/<label>
//! actions.mount_all_favorites(&mut StdinPrompt).unwrap();
//! ```

pub mod config;
pub mod disk;
pub mod error;
pub mod executor;
pub mod favorites;
pub mod folders;
pub mod mount;
pub mod notice;
pub mod prompt;
pub mod scanner;
pub mod signal;
mod store;
pub mod sync;
pub mod usb;
pub mod watch;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use executor::{CommandRunner, CommandSpec, ExecutionContext, PrivilegeEscalation};
pub use favorites::FavoriteStore;
pub use folders::{FolderEntry, FolderPair, FolderRegistry};
pub use mount::{MountManager, MountOutcome, MountRecord, UnmountOutcome};
pub use notice::{ConsoleNotifier, DesktopNotifier, Notifier};
pub use prompt::{Prompt, StdinPrompt};
pub use scanner::DeviceScanner;
pub use sync::Mirror;
pub use usb::UsbActions;
pub use watch::WatchLoop;
