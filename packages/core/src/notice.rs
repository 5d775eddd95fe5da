//! User-facing notices.
//!
//! The core reports outcomes (device connected, already mounted, none found,
//! target not plugged in) through a [`Notifier`] handed to each component.
//! Diagnostics go to the `log` facade instead.

use std::sync::{Arc, Mutex};

use log::debug;

use crate::executor::{CommandRunner, CommandSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Warning,
}

impl Level {
    fn marker(self) -> &'static str {
        match self {
            Level::Success => "[+]",
            Level::Info => "[*]",
            Level::Warning => "[!]",
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, level: Level, message: &str);

    fn success(&self, message: &str) {
        self.notify(Level::Success, message);
    }

    fn info(&self, message: &str) {
        self.notify(Level::Info, message);
    }

    fn warning(&self, message: &str) {
        self.notify(Level::Warning, message);
    }
}

/// Prints notices to the terminal. Warnings go to stderr.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: Level, message: &str) {
        match level {
            Level::Warning => eprintln!("{} {}", level.marker(), message),
            _ => println!("{} {}", level.marker(), message),
        }
    }
}

/// Desktop popups through `notify-send`.
pub struct DesktopNotifier {
    runner: Arc<dyn CommandRunner>,
    enabled: bool,
}

impl DesktopNotifier {
    pub fn new(runner: Arc<dyn CommandRunner>, enabled: bool) -> Self {
        Self { runner, enabled }
    }

    /// Fires a title+message popup. Failures are logged and otherwise ignored.
    pub fn popup(&self, title: &str, message: &str) {
        if !self.enabled {
            return;
        }
        let spec = CommandSpec::new("notify-send", [title, message]);
        match self.runner.run(&spec) {
            Ok(output) if output.success() => {}
            Ok(output) => debug!("notify-send exited with {}: {}", output.code, output.stderr),
            Err(e) => debug!("notify-send unavailable: {}", e),
        }
    }
}

/// Collects notices in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notices: Mutex<Vec<(Level, String)>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<(Level, String)> {
        self.notices
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notices().into_iter().map(|(_, m)| m).collect()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, level: Level, message: &str) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push((level, message.to_string()));
        }
    }
}
