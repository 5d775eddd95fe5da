//! usbmirror CLI - mount favorite USB drives and mirror watched folders.

mod favorites;
mod folders;
mod logging;
mod usb;
mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgAction, Parser, Subcommand};
use snafu::Report;
use usbmirror_core::{CommandRunner, Config, ConsoleNotifier, ExecutionContext, Notifier};

/// usbmirror CLI tool.
#[derive(Parser)]
#[command(name = "usbmirror", version)]
#[command(about = "Mount favorite USB drives and mirror watched folders to them", long_about = None)]
struct Cli {
    /// Increase log verbosity (repeatable).
    #[arg(long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the folders to watch.
    Folders(folders::FoldersArgs),
    /// Manage the favorite USB device labels.
    Favorites(favorites::FavoritesArgs),
    /// List, mount or unmount favorite USB devices.
    Usb(usb::UsbArgs),
    /// Mirror every registered folder on change until interrupted.
    Watch,
}

/// Shared capabilities handed to every command.
pub struct App {
    pub config: Config,
    pub runner: Arc<dyn CommandRunner>,
    pub notifier: Arc<dyn Notifier>,
}

/// Printed when a command is given without any action flag.
pub fn help_hint(command: &str) {
    println!("Type usbmirror {} -h for help", command);
}

fn run(cli: Cli) -> usbmirror_core::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let app = App {
        runner: Arc::new(ExecutionContext::with_escalation(config.escalation)),
        notifier: Arc::new(ConsoleNotifier),
        config,
    };

    match cli.command {
        Commands::Folders(args) => folders::run(&app, &args),
        Commands::Favorites(args) => favorites::run(&app, &args),
        Commands::Usb(args) => usb::run(&app, &args),
        Commands::Watch => watch::run(&app),
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("[!] {}", Report::from_error(e));
        std::process::exit(1);
    }
}
