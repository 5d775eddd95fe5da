use usbmirror_core::folders::home_dir;
use usbmirror_core::{
    DesktopNotifier, FolderRegistry, Mirror, Result, UsbActions, WatchLoop, signal,
};

use crate::App;

/// Subscribes to every registered folder and blocks until SIGINT/SIGTERM.
pub fn run(app: &App) -> Result<()> {
    let config = &app.config;
    let pairs = FolderRegistry::new(&config.folders_path).pairs(&home_dir()?)?;
    if pairs.is_empty() {
        app.notifier
            .warning("No folders to watch, add some with 'usbmirror folders -a'");
        return Ok(());
    }

    let mounted = UsbActions::from_config(config, app.runner.clone(), app.notifier.clone())
        .mounted_labels();

    signal::install_interrupt_handler()?;

    let watch = WatchLoop::new(
        Mirror::new(app.runner.clone()),
        app.notifier.clone(),
        DesktopNotifier::new(app.runner.clone(), config.desktop_notifications),
        config.debounce(),
        config.poll_interval(),
    );
    let running = watch.start(&pairs, &mounted, &config.ignore_device)?;
    watch.run_until(running, signal::interrupted);
    Ok(())
}
