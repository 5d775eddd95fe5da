use clap::Args;
use usbmirror_core::{Result, StdinPrompt, UsbActions};

use crate::{App, help_hint};

#[derive(Args)]
pub struct UsbArgs {
    /// List mounted favorite USBs.
    #[arg(short, long)]
    list: bool,
    /// Mount connected favorite USBs.
    #[arg(short, long)]
    mount: bool,
    /// Unmount mounted favorite USBs, asking for each.
    #[arg(short, long)]
    umount: bool,
}

pub fn run(app: &App, args: &UsbArgs) -> Result<()> {
    let actions = UsbActions::from_config(&app.config, app.runner.clone(), app.notifier.clone());
    let mut prompt = StdinPrompt;

    if !(args.list || args.mount || args.umount) {
        help_hint("usb");
        return Ok(());
    }

    if args.list {
        println!("list connected USBs");
        actions.list_mounted_favorites(true, &mut prompt)?;
    }

    if args.mount {
        println!("mount connected USBs");
        actions.mount_all_favorites(&mut prompt)?;
    }

    if args.umount {
        println!("umount connected USBs");
        actions.unmount_all_favorites(&mut prompt)?;
    }

    Ok(())
}
