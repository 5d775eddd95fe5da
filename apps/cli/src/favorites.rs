use clap::Args;
use usbmirror_core::{FavoriteStore, Result, StdinPrompt};

use crate::{App, help_hint};

#[derive(Args)]
pub struct FavoritesArgs {
    /// Add USB labels until 'quit' is entered.
    #[arg(short, long)]
    add: bool,
    /// Delete a USB label.
    #[arg(short, long)]
    delete: bool,
    /// Remove the whole favorites store.
    #[arg(short, long)]
    remove: bool,
    /// Show the stored USB labels.
    #[arg(short, long)]
    show: bool,
}

pub fn run(app: &App, args: &FavoritesArgs) -> Result<()> {
    let store = FavoriteStore::new(&app.config.favorites_path);
    let mut prompt = StdinPrompt;

    if !(args.add || args.delete || args.remove || args.show) {
        help_hint("favorites");
        return Ok(());
    }

    // A fresh store asks for its first labels before anything else.
    if args.delete || args.show {
        store.load(&mut prompt)?;
    }

    if args.add {
        println!("add usb name");
        store.add_interactive(&mut prompt)?;
    }

    if args.delete {
        println!("delete usb name");
        let remaining = store.delete_interactive(&mut prompt)?;
        app.notifier
            .info(&format!("item deleted, {} label(s) left", remaining.len()));
    }

    if args.remove {
        println!("remove database");
        if store.destroy(&mut prompt)? {
            app.notifier
                .info(&format!("{} removed", store.path().display()));
        } else {
            app.notifier.info("nothing removed");
        }
    }

    if args.show {
        println!("show usb names");
        for label in store.show()? {
            println!("  {}", label);
        }
    }

    Ok(())
}
