use clap::Args;
use usbmirror_core::folders::FolderEntry;
use usbmirror_core::{Error, FolderRegistry, Prompt, Result, StdinPrompt};

use crate::{App, help_hint};

#[derive(Args)]
pub struct FoldersArgs {
    /// Add a folder pair.
    #[arg(short, long)]
    add: bool,
    /// Back up the folder registry to a .bak file.
    #[arg(short, long)]
    backup: bool,
    /// Delete a folder pair by id.
    #[arg(short, long)]
    delete: bool,
    /// Edit a folder pair.
    #[arg(short, long)]
    edit: bool,
    /// Restore the folder registry from its .bak file.
    #[arg(short, long)]
    restore: bool,
    /// Show the registered folder pairs.
    #[arg(short, long)]
    view: bool,
}

pub fn run(app: &App, args: &FoldersArgs) -> Result<()> {
    let registry = FolderRegistry::new(&app.config.folders_path);
    let mut prompt = StdinPrompt;

    if !(args.add || args.backup || args.delete || args.edit || args.restore || args.view) {
        help_hint("folders");
        return Ok(());
    }

    if args.add {
        app.notifier.info(&format!("The next id to insert is: {}", registry.next_id()?));
        let entry = registry.add_interactive(&mut prompt)?;
        app.notifier.success(&format!(
            "Inserted folder id {}: {} -> {}",
            entry.folder_id, entry.folder_to_track, entry.folder_to_copy_to
        ));
    }

    if args.backup {
        match registry.backup() {
            Ok(backup) => app
                .notifier
                .success(&format!("Backup <{}> created", backup.display())),
            Err(Error::MissingStore { path }) => app
                .notifier
                .warning(&format!("<{}> not found!", path.display())),
            Err(e) => return Err(e),
        }
    }

    if args.delete {
        print_table(&registry.entries()?);
        let id = prompt.ask("Which folder id would you like to delete?: ")?;
        if !id.is_empty() {
            registry.delete(&id)?;
            app.notifier.success(&format!("Folder id <{}> deleted", id));
        }
    }

    if args.edit {
        print_table(&registry.entries()?);
        match registry.edit_interactive(&mut prompt) {
            Ok(entry) => app
                .notifier
                .success(&format!("Folder id <{}> updated", entry.folder_id)),
            Err(Error::RecordNotFound { id }) => app
                .notifier
                .warning(&format!("Record <{}> not found or wrong key pressed!", id)),
            Err(e) => return Err(e),
        }
    }

    if args.restore {
        match registry.restore() {
            Ok(()) => app
                .notifier
                .success(&format!("<{}> restored", registry.path().display())),
            Err(Error::MissingStore { path }) => app
                .notifier
                .warning(&format!("<{}> not found!", path.display())),
            Err(e) => return Err(e),
        }
    }

    if args.view {
        println!("Folders to watch");
        print_table(&registry.entries()?);
    }

    Ok(())
}

fn print_table(entries: &[FolderEntry]) {
    let headers = ["folder_id", "folder_to_track", "folder_to_copy_to"];
    let rows: Vec<[&str; 3]> = entries
        .iter()
        .map(|e| {
            [
                e.folder_id.as_str(),
                e.folder_to_track.as_str(),
                e.folder_to_copy_to.as_str(),
            ]
        })
        .collect();

    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let line = |cells: [&str; 3]| {
        println!(
            "{:^w0$} | {:<w1$} | {:<w2$}",
            cells[0],
            cells[1],
            cells[2],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2]
        );
    };
    line(headers);
    println!("{}", "-".repeat(widths.iter().sum::<usize>() + 6));
    for row in rows {
        line(row);
    }
}
