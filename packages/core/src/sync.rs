//! One-way mirror sync through `rsync`.

use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

use log::info;

use crate::error::{Error, Result};
use crate::executor::{CommandRunner, CommandSpec};

/// `rsync -rt <src>/ <dst>/ --delete`: recursive, keep times, delete
/// destination files absent from the source.
pub fn mirror_command(source: &Path, destination: &Path) -> CommandSpec {
    CommandSpec::new(
        "rsync",
        [
            OsString::from("-rt"),
            contents_of(source),
            contents_of(destination),
            OsString::from("--delete"),
        ],
    )
}

/// `path/`, so rsync copies the directory's contents rather than the directory.
fn contents_of(path: &Path) -> OsString {
    let mut arg = path.as_os_str().to_os_string();
    arg.push("/");
    arg
}

#[derive(Clone)]
pub struct Mirror {
    runner: Arc<dyn CommandRunner>,
}

impl Mirror {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Makes `destination` an exact copy of `source`.
    pub fn sync(&self, source: &Path, destination: &Path) -> Result<()> {
        let spec = mirror_command(source, destination);
        let output = self.runner.run(&spec)?;
        if !output.success() {
            return Err(Error::CommandExit {
                command: spec.to_string(),
                code: output.code,
                stderr: output.stderr,
            });
        }
        info!("synced {} -> {}", source.display(), destination.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ExecutionContext;
    use crate::executor::fake::FakeRunner;
    use std::fs;
    use std::process::Command;
    use tempfile::TempDir;

    fn rsync_available() -> bool {
        Command::new("rsync")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[test]
    fn test_mirror_command_shape() {
        let spec = mirror_command(Path::new("/home/me/docs"), Path::new("/media/BACKUP/docs"));
        assert_eq!(spec.to_string(), "rsync -rt /home/me/docs/ /media/BACKUP/docs/ --delete");
        assert!(!spec.privileged);
    }

    #[test]
    fn test_mirror_command_keeps_non_utf8_paths() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let source = Path::new(OsStr::from_bytes(b"/home/me/caf\xe9"));
        let spec = mirror_command(source, Path::new("/media/BACKUP"));
        assert_eq!(spec.args[1].as_bytes(), b"/home/me/caf\xe9/");
        assert_eq!(spec.args[2], "/media/BACKUP/");
    }

    #[test]
    fn test_failed_rsync_is_an_error() {
        let mirror = Mirror::new(Arc::new(FakeRunner::new().program("rsync", "", 23)));
        assert!(matches!(
            mirror.sync(Path::new("/a"), Path::new("/b")),
            Err(Error::CommandExit { code: 23, .. })
        ));
    }

    #[test]
    fn test_mirror_deletes_removed_files() {
        if !rsync_available() {
            eprintln!("skipped: rsync not installed");
            return;
        }
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::write(src.path().join("a.txt"), "alpha").unwrap();
        fs::write(src.path().join("b.txt"), "beta").unwrap();

        let mirror = Mirror::new(Arc::new(ExecutionContext::default()));
        mirror.sync(src.path(), dst.path()).unwrap();
        assert_eq!(fs::read_to_string(dst.path().join("a.txt")).unwrap(), "alpha");
        assert_eq!(fs::read_to_string(dst.path().join("b.txt")).unwrap(), "beta");

        fs::remove_file(src.path().join("a.txt")).unwrap();
        mirror.sync(src.path(), dst.path()).unwrap();
        assert!(!dst.path().join("a.txt").exists());
        assert!(dst.path().join("b.txt").exists());
    }
}
