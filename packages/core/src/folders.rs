//! Folder registry: the source → destination pairs the watch loop mirrors.
//!
//! Stored as `{"Folders": [{"folder_id", "folder_to_track",
//! "folder_to_copy_to"}, ...]}` with paths relative to the home directory.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Error, IoResultExt, Result};
use crate::prompt::Prompt;
use crate::store;

/// Value stored for a field left blank in the interactive add flow.
pub const NULL_FIELD: &str = "null";

/// Editable path fields, in prompt order.
pub const FIELDS: [&str; 2] = ["folder_to_track", "folder_to_copy_to"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEntry {
    pub folder_id: String,
    pub folder_to_track: String,
    pub folder_to_copy_to: String,
}

impl FolderEntry {
    fn field_mut(&mut self, field: &str) -> Result<&mut String> {
        match field {
            "folder_to_track" => Ok(&mut self.folder_to_track),
            "folder_to_copy_to" => Ok(&mut self.folder_to_copy_to),
            _ => Err(Error::UnknownField {
                field: field.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderFile {
    #[serde(rename = "Folders", default)]
    pub folders: Vec<FolderEntry>,
}

/// A watched source folder and its mirror destination, both absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderPair {
    pub source: PathBuf,
    pub destination: PathBuf,
}

#[derive(Debug, Clone)]
pub struct FolderRegistry {
    path: PathBuf,
}

impl FolderRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        store::sibling(&self.path, ".bak")
    }

    fn read_unlocked(&self) -> Result<FolderFile> {
        store::read_json(&self.path)?.ok_or_else(|| Error::MissingStore {
            path: self.path.clone(),
        })
    }

    /// Loads the registry. A missing file is [`Error::MissingStore`].
    pub fn load(&self) -> Result<FolderFile> {
        let _lock = store::lock(&self.path)?;
        self.read_unlocked()
    }

    /// Loads the registry, treating a missing file as empty.
    fn load_or_default(&self) -> Result<FolderFile> {
        match self.read_unlocked() {
            Err(Error::MissingStore { .. }) => Ok(FolderFile::default()),
            other => other,
        }
    }

    pub fn entries(&self) -> Result<Vec<FolderEntry>> {
        Ok(self.load()?.folders)
    }

    /// Runs `f` on the registry under the lock and saves the result.
    fn update<T>(
        &self,
        create: bool,
        f: impl FnOnce(&mut FolderFile) -> Result<T>,
    ) -> Result<T> {
        let _lock = store::lock(&self.path)?;
        let mut file = if create {
            self.load_or_default()?
        } else {
            self.read_unlocked()?
        };
        let value = f(&mut file)?;
        store::write_json(&self.path, &file)?;
        Ok(value)
    }

    /// Id the next added entry receives.
    pub fn next_id(&self) -> Result<u64> {
        let _lock = store::lock(&self.path)?;
        next_id(&self.load_or_default()?)
    }

    /// Appends a new entry with the next id, creating the file if needed.
    pub fn add(&self, folder_to_track: &str, folder_to_copy_to: &str) -> Result<FolderEntry> {
        let entry = self.update(true, |file| {
            let entry = FolderEntry {
                folder_id: next_id(file)?.to_string(),
                folder_to_track: folder_to_track.to_string(),
                folder_to_copy_to: folder_to_copy_to.to_string(),
            };
            file.folders.push(entry.clone());
            Ok(entry)
        })?;
        info!("added folder {} -> {}", entry.folder_to_track, entry.folder_to_copy_to);
        Ok(entry)
    }

    /// Prompts for both paths; a blank answer stores `null`.
    pub fn add_interactive(&self, prompt: &mut dyn Prompt) -> Result<FolderEntry> {
        let mut values = Vec::with_capacity(FIELDS.len());
        for field in FIELDS {
            let value = prompt.ask(&format!("Add {}: ", field))?;
            values.push(if value.is_empty() {
                NULL_FIELD.to_string()
            } else {
                value
            });
        }
        self.add(&values[0], &values[1])
    }

    /// Removes the entry whose id equals `id`.
    pub fn delete(&self, id: &str) -> Result<FolderEntry> {
        let removed = self.update(false, |file| {
            let index = file
                .folders
                .iter()
                .position(|e| e.folder_id == id)
                .ok_or_else(|| Error::RecordNotFound { id: id.to_string() })?;
            Ok(file.folders.remove(index))
        })?;
        info!("deleted folder id {}", id);
        Ok(removed)
    }

    /// Sets one path field of the entry with `id`.
    pub fn edit(&self, id: &str, field: &str, value: &str) -> Result<FolderEntry> {
        self.update(false, |file| {
            let entry = file
                .folders
                .iter_mut()
                .find(|e| e.folder_id == id)
                .ok_or_else(|| Error::RecordNotFound { id: id.to_string() })?;
            *entry.field_mut(field)? = value.to_string();
            Ok(entry.clone())
        })
    }

    /// Asks for an id, then for each field whether to change it.
    ///
    /// A field changes only after a `yes` answer and a non-empty new value.
    pub fn edit_interactive(&self, prompt: &mut dyn Prompt) -> Result<FolderEntry> {
        let id = prompt.ask("Type the folder id to modify: ")?;
        let mut entry = self
            .entries()?
            .into_iter()
            .find(|e| e.folder_id == id)
            .ok_or_else(|| Error::RecordNotFound { id: id.clone() })?;

        for field in FIELDS {
            let modify = prompt.ask(&format!(
                "Do you want to modify the field {} of record {}?: ",
                field, id
            ))?;
            if !modify.to_lowercase().contains("yes") {
                continue;
            }
            let value = prompt.ask(&format!("Enter the new value for {} of {}: ", field, id))?;
            if !value.is_empty() {
                entry = self.edit(&id, field, &value)?;
            }
        }
        Ok(entry)
    }

    /// Copies the registry to `<file>.bak`.
    pub fn backup(&self) -> Result<PathBuf> {
        let backup = self.backup_path();
        if !self.path.exists() {
            return Err(Error::MissingStore {
                path: self.path.clone(),
            });
        }
        let _lock = store::lock(&self.path)?;
        fs::copy(&self.path, &backup).backup_context(&self.path, &backup)?;
        info!("backed up {} to {}", self.path.display(), backup.display());
        Ok(backup)
    }

    /// Copies `<file>.bak` back over the registry.
    pub fn restore(&self) -> Result<()> {
        let backup = self.backup_path();
        if !backup.exists() {
            return Err(Error::MissingStore { path: backup });
        }
        let _lock = store::lock(&self.path)?;
        fs::copy(&backup, &self.path).backup_context(&backup, &self.path)?;
        info!("restored {} from {}", self.path.display(), backup.display());
        Ok(())
    }

    /// Absolute source/destination pairs under `home`.
    pub fn pairs(&self, home: &Path) -> Result<Vec<FolderPair>> {
        Ok(pairs_from(&self.load()?, home))
    }
}

/// The user's home directory, which registry paths are relative to.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(Error::HomeDirNotFound)
}

fn next_id(file: &FolderFile) -> Result<u64> {
    match file.folders.last() {
        None => Ok(1),
        Some(last) => last
            .folder_id
            .trim()
            .parse::<u64>()
            .map(|id| id + 1)
            .map_err(|_| Error::InvalidFolderId {
                id: last.folder_id.clone(),
            }),
    }
}

/// Joins every entry to `home`. Sources are unique: a later entry with the
/// same source replaces the destination of the earlier one in place.
pub fn pairs_from(file: &FolderFile, home: &Path) -> Vec<FolderPair> {
    let mut pairs: Vec<FolderPair> = Vec::new();
    for entry in &file.folders {
        let source = home.join(&entry.folder_to_track);
        let destination = home.join(&entry.folder_to_copy_to);
        match pairs.iter_mut().find(|p| p.source == source) {
            Some(existing) => existing.destination = destination,
            None => pairs.push(FolderPair {
                source,
                destination,
            }),
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompt;
    use tempfile::TempDir;

    const ONE_ENTRY: &str =
        r#"{"Folders":[{"folder_id":"1","folder_to_track":"x","folder_to_copy_to":"y"}]}"#;

    fn registry(content: Option<&str>) -> (TempDir, FolderRegistry) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("folders.json");
        if let Some(content) = content {
            fs::write(&path, content).unwrap();
        }
        (dir, FolderRegistry::new(path))
    }

    #[test]
    fn test_add_assigns_next_id() {
        let (_dir, registry) = registry(Some(ONE_ENTRY));
        let entry = registry.add("docs", "media/BACKUP").unwrap();
        assert_eq!(entry.folder_id, "2");
        assert_eq!(registry.entries().unwrap().len(), 2);
    }

    #[test]
    fn test_add_to_missing_file_starts_at_one() {
        let (_dir, registry) = registry(None);
        assert_eq!(registry.next_id().unwrap(), 1);
        assert_eq!(registry.add("a", "b").unwrap().folder_id, "1");
    }

    #[test]
    fn test_delete_leaves_no_empty_record() {
        let (_dir, registry) = registry(Some(ONE_ENTRY));
        registry.delete("1").unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(registry.path()).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({"Folders": []}));
    }

    #[test]
    fn test_delete_matches_whole_id() {
        let (_dir, registry) = registry(Some(ONE_ENTRY));
        registry.add("a", "b").unwrap();
        for _ in 0..9 {
            registry.add("c", "d").unwrap();
        }
        registry.delete("1").unwrap();
        let ids: Vec<_> = registry.entries().unwrap().into_iter().map(|e| e.folder_id).collect();
        assert!(ids.contains(&"10".to_string()));
        assert!(ids.contains(&"11".to_string()));
        assert!(!ids.contains(&"1".to_string()));
    }

    #[test]
    fn test_delete_unknown_id() {
        let (_dir, registry) = registry(Some(ONE_ENTRY));
        assert!(matches!(
            registry.delete("7"),
            Err(Error::RecordNotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_last_id() {
        let (_dir, registry) = registry(Some(
            r#"{"Folders":[{"folder_id":"abc","folder_to_track":"x","folder_to_copy_to":"y"}]}"#,
        ));
        assert!(matches!(
            registry.add("a", "b"),
            Err(Error::InvalidFolderId { .. })
        ));
    }

    #[test]
    fn test_add_interactive_blank_is_null() {
        let (_dir, registry) = registry(Some(ONE_ENTRY));
        let mut prompt = ScriptedPrompt::new(["Documents", ""]);
        let entry = registry.add_interactive(&mut prompt).unwrap();
        assert_eq!(entry.folder_to_track, "Documents");
        assert_eq!(entry.folder_to_copy_to, NULL_FIELD);
    }

    #[test]
    fn test_edit_interactive_only_changes_confirmed_fields() {
        let (_dir, registry) = registry(Some(ONE_ENTRY));
        let mut prompt = ScriptedPrompt::new(["1", "no", "yes", "/media/NEW"]);
        let entry = registry.edit_interactive(&mut prompt).unwrap();

        assert_eq!(entry.folder_to_track, "x");
        assert_eq!(entry.folder_to_copy_to, "/media/NEW");
        assert_eq!(registry.entries().unwrap()[0], entry);
    }

    #[test]
    fn test_edit_unknown_field() {
        let (_dir, registry) = registry(Some(ONE_ENTRY));
        assert!(matches!(
            registry.edit("1", "folder_id", "9"),
            Err(Error::UnknownField { .. })
        ));
    }

    #[test]
    fn test_backup_and_restore() {
        let (_dir, registry) = registry(Some(ONE_ENTRY));
        let backup = registry.backup().unwrap();
        assert!(backup.ends_with("folders.json.bak"));

        registry.delete("1").unwrap();
        registry.restore().unwrap();
        assert_eq!(registry.entries().unwrap().len(), 1);
    }

    #[test]
    fn test_backup_and_restore_missing_files() {
        let (_dir, registry) = registry(None);
        assert!(matches!(registry.backup(), Err(Error::MissingStore { .. })));
        assert!(matches!(registry.restore(), Err(Error::MissingStore { .. })));
    }

    #[test]
    fn test_pairs_are_home_relative_and_unique_by_source() {
        let file: FolderFile = serde_json::from_str(
            r#"{"Folders":[
                {"folder_id":"1","folder_to_track":"docs","folder_to_copy_to":"old"},
                {"folder_id":"2","folder_to_track":"pics","folder_to_copy_to":"media/PHOTOS"},
                {"folder_id":"3","folder_to_track":"docs","folder_to_copy_to":"new"}
            ]}"#,
        )
        .unwrap();
        let pairs = pairs_from(&file, Path::new("/home/me"));

        assert_eq!(
            pairs,
            vec![
                FolderPair {
                    source: PathBuf::from("/home/me/docs"),
                    destination: PathBuf::from("/home/me/new"),
                },
                FolderPair {
                    source: PathBuf::from("/home/me/pics"),
                    destination: PathBuf::from("/home/me/media/PHOTOS"),
                },
            ]
        );
    }
}
