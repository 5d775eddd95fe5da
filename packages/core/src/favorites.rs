//! Favorite-device store.
//!
//! Persists the list of favorite USB volume labels as a single JSON record
//! under the `favorites` key. Every mutation rewrites the whole list.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Error, IoResultExt, Result};
use crate::prompt::Prompt;
use crate::store;

/// Answer that ends the interactive add loop.
pub const QUIT: &str = "quit";

#[derive(Debug, Default, Serialize, Deserialize)]
struct FavoritesRecord {
    #[serde(default)]
    favorites: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FavoriteStore {
    path: PathBuf,
}

impl FavoriteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// The persisted list, empty when the store does not exist yet.
    pub fn read(&self) -> Result<Vec<String>> {
        let _lock = store::lock(&self.path)?;
        self.read_unlocked()
    }

    fn read_unlocked(&self) -> Result<Vec<String>> {
        Ok(store::read_json::<FavoritesRecord>(&self.path)?
            .unwrap_or_default()
            .favorites)
    }

    fn write_unlocked(&self, favorites: &[String]) -> Result<()> {
        store::write_json(
            &self.path,
            &FavoritesRecord {
                favorites: favorites.to_vec(),
            },
        )
    }

    /// Returns the stored favorites; an empty or missing store first runs
    /// the interactive add flow.
    pub fn load(&self, prompt: &mut dyn Prompt) -> Result<Vec<String>> {
        let favorites = self.read()?;
        if favorites.is_empty() {
            return self.add_interactive(prompt);
        }
        Ok(favorites)
    }

    /// Appends one label and persists the full list.
    pub fn add(&self, label: &str) -> Result<Vec<String>> {
        let _lock = store::lock(&self.path)?;
        let mut favorites = self.read_unlocked()?;
        favorites.push(label.to_string());
        self.write_unlocked(&favorites)?;
        info!("added favorite {} to {}", label, self.path.display());
        Ok(favorites)
    }

    /// Prompts for labels until `quit`, persisting after every addition.
    pub fn add_interactive(&self, prompt: &mut dyn Prompt) -> Result<Vec<String>> {
        let mut favorites = self.read()?;
        loop {
            let item = prompt.ask("Enter the new item ('quit' to exit): ")?;
            if item == QUIT {
                break;
            }
            favorites = self.add(&item)?;
        }
        Ok(favorites)
    }

    /// Removes the first entry equal to `label`.
    ///
    /// # Errors
    /// - [`Error::EmptyStore`] when there is nothing to delete
    /// - [`Error::NotFound`] when `label` is not stored
    pub fn delete(&self, label: &str) -> Result<Vec<String>> {
        let _lock = store::lock(&self.path)?;
        let mut favorites = self.read_unlocked()?;
        if favorites.is_empty() {
            return Err(Error::EmptyStore {
                path: self.path.clone(),
            });
        }
        let Some(index) = favorites.iter().position(|f| f == label) else {
            return Err(Error::NotFound {
                item: label.to_string(),
            });
        };
        favorites.remove(index);
        self.write_unlocked(&favorites)?;
        info!("deleted favorite {} from {}", label, self.path.display());
        Ok(favorites)
    }

    /// Asks for a label and deletes it. An empty store fails before asking.
    pub fn delete_interactive(&self, prompt: &mut dyn Prompt) -> Result<Vec<String>> {
        if self.read()?.is_empty() {
            return Err(Error::EmptyStore {
                path: self.path.clone(),
            });
        }
        let item = prompt.ask("Enter the item to delete: ")?;
        self.delete(&item)
    }

    /// The stored favorites.
    ///
    /// # Errors
    /// - [`Error::MissingStore`] when the store file does not exist
    /// - [`Error::EmptyStore`] when it holds no labels
    pub fn show(&self) -> Result<Vec<String>> {
        if !self.exists() {
            return Err(Error::MissingStore {
                path: self.path.clone(),
            });
        }
        let favorites = self.read()?;
        if favorites.is_empty() {
            return Err(Error::EmptyStore {
                path: self.path.clone(),
            });
        }
        Ok(favorites)
    }

    /// Deletes the store file after a y/n confirmation.
    ///
    /// Returns false when the user answered `n`.
    pub fn destroy(&self, prompt: &mut dyn Prompt) -> Result<bool> {
        if !self.exists() {
            return Err(Error::MissingStore {
                path: self.path.clone(),
            });
        }
        if !prompt.confirm("DELETE DATABASE?")? {
            return Ok(false);
        }
        let _lock = store::lock(&self.path)?;
        fs::remove_file(&self.path).store_write_context(&self.path)?;
        info!("removed favorites store {}", self.path.display());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompt;
    use tempfile::TempDir;

    fn store() -> (TempDir, FavoriteStore) {
        let dir = TempDir::new().unwrap();
        let store = FavoriteStore::new(dir.path().join("favorites.json"));
        (dir, store)
    }

    #[test]
    fn test_add_then_load_round_trip() {
        let (_dir, store) = store();
        let mut prompt = ScriptedPrompt::new(["A", "B", "quit"]);
        store.add_interactive(&mut prompt).unwrap();

        let mut no_prompt = ScriptedPrompt::new(Vec::<String>::new());
        assert_eq!(store.load(&mut no_prompt).unwrap(), ["A", "B"]);

        store.delete("A").unwrap();
        assert_eq!(store.load(&mut no_prompt).unwrap(), ["B"]);
    }

    #[test]
    fn test_persisted_after_each_addition() {
        let (_dir, store) = store();
        // Input ends before "quit": the first label must already be on disk.
        let mut prompt = ScriptedPrompt::new(["A"]);
        assert!(store.add_interactive(&mut prompt).is_err());
        assert_eq!(store.read().unwrap(), ["A"]);
    }

    #[test]
    fn test_record_layout() {
        let (_dir, store) = store();
        store.add("BACKUP").unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({"favorites": ["BACKUP"]}));
    }

    #[test]
    fn test_load_empty_store_enters_add_flow() {
        let (_dir, store) = store();
        let mut prompt = ScriptedPrompt::new(["USB1", "quit"]);
        assert_eq!(store.load(&mut prompt).unwrap(), ["USB1"]);
        assert_eq!(prompt.asked.len(), 2);
    }

    #[test]
    fn test_delete_from_empty_store() {
        let (_dir, store) = store();
        let mut prompt = ScriptedPrompt::new(["A"]);
        assert!(matches!(
            store.delete_interactive(&mut prompt),
            Err(Error::EmptyStore { .. })
        ));
        assert!(prompt.asked.is_empty());
    }

    #[test]
    fn test_delete_unknown_label() {
        let (_dir, store) = store();
        store.add("A").unwrap();
        assert!(matches!(
            store.delete("Z"),
            Err(Error::NotFound { item }) if item == "Z"
        ));
        assert_eq!(store.read().unwrap(), ["A"]);
    }

    #[test]
    fn test_delete_removes_first_match_only() {
        let (_dir, store) = store();
        store.add("A").unwrap();
        store.add("B").unwrap();
        store.add("A").unwrap();
        assert_eq!(store.delete("A").unwrap(), ["B", "A"]);
    }

    #[test]
    fn test_show_missing_and_empty() {
        let (_dir, store) = store();
        assert!(matches!(store.show(), Err(Error::MissingStore { .. })));

        store.add("A").unwrap();
        store.delete("A").unwrap();
        assert!(matches!(store.show(), Err(Error::EmptyStore { .. })));
    }

    #[test]
    fn test_destroy() {
        let (_dir, store) = store();
        store.add("A").unwrap();

        let mut no = ScriptedPrompt::new(["x", "n"]);
        assert!(!store.destroy(&mut no).unwrap());
        assert!(store.exists());

        let mut yes = ScriptedPrompt::new(["y"]);
        assert!(store.destroy(&mut yes).unwrap());
        assert!(!store.exists());

        assert!(matches!(
            store.destroy(&mut ScriptedPrompt::new(["y"])),
            Err(Error::MissingStore { .. })
        ));
    }
}
