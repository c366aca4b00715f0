//! File-backed document stores for notes and folders.
//!
//! One JSON file per document under the data directory, written atomically
//! enough for single-user contention (write to a temp name, then rename).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::{Folder, Note};

/// Notes collection: {home}/notes/{id}.json
pub struct NoteStore {
    root: PathBuf,
}

impl NoteStore {
    pub fn new(home: &Path) -> Self {
        Self {
            root: home.join("notes"),
        }
    }

    fn doc_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }

    async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create {}", self.root.display()))?;
        Ok(())
    }

    /// Fetch a note by id; `None` when the document does not exist
    pub async fn get(&self, id: &str) -> Result<Option<Note>> {
        let path = self.doc_path(id);
        if !path.exists() {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read note {}", id))?;
        let note = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse note document {}", id))?;

        Ok(Some(note))
    }

    /// Write a note document, replacing any previous version
    pub async fn put(&self, note: &Note) -> Result<()> {
        self.ensure_dir().await?;

        let json = serde_json::to_string_pretty(note)?;
        let path = self.doc_path(&note.id);
        let tmp = path.with_extension("json.tmp");

        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write note {}", note.id))?;
        tokio::fs::rename(&tmp, &path).await?;

        Ok(())
    }

    /// Remove a note document. Returns false if it did not exist.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let path = self.doc_path(id);
        if !path.exists() {
            return Ok(false);
        }
        tokio::fs::remove_file(&path)
            .await
            .with_context(|| format!("Failed to delete note {}", id))?;
        Ok(true)
    }

    /// All notes owned by a user, newest first
    pub async fn list_for_user(&self, uid: &str) -> Result<Vec<Note>> {
        let mut notes = Vec::new();

        if !self.root.exists() {
            return Ok(notes);
        }

        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let content = match tokio::fs::read_to_string(&path).await {
                Ok(c) => c,
                Err(_) => continue,
            };

            match serde_json::from_str::<Note>(&content) {
                Ok(note) if note.uid == uid => notes.push(note),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Skipping unreadable note document {}: {}", path.display(), e);
                }
            }
        }

        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }
}

/// Folders collection: {home}/folders/{id}.json
pub struct FolderStore {
    root: PathBuf,
}

impl FolderStore {
    pub fn new(home: &Path) -> Self {
        Self {
            root: home.join("folders"),
        }
    }

    fn doc_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }

    pub async fn get(&self, id: &str) -> Result<Option<Folder>> {
        let path = self.doc_path(id);
        if !path.exists() {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&path).await?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub async fn put(&self, folder: &Folder) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        let json = serde_json::to_string_pretty(folder)?;
        tokio::fs::write(self.doc_path(&folder.id), json)
            .await
            .with_context(|| format!("Failed to write folder {}", folder.id))?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let path = self.doc_path(id);
        if !path.exists() {
            return Ok(false);
        }
        tokio::fs::remove_file(&path).await?;
        Ok(true)
    }

    pub async fn list_for_user(&self, uid: &str) -> Result<Vec<Folder>> {
        let mut folders = Vec::new();

        if !self.root.exists() {
            return Ok(folders);
        }

        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Ok(content) = tokio::fs::read_to_string(&path).await {
                if let Ok(folder) = serde_json::from_str::<Folder>(&content) {
                    if folder.uid == uid {
                        folders.push(folder);
                    }
                }
            }
        }

        folders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(folders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NoteStatus, NoteType};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_note_roundtrip_and_delete() {
        let temp = TempDir::new().unwrap();
        let store = NoteStore::new(temp.path());

        let note = Note::new_audio("u1", "Vaaz", NoteType::AudioRecording, "users/u1/audio/n1.m4a");
        store.put(&note).await.unwrap();

        let loaded = store.get(&note.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, note.id);
        assert_eq!(loaded.status, NoteStatus::Processing);

        assert!(store.delete(&note.id).await.unwrap());
        assert!(store.get(&note.id).await.unwrap().is_none());
        assert!(!store.delete(&note.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_filters_by_owner() {
        let temp = TempDir::new().unwrap();
        let store = NoteStore::new(temp.path());

        let mine = Note::new_scanned("u1", "Benim", "metin");
        let theirs = Note::new_scanned("u2", "Başkasının", "metin");
        store.put(&mine).await.unwrap();
        store.put(&theirs).await.unwrap();

        let notes = store.list_for_user("u1").await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, mine.id);
    }

    #[tokio::test]
    async fn test_folder_store() {
        let temp = TempDir::new().unwrap();
        let store = FolderStore::new(temp.path());

        let folder = Folder::new("u1", "Cuma Vaazları");
        store.put(&folder).await.unwrap();

        assert_eq!(store.list_for_user("u1").await.unwrap().len(), 1);
        assert!(store.delete(&folder.id).await.unwrap());
        assert!(store.get(&folder.id).await.unwrap().is_none());
    }
}
