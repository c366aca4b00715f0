//! Folders and the optimistic local view over them.
//!
//! A folder is purely organizational. Deleting one clears `folder_id` on its
//! notes; it never deletes the notes themselves.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub uid: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Folder {
    pub fn new(uid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            uid: uid.into(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// Three-way merged folder view: (pending-created ∪ confirmed) − deleted.
///
/// Local actions touch only the pending and deleted sets; the confirmed set
/// is replaced wholesale whenever the backing store reports. The visible
/// list is recomputed from the three sets on every read.
#[derive(Debug, Default)]
pub struct FolderView {
    pending_created: Vec<Folder>,
    confirmed: Vec<Folder>,
    deleted_ids: HashSet<String>,
}

impl FolderView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a locally created folder, shown immediately
    pub fn mark_created(&mut self, folder: Folder) {
        self.pending_created.insert(0, folder);
    }

    /// Record a locally deleted folder, hidden immediately
    pub fn mark_deleted(&mut self, folder_id: &str) {
        self.deleted_ids.insert(folder_id.to_string());
    }

    /// Roll back an optimistic delete (the store-side delete failed)
    pub fn unmark_deleted(&mut self, folder_id: &str) {
        self.deleted_ids.remove(folder_id);
    }

    /// Replace the confirmed set from a store update and reconcile:
    /// pending entries the store now knows are dropped, and deleted ids the
    /// store no longer has are forgotten.
    pub fn set_confirmed(&mut self, folders: Vec<Folder>) {
        self.pending_created
            .retain(|p| !folders.iter().any(|f| f.id == p.id));

        let current_ids: HashSet<&str> = folders.iter().map(|f| f.id.as_str()).collect();
        self.deleted_ids.retain(|id| current_ids.contains(id.as_str()));

        self.confirmed = folders;
    }

    /// The merged view, recomputed on every call
    pub fn visible(&self) -> Vec<Folder> {
        let mut out = self.pending_created.clone();
        for folder in &self.confirmed {
            if !out.iter().any(|f| f.id == folder.id) {
                out.push(folder.clone());
            }
        }
        out.retain(|f| !self.deleted_ids.contains(&f.id));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_folder_visible_before_confirmation() {
        let mut view = FolderView::new();
        let folder = Folder::new("u1", "Ramazan");

        view.mark_created(folder.clone());

        let visible = view.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, folder.id);
    }

    #[test]
    fn test_confirmation_deduplicates_pending() {
        let mut view = FolderView::new();
        let folder = Folder::new("u1", "Ramazan");

        view.mark_created(folder.clone());
        view.set_confirmed(vec![folder.clone()]);

        assert_eq!(view.visible().len(), 1);
    }

    #[test]
    fn test_deleted_folder_hidden_until_store_catches_up() {
        let mut view = FolderView::new();
        let keep = Folder::new("u1", "Dualar");
        let gone = Folder::new("u1", "Eski");

        view.set_confirmed(vec![keep.clone(), gone.clone()]);
        view.mark_deleted(&gone.id);

        let visible = view.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, keep.id);

        // Store update without the deleted folder clears the tombstone
        view.set_confirmed(vec![keep.clone()]);
        assert_eq!(view.visible().len(), 1);

        // ...so a folder recreated with the same id would show again
        view.set_confirmed(vec![keep, gone.clone()]);
        assert_eq!(view.visible().len(), 2);
    }

    #[test]
    fn test_local_actions_never_touch_confirmed() {
        let mut view = FolderView::new();
        let confirmed = Folder::new("u1", "Cuma");

        view.set_confirmed(vec![confirmed.clone()]);
        view.mark_created(Folder::new("u1", "Yeni"));
        view.mark_deleted(&confirmed.id);

        assert_eq!(view.confirmed.len(), 1, "confirmed set only changes via set_confirmed");
    }
}
