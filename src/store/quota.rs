//! Per-user quota persistence: {home}/quotas/{uid}.json.
//!
//! Increments are written immediately; there is no batching and no
//! decrement (usage is never returned).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;

use crate::domain::UserQuota;

pub struct QuotaStore {
    root: PathBuf,
}

impl QuotaStore {
    pub fn new(home: &Path) -> Self {
        Self {
            root: home.join("quotas"),
        }
    }

    fn doc_path(&self, uid: &str) -> PathBuf {
        self.root.join(format!("{}.json", uid))
    }

    /// Load a user's quota; a user with no document gets a fresh one
    pub async fn load(&self, uid: &str) -> Result<UserQuota> {
        let path = self.doc_path(uid);
        if !path.exists() {
            return Ok(UserQuota::initial(Utc::now()));
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read quota for {}", uid))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse quota document for {}", uid))
    }

    pub async fn save(&self, uid: &str, quota: &UserQuota) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;

        let json = serde_json::to_string_pretty(quota)?;
        tokio::fs::write(self.doc_path(uid), json)
            .await
            .with_context(|| format!("Failed to write quota for {}", uid))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_quota_is_initial() {
        let temp = TempDir::new().unwrap();
        let store = QuotaStore::new(temp.path());

        let quota = store.load("nobody").await.unwrap();
        assert_eq!(quota.ai_questions_today, 0);
        assert_eq!(quota.voice_notes_this_week, 0);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let store = QuotaStore::new(temp.path());

        let mut quota = UserQuota::initial(Utc::now());
        quota.ai_questions_today = 2;
        store.save("u1", &quota).await.unwrap();

        let loaded = store.load("u1").await.unwrap();
        assert_eq!(loaded.ai_questions_today, 2);
    }
}
