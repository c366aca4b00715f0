//! User profiles: {home}/users/{uid}.json.
//!
//! Backs the push-token precondition for test notifications and the prayer
//! resolver's city lookup.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::SubscriptionPlan;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,

    #[serde(default)]
    pub plan: SubscriptionPlan,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_plate_code: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_name: Option<String>,

    /// Push token registered by the client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fcm_token: Option<String>,
}

impl UserProfile {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            plan: SubscriptionPlan::Free,
            city_plate_code: None,
            city_name: None,
            fcm_token: None,
        }
    }
}

pub struct ProfileStore {
    root: PathBuf,
}

impl ProfileStore {
    pub fn new(home: &Path) -> Self {
        Self {
            root: home.join("users"),
        }
    }

    fn doc_path(&self, uid: &str) -> PathBuf {
        self.root.join(format!("{}.json", uid))
    }

    pub async fn get(&self, uid: &str) -> Result<Option<UserProfile>> {
        let path = self.doc_path(uid);
        if !path.exists() {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read profile for {}", uid))?;

        Ok(Some(serde_json::from_str(&content)?))
    }

    pub async fn put(&self, profile: &UserProfile) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;

        let json = serde_json::to_string_pretty(profile)?;
        tokio::fs::write(self.doc_path(&profile.uid), json)
            .await
            .with_context(|| format!("Failed to write profile for {}", profile.uid))?;

        Ok(())
    }

    /// Plan for a user; users without a profile are on the free plan
    pub async fn plan_for(&self, uid: &str) -> Result<SubscriptionPlan> {
        Ok(self
            .get(uid)
            .await?
            .map(|p| p.plan)
            .unwrap_or(SubscriptionPlan::Free))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_default_plan_is_free() {
        let temp = TempDir::new().unwrap();
        let store = ProfileStore::new(temp.path());

        assert_eq!(
            store.plan_for("unknown").await.unwrap(),
            SubscriptionPlan::Free
        );
    }

    #[tokio::test]
    async fn test_profile_roundtrip() {
        let temp = TempDir::new().unwrap();
        let store = ProfileStore::new(temp.path());

        let mut profile = UserProfile::new("u1");
        profile.plan = SubscriptionPlan::Pro;
        profile.city_plate_code = Some(6);
        profile.fcm_token = Some("token-abc".to_string());
        store.put(&profile).await.unwrap();

        let loaded = store.get("u1").await.unwrap().unwrap();
        assert_eq!(loaded.plan, SubscriptionPlan::Pro);
        assert_eq!(loaded.city_plate_code, Some(6));
        assert_eq!(loaded.fcm_token.as_deref(), Some("token-abc"));
    }
}
