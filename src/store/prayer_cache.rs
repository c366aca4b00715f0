//! Prayer-time cache: {home}/prayer_times/{plate}_{date}.json.
//!
//! Existence is the only freshness criterion; a cached document is served
//! as-is.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::PrayerTimesDoc;

pub struct PrayerCache {
    root: PathBuf,
}

impl PrayerCache {
    pub fn new(home: &Path) -> Self {
        Self {
            root: home.join("prayer_times"),
        }
    }

    fn doc_path(&self, plate_code: u8, date: &str) -> PathBuf {
        self.root
            .join(format!("{}.json", PrayerTimesDoc::document_id(plate_code, date)))
    }

    pub async fn get(&self, plate_code: u8, date: &str) -> Result<Option<PrayerTimesDoc>> {
        let path = self.doc_path(plate_code, date);
        if !path.exists() {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&path).await?;
        let doc = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse cached prayer times at {}", path.display()))?;

        Ok(Some(doc))
    }

    pub async fn put(&self, doc: &PrayerTimesDoc) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;

        let json = serde_json::to_string_pretty(doc)?;
        tokio::fs::write(self.doc_path(doc.plate_code, &doc.date), json)
            .await
            .with_context(|| {
                format!("Failed to cache prayer times for {}_{}", doc.plate_code, doc.date)
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::generate_mock_times;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_cache_roundtrip() {
        let temp = TempDir::new().unwrap();
        let cache = PrayerCache::new(temp.path());

        assert!(cache.get(34, "2025-01-01").await.unwrap().is_none());

        let doc = generate_mock_times(34, "2025-01-01");
        cache.put(&doc).await.unwrap();

        let loaded = cache.get(34, "2025-01-01").await.unwrap().unwrap();
        assert_eq!(loaded.times.imsak, doc.times.imsak);
        assert_eq!(loaded.source, "mock");
    }
}
