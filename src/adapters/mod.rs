//! Adapter interfaces for external systems.
//!
//! Each external capability sits behind a trait so the core flows can be
//! exercised with test doubles: the generative-AI model, the blob store,
//! video search, the prayer-time API, and push delivery.

pub mod aladhan;
pub mod fcm;
pub mod gemini;
pub mod local_blob;
pub mod youtube;

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::PrayerTimesDoc;

pub use aladhan::AladhanClient;
pub use fcm::FcmClient;
pub use gemini::GeminiClient;
pub use local_blob::LocalBlobStore;
pub use youtube::YouTubeSearchClient;

/// One part of a generative-AI request
#[derive(Debug, Clone)]
pub enum AiPart {
    Text(String),

    /// Raw audio passed inline with its mime type
    InlineAudio { mime_type: String, data: Vec<u8> },
}

impl AiPart {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn audio(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self::InlineAudio {
            mime_type: mime_type.into(),
            data,
        }
    }
}

/// Black-box generative capability: parts in, text out. One blocking call,
/// no internal retry.
#[async_trait]
pub trait AiModel: Send + Sync {
    /// Human-readable adapter name
    fn name(&self) -> &str;

    async fn generate(&self, parts: &[AiPart]) -> Result<String>;
}

/// Object storage. `bucket` is an opaque bucket identifier; `path` is the
/// object path within it.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Download an object to a local destination, returning its size
    async fn download(&self, bucket: &str, path: &str, dest: &Path) -> Result<u64>;

    /// Remove an object; missing objects are not an error
    async fn delete(&self, bucket: &str, path: &str) -> Result<()>;
}

/// Top video-search hit
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResult {
    pub id: String,
    pub title: String,
    pub thumbnail_url: String,
}

#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Top single result for a query, `None` when nothing matches
    async fn search_top(&self, query: &str) -> Result<Option<VideoResult>>;
}

/// External prayer time-table lookup
#[async_trait]
pub trait PrayerTimesApi: Send + Sync {
    async fn fetch(&self, plate_code: u8, city: &str, date: NaiveDate) -> Result<PrayerTimesDoc>;
}

/// Push notification delivery
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send(&self, token: &str, title: &str, body: &str) -> Result<()>;
}
