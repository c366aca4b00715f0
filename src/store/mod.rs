//! File-backed JSON document stores under the data directory.
//!
//! One JSON file per document, async IO throughout. Good enough for the
//! single-user, low-frequency contention this backend sees; racing writers
//! resolve as last-writer-wins.

pub mod notes;
pub mod prayer_cache;
pub mod profiles;
pub mod quota;

pub use notes::{FolderStore, NoteStore};
pub use prayer_cache::PrayerCache;
pub use profiles::{ProfileStore, UserProfile};
pub use quota::QuotaStore;
