//! Domain types for the defter backend.
//!
//! This module contains the core data structures:
//! - Note: the unit of user content and its processing status
//! - Folder: organizational tags with an optimistic local view
//! - UserQuota / SubscriptionPlan: usage counters and gating thresholds
//! - PrayerTimesDoc: cached prayer-time documents and the mock generator

pub mod folder;
pub mod note;
pub mod plan;
pub mod prayer;
pub mod quota;

// Re-export commonly used types
pub use folder::{Folder, FolderView};
pub use note::{Dua, Note, NoteStatus, NoteType};
pub use plan::{SubscriptionPlan, UpsellTrigger, VoiceNoteWindow};
pub use prayer::{generate_mock_times, PrayerTimesData, PrayerTimesDoc};
pub use quota::UserQuota;
