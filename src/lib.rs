//! defter - audio note transcription backend
//!
//! The backend core for a note-taking app centered on recorded sermons and
//! lectures: uploads are transcribed, summarized, and mined for duas by a
//! generative model, with quota-gated chat and prayer-time lookups on the
//! side.
//!
//! # Architecture
//!
//! - Notes move through a small state machine: `processing` → `ready` or
//!   `failed`. Only the pipeline performs these transitions.
//! - Every external system sits behind an adapter trait so core flows run
//!   against test doubles.
//! - Documents are plain JSON files under the data directory; the bucket is
//!   a local directory watched for finalized uploads.
//!
//! # Modules
//!
//! - `domain`: data structures (Note, Folder, UserQuota, PrayerTimesDoc)
//! - `store`: file-backed document stores
//! - `adapters`: external system integrations (AI model, blob store,
//!   video search, prayer API, push)
//! - `core`: the pipeline, chat orchestrator, prayer resolver, and
//!   entitlement gate
//! - `ingest`: bucket watcher and upload intake
//! - `service`: the callable surface with stable error codes
//! - `cli`: command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Watch the bucket and process uploads
//! defter watch
//!
//! # Retry a failed note
//! defter retry --uid <uid> <note-id>
//!
//! # Ask the assistant a question
//! defter chat --uid <uid> "Sabır hakkında bir ayet söyler misin?"
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod ingest;
pub mod service;
pub mod store;

// Re-export main types at crate root for convenience
pub use crate::core::{ChatOrchestrator, ChatReply, EntitlementGate, PrayerTimeResolver, TranscriptionPipeline};
pub use domain::{Dua, Folder, Note, NoteStatus, NoteType, PrayerTimesDoc, SubscriptionPlan, UserQuota};
pub use service::{AckResponse, CallableError, Service};

// Upload ingestion
pub use ingest::{Intake, UploadEvent, UploadWatcher, WatcherConfig};
