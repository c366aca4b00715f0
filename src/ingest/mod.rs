//! Upload ingestion: turning finalized audio objects into pipeline runs.
//!
//! 1. **Watcher**: monitors the bucket directory for new audio files
//! 2. **Intake**: parses object paths and triggers the transcription
//!    pipeline; malformed or out-of-scope paths are logged no-ops

pub mod intake;
pub mod watcher;

pub use intake::{parse_object_path, Intake, IntakeSkip, ParsedUpload};
pub use watcher::{UploadEvent, UploadWatcher, WatchHandle, WatcherConfig};
