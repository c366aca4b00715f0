//! Object-finalized intake: path parsing and pipeline dispatch.
//!
//! Upload paths follow `users/{uid}/audio/{noteId}.m4a`. Anything that does
//! not parse is skipped without error so a stray object can never wedge the
//! ingest loop.

use std::sync::Arc;

use anyhow::Result;
use percent_encoding::percent_decode_str;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::core::TranscriptionPipeline;

/// Note IDs shorter than this are treated as junk (temp files, probes)
const MIN_NOTE_ID_LEN: usize = 5;

/// Why an object was skipped rather than processed
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntakeSkip {
    #[error("object is not under an audio folder: {0}")]
    NotAudioObject(String),

    #[error("object has no file name: {0}")]
    MissingFileName(String),

    #[error("note id too short: {0}")]
    NoteIdTooShort(String),
}

/// Identity extracted from an upload path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUpload {
    pub uid: String,
    pub note_id: String,
}

/// Parse a bucket-relative object path into its owner and note identity.
///
/// The path is percent-decoded first; hosted buckets report object names
/// URL-encoded. The uid is the segment following `users`, defaulting to
/// `unknown` for paths that lack one.
pub fn parse_object_path(raw_path: &str) -> Result<ParsedUpload, IntakeSkip> {
    let path = percent_decode_str(raw_path).decode_utf8_lossy().to_string();

    if !path.contains("/audio/") {
        return Err(IntakeSkip::NotAudioObject(path));
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let file_name = segments
        .last()
        .copied()
        .ok_or_else(|| IntakeSkip::MissingFileName(path.clone()))?;

    let note_id = file_name
        .split('.')
        .next()
        .unwrap_or(file_name)
        .to_string();

    if note_id.len() < MIN_NOTE_ID_LEN {
        return Err(IntakeSkip::NoteIdTooShort(note_id));
    }

    let uid = segments
        .iter()
        .position(|s| *s == "users")
        .and_then(|i| segments.get(i + 1))
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    Ok(ParsedUpload { uid, note_id })
}

/// Entry point for finalized uploads, shared by the watcher and the manual
/// `intake` command.
pub struct Intake {
    pipeline: Arc<TranscriptionPipeline>,
}

impl Intake {
    pub fn new(pipeline: Arc<TranscriptionPipeline>) -> Self {
        Self { pipeline }
    }

    /// Handle one finalized object. Skips are logged and return Ok; only
    /// store-level failures propagate.
    #[instrument(skip(self))]
    pub async fn handle_object_finalized(&self, bucket: &str, path: &str) -> Result<()> {
        let parsed = match parse_object_path(path) {
            Ok(parsed) => parsed,
            Err(skip) => {
                info!("Skipping object: {}", skip);
                return Ok(());
            }
        };

        info!(uid = %parsed.uid, note_id = %parsed.note_id, "Audio upload finalized");

        if let Err(e) = self.pipeline.process(&parsed.note_id, bucket, path).await {
            warn!(note_id = %parsed.note_id, "Pipeline dispatch failed: {:#}", e);
            return Err(e);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard_upload_path() {
        let parsed = parse_object_path("users/abc123/audio/note-0001.m4a").unwrap();
        assert_eq!(parsed.uid, "abc123");
        assert_eq!(parsed.note_id, "note-0001");
    }

    #[test]
    fn test_parse_percent_encoded_path() {
        let parsed = parse_object_path("users/abc123/audio/not%20defterim.m4a").unwrap();
        assert_eq!(parsed.note_id, "not defterim");
    }

    #[test]
    fn test_non_audio_paths_are_skipped() {
        let err = parse_object_path("users/abc123/images/photo.png").unwrap_err();
        assert!(matches!(err, IntakeSkip::NotAudioObject(_)));
    }

    #[test]
    fn test_short_note_ids_are_rejected() {
        let err = parse_object_path("users/abc123/audio/abc.m4a").unwrap_err();
        assert_eq!(err, IntakeSkip::NoteIdTooShort("abc".to_string()));
    }

    #[test]
    fn test_missing_users_segment_defaults_uid() {
        let parsed = parse_object_path("misc/audio/note-0001.m4a").unwrap();
        assert_eq!(parsed.uid, "unknown");
    }
}
