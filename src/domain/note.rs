//! Note: the unit of user content the pipeline enriches.
//!
//! A Note is always created by the client in `Processing` state; only the
//! transcription pipeline moves it to `Ready` or `Failed`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of content a note carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteType {
    /// Recorded in-app
    AudioRecording,

    /// Imported audio file
    UploadedAudio,

    /// A YouTube link the user saved
    YoutubeLink,

    /// OCR'd or typed text
    ScannedText,
}

impl NoteType {
    /// Whether this note type references a stored audio object
    pub fn is_audio(self) -> bool {
        matches!(self, NoteType::AudioRecording | NoteType::UploadedAudio)
    }
}

/// Processing status of a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteStatus {
    /// Submitted, waiting for (or undergoing) AI processing
    Processing,

    /// Transcript/summary/duas are populated
    Ready,

    /// Processing failed; `ai_status_message` carries the reason
    Failed,
}

/// A dua (supplication) extracted from a note's audio
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dua {
    pub text: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_sec: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_sec: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Dua {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            start_sec: None,
            end_sec: None,
            created_at: None,
        }
    }
}

/// The central persisted entity.
///
/// Serialized field names are camelCase so documents stay readable by the
/// client app's existing decoders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,

    /// Owner user id
    pub uid: String,

    #[serde(rename = "type")]
    pub note_type: NoteType,

    pub status: NoteStatus,

    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,

    pub created_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Stamped by the pipeline when the note reaches `Ready`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<f64>,

    /// Object path in the blob store, for audio-backed notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_storage_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scanned_text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_text: Option<String>,

    #[serde(default)]
    pub duas: Vec<Dua>,

    /// Human-readable progress/error string; cleared on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_status_message: Option<String>,

    /// Organizational tag only; the folder does not own the note
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
}

impl Note {
    fn base(uid: impl Into<String>, note_type: NoteType, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            uid: uid.into(),
            note_type,
            status: NoteStatus::Processing,
            title: title.into(),
            speaker: None,
            created_at: Utc::now(),
            updated_at: None,
            processed_at: None,
            duration_sec: None,
            audio_storage_path: None,
            youtube_url: None,
            scanned_text: None,
            transcript_text: None,
            summary_text: None,
            duas: Vec::new(),
            ai_status_message: None,
            folder_id: None,
        }
    }

    /// Create an audio-backed note (recorded or uploaded)
    pub fn new_audio(
        uid: impl Into<String>,
        title: impl Into<String>,
        note_type: NoteType,
        storage_path: impl Into<String>,
    ) -> Self {
        let mut note = Self::base(uid, note_type, title);
        note.audio_storage_path = Some(storage_path.into());
        note
    }

    pub fn new_youtube(
        uid: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let mut note = Self::base(uid, NoteType::YoutubeLink, title);
        note.youtube_url = Some(url.into());
        note
    }

    pub fn new_scanned(
        uid: impl Into<String>,
        title: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let mut note = Self::base(uid, NoteType::ScannedText, title);
        note.scanned_text = Some(text.into());
        note
    }

    /// Check the exactly-one-source invariant for this note's type
    pub fn validate(&self) -> anyhow::Result<()> {
        let (audio, yt, text) = (
            self.audio_storage_path.is_some(),
            self.youtube_url.is_some(),
            self.scanned_text.is_some(),
        );

        let ok = match self.note_type {
            NoteType::AudioRecording | NoteType::UploadedAudio => audio && !yt && !text,
            NoteType::YoutubeLink => yt && !audio && !text,
            NoteType::ScannedText => text && !audio && !yt,
        };

        if !ok {
            anyhow::bail!(
                "note {} has inconsistent content source for type {:?}",
                self.id,
                self.note_type
            );
        }

        Ok(())
    }

    pub fn is_processing(&self) -> bool {
        self.status == NoteStatus::Processing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_audio_note_starts_processing() {
        let note = Note::new_audio("user-1", "Cuma vaazı", NoteType::AudioRecording, "users/user-1/audio/abc.m4a");

        assert_eq!(note.status, NoteStatus::Processing);
        assert!(note.is_processing());
        assert!(note.transcript_text.is_none());
        assert!(note.duas.is_empty());
        assert!(note.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_mixed_sources() {
        let mut note = Note::new_youtube("user-1", "Link", "https://youtu.be/x");
        note.scanned_text = Some("also text".to_string());

        assert!(note.validate().is_err());
    }

    #[test]
    fn test_serde_uses_camel_case_field_names() {
        let note = Note::new_audio("u", "t", NoteType::UploadedAudio, "users/u/audio/12345.m4a");
        let json = serde_json::to_value(&note).unwrap();

        assert_eq!(json["type"], "uploaded_audio");
        assert_eq!(json["status"], "processing");
        assert!(json["audioStoragePath"].is_string());
        assert!(json.get("transcriptText").is_none());
    }
}
