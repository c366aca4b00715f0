//! Service facade: the callable surface of the backend.
//!
//! Each method mirrors one callable endpoint: authenticate, validate, check
//! ownership, then delegate to a core flow. Errors carry the stable code
//! string clients switch on, plus a user-facing Turkish message.

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use crate::adapters::{BlobStore, PushGateway};
use crate::core::{ChatOrchestrator, ChatReply, EntitlementGate, PrayerTimeResolver, TranscriptionPipeline};
use crate::domain::{Folder, Note, NoteType, PrayerTimesDoc, UpsellTrigger};
use crate::store::{FolderStore, NoteStore, ProfileStore};

/// Callable failure with a machine-readable code and a user-facing message
#[derive(Debug, Error)]
pub enum CallableError {
    #[error("Giriş yapmalısınız.")]
    Unauthenticated,

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    FailedPrecondition(String),

    #[error("{0}")]
    Internal(String),
}

impl CallableError {
    /// Stable error code string clients match on
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::InvalidArgument(_) => "invalid-argument",
            Self::NotFound(_) => "not-found",
            Self::PermissionDenied(_) => "permission-denied",
            Self::FailedPrecondition(_) => "failed-precondition",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<anyhow::Error> for CallableError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(format!("{:#}", e))
    }
}

/// Response for operations that only report success
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AckResponse {
    pub success: bool,
    pub message: String,
}

pub struct Service {
    bucket: String,
    notes: Arc<NoteStore>,
    folders: Arc<FolderStore>,
    profiles: Arc<ProfileStore>,
    blobs: Arc<dyn BlobStore>,
    push: Arc<dyn PushGateway>,
    pipeline: Arc<TranscriptionPipeline>,
    chat: ChatOrchestrator,
    gate: EntitlementGate,
    prayers: PrayerTimeResolver,
}

#[allow(clippy::too_many_arguments)]
impl Service {
    pub fn new(
        bucket: String,
        notes: Arc<NoteStore>,
        folders: Arc<FolderStore>,
        profiles: Arc<ProfileStore>,
        blobs: Arc<dyn BlobStore>,
        push: Arc<dyn PushGateway>,
        pipeline: Arc<TranscriptionPipeline>,
        chat: ChatOrchestrator,
        gate: EntitlementGate,
        prayers: PrayerTimeResolver,
    ) -> Self {
        Self {
            bucket,
            notes,
            folders,
            profiles,
            blobs,
            push,
            pipeline,
            chat,
            gate,
            prayers,
        }
    }

    fn require_auth(uid: Option<&str>) -> Result<&str, CallableError> {
        uid.filter(|u| !u.is_empty())
            .ok_or(CallableError::Unauthenticated)
    }

    /// Create a note document. Audio recordings are gated on the caller's
    /// voice-note quota; the quota is consumed only after the write lands.
    #[instrument(skip(self, note))]
    pub async fn create_note(
        &self,
        uid: Option<&str>,
        note: Note,
    ) -> Result<Note, CallableError> {
        let uid = Self::require_auth(uid)?;

        if note.uid != uid {
            return Err(CallableError::PermissionDenied(
                "Bu not size ait değil.".to_string(),
            ));
        }

        note.validate()
            .map_err(|e| CallableError::InvalidArgument(e.to_string()))?;

        if note.note_type == NoteType::AudioRecording {
            let plan = self.profiles.plan_for(uid).await?;
            if !self.gate.can_record(uid, plan).await? {
                let _ = self
                    .gate
                    .trigger_upsell_if_needed(UpsellTrigger::Recording, uid, plan)
                    .await?;
                return Err(CallableError::FailedPrecondition(
                    UpsellTrigger::Recording.message().to_string(),
                ));
            }
        }

        self.notes.put(&note).await?;

        if note.note_type == NoteType::AudioRecording {
            self.gate.use_recording(uid).await?;
        }

        info!(note_id = %note.id, "Note created");
        Ok(note)
    }

    pub async fn list_notes(&self, uid: Option<&str>) -> Result<Vec<Note>, CallableError> {
        let uid = Self::require_auth(uid)?;
        Ok(self.notes.list_for_user(uid).await?)
    }

    /// Delete a note and, for audio-backed notes, its stored object.
    #[instrument(skip(self))]
    pub async fn delete_note(
        &self,
        uid: Option<&str>,
        note_id: &str,
    ) -> Result<AckResponse, CallableError> {
        let uid = Self::require_auth(uid)?;
        let note = self.owned_note(uid, note_id).await?;

        if let Some(path) = &note.audio_storage_path {
            self.blobs.delete(&self.bucket, path).await?;
        }

        self.notes.delete(note_id).await?;

        Ok(AckResponse {
            success: true,
            message: "Not silindi.".to_string(),
        })
    }

    /// Manual retry for a failed (or wedged) note. Re-runs the pipeline from
    /// the top; the run itself reports failure through the note document,
    /// not through this response.
    #[instrument(skip(self))]
    pub async fn retry_processing(
        &self,
        uid: Option<&str>,
        note_id: Option<&str>,
    ) -> Result<AckResponse, CallableError> {
        let uid = Self::require_auth(uid)?;

        let note_id = note_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CallableError::InvalidArgument("Note ID gerekli.".to_string()))?;

        let note = self.owned_note(uid, note_id).await?;

        let path = note.audio_storage_path.as_deref().ok_or_else(|| {
            CallableError::FailedPrecondition("Ses dosyası yolu bulunamadı.".to_string())
        })?;

        self.pipeline.process(note_id, &self.bucket, path).await?;

        Ok(AckResponse {
            success: true,
            message: "İşlem tekrar başlatıldı.".to_string(),
        })
    }

    /// One chat turn. The quota gate runs before the model is called, and
    /// the counter advances only after the model answers.
    #[instrument(skip(self, prompt))]
    pub async fn ask_ai(
        &self,
        uid: Option<&str>,
        prompt: &str,
    ) -> Result<ChatReply, CallableError> {
        let uid = Self::require_auth(uid)?;

        if prompt.trim().is_empty() {
            return Err(CallableError::InvalidArgument("Geçersiz istek.".to_string()));
        }

        let plan = self.profiles.plan_for(uid).await?;
        if !self.gate.can_ask_ai(uid, plan).await? {
            let _ = self
                .gate
                .trigger_upsell_if_needed(UpsellTrigger::AiProcessing, uid, plan)
                .await?;
            return Err(CallableError::FailedPrecondition(
                UpsellTrigger::AiProcessing.message().to_string(),
            ));
        }

        let reply = self
            .chat
            .chat(prompt)
            .await
            .map_err(|_| CallableError::Internal("AI yanıt veremedi.".to_string()))?;

        self.gate.use_ai_question(uid).await?;

        Ok(reply)
    }

    /// Prayer times for a region and date. Never fails past validation: the
    /// resolver bottoms out in generated data.
    #[instrument(skip(self))]
    pub async fn get_prayer_times(
        &self,
        uid: Option<&str>,
        plate_code: u8,
        date: NaiveDate,
    ) -> Result<PrayerTimesDoc, CallableError> {
        let uid = Self::require_auth(uid)?;

        if !(1..=81).contains(&plate_code) {
            return Err(CallableError::InvalidArgument("Geçersiz il kodu".to_string()));
        }

        // Profile city name refines the API lookup when it matches the
        // requested region
        let city = match self.profiles.get(uid).await? {
            Some(profile) if profile.city_plate_code == Some(plate_code) => profile.city_name,
            _ => None,
        };

        Ok(self.prayers.resolve(plate_code, date, city.as_deref()).await)
    }

    /// Send a test push to the caller's registered device.
    #[instrument(skip(self))]
    pub async fn send_test_notification(
        &self,
        uid: Option<&str>,
    ) -> Result<AckResponse, CallableError> {
        let uid = Self::require_auth(uid)?;

        let token = self
            .profiles
            .get(uid)
            .await?
            .and_then(|p| p.fcm_token)
            .ok_or_else(|| {
                CallableError::FailedPrecondition("Bildirim token'ı bulunamadı.".to_string())
            })?;

        self.push
            .send(&token, "Vaaz Notları", "Test bildirimi başarılı!")
            .await?;

        Ok(AckResponse {
            success: true,
            message: "Bildirim gönderildi.".to_string(),
        })
    }

    pub async fn create_folder(
        &self,
        uid: Option<&str>,
        name: &str,
    ) -> Result<Folder, CallableError> {
        let uid = Self::require_auth(uid)?;

        if name.trim().is_empty() {
            return Err(CallableError::InvalidArgument(
                "Klasör adı gerekli.".to_string(),
            ));
        }

        let folder = Folder::new(uid, name.trim());
        self.folders.put(&folder).await?;
        Ok(folder)
    }

    pub async fn list_folders(&self, uid: Option<&str>) -> Result<Vec<Folder>, CallableError> {
        let uid = Self::require_auth(uid)?;
        Ok(self.folders.list_for_user(uid).await?)
    }

    /// Delete a folder. Notes tagged with it are untagged, never deleted:
    /// folders organize notes but do not own them.
    #[instrument(skip(self))]
    pub async fn delete_folder(
        &self,
        uid: Option<&str>,
        folder_id: &str,
    ) -> Result<AckResponse, CallableError> {
        let uid = Self::require_auth(uid)?;

        let folder = self
            .folders
            .get(folder_id)
            .await?
            .ok_or_else(|| CallableError::NotFound("Klasör bulunamadı.".to_string()))?;

        if folder.uid != uid {
            return Err(CallableError::PermissionDenied(
                "Bu klasör size ait değil.".to_string(),
            ));
        }

        for mut note in self.notes.list_for_user(uid).await? {
            if note.folder_id.as_deref() == Some(folder_id) {
                note.folder_id = None;
                self.notes.put(&note).await?;
            }
        }

        self.folders.delete(folder_id).await?;

        Ok(AckResponse {
            success: true,
            message: "Klasör silindi.".to_string(),
        })
    }

    /// The upsell trigger most recently recorded by a gating denial
    pub fn last_upsell_trigger(&self) -> Option<UpsellTrigger> {
        self.gate.last_trigger()
    }

    async fn owned_note(&self, uid: &str, note_id: &str) -> Result<Note, CallableError> {
        let note = self
            .notes
            .get(note_id)
            .await?
            .ok_or_else(|| CallableError::NotFound("Not bulunamadı.".to_string()))?;

        if note.uid != uid {
            return Err(CallableError::PermissionDenied(
                "Bu not size ait değil.".to_string(),
            ));
        }

        Ok(note)
    }
}
