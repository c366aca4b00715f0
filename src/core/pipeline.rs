//! Transcription pipeline: the only multi-step orchestrated process.
//!
//! States: processing → {ready, failed}. There is no transition out of a
//! terminal state except a fresh invocation (retry), which always re-enters
//! via processing and discards any prior partial result. Steps within one
//! run are strictly sequential.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::adapters::{AiModel, AiPart, BlobStore};
use crate::domain::{Dua, Note, NoteStatus};
use crate::store::NoteStore;

use super::strip_code_fences;

/// Progress/error strings surfaced to the user
const MSG_STARTED: &str = "AI İşlemi başlatıldı... (Dosya indiriliyor)";
const MSG_ANALYZING: &str = "Ses dosyası dinleniyor ve analiz ediliyor...";
const MSG_SUMMARY_FALLBACK: &str = "Otomatik özet oluşturulamadı (JSON hatası).";
const MSG_NO_TRANSCRIPT: &str = "Transkript oluşturulamadı.";
const MSG_NO_SUMMARY: &str = "Özet çıkarılamadı.";

/// User-visible error strings are bounded to this many characters
const ERROR_MESSAGE_MAX_CHARS: usize = 200;

/// Fixed instruction prompt demanding a strict three-field JSON object
const TRANSCRIBE_PROMPT: &str = r#"Sen profesyonel bir İslami asistan ve transkript uzmanısın.
Görevin bu ses dosyasını dinleyip analiz etmek.

Lütfen SADECE aşağıdaki JSON formatında bir çıktı üret:
{
    "transcript": "Ses kaydının tam, kelimesi kelimesine Türkçe dökümü.",
    "summary": "Konuşmanın kısa, maddeler halinde (markdown bullet points) özeti.",
    "duas": [ { "text": "Konuşmada geçen dua metni" } ]
}

Eğer konuşmada dua yoksa "duas" boş array olsun."#;

/// Structured result the model is asked to emit
#[derive(Debug, Deserialize)]
struct AiAudioResult {
    transcript: Option<String>,
    summary: Option<String>,
    duas: Option<Vec<AiDua>>,
}

#[derive(Debug, Deserialize)]
struct AiDua {
    text: String,
}

/// The fields a successful run writes back to the note
#[derive(Debug, PartialEq)]
struct ProcessedFields {
    transcript: String,
    summary: String,
    duas: Vec<Dua>,
}

pub struct TranscriptionPipeline {
    notes: Arc<NoteStore>,
    blobs: Arc<dyn BlobStore>,
    model: Arc<dyn AiModel>,
    scratch_dir: PathBuf,
}

impl TranscriptionPipeline {
    pub fn new(
        notes: Arc<NoteStore>,
        blobs: Arc<dyn BlobStore>,
        model: Arc<dyn AiModel>,
        scratch_dir: PathBuf,
    ) -> Self {
        Self {
            notes,
            blobs,
            model,
            scratch_dir,
        }
    }

    /// Idempotent entry point, shared by the upload trigger and the manual
    /// retry callable. Missing notes are a logged no-op: notes are always
    /// client-created first, never created here.
    #[instrument(skip(self), fields(note_id = %note_id))]
    pub async fn process(&self, note_id: &str, bucket: &str, path: &str) -> Result<()> {
        let Some(mut note) = self.notes.get(note_id).await? else {
            warn!("Note document not found, skipping");
            return Ok(());
        };

        // Re-entry always resets to a clean processing state
        note.status = NoteStatus::Processing;
        note.ai_status_message = Some(MSG_STARTED.to_string());
        note.updated_at = Some(Utc::now());
        self.notes.put(&note).await?;

        let scratch = self.scratch_dir.join(format!("{}.m4a", note.id));

        match self.download_and_transcribe(&note, bucket, path, &scratch).await {
            Ok(raw_response) => {
                let fields = parse_ai_response(&raw_response);

                note.status = NoteStatus::Ready;
                note.transcript_text = Some(fields.transcript);
                note.summary_text = Some(fields.summary);
                note.duas = fields.duas;
                note.processed_at = Some(Utc::now());
                note.updated_at = Some(Utc::now());
                note.ai_status_message = None;
                self.notes.put(&note).await?;

                if let Err(e) = tokio::fs::remove_file(&scratch).await {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        warn!("Failed to remove scratch file: {}", e);
                    }
                }

                info!("Note processed successfully");
                Ok(())
            }
            Err(e) => {
                // Transcript/summary fields keep whatever they held before;
                // a failed run never overwrites them with partial output.
                note.status = NoteStatus::Failed;
                note.ai_status_message = Some(format!("Hata: {}", truncate(&e.to_string())));
                note.updated_at = Some(Utc::now());
                self.notes.put(&note).await?;

                warn!("Note processing failed: {:#}", e);
                Ok(())
            }
        }
    }

    /// Steps 3-4: download the blob, announce progress, one blocking AI
    /// call. Any error here routes the run to `failed`.
    async fn download_and_transcribe(
        &self,
        note: &Note,
        bucket: &str,
        path: &str,
        scratch: &std::path::Path,
    ) -> Result<String> {
        let size = self
            .blobs
            .download(bucket, path, scratch)
            .await
            .context("Ses dosyası indirilemedi")?;
        info!(bytes = size, "Audio downloaded");

        let mut progress = note.clone();
        progress.ai_status_message = Some(MSG_ANALYZING.to_string());
        self.notes.put(&progress).await?;

        let audio = tokio::fs::read(scratch)
            .await
            .context("İndirilen ses dosyası okunamadı")?;

        self.model
            .generate(&[
                AiPart::text(TRANSCRIBE_PROMPT),
                AiPart::audio("audio/mp4", audio),
            ])
            .await
    }
}

/// Parse the model output. Never fails: malformed JSON degrades to a
/// raw-transcript result, because partial value outranks no value.
fn parse_ai_response(raw: &str) -> ProcessedFields {
    let cleaned = strip_code_fences(raw);

    match serde_json::from_str::<AiAudioResult>(&cleaned) {
        Ok(parsed) => ProcessedFields {
            transcript: parsed
                .transcript
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| MSG_NO_TRANSCRIPT.to_string()),
            summary: parsed
                .summary
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| MSG_NO_SUMMARY.to_string()),
            duas: parsed
                .duas
                .unwrap_or_default()
                .into_iter()
                .map(|d| Dua::new(d.text))
                .collect(),
        },
        Err(e) => {
            warn!("AI response was not valid JSON, salvaging raw transcript: {}", e);
            ProcessedFields {
                transcript: raw.to_string(),
                summary: MSG_SUMMARY_FALLBACK.to_string(),
                duas: Vec::new(),
            }
        }
    }
}

fn truncate(msg: &str) -> String {
    msg.chars().take(ERROR_MESSAGE_MAX_CHARS).collect()
}
