//! Transcription Pipeline Integration Tests
//!
//! Exercises the processing → ready/failed state machine end to end against
//! a local bucket and a scripted AI model.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use defter::adapters::{AiModel, AiPart, LocalBlobStore};
use defter::core::TranscriptionPipeline;
use defter::domain::{Note, NoteStatus, NoteType};
use defter::store::NoteStore;

/// AI model returning a canned response (or failing)
struct ScriptedModel {
    response: Result<String, String>,
}

impl ScriptedModel {
    fn ok(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
        }
    }

    fn failing(error: &str) -> Self {
        Self {
            response: Err(error.to_string()),
        }
    }
}

#[async_trait]
impl AiModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, _parts: &[AiPart]) -> Result<String> {
        match &self.response {
            Ok(r) => Ok(r.clone()),
            Err(e) => anyhow::bail!("{}", e),
        }
    }
}

struct Harness {
    _temp: TempDir,
    bucket: String,
    notes: Arc<NoteStore>,
    pipeline: TranscriptionPipeline,
}

fn harness(model: ScriptedModel) -> Harness {
    let temp = TempDir::new().unwrap();
    let home = temp.path().join("home");
    let bucket_dir = temp.path().join("bucket");
    std::fs::create_dir_all(&bucket_dir).unwrap();

    let notes = Arc::new(NoteStore::new(&home));
    let pipeline = TranscriptionPipeline::new(
        Arc::clone(&notes),
        Arc::new(LocalBlobStore::new()),
        Arc::new(model),
        home.join("tmp"),
    );

    Harness {
        bucket: bucket_dir.display().to_string(),
        _temp: temp,
        notes,
        pipeline,
    }
}

async fn seed_audio_note(h: &Harness, uid: &str) -> (Note, String) {
    let note = Note::new_audio(uid, "Cuma vaazı", NoteType::AudioRecording, "pending");
    let object_path = format!("users/{}/audio/{}.m4a", uid, note.id);

    let mut note = note;
    note.audio_storage_path = Some(object_path.clone());
    h.notes.put(&note).await.unwrap();

    let full = Path::new(&h.bucket).join(&object_path);
    std::fs::create_dir_all(full.parent().unwrap()).unwrap();
    std::fs::write(&full, b"fake m4a bytes").unwrap();

    (note, object_path)
}

#[tokio::test]
async fn test_successful_run_reaches_ready() {
    let h = harness(ScriptedModel::ok(
        r#"```json
{"transcript": "Bugün sabır konusunu anlattık.", "summary": "- Sabır\n- Şükür", "duas": [{"text": "Rabbena atina"}]}
```"#,
    ));
    let (note, path) = seed_audio_note(&h, "u1").await;

    h.pipeline.process(&note.id, &h.bucket, &path).await.unwrap();

    let done = h.notes.get(&note.id).await.unwrap().unwrap();
    assert_eq!(done.status, NoteStatus::Ready);
    assert_eq!(
        done.transcript_text.as_deref(),
        Some("Bugün sabır konusunu anlattık.")
    );
    assert_eq!(done.summary_text.as_deref(), Some("- Sabır\n- Şükür"));
    assert_eq!(done.duas.len(), 1);
    assert!(done.processed_at.is_some());
    assert!(done.ai_status_message.is_none(), "status message cleared on success");
}

#[tokio::test]
async fn test_model_failure_reaches_failed_with_message() {
    let h = harness(ScriptedModel::failing("model overloaded"));
    let (note, path) = seed_audio_note(&h, "u1").await;

    h.pipeline.process(&note.id, &h.bucket, &path).await.unwrap();

    let done = h.notes.get(&note.id).await.unwrap().unwrap();
    assert_eq!(done.status, NoteStatus::Failed);

    let msg = done.ai_status_message.unwrap();
    assert!(msg.starts_with("Hata: "), "got: {}", msg);
    assert!(msg.contains("model overloaded"));
    assert!(done.transcript_text.is_none(), "failure writes no partial transcript");
}

#[tokio::test]
async fn test_missing_audio_object_reaches_failed() {
    let h = harness(ScriptedModel::ok("{}"));

    let mut note = Note::new_audio("u1", "Kayıp", NoteType::AudioRecording, "pending");
    let path = format!("users/u1/audio/{}.m4a", note.id);
    note.audio_storage_path = Some(path.clone());
    h.notes.put(&note).await.unwrap();

    // No object written to the bucket
    h.pipeline.process(&note.id, &h.bucket, &path).await.unwrap();

    let done = h.notes.get(&note.id).await.unwrap().unwrap();
    assert_eq!(done.status, NoteStatus::Failed);
    assert!(done
        .ai_status_message
        .unwrap()
        .contains("Ses dosyası indirilemedi"));
}

#[tokio::test]
async fn test_missing_note_is_a_no_op() {
    let h = harness(ScriptedModel::ok("{}"));

    h.pipeline
        .process("no-such-note", &h.bucket, "users/u1/audio/no-such-note.m4a")
        .await
        .unwrap();

    assert!(h.notes.get("no-such-note").await.unwrap().is_none());
}

#[tokio::test]
async fn test_malformed_json_degrades_to_raw_transcript() {
    let raw = "Özür dilerim, JSON üretemedim ama konuşma sabır hakkındaydı.";
    let h = harness(ScriptedModel::ok(raw));
    let (note, path) = seed_audio_note(&h, "u1").await;

    h.pipeline.process(&note.id, &h.bucket, &path).await.unwrap();

    let done = h.notes.get(&note.id).await.unwrap().unwrap();
    assert_eq!(done.status, NoteStatus::Ready, "salvaged output still counts as ready");
    assert_eq!(done.transcript_text.as_deref(), Some(raw));
    assert!(done
        .summary_text
        .unwrap()
        .contains("Otomatik özet oluşturulamadı"));
    assert!(done.duas.is_empty());
}

#[tokio::test]
async fn test_retry_after_failure_recovers() {
    // First run fails at the model
    let h = harness(ScriptedModel::failing("timeout"));
    let (note, path) = seed_audio_note(&h, "u1").await;

    h.pipeline.process(&note.id, &h.bucket, &path).await.unwrap();
    assert_eq!(
        h.notes.get(&note.id).await.unwrap().unwrap().status,
        NoteStatus::Failed
    );

    // A fresh pipeline over the same stores plays the retry
    let retry_pipeline = TranscriptionPipeline::new(
        Arc::clone(&h.notes),
        Arc::new(LocalBlobStore::new()),
        Arc::new(ScriptedModel::ok(
            r#"{"transcript": "İkinci deneme başarılı.", "summary": "- Tamam", "duas": []}"#,
        )),
        std::env::temp_dir().join("defter-retry-test"),
    );

    retry_pipeline.process(&note.id, &h.bucket, &path).await.unwrap();

    let done = h.notes.get(&note.id).await.unwrap().unwrap();
    assert_eq!(done.status, NoteStatus::Ready);
    assert_eq!(done.transcript_text.as_deref(), Some("İkinci deneme başarılı."));
    assert!(done.ai_status_message.is_none(), "old failure message discarded");
}
