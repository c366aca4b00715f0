//! Command-line interface for defter.
//!
//! Provides commands for watching the upload bucket, triggering intake and
//! retries, chatting, prayer times, and inspecting stored notes.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate, Utc};
use clap::{Parser, Subcommand};

use crate::adapters::{
    AladhanClient, FcmClient, GeminiClient, LocalBlobStore, YouTubeSearchClient,
};
use crate::config;
use crate::core::{
    ChatOrchestrator, EntitlementGate, PrayerTimeResolver, TranscriptionPipeline,
};
use crate::ingest::{Intake, UploadWatcher, WatcherConfig};
use crate::service::Service;
use crate::store::{FolderStore, NoteStore, PrayerCache, ProfileStore, QuotaStore};

/// defter - audio note transcription backend
#[derive(Parser, Debug)]
#[command(name = "defter")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch the bucket directory and process finalized uploads
    Watch,

    /// Process one uploaded object by its bucket-relative path
    Intake {
        /// Object path, e.g. users/<uid>/audio/<noteId>.m4a
        path: String,
    },

    /// Retry processing for a note
    Retry {
        /// Acting user id
        #[arg(short, long)]
        uid: String,

        /// Note ID to reprocess
        note_id: String,
    },

    /// Ask the assistant a question
    Chat {
        /// Acting user id
        #[arg(short, long)]
        uid: String,

        /// The question
        prompt: String,
    },

    /// Show prayer times for a province
    Prayer {
        /// Acting user id
        #[arg(short, long)]
        uid: String,

        /// Province plate code (1-81)
        plate: u8,

        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Pre-warm the prayer-time cache for the major provinces
    Prewarm {
        /// Date (YYYY-MM-DD, defaults to tomorrow)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Send a test notification to a user's registered device
    Notify {
        /// Acting user id
        uid: String,
    },

    /// Manage notes
    Note {
        #[command(subcommand)]
        command: NoteCommands,
    },

    /// Show resolved configuration (debug)
    Config,
}

#[derive(Subcommand, Debug)]
pub enum NoteCommands {
    /// Create a note from exactly one content source
    Create {
        /// Acting user id
        #[arg(short, long)]
        uid: String,

        /// Note title
        title: String,

        /// Bucket-relative audio object path
        #[arg(long)]
        audio: Option<String>,

        /// YouTube URL
        #[arg(long)]
        youtube: Option<String>,

        /// Scanned or typed text
        #[arg(long)]
        text: Option<String>,
    },

    /// List a user's notes
    List {
        /// Acting user id
        uid: String,
    },

    /// Delete a note (and its audio object, if any)
    Delete {
        /// Acting user id
        #[arg(short, long)]
        uid: String,

        /// Note ID
        note_id: String,
    },
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Watch => watch_bucket().await,
            Commands::Intake { path } => run_intake(&path).await,
            Commands::Retry { uid, note_id } => retry(&uid, &note_id).await,
            Commands::Chat { uid, prompt } => chat(&uid, &prompt).await,
            Commands::Prayer { uid, plate, date } => prayer(&uid, plate, date).await,
            Commands::Prewarm { date } => prewarm(date).await,
            Commands::Notify { uid } => notify(&uid).await,
            Commands::Note { command } => execute_note(command).await,
            Commands::Config => show_config(),
        }
    }
}

/// Wire up the full service from config and environment
fn build_service() -> Result<Service> {
    let cfg = config::config()?;
    let api_key = config::gemini_api_key()?;

    let notes = Arc::new(NoteStore::new(&cfg.home));
    let folders = Arc::new(FolderStore::new(&cfg.home));
    let profiles = Arc::new(ProfileStore::new(&cfg.home));
    let quotas = Arc::new(QuotaStore::new(&cfg.home));
    let cache = Arc::new(PrayerCache::new(&cfg.home));
    let blobs = Arc::new(LocalBlobStore::new());

    let audio_model = Arc::new(GeminiClient::new(api_key.clone(), cfg.ai.audio_model.as_str()));
    let chat_model = Arc::new(GeminiClient::new(api_key, cfg.ai.chat_model.as_str()));
    let videos = Arc::new(YouTubeSearchClient::new(config::youtube_api_key()));
    let push = Arc::new(FcmClient::new(config::fcm_server_key().unwrap_or_default()));

    let pipeline = Arc::new(TranscriptionPipeline::new(
        Arc::clone(&notes),
        blobs.clone(),
        audio_model,
        cfg.scratch_dir(),
    ));

    Ok(Service::new(
        cfg.bucket.display().to_string(),
        notes,
        folders,
        profiles,
        blobs,
        push,
        pipeline,
        ChatOrchestrator::new(chat_model, videos),
        EntitlementGate::new(quotas),
        PrayerTimeResolver::new(cache, Arc::new(AladhanClient::new())),
    ))
}

fn build_intake() -> Result<Intake> {
    let cfg = config::config()?;
    let api_key = config::gemini_api_key()?;

    let notes = Arc::new(NoteStore::new(&cfg.home));
    let pipeline = Arc::new(TranscriptionPipeline::new(
        notes,
        Arc::new(LocalBlobStore::new()),
        Arc::new(GeminiClient::new(api_key, cfg.ai.audio_model.as_str())),
        cfg.scratch_dir(),
    ));

    Ok(Intake::new(pipeline))
}

fn parse_date(date: Option<String>) -> Result<NaiveDate> {
    match date {
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .with_context(|| format!("Invalid date: {} (expected YYYY-MM-DD)", s)),
        None => Ok(Utc::now().date_naive()),
    }
}

/// Prewarm runs ahead of the day it serves, so without an explicit date it
/// targets tomorrow rather than today.
fn prewarm_date(date: Option<String>) -> Result<NaiveDate> {
    match date {
        Some(_) => parse_date(date),
        None => Ok(Utc::now().date_naive() + Days::new(1)),
    }
}

/// Watch the bucket for finalized uploads until interrupted
async fn watch_bucket() -> Result<()> {
    let cfg = config::config()?;
    let intake = build_intake()?;

    let watcher = UploadWatcher::new(WatcherConfig {
        bucket: cfg.bucket.clone(),
        stability_delay_secs: cfg.watcher.stability_delay_secs,
        extensions: cfg.watcher.extensions.clone(),
    });

    let bucket = cfg.bucket.display().to_string();
    let (mut events, handle) = watcher.watch().await?;

    eprintln!("Watching {} (Ctrl-C to stop)", bucket);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                if let Err(e) = intake.handle_object_finalized(&bucket, &event.object_path).await {
                    eprintln!("Failed to process {}: {:#}", event.object_path, e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!("Stopping...");
                break;
            }
        }
    }

    handle.stop().await
}

async fn run_intake(path: &str) -> Result<()> {
    let cfg = config::config()?;
    let intake = build_intake()?;

    intake
        .handle_object_finalized(&cfg.bucket.display().to_string(), path)
        .await
}

async fn retry(uid: &str, note_id: &str) -> Result<()> {
    let service = build_service()?;

    let response = service
        .retry_processing(Some(uid), Some(note_id))
        .await
        .map_err(|e| anyhow::anyhow!("[{}] {}", e.code(), e))?;

    println!("{}", response.message);
    Ok(())
}

async fn chat(uid: &str, prompt: &str) -> Result<()> {
    let service = build_service()?;

    let reply = service
        .ask_ai(Some(uid), prompt)
        .await
        .map_err(|e| anyhow::anyhow!("[{}] {}", e.code(), e))?;

    println!("{}", reply.answer);
    if let Some(video) = reply.video {
        println!("\nVideo: {} (https://youtu.be/{})", video.title, video.id);
    }

    Ok(())
}

async fn prayer(uid: &str, plate: u8, date: Option<String>) -> Result<()> {
    let date = parse_date(date)?;
    let service = build_service()?;

    let doc = service
        .get_prayer_times(Some(uid), plate, date)
        .await
        .map_err(|e| anyhow::anyhow!("[{}] {}", e.code(), e))?;

    println!("Plaka {} / {} ({})", doc.plate_code, doc.date, doc.source);
    println!("  İmsak:  {}", doc.times.imsak);
    println!("  Güneş:  {}", doc.times.gunes);
    println!("  Öğle:   {}", doc.times.ogle);
    println!("  İkindi: {}", doc.times.ikindi);
    println!("  Akşam:  {}", doc.times.aksam);
    println!("  Yatsı:  {}", doc.times.yatsi);

    // The upcoming prayer is only meaningful against today's schedule
    if date == Utc::now().date_naive() {
        let (name, time) = doc.next_prayer(chrono::Local::now().time());
        println!("\nSıradaki vakit: {} ({})", prayer_label(name), time);
    }

    Ok(())
}

fn prayer_label(name: &str) -> &'static str {
    match name {
        "imsak" => "İmsak",
        "gunes" => "Güneş",
        "ogle" => "Öğle",
        "ikindi" => "İkindi",
        "aksam" => "Akşam",
        _ => "Yatsı",
    }
}

async fn prewarm(date: Option<String>) -> Result<()> {
    let date = prewarm_date(date)?;
    let cfg = config::config()?;

    let resolver = PrayerTimeResolver::new(
        Arc::new(PrayerCache::new(&cfg.home)),
        Arc::new(AladhanClient::new()),
    );

    let written = resolver.prewarm(date).await?;
    println!("Cached prayer times for {} provinces", written);

    Ok(())
}

async fn notify(uid: &str) -> Result<()> {
    let service = build_service()?;

    let response = service
        .send_test_notification(Some(uid))
        .await
        .map_err(|e| anyhow::anyhow!("[{}] {}", e.code(), e))?;

    println!("{}", response.message);
    Ok(())
}

/// Execute note subcommands
async fn execute_note(command: NoteCommands) -> Result<()> {
    match command {
        NoteCommands::Create {
            uid,
            title,
            audio,
            youtube,
            text,
        } => create_note(&uid, &title, audio, youtube, text).await,
        NoteCommands::List { uid } => list_notes(&uid).await,
        NoteCommands::Delete { uid, note_id } => delete_note(&uid, &note_id).await,
    }
}

async fn create_note(
    uid: &str,
    title: &str,
    audio: Option<String>,
    youtube: Option<String>,
    text: Option<String>,
) -> Result<()> {
    use crate::domain::{Note, NoteType};

    let note = match (audio, youtube, text) {
        (Some(path), None, None) => Note::new_audio(uid, title, NoteType::UploadedAudio, path),
        (None, Some(url), None) => Note::new_youtube(uid, title, url),
        (None, None, Some(content)) => Note::new_scanned(uid, title, content),
        _ => anyhow::bail!("Provide exactly one of --audio, --youtube, --text"),
    };

    let service = build_service()?;
    let created = service
        .create_note(Some(uid), note)
        .await
        .map_err(|e| anyhow::anyhow!("[{}] {}", e.code(), e))?;

    println!("Created note {}", created.id);
    Ok(())
}

async fn delete_note(uid: &str, note_id: &str) -> Result<()> {
    let service = build_service()?;

    let response = service
        .delete_note(Some(uid), note_id)
        .await
        .map_err(|e| anyhow::anyhow!("[{}] {}", e.code(), e))?;

    println!("{}", response.message);
    Ok(())
}

async fn list_notes(uid: &str) -> Result<()> {
    let service = build_service()?;

    let notes = service
        .list_notes(Some(uid))
        .await
        .map_err(|e| anyhow::anyhow!("[{}] {}", e.code(), e))?;

    if notes.is_empty() {
        println!("No notes found for {}", uid);
        return Ok(());
    }

    println!("{:<38} {:<12} {:<30}", "NOTE ID", "STATUS", "TITLE");
    println!("{}", "-".repeat(80));

    for note in notes {
        let title = if note.title.chars().count() > 27 {
            let short: String = note.title.chars().take(27).collect();
            format!("{}...", short)
        } else {
            note.title.clone()
        };
        println!("{:<38} {:<12} {:<30}", note.id, format!("{:?}", note.status).to_lowercase(), title);
    }

    Ok(())
}

/// Show the resolved configuration (for debugging)
fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("Config file: {}", cfg.config_file.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "(none - using defaults)".to_string()));
    println!();
    println!("Paths:");
    println!("  Home (document stores): {}", cfg.home.display());
    println!("  Bucket (audio objects): {}", cfg.bucket.display());
    println!("  Scratch:                {}", cfg.scratch_dir().display());
    println!();
    println!("AI models:");
    println!("  Audio: {}", cfg.ai.audio_model);
    println!("  Chat:  {}", cfg.ai.chat_model);
    println!();
    println!("Watcher:");
    println!("  Stability delay: {}s", cfg.watcher.stability_delay_secs);
    println!("  Extensions:      {}", cfg.watcher.extensions.join(", "));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_defaults_to_today() {
        assert_eq!(parse_date(None).unwrap(), Utc::now().date_naive());
        assert_eq!(
            parse_date(Some("2025-06-15".to_string())).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
        );
        assert!(parse_date(Some("15.06.2025".to_string())).is_err());
    }

    #[test]
    fn test_prewarm_defaults_to_tomorrow() {
        let today = Utc::now().date_naive();
        assert_eq!(prewarm_date(None).unwrap(), today + Days::new(1));

        // An explicit date still wins
        assert_eq!(
            prewarm_date(Some("2025-06-15".to_string())).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
        );
    }
}
