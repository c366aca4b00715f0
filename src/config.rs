//! Configuration for defter paths and API access.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (DEFTER_HOME, DEFTER_BUCKET, GEMINI_API_KEY,
//!    YOUTUBE_API_KEY)
//! 2. Config file (.defter/config.yaml)
//! 3. Defaults (~/.defter)
//!
//! Config file discovery:
//! - Searches current directory and parents for .defter/config.yaml
//! - Paths in config file are relative to the config file's parent directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<std::result::Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub ai: Option<AiConfig>,
    #[serde(default)]
    pub watcher: Option<WatcherFileConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Data directory (relative to config file)
    pub home: Option<String>,
    /// Blob-store root, the local stand-in for the storage bucket
    pub bucket: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Model name for audio transcription
    pub audio_model: Option<String>,
    /// Model name for chat
    pub chat_model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatcherFileConfig {
    pub stability_delay_secs: Option<u64>,
    pub extensions: Option<Vec<String>>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to the data directory (document stores, scratch)
    pub home: PathBuf,
    /// Absolute path to the blob-store root
    pub bucket: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// AI model names
    pub ai: AiSettings,
    /// Upload watcher settings
    pub watcher: WatcherSettings,
}

#[derive(Debug, Clone)]
pub struct AiSettings {
    pub audio_model: String,
    pub chat_model: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            audio_model: "gemini-2.0-flash".to_string(),
            chat_model: "gemini-2.0-flash".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WatcherSettings {
    pub stability_delay_secs: u64,
    pub extensions: Vec<String>,
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            stability_delay_secs: 5,
            extensions: vec!["m4a".to_string(), "mp3".to_string()],
        }
    }
}

impl ResolvedConfig {
    /// Scratch directory for downloaded audio ($DEFTER_HOME/tmp)
    pub fn scratch_dir(&self) -> PathBuf {
        self.home.join("tmp")
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".defter").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".defter");

    let config_file = find_config_file();

    let (home, bucket, ai, watcher) = if let Some(ref config_path) = config_file {
        let config = load_config_file(config_path)?;

        // Base directory is the parent of .defter/ (i.e., grandparent of config.yaml)
        let base_dir = config_path
            .parent()
            .and_then(|p| p.parent())
            .unwrap_or(Path::new("."));

        let home = if let Ok(env_home) = std::env::var("DEFTER_HOME") {
            PathBuf::from(env_home)
        } else if let Some(ref home_path) = config.paths.home {
            // home is relative to the .defter/ directory
            let defter_dir = config_path.parent().unwrap_or(Path::new("."));
            resolve_path(defter_dir, home_path)
        } else {
            default_home.clone()
        };

        let bucket = if let Ok(env_bucket) = std::env::var("DEFTER_BUCKET") {
            PathBuf::from(env_bucket)
        } else if let Some(ref bucket_path) = config.paths.bucket {
            resolve_path(base_dir, bucket_path)
        } else {
            home.join("bucket")
        };

        let defaults = AiSettings::default();
        let ai = AiSettings {
            audio_model: config
                .ai
                .as_ref()
                .and_then(|a| a.audio_model.clone())
                .unwrap_or(defaults.audio_model),
            chat_model: config
                .ai
                .as_ref()
                .and_then(|a| a.chat_model.clone())
                .unwrap_or(defaults.chat_model),
        };

        let watcher_defaults = WatcherSettings::default();
        let watcher = WatcherSettings {
            stability_delay_secs: config
                .watcher
                .as_ref()
                .and_then(|w| w.stability_delay_secs)
                .unwrap_or(watcher_defaults.stability_delay_secs),
            extensions: config
                .watcher
                .as_ref()
                .and_then(|w| w.extensions.clone())
                .unwrap_or(watcher_defaults.extensions),
        };

        (home, bucket, ai, watcher)
    } else {
        // No config file - use env vars or defaults
        let home = std::env::var("DEFTER_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_home.clone());

        let bucket = std::env::var("DEFTER_BUCKET")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join("bucket"));

        (home, bucket, AiSettings::default(), WatcherSettings::default())
    };

    Ok(ResolvedConfig {
        home,
        bucket,
        config_file,
        ai,
        watcher,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

/// API key for the generative AI backend, from the environment
pub fn gemini_api_key() -> Result<String> {
    std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY is not set")
}

/// API key for video search; falls back to the AI key, which is valid for
/// both Google APIs in the common single-project setup
pub fn youtube_api_key() -> Option<String> {
    std::env::var("YOUTUBE_API_KEY")
        .or_else(|_| std::env::var("GEMINI_API_KEY"))
        .ok()
}

/// Server key for push delivery; push is optional, so absence is not an
/// error until a notification is actually sent
pub fn fcm_server_key() -> Option<String> {
    std::env::var("FCM_SERVER_KEY").ok()
}
