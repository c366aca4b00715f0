//! Chat orchestrator: one AI call with a fixed persona, plus an optional
//! video lookup that is never allowed to fail the chat response.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::adapters::{AiModel, AiPart, VideoResult, VideoSearch};

use super::strip_code_fences;

const TURKISH_MONTHS: [&str; 12] = [
    "Ocak", "Şubat", "Mart", "Nisan", "Mayıs", "Haziran", "Temmuz", "Ağustos", "Eylül", "Ekim",
    "Kasım", "Aralık",
];

/// Composed chat response
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatReply {
    pub answer: String,
    pub video: Option<VideoResult>,
}

/// Structured answer the model is asked to emit
#[derive(Debug, Deserialize)]
struct AiChatResult {
    answer: Option<String>,
    #[serde(rename = "youtubeQuery")]
    youtube_query: Option<String>,
}

pub struct ChatOrchestrator {
    model: Arc<dyn AiModel>,
    videos: Arc<dyn VideoSearch>,
}

impl ChatOrchestrator {
    pub fn new(model: Arc<dyn AiModel>, videos: Arc<dyn VideoSearch>) -> Self {
        Self { model, videos }
    }

    /// Persona embedding the current date; answers must be Turkish-only and
    /// strictly the `{answer, youtubeQuery}` JSON object.
    fn persona(now: DateTime<Utc>) -> String {
        let today = format!(
            "{} {} {}",
            now.day(),
            TURKISH_MONTHS[now.month0() as usize],
            now.year()
        );

        format!(
            "Sen 'İman Defterim AI' asistanısın. Bugünkü tarih: {today}. Şu an {year} yılındayız.\n\
             Samimi, İslami ve bilge bir dille, sadece Türkçe yanıt ver.\n\
             Kullanıcının sorusuna göre YouTube'da aratılacak bir video sorgusu üret. \
             Eğer video gerekliyse, sorgunun sonuna mutlaka \"Türkçe\" kelimesini ekle (örn: \"Sabır duası Türkçe\").\n\
             Yanıtını SADECE şu JSON şemasında ver: \
             {{ \"answer\": \"Markdown formatlı cevap\", \"youtubeQuery\": \"YouTube arama terimi veya null\" }}.\n\
             JSON dışında hiçbir şey yazma.",
            today = today,
            year = now.year()
        )
    }

    /// One blocking AI call, fence-strip + parse with a raw-text fallback,
    /// then at most one video lookup whose failure degrades to `None`.
    /// Side-effect-free with respect to quota; the caller increments only
    /// after this returns Ok.
    #[instrument(skip(self, prompt))]
    pub async fn chat(&self, prompt: &str) -> Result<ChatReply> {
        if prompt.trim().is_empty() {
            anyhow::bail!("Geçersiz istek.");
        }

        let full_prompt = format!("{}\n\nKullanıcı: {}", Self::persona(Utc::now()), prompt);
        let raw = self.model.generate(&[AiPart::text(full_prompt)]).await?;

        let cleaned = strip_code_fences(&raw);
        let parsed = match serde_json::from_str::<AiChatResult>(&cleaned) {
            Ok(result) => result,
            Err(e) => {
                warn!("Chat response was not valid JSON, answering with raw text: {}", e);
                AiChatResult {
                    answer: Some(raw.clone()),
                    youtube_query: None,
                }
            }
        };

        let video = match parsed.youtube_query {
            Some(query) if !query.is_empty() => {
                info!(query = %query, "Searching for a video");
                match self.videos.search_top(&query).await {
                    Ok(result) => result,
                    Err(e) => {
                        // A failed lookup never fails the chat response
                        warn!("Video search failed, continuing without one: {:#}", e);
                        None
                    }
                }
            }
            _ => None,
        };

        Ok(ChatReply {
            answer: parsed.answer.unwrap_or(raw),
            video,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_persona_embeds_turkish_date() {
        let now = Utc.with_ymd_and_hms(2025, 8, 29, 10, 0, 0).unwrap();
        let persona = ChatOrchestrator::persona(now);

        assert!(persona.contains("29 Ağustos 2025"));
        assert!(persona.contains("2025 yılındayız"));
        assert!(persona.contains("youtubeQuery"));
    }

    #[test]
    fn test_chat_result_parsing() {
        let raw = "```json\n{\"answer\": \"Sabır hakkında...\", \"youtubeQuery\": \"Sabır duası Türkçe\"}\n```";
        let parsed: AiChatResult = serde_json::from_str(&strip_code_fences(raw)).unwrap();

        assert_eq!(parsed.answer.as_deref(), Some("Sabır hakkında..."));
        assert_eq!(parsed.youtube_query.as_deref(), Some("Sabır duası Türkçe"));
    }

    #[test]
    fn test_chat_result_null_query() {
        let parsed: AiChatResult =
            serde_json::from_str(r#"{"answer": "Selam", "youtubeQuery": null}"#).unwrap();

        assert!(parsed.youtube_query.is_none());
    }
}
