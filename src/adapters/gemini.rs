//! Gemini adapter over the Generative Language REST API.
//!
//! Audio is passed inline as base64; large files would need the File API,
//! but voice notes stay well under the inline limit.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::{AiModel, AiPart};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiClient {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
enum RequestPart {
    #[serde(rename = "text")]
    Text(String),

    #[serde(rename = "inlineData", rename_all = "camelCase")]
    InlineData { mime_type: String, data: String },
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: impl Into<String>) -> Self {
        Self {
            api_key,
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            API_BASE, self.model, self.api_key
        )
    }

    fn encode_parts(parts: &[AiPart]) -> Vec<RequestPart> {
        parts
            .iter()
            .map(|part| match part {
                AiPart::Text(text) => RequestPart::Text(text.clone()),
                AiPart::InlineAudio { mime_type, data } => RequestPart::InlineData {
                    mime_type: mime_type.clone(),
                    data: base64::engine::general_purpose::STANDARD.encode(data),
                },
            })
            .collect()
    }
}

#[async_trait]
impl AiModel for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, parts: &[AiPart]) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: Self::encode_parts(parts),
            }],
        };

        let response = self
            .client
            .post(self.api_url())
            .json(&request)
            .send()
            .await
            .context("Failed to reach the Gemini API")?;

        let status = response.status();
        let body: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        if let Some(error) = body.error {
            anyhow::bail!("Gemini API error ({}): {}", status, error.message);
        }

        let text = body
            .candidates
            .and_then(|mut c| c.drain(..).next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .map(|parts| {
                parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            anyhow::bail!("Gemini returned an empty response");
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url() {
        let client = GeminiClient::new("KEY".to_string(), "gemini-2.0-flash");
        assert_eq!(
            client.api_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent?key=KEY"
        );
    }

    #[test]
    fn test_inline_audio_is_base64() {
        let parts = GeminiClient::encode_parts(&[AiPart::audio("audio/mp4", vec![1, 2, 3])]);

        let json = serde_json::to_value(&parts).unwrap();
        assert_eq!(json[0]["inlineData"]["mimeType"], "audio/mp4");
        assert_eq!(json[0]["inlineData"]["data"], "AQID");
    }

    #[test]
    fn test_adapter_name() {
        let client = GeminiClient::new("KEY".to_string(), "gemini-2.0-flash");
        assert_eq!(client.name(), "gemini");
    }
}
