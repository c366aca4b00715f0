//! YouTube Data API v3 search adapter.
//!
//! Only ever asks for the single top hit; a missing API key surfaces as an
//! error so the chat orchestrator can degrade to a text-only answer.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{VideoResult, VideoSearch};

const SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";

pub struct YouTubeSearchClient {
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Option<Vec<SearchItem>>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: ItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
    thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl YouTubeSearchClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl VideoSearch for YouTubeSearchClient {
    async fn search_top(&self, query: &str) -> Result<Option<VideoResult>> {
        let api_key = self
            .api_key
            .as_deref()
            .context("No API key available for video search")?;

        let response = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("part", "snippet"),
                ("maxResults", "1"),
                ("q", query),
                ("type", "video"),
                ("key", api_key),
            ])
            .send()
            .await
            .context("YouTube search request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("YouTube API error {}: {}", status, body);
        }

        let search: SearchResponse = response
            .json()
            .await
            .context("Failed to parse YouTube search response")?;

        let Some(item) = search.items.and_then(|mut items| {
            if items.is_empty() {
                None
            } else {
                Some(items.remove(0))
            }
        }) else {
            return Ok(None);
        };

        let Some(video_id) = item.id.video_id else {
            return Ok(None);
        };

        // Prefer the high-res thumbnail, fall back to default
        let thumbnail_url = item
            .snippet
            .thumbnails
            .high
            .or(item.snippet.thumbnails.default)
            .map(|t| t.url)
            .unwrap_or_default();

        Ok(Some(VideoResult {
            id: video_id,
            title: item.snippet.title,
            thumbnail_url,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_api_key_is_an_error() {
        let client = YouTubeSearchClient::new(None);
        assert!(client.search_top("sabır duası Türkçe").await.is_err());
    }

    #[test]
    fn test_response_parsing_prefers_high_thumbnail() {
        let json = r#"{
            "items": [{
                "id": {"videoId": "abc123"},
                "snippet": {
                    "title": "Sabır Duası",
                    "thumbnails": {
                        "default": {"url": "http://img/default.jpg"},
                        "high": {"url": "http://img/high.jpg"}
                    }
                }
            }]
        }"#;

        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        let item = parsed.items.unwrap().remove(0);
        let url = item
            .snippet
            .thumbnails
            .high
            .or(item.snippet.thumbnails.default)
            .unwrap()
            .url;

        assert_eq!(item.id.video_id.as_deref(), Some("abc123"));
        assert_eq!(url, "http://img/high.jpg");
    }
}
