//! FCM push delivery adapter.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::PushGateway;

const DEFAULT_ENDPOINT: &str = "https://fcm.googleapis.com/fcm/send";

pub struct FcmClient {
    server_key: String,
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct FcmResponse {
    success: Option<u32>,
    failure: Option<u32>,
}

impl FcmClient {
    pub fn new(server_key: String) -> Self {
        Self::with_endpoint(server_key, DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(server_key: String, endpoint: impl Into<String>) -> Self {
        Self {
            server_key,
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl PushGateway for FcmClient {
    async fn send(&self, token: &str, title: &str, body: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("key={}", self.server_key))
            .json(&serde_json::json!({
                "to": token,
                "notification": {
                    "title": title,
                    "body": body,
                },
            }))
            .send()
            .await
            .context("Failed to reach FCM")?;

        if !response.status().is_success() {
            anyhow::bail!("FCM error: {}", response.status());
        }

        let result: FcmResponse = response.json().await.context("Failed to parse FCM response")?;

        if result.failure.unwrap_or(0) > 0 || result.success.unwrap_or(0) == 0 {
            anyhow::bail!("FCM rejected the message for this token");
        }

        Ok(())
    }
}
