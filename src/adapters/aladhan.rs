//! Aladhan time-table API adapter (method 13 = Diyanet).

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use super::PrayerTimesApi;
use crate::domain::{PrayerTimesData, PrayerTimesDoc};

const DEFAULT_BASE_URL: &str = "http://api.aladhan.com/v1";

pub struct AladhanClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct AladhanResponse {
    data: AladhanData,
}

#[derive(Debug, Deserialize)]
struct AladhanData {
    timings: AladhanTimings,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct AladhanTimings {
    Imsak: String,
    Sunrise: String,
    Dhuhr: String,
    Asr: String,
    Maghrib: String,
    Isha: String,
}

impl AladhanClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    fn timings_url(&self, city: &str, date: NaiveDate) -> String {
        // The API takes dd-MM-yyyy, unlike the cache-key format
        format!(
            "{}/timingsByCity/{}?city={}&country=Turkey&method=13",
            self.base_url,
            date.format("%d-%m-%Y"),
            city
        )
    }
}

impl Default for AladhanClient {
    fn default() -> Self {
        Self::new()
    }
}

/// The API may suffix a timezone, e.g. "06:45 (EEST)"
fn clean_time(raw: &str) -> String {
    raw.split_whitespace().next().unwrap_or(raw).to_string()
}

#[async_trait]
impl PrayerTimesApi for AladhanClient {
    async fn fetch(&self, plate_code: u8, city: &str, date: NaiveDate) -> Result<PrayerTimesDoc> {
        let url = self.timings_url(city, date);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Aladhan request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Aladhan API error: {}", response.status());
        }

        let body: AladhanResponse = response
            .json()
            .await
            .context("Failed to parse Aladhan response")?;
        let timings = body.data.timings;

        Ok(PrayerTimesDoc {
            plate_code,
            date: date.format("%Y-%m-%d").to_string(),
            times: PrayerTimesData {
                imsak: clean_time(&timings.Imsak),
                gunes: clean_time(&timings.Sunrise),
                ogle: clean_time(&timings.Dhuhr),
                ikindi: clean_time(&timings.Asr),
                aksam: clean_time(&timings.Maghrib),
                yatsi: clean_time(&timings.Isha),
            },
            source: "API".to_string(),
            fetched_at: Utc::now(),
        })
    }
}
