//! Prayer-time resolver: cache, then external API, then deterministic mock.
//!
//! Each tier is attempted only when the previous one is unavailable, and no
//! tier's failure escapes the resolver boundary.

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use crate::adapters::PrayerTimesApi;
use crate::domain::{generate_mock_times, prayer::format_date, PrayerTimesDoc};
use crate::store::PrayerCache;

/// Plates pre-warmed by the daily scheduled job (Ankara, Istanbul, Izmir)
const PREWARM_PLATES: [u8; 3] = [6, 34, 35];

pub struct PrayerTimeResolver {
    cache: Arc<PrayerCache>,
    api: Arc<dyn PrayerTimesApi>,
}

impl PrayerTimeResolver {
    pub fn new(cache: Arc<PrayerCache>, api: Arc<dyn PrayerTimesApi>) -> Self {
        Self { cache, api }
    }

    /// Resolve prayer times for a region and date. Infallible: the mock
    /// tier always produces a document.
    #[instrument(skip(self, city_override))]
    pub async fn resolve(
        &self,
        plate_code: u8,
        date: NaiveDate,
        city_override: Option<&str>,
    ) -> PrayerTimesDoc {
        let date_str = format_date(date);

        // Tier 1: cached document, served as-is when present
        match self.cache.get(plate_code, &date_str).await {
            Ok(Some(doc)) => {
                info!("Serving cached prayer times");
                return doc;
            }
            Ok(None) => {}
            Err(e) => warn!("Prayer cache read failed, trying API: {:#}", e),
        }

        // Tier 2: external time-table API; cache write is fire-and-forget
        let city = city_override
            .map(str::to_string)
            .unwrap_or_else(|| city_for_plate(plate_code).to_string());

        match self.api.fetch(plate_code, &city, date).await {
            Ok(doc) => {
                let cache = Arc::clone(&self.cache);
                let to_cache = doc.clone();
                tokio::spawn(async move {
                    if let Err(e) = cache.put(&to_cache).await {
                        warn!("Failed to cache prayer times: {:#}", e);
                    }
                });
                return doc;
            }
            Err(e) => warn!("Prayer-time API failed, using mock data: {:#}", e),
        }

        // Tier 3: deterministic mock. Intentionally NOT cached, so a later
        // real-API attempt is not preempted.
        generate_mock_times(plate_code, &date_str)
    }

    /// Daily scheduled job: pre-warm the cache for the major regions.
    /// Returns the number of documents written.
    pub async fn prewarm(&self, date: NaiveDate) -> Result<usize> {
        let date_str = format_date(date);
        let mut written = 0;

        for plate_code in PREWARM_PLATES {
            let doc = generate_mock_times(plate_code, &date_str);
            self.cache.put(&doc).await?;
            info!(plate = plate_code, date = %date_str, "Cached prayer times");
            written += 1;
        }

        Ok(written)
    }
}

/// City name for the external API. Major provinces are mapped; everything
/// else falls back to Istanbul, same default the profile uses.
fn city_for_plate(plate_code: u8) -> &'static str {
    match plate_code {
        1 => "Adana",
        6 => "Ankara",
        7 => "Antalya",
        16 => "Bursa",
        27 => "Gaziantep",
        34 => "Istanbul",
        35 => "Izmir",
        38 => "Kayseri",
        42 => "Konya",
        61 => "Trabzon",
        _ => "Istanbul",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_mapping_falls_back_to_istanbul() {
        assert_eq!(city_for_plate(6), "Ankara");
        assert_eq!(city_for_plate(34), "Istanbul");
        assert_eq!(city_for_plate(81), "Istanbul");
    }
}
