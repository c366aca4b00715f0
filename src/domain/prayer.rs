//! Prayer-time documents and the deterministic mock generator.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// The six daily prayer times as "HH:MM" strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerTimesData {
    pub imsak: String,
    pub gunes: String,
    pub ogle: String,
    pub ikindi: String,
    pub aksam: String,
    pub yatsi: String,
}

/// Cached prayer-time document keyed by (plate code, date)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrayerTimesDoc {
    /// Regional plate code, 1..=81
    pub plate_code: u8,

    /// "YYYY-MM-DD"
    pub date: String,

    pub times: PrayerTimesData,

    /// "mock" or "API"
    pub source: String,

    pub fetched_at: DateTime<Utc>,
}

impl PrayerTimesDoc {
    /// Document id used as the cache key
    pub fn document_id(plate_code: u8, date: &str) -> String {
        format!("{}_{}", plate_code, date)
    }

    /// First prayer of the day strictly after `now`, as (name, "HH:MM").
    /// When every prayer has passed, returns tomorrow's imsak.
    pub fn next_prayer(&self, now: NaiveTime) -> (&'static str, String) {
        let prayers = [
            ("imsak", &self.times.imsak),
            ("gunes", &self.times.gunes),
            ("ogle", &self.times.ogle),
            ("ikindi", &self.times.ikindi),
            ("aksam", &self.times.aksam),
            ("yatsi", &self.times.yatsi),
        ];

        for (name, time_str) in prayers {
            if let Ok(t) = NaiveTime::parse_from_str(time_str, "%H:%M") {
                if t > now {
                    return (name, time_str.clone());
                }
            }
        }

        ("imsak", self.times.imsak.clone())
    }
}

/// Istanbul (plate 34) baseline schedule used by the mock generator
const BASELINE: [(&str, &str); 6] = [
    ("imsak", "06:45"),
    ("gunes", "08:15"),
    ("ogle", "13:05"),
    ("ikindi", "15:35"),
    ("aksam", "17:50"),
    ("yatsi", "19:15"),
];

/// Deterministic offset-based mock: (plate - 34) * 2 minutes against the
/// Istanbul baseline, with minute overflow rolling into the hour and the
/// hour clamped to [0, 23].
pub fn generate_mock_times(plate_code: u8, date: &str) -> PrayerTimesDoc {
    let offset = (plate_code as i32 - 34) * 2;

    let adjusted: Vec<String> = BASELINE
        .iter()
        .map(|(_, base)| adjust_time(base, offset))
        .collect();

    PrayerTimesDoc {
        plate_code,
        date: date.to_string(),
        times: PrayerTimesData {
            imsak: adjusted[0].clone(),
            gunes: adjusted[1].clone(),
            ogle: adjusted[2].clone(),
            ikindi: adjusted[3].clone(),
            aksam: adjusted[4].clone(),
            yatsi: adjusted[5].clone(),
        },
        source: "mock".to_string(),
        fetched_at: Utc::now(),
    }
}

fn adjust_time(base: &str, offset_minutes: i32) -> String {
    let mut parts = base.split(':');
    let (Some(h), Some(m)) = (parts.next(), parts.next()) else {
        return base.to_string();
    };
    let (Ok(mut hour), Ok(minute)) = (h.parse::<i32>(), m.parse::<i32>()) else {
        return base.to_string();
    };

    let mut minute = minute + offset_minutes;
    if minute >= 60 {
        minute -= 60;
        hour += 1;
    } else if minute < 0 {
        minute += 60;
        hour -= 1;
    }
    hour = hour.clamp(0, 23);

    format!("{:02}:{:02}", hour, minute)
}

/// "YYYY-MM-DD" for a date, the cache-key format
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
