//! Rolling usage counters checked against plan limits.
//!
//! Counters reset lazily: every read path calls `reset_if_needed` first, so
//! there is no background timer and a counter resets exactly once per period
//! boundary crossing.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Per-user consumption counters over rolling daily/weekly/monthly windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuota {
    pub ai_questions_today: u32,
    pub voice_notes_this_week: u32,
    pub voice_notes_this_month: u32,
    pub last_daily_reset: DateTime<Utc>,
    pub last_weekly_reset: DateTime<Utc>,
    pub last_monthly_reset: DateTime<Utc>,
}

impl UserQuota {
    /// Fresh quota with all counters at zero
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            ai_questions_today: 0,
            voice_notes_this_week: 0,
            voice_notes_this_month: 0,
            last_daily_reset: now,
            last_weekly_reset: now,
            last_monthly_reset: now,
        }
    }

    /// Reset any counter whose period boundary has been crossed since its
    /// last reset. Each counter family rolls over independently. Calling
    /// this twice with the same `now` is a no-op the second time.
    pub fn reset_if_needed(&mut self, now: DateTime<Utc>) {
        if !same_day(self.last_daily_reset, now) {
            self.ai_questions_today = 0;
            self.last_daily_reset = now;
        }

        if !same_iso_week(self.last_weekly_reset, now) {
            self.voice_notes_this_week = 0;
            self.last_weekly_reset = now;
        }

        if !same_month(self.last_monthly_reset, now) {
            self.voice_notes_this_month = 0;
            self.last_monthly_reset = now;
        }
    }
}

fn same_day(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.date_naive() == b.date_naive()
}

fn same_iso_week(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    let (wa, wb) = (a.iso_week(), b.iso_week());
    wa.year() == wb.year() && wa.week() == wb.week()
}

fn same_month(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.year() == b.year() && a.month() == b.month()
}
