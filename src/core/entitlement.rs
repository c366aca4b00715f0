//! Entitlement gate: can/cannot decisions against plan limits, plus upsell
//! trigger selection.
//!
//! Reads are not pure: a gating check may lazily reset expired counters and
//! persist the reset. Gating never blocks on plan refresh; the profile's
//! stored plan is taken as-is.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::Utc;
use tracing::{info, instrument};

use crate::domain::{SubscriptionPlan, UpsellTrigger, UserQuota, VoiceNoteWindow};
use crate::store::QuotaStore;

pub struct EntitlementGate {
    quotas: Arc<QuotaStore>,
    last_trigger: Mutex<Option<UpsellTrigger>>,
}

impl EntitlementGate {
    pub fn new(quotas: Arc<QuotaStore>) -> Self {
        Self {
            quotas,
            last_trigger: Mutex::new(None),
        }
    }

    /// Load the user's counters with any expired windows reset. The reset is
    /// persisted immediately so a later crash cannot replay stale usage.
    async fn fresh_quota(&self, uid: &str) -> Result<UserQuota> {
        let mut quota = self.quotas.load(uid).await?;
        let before = quota.clone();

        quota.reset_if_needed(Utc::now());
        if quota != before {
            self.quotas.save(uid, &quota).await?;
        }

        Ok(quota)
    }

    /// Whether the user may start a new voice recording under their plan's
    /// window limit.
    pub async fn can_record(&self, uid: &str, plan: SubscriptionPlan) -> Result<bool> {
        let Some(limit) = plan.voice_note_limit() else {
            return Ok(true);
        };

        let quota = self.fresh_quota(uid).await?;
        let used = match plan.voice_note_window() {
            VoiceNoteWindow::Weekly => quota.voice_notes_this_week,
            VoiceNoteWindow::Monthly => quota.voice_notes_this_month,
        };

        Ok(used < limit)
    }

    /// Whether the user may ask another AI question today.
    pub async fn can_ask_ai(&self, uid: &str, plan: SubscriptionPlan) -> Result<bool> {
        let quota = self.fresh_quota(uid).await?;
        Ok(quota.ai_questions_today < plan.daily_ai_questions_limit())
    }

    /// Voice notes remaining in the current window; `None` means unlimited.
    pub async fn remaining_recordings(
        &self,
        uid: &str,
        plan: SubscriptionPlan,
    ) -> Result<Option<u32>> {
        let Some(limit) = plan.voice_note_limit() else {
            return Ok(None);
        };

        let quota = self.fresh_quota(uid).await?;
        let used = match plan.voice_note_window() {
            VoiceNoteWindow::Weekly => quota.voice_notes_this_week,
            VoiceNoteWindow::Monthly => quota.voice_notes_this_month,
        };

        Ok(Some(limit.saturating_sub(used)))
    }

    /// AI questions remaining today.
    pub async fn remaining_ai_questions(
        &self,
        uid: &str,
        plan: SubscriptionPlan,
    ) -> Result<u32> {
        let quota = self.fresh_quota(uid).await?;
        Ok(plan
            .daily_ai_questions_limit()
            .saturating_sub(quota.ai_questions_today))
    }

    /// Record one consumed voice recording. Both window counters advance so
    /// a plan change mid-window still sees accurate usage.
    #[instrument(skip(self))]
    pub async fn use_recording(&self, uid: &str) -> Result<()> {
        let mut quota = self.fresh_quota(uid).await?;
        quota.voice_notes_this_week += 1;
        quota.voice_notes_this_month += 1;
        self.quotas.save(uid, &quota).await?;

        info!(
            week = quota.voice_notes_this_week,
            month = quota.voice_notes_this_month,
            "Recording quota consumed"
        );
        Ok(())
    }

    /// Record one consumed AI question.
    #[instrument(skip(self))]
    pub async fn use_ai_question(&self, uid: &str) -> Result<()> {
        let mut quota = self.fresh_quota(uid).await?;
        quota.ai_questions_today += 1;
        self.quotas.save(uid, &quota).await?;

        info!(today = quota.ai_questions_today, "AI question quota consumed");
        Ok(())
    }

    /// Decide whether `action` should surface an upsell prompt for this user
    /// and, if so, which one. The chosen trigger is also remembered so the
    /// presentation layer can read it back.
    pub async fn trigger_upsell_if_needed(
        &self,
        action: UpsellTrigger,
        uid: &str,
        plan: SubscriptionPlan,
    ) -> Result<Option<UpsellTrigger>> {
        let fire = match action {
            UpsellTrigger::Recording => !self.can_record(uid, plan).await?,
            UpsellTrigger::AiProcessing => !self.can_ask_ai(uid, plan).await?,
            // Feature upsells target free users only; paid tiers are never
            // prompted here even when the feature itself is pro-gated
            UpsellTrigger::Search | UpsellTrigger::Notifications => {
                plan == SubscriptionPlan::Free
            }
            UpsellTrigger::Manual => true,
        };

        if fire {
            if let Ok(mut last) = self.last_trigger.lock() {
                *last = Some(action);
            }
            info!(?action, "Upsell triggered");
            Ok(Some(action))
        } else {
            Ok(None)
        }
    }

    /// The most recent trigger surfaced by `trigger_upsell_if_needed`.
    pub fn last_trigger(&self) -> Option<UpsellTrigger> {
        self.last_trigger.lock().ok().and_then(|t| *t)
    }
}
