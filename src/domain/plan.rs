//! Subscription plans and the limits they grant.
//!
//! The plan is the single source of truth for every gating threshold; call
//! sites never hard-code a limit.

use serde::{Deserialize, Serialize};

/// Subscription tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    Free,
    Starter,
    Pro,
}

impl Default for SubscriptionPlan {
    fn default() -> Self {
        Self::Free
    }
}

/// Which window a plan's voice-note limit applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceNoteWindow {
    Weekly,
    Monthly,
}

impl SubscriptionPlan {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Free => "Ücretsiz",
            Self::Starter => "Basic",
            Self::Pro => "Pro",
        }
    }

    /// AI questions allowed per day. Pro's limit is set high enough to be
    /// effectively unlimited rather than special-cased.
    pub fn daily_ai_questions_limit(self) -> u32 {
        match self {
            Self::Free => 3,
            Self::Starter => 20,
            Self::Pro => 1000,
        }
    }

    /// Voice notes allowed per window; `None` means unlimited
    pub fn voice_note_limit(self) -> Option<u32> {
        match self {
            Self::Free => Some(1),
            Self::Starter => Some(15),
            Self::Pro => None,
        }
    }

    /// Which rolling window the voice-note limit counts against
    pub fn voice_note_window(self) -> VoiceNoteWindow {
        match self {
            Self::Free => VoiceNoteWindow::Weekly,
            Self::Starter | Self::Pro => VoiceNoteWindow::Monthly,
        }
    }

    /// Max single-recording duration in seconds; `None` means unlimited
    pub fn max_recording_duration_sec(self) -> Option<u32> {
        match self {
            Self::Free => Some(60),
            Self::Starter => Some(300),
            Self::Pro => None,
        }
    }

    pub fn has_transcript_search(self) -> bool {
        self != Self::Free
    }

    pub fn has_prayer_notifications(self) -> bool {
        self == Self::Pro
    }

    pub fn has_family_sharing(self) -> bool {
        self == Self::Pro
    }
}

/// User action that may trigger an upsell prompt when denied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsellTrigger {
    Recording,
    AiProcessing,
    Search,
    Notifications,
    Manual,
}

impl UpsellTrigger {
    pub fn title(self) -> &'static str {
        match self {
            Self::Recording => "Kayıt Limitine Ulaştın",
            Self::AiProcessing => "Soru Limitine Ulaştın",
            Self::Search | Self::Notifications => "Pro Özelliği",
            Self::Manual => "Premium'a Geç",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Recording => {
                "Ücretsiz kullanım hakkın doldu. Daha fazla kayıt için Premium'a geçebilirsin."
            }
            Self::AiProcessing => "Günlük soru limitine ulaştın. Sınırsız sohbet için Pro'ya geç!",
            Self::Search => "Arama özelliği Pro aboneliğe özeldir.",
            Self::Notifications => "Bildirimler Pro aboneliğe özeldir.",
            Self::Manual => "Vaazlarını kaydet, özetle ve arşivle.",
        }
    }
}
