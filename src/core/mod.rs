//! Core orchestration logic: the transcription pipeline and its status
//! state machine, the chat orchestrator, the prayer-time resolver, and the
//! entitlement gate.

pub mod chat;
pub mod entitlement;
pub mod pipeline;
pub mod prayer;

pub use chat::{ChatOrchestrator, ChatReply};
pub use entitlement::EntitlementGate;
pub use pipeline::TranscriptionPipeline;
pub use prayer::PrayerTimeResolver;

/// Strip markdown code-fence markers the model sometimes wraps around its
/// JSON output.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  plain text  "), "plain text");
    }
}
