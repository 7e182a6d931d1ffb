//! Bounded continuation loop.
//!
//! A length-capped, newline-stopped generation can end mid-sentence. When it
//! does, the fragment is fed back as a new user turn and the model is asked
//! again, up to `max_attempts` calls in total. Whatever has been assembled is
//! returned once the ceiling is hit, flagged as incomplete.

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::llm_client::{ChatMessage, GenerationRequest, LlmError, TextGenerator};
use crate::summary::prompts::{RESUME_SUMMARY_SYSTEM, STOP_SEQUENCE, TERMINAL_PUNCTUATION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummarySettings {
    /// Maximum number of generation calls per summary. Always at least 1.
    pub max_attempts: u32,
    pub max_tokens: u32,
}

impl SummarySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.summary_max_attempts.max(1),
            max_tokens: config.summary_max_tokens,
        }
    }
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            max_tokens: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// All fragments concatenated in the order they were generated.
    pub text: String,
    /// Number of generation calls made.
    pub attempts: u32,
    /// `false` when the ceiling was reached without terminal punctuation.
    pub complete: bool,
}

/// True when the last non-whitespace character ends a sentence.
pub fn ends_sentence(fragment: &str) -> bool {
    fragment.trim_end().ends_with(TERMINAL_PUNCTUATION)
}

/// Summarizes extracted resume text. A generation error aborts the loop.
pub async fn summarize(
    generator: &dyn TextGenerator,
    resume_text: &str,
    settings: &SummarySettings,
) -> Result<Summary, LlmError> {
    let max_attempts = settings.max_attempts.max(1);
    let mut request = GenerationRequest {
        messages: vec![
            ChatMessage::system(RESUME_SUMMARY_SYSTEM),
            ChatMessage::user(resume_text),
        ],
        max_tokens: settings.max_tokens,
        stop: vec![STOP_SEQUENCE.to_string()],
    };

    let mut text = String::new();
    let mut attempts = 0;

    while attempts < max_attempts {
        attempts += 1;
        let fragment = generator.generate(&request).await?;
        debug!(
            "Summary attempt {attempts}/{max_attempts} returned {} chars",
            fragment.len()
        );

        text.push_str(&fragment);

        if ends_sentence(&fragment) {
            info!("Summary complete after {attempts} attempt(s)");
            return Ok(Summary {
                text,
                attempts,
                complete: true,
            });
        }

        if !fragment.is_empty() {
            request.messages.push(ChatMessage::user(fragment));
        }
    }

    warn!("Summary still unfinished after {attempts} attempts; returning partial text");
    Ok(Summary {
        text,
        attempts,
        complete: false,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::llm_client::Role;

    /// Replays scripted fragments; once the script runs out the last one repeats.
    pub(crate) struct ScriptedGenerator {
        script: Mutex<VecDeque<String>>,
        last: Mutex<String>,
        pub(crate) requests: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedGenerator {
        pub(crate) fn new(fragments: &[&str]) -> Self {
            Self {
                script: Mutex::new(fragments.iter().map(|f| f.to_string()).collect()),
                last: Mutex::new(String::new()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
            self.requests.lock().unwrap().push(request.clone());
            let mut last = self.last.lock().unwrap();
            if let Some(next) = self.script.lock().unwrap().pop_front() {
                *last = next;
            }
            Ok(last.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, LlmError> {
            Err(LlmError::Api {
                status: 503,
                message: "unavailable".to_string(),
            })
        }
    }

    fn settings(max_attempts: u32) -> SummarySettings {
        SummarySettings {
            max_attempts,
            max_tokens: 200,
        }
    }

    #[test]
    fn test_ends_sentence() {
        assert!(ends_sentence("Done."));
        assert!(ends_sentence("Really!"));
        assert!(ends_sentence("Is it?  \n"));
        assert!(!ends_sentence("Part one"));
        assert!(!ends_sentence("skills: Rust,"));
        assert!(!ends_sentence(""));
        assert!(!ends_sentence("   "));
    }

    #[tokio::test]
    async fn test_complete_first_fragment_makes_one_call() {
        let generator = ScriptedGenerator::new(&["Jane holds a PhD in Chemistry."]);
        let summary = summarize(&generator, "resume", &settings(3)).await.unwrap();

        assert_eq!(generator.calls(), 1);
        assert_eq!(summary.text, "Jane holds a PhD in Chemistry.");
        assert_eq!(summary.attempts, 1);
        assert!(summary.complete);
    }

    #[tokio::test]
    async fn test_non_terminal_fragments_stop_at_attempt_ceiling() {
        let generator = ScriptedGenerator::new(&["more"]);
        let summary = summarize(&generator, "resume", &settings(4)).await.unwrap();

        assert_eq!(generator.calls(), 4);
        assert_eq!(summary.text, "moremoremoremore");
        assert_eq!(summary.attempts, 4);
        assert!(!summary.complete);
    }

    #[tokio::test]
    async fn test_two_fragments_are_concatenated() {
        let generator = ScriptedGenerator::new(&["Part one", "Part two."]);
        let summary = summarize(&generator, "resume", &settings(3)).await.unwrap();

        assert_eq!(generator.calls(), 2);
        assert_eq!(summary.text, "Part onePart two.");
        assert!(summary.complete);
    }

    #[tokio::test]
    async fn test_conversation_is_seeded_and_grows_with_fragments() {
        let generator = ScriptedGenerator::new(&["Part one", "Part two."]);
        summarize(&generator, "RESUME BODY", &settings(3))
            .await
            .unwrap();

        let requests = generator.requests.lock().unwrap();
        let first = &requests[0];
        assert_eq!(first.messages.len(), 2);
        assert_eq!(first.messages[0].role, Role::System);
        assert_eq!(first.messages[0].content, RESUME_SUMMARY_SYSTEM);
        assert_eq!(first.messages[1], ChatMessage::user("RESUME BODY"));
        assert_eq!(first.stop, vec!["\n".to_string()]);
        assert_eq!(first.max_tokens, 200);

        let second = &requests[1];
        assert_eq!(second.messages.len(), 3);
        assert_eq!(second.messages[2], ChatMessage::user("Part one"));
    }

    #[tokio::test]
    async fn test_empty_fragment_counts_but_is_not_appended() {
        let generator = ScriptedGenerator::new(&["", "Finished."]);
        let summary = summarize(&generator, "resume", &settings(3)).await.unwrap();

        assert_eq!(summary.text, "Finished.");
        assert_eq!(summary.attempts, 2);
        let requests = generator.requests.lock().unwrap();
        assert_eq!(requests[1].messages.len(), 2);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_makes_one_call() {
        let generator = ScriptedGenerator::new(&["Short."]);
        let summary = summarize(&generator, "resume", &settings(0)).await.unwrap();
        assert_eq!(generator.calls(), 1);
        assert!(summary.complete);
    }

    #[tokio::test]
    async fn test_generation_error_propagates() {
        let err = summarize(&FailingGenerator, "resume", &settings(3))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 503, .. }));
    }
}
