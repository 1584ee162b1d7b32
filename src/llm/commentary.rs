//! Commentary generation with retry and response cleanup.
//!
//! The client never propagates a generation failure: after the configured
//! retries are exhausted it returns a `Failed` result with empty text and
//! leaves the fate of the section to the orchestrator.

use crate::error::Result;
use crate::llm::client::GenerationBackend;
use crate::llm::prompts::Prompt;
use crate::schema::SectionRole;
use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum CommentaryStatus {
    Ok,
    /// Cleanup could not fully remove reasoning markers from the response.
    Degraded,
    Failed,
}

/// The model's cleaned response for one prompt, with a quality status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentaryResult {
    pub aggregate: String,
    pub role: SectionRole,
    pub text: String,
    pub status: CommentaryStatus,
}

impl CommentaryResult {
    /// Placeholder result for a section whose generation failed outright.
    pub fn failed(aggregate: impl Into<String>, role: SectionRole) -> Self {
        Self {
            aggregate: aggregate.into(),
            role,
            text: String::new(),
            status: CommentaryStatus::Failed,
        }
    }
}

/// Sends prompts to a generation backend and post-processes the responses.
pub struct CommentaryClient<B: GenerationBackend> {
    backend: B,
    model: String,
    temperature: f32,
    retries: u32,
    thinking_markers: Vec<(String, String)>,
}

impl<B: GenerationBackend> CommentaryClient<B> {
    pub fn new(
        backend: B,
        model: impl Into<String>,
        temperature: f32,
        retries: u32,
        thinking_markers: Vec<(String, String)>,
    ) -> Self {
        Self {
            backend,
            model: model.into(),
            temperature,
            retries,
            thinking_markers,
        }
    }

    /// Obtains commentary for one prompt. Transient failures (transport
    /// error, timeout, empty response) are retried immediately up to the
    /// configured count; exhaustion yields a `Failed` result, never an error.
    pub async fn comment(&self, prompt: &Prompt) -> CommentaryResult {
        let attempts = self.retries + 1;

        for attempt in 1..=attempts {
            match self.attempt(prompt).await {
                Ok(raw) if !raw.trim().is_empty() => {
                    let (text, clean) = strip_markers(&raw, &self.thinking_markers);
                    // A response that was nothing but reasoning markers is as
                    // useless as an empty one; retry it the same way.
                    if text.is_empty() {
                        warn!(
                            "Response for '{}' stripped to nothing (attempt {}/{})",
                            prompt.aggregate, attempt, attempts
                        );
                        continue;
                    }
                    let status = if clean {
                        CommentaryStatus::Ok
                    } else {
                        warn!(
                            "Commentary for '{}' still contains reasoning markers after cleanup",
                            prompt.aggregate
                        );
                        CommentaryStatus::Degraded
                    };
                    return CommentaryResult {
                        aggregate: prompt.aggregate.clone(),
                        role: prompt.role,
                        text,
                        status,
                    };
                }
                Ok(_) => {
                    warn!(
                        "Empty response for '{}' (attempt {}/{})",
                        prompt.aggregate, attempt, attempts
                    );
                }
                Err(e) => {
                    warn!(
                        "Generation failed for '{}' (attempt {}/{}): {}",
                        prompt.aggregate, attempt, attempts, e
                    );
                }
            }
        }

        CommentaryResult::failed(prompt.aggregate.clone(), prompt.role)
    }

    async fn attempt(&self, prompt: &Prompt) -> Result<String> {
        self.backend
            .generate(&self.model, &prompt.text, self.temperature)
            .await
    }
}

/// Removes balanced (open, close) marker pairs from the response. Returns the
/// cleaned text and whether cleanup was complete; a leftover unmatched marker
/// means the result should be tagged degraded.
pub fn strip_markers(raw: &str, markers: &[(String, String)]) -> (String, bool) {
    let mut text = raw.to_string();

    for (open, close) in markers {
        loop {
            let Some(start) = text.find(open.as_str()) else {
                break;
            };
            let Some(rel) = text[start + open.len()..].find(close.as_str()) else {
                break;
            };
            let end = start + open.len() + rel + close.len();
            text.replace_range(start..end, "");
        }
    }

    let clean = !markers
        .iter()
        .any(|(open, close)| text.contains(open.as_str()) || text.contains(close.as_str()));

    (text.trim().to_string(), clean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockBackend;
    use crate::schema::default_thinking_markers;

    fn prompt() -> Prompt {
        Prompt {
            aggregate: "total_by_category".to_string(),
            role: SectionRole::CategoryBreakdown,
            text: "analyze this".to_string(),
        }
    }

    fn client(backend: MockBackend, retries: u32) -> CommentaryClient<MockBackend> {
        CommentaryClient::new(backend, "test-model", 0.1, retries, default_thinking_markers())
    }

    #[test]
    fn test_strip_balanced_markers() {
        let markers = default_thinking_markers();
        let (text, clean) =
            strip_markers("<think>chain of thought</think>Category A leads.", &markers);
        assert_eq!(text, "Category A leads.");
        assert!(clean);
    }

    #[test]
    fn test_strip_multiple_blocks() {
        let markers = default_thinking_markers();
        let raw = "<think>one</think>First.<think>two</think> Second.";
        let (text, clean) = strip_markers(raw, &markers);
        assert_eq!(text, "First. Second.");
        assert!(clean);
    }

    #[test]
    fn test_unmatched_marker_is_degraded() {
        let markers = default_thinking_markers();
        let (text, clean) = strip_markers("<think>never closed... Category A leads.", &markers);
        assert!(!clean);
        assert!(text.contains("<think>"));
    }

    #[tokio::test]
    async fn test_success_returns_ok_status() {
        let client = client(MockBackend::new("Category A leads."), 2);
        let result = client.comment(&prompt()).await;
        assert_eq!(result.status, CommentaryStatus::Ok);
        assert_eq!(result.text, "Category A leads.");
        assert_eq!(result.aggregate, "total_by_category");
    }

    #[tokio::test]
    async fn test_degraded_response_keeps_partial_text() {
        let client = client(MockBackend::new("<THINKING>half done. Category A leads."), 0);
        let result = client.comment(&prompt()).await;
        assert_eq!(result.status, CommentaryStatus::Degraded);
        assert!(result.text.contains("Category A leads."));
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failure() {
        let backend = MockBackend::flaky(2, "Recovered analysis.");
        let client = client(backend.clone(), 2);
        let result = client.comment(&prompt()).await;
        assert_eq!(result.status, CommentaryStatus::Ok);
        assert_eq!(result.text, "Recovered analysis.");
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test]
    async fn test_response_that_strips_to_nothing_is_retried_then_failed() {
        let backend = MockBackend::new("<think>nothing but reasoning</think>");
        let client = client(backend.clone(), 2);
        let result = client.comment(&prompt()).await;
        assert_eq!(result.status, CommentaryStatus::Failed);
        assert!(result.text.is_empty());
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_yield_failed_result() {
        let backend = MockBackend::failing();
        let client = client(backend.clone(), 2);
        let result = client.comment(&prompt()).await;
        assert_eq!(result.status, CommentaryStatus::Failed);
        assert!(result.text.is_empty());
        // Initial attempt plus two retries.
        assert_eq!(backend.calls(), 3);
    }
}
