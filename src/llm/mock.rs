//! Mock generation backend for tests and development without a running
//! model server.

use crate::error::Result;
use crate::llm::client::GenerationBackend;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Deterministic [`GenerationBackend`] returning canned responses.
///
/// Failures are simulated as empty responses, the same transient class the
/// commentary client retries on.
#[derive(Clone)]
pub struct MockBackend {
    response: String,
    failures_before_success: Arc<AtomicU32>,
    always_fail: bool,
    calls: Arc<AtomicU32>,
}

impl MockBackend {
    /// Always succeeds with `response`.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            failures_before_success: Arc::new(AtomicU32::new(0)),
            always_fail: false,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Never produces usable text.
    pub fn failing() -> Self {
        Self {
            response: String::new(),
            failures_before_success: Arc::new(AtomicU32::new(0)),
            always_fail: true,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Fails the first `failures` calls, then succeeds with `response`.
    pub fn flaky(failures: u32, response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            failures_before_success: Arc::new(AtomicU32::new(failures)),
            always_fail: false,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Total generation calls observed across clones.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    async fn generate(&self, _model: &str, _prompt: &str, _temperature: f32) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.always_fail {
            return Ok(String::new());
        }

        let remaining = self.failures_before_success.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_before_success
                .store(remaining - 1, Ordering::SeqCst);
            return Ok(String::new());
        }

        Ok(self.response.clone())
    }
}
