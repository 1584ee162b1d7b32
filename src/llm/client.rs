use crate::error::Result;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Seam between the pipeline and a text-generation service.
///
/// The only network-like boundary in the core: a request is a model
/// identifier, a prompt, and generation parameters; a response is raw text
/// or an error.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str, temperature: f32) -> Result<String>;
}

/// HTTP backend for a locally hosted Ollama service.
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
}

impl OllamaBackend {
    /// `timeout` bounds each generation call so one stalled section cannot
    /// stall the run indefinitely.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn host(&self) -> &str {
        &self.base_url
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    options: GenerateOptions,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    async fn generate(&self, model: &str, prompt: &str, temperature: f32) -> Result<String> {
        let request = GenerateRequest {
            model,
            prompt,
            options: GenerateOptions { temperature },
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body: GenerateResponse = response.json().await?;
        debug!("Generation response: {} bytes", body.response.len());

        Ok(body.response)
    }
}
