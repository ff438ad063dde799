//! Transcription/summarisation provider abstraction (§4.7, §9 design
//! note "Provider abstraction").
//!
//! Grounded on the small capability-trait + `create_provider(id)`
//! dispatcher pattern used for pluggable speech providers elsewhere in
//! the examined corpus: a narrow trait per capability, and a free
//! function that resolves a configured provider id to an instance.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{IngestError, IngestResult};

/// Result of transcribing one audio file.
#[derive(Debug, Clone)]
pub struct TranscriptionResult {
    pub text: String,
    pub confidence: Option<f64>,
    pub duration: Option<f64>,
    pub language: String,
    /// A short summary the transcription provider produced as a side
    /// effect (e.g. Deepgram's built-in summarisation add-on).
    pub provider_summary: Option<String>,
}

/// Capability to turn an audio file into text.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    fn id(&self) -> &'static str;
    async fn transcribe(&self, path: &Path, language: &str) -> IngestResult<TranscriptionResult>;
}

/// Hints available to a summarisation provider beyond the raw text.
#[derive(Debug, Clone, Default)]
pub struct SummaryHints {
    /// A short summary already produced by the transcription step, if any.
    pub provider_summary: Option<String>,
}

/// Result of summarising meeting (or per-participant) text.
#[derive(Debug, Clone)]
pub struct SummaryResult {
    pub source: &'static str,
    pub summary: String,
    pub key_points: Vec<String>,
    pub action_items: Vec<String>,
    pub decisions: Vec<String>,
    pub topics: Vec<String>,
}

/// Capability to turn transcript text into a structured summary.
#[async_trait]
pub trait SummarisationProvider: Send + Sync {
    fn id(&self) -> &'static str;
    async fn summarise(&self, text: &str, language: &str, hints: &SummaryHints) -> IngestResult<SummaryResult>;
}

// ─────────────────────────────────────────────────────────────────────────────
// OpenAI
// ─────────────────────────────────────────────────────────────────────────────

/// OpenAI-backed transcription (`/v1/audio/transcriptions`) and
/// summarisation (`/v1/chat/completions`).
pub struct OpenAiProvider {
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiTranscriptionResponse {
    text: String,
}

#[async_trait]
impl TranscriptionProvider for OpenAiProvider {
    fn id(&self) -> &'static str {
        "openai"
    }

    async fn transcribe(&self, path: &Path, language: &str) -> IngestResult<TranscriptionResult> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());

        let form = reqwest::multipart::Form::new()
            .text("model", "whisper-1")
            .text("language", language.to_string())
            .part("file", reqwest::multipart::Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| IngestError::ProviderFailure(format!("openai transcription request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(IngestError::ProviderFailure(format!(
                "openai transcription returned status {}",
                response.status()
            )));
        }

        let parsed: OpenAiTranscriptionResponse = response
            .json()
            .await
            .map_err(|e| IngestError::ProviderFailure(format!("openai response parse failed: {e}")))?;

        Ok(TranscriptionResult {
            text: parsed.text,
            confidence: None,
            duration: None,
            language: language.to_string(),
            provider_summary: None,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChatChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatChoice {
    message: OpenAiChatMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatMessage {
    content: String,
}

#[async_trait]
impl SummarisationProvider for OpenAiProvider {
    fn id(&self) -> &'static str {
        "openai"
    }

    async fn summarise(&self, text: &str, language: &str, _hints: &SummaryHints) -> IngestResult<SummaryResult> {
        let body = serde_json::json!({
            "model": "gpt-4o-mini",
            "messages": [
                {"role": "system", "content": format!("Summarise the following meeting transcript in {language}.")},
                {"role": "user", "content": text},
            ],
        });

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| IngestError::ProviderFailure(format!("openai summarisation request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(IngestError::ProviderFailure(format!(
                "openai summarisation returned status {}",
                response.status()
            )));
        }

        let parsed: OpenAiChatResponse = response
            .json()
            .await
            .map_err(|e| IngestError::ProviderFailure(format!("openai chat response parse failed: {e}")))?;

        let summary = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| IngestError::ProviderFailure("openai returned no choices".to_string()))?;

        Ok(SummaryResult {
            source: "openai",
            summary,
            key_points: Vec::new(),
            action_items: Vec::new(),
            decisions: Vec::new(),
            topics: Vec::new(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Deepgram
// ─────────────────────────────────────────────────────────────────────────────

/// Deepgram-backed transcription via the prerecorded audio endpoint,
/// with Deepgram's own summarisation add-on surfaced as `provider_summary`.
pub struct DeepgramProvider {
    api_key: String,
    client: reqwest::Client,
}

impl DeepgramProvider {
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DeepgramResponse {
    results: DeepgramResults,
}

#[derive(Debug, Deserialize)]
struct DeepgramResults {
    channels: Vec<DeepgramChannel>,
    #[serde(default)]
    summary: Option<DeepgramSummary>,
}

#[derive(Debug, Deserialize)]
struct DeepgramSummary {
    short: String,
}

#[derive(Debug, Deserialize)]
struct DeepgramChannel {
    alternatives: Vec<DeepgramAlternative>,
}

#[derive(Debug, Deserialize)]
struct DeepgramAlternative {
    transcript: String,
    confidence: Option<f64>,
}

#[async_trait]
impl TranscriptionProvider for DeepgramProvider {
    fn id(&self) -> &'static str {
        "deepgram"
    }

    async fn transcribe(&self, path: &Path, language: &str) -> IngestResult<TranscriptionResult> {
        let bytes = tokio::fs::read(path).await?;
        let url = format!("https://api.deepgram.com/v1/listen?language={language}&summarize=v2");

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "audio/wav")
            .body(bytes)
            .send()
            .await
            .map_err(|e| IngestError::ProviderFailure(format!("deepgram request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(IngestError::ProviderFailure(format!(
                "deepgram returned status {}",
                response.status()
            )));
        }

        let parsed: DeepgramResponse = response
            .json()
            .await
            .map_err(|e| IngestError::ProviderFailure(format!("deepgram response parse failed: {e}")))?;

        let channel = parsed
            .results
            .channels
            .into_iter()
            .next()
            .ok_or_else(|| IngestError::ProviderFailure("deepgram returned no channels".to_string()))?;
        let alt = channel
            .alternatives
            .into_iter()
            .next()
            .ok_or_else(|| IngestError::ProviderFailure("deepgram returned no alternatives".to_string()))?;

        Ok(TranscriptionResult {
            text: alt.transcript,
            confidence: alt.confidence,
            duration: None,
            language: language.to_string(),
            provider_summary: parsed.results.summary.map(|s| s.short),
        })
    }
}

/// Resolves a configured provider id to a transcription provider
/// instance. `pho-whisper` and unrecognised ids are not implemented
/// locally and resolve to `None`, letting the chain fall through.
#[must_use]
pub fn create_transcription_provider(id: &str, api_key: Option<&str>) -> Option<Arc<dyn TranscriptionProvider>> {
    match id {
        "openai" => api_key.map(|key| Arc::new(OpenAiProvider::new(key.to_string())) as Arc<dyn TranscriptionProvider>),
        "deepgram" => api_key.map(|key| Arc::new(DeepgramProvider::new(key.to_string())) as Arc<dyn TranscriptionProvider>),
        _ => None,
    }
}

/// Resolves a configured provider id to a summarisation provider
/// instance. Only `openai` has a real remote summariser here; `custom`
/// is handled separately by [`crate::custom_summary`].
#[must_use]
pub fn create_summarisation_provider(id: &str, api_key: Option<&str>) -> Option<Arc<dyn SummarisationProvider>> {
    match id {
        "openai" => api_key.map(|key| Arc::new(OpenAiProvider::new(key.to_string())) as Arc<dyn SummarisationProvider>),
        _ => None,
    }
}

/// An ordered list of providers to try in sequence, falling back to the
/// next on failure (§9 "chain-of-responsibility").
pub struct ProviderChain {
    transcription: Vec<Arc<dyn TranscriptionProvider>>,
    summarisation: Vec<Arc<dyn SummarisationProvider>>,
}

impl ProviderChain {
    #[must_use]
    pub fn new(
        transcription: Vec<Arc<dyn TranscriptionProvider>>,
        summarisation: Vec<Arc<dyn SummarisationProvider>>,
    ) -> Self {
        Self {
            transcription,
            summarisation,
        }
    }

    /// Tries each transcription provider in order, returning the first
    /// success. Each failure is logged; `None` means every provider
    /// failed (or none were configured).
    pub async fn transcribe(&self, path: &Path, language: &str) -> Option<TranscriptionResult> {
        for provider in &self.transcription {
            match provider.transcribe(path, language).await {
                Ok(result) => return Some(result),
                Err(e) => log::warn!(
                    "transcription provider {} failed for {}: {}",
                    provider.id(),
                    path.display(),
                    e
                ),
            }
        }
        None
    }

    /// Tries each configured summarisation provider in order.
    pub async fn summarise(&self, text: &str, language: &str, hints: &SummaryHints) -> Option<SummaryResult> {
        for provider in &self.summarisation {
            match provider.summarise(text, language, hints).await {
                Ok(result) => return Some(result),
                Err(e) => log::warn!("summarisation provider {} failed: {}", provider.id(), e),
            }
        }
        None
    }
}

/// A transcription provider that always fails; used where no provider
/// is configured but the chain interface still needs an instance (and
/// in tests for the null-provider path of the pipeline).
pub struct NullTranscriptionProvider;

#[async_trait]
impl TranscriptionProvider for NullTranscriptionProvider {
    fn id(&self) -> &'static str {
        "null"
    }

    async fn transcribe(&self, _path: &Path, _language: &str) -> IngestResult<TranscriptionResult> {
        Err(IngestError::ProviderFailure("no transcription provider configured".to_string()))
    }
}

/// A summarisation provider that always fails; exercises the custom
/// extractive fallback path in tests.
pub struct NullSummarisationProvider;

#[async_trait]
impl SummarisationProvider for NullSummarisationProvider {
    fn id(&self) -> &'static str {
        "null"
    }

    async fn summarise(&self, _text: &str, _language: &str, _hints: &SummaryHints) -> IngestResult<SummaryResult> {
        Err(IngestError::ProviderFailure("no summarisation provider configured".to_string()))
    }
}
