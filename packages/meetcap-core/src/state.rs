//! Core application configuration.
//!
//! Provides [`Config`], the deployment-environment-agnostic settings table
//! (§6). A thin YAML/env-overlay layer built on top of this lives in the
//! server binary; this type only knows about defaults and validation.

use serde::{Deserialize, Serialize};

use crate::error::{IngestError, IngestResult};
use crate::protocol_constants::{
    DEFAULT_INACTIVITY_TIMEOUT_SECS, DEFAULT_PORT, PENDING_BUFFER_FALLBACK_SAMPLE_RATE,
    PENDING_BUFFER_MAX_SECONDS,
};

/// Deployment environment; affects only which defaults apply.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Default for Environment {
    fn default() -> Self {
        Self::Development
    }
}

/// Which summarisation provider to prefer, or `Auto` for the fallback
/// chain described in §4.7 (configured provider, then reused
/// transcription-side summary, then the local extractive summariser).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SummarisationProviderKind {
    Openai,
    Deepgram,
    PhoWhisper,
    Auto,
}

impl Default for SummarisationProviderKind {
    fn default() -> Self {
        Self::Auto
    }
}

/// Configuration for the meeting ingestion service (§6).
///
/// All fields have sensible defaults so a bare `Config::default()` is
/// enough to run the ingest path against a local directory.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Deployment environment; only affects defaults, never behaviour.
    #[serde(default)]
    pub env: Environment,

    /// TCP port the acceptor listens on.
    pub port: u16,

    /// Root directory holding `live/` and `completed/` (§4.6).
    pub recordings_root: String,

    /// Whether sessions write a mixed-channel audio container.
    pub enable_mixed_audio: bool,

    /// Whether sessions write per-participant audio containers.
    pub enable_per_participant_audio: bool,

    /// Reserved: video frames are always counted, never written to disk
    /// regardless of this flag (§4.4 Non-goals).
    pub enable_video_capture: bool,

    /// Which summarisation provider the post-archive pipeline prefers.
    #[serde(default)]
    pub summarisation_provider: SummarisationProviderKind,

    /// BCP-47-ish language hint passed to providers and used to decide
    /// whether a transcription provider's own summary can be reused.
    pub summarisation_language: String,

    /// API key used by the configured transcription provider, if any.
    pub transcription_api_key: Option<String>,

    /// API key used by the configured summarisation provider, if any.
    pub summarisation_api_key: Option<String>,

    /// Seconds of inactivity (no frames received) before a session is
    /// closed with reason `inactivity_timeout` (§4.5).
    pub inactivity_timeout_secs: u64,

    /// Cap, in bytes, on audio buffered per source before a valid
    /// `AudioFormat` has arrived (§6 `pendingBufferMaxBytes`).
    pub pending_buffer_max_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            env: Environment::default(),
            port: DEFAULT_PORT,
            recordings_root: "./recordings".to_string(),
            enable_mixed_audio: true,
            enable_per_participant_audio: true,
            enable_video_capture: false,
            summarisation_provider: SummarisationProviderKind::default(),
            summarisation_language: "en".to_string(),
            transcription_api_key: None,
            summarisation_api_key: None,
            inactivity_timeout_secs: DEFAULT_INACTIVITY_TIMEOUT_SECS,
            pending_buffer_max_bytes: (PENDING_BUFFER_MAX_SECONDS as usize)
                * (PENDING_BUFFER_FALLBACK_SAMPLE_RATE as usize)
                * 4,
        }
    }
}

impl Config {
    /// Validates the configuration, returning a
    /// [`IngestError::Configuration`] describing the first problem found.
    pub fn validate(&self) -> IngestResult<()> {
        if self.port == 0 {
            return Err(IngestError::Configuration(
                "port must be nonzero".to_string(),
            ));
        }
        if self.recordings_root.trim().is_empty() {
            return Err(IngestError::Configuration(
                "recordingsRoot must not be empty".to_string(),
            ));
        }
        if self.inactivity_timeout_secs == 0 {
            return Err(IngestError::Configuration(
                "inactivityTimeoutSecs must be >= 1".to_string(),
            ));
        }
        if self.pending_buffer_max_bytes == 0 {
            return Err(IngestError::Configuration(
                "pendingBufferMaxBytes must be >= 1".to_string(),
            ));
        }
        if self.summarisation_language.trim().is_empty() {
            return Err(IngestError::Configuration(
                "summarisationLanguage must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
