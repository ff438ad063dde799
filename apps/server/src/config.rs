//! Server configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Server configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to bind the WebSocket ingestion server to.
    /// Override: `MEETCAP_PORT`
    pub port: u16,

    /// Root directory holding `live/` and `completed/`.
    /// Override: `MEETCAP_RECORDINGS_ROOT`
    pub recordings_root: PathBuf,

    /// Whether sessions write a mixed-channel audio container.
    pub enable_mixed_audio: bool,

    /// Whether sessions write per-participant audio containers.
    pub enable_per_participant_audio: bool,

    /// Reserved for future use; video is always counted, never written.
    pub enable_video_capture: bool,

    /// Which summarisation provider to prefer: `openai`, `deepgram`,
    /// `pho-whisper`, or `auto`.
    pub summarisation_provider: String,

    /// Language hint passed to providers.
    pub summarisation_language: String,

    /// API key for the configured transcription provider.
    /// Override: `MEETCAP_TRANSCRIPTION_API_KEY`
    pub transcription_api_key: Option<String>,

    /// API key for the configured summarisation provider.
    /// Override: `MEETCAP_SUMMARISATION_API_KEY`
    pub summarisation_api_key: Option<String>,

    /// Seconds of inactivity before a session is closed.
    pub inactivity_timeout_secs: u64,

    /// Cap, in bytes, on audio buffered before a format is known.
    pub pending_buffer_max_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let core = meetcap_core::Config::default();
        Self {
            port: core.port,
            recordings_root: PathBuf::from(core.recordings_root),
            enable_mixed_audio: core.enable_mixed_audio,
            enable_per_participant_audio: core.enable_per_participant_audio,
            enable_video_capture: core.enable_video_capture,
            summarisation_provider: "auto".to_string(),
            summarisation_language: core.summarisation_language,
            transcription_api_key: None,
            summarisation_api_key: None,
            inactivity_timeout_secs: core.inactivity_timeout_secs,
            pending_buffer_max_bytes: core.pending_buffer_max_bytes,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MEETCAP_PORT") {
            if let Ok(port) = val.parse() {
                self.port = port;
            }
        }

        if let Ok(val) = std::env::var("MEETCAP_RECORDINGS_ROOT") {
            self.recordings_root = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("MEETCAP_SUMMARISATION_PROVIDER") {
            self.summarisation_provider = val;
        }

        if let Ok(val) = std::env::var("MEETCAP_TRANSCRIPTION_API_KEY") {
            self.transcription_api_key = Some(val);
        }

        if let Ok(val) = std::env::var("MEETCAP_SUMMARISATION_API_KEY") {
            self.summarisation_api_key = Some(val);
        }
    }

    /// Converts to meetcap-core's `Config` type.
    pub fn to_core_config(&self) -> Result<meetcap_core::Config> {
        use meetcap_core::{Environment, SummarisationProviderKind};

        let summarisation_provider = match self.summarisation_provider.as_str() {
            "openai" => SummarisationProviderKind::Openai,
            "deepgram" => SummarisationProviderKind::Deepgram,
            "pho-whisper" => SummarisationProviderKind::PhoWhisper,
            "auto" => SummarisationProviderKind::Auto,
            other => anyhow::bail!("unknown summarisationProvider: {other}"),
        };

        Ok(meetcap_core::Config {
            env: Environment::default(),
            port: self.port,
            recordings_root: self.recordings_root.to_string_lossy().into_owned(),
            enable_mixed_audio: self.enable_mixed_audio,
            enable_per_participant_audio: self.enable_per_participant_audio,
            enable_video_capture: self.enable_video_capture,
            summarisation_provider,
            summarisation_language: self.summarisation_language.clone(),
            transcription_api_key: self.transcription_api_key.clone(),
            summarisation_api_key: self.summarisation_api_key.clone(),
            inactivity_timeout_secs: self.inactivity_timeout_secs,
            pending_buffer_max_bytes: self.pending_buffer_max_bytes,
        })
    }
}
