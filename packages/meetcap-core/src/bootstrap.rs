//! Application bootstrap and dependency wiring.
//!
//! This module contains the composition root - the single place where all
//! services are instantiated and wired together. This pattern provides:
//!
//! - **Clarity**: All dependency relationships are visible in one place
//! - **Testability**: Easy to swap implementations for testing
//! - **Maintainability**: Service creation logic is isolated from usage

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::{IngestError, IngestResult};
use crate::protocol_constants::{COMPLETED_DIR_NAME, LIVE_DIR_NAME};
use crate::providers::{
    create_summarisation_provider, create_transcription_provider, NullSummarisationProvider,
    NullTranscriptionProvider, ProviderChain,
};
use crate::registry::SessionRegistry;
use crate::runtime::TokioSpawner;
use crate::state::{Config, SummarisationProviderKind};

/// Container for all bootstrapped services.
///
/// This struct holds all the wired services created during bootstrap.
/// It's consumed by `AppState` to build the final application state.
#[derive(Clone)]
pub struct BootstrappedServices {
    /// Live-session tracker and force-close fan-out.
    pub registry: Arc<SessionRegistry>,
    /// Ordered transcription/summarisation provider chain.
    pub providers: Arc<ProviderChain>,
    /// Task spawner for background operations.
    pub spawner: TokioSpawner,
    /// Cancellation token for graceful shutdown.
    pub cancel_token: CancellationToken,
    /// Resolved `live/` directory under `recordingsRoot`.
    pub live_dir: PathBuf,
    /// Resolved `completed/` directory under `recordingsRoot`.
    pub completed_dir: PathBuf,
}

impl BootstrappedServices {
    /// Initiates graceful shutdown: stops accepting new work and signals
    /// every live session to finalise.
    pub async fn shutdown(&self) {
        log::info!("[Bootstrap] Beginning graceful shutdown...");
        self.cancel_token.cancel();
        let closed = self.registry.close_all();
        log::info!("[Bootstrap] Signalled {closed} live session(s) to close");
    }
}

/// Builds the provider chain described by the configured
/// `summarisationProvider` selection and the transcription/summarisation
/// API keys (§4.7, §6).
///
/// `Auto` and any id with a configured key both install every provider
/// whose key is present, in the corpus's natural precedence (openai
/// before deepgram); `select_summary`/`ProviderChain::transcribe` then
/// try them in order and fall further back to the reused transcription
/// summary and the local extractive summariser.
fn build_provider_chain(config: &Config) -> ProviderChain {
    let transcription_key = config.transcription_api_key.as_deref();
    let summarisation_key = config.summarisation_api_key.as_deref();

    let wants = |id: &str| match config.summarisation_provider {
        SummarisationProviderKind::Auto => true,
        SummarisationProviderKind::Openai => id == "openai",
        SummarisationProviderKind::Deepgram => id == "deepgram",
        SummarisationProviderKind::PhoWhisper => id == "pho-whisper",
    };

    let mut transcription = Vec::new();
    if wants("openai") {
        if let Some(p) = create_transcription_provider("openai", transcription_key) {
            transcription.push(p);
        }
    }
    if wants("deepgram") {
        if let Some(p) = create_transcription_provider("deepgram", transcription_key) {
            transcription.push(p);
        }
    }
    if transcription.is_empty() {
        transcription.push(Arc::new(NullTranscriptionProvider));
    }

    let mut summarisation = Vec::new();
    if wants("openai") {
        if let Some(p) = create_summarisation_provider("openai", summarisation_key) {
            summarisation.push(p);
        }
    }
    if summarisation.is_empty() {
        summarisation.push(Arc::new(NullSummarisationProvider));
    }

    ProviderChain::new(transcription, summarisation)
}

/// Bootstraps all application services with their dependencies.
///
/// This is the composition root where all services are instantiated and
/// wired together. The wiring order matters - services are created in
/// dependency order:
///
/// 1. Cancellation token (needed by the registry and the acceptor)
/// 2. Task spawner from the current runtime
/// 3. Session registry (depends on the cancellation token)
/// 4. Provider chain (depends on the configured provider ids and keys)
/// 5. Recordings directories, created eagerly so a misconfigured root
///    fails at startup rather than on first session
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the recordings
/// directories cannot be created.
pub async fn bootstrap_services(config: &Config) -> IngestResult<BootstrappedServices> {
    config.validate()?;

    let cancel_token = CancellationToken::new();
    let spawner = TokioSpawner::current();
    let registry = Arc::new(SessionRegistry::new());
    let providers = Arc::new(build_provider_chain(config));

    let root = PathBuf::from(&config.recordings_root);
    let live_dir = root.join(LIVE_DIR_NAME);
    let completed_dir = root.join(COMPLETED_DIR_NAME);

    tokio::fs::create_dir_all(&live_dir)
        .await
        .map_err(|e| IngestError::Configuration(format!("cannot create {}: {e}", live_dir.display())))?;
    tokio::fs::create_dir_all(&completed_dir)
        .await
        .map_err(|e| IngestError::Configuration(format!("cannot create {}: {e}", completed_dir.display())))?;

    Ok(BootstrappedServices {
        registry,
        providers,
        spawner,
        cancel_token,
        live_dir,
        completed_dir,
    })
}
