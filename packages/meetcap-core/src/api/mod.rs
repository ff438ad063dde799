//! HTTP/WebSocket API layer.
//!
//! This module contains thin handlers that delegate to services.
//! It provides the router construction and server startup functionality.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::bootstrap::BootstrappedServices;
use crate::providers::ProviderChain;
use crate::registry::SessionRegistry;
use crate::runtime::TaskSpawner;
use crate::session::SessionFeatureFlags;
use crate::state::Config;

pub mod http;
pub mod response;
pub mod ws;

/// Errors that can occur when starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to a TCP port.
    #[error("Failed to bind to port: {0}")]
    Bind(#[from] std::io::Error),
}

/// Shared application state for the API layer.
///
/// This is a thin wrapper that holds references to services.
/// All business logic lives in the session/lifecycle/pipeline modules.
#[derive(Clone)]
pub struct AppState {
    /// Live-session tracker and force-close fan-out.
    pub registry: Arc<SessionRegistry>,
    /// Ordered transcription/summarisation provider chain.
    pub providers: Arc<ProviderChain>,
    /// Task spawner for the post-archive pipeline's background task.
    pub spawner: Arc<dyn TaskSpawner>,
    /// Cancellation token signalled on operator shutdown.
    pub cancel_token: CancellationToken,
    /// Root directory holding `live/` and `completed/`.
    pub recordings_root: PathBuf,
    /// Resolved application configuration.
    pub config: Arc<Config>,
}

/// Builder for constructing an `AppState`.
#[derive(Default)]
pub struct AppStateBuilder {
    registry: Option<Arc<SessionRegistry>>,
    providers: Option<Arc<ProviderChain>>,
    spawner: Option<Arc<dyn TaskSpawner>>,
    cancel_token: Option<CancellationToken>,
    recordings_root: Option<PathBuf>,
    config: Option<Arc<Config>>,
}

impl AppStateBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Populates the service fields shared with `BootstrappedServices`,
    /// leaving only `config` to be set individually.
    pub fn from_services(mut self, services: &BootstrappedServices) -> Self {
        self.registry = Some(Arc::clone(&services.registry));
        self.providers = Some(Arc::clone(&services.providers));
        self.spawner = Some(Arc::new(services.spawner.clone()));
        self.cancel_token = Some(services.cancel_token.clone());
        self.recordings_root = Some(
            services
                .live_dir
                .parent()
                .map(std::path::Path::to_path_buf)
                .unwrap_or_else(|| services.live_dir.clone()),
        );
        self
    }

    /// Sets the application configuration.
    pub fn config(mut self, config: Arc<Config>) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the `AppState`, panicking if required fields are missing.
    pub fn build(self) -> AppState {
        AppState {
            registry: self.registry.expect("registry is required"),
            providers: self.providers.expect("providers is required"),
            spawner: self.spawner.expect("spawner is required"),
            cancel_token: self.cancel_token.expect("cancel_token is required"),
            recordings_root: self.recordings_root.expect("recordings_root is required"),
            config: self.config.expect("config is required"),
        }
    }
}

impl AppState {
    /// Creates a new builder for constructing an `AppState`.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Feature flags derived from the current configuration, used to
    /// construct each new `Session`.
    #[must_use]
    pub fn session_flags(&self) -> SessionFeatureFlags {
        SessionFeatureFlags {
            enable_mixed_audio: self.config.enable_mixed_audio,
            enable_per_participant_audio: self.config.enable_per_participant_audio,
            pending_buffer_cap_bytes: self.config.pending_buffer_max_bytes,
        }
    }
}

/// Starts the HTTP/WebSocket server on the configured port.
pub async fn start_server(state: AppState) -> Result<(), ServerError> {
    let port = state.config.port;
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log::info!("Server listening on http://0.0.0.0:{port}");
    let app = http::create_router(state);

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
