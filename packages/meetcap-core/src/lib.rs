//! Meetcap Core - shared library for the Meetcap ingestion server.
//!
//! This crate implements the binary WebSocket ingestion protocol, the
//! per-session lifecycle (open, close, archive), and the post-archive
//! transcription/summarisation pipeline for recorded meetings.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`runtime`]: Task spawning abstraction for async runtime independence
//! - [`state`]: Core application configuration
//! - [`protocol_constants`]: Fixed wire/container-format constants
//! - [`frame`]: Binary frame envelope decoding
//! - [`format`]: Audio format negotiation and validation
//! - [`pcm`]: PCM/WAV container writer
//! - [`session`]: Per-connection session state and frame dispatch
//! - [`registry`]: Live-session tracking and force-close fan-out
//! - [`lifecycle`]: Session close/archive/finalise state machine
//! - [`archiver`]: Live-to-completed directory promotion and manifest
//! - [`providers`]: Transcription/summarisation provider abstraction
//! - [`custom_summary`]: Local extractive summarisation fallback
//! - [`pipeline`]: Post-archive transcription/summarisation orchestration
//! - [`bootstrap`]: Composition root wiring all services together
//! - [`api`]: HTTP/WebSocket layer (acceptor, health/readiness probes)
//! - [`error`]: Centralized error types

#![warn(clippy::all)]

pub mod api;
pub mod archiver;
pub mod bootstrap;
pub mod custom_summary;
pub mod error;
pub mod format;
pub mod frame;
pub mod lifecycle;
pub mod pcm;
pub mod pipeline;
pub mod protocol_constants;
pub mod providers;
pub mod registry;
pub mod runtime;
pub mod session;
pub mod state;
pub mod utils;

// Re-export commonly used types at the crate root
pub use api::{start_server, AppState, AppStateBuilder, ServerError};
pub use bootstrap::{bootstrap_services, BootstrappedServices};
pub use error::{ErrorCode, IngestError, IngestResult};
pub use providers::{ProviderChain, SummarisationProvider, SummaryResult, TranscriptionProvider, TranscriptionResult};
pub use registry::{SessionGuard, SessionRegistry};
pub use runtime::{TaskSpawner, TokioSpawner};
pub use session::{Session, SessionFeatureFlags};
pub use state::{Config, Environment, SummarisationProviderKind};
