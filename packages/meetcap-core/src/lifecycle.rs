//! Session lifecycle state machine: `Open -> Closing -> Archiving ->
//! Finalised` (§4.6).
//!
//! `Archiving` may be skipped in favour of going straight to `Finalised`
//! if the directory rename fails; that is an observable failure, not a
//! crash, and the live directory is left in place for offline recovery.

use std::path::Path;
use std::sync::Arc;

use crate::archiver::archive_session;
use crate::error::IngestResult;
use crate::pipeline::{run_post_archive_pipeline, PipelineConfig};
use crate::providers::ProviderChain;
use crate::runtime::TaskSpawner;
use crate::session::Session;

/// Observable state of a session's finalisation, used only for logging —
/// the actual transitions are driven by [`finalise_session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Open,
    Closing,
    Archiving,
    Finalised,
}

/// Runs the `Closing -> Archiving -> Finalised` sequence for an
/// already-`close()`-d session: promotes its live directory to
/// `completed/` and, on success, schedules the post-archive pipeline in
/// the background.
///
/// Archival and pipeline failures are logged and do not propagate — the
/// session is always considered finalised once this returns.
pub async fn finalise_session(
    session: &mut Session,
    reason: &str,
    error: Option<String>,
    recordings_root: &Path,
    spawner: Arc<dyn TaskSpawner>,
    providers: Arc<ProviderChain>,
    pipeline_config: PipelineConfig,
) -> IngestResult<LifecycleState> {
    let outcome = session.close(reason, error).await?;
    log::info!(
        "session {}: closed (reason={}), entering Archiving",
        outcome.session_id,
        reason
    );

    let meeting_url = outcome.meeting_url.clone();
    let session_id = outcome.session_id.to_string();

    let archived = archive_session(
        recordings_root,
        &outcome.base_dir,
        &session_id,
        meeting_url.as_deref(),
        None,
        &outcome.started_at_iso,
    )
    .await;

    let archive_dir = match archived {
        Ok(archived) => archived.archive_dir,
        Err(e) => {
            log::error!(
                "session {}: archival failed, leaving live directory in place: {}",
                session_id, e
            );
            return Ok(LifecycleState::Finalised);
        }
    };

    log::info!("session {}: archived to {}", session_id, archive_dir.display());

    spawner.spawn(Box::pin(async move {
        if let Err(e) = run_post_archive_pipeline(&archive_dir, providers.as_ref(), &pipeline_config).await {
            log::error!("post-archive pipeline failed for {}: {}", archive_dir.display(), e);
        }
    }));

    Ok(LifecycleState::Finalised)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{NullSummarisationProvider, NullTranscriptionProvider};
    use crate::runtime::TokioSpawner;
    use crate::session::SessionFeatureFlags;
    use uuid::Uuid;

    #[tokio::test]
    async fn finalises_and_archives_a_closed_session() {
        let recordings_root = tempfile::tempdir().unwrap();
        let flags = SessionFeatureFlags::default();
        let mut session = Session::new(Uuid::new_v4(), recordings_root.path(), flags)
            .await
            .unwrap();

        let providers = Arc::new(ProviderChain::new(
            vec![Arc::new(NullTranscriptionProvider)],
            vec![Arc::new(NullSummarisationProvider)],
        ));
        let spawner: Arc<dyn TaskSpawner> = Arc::new(TokioSpawner::current());

        let state = finalise_session(
            &mut session,
            "client_close",
            None,
            recordings_root.path(),
            spawner,
            providers,
            PipelineConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(state, LifecycleState::Finalised);
        let completed_dir = recordings_root.path().join("completed");
        let mut entries = tokio::fs::read_dir(&completed_dir).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_some());
    }
}
