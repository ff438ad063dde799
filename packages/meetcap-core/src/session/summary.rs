//! `session-summary.json` — written once at close, enriched again after
//! archival with the sealed location (§4.6, §3 `SessionSummary`).

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IngestError, IngestResult};
use crate::format::AudioFormat;
use crate::session::ParticipantInfo;
use crate::session::Stats;

/// Snapshot of which audio files a session produced, by relative path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioFilesMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mixed: Option<String>,
    #[serde(default)]
    pub participants: HashMap<String, Vec<String>>,
}

/// Frozen session metadata captured at close.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_format: Option<AudioFormat>,
    pub audio_files: AudioFilesMeta,
    pub participants: Vec<ParticipantInfo>,
}

/// Written once at close, then rewritten with `archive_path`/
/// `manifest_path` once archival completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub reason: String,
    pub duration_ms: u64,
    pub idle_ms_before_close: u64,
    pub stats: Stats,
    pub metadata: SessionMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_path: Option<String>,
}

/// Writes `summary` to `path` as pretty JSON, retrying once on failure per
/// the "close is always best-effort" policy (§7).
pub async fn write_summary_file(path: &Path, summary: &SessionSummary) -> IngestResult<()> {
    let body = serde_json::to_vec_pretty(summary)
        .map_err(|e| IngestError::Internal(format!("failed to serialise summary: {e}")))?;
    match tokio::fs::write(path, &body).await {
        Ok(()) => Ok(()),
        Err(first_err) => {
            log::warn!("retrying session summary write to {}: {}", path.display(), first_err);
            tokio::fs::write(path, &body).await.map_err(|e| {
                log::error!("session summary write failed after retry: {}", e);
                IngestError::WriterIo(e.to_string())
            })
        }
    }
}

/// Reads an existing summary, sets `archivePath`/`manifestPath`, and
/// rewrites it in place. Used by the archiver once the manifest exists.
pub async fn enrich_with_archive(
    summary_path: &Path,
    archive_path: &str,
    manifest_path: &str,
) -> IngestResult<()> {
    let raw = tokio::fs::read(summary_path).await?;
    let mut summary: SessionSummary = serde_json::from_slice(&raw)
        .map_err(|e| IngestError::Internal(format!("failed to parse session summary: {e}")))?;
    summary.archive_path = Some(archive_path.to_string());
    summary.manifest_path = Some(manifest_path.to_string());
    write_summary_file(summary_path, &summary).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_summary() -> SessionSummary {
        SessionSummary {
            session_id: "abc".to_string(),
            reason: "client_close".to_string(),
            duration_ms: 1000,
            idle_ms_before_close: 10,
            stats: Stats::default(),
            metadata: SessionMetadata::default(),
            error: None,
            archive_path: None,
            manifest_path: None,
        }
    }

    #[tokio::test]
    async fn write_then_enrich_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session-summary.json");
        write_summary_file(&path, &sample_summary()).await.unwrap();

        enrich_with_archive(&path, "completed/meeting_x", "completed/meeting_x/archive.json")
            .await
            .unwrap();

        let raw = tokio::fs::read(&path).await.unwrap();
        let summary: SessionSummary = serde_json::from_slice(&raw).unwrap();
        assert_eq!(summary.archive_path.as_deref(), Some("completed/meeting_x"));
        assert_eq!(summary.manifest_path.as_deref(), Some("completed/meeting_x/archive.json"));
    }
}
