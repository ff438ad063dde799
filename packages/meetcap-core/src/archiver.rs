//! Promotes a finalised session's live directory into the sealed
//! `completed/` archive and writes its manifest (§4.6, §6).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use walkdir::WalkDir;

use crate::error::{IngestError, IngestResult};
use crate::protocol_constants::{COMPLETED_DIR_NAME, MANIFEST_FILE_NAME};
use crate::session::summary::enrich_with_archive;
use crate::utils::sanitise_slug;

/// One entry in `archive.json`: a file's path relative to the archive
/// root and its size in bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    pub size: u64,
}

/// `archive.json` contents, written once per archived session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveManifest {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_name: Option<String>,
    pub started_at: String,
    pub archived_at: String,
    pub files: Vec<ManifestEntry>,
}

/// Result of a successful archival: where the session now lives.
pub struct ArchivedSession {
    pub archive_dir: PathBuf,
    pub manifest_path: PathBuf,
}

/// Derives the archive folder slug from the meeting URL: the sanitised
/// last non-empty path segment, else the host, else `"unknown"`.
#[must_use]
pub fn slug_from_meeting_url(meeting_url: Option<&str>) -> String {
    let Some(url) = meeting_url else {
        return "unknown".to_string();
    };
    let without_scheme = url.split("://").last().unwrap_or(url);
    let mut segments = without_scheme.split('/').filter(|s| !s.is_empty());
    let host = segments.next();
    let last_segment = without_scheme
        .split('/')
        .filter(|s| !s.is_empty())
        .last();

    let candidate = match last_segment {
        Some(seg) if Some(seg) != host => seg,
        _ => host.unwrap_or("unknown"),
    };
    let slug = sanitise_slug(candidate);
    if slug.is_empty() {
        "unknown".to_string()
    } else {
        slug
    }
}

/// Formats `started_at_iso` as `YYYYMMDDTHHMMSSZ` (separators stripped,
/// sub-second truncated).
#[must_use]
pub fn compact_timestamp(started_at_iso: &str) -> String {
    let truncated = match started_at_iso.find('.') {
        Some(idx) => {
            let mut s = started_at_iso[..idx].to_string();
            if started_at_iso.ends_with('Z') {
                s.push('Z');
            }
            s
        }
        None => started_at_iso.to_string(),
    };
    truncated.chars().filter(|c| *c != '-' && *c != ':').collect()
}

/// Builds the archive folder name: `meeting_<slug>_<timestamp>_<shortId>`.
#[must_use]
pub fn archive_folder_name(meeting_url: Option<&str>, started_at_iso: &str, session_id: &str) -> String {
    let slug = slug_from_meeting_url(meeting_url);
    let timestamp = compact_timestamp(started_at_iso);
    let short_id: String = session_id.chars().take(8).collect();
    format!("meeting_{slug}_{timestamp}_{short_id}")
}

/// Moves `live_dir` to `completed/<folder name>`, appending `_NN` on
/// collision starting at `01`, then writes the manifest and enriches the
/// session summary with the sealed location.
pub async fn archive_session(
    recordings_root: &Path,
    live_dir: &Path,
    session_id: &str,
    meeting_url: Option<&str>,
    bot_name: Option<&str>,
    started_at_iso: &str,
) -> IngestResult<ArchivedSession> {
    let completed_root = recordings_root.join(COMPLETED_DIR_NAME);
    fs::create_dir_all(&completed_root).await?;

    let base_name = archive_folder_name(meeting_url, started_at_iso, session_id);
    let archive_dir = reserve_target_dir(&completed_root, &base_name).await?;

    fs::rename(live_dir, &archive_dir).await.map_err(|e| {
        IngestError::ArchiveRename(format!(
            "failed to move {} to {}: {}",
            live_dir.display(),
            archive_dir.display(),
            e
        ))
    })?;

    let files = enumerate_files(&archive_dir).await?;
    let manifest = ArchiveManifest {
        session_id: session_id.to_string(),
        meeting_url: meeting_url.map(str::to_string),
        bot_name: bot_name.map(str::to_string),
        started_at: started_at_iso.to_string(),
        archived_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        files,
    };

    let manifest_path = archive_dir.join(MANIFEST_FILE_NAME);
    let manifest_body = serde_json::to_vec_pretty(&manifest)
        .map_err(|e| IngestError::Internal(format!("failed to serialise manifest: {e}")))?;
    fs::write(&manifest_path, manifest_body).await?;

    let summary_path = archive_dir.join(crate::protocol_constants::SUMMARY_FILE_NAME);
    if summary_path.exists() {
        let archive_path_str = archive_dir.to_string_lossy().into_owned();
        let manifest_path_str = manifest_path.to_string_lossy().into_owned();
        enrich_with_archive(&summary_path, &archive_path_str, &manifest_path_str).await?;
    }

    Ok(ArchivedSession {
        archive_dir,
        manifest_path,
    })
}

/// Picks a collision-free target directory under `parent`, trying the
/// bare `base_name` first, then `_01`, `_02`, ... (§4.6).
async fn reserve_target_dir(parent: &Path, base_name: &str) -> IngestResult<PathBuf> {
    let bare = parent.join(base_name);
    if !path_exists(&bare).await {
        return Ok(bare);
    }
    for n in 1..100 {
        let candidate = parent.join(format!("{base_name}_{n:02}"));
        if !path_exists(&candidate).await {
            return Ok(candidate);
        }
    }
    Err(IngestError::ArchiveRename(format!(
        "exhausted collision suffixes for {base_name}"
    )))
}

async fn path_exists(path: &Path) -> bool {
    fs::metadata(path).await.is_ok()
}

/// Recursively enumerates files under `root`, sorted by relative path.
async fn enumerate_files(root: &Path) -> IngestResult<Vec<ManifestEntry>> {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let mut entries: Vec<ManifestEntry> = WalkDir::new(&root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let relative = e.path().strip_prefix(&root).ok()?.to_string_lossy().into_owned();
                let size = e.metadata().ok()?.len();
                Some(ManifestEntry { path: relative, size })
            })
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries
    })
    .await
    .map_err(|e| IngestError::Internal(format!("manifest enumeration panicked: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    mod slug {
        use super::*;

        #[test]
        fn derives_last_path_segment() {
            assert_eq!(slug_from_meeting_url(Some("https://meet.example/xyz")), "xyz");
        }

        #[test]
        fn falls_back_to_host_without_path() {
            assert_eq!(slug_from_meeting_url(Some("https://meet.example")), "meet-example");
        }

        #[test]
        fn falls_back_to_unknown_without_url() {
            assert_eq!(slug_from_meeting_url(None), "unknown");
        }
    }

    mod folder_name {
        use super::*;

        #[test]
        fn builds_expected_shape() {
            let name = archive_folder_name(
                Some("https://meet.example/xyz"),
                "2024-06-07T14:30:05Z",
                "abcdef1234567890",
            );
            assert_eq!(name, "meeting_xyz_20240607T143005Z_abcdef12");
        }
    }

    #[tokio::test]
    async fn archives_and_writes_manifest() {
        let recordings_root = tempfile::tempdir().unwrap();
        let live_dir = recordings_root.path().join("live").join("session_abc");
        fs::create_dir_all(&live_dir).await.unwrap();
        fs::write(live_dir.join("telemetry.ndjson"), b"{}\n").await.unwrap();

        let result = archive_session(
            recordings_root.path(),
            &live_dir,
            "abc",
            Some("https://meet.example/xyz"),
            None,
            "2024-06-07T14:30:05Z",
        )
        .await
        .unwrap();

        assert!(!live_dir.exists());
        assert!(result.manifest_path.exists());
        let manifest: ArchiveManifest =
            serde_json::from_slice(&fs::read(&result.manifest_path).await.unwrap()).unwrap();
        assert_eq!(manifest.files.len(), 1);
        assert_eq!(manifest.files[0].path, "telemetry.ndjson");
    }

    #[tokio::test]
    async fn collision_appends_numeric_suffix() {
        let recordings_root = tempfile::tempdir().unwrap();
        let completed = recordings_root.path().join("completed");
        let taken = completed.join("meeting_xyz_20240607T143005Z_abcdef12");
        fs::create_dir_all(&taken).await.unwrap();

        let live_dir = recordings_root.path().join("live").join("session_abcdef1234567890");
        fs::create_dir_all(&live_dir).await.unwrap();

        let result = archive_session(
            recordings_root.path(),
            &live_dir,
            "abcdef1234567890",
            Some("https://meet.example/xyz"),
            None,
            "2024-06-07T14:30:05Z",
        )
        .await
        .unwrap();

        assert_eq!(
            result.archive_dir.file_name().unwrap().to_string_lossy(),
            "meeting_xyz_20240607T143005Z_abcdef12_01"
        );
    }
}
