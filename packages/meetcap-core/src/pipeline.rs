//! Post-archive pipeline: transcribes each archived audio file and
//! produces meeting- and participant-level summaries (§4.7).
//!
//! Runs once per archived session, scheduled in the background by
//! [`crate::lifecycle::finalise_session`] via a [`crate::runtime::TaskSpawner`].
//! Failures here are logged and never retried; the archive itself is
//! already sealed and complete without these artifacts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::custom_summary;
use crate::error::{IngestError, IngestResult};
use crate::protocol_constants::{MIXED_AUDIO_FILE_NAME, TRANSCRIBABLE_AUDIO_EXTENSIONS};
use crate::providers::{ProviderChain, SummaryHints, SummaryResult, TranscriptionResult};

/// Configuration for one pipeline run, resolved from the session's
/// static configuration at bootstrap time (§6).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub language: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TranscriptFile {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
    language: String,
}

impl From<&TranscriptionResult> for TranscriptFile {
    fn from(r: &TranscriptionResult) -> Self {
        Self {
            text: r.text.clone(),
            confidence: r.confidence,
            duration: r.duration,
            language: r.language.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SummaryFile {
    source: String,
    summary: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    key_points: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    action_items: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    decisions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    topics: Vec<String>,
}

impl From<SummaryResult> for SummaryFile {
    fn from(r: SummaryResult) -> Self {
        Self {
            source: r.source.to_string(),
            summary: r.summary,
            key_points: r.key_points,
            action_items: r.action_items,
            decisions: r.decisions,
            topics: r.topics,
        }
    }
}

/// A discovered archived file plus the participant it belongs to, if
/// any (`None` for the mixed-audio container).
struct DiscoveredFile {
    path: PathBuf,
    participant_id: Option<String>,
}

/// Recursively walks `archive_dir` for files with a transcribable
/// extension, sorted by relative path for stable, discovery-ordered
/// participant concatenation.
async fn discover_audio_files(archive_dir: &Path) -> IngestResult<Vec<DiscoveredFile>> {
    let root = archive_dir.to_path_buf();
    let mut paths: Vec<PathBuf> = tokio::task::spawn_blocking(move || {
        let mut found: Vec<PathBuf> = walkdir::WalkDir::new(&root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| TRANSCRIBABLE_AUDIO_EXTENSIONS.contains(&ext))
            })
            .collect();
        found.sort();
        found
    })
    .await
    .map_err(|e| IngestError::Internal(format!("audio discovery panicked: {e}")))?;

    paths.sort();

    let participant_pattern = Regex::new(r"(?:participant|user)_(\w+)")
        .expect("static participant-id pattern is valid");
    let combined_pattern =
        Regex::new(r"combined_([^_]+_\d+_\d+)").expect("static combined-id pattern is valid");

    Ok(paths
        .into_iter()
        .map(|path| {
            let file_stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
            let is_mixed = path.file_name().and_then(|n| n.to_str()) == Some(MIXED_AUDIO_FILE_NAME);
            let participant_id = if is_mixed {
                None
            } else {
                participant_pattern
                    .captures(&file_stem)
                    .or_else(|| combined_pattern.captures(&file_stem))
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string())
            };
            DiscoveredFile { path, participant_id }
        })
        .collect())
}

/// Writes `<path>.transcript.json` alongside the source audio file.
async fn write_transcript_file(audio_path: &Path, result: &TranscriptionResult) -> IngestResult<()> {
    let transcript_path = transcript_path_for(audio_path);
    let body = serde_json::to_vec_pretty(&TranscriptFile::from(result))
        .map_err(|e| IngestError::Internal(format!("failed to serialise transcript: {e}")))?;
    tokio::fs::write(&transcript_path, body).await?;
    Ok(())
}

fn transcript_path_for(audio_path: &Path) -> PathBuf {
    let mut name = audio_path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    name.push_str(".transcript.json");
    audio_path.with_file_name(name)
}

fn summary_path_for(audio_path: &Path) -> PathBuf {
    let mut name = audio_path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    name.push_str(".summary.json");
    audio_path.with_file_name(name)
}

/// Picks a summary for `text`: the configured provider chain first,
/// then a provider-supplied short summary carried over from
/// transcription (only trusted for English), then the local extractive
/// fallback. This is what realises the `auto` fallback order (§4.7)
/// without the pipeline needing to know which provider is "deepgram".
async fn select_summary(
    providers: &ProviderChain,
    text: &str,
    language: &str,
    hints: &SummaryHints,
) -> SummaryResult {
    if let Some(result) = providers.summarise(text, language, hints).await {
        return result;
    }
    if let Some(short) = hints.provider_summary.as_ref().filter(|_| language.eq_ignore_ascii_case("en")) {
        return SummaryResult {
            source: "deepgram",
            summary: short.clone(),
            key_points: Vec::new(),
            action_items: Vec::new(),
            decisions: Vec::new(),
            topics: Vec::new(),
        };
    }
    custom_summary::summarise(text)
}

/// Transcribes every archived audio file and writes meeting- and
/// participant-level summaries next to them.
pub async fn run_post_archive_pipeline(
    archive_dir: &Path,
    providers: &ProviderChain,
    config: &PipelineConfig,
) -> IngestResult<()> {
    let files = discover_audio_files(archive_dir).await?;
    if files.is_empty() {
        log::info!("no transcribable audio found under {}", archive_dir.display());
        return Ok(());
    }

    let mut mixed_text: Option<String> = None;
    let mut mixed_hints = SummaryHints::default();
    let mut participant_texts: HashMap<String, Vec<String>> = HashMap::new();
    let mut participant_order: Vec<String> = Vec::new();
    let mut participant_paths: HashMap<String, PathBuf> = HashMap::new();

    for file in &files {
        let Some(result) = providers.transcribe(&file.path, &config.language).await else {
            log::warn!("no transcription provider succeeded for {}", file.path.display());
            continue;
        };
        write_transcript_file(&file.path, &result).await?;

        match &file.participant_id {
            None => {
                mixed_text = Some(result.text.clone());
                mixed_hints.provider_summary = result.provider_summary.clone();
            }
            Some(pid) => {
                if !participant_order.contains(pid) {
                    participant_order.push(pid.clone());
                    participant_paths.insert(pid.clone(), file.path.clone());
                }
                participant_texts.entry(pid.clone()).or_default().push(result.text.clone());
            }
        }
    }

    let meeting_text = match &mixed_text {
        Some(text) => text.clone(),
        None => participant_order
            .iter()
            .filter_map(|pid| participant_texts.get(pid))
            .map(|texts| texts.join(" "))
            .collect::<Vec<_>>()
            .join("\n\n"),
    };

    if !meeting_text.trim().is_empty() {
        let summary = select_summary(providers, &meeting_text, &config.language, &mixed_hints).await;
        let summary_target = archive_dir.join(MIXED_AUDIO_FILE_NAME);
        let body = serde_json::to_vec_pretty(&SummaryFile::from(summary))
            .map_err(|e| IngestError::Internal(format!("failed to serialise meeting summary: {e}")))?;
        tokio::fs::write(summary_path_for(&summary_target), body).await?;
    }

    for pid in &participant_order {
        let Some(texts) = participant_texts.get(pid) else { continue };
        let text = texts.join(" ");
        if text.trim().is_empty() {
            continue;
        }
        let summary = select_summary(providers, &text, &config.language, &SummaryHints::default()).await;
        if let Some(path) = participant_paths.get(pid) {
            let body = serde_json::to_vec_pretty(&SummaryFile::from(summary))
                .map_err(|e| IngestError::Internal(format!("failed to serialise participant summary: {e}")))?;
            tokio::fs::write(summary_path_for(path), body).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{NullSummarisationProvider, NullTranscriptionProvider, TranscriptionProvider};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Arc;

    struct StubTranscriber {
        text: &'static str,
    }

    #[async_trait]
    impl TranscriptionProvider for StubTranscriber {
        fn id(&self) -> &'static str {
            "stub"
        }

        async fn transcribe(&self, _path: &Path, language: &str) -> IngestResult<TranscriptionResult> {
            Ok(TranscriptionResult {
                text: self.text.to_string(),
                confidence: Some(0.9),
                duration: Some(1.0),
                language: language.to_string(),
                provider_summary: None,
            })
        }
    }

    #[tokio::test]
    async fn no_audio_files_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let providers = ProviderChain::new(
            vec![Arc::new(NullTranscriptionProvider)],
            vec![Arc::new(NullSummarisationProvider)],
        );
        run_post_archive_pipeline(dir.path(), &providers, &PipelineConfig::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn mixed_audio_is_transcribed_and_summarised_via_custom_fallback() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join(MIXED_AUDIO_FILE_NAME), b"not real audio").await.unwrap();

        let providers = ProviderChain::new(
            vec![Arc::new(StubTranscriber {
                text: "We opened the meeting with introductions. \
                    It was decided that the launch date moves to next month. \
                    We closed the meeting thanking everyone for attending today.",
            })],
            vec![Arc::new(NullSummarisationProvider)],
        );

        run_post_archive_pipeline(dir.path(), &providers, &PipelineConfig::default())
            .await
            .unwrap();

        let transcript_path = dir.path().join(format!("{MIXED_AUDIO_FILE_NAME}.transcript.json"));
        assert!(transcript_path.exists());
        let summary_path = dir.path().join(format!("{MIXED_AUDIO_FILE_NAME}.summary.json"));
        assert!(summary_path.exists());

        let summary: SummaryFile = serde_json::from_slice(&tokio::fs::read(&summary_path).await.unwrap()).unwrap();
        assert_eq!(summary.source, "custom");
    }

    #[tokio::test]
    async fn participant_files_are_grouped_by_extracted_id() {
        let dir = tempfile::tempdir().unwrap();
        let participants_dir = dir.path().join("participants");
        tokio::fs::create_dir_all(&participants_dir).await.unwrap();
        tokio::fs::write(participants_dir.join("participant_alice.wav"), b"x").await.unwrap();

        let providers = ProviderChain::new(
            vec![Arc::new(StubTranscriber {
                text: "Alice spoke at length about the roadmap for the next quarter in this meeting.",
            })],
            vec![Arc::new(NullSummarisationProvider)],
        );

        run_post_archive_pipeline(dir.path(), &providers, &PipelineConfig::default())
            .await
            .unwrap();

        let summary_path = participants_dir.join("participant_alice.wav.summary.json");
        assert!(summary_path.exists());
    }
}
