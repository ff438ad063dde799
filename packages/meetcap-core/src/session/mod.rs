//! Per-connection session state and frame dispatch (§4.3-§4.5).
//!
//! One [`Session`] exists per accepted WebSocket connection and is driven
//! exclusively by the task that owns it — no internal locking, matching
//! the single-writer concurrency model (§5).

pub mod events;
pub mod labeling;
pub mod summary;

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::IngestResult;
use crate::format::AudioFormat;
use crate::frame::{decode_envelope, decode_participant_envelope, float32_payload_to_int16_le, FrameKind};
use crate::pcm::PcmWriter;
use crate::protocol_constants::{
    MIXED_AUDIO_FILE_NAME, PARTICIPANTS_DIR_NAME, PENDING_BUFFER_FALLBACK_SAMPLE_RATE,
    PENDING_BUFFER_MAX_SECONDS, SUMMARY_FILE_NAME, TELEMETRY_FILE_NAME,
};

use self::events::{parse_event, extract_meeting_url, SessionEvent};
use self::summary::{write_summary_file, AudioFilesMeta, SessionMetadata, SessionSummary};

/// Per-frame counters; every accepted frame updates exactly one of these.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stats {
    pub json_messages: u64,
    pub mixed_audio_frames: u64,
    pub participant_audio_frames: u64,
    pub video_frames: u64,
    pub encoded_video_chunks: u64,
    pub unknown_frames: u64,
}

/// Feature flags gating which writers a session maintains (§6).
#[derive(Debug, Clone, Copy)]
pub struct SessionFeatureFlags {
    pub enable_mixed_audio: bool,
    pub enable_per_participant_audio: bool,
    /// Cap, in bytes, on buffered pre-format audio per source (§6
    /// `pendingBufferMaxBytes`).
    pub pending_buffer_cap_bytes: usize,
}

impl Default for SessionFeatureFlags {
    fn default() -> Self {
        Self {
            enable_mixed_audio: true,
            enable_per_participant_audio: true,
            pending_buffer_cap_bytes: PENDING_BUFFER_CAP_BYTES,
        }
    }
}

/// A participant record as last observed via `UsersUpdate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub device_id: String,
    pub display_name: Option<String>,
    pub full_name: Option<String>,
    pub is_current_user: Option<bool>,
}

struct ParticipantWriter {
    label: String,
    writer: PcmWriter,
    relative_file: String,
}

/// Byte-capped FIFO for audio buffered before a valid `AudioFormat` arrives.
#[derive(Default)]
struct PendingQueue {
    frames: VecDeque<Vec<u8>>,
    total_bytes: usize,
}

const PENDING_BUFFER_CAP_BYTES: usize =
    (PENDING_BUFFER_MAX_SECONDS as usize) * (PENDING_BUFFER_FALLBACK_SAMPLE_RATE as usize) * 4;

impl PendingQueue {
    fn push(&mut self, bytes: Vec<u8>, cap_bytes: usize) {
        self.total_bytes += bytes.len();
        self.frames.push_back(bytes);
        while self.total_bytes > cap_bytes {
            match self.frames.pop_front() {
                Some(dropped) => self.total_bytes -= dropped.len(),
                None => break,
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Ordered-by-first-sighting collection of per-participant pending queues.
///
/// A plain `HashMap` would lose the "each participant in its observed
/// order" drain guarantee from §4.5, so insertion order is tracked
/// separately.
#[derive(Default)]
struct PendingParticipantQueues {
    order: Vec<String>,
    queues: HashMap<String, PendingQueue>,
}

impl PendingParticipantQueues {
    fn push(&mut self, participant_id: &str, bytes: Vec<u8>, cap_bytes: usize) {
        if !self.queues.contains_key(participant_id) {
            self.order.push(participant_id.to_string());
            self.queues.insert(participant_id.to_string(), PendingQueue::default());
        }
        self.queues.get_mut(participant_id).unwrap().push(bytes, cap_bytes);
    }

    fn is_empty(&self) -> bool {
        self.queues.values().all(PendingQueue::is_empty)
    }

    fn drain_in_order(&mut self) -> Vec<(String, VecDeque<Vec<u8>>)> {
        let order = std::mem::take(&mut self.order);
        order
            .into_iter()
            .filter_map(|id| self.queues.remove(&id).map(|q| (id, q.frames)))
            .collect()
    }
}

/// What [`Session::close`] hands back to the lifecycle/archiver layer.
#[derive(Debug, Clone)]
pub struct SessionCloseOutcome {
    pub session_id: Uuid,
    pub base_dir: PathBuf,
    pub meeting_url: Option<String>,
    pub started_at_iso: String,
    pub summary_path: PathBuf,
}

/// Per-connection state: participants, audio format, writers, telemetry,
/// statistics, pending buffers.
pub struct Session {
    id: Uuid,
    base_dir: PathBuf,
    flags: SessionFeatureFlags,
    start_instant: Instant,
    last_frame_instant: Instant,
    started_at_iso: String,
    stats: Stats,
    meeting_url: Option<String>,
    bot_name: Option<String>,
    audio_format: Option<AudioFormat>,
    participant_info: HashMap<String, ParticipantInfo>,
    participant_writers: HashMap<String, ParticipantWriter>,
    pending_mixed: PendingQueue,
    pending_participants: PendingParticipantQueues,
    mixed_writer: Option<PcmWriter>,
    mixed_relative_file: Option<String>,
    telemetry: Option<File>,
    closed: bool,
    close_outcome: Option<SessionCloseOutcome>,
    requested_close_reason: Option<String>,
    logged_unknown_frame_types: HashSet<i32>,
    warned_pending_mixed: bool,
    warned_pending_participant: HashSet<String>,
}

impl Session {
    /// Creates the live session directory and telemetry log.
    pub async fn new(
        id: Uuid,
        recordings_root: &Path,
        flags: SessionFeatureFlags,
    ) -> IngestResult<Self> {
        let base_dir = recordings_root
            .join(crate::protocol_constants::LIVE_DIR_NAME)
            .join(format!("session_{id}"));
        fs::create_dir_all(&base_dir).await?;

        let telemetry_path = base_dir.join(TELEMETRY_FILE_NAME);
        let telemetry = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&telemetry_path)
            .await?;

        Ok(Self {
            id,
            base_dir,
            flags,
            start_instant: Instant::now(),
            last_frame_instant: Instant::now(),
            started_at_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            stats: Stats::default(),
            meeting_url: None,
            bot_name: None,
            audio_format: None,
            participant_info: HashMap::new(),
            participant_writers: HashMap::new(),
            pending_mixed: PendingQueue::default(),
            pending_participants: PendingParticipantQueues::default(),
            mixed_writer: None,
            mixed_relative_file: None,
            telemetry: Some(telemetry),
            closed: false,
            close_outcome: None,
            requested_close_reason: None,
            logged_unknown_frame_types: HashSet::new(),
            warned_pending_mixed: false,
            warned_pending_participant: HashSet::new(),
        })
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[must_use]
    pub fn last_frame_instant(&self) -> Instant {
        self.last_frame_instant
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns and clears a close reason requested by an in-band event
    /// (e.g. `MeetingStatusChange{change:"removed_from_meeting"}`).
    pub fn take_requested_close(&mut self) -> Option<String> {
        self.requested_close_reason.take()
    }

    /// Entry point for each inbound frame.
    pub async fn handle_message(&mut self, raw: &[u8]) -> IngestResult<()> {
        self.last_frame_instant = Instant::now();

        let Some(envelope) = decode_envelope(raw) else {
            self.stats.unknown_frames += 1;
            log::warn!("session {}: frame shorter than the 4-byte header", self.id);
            return Ok(());
        };

        match envelope.kind {
            FrameKind::Json => self.handle_json(envelope.payload).await?,
            FrameKind::MixedAudio => self.handle_mixed_audio(envelope.payload).await?,
            FrameKind::ParticipantAudio => self.handle_participant_audio(envelope.payload).await?,
            FrameKind::Video => self.stats.video_frames += 1,
            FrameKind::EncodedVideo => self.stats.encoded_video_chunks += 1,
            FrameKind::Unknown(tag) => {
                self.stats.unknown_frames += 1;
                if self.logged_unknown_frame_types.insert(tag) {
                    log::warn!("session {}: unknown frame type {}", self.id, tag);
                }
            }
        }
        Ok(())
    }

    async fn handle_json(&mut self, payload: &[u8]) -> IngestResult<()> {
        self.stats.json_messages += 1;
        let text = String::from_utf8_lossy(payload).into_owned();
        self.append_telemetry(&text).await?;

        let value: Value = match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("session {}: unparseable JSON: {}", self.id, e);
                return Ok(());
            }
        };

        if self.meeting_url.is_none() {
            if let Some(url) = extract_meeting_url(&value) {
                self.meeting_url = Some(url);
            }
        }

        match parse_event(&value) {
            SessionEvent::SessionStarted { meeting_url, bot_name } => {
                if self.meeting_url.is_none() {
                    self.meeting_url = meeting_url;
                }
                if self.bot_name.is_none() {
                    self.bot_name = bot_name;
                }
            }
            SessionEvent::AudioFormatUpdate { format } => {
                if let Some(valid) = format.validate() {
                    let is_first = self.audio_format.is_none();
                    if let Some(existing) = &self.audio_format {
                        if *existing != valid {
                            log::warn!(
                                "session {}: AudioFormatUpdate changed mid-stream ({:?} -> {:?})",
                                self.id, existing, valid
                            );
                        }
                    }
                    self.audio_format = Some(valid);
                    if is_first {
                        self.drain_pending().await?;
                    }
                }
            }
            SessionEvent::UsersUpdate { new_users, updated_users } => {
                for u in new_users.into_iter().chain(updated_users) {
                    self.participant_info.insert(
                        u.device_id.clone(),
                        ParticipantInfo {
                            device_id: u.device_id,
                            display_name: u.display_name,
                            full_name: u.full_name,
                            is_current_user: u.is_current_user,
                        },
                    );
                }
            }
            SessionEvent::MeetingStatusChange { change } => {
                if change == "removed_from_meeting" {
                    self.requested_close_reason = Some("removed_from_meeting".to_string());
                }
            }
            SessionEvent::Passthrough => {}
        }
        Ok(())
    }

    async fn handle_mixed_audio(&mut self, payload: &[u8]) -> IngestResult<()> {
        if payload.len() % 4 != 0 {
            self.stats.unknown_frames += 1;
            log::warn!("session {}: mixed audio payload not a multiple of 4 bytes", self.id);
            return Ok(());
        }
        self.stats.mixed_audio_frames += 1;
        if !self.flags.enable_mixed_audio {
            return Ok(());
        }

        match self.audio_format.clone() {
            None => {
                if !self.warned_pending_mixed {
                    log::warn!("session {}: buffering mixed audio before AudioFormat is known", self.id);
                    self.warned_pending_mixed = true;
                }
                self.pending_mixed.push(payload.to_vec(), self.flags.pending_buffer_cap_bytes);
            }
            Some(format) => {
                self.ensure_mixed_writer(&format).await?;
                let pcm = float32_payload_to_int16_le(payload);
                if let Some(writer) = self.mixed_writer.as_mut() {
                    writer.write(&pcm).await?;
                }
            }
        }
        Ok(())
    }

    async fn handle_participant_audio(&mut self, payload: &[u8]) -> IngestResult<()> {
        let Some(env) = decode_participant_envelope(payload) else {
            self.stats.unknown_frames += 1;
            log::warn!("session {}: malformed ParticipantAudio envelope", self.id);
            return Ok(());
        };
        if env.audio.len() % 4 != 0 {
            self.stats.unknown_frames += 1;
            log::warn!("session {}: participant audio payload not a multiple of 4 bytes", self.id);
            return Ok(());
        }
        self.stats.participant_audio_frames += 1;
        if env.audio.is_empty() || !self.flags.enable_per_participant_audio {
            return Ok(());
        }

        let participant_id = env.participant_id;
        match self.audio_format.clone() {
            None => {
                if self.warned_pending_participant.insert(participant_id.clone()) {
                    log::warn!(
                        "session {}: buffering participant {} audio before AudioFormat is known",
                        self.id, participant_id
                    );
                }
                self.pending_participants.push(
                    &participant_id,
                    env.audio.to_vec(),
                    self.flags.pending_buffer_cap_bytes,
                );
            }
            Some(format) => {
                self.ensure_participant_writer(&participant_id, &format).await?;
                let pcm = float32_payload_to_int16_le(env.audio);
                if let Some(pw) = self.participant_writers.get_mut(&participant_id) {
                    pw.writer.write(&pcm).await?;
                }
            }
        }
        Ok(())
    }

    /// Drains buffered pre-format audio in insertion order: mixed first,
    /// then each participant in its observed order (§4.5).
    async fn drain_pending(&mut self) -> IngestResult<()> {
        let format = self
            .audio_format
            .clone()
            .expect("drain_pending called only once a valid AudioFormat is known");

        let mixed_frames = std::mem::take(&mut self.pending_mixed.frames);
        self.pending_mixed.total_bytes = 0;
        for payload in mixed_frames {
            self.ensure_mixed_writer(&format).await?;
            let pcm = float32_payload_to_int16_le(&payload);
            if let Some(writer) = self.mixed_writer.as_mut() {
                writer.write(&pcm).await?;
            }
        }

        for (participant_id, frames) in self.pending_participants.drain_in_order() {
            for payload in frames {
                self.ensure_participant_writer(&participant_id, &format).await?;
                let pcm = float32_payload_to_int16_le(&payload);
                if let Some(pw) = self.participant_writers.get_mut(&participant_id) {
                    pw.writer.write(&pcm).await?;
                }
            }
        }
        Ok(())
    }

    async fn ensure_mixed_writer(&mut self, format: &AudioFormat) -> IngestResult<()> {
        if self.mixed_writer.is_some() {
            return Ok(());
        }
        let path = self.base_dir.join(MIXED_AUDIO_FILE_NAME);
        let writer = PcmWriter::create(&path, format).await?;
        self.mixed_relative_file = Some(MIXED_AUDIO_FILE_NAME.to_string());
        self.mixed_writer = Some(writer);
        Ok(())
    }

    async fn ensure_participant_writer(
        &mut self,
        participant_id: &str,
        format: &AudioFormat,
    ) -> IngestResult<()> {
        if self.participant_writers.contains_key(participant_id) {
            return Ok(());
        }

        let info = self.participant_info.get(participant_id);
        let name = labeling::name_source(
            info.and_then(|i| i.full_name.as_deref()),
            info.and_then(|i| i.display_name.as_deref()),
        );
        let existing_labels: HashSet<String> = self
            .participant_writers
            .values()
            .map(|w| w.label.clone())
            .collect();
        let label = labeling::derive_label(participant_id, name, &existing_labels);

        let relative_file = format!("{PARTICIPANTS_DIR_NAME}/{label}/combined_{label}.wav");
        let path = self.base_dir.join(&relative_file);
        let writer = PcmWriter::create(&path, format).await?;

        self.participant_writers.insert(
            participant_id.to_string(),
            ParticipantWriter {
                label,
                writer,
                relative_file,
            },
        );
        Ok(())
    }

    async fn append_telemetry(&mut self, line: &str) -> IngestResult<()> {
        if let Some(file) = self.telemetry.as_mut() {
            file.write_all(line.as_bytes()).await?;
            file.write_all(b"\n").await?;
        }
        Ok(())
    }

    /// Idempotent finalisation: marks the session closed, closes all
    /// writers, freezes metadata, and writes `session-summary.json` to
    /// the live directory. A second call is a no-op that returns the
    /// outcome recorded by the first.
    pub async fn close(&mut self, reason: &str, error: Option<String>) -> IngestResult<SessionCloseOutcome> {
        if let Some(outcome) = &self.close_outcome {
            return Ok(outcome.clone());
        }
        self.closed = true;

        let now = Instant::now();
        let duration_ms = now.duration_since(self.start_instant).as_millis() as u64;
        let idle_ms_before_close = now.duration_since(self.last_frame_instant).as_millis() as u64;

        if !self.pending_mixed.is_empty() || !self.pending_participants.is_empty() {
            log::warn!(
                "session {}: discarding buffered pre-format audio at close (format never arrived)",
                self.id
            );
        }

        if let Some(writer) = self.mixed_writer.as_mut() {
            if let Err(e) = writer.close().await {
                log::error!("session {}: failed to close mixed writer: {}", self.id, e);
            }
        }
        for pw in self.participant_writers.values_mut() {
            if let Err(e) = pw.writer.close().await {
                log::error!("session {}: failed to close participant writer {}: {}", self.id, pw.label, e);
            }
        }
        if let Some(mut telemetry) = self.telemetry.take() {
            let _ = telemetry.flush().await;
        }

        let audio_files = AudioFilesMeta {
            mixed: self.mixed_relative_file.clone(),
            participants: self
                .participant_writers
                .values()
                .map(|pw| (pw.label.clone(), vec![pw.relative_file.clone()]))
                .collect(),
        };
        let metadata = SessionMetadata {
            meeting_url: self.meeting_url.clone(),
            bot_name: self.bot_name.clone(),
            audio_format: self.audio_format.clone(),
            audio_files,
            participants: self.participant_info.values().cloned().collect(),
        };
        let summary = SessionSummary {
            session_id: self.id.to_string(),
            reason: reason.to_string(),
            duration_ms,
            idle_ms_before_close,
            stats: self.stats.clone(),
            metadata,
            error,
            archive_path: None,
            manifest_path: None,
        };

        let summary_path = self.base_dir.join(SUMMARY_FILE_NAME);
        write_summary_file(&summary_path, &summary).await?;

        let outcome = SessionCloseOutcome {
            session_id: self.id,
            base_dir: self.base_dir.clone(),
            meeting_url: self.meeting_url.clone(),
            started_at_iso: self.started_at_iso.clone(),
            summary_path,
        };
        self.close_outcome = Some(outcome.clone());
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags() -> SessionFeatureFlags {
        SessionFeatureFlags::default()
    }

    fn json_frame(value: &Value) -> Vec<u8> {
        let mut out = 1i32.to_le_bytes().to_vec();
        out.extend_from_slice(value.to_string().as_bytes());
        out
    }

    fn mixed_frame(samples: &[f32]) -> Vec<u8> {
        let mut out = 3i32.to_le_bytes().to_vec();
        for s in samples {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }

    fn participant_frame(id: &str, samples: &[f32]) -> Vec<u8> {
        let mut out = 5i32.to_le_bytes().to_vec();
        out.push(id.len() as u8);
        out.extend_from_slice(id.as_bytes());
        for s in samples {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }

    #[tokio::test]
    async fn happy_path_mixed_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(Uuid::new_v4(), dir.path(), flags()).await.unwrap();

        session
            .handle_message(&json_frame(&serde_json::json!({
                "type": "SessionStarted", "meetingUrl": "https://meet.example/xyz"
            })))
            .await
            .unwrap();
        session
            .handle_message(&json_frame(&serde_json::json!({
                "type": "AudioFormatUpdate", "format": {"sampleRate": 48000, "numberOfChannels": 1}
            })))
            .await
            .unwrap();

        let silence = vec![0.0f32; 480];
        for _ in 0..10 {
            session.handle_message(&mixed_frame(&silence)).await.unwrap();
        }

        let base_dir = session.base_dir().to_path_buf();
        session.close("client_close", None).await.unwrap();

        let mixed_path = base_dir.join(MIXED_AUDIO_FILE_NAME);
        let meta = tokio::fs::metadata(&mixed_path).await.unwrap();
        assert_eq!(meta.len(), 44 + 10 * 480 * 2);

        let telemetry = tokio::fs::read_to_string(base_dir.join(TELEMETRY_FILE_NAME)).await.unwrap();
        assert_eq!(telemetry.lines().count(), 2);
    }

    #[tokio::test]
    async fn buffered_participant_audio_drains_on_format() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(Uuid::new_v4(), dir.path(), flags()).await.unwrap();

        let ones = vec![1.0f32; 20];
        session.handle_message(&participant_frame("abc123", &ones)).await.unwrap();
        session
            .handle_message(&json_frame(&serde_json::json!({
                "type": "AudioFormatUpdate", "format": {"sampleRate": 16000, "numberOfChannels": 1}
            })))
            .await
            .unwrap();

        let base_dir = session.base_dir().to_path_buf();
        session.close("client_close", None).await.unwrap();

        let participants_dir = base_dir.join(PARTICIPANTS_DIR_NAME);
        let mut entries = tokio::fs::read_dir(&participants_dir).await.unwrap();
        let entry = entries.next_entry().await.unwrap().unwrap();
        let label_dir = entry.path();
        let wav_path = label_dir.join(format!("combined_{}.wav", entry.file_name().to_string_lossy()));
        let meta = tokio::fs::metadata(&wav_path).await.unwrap();
        assert_eq!(meta.len(), 44 + 40);

        let bytes = tokio::fs::read(&wav_path).await.unwrap();
        for chunk in bytes[44..].chunks(2) {
            assert_eq!(chunk, [0xFF, 0x7F]);
        }
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(Uuid::new_v4(), dir.path(), flags()).await.unwrap();
        let first = session.close("client_close", None).await.unwrap();
        let second = session.close("socket_error", Some("boom".into())).await.unwrap();
        assert_eq!(first.session_id, second.session_id);
        assert_eq!(first.summary_path, second.summary_path);

        let raw = tokio::fs::read_to_string(&first.summary_path).await.unwrap();
        let summary: SessionSummary = serde_json::from_str(&raw).unwrap();
        assert_eq!(summary.reason, "client_close");
    }

    #[tokio::test]
    async fn json_only_session_has_no_audio_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(Uuid::new_v4(), dir.path(), flags()).await.unwrap();
        session
            .handle_message(&json_frame(&serde_json::json!({"type": "SessionStarted"})))
            .await
            .unwrap();
        let outcome = session.close("client_close", None).await.unwrap();

        let raw = tokio::fs::read_to_string(&outcome.summary_path).await.unwrap();
        let summary: SessionSummary = serde_json::from_str(&raw).unwrap();
        assert!(summary.metadata.audio_files.mixed.is_none());
        assert!(summary.metadata.audio_files.participants.is_empty());
    }

    #[tokio::test]
    async fn zero_length_participant_id_is_distinct_participant() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(Uuid::new_v4(), dir.path(), flags()).await.unwrap();
        session
            .handle_message(&json_frame(&serde_json::json!({
                "type": "AudioFormatUpdate", "format": {"sampleRate": 8000}
            })))
            .await
            .unwrap();
        session.handle_message(&participant_frame("", &[1.0])).await.unwrap();
        let base_dir = session.base_dir().to_path_buf();
        session.close("client_close", None).await.unwrap();

        let participants_dir = base_dir.join(PARTICIPANTS_DIR_NAME);
        let mut entries = tokio::fs::read_dir(&participants_dir).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn removed_from_meeting_requests_close() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(Uuid::new_v4(), dir.path(), flags()).await.unwrap();
        session
            .handle_message(&json_frame(&serde_json::json!({
                "type": "MeetingStatusChange", "change": "removed_from_meeting"
            })))
            .await
            .unwrap();
        assert_eq!(session.take_requested_close().as_deref(), Some("removed_from_meeting"));
        assert_eq!(session.take_requested_close(), None);
    }
}
