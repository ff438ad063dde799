//! Fixed protocol constants that should NOT be changed.
//!
//! These values are defined by the wire protocol and the container file
//! format; changing them would break compatibility with existing archives
//! or with the browser-side agent.

// ─────────────────────────────────────────────────────────────────────────────
// Frame Envelope
// ─────────────────────────────────────────────────────────────────────────────

/// Frame type tag for a JSON telemetry/event message.
pub const FRAME_TYPE_JSON: i32 = 1;
/// Frame type tag for raw (unencoded) video; counted and discarded.
pub const FRAME_TYPE_VIDEO: i32 = 2;
/// Frame type tag for mixed-channel float32 PCM audio.
pub const FRAME_TYPE_MIXED_AUDIO: i32 = 3;
/// Frame type tag for encoded video chunks; counted and discarded.
pub const FRAME_TYPE_ENCODED_VIDEO: i32 = 4;
/// Frame type tag for per-participant float32 PCM audio.
pub const FRAME_TYPE_PARTICIPANT_AUDIO: i32 = 5;

/// Size of the frame type header (4-byte little-endian signed integer).
pub const FRAME_HEADER_LEN: usize = 4;

/// Size of the `idLen` prefix in a ParticipantAudio sub-envelope.
pub const PARTICIPANT_ID_LEN_HEADER: usize = 1;

/// Width in bytes of one float32 PCM sample on the wire.
pub const FLOAT_SAMPLE_BYTES: usize = 4;

/// Width in bytes of one int16 PCM sample once converted.
pub const INT16_SAMPLE_BYTES: usize = 2;

// ─────────────────────────────────────────────────────────────────────────────
// PCM Container Format
// ─────────────────────────────────────────────────────────────────────────────

/// Size of the fixed PCM container header (see `pcm::write_header`).
pub const WAV_HEADER_LEN: u64 = 44;

/// PCM format code written into the `fmt ` subchunk.
pub const WAV_FORMAT_PCM: u16 = 1;

/// Bits per sample written into the container (always 16 after conversion).
pub const WAV_BITS_PER_SAMPLE: u16 = 16;

// ─────────────────────────────────────────────────────────────────────────────
// Session Timing
// ─────────────────────────────────────────────────────────────────────────────

/// Default inactivity window before a session is closed with reason
/// `inactivity_timeout` (design default: 5 minutes).
pub const DEFAULT_INACTIVITY_TIMEOUT_SECS: u64 = 5 * 60;

/// Default cap on buffered pre-format audio per source, expressed as
/// seconds of audio at a conservative sample-rate fallback used only to
/// size the cap before the real format is known.
pub const PENDING_BUFFER_FALLBACK_SAMPLE_RATE: u32 = 48_000;

/// Number of seconds of audio the pending buffer may hold before the
/// oldest buffered chunk is dropped.
pub const PENDING_BUFFER_MAX_SECONDS: u64 = 30;

/// Interval between inactivity-timeout checks in the acceptor's main
/// loop. Independent of `inactivityTimeoutSecs` itself.
pub const INACTIVITY_CHECK_INTERVAL_SECS: u64 = 5;

// ─────────────────────────────────────────────────────────────────────────────
// Filesystem Layout
// ─────────────────────────────────────────────────────────────────────────────

/// Name of the subdirectory holding in-progress sessions.
pub const LIVE_DIR_NAME: &str = "live";

/// Name of the subdirectory holding sealed, archived sessions.
pub const COMPLETED_DIR_NAME: &str = "completed";

/// Name of the per-session telemetry log file.
pub const TELEMETRY_FILE_NAME: &str = "telemetry.ndjson";

/// Name of the per-session summary file.
pub const SUMMARY_FILE_NAME: &str = "session-summary.json";

/// Name of the mixed-channel audio container.
pub const MIXED_AUDIO_FILE_NAME: &str = "mixed_audio.wav";

/// Name of the per-session archive manifest file.
pub const MANIFEST_FILE_NAME: &str = "archive.json";

/// Name of the subdirectory holding per-participant audio.
pub const PARTICIPANTS_DIR_NAME: &str = "participants";

// ─────────────────────────────────────────────────────────────────────────────
// Application Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Application name used in logging and manifests.
pub const APP_NAME: &str = "Meetcap";

/// Service identifier used for health/identity checks.
pub const SERVICE_ID: &str = "meetcap";

/// Default inbound listener port.
pub const DEFAULT_PORT: u16 = 8765;

// ─────────────────────────────────────────────────────────────────────────────
// Audio file extensions recognised by the post-archive pipeline
// ─────────────────────────────────────────────────────────────────────────────

/// Extensions the archiver's audio walk treats as transcribable media.
pub const TRANSCRIBABLE_AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "m4a", "flac", "ogg"];
