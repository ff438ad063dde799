//! Binary WebSocket frame envelope parsing and PCM sample conversion.
//!
//! Every inbound message begins with a 4-byte little-endian signed integer
//! frame-type tag. [`decode_envelope`] splits the tag from the payload;
//! [`float32_payload_to_int16_le`] converts raw 32-bit float PCM to 16-bit
//! little-endian PCM as described for `MixedAudio`/`ParticipantAudio`.

use crate::protocol_constants::{
    FRAME_HEADER_LEN, FRAME_TYPE_ENCODED_VIDEO, FRAME_TYPE_JSON, FRAME_TYPE_MIXED_AUDIO,
    FRAME_TYPE_PARTICIPANT_AUDIO, FRAME_TYPE_VIDEO, PARTICIPANT_ID_LEN_HEADER,
};

/// A frame whose 4-byte type tag has been read but whose payload is
/// otherwise uninterpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Json,
    Video,
    MixedAudio,
    EncodedVideo,
    ParticipantAudio,
    Unknown(i32),
}

impl FrameKind {
    fn from_tag(tag: i32) -> Self {
        match tag {
            FRAME_TYPE_JSON => Self::Json,
            FRAME_TYPE_VIDEO => Self::Video,
            FRAME_TYPE_MIXED_AUDIO => Self::MixedAudio,
            FRAME_TYPE_ENCODED_VIDEO => Self::EncodedVideo,
            FRAME_TYPE_PARTICIPANT_AUDIO => Self::ParticipantAudio,
            other => Self::Unknown(other),
        }
    }
}

/// A decoded frame envelope: the recognised kind plus the payload bytes
/// following the 4-byte header.
pub struct Envelope<'a> {
    pub kind: FrameKind,
    pub payload: &'a [u8],
}

/// Splits the 4-byte little-endian type tag from the frame payload.
///
/// Returns `None` if the frame is shorter than the header; callers treat
/// that as a malformed frame and bump the unknown-frames counter.
pub fn decode_envelope(raw: &[u8]) -> Option<Envelope<'_>> {
    if raw.len() < FRAME_HEADER_LEN {
        return None;
    }
    let tag = i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
    Some(Envelope {
        kind: FrameKind::from_tag(tag),
        payload: &raw[FRAME_HEADER_LEN..],
    })
}

/// A decoded `ParticipantAudio` sub-envelope: the participant id and the
/// float PCM payload that follows it.
pub struct ParticipantEnvelope<'a> {
    pub participant_id: String,
    pub audio: &'a [u8],
}

/// Decodes the `idLen (uint8)` + id bytes + audio sub-envelope of a
/// `ParticipantAudio` frame payload.
///
/// Returns `None` when the payload is shorter than `1 + idLen` bytes.
pub fn decode_participant_envelope(payload: &[u8]) -> Option<ParticipantEnvelope<'_>> {
    if payload.is_empty() {
        return None;
    }
    let id_len = payload[0] as usize;
    if payload.len() < PARTICIPANT_ID_LEN_HEADER + id_len {
        return None;
    }
    let id_bytes = &payload[PARTICIPANT_ID_LEN_HEADER..PARTICIPANT_ID_LEN_HEADER + id_len];
    let participant_id = String::from_utf8_lossy(id_bytes).into_owned();
    let audio = &payload[PARTICIPANT_ID_LEN_HEADER + id_len..];
    Some(ParticipantEnvelope {
        participant_id,
        audio,
    })
}

/// Converts a buffer of little-endian IEEE-754 float32 PCM samples to
/// little-endian signed int16 PCM, clamping to `[-1, 1]` and treating
/// non-finite values as silence.
///
/// Trailing bytes that don't form a complete 4-byte sample are dropped;
/// callers that care about that case should check `payload.len() % 4`
/// before calling and account it as an unknown frame.
#[must_use]
pub fn float32_payload_to_int16_le(payload: &[u8]) -> Vec<u8> {
    let sample_count = payload.len() / 4;
    let mut out = Vec::with_capacity(sample_count * 2);
    for chunk in payload.chunks_exact(4) {
        let f = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let sample = convert_sample(f);
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}

/// Converts a single float32 sample to a clamped, rounded int16 sample.
fn convert_sample(f: f32) -> i16 {
    let f = if f.is_finite() { f } else { 0.0 };
    let clamped = f.clamp(-1.0, 1.0);
    (clamped * 32767.0).round() as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    mod decode_envelope {
        use super::*;

        #[test]
        fn short_frame_is_rejected() {
            assert!(decode_envelope(&[0, 1, 2]).is_none());
        }

        #[test]
        fn recognises_json_tag() {
            let raw = [1, 0, 0, 0, b'{', b'}'];
            let env = decode_envelope(&raw).unwrap();
            assert_eq!(env.kind, FrameKind::Json);
            assert_eq!(env.payload, b"{}");
        }

        #[test]
        fn unknown_tag_is_preserved() {
            let raw = [99, 0, 0, 0];
            let env = decode_envelope(&raw).unwrap();
            assert_eq!(env.kind, FrameKind::Unknown(99));
        }
    }

    mod decode_participant_envelope {
        use super::*;

        #[test]
        fn parses_id_and_audio() {
            let payload = [3, b'a', b'b', b'c', 0xAA, 0xBB];
            let env = decode_participant_envelope(&payload).unwrap();
            assert_eq!(env.participant_id, "abc");
            assert_eq!(env.audio, &[0xAA, 0xBB]);
        }

        #[test]
        fn zero_id_len_yields_empty_participant_id() {
            let payload = [0, 0xAA, 0xBB];
            let env = decode_participant_envelope(&payload).unwrap();
            assert_eq!(env.participant_id, "");
            assert_eq!(env.audio, &[0xAA, 0xBB]);
        }

        #[test]
        fn truncated_id_is_rejected() {
            let payload = [5, b'a', b'b'];
            assert!(decode_participant_envelope(&payload).is_none());
        }

        #[test]
        fn empty_payload_is_rejected() {
            assert!(decode_participant_envelope(&[]).is_none());
        }
    }

    mod float_conversion {
        use super::*;

        #[test]
        fn silence_round_trips_to_zero() {
            let payload = 0.0f32.to_le_bytes();
            let out = float32_payload_to_int16_le(&payload);
            assert_eq!(out, [0, 0]);
        }

        #[test]
        fn full_scale_positive_clamps_to_max() {
            let payload = 1.0f32.to_le_bytes();
            let out = float32_payload_to_int16_le(&payload);
            assert_eq!(i16::from_le_bytes([out[0], out[1]]), 32767);
        }

        #[test]
        fn over_range_value_clamps() {
            let payload = 2.5f32.to_le_bytes();
            let out = float32_payload_to_int16_le(&payload);
            assert_eq!(i16::from_le_bytes([out[0], out[1]]), 32767);
        }

        #[test]
        fn negative_full_scale_clamps_to_min() {
            let payload = (-1.0f32).to_le_bytes();
            let out = float32_payload_to_int16_le(&payload);
            assert_eq!(i16::from_le_bytes([out[0], out[1]]), -32767);
        }

        #[test]
        fn nan_becomes_zero() {
            let payload = f32::NAN.to_le_bytes();
            let out = float32_payload_to_int16_le(&payload);
            assert_eq!(out, [0, 0]);
        }

        #[test]
        fn infinity_becomes_zero() {
            let payload = f32::INFINITY.to_le_bytes();
            let out = float32_payload_to_int16_le(&payload);
            assert_eq!(out, [0, 0]);
        }

        #[test]
        fn sample_count_matches_payload_len_div_4() {
            let mut payload = Vec::new();
            for v in [0.0f32, 0.5, -0.5, 1.0] {
                payload.extend_from_slice(&v.to_le_bytes());
            }
            let out = float32_payload_to_int16_le(&payload);
            assert_eq!(out.len(), 2 * (payload.len() / 4));
        }
    }
}
