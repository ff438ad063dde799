//! Audio format negotiation (`AudioFormatUpdate` handling, §4.5).

use serde::{Deserialize, Serialize};

/// Format of the PCM audio carried in `MixedAudio`/`ParticipantAudio` frames,
/// as negotiated by the first valid `AudioFormatUpdate` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub sample_rate: u32,
    #[serde(default = "default_channels")]
    pub number_of_channels: u32,
    #[serde(default)]
    pub number_of_frames: Option<u64>,
    #[serde(default)]
    pub format_tag: Option<String>,
}

fn default_channels() -> u32 {
    1
}

/// Raw shape of the `format` object inside an `AudioFormatUpdate` event,
/// used only to validate before promoting to [`AudioFormat`].
#[derive(Debug, Deserialize)]
pub struct RawAudioFormat {
    #[serde(rename = "sampleRate")]
    pub sample_rate: Option<f64>,
    #[serde(rename = "numberOfChannels")]
    pub number_of_channels: Option<f64>,
    #[serde(rename = "numberOfFrames")]
    pub number_of_frames: Option<f64>,
    pub format: Option<String>,
}

impl RawAudioFormat {
    /// Validates and converts into an [`AudioFormat`].
    ///
    /// A format is valid iff `sampleRate` is a positive number;
    /// `numberOfChannels` defaults to 1 when absent.
    #[must_use]
    pub fn validate(self) -> Option<AudioFormat> {
        let sample_rate = self.sample_rate?;
        if !(sample_rate > 0.0) {
            return None;
        }
        let number_of_channels = self
            .number_of_channels
            .filter(|c| *c > 0.0)
            .map(|c| c as u32)
            .unwrap_or(1);
        Some(AudioFormat {
            sample_rate: sample_rate as u32,
            number_of_channels,
            number_of_frames: self.number_of_frames.map(|n| n as u64),
            format_tag: self.format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_sample_rate_is_valid() {
        let raw = RawAudioFormat {
            sample_rate: Some(48000.0),
            number_of_channels: None,
            number_of_frames: None,
            format: None,
        };
        let format = raw.validate().unwrap();
        assert_eq!(format.sample_rate, 48000);
        assert_eq!(format.number_of_channels, 1);
    }

    #[test]
    fn zero_sample_rate_is_invalid() {
        let raw = RawAudioFormat {
            sample_rate: Some(0.0),
            number_of_channels: None,
            number_of_frames: None,
            format: None,
        };
        assert!(raw.validate().is_none());
    }

    #[test]
    fn missing_sample_rate_is_invalid() {
        let raw = RawAudioFormat {
            sample_rate: None,
            number_of_channels: Some(2.0),
            number_of_frames: None,
            format: None,
        };
        assert!(raw.validate().is_none());
    }

    #[test]
    fn negative_sample_rate_is_invalid() {
        let raw = RawAudioFormat {
            sample_rate: Some(-100.0),
            number_of_channels: None,
            number_of_frames: None,
            format: None,
        };
        assert!(raw.validate().is_none());
    }

    #[test]
    fn channels_default_to_one() {
        let raw = RawAudioFormat {
            sample_rate: Some(16000.0),
            number_of_channels: Some(0.0),
            number_of_frames: None,
            format: None,
        };
        assert_eq!(raw.validate().unwrap().number_of_channels, 1);
    }
}
