//! Streaming PCM container writer (§4.2).
//!
//! Writes a fixed 44-byte header placeholder up front, appends raw 16-bit
//! little-endian PCM as it arrives, and rewrites the header in place on
//! `close()` once the final byte count is known. Grounded on the header
//! layout from `stream::wav::create_wav_header`, adapted to async
//! streaming I/O (`tokio::fs::File` + `AsyncSeekExt`) instead of a single
//! in-memory header for an infinite stream.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use bytes::{BufMut, BytesMut};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

use crate::error::IngestResult;
use crate::format::AudioFormat;
use crate::protocol_constants::{WAV_BITS_PER_SAMPLE, WAV_FORMAT_PCM, WAV_HEADER_LEN};

/// Builds the 44-byte container header for `channels`/`sample_rate`/`data_len`.
///
/// `channels` and `sample_rate` are clamped to a minimum of 1, matching the
/// writer's guarantee that a zero or absent value never escapes into the
/// container.
fn build_header(channels: u32, sample_rate: u32, data_len: u32) -> BytesMut {
    let channels = channels.max(1).min(u16::MAX as u32) as u16;
    let sample_rate = sample_rate.max(1);
    let bytes_per_sample = (WAV_BITS_PER_SAMPLE / 8) as u32;
    let byte_rate = sample_rate * channels as u32 * bytes_per_sample;
    let block_align = channels * bytes_per_sample as u16;

    let mut header = BytesMut::with_capacity(WAV_HEADER_LEN as usize);
    header.put_slice(b"RIFF");
    header.put_u32_le(36 + data_len);
    header.put_slice(b"WAVE");
    header.put_slice(b"fmt ");
    header.put_u32_le(16);
    header.put_u16_le(WAV_FORMAT_PCM);
    header.put_u16_le(channels);
    header.put_u32_le(sample_rate);
    header.put_u32_le(byte_rate);
    header.put_u16_le(block_align);
    header.put_u16_le(WAV_BITS_PER_SAMPLE);
    header.put_slice(b"data");
    header.put_u32_le(data_len);
    header
}

/// A single PCM container file, owned by exactly one writer.
///
/// Not `Send`-shared by design: each session drives its writers from a
/// single task, matching the single-writer concurrency model.
pub struct PcmWriter {
    path: PathBuf,
    file: File,
    channels: u32,
    sample_rate: u32,
    bytes_written: u64,
    closed: bool,
}

impl PcmWriter {
    /// Creates the container file, writing a zero-length placeholder header.
    ///
    /// Creates the parent directory if it doesn't already exist.
    pub async fn create(path: impl AsRef<Path>, format: &AudioFormat) -> IngestResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .await?;

        let header = build_header(format.number_of_channels, format.sample_rate, 0);
        file.write_all(&header).await?;

        Ok(Self {
            path,
            file,
            channels: format.number_of_channels,
            sample_rate: format.sample_rate,
            bytes_written: 0,
            closed: false,
        })
    }

    /// Path of the underlying container file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of PCM data bytes written so far (excludes the header).
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Appends `buffer` verbatim to the data region.
    pub async fn write(&mut self, buffer: &[u8]) -> IngestResult<()> {
        if buffer.is_empty() {
            return Ok(());
        }
        self.file.write_all(buffer).await?;
        self.bytes_written += buffer.len() as u64;
        Ok(())
    }

    /// Flushes and rewrites the header with the final data length.
    ///
    /// Idempotent: calling `close()` more than once is a no-op after the
    /// first call succeeds.
    pub async fn close(&mut self) -> IngestResult<()> {
        if self.closed {
            return Ok(());
        }
        self.file.flush().await?;

        let data_len = self.bytes_written.min(u32::MAX as u64) as u32;
        let header = build_header(self.channels, self.sample_rate, data_len);
        self.file.seek(SeekFrom::Start(0)).await?;
        self.file.write_all(&header).await?;
        self.file.flush().await?;
        self.file.seek(SeekFrom::End(0)).await?;

        self.closed = true;
        Ok(())
    }

    /// Whether `close()` has already completed for this writer.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    fn silence_format(sample_rate: u32, channels: u32) -> AudioFormat {
        AudioFormat {
            sample_rate,
            number_of_channels: channels,
            number_of_frames: None,
            format_tag: None,
        }
    }

    async fn read_all(path: &Path) -> Vec<u8> {
        let mut file = File::open(path).await.unwrap();
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn empty_close_produces_zero_data_container() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed_audio.wav");
        let mut writer = PcmWriter::create(&path, &silence_format(48000, 1)).await.unwrap();
        writer.close().await.unwrap();

        let bytes = read_all(&path).await;
        assert_eq!(bytes.len(), 44);
        let data_len = u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]);
        assert_eq!(data_len, 0);
    }

    #[tokio::test]
    async fn header_data_len_matches_bytes_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed_audio.wav");
        let mut writer = PcmWriter::create(&path, &silence_format(16000, 1)).await.unwrap();
        writer.write(&[0u8; 40]).await.unwrap();
        writer.close().await.unwrap();

        let bytes = read_all(&path).await;
        assert_eq!(bytes.len(), 44 + 40);
        let data_len = u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]);
        assert_eq!(data_len, 40);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed_audio.wav");
        let mut writer = PcmWriter::create(&path, &silence_format(48000, 1)).await.unwrap();
        writer.write(&[1, 2, 3, 4]).await.unwrap();
        writer.close().await.unwrap();
        let first = read_all(&path).await;
        writer.close().await.unwrap();
        let second = read_all(&path).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn header_fields_are_bit_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed_audio.wav");
        let mut writer = PcmWriter::create(&path, &silence_format(48000, 1)).await.unwrap();
        writer.write(&[0u8; 100]).await.unwrap();
        writer.close().await.unwrap();

        let bytes = read_all(&path).await;
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(u32::from_le_bytes(bytes[16..20].try_into().unwrap()), 16);
        assert_eq!(u16::from_le_bytes(bytes[20..22].try_into().unwrap()), 1);
        assert_eq!(u16::from_le_bytes(bytes[22..24].try_into().unwrap()), 1);
        assert_eq!(u32::from_le_bytes(bytes[24..28].try_into().unwrap()), 48000);
        assert_eq!(u32::from_le_bytes(bytes[28..32].try_into().unwrap()), 96000);
        assert_eq!(u16::from_le_bytes(bytes[32..34].try_into().unwrap()), 2);
        assert_eq!(u16::from_le_bytes(bytes[34..36].try_into().unwrap()), 16);
        assert_eq!(&bytes[36..40], b"data");
    }

    #[tokio::test]
    async fn zero_channels_and_rate_are_clamped_to_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed_audio.wav");
        let mut writer = PcmWriter::create(&path, &silence_format(0, 0)).await.unwrap();
        writer.close().await.unwrap();

        let bytes = read_all(&path).await;
        assert_eq!(u32::from_le_bytes(bytes[24..28].try_into().unwrap()), 1);
        assert_eq!(u16::from_le_bytes(bytes[22..24].try_into().unwrap()), 1);
    }
}
