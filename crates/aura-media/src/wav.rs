//! PCM WAV container for narration audio.
//!
//! Providers return raw little-endian 16-bit PCM; the container is written
//! here and its duration is always derived from the frame count.

use std::path::Path;

use aura_models::encoding::{AUDIO_BITS_PER_SAMPLE, AUDIO_CHANNELS, AUDIO_SAMPLE_RATE};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::{MediaError, MediaResult};

/// Layout of raw PCM bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self {
            sample_rate: AUDIO_SAMPLE_RATE,
            channels: AUDIO_CHANNELS,
        }
    }
}

impl PcmFormat {
    fn spec(&self) -> WavSpec {
        WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: AUDIO_BITS_PER_SAMPLE,
            sample_format: SampleFormat::Int,
        }
    }

    /// Bytes in one frame (one sample per channel).
    pub fn frame_bytes(&self) -> usize {
        self.channels as usize * (AUDIO_BITS_PER_SAMPLE as usize / 8)
    }

    /// Duration of `len` bytes of raw PCM in this format.
    pub fn duration_of(&self, len: usize) -> f64 {
        let frames = len / self.frame_bytes().max(1);
        frames as f64 / self.sample_rate as f64
    }
}

/// Write raw 16-bit LE PCM into a WAV file, returning its duration in seconds.
pub fn write_pcm_wav(path: impl AsRef<Path>, pcm: &[u8], format: PcmFormat) -> MediaResult<f64> {
    if pcm.is_empty() {
        return Err(MediaError::invalid_audio("no PCM data"));
    }
    if pcm.len() % format.frame_bytes() != 0 {
        return Err(MediaError::invalid_audio(format!(
            "PCM length {} is not a multiple of the {}-byte frame",
            pcm.len(),
            format.frame_bytes()
        )));
    }

    let mut writer = WavWriter::create(path.as_ref(), format.spec())?;
    for sample in pcm.chunks_exact(2) {
        writer.write_sample(i16::from_le_bytes([sample[0], sample[1]]))?;
    }
    writer.finalize()?;

    read_wav_duration(path)
}

/// Async wrapper around [`write_pcm_wav`] that runs on the blocking pool.
pub async fn write_pcm_wav_async(
    path: impl AsRef<Path>,
    pcm: Vec<u8>,
    format: PcmFormat,
) -> MediaResult<f64> {
    let path = path.as_ref().to_path_buf();
    tokio::task::spawn_blocking(move || write_pcm_wav(&path, &pcm, format))
        .await
        .map_err(|e| MediaError::internal(format!("WAV writer task failed: {}", e)))?
}

/// Duration of a WAV file from its header: frames ÷ sample rate.
pub fn read_wav_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(MediaError::invalid_audio("zero sample rate"));
    }
    Ok(reader.duration() as f64 / spec.sample_rate as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn silence(seconds: f64) -> Vec<u8> {
        let frames = (AUDIO_SAMPLE_RATE as f64 * seconds) as usize;
        vec![0u8; frames * 2]
    }

    #[test]
    fn test_duration_from_frame_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.wav");

        let duration = write_pcm_wav(&path, &silence(1.5), PcmFormat::default()).unwrap();
        assert!((duration - 1.5).abs() < 1e-9);

        let reader = WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().bits_per_sample, 16);
        assert_eq!(reader.spec().sample_rate, 24_000);
    }

    #[test]
    fn test_samples_are_little_endian() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("b.wav");
        write_pcm_wav(&path, &[0x34, 0x12, 0xff, 0xff], PcmFormat::default()).unwrap();

        let mut reader = WavReader::open(&path).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
        assert_eq!(samples, vec![0x1234, -1]);
    }

    #[test]
    fn test_rejects_empty_and_partial_frames() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("c.wav");
        assert!(matches!(
            write_pcm_wav(&path, &[], PcmFormat::default()),
            Err(MediaError::InvalidAudio(_))
        ));
        assert!(matches!(
            write_pcm_wav(&path, &[1, 2, 3], PcmFormat::default()),
            Err(MediaError::InvalidAudio(_))
        ));
    }

    #[test]
    fn test_missing_file_duration() {
        assert!(matches!(
            read_wav_duration("/definitely/not/here.wav"),
            Err(MediaError::FileNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_async_writer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("d.wav");
        let duration = write_pcm_wav_async(&path, silence(0.5), PcmFormat::default())
            .await
            .unwrap();
        assert!((duration - 0.5).abs() < 1e-9);
        assert!((PcmFormat::default().duration_of(48_000) - 1.0).abs() < 1e-9);
    }
}
