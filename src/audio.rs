//! Audio file loading and preprocessing
//!
//! Decodes audio files into the 16kHz mono f32 stream Whisper expects.
//! WAV goes through hound, compressed formats (MP3/FLAC/OGG) through
//! Symphonia. Decoding itself is entirely the codec libraries' concern;
//! this module only orchestrates downmix, resample, and pad/trim.

use hound::WavReader;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

/// Sample rate Whisper models are trained on
pub const SAMPLE_RATE: u32 = 16_000;

/// Samples in one 30-second Whisper decode window
pub const CHUNK_SAMPLES: usize = 30 * SAMPLE_RATE as usize;

/// Supported audio file extensions
pub const SUPPORTED_EXTENSIONS: &[&str] = &["flac", "mp3", "ogg", "wav"];

/// Errors that can occur while loading audio
#[derive(Debug, Error)]
pub enum AudioError {
    /// The file has no extension or one we cannot decode
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// The file could not be opened or read
    #[error("failed to open {path}: {source}")]
    Open {
        /// Audio file path
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// The codec library rejected the file contents
    #[error("failed to decode audio: {0}")]
    Decode(String),
}

/// Check if a file extension is one we can decode
#[must_use]
pub fn is_supported_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Load an audio file as 16kHz mono f32 samples in [-1.0, 1.0]
///
/// # Errors
/// Returns error if the format is unsupported or the file cannot be decoded
pub fn load_audio(path: &Path) -> Result<Vec<f32>, AudioError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .ok_or_else(|| AudioError::UnsupportedFormat(path.display().to_string()))?;

    let samples = match extension.as_str() {
        "wav" => load_wav(path)?,
        "mp3" | "flac" | "ogg" => load_compressed(path)?,
        other => return Err(AudioError::UnsupportedFormat(other.to_owned())),
    };

    tracing::debug!(
        path = %path.display(),
        samples = samples.len(),
        "audio loaded"
    );

    Ok(samples)
}

/// Pad with silence or truncate to exactly `len` samples
///
/// Mirrors Whisper's pad-or-trim step: language detection and single-window
/// decoding both operate on exactly one 30-second window ([`CHUNK_SAMPLES`]).
#[must_use]
pub fn pad_or_trim(samples: &[f32], len: usize) -> Vec<f32> {
    let mut out = samples.to_vec();
    out.resize(len, 0.0);
    out
}

#[allow(clippy::cast_precision_loss)]
fn load_wav(path: &Path) -> Result<Vec<f32>, AudioError> {
    let mut reader = WavReader::open(path).map_err(|e| AudioError::Decode(e.to_string()))?;
    let spec = reader.spec();

    tracing::debug!(
        sample_rate = spec.sample_rate,
        channels = spec.channels,
        bits = spec.bits_per_sample,
        "decoding wav"
    );

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AudioError::Decode(e.to_string()))?,
        (hound::SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|sample| f32::from(sample) / 32768.0))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AudioError::Decode(e.to_string()))?,
        (hound::SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|sample| sample as f32 / 2_147_483_648.0))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AudioError::Decode(e.to_string()))?,
        (_, bits) => {
            return Err(AudioError::Decode(format!(
                "unsupported wav bit depth: {bits}"
            )))
        }
    };

    let mono = downmix(&samples, usize::from(spec.channels));
    Ok(resample(&mono, spec.sample_rate, SAMPLE_RATE))
}

fn load_compressed(path: &Path) -> Result<Vec<f32>, AudioError> {
    let file = std::fs::File::open(path).map_err(|source| AudioError::Open {
        path: path.display().to_string(),
        source,
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::Decode(format!("failed to probe format: {e}")))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::Decode("no audio tracks found".to_owned()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| AudioError::Decode("could not determine sample rate".to_owned()))?;
    let channels = track.codec_params.channels.map_or(1, |c| c.count());
    let codec_params = track.codec_params.clone();

    tracing::debug!(sample_rate, channels, "decoding via symphonia");

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::Decode(format!("failed to create decoder: {e}")))?;

    let mut samples = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(AudioError::Decode(format!("failed to read packet: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .map_err(|e| AudioError::Decode(format!("failed to decode packet: {e}")))?;

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            let capacity = decoded.capacity() as u64;
            sample_buf = Some(SampleBuffer::<f32>::new(capacity, spec));
        }

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    let mono = downmix(&samples, channels);
    Ok(resample(&mono, sample_rate, SAMPLE_RATE))
}

/// Average interleaved channels down to mono
#[allow(clippy::cast_precision_loss)]
fn downmix(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Linear-interpolation resampler
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    tracing::debug!(from_rate, to_rate, "resampling");

    let ratio = f64::from(from_rate) / f64::from(to_rate);
    let new_len = (samples.len() as f64 / ratio) as usize;
    let mut resampled = Vec::with_capacity(new_len);

    for i in 0..new_len {
        let src_index = i as f64 * ratio;
        let floor = src_index.floor() as usize;
        let ceil = (floor + 1).min(samples.len() - 1);
        let fraction = (src_index - floor as f64) as f32;

        resampled.push(samples[floor] * (1.0 - fraction) + samples[ceil] * fraction);
    }

    resampled
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_test_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_is_supported_audio() {
        assert!(is_supported_audio(Path::new("clip.mp3")));
        assert!(is_supported_audio(Path::new("clip.WAV")));
        assert!(is_supported_audio(Path::new("clip.flac")));
        assert!(!is_supported_audio(Path::new("clip.txt")));
        assert!(!is_supported_audio(Path::new("clip")));
    }

    #[test]
    fn test_load_audio_unsupported_extension() {
        let result = load_audio(Path::new("/tmp/notes.txt"));
        assert!(matches!(result, Err(AudioError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_load_audio_missing_extension() {
        let result = load_audio(Path::new("/tmp/clip"));
        assert!(matches!(result, Err(AudioError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_load_wav_mono_16khz() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_test_wav(&path, SAMPLE_RATE, 1, &[0, 16384, -16384, 0]);

        let samples = load_audio(&path).unwrap();
        assert_eq!(samples.len(), 4);
        assert!((samples[1] - 0.5).abs() < 1e-4);
        assert!((samples[2] + 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_load_wav_stereo_downmix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        // 2 frames: (0.5, -0.5) and (0.25, 0.25)
        write_test_wav(&path, SAMPLE_RATE, 2, &[16384, -16384, 8192, 8192]);

        let samples = load_audio(&path).unwrap();
        assert_eq!(samples.len(), 2);
        assert!(samples[0].abs() < 1e-4);
        assert!((samples[1] - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_load_wav_resamples_to_16khz() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hi_rate.wav");
        // 1 second at 48kHz
        write_test_wav(&path, 48_000, 1, &vec![0i16; 48_000]);

        let samples = load_audio(&path).unwrap();
        let diff = samples.len().abs_diff(SAMPLE_RATE as usize);
        assert!(diff < 100, "expected ~16000 samples, got {}", samples.len());
    }

    #[test]
    fn test_load_wav_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.wav");
        std::fs::write(&path, b"not a riff header").unwrap();

        let result = load_audio(&path);
        assert!(matches!(result, Err(AudioError::Decode(_))));
    }

    #[test]
    fn test_load_mp3_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.mp3");
        std::fs::write(&path, b"definitely not mpeg frames").unwrap();

        let result = load_audio(&path);
        assert!(matches!(result, Err(AudioError::Decode(_))));
    }

    #[test]
    fn test_pad_or_trim_pads_short_input() {
        let samples = vec![0.5; 1000];
        let out = pad_or_trim(&samples, CHUNK_SAMPLES);
        assert_eq!(out.len(), CHUNK_SAMPLES);
        assert!((out[999] - 0.5).abs() < f32::EPSILON);
        assert_eq!(out[1000], 0.0);
    }

    #[test]
    fn test_pad_or_trim_trims_long_input() {
        let samples = vec![0.1; CHUNK_SAMPLES + 5000];
        let out = pad_or_trim(&samples, CHUNK_SAMPLES);
        assert_eq!(out.len(), CHUNK_SAMPLES);
    }

    #[test]
    fn test_pad_or_trim_exact_length_unchanged() {
        let samples = vec![0.2; CHUNK_SAMPLES];
        let out = pad_or_trim(&samples, CHUNK_SAMPLES);
        assert_eq!(out, samples);
    }

    #[test]
    fn test_downmix_mono_passthrough() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(downmix(&samples, 1), samples);
    }

    #[test]
    fn test_resample_identity() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(&samples, 16_000, 16_000), samples);
    }

    #[test]
    fn test_resample_halves_length() {
        let samples = vec![0.0; 32_000];
        let out = resample(&samples, 32_000, 16_000);
        assert!(out.len().abs_diff(16_000) < 10);
    }

    #[test]
    fn test_resample_empty() {
        let out = resample(&[], 48_000, 16_000);
        assert!(out.is_empty());
    }
}
