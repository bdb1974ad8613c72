use crate::audio::{self, CHUNK_SAMPLES};
use crate::transcription::language::LanguageScores;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Trait for transcription operations (enables testing via mocking)
///
/// Production code should use the concrete [`TranscriptionEngine`] type
/// directly; the trait exists for `MockTranscriptionInterface` (via
/// `mockall`) in orchestration tests.
#[cfg_attr(test, mockall::automock)]
#[allow(dead_code)]
trait TranscriptionInterface: Send + Sync {
    /// Transcribe audio samples to a structured result
    ///
    /// # Errors
    /// Returns error if Whisper inference fails
    fn transcribe(
        &self,
        samples: &[f32],
        options: &DecodeOptions,
    ) -> Result<Transcription, TranscriptionError>;
}

/// Errors that can occur during transcription
#[derive(Debug, Error)]
pub enum TranscriptionError {
    /// Failed to load Whisper model
    #[error("failed to load whisper model from {path}: {source}")]
    ModelLoad {
        /// Path to model file
        path: String,
        /// Underlying error
        source: anyhow::Error,
    },

    /// Failed to create Whisper inference state
    #[error("failed to create whisper state")]
    StateCreation,

    /// Transcription inference failed
    #[error("failed to transcribe audio")]
    Inference(#[from] anyhow::Error),

    /// Language detection failed
    #[error("language detection failed: {0}")]
    LanguageDetection(String),
}

/// Inference task selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Task {
    /// Produce text in the spoken language
    #[default]
    Transcribe,
    /// Produce English text regardless of the spoken language
    Translate,
}

/// Configuration bundle controlling a single inference call
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Language code hint (None = auto-detect)
    pub language: Option<String>,
    /// Whether to transcribe or translate to English
    pub task: Task,
}

impl DecodeOptions {
    /// Transcription in the given language
    #[must_use]
    pub fn transcribe_in(language: &str) -> Self {
        Self {
            language: Some(language.to_owned()),
            task: Task::Transcribe,
        }
    }

    /// English translation from the given source language
    #[must_use]
    pub fn translate_from(language: &str) -> Self {
        Self {
            language: Some(language.to_owned()),
            task: Task::Translate,
        }
    }
}

/// A single transcribed segment with timing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    /// Start time in seconds
    pub start_secs: f32,
    /// End time in seconds
    pub end_secs: f32,
    /// The transcribed text
    pub text: String,
}

/// Structured result of one inference call
#[derive(Debug, Clone, Serialize)]
pub struct Transcription {
    /// Full text (all segments joined)
    pub text: String,
    /// Language code the model settled on
    pub language: Option<String>,
    /// Per-segment detail
    pub segments: Vec<Segment>,
}

/// Whisper transcription engine
pub struct TranscriptionEngine {
    /// Whisper context (thread-safe)
    ctx: Arc<Mutex<WhisperContext>>,
    /// Number of CPU threads for inference
    threads: i32,
    /// Beam search width
    beam_size: i32,
}

impl TranscriptionEngine {
    /// Determines sampling strategy based on beam size (pure, testable)
    const fn get_sampling_strategy(beam_size: i32) -> SamplingStrategy {
        if beam_size > 1 {
            SamplingStrategy::BeamSearch {
                beam_size,
                patience: -1.0,
            }
        } else {
            SamplingStrategy::Greedy { best_of: 1 }
        }
    }

    /// Creates a new `TranscriptionEngine` by loading the model from the given path
    ///
    /// # Errors
    /// Returns error if the model file doesn't exist, is invalid, or if
    /// `threads`/`beam_size` are zero or exceed `i32::MAX`
    pub fn new(
        model_path: &Path,
        threads: usize,
        beam_size: usize,
    ) -> Result<Self, TranscriptionError> {
        if threads == 0 {
            return Err(TranscriptionError::ModelLoad {
                path: model_path.display().to_string(),
                source: anyhow::anyhow!("threads must be > 0"),
            });
        }
        if beam_size == 0 {
            return Err(TranscriptionError::ModelLoad {
                path: model_path.display().to_string(),
                source: anyhow::anyhow!("beam_size must be > 0"),
            });
        }

        // Validate that threads and beam_size fit in i32 (required by whisper-rs API)
        let threads_i32 = i32::try_from(threads).map_err(|_| TranscriptionError::ModelLoad {
            path: model_path.display().to_string(),
            source: anyhow::anyhow!("threads value too large (max: {})", i32::MAX),
        })?;
        let beam_size_i32 =
            i32::try_from(beam_size).map_err(|_| TranscriptionError::ModelLoad {
                path: model_path.display().to_string(),
                source: anyhow::anyhow!("beam_size value too large (max: {})", i32::MAX),
            })?;

        tracing::info!(
            path = %model_path.display(),
            threads = threads,
            beam_size = beam_size,
            "loading whisper model"
        );

        let path_str = model_path
            .to_str()
            .ok_or_else(|| TranscriptionError::ModelLoad {
                path: model_path.display().to_string(),
                source: anyhow::anyhow!("model path contains invalid UTF-8"),
            })?;

        let params = WhisperContextParameters::default();
        let ctx = WhisperContext::new_with_params(path_str, params).map_err(|e| {
            TranscriptionError::ModelLoad {
                path: model_path.display().to_string(),
                source: anyhow::anyhow!("{e}"),
            }
        })?;

        tracing::info!("whisper model loaded successfully");

        Ok(Self {
            ctx: Arc::new(Mutex::new(ctx)),
            threads: threads_i32,
            beam_size: beam_size_i32,
        })
    }

    /// Runs full-pipeline inference over the samples (16kHz mono f32)
    ///
    /// This is direct mode: one call covers feature extraction, language
    /// handling, decoding, and segment merging inside the model library.
    ///
    /// # Errors
    /// Returns error if Whisper inference fails or the mutex is poisoned
    pub fn transcribe(
        &self,
        samples: &[f32],
        options: &DecodeOptions,
    ) -> Result<Transcription, TranscriptionError> {
        self.transcribe_impl(samples, options)
    }

    #[allow(clippy::cast_precision_loss)]
    fn transcribe_impl(
        &self,
        samples: &[f32],
        options: &DecodeOptions,
    ) -> Result<Transcription, TranscriptionError> {
        let _span = tracing::debug_span!("transcription", samples = samples.len()).entered();
        tracing::debug!(language = ?options.language, task = ?options.task, "starting inference");

        // Create state for this transcription
        let mut state = self
            .ctx
            .lock()
            .map_err(|e| anyhow::anyhow!("mutex poisoned: {e}"))?
            .create_state()
            .map_err(|_| TranscriptionError::StateCreation)?;

        let strategy = Self::get_sampling_strategy(self.beam_size);
        let mut params = FullParams::new(strategy);
        params.set_n_threads(self.threads);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_token_timestamps(false);
        params.set_language(Some(options.language.as_deref().unwrap_or("auto")));
        params.set_translate(options.task == Task::Translate);

        // Run inference
        let start = std::time::Instant::now();
        state
            .full(params, samples)
            .context("whisper inference failed")?;
        let inference_duration = start.elapsed();

        // Extract text and timing from all segments
        let num_segments = state
            .full_n_segments()
            .context("failed to get segment count")?;

        let mut segments = Vec::new();
        let mut text = String::new();

        for i in 0..num_segments {
            let segment_text = state
                .full_get_segment_text(i)
                .context("failed to get segment text")?;
            let segment_text = segment_text.trim().to_owned();
            if segment_text.is_empty() {
                continue;
            }

            let start_cs = state
                .full_get_segment_t0(i)
                .context("failed to get segment start time")?;
            let end_cs = state
                .full_get_segment_t1(i)
                .context("failed to get segment end time")?;

            // Timestamps are in centiseconds
            segments.push(Segment {
                start_secs: start_cs as f32 / 100.0,
                end_secs: end_cs as f32 / 100.0,
                text: segment_text.clone(),
            });

            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&segment_text);
        }

        // Language the decoder settled on (detected or as hinted)
        let language = state
            .full_lang_id_from_state()
            .ok()
            .and_then(|id| whisper_rs::get_lang_str(id))
            .map(ToOwned::to_owned);

        tracing::info!(
            segments = segments.len(),
            text_len = text.len(),
            language = ?language,
            inference_ms = inference_duration.as_millis(),
            "transcription completed"
        );

        Ok(Transcription {
            text,
            language,
            segments,
        })
    }

    /// Runs standalone language detection over one 30-second window
    ///
    /// This is the manual-mode sequence: pad/trim the samples, compute the
    /// mel spectrogram in-state, and read back the probability mapping over
    /// supported language codes. Requires a multilingual model.
    ///
    /// # Errors
    /// Returns error if the model rejects detection (e.g. English-only
    /// weights) or the mutex is poisoned
    pub fn detect_language(&self, samples: &[f32]) -> Result<LanguageScores, TranscriptionError> {
        let _span = tracing::debug_span!("language_detection", samples = samples.len()).entered();

        let window = audio::pad_or_trim(samples, CHUNK_SAMPLES);
        let threads = usize::try_from(self.threads).unwrap_or(1);

        let mut state = self
            .ctx
            .lock()
            .map_err(|e| anyhow::anyhow!("mutex poisoned: {e}"))?
            .create_state()
            .map_err(|_| TranscriptionError::StateCreation)?;

        state
            .pcm_to_mel(&window, threads)
            .map_err(|e| TranscriptionError::LanguageDetection(e.to_string()))?;

        let (top_id, probs) = state
            .lang_detect(0, threads)
            .map_err(|e| TranscriptionError::LanguageDetection(e.to_string()))?;

        tracing::debug!(
            top_id,
            languages = probs.len(),
            "language detection completed"
        );

        Ok(LanguageScores::from_probs(&probs))
    }
}

/// Implement trait for real `TranscriptionEngine`
impl TranscriptionInterface for TranscriptionEngine {
    fn transcribe(
        &self,
        samples: &[f32],
        options: &DecodeOptions,
    ) -> Result<Transcription, TranscriptionError> {
        self.transcribe_impl(samples, options)
    }
}

// SAFETY: TranscriptionEngine is thread-safe because:
// 1. WhisperContext is wrapped in Arc<Mutex<>>, ensuring exclusive access
// 2. All methods require acquiring the mutex lock before accessing the context
// 3. No shared mutable state exists outside the mutex
#[allow(unsafe_code)]
unsafe impl Send for TranscriptionEngine {}
#[allow(unsafe_code)]
unsafe impl Sync for TranscriptionEngine {}
