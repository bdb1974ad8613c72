//! Whisper Scribe - offline speech-to-text demos
//!
//! This library exports the shared plumbing behind the two demo binaries
//! (`transcribe-sample` and `translate-sample`).

/// Audio file loading and preprocessing
pub mod audio;
/// Configuration management
pub mod config;
/// Remote audio retrieval
pub mod fetch;
/// Telemetry and crash logging
pub mod telemetry;
/// Whisper transcription engine
pub mod transcription;
