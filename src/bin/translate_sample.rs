//! Language detection and translation demo
//!
//! Downloads a fixed Dutch MP3, runs manual-mode language detection with the
//! multilingual medium model, then translates the clip to English.

use anyhow::{Context, Result};
use std::path::Path;
use whisper_scribe::config::Config;
use whisper_scribe::transcription::{
    ensure_model_downloaded, DecodeOptions, TranscriptionEngine, WhisperModel,
};
use whisper_scribe::{audio, fetch, telemetry};

const AUDIO_URL: &str =
    "https://github.com/fenago/whisper/raw/refs/heads/main/test_audio_files/dutch_the_netherlands.mp3";
const AUDIO_FILE: &str = "dutch_the_netherlands.mp3";

fn main() -> Result<()> {
    let config = Config::load()?;
    telemetry::init(config.telemetry.enabled, &config.telemetry.log_path)?;
    tracing::info!("translate-sample starting");

    // Download the audio file
    let dest = Path::new(AUDIO_FILE);
    let bytes = fetch::download_audio(AUDIO_URL, dest)?;
    println!("✓ Audio downloaded: {AUDIO_FILE} ({bytes} bytes)");

    // Load the model
    let models_dir = Config::expand_path(&config.model.models_dir)?;
    let model_path = ensure_model_downloaded(WhisperModel::Medium, &models_dir)?;
    let engine = TranscriptionEngine::new(&model_path, config.model.threads, 1)?;
    println!("✓ Model loaded: {}", WhisperModel::Medium);

    let samples = audio::load_audio(dest)?;

    // Manual mode: pad/trim to one window, detect the spoken language, then
    // decode that window in the detected language
    let scores = engine.detect_language(&samples)?;
    let (language, probability) = scores
        .best()
        .context("language detection returned no probabilities")?;
    println!("Detected language: {language} (p={probability:.3})");
    for (code, p) in scores.top(5) {
        println!("  {code}: {p:.3}");
    }

    let window = audio::pad_or_trim(&samples, audio::CHUNK_SAMPLES);
    let detected = engine.transcribe(&window, &DecodeOptions::transcribe_in(language))?;
    println!("{detected:#?}");

    // Transcribe and translate Dutch to English
    let result = engine.transcribe(&samples, &DecodeOptions::translate_from("nl"))?;
    for segment in &result.segments {
        println!(
            "[{:>7.2} --> {:>7.2}]  {}",
            segment.start_secs, segment.end_secs, segment.text
        );
    }
    println!("{}", result.text);

    Ok(())
}
