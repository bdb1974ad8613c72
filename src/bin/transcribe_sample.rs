//! English transcription demo
//!
//! Downloads a fixed low-quality English MP3 and runs direct-mode
//! transcription with the English-only medium model.

use anyhow::Result;
use std::path::Path;
use whisper_scribe::config::Config;
use whisper_scribe::transcription::{
    ensure_model_downloaded, DecodeOptions, TranscriptionEngine, WhisperModel,
};
use whisper_scribe::{audio, fetch, telemetry};

const AUDIO_URL: &str =
    "https://github.com/fenago/whisper/raw/refs/heads/main/test_audio_files/terrible_quality.mp3";
const AUDIO_FILE: &str = "terrible_quality.mp3";

fn main() -> Result<()> {
    let config = Config::load()?;
    telemetry::init(config.telemetry.enabled, &config.telemetry.log_path)?;
    tracing::info!("transcribe-sample starting");

    // Load the model
    let models_dir = Config::expand_path(&config.model.models_dir)?;
    let model_path = ensure_model_downloaded(WhisperModel::MediumEn, &models_dir)?;
    let engine = TranscriptionEngine::new(&model_path, config.model.threads, 1)?;
    println!("✓ Model loaded: {}", WhisperModel::MediumEn);

    // Download the audio file
    let dest = Path::new(AUDIO_FILE);
    let bytes = fetch::download_audio(AUDIO_URL, dest)?;
    println!("✓ Audio downloaded: {AUDIO_FILE} ({bytes} bytes)");

    // Run transcription
    let samples = audio::load_audio(dest)?;
    let result = engine.transcribe(&samples, &DecodeOptions::default())?;

    println!("{result:#?}");

    Ok(())
}
