/// Whisper model inference engine
pub mod engine;
/// Language probability handling
pub mod language;
/// Model naming and download
pub mod model;

pub use engine::{DecodeOptions, Segment, Task, Transcription, TranscriptionEngine};
pub use language::LanguageScores;
pub use model::{ensure_model_downloaded, WhisperModel};
