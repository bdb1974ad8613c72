use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const MODEL_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

/// Available Whisper model variants
///
/// The `*En` variants are English-only models; the rest are multilingual
/// and support language detection and translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhisperModel {
    /// Multilingual tiny (~75MB)
    Tiny,
    /// English-only tiny
    TinyEn,
    /// Multilingual base (~142MB)
    Base,
    /// English-only base
    BaseEn,
    /// Multilingual small (~466MB)
    Small,
    /// English-only small
    SmallEn,
    /// Multilingual medium (~1.5GB)
    Medium,
    /// English-only medium
    MediumEn,
    /// Multilingual large (~3.1GB)
    Large,
}

impl WhisperModel {
    /// Short model name as used by the upstream distribution
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tiny => "tiny",
            Self::TinyEn => "tiny.en",
            Self::Base => "base",
            Self::BaseEn => "base.en",
            Self::Small => "small",
            Self::SmallEn => "small.en",
            Self::Medium => "medium",
            Self::MediumEn => "medium.en",
            Self::Large => "large-v3",
        }
    }

    /// ggml weights filename for this model
    #[must_use]
    pub fn filename(self) -> String {
        format!("ggml-{}.bin", self.name())
    }

    /// Hugging Face URL for this model's weights
    #[must_use]
    pub fn hf_url(self) -> String {
        format!("{}/{}", MODEL_BASE_URL, self.filename())
    }

    /// Approximate weights size in MB, for log output
    #[must_use]
    pub const fn size_mb(self) -> u64 {
        match self {
            Self::Tiny | Self::TinyEn => 75,
            Self::Base | Self::BaseEn => 142,
            Self::Small | Self::SmallEn => 466,
            Self::Medium | Self::MediumEn => 1500,
            Self::Large => 3100,
        }
    }

    /// Whether this model supports languages other than English
    #[must_use]
    pub const fn is_multilingual(self) -> bool {
        !matches!(self, Self::TinyEn | Self::BaseEn | Self::SmallEn | Self::MediumEn)
    }
}

impl std::fmt::Display for WhisperModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for WhisperModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tiny" => Ok(Self::Tiny),
            "tiny.en" => Ok(Self::TinyEn),
            "base" => Ok(Self::Base),
            "base.en" => Ok(Self::BaseEn),
            "small" => Ok(Self::Small),
            "small.en" => Ok(Self::SmallEn),
            "medium" => Ok(Self::Medium),
            "medium.en" => Ok(Self::MediumEn),
            "large" | "large-v3" => Ok(Self::Large),
            _ => Err(format!(
                "unknown model: {s}. Use tiny, base, small, medium, large or an .en variant"
            )),
        }
    }
}

/// Ensures the model weights are present locally, downloading them on first use
///
/// Returns the path to the weights file inside `models_dir`.
///
/// # Errors
/// Returns error if the directory cannot be created or the download fails
pub fn ensure_model_downloaded(model: WhisperModel, models_dir: &Path) -> Result<PathBuf> {
    let model_path = models_dir.join(model.filename());

    if model_path.exists() {
        tracing::info!(
            path = %model_path.display(),
            "model already exists, skipping download"
        );
        return Ok(model_path);
    }

    fs::create_dir_all(models_dir).context("failed to create model directory")?;

    tracing::info!(
        model = %model,
        size_mb = model.size_mb(),
        path = %model_path.display(),
        "model not found, starting download"
    );

    download_model(model, &model_path)?;

    Ok(model_path)
}

fn download_model(model: WhisperModel, model_path: &Path) -> Result<()> {
    let url = model.hf_url();

    tracing::info!(url = %url, "downloading model");

    // Download to temporary file first for atomic operation
    let temp_path = model_path.with_extension("tmp");

    let response = reqwest::blocking::get(&url)
        .with_context(|| format!("failed to download model from {url}"))?;

    if !response.status().is_success() {
        anyhow::bail!("download failed with status {}: {}", response.status(), url);
    }

    let bytes = response.bytes().context("failed to read response bytes")?;

    let mut file = fs::File::create(&temp_path)
        .with_context(|| format!("failed to create temp file at {}", temp_path.display()))?;

    file.write_all(&bytes)
        .context("failed to write model to temp file")?;

    // Drop file handle before rename
    drop(file);

    // Atomic rename - if this fails, temp file remains and is overwritten next run
    fs::rename(&temp_path, model_path).with_context(|| {
        format!(
            "failed to rename {} to {}",
            temp_path.display(),
            model_path.display()
        )
    })?;

    tracing::info!(
        path = %model_path.display(),
        size = bytes.len(),
        "model downloaded successfully"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_filename() {
        assert_eq!(WhisperModel::Medium.filename(), "ggml-medium.bin");
        assert_eq!(WhisperModel::MediumEn.filename(), "ggml-medium.en.bin");
        assert_eq!(WhisperModel::Large.filename(), "ggml-large-v3.bin");
    }

    #[test]
    fn test_model_url() {
        assert_eq!(
            WhisperModel::Tiny.hf_url(),
            "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-tiny.bin"
        );
    }

    #[test]
    fn test_model_parsing() {
        assert_eq!("medium.en".parse::<WhisperModel>().unwrap(), WhisperModel::MediumEn);
        assert_eq!("MEDIUM".parse::<WhisperModel>().unwrap(), WhisperModel::Medium);
        assert_eq!("large-v3".parse::<WhisperModel>().unwrap(), WhisperModel::Large);
        assert!("humongous".parse::<WhisperModel>().is_err());
    }

    #[test]
    fn test_multilingual_flag() {
        assert!(WhisperModel::Medium.is_multilingual());
        assert!(WhisperModel::Large.is_multilingual());
        assert!(!WhisperModel::MediumEn.is_multilingual());
        assert!(!WhisperModel::TinyEn.is_multilingual());
    }

    #[test]
    fn test_ensure_model_downloaded_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join(WhisperModel::Small.filename());

        // Pre-seed a dummy weights file
        fs::write(&model_path, b"dummy model data").unwrap();

        let result = ensure_model_downloaded(WhisperModel::Small, dir.path()).unwrap();

        assert_eq!(result, model_path);
        // Contents untouched, nothing was re-downloaded
        assert_eq!(fs::read(&model_path).unwrap(), b"dummy model data");
    }

    #[test]
    #[ignore] // Requires network access and downloads a large file
    fn test_download_model_integration() {
        let dir = tempfile::tempdir().unwrap();

        let path = ensure_model_downloaded(WhisperModel::Tiny, dir.path()).unwrap();

        assert!(path.exists());
        let metadata = fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
    }
}
