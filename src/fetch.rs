use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while retrieving a remote audio file
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP request could not be sent or its body could not be read
    #[error("request to {url} failed: {source}")]
    Request {
        /// Requested URL
        url: String,
        /// Underlying error
        source: reqwest::Error,
    },

    /// The server answered with a non-success status code
    #[error("server returned {status} for {url}")]
    Status {
        /// HTTP status code
        status: reqwest::StatusCode,
        /// Requested URL
        url: String,
    },

    /// Writing the body to disk failed
    #[error("failed to write {path}: {source}")]
    Io {
        /// Destination path
        path: String,
        /// Underlying error
        source: std::io::Error,
    },
}

/// Downloads the resource at `url` to `dest`, overwriting any existing file
///
/// The body is written to a `.part` file first and renamed into place once
/// fully read, so a failed fetch leaves nothing at `dest`. Returns the number
/// of bytes written.
///
/// # Errors
/// Returns error on network failure, non-2xx status, or disk write failure
pub fn download_audio(url: &str, dest: &Path) -> Result<u64, FetchError> {
    // Create parent directory if it doesn't exist
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| FetchError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
    }

    tracing::info!(url = %url, dest = %dest.display(), "downloading audio");

    let response = reqwest::blocking::get(url).map_err(|source| FetchError::Request {
        url: url.to_owned(),
        source,
    })?;

    if !response.status().is_success() {
        return Err(FetchError::Status {
            status: response.status(),
            url: url.to_owned(),
        });
    }

    let bytes = response.bytes().map_err(|source| FetchError::Request {
        url: url.to_owned(),
        source,
    })?;

    // Stage in a temp file so dest never holds a truncated body
    let temp_path = dest.with_extension("part");

    let write_result = fs::File::create(&temp_path)
        .and_then(|mut file| file.write_all(&bytes))
        .map_err(|source| FetchError::Io {
            path: temp_path.display().to_string(),
            source,
        });

    if let Err(err) = write_result {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }

    // Atomic rename - overwrites any previous download at dest
    fs::rename(&temp_path, dest).map_err(|source| FetchError::Io {
        path: dest.display().to_string(),
        source,
    })?;

    let len = bytes.len() as u64;
    tracing::info!(
        dest = %dest.display(),
        size = len,
        "audio downloaded"
    );

    Ok(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_unreachable_url_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("missing.mp3");

        // Reserved TLD, guaranteed to not resolve
        let result = download_audio("http://audio.invalid/clip.mp3", &dest);

        assert!(matches!(result, Err(FetchError::Request { .. })));
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::Status {
            status: reqwest::StatusCode::NOT_FOUND,
            url: "http://example.com/clip.mp3".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("clip.mp3"));
    }

    #[test]
    #[ignore] // Requires network access
    fn test_download_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("robots.txt");

        fs::write(&dest, b"stale contents").unwrap();

        let written = download_audio("https://huggingface.co/robots.txt", &dest).unwrap();

        assert!(dest.exists());
        let on_disk = fs::metadata(&dest).unwrap().len();
        assert_eq!(on_disk, written);
        assert_ne!(fs::read(&dest).unwrap(), b"stale contents");
    }

    #[test]
    #[ignore] // Requires network access
    fn test_download_404_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nope.mp3");

        let result = download_audio(
            "https://huggingface.co/this-path-does-not-exist-xyz.mp3",
            &dest,
        );

        assert!(matches!(result, Err(FetchError::Status { .. })));
        assert!(!dest.exists());
    }

    #[test]
    fn test_download_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested").join("deeper").join("clip.mp3");

        // Fails on the network, but the parent directories are created first
        let _ = download_audio("http://audio.invalid/clip.mp3", &dest);

        assert!(dest.parent().unwrap().exists());
    }
}
