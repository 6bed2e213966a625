//! Local cache for downloadable model artifacts.
//!
//! Artifacts are fetched on first use from a list of mirrors and kept under the
//! user cache directory (`~/.cache/interview-coach/models/` on Linux).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

/// Files smaller than this are leftovers of an interrupted download.
const MIN_VALID_SIZE: u64 = 1024;
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelArtifact {
    pub file_name: &'static str,
    pub urls: &'static [&'static str],
}

pub const FERPLUS_ARTIFACT: ModelArtifact = ModelArtifact {
    file_name: "emotion-ferplus-8.onnx",
    urls: &[
        "https://raw.githubusercontent.com/onnx/models/main/validated/vision/body_analysis/emotion_ferplus/model/emotion-ferplus-8.onnx",
        "https://github.com/onnx/models/raw/main/validated/vision/body_analysis/emotion_ferplus/model/emotion-ferplus-8.onnx?download=1",
    ],
};

#[derive(Debug, Error)]
pub enum ModelStoreError {
    #[error("could not determine a cache directory")]
    NoCacheDir,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("download from {url} failed: {reason}")]
    Download { url: String, reason: String },

    #[error("no source could provide {file_name} (last error: {last})")]
    AllSourcesFailed { file_name: &'static str, last: String },
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> ModelStoreError + '_ {
    move |source| ModelStoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Clone)]
pub struct ModelStore {
    cache_dir: PathBuf,
    timeout: Duration,
}

impl ModelStore {
    /// Store rooted at the platform cache directory.
    pub fn new() -> Result<Self, ModelStoreError> {
        let base = dirs::cache_dir().ok_or(ModelStoreError::NoCacheDir)?;
        Ok(Self::with_cache_dir(base.join("interview-coach").join("models")))
    }

    pub fn with_cache_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            timeout: DOWNLOAD_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn artifact_path(&self, artifact: &ModelArtifact) -> PathBuf {
        self.cache_dir.join(artifact.file_name)
    }

    /// Local path of `artifact`, downloading it first if it is not cached.
    pub fn ensure(&self, artifact: &ModelArtifact) -> Result<PathBuf, ModelStoreError> {
        fs::create_dir_all(&self.cache_dir).map_err(io_error(&self.cache_dir))?;
        let path = self.artifact_path(artifact);

        if let Ok(meta) = fs::metadata(&path) {
            if meta.len() >= MIN_VALID_SIZE {
                return Ok(path);
            }
            warn!(
                "Removing incomplete model file {} ({} bytes)",
                path.display(),
                meta.len()
            );
            fs::remove_file(&path).map_err(io_error(&path))?;
        }

        let mut last = String::from("no download sources configured");
        for url in artifact.urls {
            info!("Downloading {} from {}", artifact.file_name, url);
            match self.download(url, &path) {
                Ok(()) => {
                    info!("Model {} cached at {}", artifact.file_name, path.display());
                    return Ok(path);
                }
                Err(e) => {
                    warn!("Download attempt failed: {e}");
                    last = e.to_string();
                }
            }
        }

        Err(ModelStoreError::AllSourcesFailed {
            file_name: artifact.file_name,
            last,
        })
    }

    /// Streams `url` into `<target>.tmp` and renames it into place.
    fn download(&self, url: &str, target: &Path) -> Result<(), ModelStoreError> {
        let temp_path = target.with_extension("tmp");
        let result = self.fetch_to(url, &temp_path).and_then(|()| {
            fs::rename(&temp_path, target).map_err(io_error(target))
        });
        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }

    fn fetch_to(&self, url: &str, temp_path: &Path) -> Result<(), ModelStoreError> {
        let agent = ureq::AgentBuilder::new()
            .timeout(self.timeout)
            .user_agent("Mozilla/5.0")
            .build();
        let response = agent.get(url).call().map_err(|e| ModelStoreError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let mut file = fs::File::create(temp_path).map_err(io_error(temp_path))?;
        let mut reader = response.into_reader();
        let written = io::copy(&mut reader, &mut file).map_err(|e| ModelStoreError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        file.sync_all().map_err(io_error(temp_path))?;

        if written < MIN_VALID_SIZE {
            return Err(ModelStoreError::Download {
                url: url.to_string(),
                reason: format!("response too small ({written} bytes)"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFFLINE: ModelArtifact = ModelArtifact {
        file_name: "offline.onnx",
        urls: &[],
    };

    #[test]
    fn test_cached_artifact_returned_without_download() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::with_cache_dir(dir.path().to_path_buf());
        fs::write(store.artifact_path(&OFFLINE), vec![7u8; 4096]).unwrap();

        let path = store.ensure(&OFFLINE).unwrap();
        assert_eq!(path, dir.path().join("offline.onnx"));
    }

    #[test]
    fn test_partial_file_removed_before_retry() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::with_cache_dir(dir.path().to_path_buf());
        let path = store.artifact_path(&OFFLINE);
        fs::write(&path, b"truncated").unwrap();

        let err = store.ensure(&OFFLINE).unwrap_err();
        assert!(matches!(err, ModelStoreError::AllSourcesFailed { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_cache_dir_created_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = ModelStore::with_cache_dir(nested.clone());
        let _ = store.ensure(&OFFLINE);
        assert!(nested.is_dir());
    }

    #[test]
    fn test_unreachable_source_leaves_no_temp_file() {
        let artifact = ModelArtifact {
            file_name: "unreachable.onnx",
            urls: &["http://127.0.0.1:9/unreachable.onnx"],
        };
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::with_cache_dir(dir.path().to_path_buf())
            .with_timeout(Duration::from_secs(2));

        let err = store.ensure(&artifact).unwrap_err();
        match err {
            ModelStoreError::AllSourcesFailed { file_name, last } => {
                assert_eq!(file_name, "unreachable.onnx");
                assert!(last.contains("127.0.0.1:9"), "{last}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dir.path().join("unreachable.tmp").exists());
        assert!(!dir.path().join("unreachable.onnx").exists());
    }

    #[test]
    fn test_ferplus_artifact_has_mirrors() {
        assert_eq!(FERPLUS_ARTIFACT.file_name, "emotion-ferplus-8.onnx");
        assert_eq!(FERPLUS_ARTIFACT.urls.len(), 2);
    }
}
