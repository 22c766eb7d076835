use std::path::PathBuf;
use std::sync::Arc;

use engine_logging::engine_info;
use thiserror::Error;

use crate::{AtomicFileWriter, HandleError, PersistError, ResultHandle};

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("no completed result to download")]
    NoResult,
    #[error("invalid result handle: {0}")]
    InvalidHandle(#[from] HandleError),
    #[error("artifact unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Resolves a result handle to the artifact bytes.
pub trait ArtifactSource: Send + Sync {
    fn fetch(&self, handle: &ResultHandle) -> Result<Vec<u8>, DownloadError>;
}

/// No generation backend exists yet; every artifact is empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderArtifact;

impl ArtifactSource for PlaceholderArtifact {
    fn fetch(&self, _handle: &ResultHandle) -> Result<Vec<u8>, DownloadError> {
        Ok(Vec::new())
    }
}

/// Saves artifacts under their handle inside the output directory.
#[derive(Clone)]
pub struct Downloader {
    source: Arc<dyn ArtifactSource>,
    writer: AtomicFileWriter,
}

impl Downloader {
    pub fn new(output_dir: PathBuf) -> Self {
        Self::with_source(output_dir, Arc::new(PlaceholderArtifact))
    }

    pub fn with_source(output_dir: PathBuf, source: Arc<dyn ArtifactSource>) -> Self {
        Self {
            source,
            writer: AtomicFileWriter::new(output_dir),
        }
    }

    /// `None` means the job never completed and is rejected outright.
    pub fn download(&self, handle: Option<&ResultHandle>) -> Result<PathBuf, DownloadError> {
        let handle = handle.ok_or(DownloadError::NoResult)?;
        let bytes = self.source.fetch(handle)?;
        let path = self.writer.write(handle.as_str(), &bytes)?;
        engine_info!("saved {} ({} bytes) to {:?}", handle, bytes.len(), path);
        Ok(path)
    }

    pub(crate) fn download_raw(&self, raw: &str) -> Result<PathBuf, DownloadError> {
        let handle = ResultHandle::parse(raw)?;
        self.download(Some(&handle))
    }
}
