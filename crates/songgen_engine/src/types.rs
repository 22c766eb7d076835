use std::fmt;
use std::path::PathBuf;

use crate::{DownloadError, ResultHandle};

pub type JobId = u64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JobProgress {
    pub job_id: JobId,
    /// Raw simulator reading; may exceed 100 on the tick before completion.
    pub percent: f64,
}

#[derive(Debug)]
pub enum EngineEvent {
    Progress(JobProgress),
    /// Not sent for jobs that were cancelled.
    JobCompleted {
        job_id: JobId,
        result: Result<ResultHandle, GenerationError>,
    },
    DownloadCompleted {
        job_id: JobId,
        result: Result<PathBuf, DownloadError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationError {
    pub kind: FailureKind,
    pub message: String,
}

impl GenerationError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for GenerationError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Upstream,
    Timeout,
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Upstream => write!(f, "upstream failure"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}
