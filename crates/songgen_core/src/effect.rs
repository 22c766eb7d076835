use crate::JobId;

/// Side effects requested by [`crate::update`]; executed by the front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Begin generating for a freshly allocated job.
    StartJob { job_id: JobId, prompt: String },
    /// Stop the timer of a job that has been superseded or abandoned.
    CancelJob { job_id: JobId },
    /// Save the artifact behind a completed job's result handle.
    Download {
        job_id: JobId,
        result_handle: String,
    },
    /// Tear down the engine; no further effects follow.
    Shutdown,
}
