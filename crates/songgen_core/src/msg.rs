#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User edited the prompt text.
    PromptChanged(String),
    /// User asked to generate a song from the current prompt.
    GenerateClicked,
    /// User asked to download the finished song.
    DownloadClicked,
    /// User dismissed the current job (or abandoned a running one).
    ResetClicked,
    /// User is leaving; running work must be cancelled.
    QuitRequested,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Engine progress for a job, as a raw percentage.
    JobProgress { job_id: crate::JobId, percent: f64 },
    /// Engine completion for a job.
    JobDone {
        job_id: crate::JobId,
        result: crate::JobResult,
    },
    /// Engine finished saving an artifact; `Ok` carries the written path.
    DownloadFinished {
        job_id: crate::JobId,
        result: Result<String, String>,
    },
    /// Fallback for placeholder wiring.
    NoOp,
}
