use crate::{normalize_prompt, AppState, JobFailure, JobId, JobStatus, Notice};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub status: JobStatus,
    pub job_id: Option<JobId>,
    pub prompt_input: String,
    /// Prompt the current job was started with.
    pub active_prompt: Option<String>,
    /// Always within `[0, 100]`.
    pub progress_percent: f64,
    pub display_percent: u8,
    pub result_handle: Option<String>,
    pub failure: Option<JobFailure>,
    pub can_generate: bool,
    pub can_download: bool,
    pub notice: Option<Notice>,
    pub dirty: bool,
}

impl AppViewModel {
    pub(crate) fn from_state(state: &AppState) -> Self {
        let job = state.job();
        let status = job.status();
        let progress_percent = clamp_percent(job.progress_percent());
        Self {
            status,
            job_id: job.job_id(),
            prompt_input: state.prompt_input().to_owned(),
            active_prompt: job.prompt().map(ToOwned::to_owned),
            progress_percent,
            display_percent: progress_percent.round() as u8,
            result_handle: job.result_handle().map(ToOwned::to_owned),
            failure: job.failure().cloned(),
            can_generate: status != JobStatus::Running
                && normalize_prompt(state.prompt_input()).is_some(),
            can_download: status == JobStatus::Completed,
            notice: state.notice().cloned(),
            dirty: state.is_dirty(),
        }
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}
