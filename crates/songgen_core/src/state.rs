use std::fmt;

use crate::view_model::AppViewModel;

pub type JobId = u64;

/// Prompts longer than this (in characters) fail validation.
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 2000;

/// Highest progress a running job may report; 100 is reserved for completion.
pub const RUNNING_PROGRESS_CAP: f64 = 99.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobFailureKind {
    Validation,
    Generation,
    Timeout,
}

impl fmt::Display for JobFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobFailureKind::Validation => write!(f, "invalid prompt"),
            JobFailureKind::Generation => write!(f, "generation failed"),
            JobFailureKind::Timeout => write!(f, "timed out"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub kind: JobFailureKind,
    pub message: String,
}

impl JobFailure {
    pub fn new(kind: JobFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Outcome reported by the engine: the result handle or the failure.
pub type JobResult = Result<String, JobFailure>;

/// The single job a user works with. Only `Completed` carries a result handle.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum JobState {
    #[default]
    Idle,
    Running {
        job_id: JobId,
        prompt: String,
        progress: f64,
    },
    Completed {
        job_id: JobId,
        prompt: String,
        result_handle: String,
    },
    Failed {
        job_id: JobId,
        prompt: String,
        failure: JobFailure,
    },
}

impl JobState {
    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Idle => JobStatus::Idle,
            JobState::Running { .. } => JobStatus::Running,
            JobState::Completed { .. } => JobStatus::Completed,
            JobState::Failed { .. } => JobStatus::Failed,
        }
    }

    pub fn job_id(&self) -> Option<JobId> {
        match self {
            JobState::Idle => None,
            JobState::Running { job_id, .. }
            | JobState::Completed { job_id, .. }
            | JobState::Failed { job_id, .. } => Some(*job_id),
        }
    }

    pub fn prompt(&self) -> Option<&str> {
        match self {
            JobState::Idle => None,
            JobState::Running { prompt, .. }
            | JobState::Completed { prompt, .. }
            | JobState::Failed { prompt, .. } => Some(prompt),
        }
    }

    /// Progress in `[0, 100]`; exactly 100 only when completed.
    pub fn progress_percent(&self) -> f64 {
        match self {
            JobState::Running { progress, .. } => *progress,
            JobState::Completed { .. } => 100.0,
            JobState::Idle | JobState::Failed { .. } => 0.0,
        }
    }

    pub fn result_handle(&self) -> Option<&str> {
        match self {
            JobState::Completed { result_handle, .. } => Some(result_handle),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&JobFailure> {
        match self {
            JobState::Failed { failure, .. } => Some(failure),
            _ => None,
        }
    }

    fn running_id(&self) -> Option<JobId> {
        match self {
            JobState::Running { job_id, .. } => Some(*job_id),
            _ => None,
        }
    }
}

/// One-shot message shown next to the job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Download was requested but no completed job exists.
    NothingToDownload,
    Saved { path: String },
    DownloadFailed { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    prompt_input: String,
    job: JobState,
    next_job_id: JobId,
    max_prompt_chars: usize,
    notice: Option<Notice>,
    downloads_in_flight: usize,
    quit_requested: bool,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            prompt_input: String::new(),
            job: JobState::Idle,
            next_job_id: 1,
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
            notice: None,
            downloads_in_flight: 0,
            quit_requested: false,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_prompt_chars(max_prompt_chars: usize) -> Self {
        Self {
            max_prompt_chars,
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel::from_state(self)
    }

    pub fn job(&self) -> &JobState {
        &self.job
    }

    pub fn prompt_input(&self) -> &str {
        &self.prompt_input
    }

    pub fn max_prompt_chars(&self) -> usize {
        self.max_prompt_chars
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Downloads handed to the engine whose outcome has not come back yet.
    pub fn downloads_in_flight(&self) -> usize {
        self.downloads_in_flight
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns whether anything visible changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn running_job_id(&self) -> Option<JobId> {
        self.job.running_id()
    }

    pub(crate) fn set_prompt_input(&mut self, text: String) {
        if self.prompt_input != text {
            self.prompt_input = text;
            self.dirty = true;
        }
    }

    fn allocate_job_id(&mut self) -> JobId {
        let job_id = self.next_job_id;
        self.next_job_id += 1;
        job_id
    }

    /// Replaces whatever job existed with a fresh running one at 0%.
    pub(crate) fn start_job(&mut self, prompt: String) -> JobId {
        let job_id = self.allocate_job_id();
        self.job = JobState::Running {
            job_id,
            prompt,
            progress: 0.0,
        };
        self.notice = None;
        self.dirty = true;
        job_id
    }

    pub(crate) fn reject_prompt(&mut self, prompt: String, failure: JobFailure) -> JobId {
        let job_id = self.allocate_job_id();
        self.job = JobState::Failed {
            job_id,
            prompt,
            failure,
        };
        self.notice = None;
        self.dirty = true;
        job_id
    }

    pub(crate) fn apply_progress(&mut self, id: JobId, percent: f64) {
        if let JobState::Running {
            job_id, progress, ..
        } = &mut self.job
        {
            if *job_id != id || percent.is_nan() {
                return;
            }
            let next = percent.clamp(0.0, RUNNING_PROGRESS_CAP);
            if next > *progress {
                *progress = next;
                self.dirty = true;
            }
        }
    }

    pub(crate) fn apply_done(&mut self, id: JobId, result: crate::JobResult) {
        let prompt = match &mut self.job {
            JobState::Running { job_id, prompt, .. } if *job_id == id => std::mem::take(prompt),
            _ => return,
        };
        self.job = match result {
            Ok(result_handle) => JobState::Completed {
                job_id: id,
                prompt,
                result_handle,
            },
            Err(failure) => JobState::Failed {
                job_id: id,
                prompt,
                failure,
            },
        };
        self.dirty = true;
    }

    pub(crate) fn reset_job(&mut self) {
        if self.job != JobState::Idle {
            self.job = JobState::Idle;
            self.dirty = true;
        }
    }

    pub(crate) fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
        self.dirty = true;
    }

    pub(crate) fn begin_download(&mut self) {
        self.downloads_in_flight += 1;
    }

    pub(crate) fn finish_download(&mut self) {
        self.downloads_in_flight = self.downloads_in_flight.saturating_sub(1);
    }

    /// Not a visible change on its own; the frontend stops rendering once it sees the flag.
    pub(crate) fn request_quit(&mut self) {
        self.quit_requested = true;
    }
}
