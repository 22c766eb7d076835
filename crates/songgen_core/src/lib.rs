//! Songgen core: pure job state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{
    AppState, JobFailure, JobFailureKind, JobId, JobResult, JobState, JobStatus, Notice,
    DEFAULT_MAX_PROMPT_CHARS, RUNNING_PROGRESS_CAP,
};
pub use update::{normalize_prompt, update};
pub use view_model::AppViewModel;
