use crate::{AppState, Effect, JobFailure, JobFailureKind, JobState, Msg, Notice};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::PromptChanged(text) => {
            state.set_prompt_input(text);
            Vec::new()
        }
        Msg::GenerateClicked => {
            let Some(prompt) = normalize_prompt(state.prompt_input()) else {
                return (state, Vec::new());
            };

            // At most one timer per job: the running one is cancelled before anything else.
            let mut effects = Vec::with_capacity(2);
            if let Some(previous) = state.running_job_id() {
                effects.push(Effect::CancelJob { job_id: previous });
            }

            let limit = state.max_prompt_chars();
            let len = prompt.chars().count();
            if len > limit {
                let failure = JobFailure::new(
                    JobFailureKind::Validation,
                    format!("prompt is {len} characters, limit is {limit}"),
                );
                state.reject_prompt(prompt, failure);
                return (state, effects);
            }

            let job_id = state.start_job(prompt.clone());
            effects.push(Effect::StartJob { job_id, prompt });
            effects
        }
        Msg::DownloadClicked => {
            let completed = match state.job() {
                JobState::Completed {
                    job_id,
                    result_handle,
                    ..
                } => Some((*job_id, result_handle.clone())),
                _ => None,
            };
            match completed {
                Some((job_id, result_handle)) => {
                    state.begin_download();
                    vec![Effect::Download {
                        job_id,
                        result_handle,
                    }]
                }
                None => {
                    state.set_notice(Notice::NothingToDownload);
                    Vec::new()
                }
            }
        }
        Msg::ResetClicked => {
            let effects = match state.running_job_id() {
                Some(job_id) => vec![Effect::CancelJob { job_id }],
                None => Vec::new(),
            };
            state.reset_job();
            effects
        }
        Msg::QuitRequested => {
            let mut effects = Vec::with_capacity(2);
            if let Some(job_id) = state.running_job_id() {
                effects.push(Effect::CancelJob { job_id });
                state.reset_job();
            }
            effects.push(Effect::Shutdown);
            state.request_quit();
            effects
        }
        Msg::JobProgress { job_id, percent } => {
            state.apply_progress(job_id, percent);
            Vec::new()
        }
        Msg::JobDone { job_id, result } => {
            state.apply_done(job_id, result);
            Vec::new()
        }
        Msg::DownloadFinished { job_id: _, result } => {
            state.finish_download();
            let notice = match result {
                Ok(path) => Notice::Saved { path },
                Err(message) => Notice::DownloadFailed { message },
            };
            state.set_notice(notice);
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Trims the prompt; `None` when nothing but whitespace remains.
pub fn normalize_prompt(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
