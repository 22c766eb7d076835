use pretty_assertions::assert_eq;
use songgen_core::{
    update, AppState, AppViewModel, Effect, JobFailure, JobFailureKind, JobStatus, Msg,
};

fn submit_prompt(state: AppState, input: &str) -> (AppState, Vec<Effect>) {
    let (state, _) = update(state, Msg::PromptChanged(input.to_string()));
    update(state, Msg::GenerateClicked)
}

fn assert_job_invariants(view: &AppViewModel) {
    assert_eq!(
        view.result_handle.is_some(),
        view.status == JobStatus::Completed,
        "result handle present iff completed: {view:?}"
    );
    assert_eq!(
        view.progress_percent == 100.0,
        view.status == JobStatus::Completed,
        "progress is 100 iff completed: {view:?}"
    );
    assert!((0.0..=100.0).contains(&view.progress_percent));
    assert_eq!(view.failure.is_some(), view.status == JobStatus::Failed);
}

#[test]
fn progress_is_monotonic_while_running() {
    let (state, _) = submit_prompt(AppState::new(), "lofi beat");

    let (mut state, _) = update(
        state,
        Msg::JobProgress {
            job_id: 1,
            percent: 12.5,
        },
    );
    assert_eq!(state.view().progress_percent, 12.5);
    assert!(state.consume_dirty());

    // A lower report never moves progress backwards.
    let (mut state, _) = update(
        state,
        Msg::JobProgress {
            job_id: 1,
            percent: 3.0,
        },
    );
    assert_eq!(state.view().progress_percent, 12.5);
    assert!(!state.consume_dirty());

    let (state, _) = update(
        state,
        Msg::JobProgress {
            job_id: 1,
            percent: f64::NAN,
        },
    );
    assert_eq!(state.view().progress_percent, 12.5);
    assert_eq!(state.view().display_percent, 13);
}

#[test]
fn completion_sets_handle_and_full_progress() {
    let (state, _) = submit_prompt(AppState::new(), "lofi beat");
    let (state, _) = update(
        state,
        Msg::JobProgress {
            job_id: 1,
            percent: 97.0,
        },
    );
    let (state, effects) = update(
        state,
        Msg::JobDone {
            job_id: 1,
            result: Ok("generated-song-1700000000123.mp3".to_string()),
        },
    );

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.status, JobStatus::Completed);
    assert_eq!(view.progress_percent, 100.0);
    assert_eq!(view.display_percent, 100);
    assert_eq!(
        view.result_handle.as_deref(),
        Some("generated-song-1700000000123.mp3")
    );
    assert_eq!(view.active_prompt.as_deref(), Some("lofi beat"));
    assert!(view.can_download);
}

#[test]
fn completed_job_is_immutable_until_next_start() {
    let (state, _) = submit_prompt(AppState::new(), "lofi beat");
    let (state, _) = update(
        state,
        Msg::JobDone {
            job_id: 1,
            result: Ok("generated-song-1.mp3".to_string()),
        },
    );
    let completed = state.clone();

    let (state, _) = update(
        state,
        Msg::JobProgress {
            job_id: 1,
            percent: 50.0,
        },
    );
    let (state, _) = update(
        state,
        Msg::JobDone {
            job_id: 1,
            result: Ok("generated-song-2.mp3".to_string()),
        },
    );
    assert_eq!(state, completed);
}

#[test]
fn events_from_superseded_job_are_ignored() {
    let (state, _) = submit_prompt(AppState::new(), "first");
    let (state, _) = submit_prompt(state, "second");
    let snapshot = state.clone();

    let (state, _) = update(
        state,
        Msg::JobProgress {
            job_id: 1,
            percent: 80.0,
        },
    );
    let (state, _) = update(
        state,
        Msg::JobDone {
            job_id: 1,
            result: Ok("generated-song-1.mp3".to_string()),
        },
    );
    assert_eq!(state, snapshot);
    assert_eq!(state.view().status, JobStatus::Running);
    assert_eq!(state.view().job_id, Some(2));
}

#[test]
fn events_for_unknown_jobs_are_ignored_when_idle() {
    let state = AppState::new();
    let (state, _) = update(
        state,
        Msg::JobDone {
            job_id: 7,
            result: Ok("generated-song-7.mp3".to_string()),
        },
    );
    assert_eq!(state, AppState::new());
}

#[test]
fn generation_failure_moves_job_to_failed() {
    let (state, _) = submit_prompt(AppState::new(), "lofi beat");
    let (state, _) = update(
        state,
        Msg::JobDone {
            job_id: 1,
            result: Err(JobFailure::new(JobFailureKind::Generation, "upstream 503")),
        },
    );

    let view = state.view();
    assert_eq!(view.status, JobStatus::Failed);
    assert_eq!(view.progress_percent, 0.0);
    assert_eq!(view.result_handle, None);
    assert_eq!(
        view.failure.map(|f| f.to_string()).as_deref(),
        Some("generation failed: upstream 503")
    );
}

#[test]
fn invariants_hold_after_every_transition() {
    let script = vec![
        Msg::DownloadClicked,
        Msg::PromptChanged("lofi beat".to_string()),
        Msg::GenerateClicked,
        Msg::JobProgress {
            job_id: 1,
            percent: 14.9,
        },
        Msg::JobProgress {
            job_id: 1,
            percent: 101.3,
        },
        Msg::Tick,
        Msg::JobDone {
            job_id: 1,
            result: Ok("generated-song-1.mp3".to_string()),
        },
        Msg::DownloadClicked,
        Msg::GenerateClicked,
        Msg::JobProgress {
            job_id: 2,
            percent: 40.0,
        },
        Msg::GenerateClicked,
        Msg::JobDone {
            job_id: 2,
            result: Ok("generated-song-2.mp3".to_string()),
        },
        Msg::JobDone {
            job_id: 3,
            result: Err(JobFailure::new(JobFailureKind::Timeout, "slow")),
        },
        Msg::ResetClicked,
        Msg::GenerateClicked,
        Msg::QuitRequested,
    ];

    let mut state = AppState::new();
    assert_job_invariants(&state.view());
    for msg in script {
        let (next, _effects) = update(state, msg);
        assert_job_invariants(&next.view());
        state = next;
    }
    assert!(state.quit_requested());
}
