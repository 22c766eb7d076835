use std::sync::mpsc;
use std::thread;

use engine_logging::{engine_info, engine_warn, JobScope};
use songgen_core::{Effect, JobFailure, JobFailureKind, Msg};
use songgen_engine::{EngineConfig, EngineEvent, EngineHandle, FailureKind, GenerationError};

use super::app::AppEvent;

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(config: EngineConfig, event_tx: mpsc::Sender<AppEvent>) -> Self {
        engine_info!("engine config: {:?}", config);
        let engine = EngineHandle::new(config);
        let runner = Self { engine };
        runner.spawn_event_loop(event_tx);
        runner
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartJob { job_id, prompt } => {
                    let _scope = JobScope::enter(job_id);
                    engine_info!("StartJob prompt_chars={}", prompt.chars().count());
                    self.engine.start(job_id, prompt);
                }
                Effect::CancelJob { job_id } => {
                    let _scope = JobScope::enter(job_id);
                    engine_info!("CancelJob");
                    self.engine.cancel(job_id);
                }
                Effect::Download {
                    job_id,
                    result_handle,
                } => {
                    let _scope = JobScope::enter(job_id);
                    engine_info!("Download handle={}", result_handle);
                    self.engine.download(job_id, result_handle);
                }
                Effect::Shutdown => {
                    engine_info!("Shutdown");
                    self.engine.shutdown();
                }
            }
        }
    }

    fn spawn_event_loop(&self, event_tx: mpsc::Sender<AppEvent>) {
        let engine = self.engine.clone();
        thread::spawn(move || {
            while let Some(event) = engine.recv() {
                let Some(msg) = map_event(event) else {
                    continue;
                };
                if event_tx.send(AppEvent::Msg(msg)).is_err() {
                    break;
                }
            }
        });
    }
}

fn map_event(event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::Progress(progress) => Some(Msg::JobProgress {
            job_id: progress.job_id,
            percent: progress.percent,
        }),
        EngineEvent::JobCompleted { job_id, result } => {
            let result = match result {
                Ok(handle) => Ok(handle.into_string()),
                Err(err) => {
                    engine_warn!("Job {} failed: {}", job_id, err);
                    Err(map_failure(err)?)
                }
            };
            Some(Msg::JobDone { job_id, result })
        }
        EngineEvent::DownloadCompleted { job_id, result } => Some(Msg::DownloadFinished {
            job_id,
            result: result
                .map(|path| path.display().to_string())
                .map_err(|err| err.to_string()),
        }),
    }
}

/// `None` for cancellations; a cancelled job has already been superseded in the core.
fn map_failure(err: GenerationError) -> Option<JobFailure> {
    let kind = match err.kind {
        FailureKind::Upstream => JobFailureKind::Generation,
        FailureKind::Timeout => JobFailureKind::Timeout,
        FailureKind::Cancelled => return None,
    };
    Some(JobFailure::new(kind, err.message))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use songgen_engine::{DownloadError, JobProgress, ResultHandle};

    use super::*;

    #[test]
    fn progress_and_completion_map_to_core_messages() {
        assert_eq!(
            map_event(EngineEvent::Progress(JobProgress {
                job_id: 3,
                percent: 101.5,
            })),
            Some(Msg::JobProgress {
                job_id: 3,
                percent: 101.5,
            })
        );

        let handle = ResultHandle::parse("generated-song-9.mp3").unwrap();
        assert_eq!(
            map_event(EngineEvent::JobCompleted {
                job_id: 3,
                result: Ok(handle),
            }),
            Some(Msg::JobDone {
                job_id: 3,
                result: Ok("generated-song-9.mp3".to_string()),
            })
        );
    }

    #[test]
    fn failures_keep_their_kind_and_cancellations_vanish() {
        assert_eq!(
            map_event(EngineEvent::JobCompleted {
                job_id: 1,
                result: Err(GenerationError::new(FailureKind::Timeout, "slow")),
            }),
            Some(Msg::JobDone {
                job_id: 1,
                result: Err(JobFailure::new(JobFailureKind::Timeout, "slow")),
            })
        );
        assert_eq!(
            map_event(EngineEvent::JobCompleted {
                job_id: 1,
                result: Err(GenerationError::new(FailureKind::Cancelled, "job cancelled")),
            }),
            None
        );
    }

    #[test]
    fn download_outcomes_become_strings() {
        assert_eq!(
            map_event(EngineEvent::DownloadCompleted {
                job_id: 2,
                result: Ok(PathBuf::from("output/generated-song-9.mp3")),
            }),
            Some(Msg::DownloadFinished {
                job_id: 2,
                result: Ok("output/generated-song-9.mp3".to_string()),
            })
        );
        assert_eq!(
            map_event(EngineEvent::DownloadCompleted {
                job_id: 2,
                result: Err(DownloadError::NoResult),
            }),
            Some(Msg::DownloadFinished {
                job_id: 2,
                result: Err("no completed result to download".to_string()),
            })
        );
    }
}
