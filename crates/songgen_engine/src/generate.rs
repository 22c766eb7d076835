use std::sync::{mpsc, Arc};

use engine_logging::{engine_debug, engine_info, engine_trace, JobScope};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::simulator::rng_for_job;
use crate::{
    EngineEvent, FailureKind, GenerationError, HandleFactory, JobId, JobProgress,
    ProgressSimulator, ResultHandle, SimulationSettings, TickOutcome,
};

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Forwards events to the engine's event channel until the job is cancelled.
pub struct ChannelProgressSink {
    tx: mpsc::Sender<EngineEvent>,
    cancel: CancellationToken,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>, cancel: CancellationToken) -> Self {
        Self { tx, cancel }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        if self.cancel.is_cancelled() {
            return;
        }
        let _ = self.tx.send(event);
    }
}

/// Turns a prompt into a result handle, reporting progress along the way.
///
/// Implementations must return promptly once `cancel` fires.
#[async_trait::async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        job_id: JobId,
        prompt: &str,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ResultHandle, GenerationError>;
}

/// Stand-in for a real generation backend: advances a [`ProgressSimulator`]
/// once per tick period and fabricates a timestamped handle at the end.
#[derive(Debug)]
pub struct SimulatedGenerator {
    settings: SimulationSettings,
    handles: Arc<HandleFactory>,
}

impl SimulatedGenerator {
    pub fn new(settings: SimulationSettings, handles: Arc<HandleFactory>) -> Self {
        Self { settings, handles }
    }
}

#[async_trait::async_trait]
impl Generator for SimulatedGenerator {
    async fn generate(
        &self,
        job_id: JobId,
        prompt: &str,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ResultHandle, GenerationError> {
        let period = self.settings.tick_period;
        let mut rng = rng_for_job(self.settings.seed, job_id);
        let mut simulator = ProgressSimulator::new(self.settings.max_step);
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        {
            let _scope = JobScope::enter(job_id);
            engine_debug!(
                "simulating generation: prompt_chars={} period={:?}",
                prompt.chars().count(),
                period
            );
        }

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(GenerationError::new(FailureKind::Cancelled, "job cancelled"));
                }
                _ = ticker.tick() => {}
            }

            let outcome = simulator.tick(&mut rng);
            let _scope = JobScope::enter(job_id);
            match outcome {
                TickOutcome::Advanced { percent } => {
                    engine_trace!("tick {} progress={:.1}", simulator.ticks(), percent);
                    sink.emit(EngineEvent::Progress(JobProgress { job_id, percent }));
                }
                TickOutcome::Completed => {
                    let handle = self.handles.issue();
                    engine_info!("completed after {} ticks as {}", simulator.ticks(), handle);
                    return Ok(handle);
                }
            }
        }
    }
}
