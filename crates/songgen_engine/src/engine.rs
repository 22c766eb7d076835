use std::fmt;
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_debug, engine_error, engine_info, engine_warn, JobScope};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::generate::{ChannelProgressSink, Generator, SimulatedGenerator};
use crate::{
    system_clock, Clock, Downloader, EngineEvent, FailureKind, GenerationError, HandleFactory,
    JobId, SimulationSettings,
};

#[derive(Clone)]
pub struct EngineConfig {
    pub simulation: SimulationSettings,
    /// Upper bound on a single job; expiry fails the job with a timeout.
    pub generation_timeout: Duration,
    pub output_dir: PathBuf,
    pub clock: Clock,
}

impl EngineConfig {
    pub fn default_with_output(output_dir: PathBuf) -> Self {
        Self {
            simulation: SimulationSettings::default(),
            generation_timeout: Duration::from_secs(120),
            output_dir,
            clock: system_clock(),
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("simulation", &self.simulation)
            .field("generation_timeout", &self.generation_timeout)
            .field("output_dir", &self.output_dir)
            .finish_non_exhaustive()
    }
}

enum EngineCommand {
    Start { job_id: JobId, prompt: String },
    Cancel { job_id: JobId },
    Download { job_id: JobId, handle: String },
    Shutdown,
}

/// The job whose timer is currently allowed to run. Dropping it cancels the timer.
struct ActiveJob {
    job_id: JobId,
    _guard: DropGuard,
}

/// Front door to the engine thread.
///
/// Clones share the same engine. Once every clone is dropped (or after
/// [`EngineHandle::shutdown`]) the active job is cancelled and the runtime stops.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
    worker: Arc<Mutex<Option<thread::JoinHandle<()>>>>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Self {
        let handles = Arc::new(HandleFactory::new(config.clock.clone()));
        let generator = Arc::new(SimulatedGenerator::new(config.simulation.clone(), handles));
        Self::with_generator(config, generator)
    }

    /// Runs jobs through `generator` instead of the built-in simulator.
    pub fn with_generator(config: EngineConfig, generator: Arc<dyn Generator>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let worker = Worker {
            generator,
            downloader: Downloader::new(config.output_dir),
            timeout: config.generation_timeout,
            event_tx,
        };

        let worker = thread::spawn(move || worker.run(cmd_rx));

        Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
            worker: Arc::new(Mutex::new(Some(worker))),
        }
    }

    /// Starts `job_id`, cancelling whichever job was running.
    pub fn start(&self, job_id: JobId, prompt: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Start {
            job_id,
            prompt: prompt.into(),
        });
    }

    /// Cancels `job_id` if it is the active job; otherwise ignored.
    pub fn cancel(&self, job_id: JobId) {
        let _ = self.cmd_tx.send(EngineCommand::Cancel { job_id });
    }

    pub fn download(&self, job_id: JobId, handle: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Download {
            job_id,
            handle: handle.into(),
        });
    }

    /// Cancels the active job, lets started downloads finish, and waits for the engine thread.
    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
        let worker = match self.worker.lock() {
            Ok(mut worker) => worker.take(),
            Err(_) => None,
        };
        if let Some(worker) = worker {
            if worker.join().is_err() {
                engine_warn!("engine thread panicked");
            }
        }
    }

    /// Blocks for the next event; `None` once the engine has stopped.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv_timeout(timeout).ok()
    }
}

struct Worker {
    generator: Arc<dyn Generator>,
    downloader: Downloader,
    timeout: Duration,
    event_tx: mpsc::Sender<EngineEvent>,
}

impl Worker {
    fn run(self, cmd_rx: mpsc::Receiver<EngineCommand>) {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("songgen-engine")
            .enable_time()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                engine_error!("failed to start engine runtime: {}", err);
                return;
            }
        };

        let mut active: Option<ActiveJob> = None;
        let mut downloads: Vec<tokio::task::JoinHandle<()>> = Vec::new();
        while let Ok(command) = cmd_rx.recv() {
            downloads.retain(|download| !download.is_finished());
            match command {
                EngineCommand::Start { job_id, prompt } => {
                    if let Some(previous) = active.take() {
                        engine_debug!("job {} superseded by job {}", previous.job_id, job_id);
                    }
                    let token = CancellationToken::new();
                    runtime.spawn(run_job(
                        self.generator.clone(),
                        self.timeout,
                        job_id,
                        prompt,
                        token.clone(),
                        self.event_tx.clone(),
                    ));
                    active = Some(ActiveJob {
                        job_id,
                        _guard: token.drop_guard(),
                    });
                }
                EngineCommand::Cancel { job_id } => {
                    if active.as_ref().is_some_and(|job| job.job_id == job_id) {
                        active = None;
                        let _scope = JobScope::enter(job_id);
                        engine_info!("cancelled");
                    }
                }
                EngineCommand::Download { job_id, handle } => {
                    let downloader = self.downloader.clone();
                    let event_tx = self.event_tx.clone();
                    downloads.push(runtime.spawn_blocking(move || {
                        let _scope = JobScope::enter(job_id);
                        let result = downloader.download_raw(&handle);
                        if let Err(err) = &result {
                            engine_warn!("download of {:?} failed: {}", handle, err);
                        }
                        let _ = event_tx.send(EngineEvent::DownloadCompleted { job_id, result });
                    }));
                }
                EngineCommand::Shutdown => break,
            }
        }

        drop(active);
        if !downloads.is_empty() {
            engine_debug!("waiting for {} download(s)", downloads.len());
            runtime.block_on(async {
                for download in downloads {
                    let _ = download.await;
                }
            });
        }
        runtime.shutdown_timeout(Duration::from_millis(500));
        engine_debug!("engine stopped");
    }
}

async fn run_job(
    generator: Arc<dyn Generator>,
    timeout: Duration,
    job_id: JobId,
    prompt: String,
    cancel: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let sink = ChannelProgressSink::new(event_tx.clone(), cancel.clone());
    let result = match tokio::time::timeout(
        timeout,
        generator.generate(job_id, &prompt, &sink, &cancel),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(GenerationError::new(
            FailureKind::Timeout,
            format!("no result within {timeout:?}"),
        )),
    };

    let _scope = JobScope::enter(job_id);
    if cancel.is_cancelled() {
        engine_debug!("dropping outcome of cancelled job");
        return;
    }
    if let Err(err) = &result {
        engine_warn!("generation failed: {}", err);
    }
    let _ = event_tx.send(EngineEvent::JobCompleted { job_id, result });
}
