//! Songgen engine: progress simulation, job timers and artifact persistence.
mod download;
mod engine;
mod generate;
mod handle;
mod persist;
mod simulator;
mod types;

pub use download::{ArtifactSource, DownloadError, Downloader, PlaceholderArtifact};
pub use engine::{EngineConfig, EngineHandle};
pub use generate::{ChannelProgressSink, Generator, ProgressSink, SimulatedGenerator};
pub use handle::{
    system_clock, Clock, HandleError, HandleFactory, ResultHandle, HANDLE_EXTENSION,
    HANDLE_PREFIX,
};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use simulator::{ProgressSimulator, SimulationSettings, TickOutcome};
pub use types::{EngineEvent, FailureKind, GenerationError, JobId, JobProgress};
