use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{ensure, Context};
use clap::Parser;
use serde::Deserialize;
use songgen_engine::{system_clock, EngineConfig, SimulationSettings};

use super::logging::LogDestination;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "songgen.ron";

#[derive(Debug, Default, Parser)]
#[command(
    name = "songgen",
    version,
    about = "Turn a text prompt into a song (simulated generation)"
)]
pub struct Cli {
    /// Start generating right away with this prompt.
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// RON configuration file (defaults to ./songgen.ron when present).
    #[arg(short, long, env = "SONGGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory downloaded songs are saved to.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Milliseconds between progress ticks.
    #[arg(long)]
    pub tick_ms: Option<u64>,

    /// Upper bound (exclusive) of a single progress step, in percent.
    #[arg(long)]
    pub max_step: Option<f64>,

    /// Seconds before a generation is abandoned.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Longest accepted prompt, in characters.
    #[arg(long)]
    pub max_prompt_chars: Option<usize>,

    /// Seed for reproducible progress.
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, value_enum)]
    pub log: Option<LogDestination>,

    /// Log at debug level.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub output_dir: PathBuf,
    pub tick_period_ms: u64,
    pub max_step: f64,
    pub timeout_secs: u64,
    pub max_prompt_chars: usize,
    pub seed: Option<u64>,
    pub log: LogDestination,
    pub verbose: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let simulation = SimulationSettings::default();
        Self {
            output_dir: PathBuf::from("output"),
            tick_period_ms: u64::try_from(simulation.tick_period.as_millis()).unwrap_or(500),
            max_step: simulation.max_step,
            timeout_secs: 120,
            max_prompt_chars: songgen_core::DEFAULT_MAX_PROMPT_CHARS,
            seed: None,
            log: LogDestination::default(),
            verbose: false,
        }
    }
}

impl AppConfig {
    /// File values (explicit path, else `./songgen.ron` if present, else defaults)
    /// with command-line flags layered on top.
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_overrides(cli);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        ron::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(dir) = &cli.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(ms) = cli.tick_ms {
            self.tick_period_ms = ms;
        }
        if let Some(step) = cli.max_step {
            self.max_step = step;
        }
        if let Some(secs) = cli.timeout_secs {
            self.timeout_secs = secs;
        }
        if let Some(chars) = cli.max_prompt_chars {
            self.max_prompt_chars = chars;
        }
        if cli.seed.is_some() {
            self.seed = cli.seed;
        }
        if let Some(log) = cli.log {
            self.log = log;
        }
        self.verbose |= cli.verbose;
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.tick_period_ms > 0, "tick period must be at least 1 ms");
        ensure!(
            self.max_step.is_finite() && self.max_step > 0.0,
            "max step must be a positive number, got {}",
            self.max_step
        );
        ensure!(self.timeout_secs > 0, "timeout must be at least 1 second");
        ensure!(
            self.max_prompt_chars > 0,
            "max prompt length must be at least 1 character"
        );
        Ok(())
    }

    /// Engine settings; a relative output directory is resolved against the working directory.
    pub fn engine_config(&self) -> EngineConfig {
        let output_dir = if self.output_dir.is_absolute() {
            self.output_dir.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(&self.output_dir)
        };

        EngineConfig {
            simulation: SimulationSettings {
                tick_period: Duration::from_millis(self.tick_period_ms),
                max_step: self.max_step,
                seed: self.seed,
            },
            generation_timeout: Duration::from_secs(self.timeout_secs),
            output_dir,
            clock: system_clock(),
        }
    }
}
