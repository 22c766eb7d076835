use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::JobId;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings {
    pub tick_period: Duration,
    /// Each tick advances progress by a uniform draw from `[0, max_step)`.
    pub max_step: f64,
    /// Fixed seed for reproducible runs; combined with the job id.
    pub seed: Option<u64>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_millis(500),
            max_step: 15.0,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Raw progress after this tick; not clamped, may exceed 100.
    Advanced { percent: f64 },
    Completed,
}

/// Random-walk progress toward 100.
///
/// Completion is only observed on the tick *after* the reading reached 100,
/// at which point the reading is clamped to exactly 100. Once completed every
/// further tick reports `Completed` without changing anything.
#[derive(Debug, Clone)]
pub struct ProgressSimulator {
    percent: f64,
    max_step: f64,
    ticks: u32,
    completed: bool,
}

impl ProgressSimulator {
    pub fn new(max_step: f64) -> Self {
        Self {
            percent: 0.0,
            max_step,
            ticks: 0,
            completed: false,
        }
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> TickOutcome {
        if self.completed {
            return TickOutcome::Completed;
        }
        self.ticks += 1;
        if self.percent >= 100.0 {
            self.percent = 100.0;
            self.completed = true;
            return TickOutcome::Completed;
        }
        if self.max_step > 0.0 {
            self.percent += rng.gen_range(0.0..self.max_step);
        }
        TickOutcome::Advanced {
            percent: self.percent,
        }
    }
}

pub(crate) fn rng_for_job(seed: Option<u64>, job_id: JobId) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(job_id)),
        None => StdRng::from_entropy(),
    }
}
