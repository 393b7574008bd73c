use crate::error::{Result, VqaaError};
use crate::optimizer::{MinimizerMethod, MinimizerOptions};
use serde::{Deserialize, Serialize};

/// Solver configuration. Immutable once handed to a solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Number of decoded solutions to return
    pub top_k: usize,
    /// Range for the random starting amplitude
    pub omega_range: (f64, f64),
    /// Range for the random starting detuning
    pub detuning_range: (f64, f64),
    /// Integer range for the random starting time, upper bound exclusive
    pub time_range: (u32, u32),
    /// Multiplier from `time_range` units to sampler time units (ns)
    pub time_scale: u32,
    pub method: MinimizerMethod,
    /// Number of randomized restarts
    pub repetitions: usize,
    pub tolerance: f64,
    /// Iteration cap per restart
    pub max_iterations: usize,
    /// Shots per sampling pass
    pub shots: u32,
    /// Sampler time grid step
    pub clock_period: u32,
    /// Clip the local search into the starting ranges
    pub bounded: bool,
    /// Concurrent restarts in flight (concurrent driver only)
    pub max_workers: usize,
    /// Seed for the restart generator; `None` draws one at random
    pub seed: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            omega_range: (1.0, 5.0),
            detuning_range: (2.0, 5.0),
            time_range: (8, 28),
            time_scale: 1000,
            method: MinimizerMethod::NelderMead,
            repetitions: 10,
            tolerance: 1e-5,
            max_iterations: 20,
            shots: 1000,
            clock_period: 1,
            bounded: false,
            max_workers: 4,
            seed: None,
        }
    }
}

impl SolverConfig {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_omega_range(mut self, low: f64, high: f64) -> Self {
        self.omega_range = (low, high);
        self
    }

    pub fn with_detuning_range(mut self, low: f64, high: f64) -> Self {
        self.detuning_range = (low, high);
        self
    }

    pub fn with_time_range(mut self, low: u32, high: u32) -> Self {
        self.time_range = (low, high);
        self
    }

    pub fn with_method(mut self, method: MinimizerMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_repetitions(mut self, repetitions: usize) -> Self {
        self.repetitions = repetitions;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_shots(mut self, shots: u32) -> Self {
        self.shots = shots;
        self
    }

    pub fn with_clock_period(mut self, clock_period: u32) -> Self {
        self.clock_period = clock_period;
        self
    }

    pub fn with_bounds(mut self) -> Self {
        self.bounded = true;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_range("omega_range", self.omega_range)?;
        check_range("detuning_range", self.detuning_range)?;
        if self.time_range.0 == 0 || self.time_range.0 >= self.time_range.1 {
            return Err(VqaaError::config(format!(
                "time_range must satisfy 0 < low < high, got {:?}",
                self.time_range
            )));
        }
        if self.time_scale == 0 {
            return Err(VqaaError::config("time_scale must be at least 1"));
        }
        if u64::from(self.time_scale) * u64::from(self.time_range.1) > u64::from(u32::MAX) {
            return Err(VqaaError::config("time_scale * time_range exceeds the sampler time grid"));
        }
        if self.repetitions == 0 {
            return Err(VqaaError::config("repetitions must be at least 1"));
        }
        if self.max_iterations == 0 {
            return Err(VqaaError::config("max_iterations must be at least 1"));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(VqaaError::config(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        if self.shots == 0 {
            return Err(VqaaError::config("shots must be at least 1"));
        }
        if self.clock_period == 0 {
            return Err(VqaaError::config("clock_period must be at least 1"));
        }
        if self.max_workers == 0 {
            return Err(VqaaError::config("max_workers must be at least 1"));
        }
        Ok(())
    }

    /// Box spanned by the starting ranges, in `[time, amplitude, detuning]` order.
    pub fn search_bounds(&self) -> Vec<(f64, f64)> {
        let scale = f64::from(self.time_scale);
        vec![
            (
                scale * f64::from(self.time_range.0),
                scale * f64::from(self.time_range.1),
            ),
            self.omega_range,
            self.detuning_range,
        ]
    }

    pub fn minimizer_options(&self) -> MinimizerOptions {
        MinimizerOptions {
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
            bounds: self.bounded.then(|| self.search_bounds()),
        }
    }
}

fn check_range(name: &str, (low, high): (f64, f64)) -> Result<()> {
    if !low.is_finite() || !high.is_finite() || low > high {
        return Err(VqaaError::config(format!(
            "{} must be a finite range with low <= high, got ({}, {})",
            name, low, high
        )));
    }
    Ok(())
}
