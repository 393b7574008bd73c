//! Encoding of search points into control sequences for the sampler.
//!
//! A search point is `(time, amplitude, detuning)`. The codec turns it into a
//! single global pulse whose amplitude rises from (almost) zero to the target
//! and back, while the detuning sweeps linearly from `-detuning` to `+detuning`.

use crate::error::{Result, VqaaError};
use serde::{Deserialize, Serialize};

/// Amplitude at the start and end of the pulse. Strictly positive so the
/// profile never starts exactly at zero.
pub const AMPLITUDE_FLOOR: f64 = 1e-9;

/// Channel driven by every encoded pulse.
pub const GLOBAL_CHANNEL: &str = "rydberg_global";

/// One point of the continuous search space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchParameters {
    /// Evolution time in the sampler's native units (ns).
    pub time: f64,
    /// Peak Rabi frequency.
    pub amplitude: f64,
    /// Detuning magnitude at both ends of the sweep.
    pub detuning: f64,
}

impl SearchParameters {
    pub fn new(time: f64, amplitude: f64, detuning: f64) -> Self {
        Self {
            time,
            amplitude,
            detuning,
        }
    }

    /// Vector form used by the minimizers: `[time, amplitude, detuning]`.
    pub fn to_vector(&self) -> [f64; 3] {
        [self.time, self.amplitude, self.detuning]
    }

    pub fn from_slice(values: &[f64]) -> Result<Self> {
        match values {
            [time, amplitude, detuning] => Ok(Self::new(*time, *amplitude, *detuning)),
            _ => Err(VqaaError::invalid_parameters(format!(
                "expected 3 search coordinates, got {}",
                values.len()
            ))),
        }
    }
}

/// Waveform defined by evenly spaced anchor values over `duration`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpolatedWaveform {
    pub duration: u32,
    pub values: Vec<f64>,
}

impl InterpolatedWaveform {
    pub fn new(duration: u32, values: Vec<f64>) -> Self {
        Self { duration, values }
    }

    /// Piecewise-linear value at time `t`, clamped to `[0, duration]`.
    pub fn value_at(&self, t: f64) -> f64 {
        match self.values.len() {
            0 => 0.0,
            1 => self.values[0],
            n => {
                let span = f64::from(self.duration.max(1));
                let position = (t.clamp(0.0, span) / span) * (n - 1) as f64;
                let index = (position.floor() as usize).min(n - 2);
                let frac = position - index as f64;
                self.values[index] + frac * (self.values[index + 1] - self.values[index])
            }
        }
    }
}

/// Time-ordered control specification handed to the sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlSequence {
    pub channel: String,
    /// Total duration on the sampler's time grid.
    pub duration: u32,
    pub amplitude: InterpolatedWaveform,
    pub detuning: InterpolatedWaveform,
    pub phase: f64,
}

/// Maps search points to control sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterCodec {
    /// Time grid step of the sampler; durations are floored to a multiple of it.
    clock_period: u32,
}

impl Default for ParameterCodec {
    fn default() -> Self {
        Self { clock_period: 1 }
    }
}

impl ParameterCodec {
    pub fn new(clock_period: u32) -> Result<Self> {
        if clock_period == 0 {
            return Err(VqaaError::config("clock period must be at least 1"));
        }
        Ok(Self { clock_period })
    }

    pub fn clock_period(&self) -> u32 {
        self.clock_period
    }

    /// Truncates a continuous time onto the sampler grid.
    pub fn coerce_time(&self, time: f64) -> Result<u32> {
        if !time.is_finite() || time < 1.0 {
            return Err(VqaaError::invalid_parameters(format!(
                "evolution time must be positive, got {}",
                time
            )));
        }
        if time >= f64::from(u32::MAX) {
            return Err(VqaaError::invalid_parameters(format!(
                "evolution time {} exceeds the sampler time grid",
                time
            )));
        }
        let truncated = time as u32;
        let duration = truncated - truncated % self.clock_period;
        if duration == 0 {
            return Err(VqaaError::invalid_parameters(format!(
                "evolution time {} is shorter than one clock period ({})",
                time, self.clock_period
            )));
        }
        Ok(duration)
    }

    pub fn encode(&self, params: &SearchParameters) -> Result<ControlSequence> {
        let duration = self.coerce_time(params.time)?;
        if !params.amplitude.is_finite() || params.amplitude < 0.0 {
            return Err(VqaaError::invalid_parameters(format!(
                "amplitude must be finite and non-negative, got {}",
                params.amplitude
            )));
        }
        if !params.detuning.is_finite() {
            return Err(VqaaError::invalid_parameters(format!(
                "detuning must be finite, got {}",
                params.detuning
            )));
        }

        Ok(ControlSequence {
            channel: GLOBAL_CHANNEL.to_string(),
            duration,
            amplitude: InterpolatedWaveform::new(
                duration,
                vec![AMPLITUDE_FLOOR, params.amplitude, AMPLITUDE_FLOOR],
            ),
            detuning: InterpolatedWaveform::new(
                duration,
                vec![-params.detuning, 0.0, params.detuning],
            ),
            phase: 0.0,
        })
    }
}
