//! Derivative-free local minimizers.
//!
//! Every evaluation of the objective costs one sampling pass, so minimizers run
//! under a small iteration cap and always hand back the best point they
//! visited, converged or not.

use crate::error::{Result, VqaaError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod nelder_mead;

pub use nelder_mead::NelderMead;

/// Objective in minimizer form.
pub type ObjectiveFn<'a> = dyn FnMut(&[f64]) -> Result<f64> + 'a;

/// Per-call options.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimizerOptions {
    /// Convergence threshold on the standard deviation of the simplex values.
    pub tolerance: f64,
    pub max_iterations: usize,
    /// Optional box `(low, high)` per coordinate; candidates are clipped into it.
    pub bounds: Option<Vec<(f64, f64)>>,
}

impl Default for MinimizerOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-5,
            max_iterations: 20,
            bounds: None,
        }
    }
}

impl MinimizerOptions {
    /// Clips `point` into the bounds, if any.
    pub fn clip(&self, point: &mut [f64]) {
        if let Some(bounds) = &self.bounds {
            for (value, &(low, high)) in point.iter_mut().zip(bounds) {
                *value = value.clamp(low, high);
            }
        }
    }
}

/// Best point found by a minimizer run.
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub x: Vec<f64>,
    /// `+∞` when no visited point had a finite value.
    pub fun: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub converged: bool,
}

pub trait Minimizer {
    fn minimize(
        &self,
        objective: &mut ObjectiveFn<'_>,
        x0: &[f64],
        options: &MinimizerOptions,
    ) -> Result<Minimum>;
}

/// Derivative-free methods selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MinimizerMethod {
    #[default]
    NelderMead,
}

impl FromStr for MinimizerMethod {
    type Err = VqaaError;

    fn from_str(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "nelder-mead" | "nelder_mead" | "neldermead" | "simplex" => Ok(Self::NelderMead),
            other => Err(VqaaError::config(format!("unknown minimizer method: {}", other))),
        }
    }
}

impl fmt::Display for MinimizerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NelderMead => f.write_str("Nelder-Mead"),
        }
    }
}

impl Minimizer for MinimizerMethod {
    fn minimize(
        &self,
        objective: &mut ObjectiveFn<'_>,
        x0: &[f64],
        options: &MinimizerOptions,
    ) -> Result<Minimum> {
        match self {
            Self::NelderMead => NelderMead::default().minimize(objective, x0, options),
        }
    }
}

/// Maps NaN to `+∞` so it never wins a comparison.
pub(crate) fn sanitize(value: f64) -> f64 {
    if value.is_nan() {
        f64::INFINITY
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names() -> Result<()> {
        assert_eq!("Nelder-Mead".parse::<MinimizerMethod>()?, MinimizerMethod::NelderMead);
        assert_eq!(" simplex ".parse::<MinimizerMethod>()?, MinimizerMethod::NelderMead);
        assert!(matches!("BFGS".parse::<MinimizerMethod>(), Err(VqaaError::Config(_))));
        assert!(matches!("compass".parse::<MinimizerMethod>(), Err(VqaaError::Config(_))));
        assert_eq!(MinimizerMethod::NelderMead.to_string(), "Nelder-Mead");
        Ok(())
    }

    #[test]
    fn test_clip_respects_bounds() {
        let options = MinimizerOptions {
            bounds: Some(vec![(0.0, 1.0), (-1.0, 1.0)]),
            ..MinimizerOptions::default()
        };
        let mut point = [2.0, -3.0];
        options.clip(&mut point);
        assert_eq!(point, [1.0, -1.0]);
    }
}
