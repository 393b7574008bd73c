use super::{sanitize, Minimizer, MinimizerOptions, Minimum, ObjectiveFn};
use crate::error::{Result, VqaaError};
use argmin::core::{CostFunction, Executor, State, TerminationReason};
use argmin::solver::neldermead::NelderMead as ArgminNelderMead;
use ndarray::Array1;
use std::cell::{Cell, RefCell};
use tracing::debug;

/// Parameter vector handed to argmin.
pub type Point = Array1<f64>;

/// Downhill simplex method backed by argmin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NelderMead {
    pub reflection: f64,
    pub expansion: f64,
    pub contraction: f64,
    pub shrink: f64,
    /// Relative step used to build the initial simplex around a non-zero coordinate.
    pub initial_step: f64,
    /// Absolute step used for coordinates that are exactly zero.
    pub zero_step: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
            initial_step: 0.05,
            zero_step: 0.00025,
        }
    }
}

/// Exposes an objective closure to argmin.
///
/// Candidates are clipped into the bounds before evaluation and NaN scores as
/// `+∞`. Objective errors travel through argmin as `anyhow` errors and are
/// recovered by [`recover_error`].
struct ObjectiveProblem<'o, 'a> {
    objective: RefCell<&'o mut ObjectiveFn<'a>>,
    options: &'o MinimizerOptions,
    evaluations: &'o Cell<usize>,
}

impl CostFunction for ObjectiveProblem<'_, '_> {
    type Param = Point;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
        let mut point = param.to_vec();
        self.options.clip(&mut point);
        self.evaluations.set(self.evaluations.get() + 1);
        let value = {
            let mut objective = self.objective.borrow_mut();
            (&mut **objective)(&point)?
        };
        Ok(sanitize(value))
    }
}

fn recover_error(err: argmin::core::Error) -> VqaaError {
    match err.downcast::<VqaaError>() {
        Ok(err) => err,
        Err(other) => VqaaError::Optimizer(other.to_string()),
    }
}

impl NelderMead {
    /// `x0` plus one vertex per coordinate, each coordinate scaled by
    /// `1 + initial_step` (or set to `zero_step` when it is zero).
    pub fn initial_simplex(&self, x0: &[f64]) -> Vec<Point> {
        let mut simplex = Vec::with_capacity(x0.len() + 1);
        simplex.push(Point::from(x0.to_vec()));
        for k in 0..x0.len() {
            let mut vertex = Point::from(x0.to_vec());
            vertex[k] = if vertex[k] != 0.0 {
                (1.0 + self.initial_step) * vertex[k]
            } else {
                self.zero_step
            };
            simplex.push(vertex);
        }
        simplex
    }

    fn solver(
        &self,
        x0: &[f64],
        tolerance: f64,
    ) -> std::result::Result<ArgminNelderMead<Point, f64>, argmin::core::Error> {
        ArgminNelderMead::new(self.initial_simplex(x0))
            .with_alpha(self.reflection)?
            .with_gamma(self.expansion)?
            .with_rho(self.contraction)?
            .with_sigma(self.shrink)?
            .with_sd_tolerance(tolerance)
    }
}

impl Minimizer for NelderMead {
    fn minimize(
        &self,
        objective: &mut ObjectiveFn<'_>,
        x0: &[f64],
        options: &MinimizerOptions,
    ) -> Result<Minimum> {
        if x0.is_empty() {
            return Err(VqaaError::config("cannot minimize over an empty parameter vector"));
        }
        let solver = self
            .solver(x0, options.tolerance)
            .map_err(|e| VqaaError::config(e.to_string()))?;

        let evaluations = Cell::new(0usize);
        let problem = ObjectiveProblem {
            objective: RefCell::new(objective),
            options,
            evaluations: &evaluations,
        };
        let max_iterations = options.max_iterations as u64;
        let result = Executor::new(problem, solver)
            .configure(|state| state.max_iters(max_iterations))
            .run()
            .map_err(recover_error)?;

        let state = result.state();
        let mut x = state
            .get_best_param()
            .map(|best| best.to_vec())
            .unwrap_or_else(|| x0.to_vec());
        options.clip(&mut x);
        let converged = matches!(
            state.get_termination_reason(),
            Some(TerminationReason::SolverConverged)
        );
        debug!(
            iterations = state.get_iter(),
            evaluations = evaluations.get(),
            best = state.get_best_cost(),
            converged,
            "simplex finished"
        );

        Ok(Minimum {
            x,
            fun: state.get_best_cost(),
            iterations: state.get_iter() as usize,
            evaluations: evaluations.get(),
            converged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadratic(x: &[f64]) -> Result<f64> {
        Ok((x[0] - 3.0).powi(2) + 2.0 * (x[1] + 1.0).powi(2) + 0.5 * (x[2] - 0.5).powi(2))
    }

    #[test]
    fn test_initial_simplex_uses_relative_and_zero_steps() {
        let simplex = NelderMead::default().initial_simplex(&[8000.0, 0.0, 2.0]);
        assert_eq!(simplex.len(), 4);
        assert_eq!(simplex[0].to_vec(), vec![8000.0, 0.0, 2.0]);
        assert!((simplex[1][0] - 8400.0).abs() < 1e-9);
        assert_eq!(simplex[1][1], 0.0);
        assert_eq!(simplex[2].to_vec(), vec![8000.0, 0.00025, 2.0]);
        assert!((simplex[3][2] - 2.1).abs() < 1e-12);
    }

    #[test]
    fn test_converges_on_smooth_bowl() -> Result<()> {
        let options = MinimizerOptions {
            tolerance: 1e-10,
            max_iterations: 2000,
            bounds: None,
        };
        let result = NelderMead::default().minimize(&mut quadratic, &[1.0, 1.0, 1.0], &options)?;
        assert!((result.x[0] - 3.0).abs() < 1e-2, "{:?}", result.x);
        assert!((result.x[1] + 1.0).abs() < 1e-2, "{:?}", result.x);
        assert!((result.x[2] - 0.5).abs() < 1e-2, "{:?}", result.x);
        assert!(result.fun < 1e-4);
        Ok(())
    }

    #[test]
    fn test_iteration_cap_returns_best_point_visited() -> Result<()> {
        let options = MinimizerOptions {
            max_iterations: 3,
            ..MinimizerOptions::default()
        };
        let mut seen = Vec::new();
        let mut recording = |x: &[f64]| -> Result<f64> {
            let value = quadratic(x)?;
            seen.push(value);
            Ok(value)
        };
        let result = NelderMead::default().minimize(&mut recording, &[10.0, 10.0, 10.0], &options)?;
        assert!(!result.converged);
        assert!(result.iterations <= 3);
        let best_seen = seen.iter().cloned().fold(f64::INFINITY, f64::min);
        assert_eq!(result.fun, best_seen);
        assert_eq!(result.evaluations, seen.len());
        Ok(())
    }

    #[test]
    fn test_flat_objective_keeps_start() -> Result<()> {
        let mut flat = |_: &[f64]| -> Result<f64> { Ok(7.0) };
        let result = NelderMead::default().minimize(&mut flat, &[8000.0, 2.0, 3.0], &MinimizerOptions::default())?;
        assert_eq!(result.fun, 7.0);
        assert_eq!(result.x, vec![8000.0, 2.0, 3.0]);
        assert!(result.converged);
        Ok(())
    }

    #[test]
    fn test_infinite_region_is_avoided() -> Result<()> {
        let mut walled = |x: &[f64]| -> Result<f64> {
            if x[0] < 0.0 {
                Ok(f64::INFINITY)
            } else {
                Ok((x[0] - 1.0).powi(2))
            }
        };
        let options = MinimizerOptions {
            tolerance: 1e-10,
            max_iterations: 500,
            bounds: None,
        };
        let result = NelderMead::default().minimize(&mut walled, &[5.0], &options)?;
        assert!(result.fun.is_finite());
        assert!((result.x[0] - 1.0).abs() < 1e-2);
        Ok(())
    }

    #[test]
    fn test_nan_scores_never_win() -> Result<()> {
        let mut holed = |x: &[f64]| -> Result<f64> {
            if x[0] > 5.1 {
                Ok(f64::NAN)
            } else {
                Ok(x[0])
            }
        };
        let result = NelderMead::default().minimize(&mut holed, &[5.0], &MinimizerOptions::default())?;
        assert!(result.fun.is_finite());
        assert!(result.fun <= 5.0);
        Ok(())
    }

    #[test]
    fn test_bounds_are_respected() -> Result<()> {
        let options = MinimizerOptions {
            tolerance: 1e-10,
            max_iterations: 500,
            bounds: Some(vec![(2.0, 4.0)]),
        };
        let mut slope = |x: &[f64]| -> Result<f64> {
            assert!((2.0..=4.0).contains(&x[0]));
            Ok(x[0])
        };
        let result = NelderMead::default().minimize(&mut slope, &[3.0], &options)?;
        assert!(result.x[0] >= 2.0);
        assert!((result.x[0] - 2.0).abs() < 1e-3);
        Ok(())
    }

    #[test]
    fn test_objective_errors_propagate() {
        let mut failing = |_: &[f64]| -> Result<f64> { Err(VqaaError::EmptyDistribution) };
        let err = NelderMead::default()
            .minimize(&mut failing, &[1.0, 2.0], &MinimizerOptions::default())
            .unwrap_err();
        assert!(matches!(err, VqaaError::EmptyDistribution));
    }

    #[test]
    fn test_empty_start_is_rejected() {
        let mut unused = |_: &[f64]| -> Result<f64> { Ok(0.0) };
        let err = NelderMead::default()
            .minimize(&mut unused, &[], &MinimizerOptions::default())
            .unwrap_err();
        assert!(matches!(err, VqaaError::Config(_)));
    }
}
