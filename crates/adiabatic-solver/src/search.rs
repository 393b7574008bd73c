//! Multi-start driver: repeated local searches from random starting points.

use crate::codec::{ParameterCodec, SearchParameters};
use crate::config::SolverConfig;
use crate::cost::CostModel;
use crate::error::{Result, VqaaError};
use crate::graph::Graph;
use crate::objective::Objective;
use crate::optimizer::{Minimizer, MinimizerOptions};
use crate::sampler::QuantumSampler;
use crate::topology::Register;
use ordered_float::OrderedFloat;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn, Span};

/// Result of one restart.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationRun {
    pub restart: usize,
    pub start: SearchParameters,
    pub params: SearchParameters,
    pub cost: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub converged: bool,
}

/// Winning restart plus totals over all restarts.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub best: OptimizationRun,
    pub restarts: usize,
    pub evaluations: usize,
}

#[derive(Debug, Clone)]
pub struct MultiStartSearch<M> {
    minimizer: M,
    config: SolverConfig,
    options: MinimizerOptions,
}

impl<M: Minimizer> MultiStartSearch<M> {
    pub fn new(minimizer: M, config: SolverConfig) -> Result<Self> {
        config.validate()?;
        let options = config.minimizer_options();
        Ok(Self {
            minimizer,
            config,
            options,
        })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Random starting point: uniform amplitude and detuning, time on the
    /// `time_scale` grid.
    pub fn draw_start<R: Rng + ?Sized>(&self, rng: &mut R) -> SearchParameters {
        let (omega_lo, omega_hi) = self.config.omega_range;
        let (detuning_lo, detuning_hi) = self.config.detuning_range;
        let (time_lo, time_hi) = self.config.time_range;

        let amplitude = rng.random_range(omega_lo..=omega_hi);
        let detuning = rng.random_range(detuning_lo..=detuning_hi);
        let time = self.config.time_scale * rng.random_range(time_lo..time_hi);
        SearchParameters::new(f64::from(time), amplitude, detuning)
    }

    /// One local search from `start`.
    pub fn run_restart<S>(
        &self,
        restart: usize,
        start: SearchParameters,
        objective: &Objective<'_, S>,
    ) -> Result<OptimizationRun>
    where
        S: QuantumSampler + ?Sized,
    {
        let before = objective.evaluations();
        let mut f = |x: &[f64]| objective.evaluate_point(x);
        let minimum = self
            .minimizer
            .minimize(&mut f, &start.to_vector(), &self.options)?;
        let params = SearchParameters::from_slice(&minimum.x)?;

        let run = OptimizationRun {
            restart,
            start,
            params,
            cost: minimum.fun,
            iterations: minimum.iterations,
            evaluations: objective.evaluations() - before,
            converged: minimum.converged,
        };
        if run.cost.is_finite() {
            info!(
                restart,
                cost = run.cost,
                time = run.params.time,
                amplitude = run.params.amplitude,
                detuning = run.params.detuning,
                iterations = run.iterations,
                converged = run.converged,
                "restart finished"
            );
        } else {
            warn!(restart, "restart ended without a finite cost");
        }
        Ok(run)
    }

    /// Runs every restart in order and keeps the cheapest.
    pub fn run<S, R>(&self, objective: &Objective<'_, S>, rng: &mut R) -> Result<SearchOutcome>
    where
        S: QuantumSampler + ?Sized,
        R: Rng + ?Sized,
    {
        let mut runs = Vec::with_capacity(self.config.repetitions);
        for restart in 0..self.config.repetitions {
            let start = self.draw_start(rng);
            runs.push(self.run_restart(restart, start, objective)?);
        }
        reduce(runs)
    }
}

impl<M> MultiStartSearch<M>
where
    M: Minimizer + Clone + Send + Sync + 'static,
{
    /// Fans the restarts out over the blocking pool, at most `max_workers` at
    /// a time. Starting points are drawn up front in restart order, so a seeded
    /// generator gives the same starts as [`MultiStartSearch::run`].
    ///
    /// The first failing restart sets a shared flag: no further restart is
    /// spawned, and restarts already running stop at their next evaluation.
    pub async fn run_concurrent<S, R>(
        &self,
        sampler: Arc<S>,
        graph: Arc<Graph>,
        register: Arc<Register>,
        cost: CostModel,
        rng: &mut R,
    ) -> Result<SearchOutcome>
    where
        S: QuantumSampler + Send + Sync + 'static,
        R: Rng + ?Sized,
    {
        let codec = ParameterCodec::new(self.config.clock_period)?;
        let shots = self.config.shots;
        let starts: Vec<SearchParameters> = (0..self.config.repetitions)
            .map(|_| self.draw_start(rng))
            .collect();

        let span = Span::current();
        let cancel = Arc::new(AtomicBool::new(false));
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers));
        let mut tasks = JoinSet::new();
        for (restart, start) in starts.into_iter().enumerate() {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| VqaaError::config(format!("worker pool closed: {}", e)))?;
            if cancel.load(Ordering::SeqCst) {
                break;
            }
            let search = self.clone();
            let sampler = Arc::clone(&sampler);
            let graph = Arc::clone(&graph);
            let register = Arc::clone(&register);
            let cancel = Arc::clone(&cancel);
            let span = span.clone();

            tasks.spawn_blocking(move || {
                let _permit = permit;
                let _entered = span.enter();
                let objective = Objective::new(&*sampler, &graph, &register, cost, codec, shots)
                    .with_cancellation(Arc::clone(&cancel));
                let run = search.run_restart(restart, start, &objective);
                if run.is_err() {
                    cancel.store(true, Ordering::SeqCst);
                }
                run
            });
        }

        let mut runs = Vec::with_capacity(self.config.repetitions);
        let mut failure = None;
        while let Some(joined) = tasks.join_next().await {
            match joined.map_err(VqaaError::from).and_then(|run| run) {
                Ok(run) => runs.push(run),
                Err(VqaaError::Cancelled) => {}
                Err(err) => {
                    cancel.store(true, Ordering::SeqCst);
                    if failure.is_none() {
                        warn!(error = %err, "restart failed, cancelling the others");
                        failure = Some(err);
                    }
                }
            }
        }
        if let Some(err) = failure {
            return Err(err);
        }
        runs.sort_by_key(|run| run.restart);
        reduce(runs)
    }
}

fn reduce(runs: Vec<OptimizationRun>) -> Result<SearchOutcome> {
    let restarts = runs.len();
    let evaluations = runs.iter().map(|run| run.evaluations).sum();
    let best = select_best(runs)?;
    info!(
        restart = best.restart,
        cost = best.cost,
        restarts,
        evaluations,
        "best restart selected"
    );
    Ok(SearchOutcome {
        best,
        restarts,
        evaluations,
    })
}

/// Cheapest run with a finite cost; ties go to the earliest restart.
pub fn select_best(runs: Vec<OptimizationRun>) -> Result<OptimizationRun> {
    let restarts = runs.len();
    runs.into_iter()
        .filter(|run| run.cost.is_finite())
        .min_by_key(|run| OrderedFloat(run.cost))
        .ok_or(VqaaError::NoConvergence { restarts })
}
