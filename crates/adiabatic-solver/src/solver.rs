//! Caller-facing entry points.
//!
//! A solve validates its inputs, runs the multi-start search, then samples
//! once more at the winning parameters to rank and decode solutions.

use crate::codec::{ParameterCodec, SearchParameters};
use crate::config::SolverConfig;
use crate::cost::CostModel;
use crate::error::{Result, VqaaError};
use crate::extract::{Solution, SolutionExtractor};
use crate::graph::Graph;
use crate::objective::Objective;
use crate::sampler::QuantumSampler;
use crate::search::{MultiStartSearch, SearchOutcome};
use crate::topology::Register;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, info_span, Instrument, Span};
use uuid::Uuid;

/// Everything a solve produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveReport {
    pub run_id: Uuid,
    /// Index of the winning restart.
    pub best_restart: usize,
    /// Expected cost reached by the winning restart.
    pub best_cost: f64,
    /// Objective evaluations across all restarts (excluding the final pass).
    pub evaluations: usize,
    pub solution: Solution,
}

impl SolveReport {
    pub fn optimal_params(&self) -> SearchParameters {
        self.solution.optimal_params
    }

    pub fn decoded_solutions(&self) -> &[Vec<String>] {
        &self.solution.decoded_solutions
    }
}

fn check_inputs(register: &Register, graph: &Graph, config: &SolverConfig) -> Result<()> {
    config.validate()?;
    if register.len() != graph.node_count() {
        return Err(VqaaError::config(format!(
            "register has {} sites but the graph has {} nodes",
            register.len(),
            graph.node_count()
        )));
    }
    Ok(())
}

fn seeded_rng(config: &SolverConfig) -> Pcg64 {
    Pcg64::seed_from_u64(config.seed.unwrap_or_else(rand::random))
}

fn report(run_id: Uuid, outcome: SearchOutcome, solution: Solution) -> SolveReport {
    SolveReport {
        run_id,
        best_restart: outcome.best.restart,
        best_cost: outcome.best.cost,
        evaluations: outcome.evaluations,
        solution,
    }
}

/// Solves sequentially: restarts run one after another on the calling thread.
pub fn solve<S>(
    sampler: &S,
    register: &Register,
    graph: &Graph,
    penalty: f64,
    config: &SolverConfig,
) -> Result<SolveReport>
where
    S: QuantumSampler + ?Sized,
{
    check_inputs(register, graph, config)?;
    let cost = CostModel::new(penalty)?;
    let codec = ParameterCodec::new(config.clock_period)?;

    let run_id = Uuid::new_v4();
    let span = info_span!("solve", run_id = %run_id, nodes = graph.node_count(), penalty);
    let _guard = span.enter();
    info!(repetitions = config.repetitions, method = %config.method, "starting solve");

    let objective = Objective::new(sampler, graph, register, cost, codec, config.shots);
    let search = MultiStartSearch::new(config.method, config.clone())?;
    let outcome = search.run(&objective, &mut seeded_rng(config))?;

    let solution = SolutionExtractor::new(config.top_k).extract(outcome.best.params, &objective)?;
    Ok(report(run_id, outcome, solution))
}

/// Solves with restarts fanned out over tokio's blocking pool.
pub async fn solve_concurrent<S>(
    sampler: Arc<S>,
    register: Register,
    graph: Graph,
    penalty: f64,
    config: SolverConfig,
) -> Result<SolveReport>
where
    S: QuantumSampler + Send + Sync + 'static,
{
    check_inputs(&register, &graph, &config)?;
    let cost = CostModel::new(penalty)?;
    let codec = ParameterCodec::new(config.clock_period)?;

    let run_id = Uuid::new_v4();
    let span = info_span!("solve", run_id = %run_id, nodes = graph.node_count(), penalty);
    async move {
        info!(
            repetitions = config.repetitions,
            workers = config.max_workers,
            method = %config.method,
            "starting concurrent solve"
        );

        let graph = Arc::new(graph);
        let register = Arc::new(register);
        let search = MultiStartSearch::new(config.method, config.clone())?;
        let outcome = search
            .run_concurrent(
                Arc::clone(&sampler),
                Arc::clone(&graph),
                Arc::clone(&register),
                cost,
                &mut seeded_rng(&config),
            )
            .await?;

        let best = outcome.best.params;
        let top_k = config.top_k;
        let shots = config.shots;
        let span = Span::current();
        let solution = tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            let objective = Objective::new(&*sampler, &graph, &register, cost, codec, shots);
            SolutionExtractor::new(top_k).extract(best, &objective)
        })
        .await??;

        info!(best_cost = outcome.best.cost, "concurrent solve finished");
        Ok::<_, VqaaError>(report(run_id, outcome, solution))
    }
    .instrument(span)
    .await
}
