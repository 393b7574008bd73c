use crate::codec::{ParameterCodec, SearchParameters};
use crate::cost::CostModel;
use crate::error::{Result, VqaaError};
use crate::graph::Graph;
use crate::sampler::QuantumSampler;
use crate::topology::Register;
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Expected cost as a function of the search parameters.
///
/// Each evaluation encodes the point, runs one sampling pass and reduces the
/// distribution through the cost model. Sampling noise means two calls with the
/// same point may disagree slightly.
pub struct Objective<'a, S: ?Sized> {
    sampler: &'a S,
    graph: &'a Graph,
    register: &'a Register,
    cost: CostModel,
    codec: ParameterCodec,
    shots: u32,
    evaluations: Cell<usize>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a, S: QuantumSampler + ?Sized> Objective<'a, S> {
    pub fn new(
        sampler: &'a S,
        graph: &'a Graph,
        register: &'a Register,
        cost: CostModel,
        codec: ParameterCodec,
        shots: u32,
    ) -> Self {
        Self {
            sampler,
            graph,
            register,
            cost,
            codec,
            shots,
            evaluations: Cell::new(0),
            cancel: None,
        }
    }

    /// Makes every later evaluation fail with [`VqaaError::Cancelled`] once
    /// `flag` is set.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    pub fn evaluate(&self, params: &SearchParameters) -> Result<f64> {
        if self.is_cancelled() {
            return Err(VqaaError::Cancelled);
        }
        let sequence = self.codec.encode(params)?;
        self.evaluations.set(self.evaluations.get() + 1);

        let distribution = self
            .sampler
            .sample(&sequence, self.register, self.shots)
            .map_err(VqaaError::Sampler)?;

        let total = distribution.total()?;
        if total != u64::from(self.shots) && total != 0 {
            warn!(
                requested = self.shots,
                received = total,
                "sampler returned an unexpected number of shots"
            );
        }

        let value = self.cost.expected_cost(&distribution, self.graph)?;
        debug!(
            time = sequence.duration,
            amplitude = params.amplitude,
            detuning = params.detuning,
            cost = value,
            "objective evaluated"
        );
        Ok(value)
    }

    /// Evaluation in minimizer form: points the codec rejects score `+∞`
    /// instead of failing, every other error propagates.
    pub fn evaluate_point(&self, point: &[f64]) -> Result<f64> {
        let params = SearchParameters::from_slice(point)?;
        match self.evaluate(&params) {
            Err(err) if !err.is_fatal() => {
                debug!(error = %err, "search point rejected");
                Ok(f64::INFINITY)
            }
            other => other,
        }
    }

    /// Number of sampling passes issued so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations.get()
    }

    pub fn graph(&self) -> &Graph {
        self.graph
    }

    pub fn register(&self) -> &Register {
        self.register
    }

    pub fn cost_model(&self) -> CostModel {
        self.cost
    }

    pub fn codec(&self) -> ParameterCodec {
        self.codec
    }

    pub fn shots(&self) -> u32 {
        self.shots
    }

    pub fn sampler(&self) -> &S {
        self.sampler
    }
}
