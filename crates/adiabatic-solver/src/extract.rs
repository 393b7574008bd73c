use crate::bitstring::Bitstring;
use crate::codec::SearchParameters;
use crate::error::{Result, VqaaError};
use crate::objective::Objective;
use crate::sampler::QuantumSampler;
use serde::Serialize;
use tracing::info;

/// One ranked bitstring from the final sampling pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedBitstring {
    pub bitstring: Bitstring,
    pub count: u64,
    /// Cost of this configuration under the solve's penalty.
    pub cost: f64,
}

/// Final answer of a solve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    /// Every observed bitstring, most frequent first.
    pub ranked_distribution: Vec<RankedBitstring>,
    pub optimal_params: SearchParameters,
    /// Register identifiers of the selected sites for the `top_k` most frequent bitstrings.
    pub decoded_solutions: Vec<Vec<String>>,
}

impl Solution {
    /// Most frequent bitstring, if any sample was taken.
    pub fn most_frequent(&self) -> Option<&RankedBitstring> {
        self.ranked_distribution.first()
    }
}

/// Re-samples at the winning parameters and decodes the top bitstrings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolutionExtractor {
    top_k: usize,
}

impl SolutionExtractor {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    pub fn extract<S>(&self, optimal_params: SearchParameters, objective: &Objective<'_, S>) -> Result<Solution>
    where
        S: QuantumSampler + ?Sized,
    {
        let sequence = objective.codec().encode(&optimal_params)?;
        let distribution = objective
            .sampler()
            .sample(&sequence, objective.register(), objective.shots())
            .map_err(VqaaError::Sampler)?;
        if distribution.total()? == 0 {
            return Err(VqaaError::EmptyDistribution);
        }

        let cost_model = objective.cost_model();
        let ranked_distribution = distribution
            .ranked()
            .into_iter()
            .map(|(bitstring, count)| {
                let cost = cost_model.cost(&bitstring, objective.graph())?;
                Ok(RankedBitstring {
                    bitstring,
                    count,
                    cost,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let decoded_solutions = ranked_distribution
            .iter()
            .take(self.top_k)
            .map(|entry| objective.register().decode(&entry.bitstring))
            .collect::<Result<Vec<_>>>()?;

        if let Some(top) = ranked_distribution.first() {
            info!(
                bitstring = %top.bitstring,
                count = top.count,
                cost = top.cost,
                distinct = ranked_distribution.len(),
                "final distribution ranked"
            );
        }

        Ok(Solution {
            ranked_distribution,
            optimal_params,
            decoded_solutions,
        })
    }
}
