use crate::bitstring::{Bitstring, SampleDistribution};
use crate::error::{Result, VqaaError};
use crate::graph::Graph;
use ndarray::Array1;

/// Penalized independent-set cost: `penalty · zᵗ·A_upper·z − Σz`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    penalty: f64,
}

impl CostModel {
    pub fn new(penalty: f64) -> Result<Self> {
        if !penalty.is_finite() || penalty < 0.0 {
            return Err(VqaaError::config(format!(
                "penalty must be a finite non-negative number, got {}",
                penalty
            )));
        }
        Ok(Self { penalty })
    }

    pub fn penalty(&self) -> f64 {
        self.penalty
    }

    /// Cost of a single configuration.
    pub fn cost(&self, bitstring: &Bitstring, graph: &Graph) -> Result<f64> {
        if bitstring.len() != graph.node_count() {
            return Err(VqaaError::Shape {
                expected: graph.node_count(),
                actual: bitstring.len(),
            });
        }
        let z: Array1<f64> = bitstring
            .bits()
            .iter()
            .map(|&bit| if bit { 1.0 } else { 0.0 })
            .collect();
        let violations = z.dot(&graph.upper_adjacency().dot(&z));
        Ok(self.penalty * violations - z.sum())
    }

    /// Frequency-weighted mean cost over a sampled distribution.
    pub fn expected_cost(&self, distribution: &SampleDistribution, graph: &Graph) -> Result<f64> {
        let total = distribution.total()?;
        if total == 0 {
            return Err(VqaaError::EmptyDistribution);
        }
        let mut weighted = 0.0;
        for (bits, count) in distribution.iter() {
            weighted += count as f64 * self.cost(bits, graph)?;
        }
        Ok(weighted / total as f64)
    }
}
