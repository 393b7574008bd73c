pub mod topology {
    use crate::bitstring::Bitstring;
    use crate::error::{Result, VqaaError};
    use serde::{Deserialize, Serialize};

    /// Ordered physical sites, one per graph node.
    /// Position `i` of every bitstring refers to `qubit_ids[i]`.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Register {
        pub qubit_ids: Vec<String>,
    }

    impl Register {
        pub fn new<I, S>(ids: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                qubit_ids: ids.into_iter().map(Into::into).collect(),
            }
        }

        pub fn len(&self) -> usize {
            self.qubit_ids.len()
        }

        pub fn is_empty(&self) -> bool {
            self.qubit_ids.is_empty()
        }

        pub fn qubit_id(&self, index: usize) -> Option<&str> {
            self.qubit_ids.get(index).map(String::as_str)
        }

        /// Identifiers of the selected sites, in register order.
        pub fn decode(&self, bitstring: &Bitstring) -> Result<Vec<String>> {
            if bitstring.len() != self.qubit_ids.len() {
                return Err(VqaaError::Shape {
                    expected: self.qubit_ids.len(),
                    actual: bitstring.len(),
                });
            }
            Ok(bitstring
                .ones()
                .map(|i| self.qubit_ids[i].clone())
                .collect())
        }
    }

}

pub mod bitstring;
pub mod codec;
pub mod config;
pub mod cost;
pub mod error;
pub mod extract;
pub mod graph;
pub mod objective;
pub mod optimizer;
pub mod sampler;
pub mod search;
pub mod solver;

pub use bitstring::{Bitstring, SampleDistribution};
pub use codec::{ControlSequence, ParameterCodec, SearchParameters};
pub use config::SolverConfig;
pub use cost::CostModel;
pub use error::{Result, VqaaError};
pub use graph::Graph;
pub use sampler::QuantumSampler;
pub use solver::{solve, solve_concurrent, SolveReport};
pub use topology::Register;
