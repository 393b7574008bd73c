use crate::bitstring::Bitstring;
use crate::error::{Result, VqaaError};
use ndarray::Array2;

/// Undirected problem graph, stored as its upper-triangular adjacency matrix.
///
/// Each edge `{u, v}` lives at `[min(u, v), max(u, v)]`, so it is counted once
/// in `zᵗ·A·z`. Self loops sit on the diagonal. Weights default to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    upper: Array2<f64>,
}

impl Graph {
    /// A graph with `node_count` nodes and no edges.
    pub fn new(node_count: usize) -> Self {
        Self {
            upper: Array2::zeros((node_count, node_count)),
        }
    }

    pub fn from_edges(node_count: usize, edges: &[(usize, usize)]) -> Result<Self> {
        let mut graph = Self::new(node_count);
        for &(u, v) in edges {
            graph.set_edge(u, v, 1.0)?;
        }
        Ok(graph)
    }

    pub fn from_weighted_edges(node_count: usize, edges: &[(usize, usize, f64)]) -> Result<Self> {
        let mut graph = Self::new(node_count);
        for &(u, v, weight) in edges {
            if !weight.is_finite() {
                return Err(VqaaError::invalid_graph(format!(
                    "edge ({}, {}) has non-finite weight {}",
                    u, v, weight
                )));
            }
            graph.set_edge(u, v, weight)?;
        }
        Ok(graph)
    }

    /// Keeps the upper triangle (diagonal included) of a square adjacency matrix.
    pub fn from_adjacency(matrix: Array2<f64>) -> Result<Self> {
        let (rows, cols) = matrix.dim();
        if rows != cols {
            return Err(VqaaError::invalid_graph(format!(
                "adjacency matrix must be square, got {}x{}",
                rows, cols
            )));
        }
        let mut upper = matrix;
        for ((i, j), value) in upper.indexed_iter_mut() {
            if j < i {
                *value = 0.0;
            }
        }
        Ok(Self { upper })
    }

    fn set_edge(&mut self, u: usize, v: usize, weight: f64) -> Result<()> {
        let n = self.node_count();
        if u >= n || v >= n {
            return Err(VqaaError::invalid_graph(format!(
                "edge ({}, {}) references a node outside 0..{}",
                u, v, n
            )));
        }
        let (lo, hi) = if u <= v { (u, v) } else { (v, u) };
        self.upper[[lo, hi]] = weight;
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.upper.nrows()
    }

    pub fn edge_count(&self) -> usize {
        self.upper.iter().filter(|&&w| w != 0.0).count()
    }

    /// Upper-triangular adjacency matrix used by the cost function.
    pub fn upper_adjacency(&self) -> &Array2<f64> {
        &self.upper
    }

    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        let (lo, hi) = if u <= v { (u, v) } else { (v, u) };
        self.upper
            .get([lo, hi])
            .map(|&w| w != 0.0)
            .unwrap_or(false)
    }

    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.node_count()).filter(move |&other| other != node && self.has_edge(node, other))
    }

    /// True when no two selected nodes share an edge (self loops count as violations).
    pub fn is_independent_set(&self, bitstring: &Bitstring) -> Result<bool> {
        if bitstring.len() != self.node_count() {
            return Err(VqaaError::Shape {
                expected: self.node_count(),
                actual: bitstring.len(),
            });
        }
        let selected: Vec<usize> = bitstring.ones().collect();
        Ok(selected
            .iter()
            .enumerate()
            .all(|(i, &u)| selected[i..].iter().all(|&v| !self.has_edge(u, v))))
    }
}
