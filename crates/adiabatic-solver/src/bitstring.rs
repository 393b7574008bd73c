use crate::error::{Result, VqaaError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A fixed-length selection of graph nodes, one bit per node (`true` = selected).
///
/// Ordering is lexicographic over the `'0'/'1'` rendering, which keeps
/// distributions and rank ties deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Bitstring(Vec<bool>);

impl Bitstring {
    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> &[bool] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Positions of the selected nodes, in ascending order.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, &bit)| bit.then_some(i))
    }

    pub fn count_ones(&self) -> usize {
        self.0.iter().filter(|&&bit| bit).count()
    }
}

impl FromStr for Bitstring {
    type Err = VqaaError;

    fn from_str(s: &str) -> Result<Self> {
        s.chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(VqaaError::InvalidBitstring(format!(
                    "unexpected character {:?} in {:?}",
                    other, s
                ))),
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }
}

impl TryFrom<String> for Bitstring {
    type Error = VqaaError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Bitstring> for String {
    fn from(value: Bitstring) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Bitstring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.0 {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Observed frequency of each bitstring in one sampling pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleDistribution {
    counts: BTreeMap<Bitstring, u64>,
}

impl SampleDistribution {
    pub fn new() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }

    /// Builds a distribution from `'0'/'1'` string keys.
    pub fn from_counts<I, K>(counts: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, u64)>,
        K: AsRef<str>,
    {
        let mut distribution = Self::new();
        for (key, count) in counts {
            distribution.record(key.as_ref().parse()?, count);
        }
        Ok(distribution)
    }

    /// Adds `count` observations of `bitstring`, saturating at `u64::MAX`.
    pub fn record(&mut self, bitstring: Bitstring, count: u64) {
        let entry = self.counts.entry(bitstring).or_insert(0);
        *entry = entry.saturating_add(count);
    }

    pub fn get(&self, bitstring: &Bitstring) -> u64 {
        self.counts.get(bitstring).copied().unwrap_or(0)
    }

    /// Sum of all counts (the number of shots taken).
    pub fn total(&self) -> Result<u64> {
        self.counts.values().try_fold(0u64, |acc, &count| {
            acc.checked_add(count).ok_or_else(|| {
                VqaaError::CountOverflow(format!(
                    "{} distinct bitstrings sum past {}",
                    self.counts.len(),
                    u64::MAX
                ))
            })
        })
    }

    /// Number of distinct bitstrings observed.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Bitstring, u64)> + '_ {
        self.counts.iter().map(|(bits, &count)| (bits, count))
    }

    /// Entries sorted by descending count; equal counts keep lexicographic order.
    pub fn ranked(&self) -> Vec<(Bitstring, u64)> {
        let mut ranked: Vec<(Bitstring, u64)> = self
            .counts
            .iter()
            .map(|(bits, &count)| (bits.clone(), count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

impl FromIterator<(Bitstring, u64)> for SampleDistribution {
    fn from_iter<T: IntoIterator<Item = (Bitstring, u64)>>(iter: T) -> Self {
        let mut distribution = Self::new();
        for (bits, count) in iter {
            distribution.record(bits, count);
        }
        distribution
    }
}
