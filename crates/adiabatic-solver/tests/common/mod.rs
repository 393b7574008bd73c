#![allow(dead_code)]

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use vqaa_core::codec::ControlSequence;
use vqaa_core::{Bitstring, QuantumSampler, Register, SampleDistribution};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Returns the same counts for every control sequence.
pub struct FixedSampler {
    counts: SampleDistribution,
    pub calls: AtomicUsize,
}

impl FixedSampler {
    pub fn new(counts: &[(&str, u64)]) -> Self {
        Self {
            counts: SampleDistribution::from_counts(counts.iter().copied()).unwrap(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl QuantumSampler for FixedSampler {
    fn sample(
        &self,
        _sequence: &ControlSequence,
        _register: &Register,
        _shots: u32,
    ) -> anyhow::Result<SampleDistribution> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.counts.clone())
    }
}

/// Probability of measuring the preferred bitstring for a given pulse.
/// Peaks at amplitude 3 and grows with the detuning magnitude; never below 0.6.
pub fn preferred_probability(sequence: &ControlSequence) -> f64 {
    let amplitude = sequence.amplitude.values[1];
    let detuning = sequence.detuning.values[2].abs();
    0.6 + 0.2 * (-(amplitude - 3.0).powi(2)).exp() + 0.15 * (1.0 - (-detuning).exp())
}

/// Draws each shot from a seeded generator: the preferred bitstring with
/// `preferred_probability`, otherwise one of the alternatives uniformly.
pub struct NoisySampler {
    preferred: Bitstring,
    alternatives: Vec<Bitstring>,
    rng: Mutex<Pcg64>,
}

impl NoisySampler {
    pub fn new(seed: u64, preferred: &str, alternatives: &[&str]) -> Self {
        Self {
            preferred: preferred.parse().unwrap(),
            alternatives: alternatives.iter().map(|s| s.parse().unwrap()).collect(),
            rng: Mutex::new(Pcg64::seed_from_u64(seed)),
        }
    }
}

impl QuantumSampler for NoisySampler {
    fn sample(
        &self,
        sequence: &ControlSequence,
        _register: &Register,
        shots: u32,
    ) -> anyhow::Result<SampleDistribution> {
        let p = preferred_probability(sequence);
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| anyhow::anyhow!("sampler generator poisoned"))?;
        let mut distribution = SampleDistribution::new();
        for _ in 0..shots {
            let bits = if rng.random::<f64>() < p {
                self.preferred.clone()
            } else {
                let index = rng.random_range(0..self.alternatives.len());
                self.alternatives[index].clone()
            };
            distribution.record(bits, 1);
        }
        Ok(distribution)
    }
}

/// Noise-free variant: counts are a pure function of the pulse.
pub struct DeterministicSampler {
    preferred: Bitstring,
    fallback: Bitstring,
}

impl DeterministicSampler {
    pub fn new(preferred: &str, fallback: &str) -> Self {
        Self {
            preferred: preferred.parse().unwrap(),
            fallback: fallback.parse().unwrap(),
        }
    }
}

impl QuantumSampler for DeterministicSampler {
    fn sample(
        &self,
        sequence: &ControlSequence,
        _register: &Register,
        shots: u32,
    ) -> anyhow::Result<SampleDistribution> {
        let hits = (preferred_probability(sequence) * f64::from(shots)).round() as u64;
        let hits = hits.min(u64::from(shots));
        let mut distribution = SampleDistribution::new();
        distribution.record(self.preferred.clone(), hits);
        distribution.record(self.fallback.clone(), u64::from(shots) - hits);
        Ok(distribution)
    }
}

/// Fails the first `failures` calls, then returns fixed counts.
pub struct FlakySampler {
    counts: SampleDistribution,
    failures: usize,
    calls: AtomicUsize,
}

impl FlakySampler {
    pub fn new(failures: usize, counts: &[(&str, u64)]) -> Self {
        Self {
            counts: SampleDistribution::from_counts(counts.iter().copied()).unwrap(),
            failures,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl QuantumSampler for FlakySampler {
    fn sample(
        &self,
        _sequence: &ControlSequence,
        _register: &Register,
        _shots: u32,
    ) -> anyhow::Result<SampleDistribution> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            anyhow::bail!("device rejected sequence #{}", call);
        }
        Ok(self.counts.clone())
    }
}

/// Records the name of the span each sampling pass runs in.
pub struct SpanRecordingSampler {
    inner: FixedSampler,
    pub spans: Mutex<Vec<Option<&'static str>>>,
}

impl SpanRecordingSampler {
    pub fn new(counts: &[(&str, u64)]) -> Self {
        Self {
            inner: FixedSampler::new(counts),
            spans: Mutex::new(Vec::new()),
        }
    }

    pub fn spans(&self) -> Vec<Option<&'static str>> {
        self.spans.lock().unwrap().clone()
    }
}

impl QuantumSampler for SpanRecordingSampler {
    fn sample(
        &self,
        sequence: &ControlSequence,
        register: &Register,
        shots: u32,
    ) -> anyhow::Result<SampleDistribution> {
        let name = tracing::Span::current().metadata().map(|meta| meta.name());
        self.spans
            .lock()
            .map_err(|_| anyhow::anyhow!("span log poisoned"))?
            .push(name);
        self.inner.sample(sequence, register, shots)
    }
}
