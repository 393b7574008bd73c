use crate::bitstring::SampleDistribution;
use crate::codec::ControlSequence;
use crate::topology::Register;
use anyhow::Result;

/// Boundary to the physical or simulated sampling process.
///
/// Implementations run the control sequence on the register and measure
/// `shots` times. Results are expected to be noisy; an `Err` is a hard failure
/// (for example a register the device cannot host) and aborts the solve.
pub trait QuantumSampler {
    fn sample(
        &self,
        sequence: &ControlSequence,
        register: &Register,
        shots: u32,
    ) -> Result<SampleDistribution>;
}

impl<F> QuantumSampler for F
where
    F: Fn(&ControlSequence, &Register, u32) -> Result<SampleDistribution>,
{
    fn sample(
        &self,
        sequence: &ControlSequence,
        register: &Register,
        shots: u32,
    ) -> Result<SampleDistribution> {
        self(sequence, register, shots)
    }
}
