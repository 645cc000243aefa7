//! Virtual branches derived from a single indirect branch.

use crate::history::*;

/// Multiplicative constant used to salt each iteration ("Knuth's hash").
const HASH_MULTIPLIER: u64 = 2654435761;

/// Produce a fixed 32-bit salt for some iteration.
pub fn iteration_hash(iter: usize) -> usize {
    ((iter as u64).wrapping_mul(HASH_MULTIPLIER) & 0xFFFF_FFFF) as usize
}

/// A virtual branch visited while walking a [`VirtualChain`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VirtualBranch {
    /// Position in the chain (starting from 1)
    pub step: usize,

    /// Virtual program counter value
    pub vpc: usize,

    /// Virtual global history
    pub history: HistoryRegister,
}

/// Iterator over the virtual branches for some indirect branch.
///
/// The first virtual branch uses the real program counter and global history.
/// Each following branch XORs the program counter with [`iteration_hash`]
/// and shifts the previous virtual history by one bit.
#[derive(Clone, Debug)]
pub struct VirtualChain {
    pc: usize,
    history: HistoryRegister,
    step: usize,
    max_iter: usize,
}
impl VirtualChain {
    pub fn new(pc: usize, history: HistoryRegister, max_iter: usize) -> Self {
        Self { pc, history, step: 0, max_iter }
    }
}
impl Iterator for VirtualChain {
    type Item = VirtualBranch;
    fn next(&mut self) -> Option<VirtualBranch> {
        if self.step >= self.max_iter {
            return None;
        }
        if self.step > 0 {
            self.history.shift_by(1);
        }
        self.step += 1;
        let vpc = match self.step {
            1 => self.pc,
            n => self.pc ^ iteration_hash(n - 1),
        };
        Some(VirtualBranch {
            step: self.step,
            vpc,
            history: self.history.clone(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rem = self.max_iter - self.step;
        (rem, Some(rem))
    }
}

/// The result of walking a [`VirtualChain`] during prediction.
///
/// Records the number of virtual branches visited along with the perceptron
/// output computed for each of them. Outputs for steps beyond the recorded
/// length are filled in later during training.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainResult {
    /// Number of virtual branches visited
    len: usize,

    /// Perceptron output for each virtual branch
    outputs: Vec<i32>,
}
impl ChainResult {
    pub fn new(max_iter: usize) -> Self {
        Self { len: 0, outputs: vec![0; max_iter] }
    }

    /// Returns the number of virtual branches visited during prediction.
    pub fn len(&self) -> usize { self.len }

    /// Returns the perceptron outputs for all steps.
    pub fn outputs(&self) -> &[i32] { &self.outputs }

    /// Returns the output recorded for some step.
    pub fn output(&self, step: usize) -> i32 {
        self.outputs[step - 1]
    }

    /// Returns 'true' if the output for this step was computed during
    /// prediction.
    pub fn is_resolved(&self, step: usize) -> bool {
        step <= self.len
    }

    /// Add a perceptron output into the slot for some step.
    pub fn accumulate(&mut self, step: usize, output: i32) -> i32 {
        self.outputs[step - 1] += output;
        self.outputs[step - 1]
    }

    pub(crate) fn set_len(&mut self, len: usize) {
        assert!(len >= 1 && len <= self.outputs.len());
        self.len = len;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::branch::Outcome;

    #[test]
    fn hash_constants() {
        assert_eq!(iteration_hash(0), 0);
        assert_eq!(iteration_hash(1), 0x9E37_79B1);
        assert_eq!(iteration_hash(2), 0x3C6E_F362);
    }

    #[test]
    fn chain_derivation() {
        let mut ghr = HistoryRegister::new(59);
        ghr.shift_in(Outcome::T);

        let steps: Vec<VirtualBranch> = VirtualChain::new(0x1000, ghr, 3)
            .collect();
        assert_eq!(steps.len(), 3);

        assert_eq!(steps[0].step, 1);
        assert_eq!(steps[0].vpc, 0x1000);
        assert_eq!(steps[0].history.value(), 0b001);

        assert_eq!(steps[1].vpc, 0x1000 ^ 0x9E37_79B1);
        assert_eq!(steps[1].history.value(), 0b010);

        assert_eq!(steps[2].step, 3);
        assert_eq!(steps[2].vpc, 0x1000 ^ 0x3C6E_F362);
        assert_eq!(steps[2].history.value(), 0b100);
    }

    #[test]
    fn chain_is_reproducible() {
        let ghr = HistoryRegister::new(59);
        let a: Vec<_> = VirtualChain::new(0x4242, ghr.clone(), 12).collect();
        let b: Vec<_> = VirtualChain::new(0x4242, ghr, 12).collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
    }

    #[test]
    fn chain_result_slots() {
        let mut res = ChainResult::new(12);
        assert_eq!(res.accumulate(1, 5), 5);
        assert_eq!(res.accumulate(1, -2), 3);
        res.set_len(2);
        assert!(res.is_resolved(2));
        assert!(!res.is_resolved(3));
        assert_eq!(res.output(1), 3);
        assert_eq!(res.outputs().len(), 12);
    }
}
