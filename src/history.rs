//! Global branch history.

use bitvec::prelude::*;
use crate::branch::Outcome;

/// A fixed-length shift register of branch outcomes.
///
/// Bit 0 is the most-recent outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRegister {
    data: BitVec<usize, Lsb0>,
    len: usize,
}

// NOTE: This *reverses* the all of the bits and presents them in a format
// where the leftmost bit is the most-significant (index n) and the rightmost
// bit is the least-significant (index 0).
impl std::fmt::Display for HistoryRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let x: String = self.data.as_bitslice().iter().by_vals()
            .map(|b| if b { '1' } else { '0' })
            .rev()
            .collect();
        write!(f, "{}", x)
    }
}

impl HistoryRegister {
    /// Create a register with the specified length in bits.
    /// All bits in the register are initialized to zero.
    pub fn new(len: usize) -> Self {
        Self {
            data: bitvec![usize, Lsb0; 0; len],
            len,
        }
    }

    pub fn len(&self) -> usize { self.len }
    pub fn data(&self) -> &BitSlice { self.data.as_bitslice() }
}

impl HistoryRegister {
    /// Shift the register by 'n' bits.
    /// The bottom 'n' bits become zero, and the top 'n' bits are discarded.
    pub fn shift_by(&mut self, n: usize) {
        let n = n.min(self.len);
        self.data.rotate_right(n);
        self.data[..n].fill(false);
    }

    /// Shift the register by one bit and record an outcome in bit 0.
    pub fn shift_in(&mut self, outcome: Outcome) {
        self.shift_by(1);
        self.data.set(0, outcome.into());
    }

    /// Return the contents of the register as an integer.
    ///
    /// The register must be no longer than 64 bits.
    pub fn value(&self) -> u64 {
        self.data.load_le::<u64>()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn shift_in_outcomes() {
        let mut ghr = HistoryRegister::new(59);
        assert_eq!(ghr.value(), 0);
        ghr.shift_in(Outcome::T);
        ghr.shift_in(Outcome::N);
        ghr.shift_in(Outcome::T);
        assert_eq!(ghr.value(), 0b101);
        assert_eq!(ghr.to_string().len(), 59);
        assert!(ghr.to_string().ends_with("101"));
    }

    #[test]
    fn width_is_bounded() {
        let mut ghr = HistoryRegister::new(59);
        for _ in 0..200 {
            ghr.shift_in(Outcome::T);
        }
        assert_eq!(ghr.value(), (1u64 << 59) - 1);
        ghr.shift_in(Outcome::N);
        assert_eq!(ghr.value(), ((1u64 << 59) - 1) & !1);
    }

    #[test]
    fn shift_by_discards_top_bits() {
        let mut ghr = HistoryRegister::new(4);
        ghr.shift_in(Outcome::T);
        ghr.shift_by(3);
        assert_eq!(ghr.value(), 0b1000);
        ghr.shift_by(1);
        assert_eq!(ghr.value(), 0);
    }

    #[test]
    fn shift_by_whole_register() {
        let mut ghr = HistoryRegister::new(4);
        for _ in 0..4 {
            ghr.shift_in(Outcome::T);
        }
        ghr.shift_by(2);
        assert_eq!(ghr.value(), 0b1100);
        ghr.shift_by(10);
        assert_eq!(ghr.value(), 0);
        assert_eq!(ghr.data().len(), 4);
    }
}
