//! A table of perceptrons used to resolve virtual branch directions.

use bitvec::prelude::*;
use crate::branch::Outcome;
use crate::predictor::*;

/// Perceptron [with integer weights].
///
/// See the following papers:
///
/// - "Neural Methods for Dynamic Branch Prediction" (Jiménez and Lin, 2002)
/// - "Virtual Program Counter (VPC) Prediction" (Kim et al., 2007)
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PerceptronRow {
    pub bias: i8,
    pub weights: Vec<i8>,
}
impl PerceptronRow {
    pub fn new(len: usize) -> Self {
        Self { bias: 0, weights: vec![0; len] }
    }

    /// Reset the state.
    pub fn reset(&mut self) {
        self.bias = 0;
        self.weights.fill(0);
    }

    /// Returns 'true' if every weight [and the bias] is zero.
    pub fn is_zero(&self) -> bool {
        self.bias == 0 && self.weights.iter().all(|w| *w == 0)
    }

    /// Compute the output value for some history.
    ///
    /// Each weight is added when the corresponding history bit is set, and
    /// subtracted otherwise. The predicted outcome is 'taken' only when the
    /// output is strictly positive.
    pub fn output(&self, history: &BitSlice) -> (i32, Outcome) {
        let res = self.weights.iter().zip(history.iter().by_vals())
            .fold(self.bias as i32, |sum, (w, bit)| {
                if bit { sum + *w as i32 } else { sum - *w as i32 }
            });
        (res, Outcome::from(res > 0))
    }

    /// Given some outcome, adjust the weights.
    ///
    /// 'output' is the value previously computed for this history.
    /// Training occurs after a misprediction, or when the magnitude of the
    /// output is below 'threshold'. Weights saturate at the limits of [i8].
    pub fn train(&mut self,
        history: &BitSlice,
        outcome: Outcome,
        output: i32,
        threshold: i32,
    ) -> bool
    {
        let prediction = Outcome::from(output > 0);
        let miss = prediction != outcome;
        let below_threshold = output.abs() < threshold;
        if !(miss || below_threshold) {
            return false;
        }

        // When a bit in the history matches the outcome, increment the
        // corresponding weight. Otherwise, decrement the corresponding weight.
        let taken: bool = outcome.into();
        let adj = if taken { 1 } else { -1 };
        self.bias = self.bias.saturating_add(adj);
        for (w, bit) in self.weights.iter_mut().zip(history.iter().by_vals()) {
            let adj = if bit == taken { 1 } else { -1 };
            *w = w.saturating_add(adj);
        }
        true
    }
}

/// A table of [`PerceptronRow`] indexed by `pc % size`.
///
/// The number of rows need not be a power of two.
#[derive(Clone, Debug)]
pub struct PerceptronTable {
    data: Vec<PerceptronRow>,
    size: usize,
}
impl PerceptronTable {
    pub fn new(size: usize, history_len: usize) -> Self {
        assert!(size > 0);
        Self {
            data: vec![PerceptronRow::new(history_len); size],
            size,
        }
    }

    /// Compute the output of the row selected by 'pc'.
    pub fn output(&self, pc: usize, history: &BitSlice) -> (i32, Outcome) {
        self.get_entry(self.get_index(pc)).output(history)
    }

    /// Train the row selected by 'pc'.
    pub fn train(&mut self,
        pc: usize,
        history: &BitSlice,
        outcome: Outcome,
        output: i32,
        threshold: i32,
    ) -> bool
    {
        let idx = self.get_index(pc);
        self.get_entry_mut(idx).train(history, outcome, output, threshold)
    }

    /// Clear all of the weights in the row selected by 'pc'.
    pub fn reset_row(&mut self, pc: usize) {
        let idx = self.get_index(pc);
        self.get_entry_mut(idx).reset();
    }
}

impl PredictorTable for PerceptronTable {
    type Input = usize;
    type Entry = PerceptronRow;

    fn size(&self) -> usize { self.size }

    fn get_index(&self, pc: usize) -> usize {
        pc % self.size
    }

    fn get_entry(&self, idx: usize) -> &PerceptronRow {
        &self.data[idx]
    }

    fn get_entry_mut(&mut self, idx: usize) -> &mut PerceptronRow {
        &mut self.data[idx]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn history(val: u64, len: usize) -> BitVec {
        let mut bits = bitvec![0; len];
        bits.store_le::<u64>(val);
        bits
    }

    #[test]
    fn zero_row_predicts_not_taken() {
        let row = PerceptronRow::new(59);
        let (out, dir) = row.output(&history(0b1011, 59));
        assert_eq!(out, 0);
        assert_eq!(dir, Outcome::N);
    }

    #[test]
    fn learning_rule() {
        let h = history(0b01, 4);
        let mut row = PerceptronRow::new(4);
        assert!(row.train(&h, Outcome::T, 0, 127));
        assert_eq!(row.bias, 1);
        assert_eq!(row.weights, vec![1, -1, -1, -1]);

        // bias + w0 - w1 - w2 - w3
        let (out, dir) = row.output(&h);
        assert_eq!(out, 5);
        assert_eq!(dir, Outcome::T);

        assert!(row.train(&h, Outcome::N, out, 127));
        assert!(row.is_zero());
    }

    #[test]
    fn confident_correct_output_is_not_trained() {
        let h = history(0, 4);
        let mut row = PerceptronRow::new(4);
        assert!(!row.train(&h, Outcome::T, 127, 127));
        assert!(!row.train(&h, Outcome::N, -200, 127));
        assert!(row.is_zero());

        // Mispredictions are trained regardless of magnitude
        assert!(row.train(&h, Outcome::N, 500, 127));
        assert_eq!(row.bias, -1);
        assert_eq!(row.weights, vec![1, 1, 1, 1]);
    }

    #[test]
    fn weights_saturate() {
        let h = history(0b1, 2);
        let mut row = PerceptronRow::new(2);
        for _ in 0..300 {
            row.train(&h, Outcome::T, 0, 127);
        }
        assert_eq!(row.bias, i8::MAX);
        assert_eq!(row.weights, vec![i8::MAX, i8::MIN]);
    }

    #[test]
    fn rows_alias_modulo_size() {
        let h = history(0, 8);
        let mut table = PerceptronTable::new(1021, 8);
        assert_eq!(table.get_index(0x1000), table.get_index(0x1000 + 1021));
        table.train(0x1000, &h, Outcome::T, 0, 127);
        let (out, _) = table.output(0x1000 + 1021, &h);
        assert_eq!(out, 1 + 8);
        table.reset_row(0x1000 + 2 * 1021);
        assert!(table.get_entry(table.get_index(0x1000)).is_zero());
    }
}
