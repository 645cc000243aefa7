//! Implementations of different branch predictors.

pub mod perceptron;
pub mod btb;
pub mod vpc;

pub use perceptron::*;
pub use btb::*;
pub use vpc::*;

use crate::branch::*;

/// Interface to a table of predictors.
pub trait PredictorTable {
    /// The type of input to the table used to form an index.
    type Input;

    /// The type of entry in the table.
    type Entry;

    /// Returns the number of entries in the table.
    fn size(&self) -> usize;

    /// Given some input, return the corresponding index into the table.
    fn get_index(&self, input: Self::Input) -> usize;

    /// Returns a reference to an entry in the table.
    fn get_entry(&self, idx: usize) -> &Self::Entry;

    /// Returns a mutable reference to an entry in the table.
    fn get_entry_mut(&mut self, idx: usize) -> &mut Self::Entry;

    /// Returns a bitmask corresponding to the number of entries in the table.
    fn index_mask(&self) -> usize {
        assert!(self.size().is_power_of_two());
        self.size() - 1
    }
}

/// Interface to a predictor for branch targets.
///
/// Each call to [`TargetPredictor::predict`] is followed by exactly one call
/// to [`TargetPredictor::train`] with the returned prediction, once the
/// branch has been resolved.
pub trait TargetPredictor {
    /// Handle describing how a prediction was made.
    type Prediction;

    fn name(&self) -> &'static str;

    /// Make a prediction for the provided branch.
    fn predict(&self, record: &BranchRecord) -> Self::Prediction;

    /// Update the state of the predictor with the resolved outcome and target.
    fn train(&mut self, prediction: Self::Prediction, outcome: Outcome, tgt: usize);
}
