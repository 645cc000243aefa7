//! Indirect branch target prediction with virtual program counters.

pub mod branch;
pub mod history;
pub mod predictor;

pub use branch::*;
pub use history::*;
pub use predictor::*;
