use serde::{ Deserialize, Serialize };
use thiserror::Error;

use crate::predictor::*;

/// Default number of global history bits.
pub const HISTORY_LENGTH: usize = 59;
/// Default number of rows in the perceptron table.
pub const PERCEPTRON_ROWS: usize = 1021;
/// Default log2 of the number of BTB entries.
pub const BTB_BITS: usize = 14;
/// Default maximum number of virtual branches per indirect branch.
pub const MAX_ITER: usize = 12;
/// Default perceptron training threshold.
pub const TRAINING_THRESHOLD: i32 = 127;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("history length must be in 1..=64 (got {0})")]
    HistoryLength(usize),
    #[error("perceptron table must have at least one row")]
    PerceptronRows,
    #[error("BTB index bits must be in 1..=30 (got {0})")]
    BTBBits(usize),
    #[error("maximum chain length must be at least 1")]
    MaxIter,
    #[error("training threshold must be non-negative (got {0})")]
    Threshold(i32),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Configuration for a [`VPCPredictor`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VPCConfig {
    /// Number of global history bits
    pub history_len: usize,

    /// Number of rows in the perceptron table
    pub perceptron_rows: usize,

    /// Number of BTB index bits
    pub btb_bits: usize,

    /// Maximum number of virtual branches visited per indirect branch
    pub max_iter: usize,

    /// Perceptron outputs with a smaller magnitude are always trained
    pub threshold: i32,

    /// Train the virtual branch that provided a correct prediction.
    ///
    /// When 'false', only the not-taken virtual branches leading up to a
    /// correct prediction are trained and the usage counter of the providing
    /// entry is left alone.
    pub train_confirmed_hit: bool,
}
impl Default for VPCConfig {
    fn default() -> Self {
        Self {
            history_len: HISTORY_LENGTH,
            perceptron_rows: PERCEPTRON_ROWS,
            btb_bits: BTB_BITS,
            max_iter: MAX_ITER,
            threshold: TRAINING_THRESHOLD,
            train_confirmed_hit: true,
        }
    }
}
impl VPCConfig {
    /// Parse [and validate] a configuration from JSON.
    /// Missing fields take their default values.
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=64).contains(&self.history_len) {
            return Err(ConfigError::HistoryLength(self.history_len));
        }
        if self.perceptron_rows == 0 {
            return Err(ConfigError::PerceptronRows);
        }
        if !(1..=30).contains(&self.btb_bits) {
            return Err(ConfigError::BTBBits(self.btb_bits));
        }
        if self.max_iter == 0 {
            return Err(ConfigError::MaxIter);
        }
        if self.threshold < 0 {
            return Err(ConfigError::Threshold(self.threshold));
        }
        Ok(())
    }

    /// Number of entries in the BTB.
    pub fn btb_size(&self) -> usize { 1 << self.btb_bits }

    /// Get the [approximate] number of storage bits.
    pub fn storage_bits(&self) -> usize {
        let perceptron = self.perceptron_rows * (self.history_len + 1) * 8;
        let btb = self.btb_size() * (32 + 8);
        perceptron + btb + self.history_len
    }

    /// Use this configuration to create a new [`VPCPredictor`].
    pub fn build(self) -> Result<VPCPredictor, ConfigError> {
        self.validate()?;
        Ok(VPCPredictor::from_validated(self))
    }
}
