//! Implementation of a "Virtual Program Counter" (VPC) predictor for
//! indirect branch targets.

pub mod chain;
pub mod config;
pub mod stat;

pub use chain::*;
pub use config::*;
pub use stat::*;

use crate::branch::*;
use crate::history::*;
use crate::predictor::*;

/// Container for output from [`VPCPredictor::predict`].
///
/// This is passed back to [`VPCPredictor::train`] once the branch has been
/// resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VPCPrediction {
    /// A branch without an indirect target. No prediction is made, and
    /// training only updates the global history.
    Direct,

    /// A walk over the virtual branches of an indirect branch.
    Indirect {
        /// Program counter of the real branch
        pc: usize,

        /// Predicted target (zero when no target was predicted)
        target: usize,

        /// Record of the virtual branches visited
        chain: ChainResult,
    },
}
impl VPCPrediction {
    /// Return the predicted target, if any.
    pub fn target(&self) -> Option<usize> {
        match self {
            Self::Indirect { target, .. } if *target != 0 => Some(*target),
            _ => None,
        }
    }

    /// Return the record of visited virtual branches, if any.
    pub fn chain(&self) -> Option<&ChainResult> {
        match self {
            Self::Indirect { chain, .. } => Some(chain),
            Self::Direct => None,
        }
    }
}

/// The "Virtual Program Counter" predictor.
///
/// An indirect branch is treated as a chain of conditional "virtual"
/// branches, each with its own entry in a shared BTB and its own perceptron.
/// The first virtual branch predicted 'taken' with a cached target provides
/// the prediction.
///
/// See "VPC Prediction: Reducing the Cost of Indirect Branches via
/// Hardware-Based Dynamic Devirtualization" (Kim et al., 2007).
///
/// NOTE: A target address of zero cannot be cached; it is indistinguishable
/// from an empty BTB entry.
///
/// NOTE: Program counters and targets are used at full [usize] width. For
/// addresses below 2^32 the perceptron rows and BTB entries selected are the
/// same as with 32-bit addresses; wider addresses select rows with the full
/// value (`pc % rows`) and targets are cached without truncation.
pub struct VPCPredictor {
    /// The configuration used to create this object
    pub cfg: VPCConfig,

    pub stat: VPCStats,

    /// Global history register
    ghr: HistoryRegister,

    /// Targets for all virtual branches
    btb: TargetCache,

    /// Direction predictors for all virtual branches
    perceptrons: PerceptronTable,
}

impl Default for VPCPredictor {
    fn default() -> Self {
        Self::from_validated(VPCConfig::default())
    }
}

impl VPCPredictor {
    pub(crate) fn from_validated(cfg: VPCConfig) -> Self {
        log::info!("VPC predictor: {:?} ({} storage bits)",
            cfg, cfg.storage_bits()
        );
        Self {
            stat: VPCStats::new(cfg.max_iter),
            ghr: HistoryRegister::new(cfg.history_len),
            btb: TargetCache::new(cfg.btb_size()),
            perceptrons: PerceptronTable::new(
                cfg.perceptron_rows, cfg.history_len
            ),
            cfg,
        }
    }

    pub fn ghr(&self) -> &HistoryRegister { &self.ghr }
    pub fn btb(&self) -> &TargetCache { &self.btb }
    pub fn perceptrons(&self) -> &PerceptronTable { &self.perceptrons }

    /// Return the chain of virtual branches for some program counter value
    /// [using the current global history].
    pub fn chain(&self, pc: usize) -> VirtualChain {
        VirtualChain::new(pc, self.ghr.clone(), self.cfg.max_iter)
    }

    /// Return the perceptron output for a virtual branch, computing it only
    /// if it was not already computed during prediction.
    fn resolve_output(&self, chain: &mut ChainResult, vb: &VirtualBranch)
        -> i32
    {
        if chain.is_resolved(vb.step) {
            chain.output(vb.step)
        } else {
            let (output, _) = self.perceptrons.output(vb.vpc, vb.history.data());
            chain.accumulate(vb.step, output)
        }
    }

    /// Train the perceptron for a virtual branch.
    fn train_virtual(&mut self, vb: &VirtualBranch, outcome: Outcome,
        output: i32)
    {
        self.perceptrons.train(vb.vpc, vb.history.data(), outcome, output,
            self.cfg.threshold
        );
    }

    /// Walk the chain of virtual branches until one of them provides a
    /// target, or until we run out of virtual branches.
    fn predict_indirect(&self, pc: usize) -> VPCPrediction {
        let mut chain = ChainResult::new(self.cfg.max_iter);
        let mut target = 0;

        for vb in self.chain(pc) {
            let tgt = self.btb.lookup(vb.vpc).target();
            let (output, _) = self.perceptrons.output(vb.vpc, vb.history.data());
            let output = chain.accumulate(vb.step, output);
            let taken = output > 0;

            // The first virtual branch with a cached target that is
            // predicted 'taken' provides the prediction
            if tgt != 0 && taken {
                target = tgt;
                chain.set_len(vb.step);
                break;
            }

            // Give up on a BTB miss, or after the last virtual branch
            if tgt == 0 || vb.step >= self.cfg.max_iter {
                chain.set_len(vb.step);
                break;
            }
        }

        log::trace!("predict pc={:016x} tgt={:016x} len={}",
            pc, target, chain.len()
        );
        VPCPrediction::Indirect { pc, target, chain }
    }

    /// Update the predictor to account for a correct prediction.
    ///
    /// All virtual branches before the one that provided the prediction are
    /// trained as 'not-taken'.
    fn update_correct(&mut self, pc: usize, target: usize,
        mut chain: ChainResult)
    {
        let len = chain.len();
        for vb in self.chain(pc).take(len) {
            let output = self.resolve_output(&mut chain, &vb);
            if vb.step < len {
                self.train_virtual(&vb, Outcome::N, output);
            }
            else if target != 0 && self.cfg.train_confirmed_hit {
                self.train_virtual(&vb, Outcome::T, output);
                self.btb.lookup_mut(vb.vpc).increment_lfu();
            }
        }
    }

    /// Update the predictor to account for an incorrect prediction.
    ///
    /// Walk the chain looking for a virtual branch that already caches the
    /// correct target. Virtual branches caching some other target are
    /// trained as 'not-taken'. If the correct target isn't found, it is
    /// inserted into the first empty entry along the chain or, failing that,
    /// replaces the least-frequently used entry along the chain.
    fn update_incorrect(&mut self, pc: usize, target: usize,
        mut chain: ChainResult)
    {
        let mut miss_vpc: Option<usize> = None;
        let mut victim: Option<(usize, u8)> = None;

        for vb in self.chain(pc) {
            let entry = *self.btb.lookup(vb.vpc);

            if entry.target() == target {
                let output = self.resolve_output(&mut chain, &vb);
                self.train_virtual(&vb, Outcome::T, output);
                self.btb.lookup_mut(vb.vpc).increment_lfu();
                return;
            }

            if entry.is_empty() {
                miss_vpc = Some(vb.vpc);
                break;
            }

            let output = self.resolve_output(&mut chain, &vb);
            self.train_virtual(&vb, Outcome::N, output);
            if victim.map_or(true, |(_, lfu)| entry.lfu() < lfu) {
                victim = Some((vb.vpc, entry.lfu()));
            }
        }

        if let Some(vpc) = miss_vpc {
            log::debug!("insert pc={:016x} vpc={:016x} tgt={:016x}",
                pc, vpc, target
            );
            self.btb.lookup_mut(vpc).replace(target);
            self.stat.inserts += 1;
        }
        else if let Some((vpc, lfu)) = victim {
            let old = self.btb.lookup(vpc).target();
            log::debug!("evict pc={:016x} vpc={:016x} tgt={:016x} \
                (old={:016x}, lfu={})", pc, vpc, target, old, lfu
            );
            self.btb.lookup_mut(vpc).evict(target);
            self.perceptrons.reset_row(vpc);
            self.stat.evictions += 1;
        }
    }

    /// Shift the resolved outcome into the global history register.
    fn update_history(&mut self, outcome: Outcome) {
        self.ghr.shift_in(outcome);
    }
}

/// The public interface to a [`VPCPredictor`].
impl TargetPredictor for VPCPredictor {
    type Prediction = VPCPrediction;

    fn name(&self) -> &'static str { "VPCPredictor" }

    /// Make a prediction for the provided branch.
    ///
    /// Only indirect branches are predicted; this never changes the state
    /// of the predictor.
    fn predict(&self, record: &BranchRecord) -> VPCPrediction {
        if record.is_indirect() {
            self.predict_indirect(record.pc)
        } else {
            VPCPrediction::Direct
        }
    }

    /// Given a particular prediction and the resolved outcome/target, update
    /// the state of the predictor.
    fn train(&mut self, prediction: VPCPrediction, outcome: Outcome, tgt: usize) {
        if let VPCPrediction::Indirect { pc, target, chain } = prediction {
            self.stat.brns += 1;
            self.stat.chain_len[chain.len()] += 1;
            if target == 0 {
                self.stat.abstains += 1;
            }

            if target == tgt {
                // Abstaining on a zero target is not a hit
                if target != 0 {
                    self.stat.hits += 1;
                }
                self.update_correct(pc, target, chain);
            } else {
                self.update_incorrect(pc, tgt, chain);
            }
        }
        self.update_history(outcome);
    }
}
