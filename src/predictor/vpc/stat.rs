use itertools::Itertools;

/// Container for [VPCPredictor](crate::VPCPredictor) runtime stats.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VPCStats {
    /// Number of trained indirect branches
    pub brns: usize,

    /// Correctly predicted targets
    pub hits: usize,

    /// Predictions that did not name any target
    pub abstains: usize,

    /// Targets inserted into an empty BTB entry
    pub inserts: usize,

    /// Targets inserted by evicting another target
    pub evictions: usize,

    /// Number of predictions for each chain length [indexed by length]
    pub chain_len: Vec<usize>,
}
impl VPCStats {
    pub fn new(max_iter: usize) -> Self {
        Self {
            brns: 0,
            hits: 0,
            abstains: 0,
            inserts: 0,
            evictions: 0,
            chain_len: vec![0; max_iter + 1],
        }
    }

    /// Return the target hit rate.
    pub fn hit_rate(&self) -> f64 {
        if self.brns == 0 { return 0.0; }
        self.hits as f64 / self.brns as f64
    }

    /// Return the number of incorrect predictions [including abstentions].
    pub fn misses(&self) -> usize { self.brns - self.hits }
}

impl std::fmt::Display for VPCStats {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let lens = self.chain_len.iter().enumerate().skip(1)
            .filter(|(_, n)| **n != 0)
            .map(|(len, n)| format!("{}:{}", len, n))
            .join(" ");
        write!(f, "{}/{} hits ({:.2}%), {} abstains, {} inserts, \
            {} evictions, chain lengths [{}]",
            self.hits, self.brns, self.hit_rate() * 100.0, self.abstains,
            self.inserts, self.evictions, lens
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn summary() {
        let mut stat = VPCStats::new(12);
        assert_eq!(stat.hit_rate(), 0.0);
        stat.brns = 4;
        stat.hits = 1;
        stat.chain_len[1] = 3;
        stat.chain_len[12] = 1;
        assert_eq!(stat.misses(), 3);
        let s = stat.to_string();
        assert!(s.starts_with("1/4 hits (25.00%)"));
        assert!(s.ends_with("chain lengths [1:3 12:1]"));
    }
}
