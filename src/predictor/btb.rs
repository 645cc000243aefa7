//! Branch target buffer (BTB) implementations.

use crate::predictor::*;

/// An entry in a [`TargetCache`].
///
/// A target address of zero marks an empty entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BTBEntry {
    /// Cached target address
    pub tgt: usize,

    /// Saturating counter approximating how often this entry is used
    pub lfu: u8,
}
impl BTBEntry {
    pub fn target(&self) -> usize { self.tgt }
    pub fn lfu(&self) -> u8 { self.lfu }
    pub fn is_empty(&self) -> bool { self.tgt == 0 }

    pub fn increment_lfu(&mut self) {
        self.lfu = self.lfu.saturating_add(1);
    }

    /// Fill this entry with a new target, leaving the counter untouched.
    pub fn replace(&mut self, tgt: usize) {
        self.tgt = tgt;
    }

    /// Replace the target in this entry and restart its counter.
    pub fn evict(&mut self, tgt: usize) {
        self.tgt = tgt;
        self.lfu = 1;
    }
}

/// A direct-mapped, untagged table of branch targets.
#[derive(Clone, Debug)]
pub struct TargetCache {
    size: usize,
    data: Vec<BTBEntry>,
}
impl TargetCache {
    pub fn new(size: usize) -> Self {
        assert!(size.is_power_of_two());
        Self {
            size,
            data: vec![BTBEntry::default(); size],
        }
    }

    /// Return the entry selected by 'pc'.
    pub fn lookup(&self, pc: usize) -> &BTBEntry {
        self.get_entry(self.get_index(pc))
    }

    /// Return the entry selected by 'pc'.
    pub fn lookup_mut(&mut self, pc: usize) -> &mut BTBEntry {
        let idx = self.get_index(pc);
        self.get_entry_mut(idx)
    }
}

impl PredictorTable for TargetCache {
    type Input = usize;
    type Entry = BTBEntry;

    fn size(&self) -> usize { self.size }

    fn get_index(&self, pc: usize) -> usize {
        pc & self.index_mask()
    }

    fn get_entry(&self, idx: usize) -> &BTBEntry {
        &self.data[idx]
    }

    fn get_entry_mut(&mut self, idx: usize) -> &mut BTBEntry {
        &mut self.data[idx]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn direct_mapped_without_tags() {
        let mut btb = TargetCache::new(1 << 14);
        assert_eq!(btb.get_index(0x1000), 0x1000);
        assert_eq!(btb.get_index(0xdead_1000), 0x1000);
        assert!(btb.lookup(0x1000).is_empty());

        btb.lookup_mut(0x1000).replace(0x2000);
        // An alias with different high-order bits hits the same entry
        assert_eq!(btb.lookup(0xdead_1000).target(), 0x2000);
        assert_eq!(btb.lookup(0x1000).lfu(), 0);
    }

    #[test]
    fn lfu_counter_saturates() {
        let mut entry = BTBEntry::default();
        for _ in 0..1000 {
            entry.increment_lfu();
        }
        assert_eq!(entry.lfu(), u8::MAX);
        entry.evict(0x3000);
        assert_eq!(entry.target(), 0x3000);
        assert_eq!(entry.lfu(), 1);
    }
}
