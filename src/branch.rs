//! Types for representing branches and branch outcomes.

/// A branch outcome.
#[repr(u32)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome {
    /// Not taken
    N = 0,
    /// Taken
    T = 1
}

impl std::fmt::Debug for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            Self::T => "t",
            Self::N => "n",
        };
        write!(f, "{}", s)
    }
}

impl std::ops::Not for Outcome {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Self::N => Self::T,
            Self::T => Self::N,
        }
    }
}

impl From<bool> for Outcome {
    fn from(x: bool) -> Self {
        match x {
            true => Self::T,
            false => Self::N
        }
    }
}
impl From<Outcome> for bool {
    fn from(x: Outcome) -> Self {
        match x {
            Outcome::T => true,
            Outcome::N => false,
        }
    }
}

/// The set of flags describing a branch instruction.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct BranchFlags(pub u32);
impl BranchFlags {
    pub const BRN_FLAG: u32   = 1 << 0;
    pub const JMP_FLAG: u32   = 1 << 1;
    pub const CALL_FLAG: u32  = 1 << 2;
    pub const RET_FLAG: u32   = 1 << 3;
    pub const IND_FLAG: u32   = 1 << 4;
    pub const TAKEN_FLAG: u32 = 1 << 5;

    pub fn is_brn(&self) -> bool { self.0 & Self::BRN_FLAG != 0 }
    pub fn is_jmp(&self) -> bool { self.0 & Self::JMP_FLAG != 0 }
    pub fn is_call(&self) -> bool { self.0 & Self::CALL_FLAG != 0 }
    pub fn is_ret(&self) -> bool { self.0 & Self::RET_FLAG != 0 }
    pub fn is_direct(&self) -> bool { self.0 & Self::IND_FLAG == 0 }
    pub fn is_indirect(&self) -> bool { self.0 & Self::IND_FLAG != 0 }
    pub fn is_taken(&self) -> bool { self.0 & Self::TAKEN_FLAG != 0 }

    /// Flags for a direct conditional branch.
    pub fn conditional(outcome: Outcome) -> Self {
        Self(Self::BRN_FLAG).with_outcome(outcome)
    }

    /// Flags for an indirect [always-taken] jump.
    pub fn indirect_jump() -> Self {
        Self(Self::JMP_FLAG | Self::IND_FLAG | Self::TAKEN_FLAG)
    }

    /// Flags for an indirect [always-taken] call.
    pub fn indirect_call() -> Self {
        Self(Self::CALL_FLAG | Self::IND_FLAG | Self::TAKEN_FLAG)
    }

    /// Return a copy of these flags with the 'taken' bit set or cleared.
    pub fn with_outcome(self, outcome: Outcome) -> Self {
        match outcome {
            Outcome::T => Self(self.0 | Self::TAKEN_FLAG),
            Outcome::N => Self(self.0 & !Self::TAKEN_FLAG),
        }
    }
}


/// A record of branch execution.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct BranchRecord {
    /// The program counter value for this branch
    pub pc: usize,

    /// The target address evaluated for this branch
    pub tgt: usize,

    pub flags: BranchFlags,
}
impl BranchRecord {
    pub fn new(pc: usize, tgt: usize, flags: BranchFlags) -> Self {
        Self { pc, tgt, flags }
    }

    pub fn outcome(&self) -> Outcome {
        Outcome::from(self.flags.is_taken())
    }

    /// Returns 'true' if this is a conditional instruction.
    pub fn is_conditional(&self) -> bool {
        self.flags.is_brn()
    }

    /// Returns 'true' if this instruction directly specifies the target.
    pub fn is_direct(&self) -> bool {
        self.flags.is_direct()
    }

    /// Returns 'true' if this instruction indirectly specifies the target.
    pub fn is_indirect(&self) -> bool {
        self.flags.is_indirect()
    }

    /// Returns 'true' if this is a "call" or "return".
    pub fn is_procedural(&self) -> bool {
        self.flags.is_call() || self.flags.is_ret()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn outcome_conversions() {
        assert_eq!(Outcome::from(true), Outcome::T);
        assert_eq!(!Outcome::T, Outcome::N);
        let b: bool = Outcome::N.into();
        assert!(!b);
    }

    #[test]
    fn flags() {
        let rec = BranchRecord::new(0x1000, 0x2000, BranchFlags::indirect_call());
        assert!(rec.is_indirect());
        assert!(rec.is_procedural());
        assert!(!rec.is_conditional());
        assert_eq!(rec.outcome(), Outcome::T);

        let rec = BranchRecord::new(0x1000, 0x1004,
            BranchFlags::conditional(Outcome::N)
        );
        assert!(rec.is_conditional());
        assert!(rec.is_direct());
        assert_eq!(rec.outcome(), Outcome::N);
        assert_eq!(rec.flags.with_outcome(Outcome::T).is_taken(), true);
    }
}
