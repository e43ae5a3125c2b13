//! The statistical-test failure bitset (`spec.md` §4.6, §9).
//!
//! Bit assignments and the overflow-folding rules are carried over
//! verbatim from `original_source/pic32/hwrng.c`'s `tests_failed`
//! accumulator:
//!
//! | bit | meaning |
//! |-----|---------|
//! | 0 | mean out of range, or a histogram-moment overflow |
//! | 1 | variance out of range, or a histogram-moment overflow |
//! | 2 | skewness out of range, or a histogram-moment overflow |
//! | 3 | kurtosis out of range, or a histogram-moment overflow |
//! | 4 | spectral peak out of range, or a PSD-accumulator overflow |
//! | 5 | bandwidth below minimum, or a PSD-accumulator overflow |
//! | 6 | autocorrelation amplitude above maximum, or overflow computing it |
//! | 7 | entropy below minimum, or overflow estimating it |
//!
//! A fixed-point overflow during moment computation sets all of bits
//! 0..3 rather than a dedicated bit (`spec.md` §4.6's "fixed-point sticky
//! flag or histogram overflow true ⇒ bits 0..3 all set"); a PSD overflow
//! likewise sets both bits 4 and 5 (`tests_failed |= 48` in the original —
//! preserved as-is per the open question at `spec.md` §9, rather than
//! disambiguated into a single bit).

use core::fmt;
use core::ops::{BitOr, BitOrAssign};

pub const MEAN_OUT_OF_RANGE: u8 = 1 << 0;
pub const VARIANCE_OUT_OF_RANGE: u8 = 1 << 1;
pub const SKEWNESS_OUT_OF_RANGE: u8 = 1 << 2;
pub const KURTOSIS_OUT_OF_RANGE: u8 = 1 << 3;
pub const PEAK_OUT_OF_RANGE: u8 = 1 << 4;
pub const BANDWIDTH_BELOW_MINIMUM: u8 = 1 << 5;
pub const AUTOCORRELATION_ABOVE_MAXIMUM: u8 = 1 << 6;
pub const ENTROPY_BELOW_MINIMUM: u8 = 1 << 7;

/// All four histogram-moment bits, set together on a fixed-point or
/// histogram-counter overflow during moment computation.
pub const MOMENT_OVERFLOW: u8 =
    MEAN_OUT_OF_RANGE | VARIANCE_OUT_OF_RANGE | SKEWNESS_OUT_OF_RANGE | KURTOSIS_OUT_OF_RANGE;

/// Both PSD-derived bits, set together on a PSD-accumulator overflow.
pub const PSD_OVERFLOW: u8 = PEAK_OUT_OF_RANGE | BANDWIDTH_BELOW_MINIMUM;

/// Accumulated statistical-test failures for one qualification run.
///
/// `TestFailures::PASS` (all bits clear) is the only passing verdict; any
/// set bit fails the whole batch (`spec.md` §4.6: "a single failed test
/// discards the entire batch").
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TestFailures(u8);

impl TestFailures {
    pub const PASS: Self = Self(0);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_pass(self) -> bool {
        self.0 == 0
    }

    pub fn set(&mut self, bits: u8) {
        self.0 |= bits;
    }

    pub fn contains(self, bits: u8) -> bool {
        self.0 & bits == bits
    }
}

impl BitOr for TestFailures {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for TestFailures {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for TestFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TestFailures(0b{:08b})", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TestFailures {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "TestFailures(0b{=u8:08b})", self.0);
    }
}
