//! Consumer-facing error type (`spec.md` §4.7, §4.8).

use crate::verdict::TestFailures;
use core::fmt;

/// The qualification engine declined to hand out a random block.
///
/// `E` is the error type of whatever [`crate::AdcSampleSource`] the engine
/// was driven with; it defaults to [`core::convert::Infallible`] for
/// callers whose ADC driver cannot fail acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualificationFailure<E = core::convert::Infallible> {
    /// Statistical tests failed; the verdict bitset names which ones
    /// (`spec.md` §4.6). The engine discards the whole batch and restarts
    /// acquisition on the next call.
    StatisticalTest(TestFailures),
    /// The pool has not finished filling and testing yet; call again
    /// after supplying more samples. Unused by the synchronous engine in
    /// this crate (every run completes within one `random_32_bytes` call)
    /// but kept per `spec.md` §7 point 4 for a future staged-run design.
    NotReady,
    /// The ADC driver failed to fill its buffer (e.g. a stalled DMA
    /// transfer). Not described by `spec.md`, whose ADC driver is a
    /// deliberately out-of-scope collaborator (`spec.md` §1) assumed to
    /// always complete its fill; this variant exists only so a fallible
    /// real-world [`crate::AdcSampleSource`] has somewhere to report to
    /// instead of panicking.
    Acquisition(E),
}

impl<E: fmt::Display> fmt::Display for QualificationFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StatisticalTest(verdict) => {
                write!(f, "qualification failed: {verdict}")
            }
            Self::NotReady => write!(f, "qualification pool not yet ready"),
            Self::Acquisition(e) => write!(f, "ADC acquisition failed: {e}"),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for QualificationFailure<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::StatisticalTest(verdict) => {
                defmt::write!(f, "qualification failed: {}", verdict)
            }
            Self::NotReady => defmt::write!(f, "qualification pool not yet ready"),
            Self::Acquisition(e) => defmt::write!(f, "ADC acquisition failed: {}", e),
        }
    }
}
