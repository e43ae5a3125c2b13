//! Trait boundaries for the engine's external collaborators (`spec.md`
//! §5, §6): the ADC driver, idle-time power control, and (new, beyond
//! the original) a pass/fail indicator sink.
//!
//! These mirror how the teacher keeps hardware at arm's length behind
//! small traits rather than baking a concrete peripheral type into the
//! algorithm (see `hal.rs`'s pin type aliases and the `embedded-hal`
//! traits the RTIC app's resources are built from); here the whole ADC
//! and GPIO surface collapses to three traits so the engine stays
//! `no_std`-and-hardware-agnostic and is host-testable with mocks.

use crate::verdict::TestFailures;

/// Supplies raw, oversampled ADC readings into a fixed-size buffer.
///
/// Implementations own the actual peripheral (DMA-fed ring buffer,
/// interrupt-fed FIFO, or in tests, a canned sample generator) and only
/// need to be able to say "fill this buffer".
pub trait AdcSampleSource<const N: usize> {
    /// Error type for a failed acquisition (e.g. a stalled DMA transfer).
    type Error;

    /// Block until `buffer` is completely filled with fresh samples.
    fn fill(&mut self, buffer: &mut [i16; N]) -> Result<(), Self::Error>;
}

/// Lets the engine ask for the ADC (and anything downstream of it) to be
/// powered down while there is no qualification work to do, and powered
/// back up before the next fill.
pub trait IdlePowerControl {
    fn enter_idle(&mut self);
    fn exit_idle(&mut self);
}

/// Reports the pass/fail outcome of a qualification run to an external
/// indicator (LED, log line, metrics counter). Supplements the original
/// firmware's `IGNORE_HWRNG_FAILURE` debug LED blink (`spec.md` §4.8) with
/// a trait seam instead of a single hardwired GPIO pin, so a host build
/// can observe verdicts without hardware.
pub trait IndicatorSink {
    /// Called once per completed qualification run with its outcome.
    fn report(&mut self, verdict: TestFailures);
}

/// An [`IndicatorSink`] that discards every report; the default when no
/// indicator hardware is wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullIndicator;

impl IndicatorSink for NullIndicator {
    fn report(&mut self, _verdict: TestFailures) {}
}

/// An [`IdlePowerControl`] that does nothing; the default when the ADC
/// has no meaningful low-power state or the caller manages it elsewhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoIdlePowerControl;

impl IdlePowerControl for NoIdlePowerControl {
    fn enter_idle(&mut self) {}
    fn exit_idle(&mut self) {}
}
