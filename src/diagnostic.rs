//! Non-production diagnostic/reporting layer (`spec.md` §4.8, §6):
//! strictly optional, `#[cfg(feature = "diagnostic")]`-gated end to end,
//! never compiled into the default build. Supplements the original's raw
//! `streamGetOneByte`/`streamPutOneByte`/on-device display calls with a
//! [`DiagnosticStream`] trait boundary instead of a hardcoded driver,
//! matching how the rest of this crate treats peripherals as
//! collaborators (`crate::collaborators`).
//!
//! Six single-letter report modes read from an already-qualified
//! histogram/PSD pair (§6: `R`/`S`/`P`/`B`/`A`/`E`); any other mode byte
//! enters the host-driven test loop, which clears its own histogram and
//! recomputes everything from `SAMPLE_COUNT` host-supplied samples
//! instead of reusing the engine's last run.

use crate::config;
use crate::fixed_point::{FixedOverflow, Q16};
use crate::histogram::DefaultHistogram;
use crate::psd::PsdAccumulator;

/// A byte-oriented host link: a UART, a USB CDC endpoint, or in tests, an
/// in-memory queue. Blocking, matching the original's polled
/// `streamGetOneByte`/`streamPutOneByte` (`spec.md` §6).
pub trait DiagnosticStream {
    fn read_byte(&mut self) -> u8;
    fn write_byte(&mut self, byte: u8);

    fn write_u16_le(&mut self, value: u16) {
        for byte in value.to_le_bytes() {
            self.write_byte(byte);
        }
    }

    fn write_u32_le(&mut self, value: u32) {
        for byte in value.to_le_bytes() {
            self.write_byte(byte);
        }
    }

    fn write_q16_le(&mut self, value: Q16) {
        self.write_u32_le(value.to_bits() as u32);
    }

    fn read_u16_le(&mut self) -> u16 {
        let mut bytes = [0u8; 2];
        for b in &mut bytes {
            *b = self.read_byte();
        }
        u16::from_le_bytes(bytes)
    }
}

/// The mode selector read as the first byte of a diagnostic session
/// (`spec.md` §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Forward the qualified pool's raw samples.
    Raw,
    /// Mean, variance, skewness numerator, kurtosis numerator.
    Moments,
    /// The full accumulated PSD bin array.
    Psd,
    /// `(max_bin, bandwidth)` from the bandwidth estimator.
    Bandwidth,
    /// The full correlogram.
    Autocorrelation,
    /// Max autocorrelation amplitude and the entropy estimate.
    MaxAutocorrelationAndEntropy,
    /// Any byte that isn't one of the six mode letters: the host-driven
    /// test loop (`spec.md` §6).
    HostTestLoop,
}

impl Mode {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'R' => Self::Raw,
            b'S' => Self::Moments,
            b'P' => Self::Psd,
            b'B' => Self::Bandwidth,
            b'A' => Self::Autocorrelation,
            b'E' => Self::MaxAutocorrelationAndEntropy,
            _ => Self::HostTestLoop,
        }
    }
}

/// Runs one of the six single-letter report modes against an
/// already-filled histogram/PSD pair (typically the last qualification
/// run's), writing the results to `stream`. `pool_samples` backs the `R`
/// mode only.
pub fn run_report_mode(
    mode: Mode,
    histogram: &DefaultHistogram,
    psd: &PsdAccumulator,
    pool_samples: &[u16],
    stream: &mut impl DiagnosticStream,
) {
    let mut ctx = FixedOverflow::new();
    match mode {
        Mode::Raw => {
            for &sample in pool_samples {
                stream.write_u16_le(sample);
            }
        }
        Mode::Moments => {
            ctx.clear();
            let mean = histogram.central_moment(Q16::ZERO, 1, &mut ctx);
            let variance = histogram.central_moment(mean, 2, &mut ctx);
            let kappa3 = histogram.central_moment(mean, 3, &mut ctx);
            let kappa4 = histogram.central_moment(mean, 4, &mut ctx);
            for value in [mean, variance, kappa3, kappa4] {
                stream.write_q16_le(value);
            }
        }
        Mode::Psd => {
            for &bin in psd.bins() {
                stream.write_q16_le(bin);
            }
        }
        Mode::Bandwidth => {
            let (max_bin, bandwidth) = psd.estimate_bandwidth(&mut ctx);
            stream.write_u32_le(max_bin as u32);
            stream.write_u32_le(bandwidth as u32);
        }
        Mode::Autocorrelation => {
            let correlogram = psd.autocorrelate(&mut ctx);
            for k in 0..=config::fft::FFT_SIZE {
                stream.write_q16_le(correlogram[k].re);
            }
        }
        Mode::MaxAutocorrelationAndEntropy => {
            let correlogram = psd.autocorrelate(&mut ctx);
            let max_autocorrelation = PsdAccumulator::find_maximum_autocorrelation(&correlogram);
            ctx.clear();
            let entropy = histogram.estimate_entropy(&mut ctx);
            stream.write_q16_le(max_autocorrelation);
            stream.write_q16_le(entropy);
        }
        Mode::HostTestLoop => {
            // Handled by `run_host_test_loop`; callers dispatch on `Mode`
            // themselves since that path needs a scratch histogram and an
            // (optional) cycle counter this function doesn't take.
        }
    }
}

/// The host-driven test loop entered by any non-letter mode byte
/// (`spec.md` §6): reads `SAMPLE_COUNT` little-endian `u16` samples from
/// `stream`, clears `scratch`, accumulates them, computes mean, variance,
/// skewness numerator, kurtosis numerator, and entropy, and writes all
/// five Q16.16 values followed by a 32-bit little-endian cycle count.
///
/// `cycle_count` is supplied by the caller rather than read from a timer
/// in this function, since cycle counting is platform-specific and out of
/// scope for this crate (`spec.md` §1); pass `0` on a host with no
/// meaningful cycle counter.
pub fn run_host_test_loop(
    scratch: &mut DefaultHistogram,
    stream: &mut impl DiagnosticStream,
    cycle_count: u32,
) {
    scratch.clear();
    for _ in 0..config::pool::SAMPLE_COUNT {
        let sample = stream.read_u16_le();
        scratch.increment(sample);
    }

    let mut ctx = FixedOverflow::new();
    let mean = scratch.central_moment(Q16::ZERO, 1, &mut ctx);
    let variance = scratch.central_moment(mean, 2, &mut ctx);
    let kappa3 = scratch.central_moment(mean, 3, &mut ctx);
    let kappa4 = scratch.central_moment(mean, 4, &mut ctx);
    ctx.clear();
    let entropy = scratch.estimate_entropy(&mut ctx);

    for value in [mean, variance, kappa3, kappa4, entropy] {
        stream.write_q16_le(value);
    }
    stream.write_u32_le(cycle_count);
}
