//! The qualification engine (`spec.md` §4.7): orchestrates acquisition,
//! filtering, and statistical testing, and owns the vetted pool, the
//! histogram, and the PSD accumulator exclusively (`spec.md` §3
//! Ownership). `random_32_bytes` is the crate's sole production entry
//! point (`spec.md` §6).

mod checks;

use crate::collaborators::{AdcSampleSource, IdlePowerControl, IndicatorSink};
use crate::config;
use crate::error::QualificationFailure;
use crate::fft;
use crate::filter::FirDecimator;
use crate::fixed_point::{FixedOverflow, Q16};
use crate::histogram::DefaultHistogram;
use crate::pool::SamplePool;
use crate::psd::PsdAccumulator;
use crate::verdict::TestFailures;

/// Whether a failed statistical verdict is surfaced to the caller as a
/// hardware failure, or silently forced to `PASS` (`spec.md` §4.7 / §6's
/// `IGNORE_HWRNG_FAILURE` build option), threaded in as a policy value
/// rather than a `#[cfg]` branch per the Design Note in `spec.md` §9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// A failed verdict is reported to the caller; the pool stays
    /// exhausted and the next call retries acquisition.
    #[default]
    Strict,
    /// A failed verdict is forced to `PASS` after notifying the
    /// [`IndicatorSink`] (the original firmware's red-LED blink,
    /// `spec.md` §4.7). The returned entropy-bits figure is unchanged:
    /// this policy exists for field diagnosability, not because the
    /// samples became any more trustworthy.
    Ignore,
}

/// Which phase of `spec.md` §4.7's `IDLE -> FILLING -> TESTING ->
/// {READY, FAILED}` state machine the engine is in. Not load-bearing for
/// correctness (every `random_32_bytes` call runs the whole machine
/// synchronously) but kept so `defmt` traces show qualification progress,
/// the same way the teacher logs phases of its own ADC processing task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Filling,
    Testing,
    Ready,
    Failed,
}

#[cfg(feature = "defmt")]
impl defmt::Format for RunState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Idle => defmt::write!(f, "Idle"),
            Self::Filling => defmt::write!(f, "Filling"),
            Self::Testing => defmt::write!(f, "Testing"),
            Self::Ready => defmt::write!(f, "Ready"),
            Self::Failed => defmt::write!(f, "Failed"),
        }
    }
}

/// Owns the vetted pool, histogram, PSD accumulator, and FIR decimator for
/// one hardware RNG. `ADC_LEN` and `DECIMATED_LEN` are the ADC driver's
/// circular buffer size and one decimated block's length; `SAMPLE_COUNT`
/// is the pool size; `HALF_ORDER` is the FIR kernel's half-order. The
/// histogram bin count and FFT size are not generic parameters: they come
/// straight from [`config`], since unlike the ADC geometry they are never
/// varied per-instance in this crate.
pub struct QualificationEngine<
    const ADC_LEN: usize,
    const DECIMATED_LEN: usize,
    const SAMPLE_COUNT: usize,
    const HALF_ORDER: usize,
> {
    pool: SamplePool<SAMPLE_COUNT>,
    histogram: DefaultHistogram,
    psd: PsdAccumulator,
    filter: FirDecimator<HALF_ORDER>,
    failure_policy: FailurePolicy,
    state: RunState,
}

impl<const ADC_LEN: usize, const DECIMATED_LEN: usize, const SAMPLE_COUNT: usize, const HALF_ORDER: usize>
    QualificationEngine<ADC_LEN, DECIMATED_LEN, SAMPLE_COUNT, HALF_ORDER>
{
    /// `spec.md` §4.7's compile-time invariants, checked against this
    /// instantiation's const generics. Referenced from `new` so they are
    /// evaluated (a generic `const _: () = assert!(...)` item is only
    /// checked when named, since its condition depends on the impl's
    /// generic parameters).
    const CHECK_SAMPLE_COUNT_DIVIDES_BY_DECIMATED_LEN: () =
        assert!(SAMPLE_COUNT % DECIMATED_LEN == 0, "SAMPLE_COUNT must be a multiple of DECIMATED_LEN");
    const CHECK_SAMPLE_COUNT_DIVIDES_BY_FFT_BLOCK: () = assert!(
        SAMPLE_COUNT % (2 * config::fft::FFT_SIZE) == 0,
        "SAMPLE_COUNT must be a multiple of 2*FFT_SIZE"
    );
    const CHECK_DECIMATED_LEN_DIVIDES_BY_16: () =
        assert!(DECIMATED_LEN % 16 == 0, "DECIMATED_LEN must be a multiple of 16");
    const CHECK_ADC_LEN_IS_POWER_OF_TWO: () =
        assert!(ADC_LEN.is_power_of_two(), "ADC_LEN must be a power of two");

    pub fn new(filter: FirDecimator<HALF_ORDER>, failure_policy: FailurePolicy) -> Self {
        Self::CHECK_SAMPLE_COUNT_DIVIDES_BY_DECIMATED_LEN;
        Self::CHECK_SAMPLE_COUNT_DIVIDES_BY_FFT_BLOCK;
        Self::CHECK_DECIMATED_LEN_DIVIDES_BY_16;
        Self::CHECK_ADC_LEN_IS_POWER_OF_TWO;

        Self {
            pool: SamplePool::new(),
            histogram: DefaultHistogram::new(),
            psd: PsdAccumulator::new(),
            filter,
            failure_policy,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// The sole production operation (`spec.md` §6): if the pool is empty
    /// or exhausted, runs a full qualification; on `PASS` (or a forced
    /// pass under [`FailurePolicy::Ignore`]), writes the next 16 samples
    /// into `out` as little-endian bytes and returns the configured
    /// entropy-bits-per-output; on a surfaced failure, `out` is left
    /// untouched and an `Err` is returned (`spec.md` §4.7, §7).
    pub fn random_32_bytes<A, P, I>(
        &mut self,
        adc: &mut A,
        power: &mut P,
        indicator: &mut I,
        out: &mut [u8; 32],
    ) -> Result<u32, QualificationFailure<A::Error>>
    where
        A: AdcSampleSource<ADC_LEN>,
        P: IdlePowerControl,
        I: IndicatorSink,
    {
        if self.pool.is_exhausted() {
            let verdict = self.run_qualification(adc, power)?;
            indicator.report(verdict);

            if verdict.is_pass() {
                self.pool.reset_cursor();
                self.state = RunState::Ready;
            } else {
                match self.failure_policy {
                    FailurePolicy::Strict => {
                        self.state = RunState::Failed;
                        return Err(QualificationFailure::StatisticalTest(verdict));
                    }
                    FailurePolicy::Ignore => {
                        // Forced PASS: the caller already saw the real
                        // verdict via `indicator.report` above.
                        self.pool.reset_cursor();
                        self.state = RunState::Ready;
                    }
                }
            }
        }

        let bytes = self
            .pool
            .take16_le_bytes()
            .expect("pool was just filled or was already non-exhausted");
        *out = bytes;

        let entropy_bits = 16.0 * config::pool::ENTROPY_BITS_PER_SAMPLE;
        Ok(entropy_bits.round() as u32)
    }

    /// One full acquire-filter-histogram-PSD-test cycle (`spec.md` §4.7
    /// steps 1-5). Does not touch the pool's cursor: the caller decides
    /// whether to make the freshly filled pool readable, based on the
    /// returned verdict and its [`FailurePolicy`].
    fn run_qualification<A, P>(
        &mut self,
        adc: &mut A,
        power: &mut P,
    ) -> Result<TestFailures, QualificationFailure<A::Error>>
    where
        A: AdcSampleSource<ADC_LEN>,
        P: IdlePowerControl,
    {
        self.state = RunState::Filling;
        self.histogram.clear();
        self.psd.clear();

        let mut adc_buffer = [0i16; ADC_LEN];
        let mut decimated = [0i16; DECIMATED_LEN];
        let mut filter_ctx = FixedOverflow::new();

        for block_index in 0..config::pool::FILL_ITERATIONS {
            power.exit_idle();
            let fill_result = adc.fill(&mut adc_buffer);
            power.enter_idle();
            fill_result.map_err(QualificationFailure::Acquisition)?;

            self.filter.decimate(&adc_buffer, &mut decimated, &mut filter_ctx);
            self.pool.fill_block(block_index, &decimated);
        }

        for &sample in self.pool.samples() {
            self.histogram.increment(sample);
        }

        self.state = RunState::Testing;

        let mut ctx = FixedOverflow::new();
        let (histogram_verdict, variance) = checks::histogram_tests_failed(&self.histogram, &mut ctx);

        let samples = self.pool.samples();
        for block in 0..config::pool::PSD_BLOCKS {
            let mut block_samples = [Q16::ZERO; fft::N];
            for (i, slot) in block_samples.iter_mut().enumerate() {
                let sample = samples[block * fft::N + i];
                *slot = Q16::from_num(DefaultHistogram::recentered(sample));
            }
            let spectrum = fft::real_fft(&block_samples, &mut ctx);
            self.psd.accumulate(&spectrum, &mut ctx);
        }

        let fft_verdict = checks::fft_tests_failed(&self.psd, variance, &mut ctx);

        Ok(histogram_verdict | fft_verdict)
    }
}

/// The engine instantiated with this crate's default `config` geometry.
pub type DefaultEngine = QualificationEngine<
    { config::adc::ADC_SAMPLE_BUFFER_SIZE },
    { config::adc::DECIMATED_SAMPLE_BUFFER_SIZE },
    { config::pool::SAMPLE_COUNT },
    { config::filter::FILTER_HALF_ORDER },
>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{NoIdlePowerControl, NullIndicator};
    use core::convert::Infallible;

    const ADC_LEN: usize = config::adc::ADC_SAMPLE_BUFFER_SIZE;
    const DECIMATED_LEN: usize = config::adc::DECIMATED_SAMPLE_BUFFER_SIZE;
    const SAMPLE_COUNT: usize = config::pool::SAMPLE_COUNT;
    const HALF_ORDER: usize = config::filter::FILTER_HALF_ORDER;

    type TestEngine = QualificationEngine<ADC_LEN, DECIMATED_LEN, SAMPLE_COUNT, HALF_ORDER>;

    /// Feeds a deterministic waveform (sampled as `i16`) into `fill`, one
    /// `ADC_LEN`-sample buffer per call.
    struct WaveformSource<F> {
        waveform: F,
        calls: usize,
    }

    impl<F: FnMut(usize) -> i16> AdcSampleSource<ADC_LEN> for WaveformSource<F> {
        type Error = Infallible;

        fn fill(&mut self, buffer: &mut [i16; ADC_LEN]) -> Result<(), Self::Error> {
            let base = self.calls * ADC_LEN;
            for (i, slot) in buffer.iter_mut().enumerate() {
                *slot = (self.waveform)(base + i);
            }
            self.calls += 1;
            Ok(())
        }
    }

    /// A small deterministic xorshift PRNG, used only to synthesize a
    /// white-noise-like waveform for the PASS scenario; not cryptographic,
    /// not part of the production crate.
    struct XorShift32(u32);

    impl XorShift32 {
        fn next(&mut self) -> u32 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            self.0 = x;
            x
        }
    }

    fn new_engine() -> TestEngine {
        TestEngine::new(FirDecimator::new(config::filter::kernel()), FailurePolicy::Strict)
    }

    #[test]
    fn constant_input_fails_qualification() {
        let mut engine = new_engine();
        let mut adc = WaveformSource {
            waveform: |_| 2048,
            calls: 0,
        };
        let mut power = NoIdlePowerControl;
        let mut indicator = NullIndicator;
        let mut out = [0u8; 32];

        let result = engine.random_32_bytes(&mut adc, &mut power, &mut indicator, &mut out);
        assert!(result.is_err());
        assert_eq!(out, [0u8; 32]);
        assert_eq!(engine.state(), RunState::Failed);
    }

    #[test]
    fn white_noise_like_input_passes_and_advances_cursor() {
        let mut engine = new_engine();
        let mut rng = XorShift32(0xC0FF_EE01);
        let mut adc = WaveformSource {
            waveform: move |_| {
                // full-range, non-periodic-in-the-low-bits noise: a step
                // that evenly divides the histogram bin count (e.g. `* 8`
                // with 64 bins) would alias to a handful of residues and
                // tank the entropy estimate regardless of how "random" the
                // waveform looks at full amplitude.
                let noise = (rng.next() % 256) as i32 - 128;
                (2048 + noise) as i16
            },
            calls: 0,
        };
        let mut power = NoIdlePowerControl;
        let mut indicator = NullIndicator;
        let mut out = [0u8; 32];

        // A single run is a statistical test and can reject a genuinely
        // white-noise-like source by chance (`spec.md` §7: a failed verdict
        // just means the next call attempts a fresh run against new
        // samples), so retry a bounded number of times rather than pinning
        // this test to whichever verdict the very first draw happens to
        // land on.
        let mut entropy_bits = None;
        for _ in 0..16 {
            if let Ok(bits) = engine.random_32_bytes(&mut adc, &mut power, &mut indicator, &mut out) {
                entropy_bits = Some(bits);
                break;
            }
        }
        let entropy_bits =
            entropy_bits.expect("white-noise-like input should pass qualification within a few attempts");
        assert!(entropy_bits > 0);
        assert_ne!(out, [0u8; 32]);
        assert_eq!(engine.state(), RunState::Ready);
    }

    #[test]
    fn ignore_policy_forces_pass_on_failed_verdict() {
        let mut engine = TestEngine::new(FirDecimator::new(config::filter::kernel()), FailurePolicy::Ignore);
        let mut adc = WaveformSource {
            waveform: |_| 2048,
            calls: 0,
        };
        let mut power = NoIdlePowerControl;
        let mut indicator = NullIndicator;
        let mut out = [0u8; 32];

        let result = engine.random_32_bytes(&mut adc, &mut power, &mut indicator, &mut out);
        assert!(result.is_ok());
        assert_eq!(engine.state(), RunState::Ready);
    }

    #[test]
    fn failed_run_never_advances_cursor_or_emits_bytes() {
        let mut engine = new_engine();
        let mut adc = WaveformSource {
            waveform: |_| 2048,
            calls: 0,
        };
        let mut power = NoIdlePowerControl;
        let mut indicator = NullIndicator;
        let mut out = [0xFFu8; 32];

        let _ = engine.random_32_bytes(&mut adc, &mut power, &mut indicator, &mut out);
        assert_eq!(out, [0xFFu8; 32], "out must be untouched on failure");

        // a second call retries acquisition rather than serving stale data
        let _ = engine.random_32_bytes(&mut adc, &mut power, &mut indicator, &mut out);
        assert_eq!(out, [0xFFu8; 32]);
    }
}
