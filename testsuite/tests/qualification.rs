//! On-target-style smoke checks against the public
//! [`hwrng_qual_core::QualificationEngine`] API, driven by a loopback
//! [`hwrng_qual_core::AdcSampleSource`] instead of real hardware. Mirrors
//! the end-to-end scenarios in `spec.md` §8.

use hwrng_qual_core::collaborators::{NoIdlePowerControl, NullIndicator};
use hwrng_qual_core::config;
use hwrng_qual_core::filter::FirDecimator;
use hwrng_qual_core::{AdcSampleSource, FailurePolicy, QualificationEngine};
use std::convert::Infallible;

const ADC_LEN: usize = config::adc::ADC_SAMPLE_BUFFER_SIZE;
const DECIMATED_LEN: usize = config::adc::DECIMATED_SAMPLE_BUFFER_SIZE;
const SAMPLE_COUNT: usize = config::pool::SAMPLE_COUNT;
const HALF_ORDER: usize = config::filter::FILTER_HALF_ORDER;

type TestEngine = QualificationEngine<ADC_LEN, DECIMATED_LEN, SAMPLE_COUNT, HALF_ORDER>;

/// A small deterministic xorshift PRNG; not cryptographic, used only to
/// synthesize a white-noise-like test waveform.
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

fn new_engine() -> TestEngine {
    TestEngine::new(FirDecimator::new(config::filter::kernel()), FailurePolicy::Strict)
}

/// Full-range, non-periodic-in-the-low-bits noise source. A step that
/// evenly divides the histogram bin count (e.g. a `* 8` step against 64
/// bins) would alias to a handful of residues and tank the entropy
/// estimate no matter how "random" the waveform looks at full amplitude.
fn white_noise_waveform(rng: &mut XorShift32) -> i16 {
    let noise = (rng.next() % 256) as i32 - 128;
    (2048 + noise) as i16
}

#[test]
fn white_noise_like_source_qualifies_and_yields_entropy() {
    let mut engine = new_engine();
    let mut rng = XorShift32(0x1234_5678);
    let mut adc = WaveformSource {
        waveform: move |_| white_noise_waveform(&mut rng),
        calls: 0,
    };
    let mut power = NoIdlePowerControl;
    let mut indicator = NullIndicator;
    let mut out = [0u8; 32];

    // A single run is a statistical test and can reject a genuinely
    // white-noise-like source by chance (`spec.md` §7: a failed verdict just
    // means the next call attempts a fresh run against new samples), so
    // retry a bounded number of times rather than pinning this test to
    // whichever verdict the very first draw happens to land on.
    let mut entropy_bits = None;
    for _ in 0..16 {
        if let Ok(bits) = engine.random_32_bytes(&mut adc, &mut power, &mut indicator, &mut out) {
            entropy_bits = Some(bits);
            break;
        }
    }
    let entropy_bits = entropy_bits.expect("white-noise-like source should qualify within a few attempts");
    assert_eq!(entropy_bits, 64);
    assert_ne!(out, [0u8; 32]);
}

#[test]
fn constant_source_fails_qualification_and_leaves_output_untouched() {
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
}

#[test]
fn pure_tone_source_fails_qualification() {
    // A pure tone, unlike white noise, concentrates all its energy in a
    // single narrow band and autocorrelates strongly with itself at a
    // lag equal to its period (`spec.md` §8 scenario 3): it must not
    // qualify, regardless of exactly which verdict bits end up set after
    // the histogram's "low bits" quantization reshapes its waveform.
    let mut engine = new_engine();
    let mut phase = 0.0f64;
    let mut adc = WaveformSource {
        waveform: move |_| {
            let sample = 2048.0 + 1000.0 * phase.cos();
            phase += core::f64::consts::PI / 2.0;
            sample as i16
        },
        calls: 0,
    };
    let mut power = NoIdlePowerControl;
    let mut indicator = NullIndicator;
    let mut out = [0u8; 32];

    let result = engine.random_32_bytes(&mut adc, &mut power, &mut indicator, &mut out);
    assert!(result.is_err(), "a pure tone should not look like white noise");
    assert_eq!(out, [0u8; 32]);
}

#[test]
fn repeated_calls_drain_the_pool_before_triggering_a_new_run() {
    // `FailurePolicy::Ignore` so this test's assertions about *how many
    // times the ADC gets filled* don't depend on the synthetic waveform
    // actually passing the statistical tests — a forced pass still resets
    // the cursor exactly once per run, which is the behavior under test.
    let mut engine = TestEngine::new(FirDecimator::new(config::filter::kernel()), FailurePolicy::Ignore);
    let mut rng = XorShift32(0xDEAD_BEEF);
    let mut adc = WaveformSource {
        waveform: move |_| white_noise_waveform(&mut rng),
        calls: 0,
    };
    let mut power = NoIdlePowerControl;
    let mut indicator = NullIndicator;
    let mut out = [0u8; 32];

    let fills_per_run = SAMPLE_COUNT / DECIMATED_LEN;
    let pool_exhausted_after = SAMPLE_COUNT / 16;

    for draw in 0..pool_exhausted_after {
        engine
            .random_32_bytes(&mut adc, &mut power, &mut indicator, &mut out)
            .unwrap_or_else(|e| panic!("draw {draw} failed: {e}"));
    }
    assert_eq!(adc.calls, fills_per_run, "one run should have filled the ADC exactly once");

    // the pool is now exhausted; the next call must acquire a fresh run.
    engine
        .random_32_bytes(&mut adc, &mut power, &mut indicator, &mut out)
        .expect("a second run is forced to pass under FailurePolicy::Ignore");
    assert_eq!(adc.calls, 2 * fills_per_run);
}
