//! Statistical test table (`spec.md` §4.6): turns a filled [`Histogram`]
//! and [`PsdAccumulator`] into a [`TestFailures`] verdict.
//!
//! Named `checks` rather than `tests` (the name `spec.md` §4.6 and
//! `SPEC_FULL.md` use for this submodule) to avoid colliding with this
//! crate's own convention of a `#[cfg(test)] mod tests` in every module —
//! see DESIGN.md.

use crate::config::psd as psd_cfg;
use crate::config::stattest;
use crate::fixed_point::{self, FixedOverflow, Q16};
use crate::histogram::Histogram;
use crate::psd::PsdAccumulator;
use crate::verdict::{self, TestFailures};

/// Runs every histogram-derived test in `spec.md` §4.6's first table.
/// Returns the verdict plus the computed variance, which `fft_tests_failed`
/// needs for the autocorrelation threshold (`spec.md` §5: "histogram tests
/// must precede FFT tests because `variance` feeds the autocorrelation
/// threshold").
pub fn histogram_tests_failed<const BINS: usize>(
    histogram: &Histogram<BINS>,
    ctx: &mut FixedOverflow,
) -> (TestFailures, Q16) {
    let mut verdict = TestFailures::PASS;

    ctx.clear();
    let mean = histogram.central_moment(Q16::ZERO, 1, ctx);
    let variance = histogram.central_moment(mean, 2, ctx);
    let kappa3 = histogram.central_moment(mean, 3, ctx);
    let kappa4 = histogram.central_moment(mean, 4, ctx);
    let moments_overflowed = ctx.occurred() || histogram.overflow();

    if moments_overflowed {
        verdict.set(verdict::MOMENT_OVERFLOW);
    } else {
        let half_bins = Q16::from_num(BINS as i32 / 2);
        let scale = Q16::from_num(crate::config::histogram::SAMPLE_SCALE_DOWN);

        let min_mean = (Q16::from_num(stattest::STATTEST_MIN_MEAN) - half_bins) / scale;
        let max_mean = (Q16::from_num(stattest::STATTEST_MAX_MEAN) - half_bins) / scale;
        if mean <= min_mean || mean >= max_mean {
            verdict.set(verdict::MEAN_OUT_OF_RANGE);
        }

        let scale_sq = scale * scale;
        let min_variance = Q16::from_num(stattest::STATTEST_MIN_VARIANCE) / scale_sq;
        let max_variance = Q16::from_num(stattest::STATTEST_MAX_VARIANCE) / scale_sq;
        if variance <= min_variance || variance >= max_variance {
            verdict.set(verdict::VARIANCE_OUT_OF_RANGE);
        }

        // |skewness| >= s_max  <=>  kappa3^2 >= variance^3 * s_max^2
        // (spec.md §4.6: squared form avoids sqrt/division).
        let kappa3_sq = fixed_point::mul(ctx, kappa3, kappa3);
        let variance_cubed = fixed_point::mul(ctx, fixed_point::mul(ctx, variance, variance), variance);
        let max_skewness_sq =
            Q16::from_num(stattest::STATTEST_MAX_SKEWNESS) * Q16::from_num(stattest::STATTEST_MAX_SKEWNESS);
        if kappa3_sq >= fixed_point::mul(ctx, variance_cubed, max_skewness_sq) {
            verdict.set(verdict::SKEWNESS_OUT_OF_RANGE);
        }

        // excess kurtosis vs [MIN, MAX]: kappa4 vs (kurtosis + 3) * variance^2,
        // i.e. kappa4 / variance^2 - 3 compared against MIN/MAX (spec.md §4.6).
        let variance_sq = fixed_point::mul(ctx, variance, variance);
        let min_kurtosis_term = fixed_point::mul(
            ctx,
            variance_sq,
            Q16::from_num(stattest::STATTEST_MIN_KURTOSIS) + Q16::from_num(3),
        );
        let max_kurtosis_term = fixed_point::mul(
            ctx,
            variance_sq,
            Q16::from_num(stattest::STATTEST_MAX_KURTOSIS) + Q16::from_num(3),
        );
        if kappa4 <= min_kurtosis_term || kappa4 >= max_kurtosis_term {
            verdict.set(verdict::KURTOSIS_OUT_OF_RANGE);
        }
    }

    ctx.clear();
    let entropy = histogram.estimate_entropy(ctx);
    if ctx.occurred() || entropy < Q16::from_num(stattest::STATTEST_MIN_ENTROPY) {
        verdict.set(verdict::ENTROPY_BELOW_MINIMUM);
    }

    (verdict, variance)
}

/// Runs every FFT-derived test in `spec.md` §4.6's second table.
/// `variance` must come from [`histogram_tests_failed`] on the same run.
pub fn fft_tests_failed(psd: &PsdAccumulator, variance: Q16, ctx: &mut FixedOverflow) -> TestFailures {
    let mut verdict = TestFailures::PASS;
    let n = crate::fft::N as f32;

    ctx.clear();
    let (max_bin, bandwidth) = psd.estimate_bandwidth(ctx);

    if psd.overflow() {
        verdict.set(verdict::PSD_OVERFLOW);
    } else {
        if (max_bin as f32) < psd_cfg::PSD_MIN_PEAK * n || (max_bin as f32) > psd_cfg::PSD_MAX_PEAK * n {
            verdict.set(verdict::PEAK_OUT_OF_RANGE);
        }
        if (bandwidth as f32) < psd_cfg::PSD_MIN_BANDWIDTH * n {
            verdict.set(verdict::BANDWIDTH_BELOW_MINIMUM);
        }
    }

    ctx.clear();
    let correlogram = psd.autocorrelate(ctx);
    let max_autocorrelation = PsdAccumulator::find_maximum_autocorrelation(&correlogram);
    let threshold = fixed_point::mul(ctx, variance, Q16::from_num(psd_cfg::AUTOCORR_THRESHOLD));
    if ctx.occurred() || max_autocorrelation > threshold {
        verdict.set(verdict::AUTOCORRELATION_ABOVE_MAXIMUM);
    }

    verdict
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::histogram::HISTOGRAM_NUM_BINS;

    #[test]
    fn uniform_histogram_passes_histogram_tests() {
        let mut h: Histogram<HISTOGRAM_NUM_BINS> = Histogram::new();
        for bin in 0..HISTOGRAM_NUM_BINS as u16 {
            for _ in 0..32 {
                h.increment(bin);
            }
        }
        let mut ctx = FixedOverflow::new();
        let (verdict, _variance) = histogram_tests_failed(&h, &mut ctx);
        assert!(verdict.is_pass(), "verdict: {verdict}");
    }

    #[test]
    fn constant_histogram_fails_variance_and_entropy() {
        let mut h: Histogram<HISTOGRAM_NUM_BINS> = Histogram::new();
        for _ in 0..2048 {
            h.increment((HISTOGRAM_NUM_BINS / 2) as u16);
        }
        let mut ctx = FixedOverflow::new();
        let (verdict, _variance) = histogram_tests_failed(&h, &mut ctx);
        assert!(verdict.contains(verdict::VARIANCE_OUT_OF_RANGE));
        assert!(verdict.contains(verdict::ENTROPY_BELOW_MINIMUM));
    }

    #[test]
    fn sine_like_narrowband_spectrum_fails_bandwidth_and_autocorrelation() {
        use crate::config::fft::FFT_SIZE;
        use num_complex::Complex;

        let mut psd = PsdAccumulator::new();
        let mut ctx = FixedOverflow::new();
        let mut spectrum = [Complex::new(Q16::ZERO, Q16::ZERO); FFT_SIZE + 1];
        spectrum[FFT_SIZE / 4].re = Q16::from_num(1000);
        psd.accumulate(&spectrum, &mut ctx);

        // a variance typical of a qualified histogram, used only to scale
        // the autocorrelation threshold.
        let variance = Q16::from_num(150);
        let verdict = fft_tests_failed(&psd, variance, &mut ctx);
        assert!(verdict.contains(verdict::BANDWIDTH_BELOW_MINIMUM));
        assert!(verdict.contains(verdict::AUTOCORRELATION_ABOVE_MAXIMUM));
    }
}
