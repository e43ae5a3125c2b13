//! Power spectral density accumulation, bandwidth estimation, and
//! autocorrelation via the Wiener-Khinchin theorem (`spec.md` §4.3-§4.5).
//!
//! `estimate_bandwidth` and `find_maximum_autocorrelation` are grounded
//! directly on `estimateBandwidth` and `findMaximumAutoCorrelation` in
//! `original_source/pic32/hwrng.c`: the threshold-crossing edge search with
//! a consecutive-below-threshold run length, and the abs-max scan over
//! lags `AUTOCORR_START_LAG..=FFT_SIZE`, are both carried over bin-for-bin.

use crate::config::fft::FFT_SIZE;
use crate::config::psd::{
    AUTOCORR_START_LAG, PSD_BANDWIDTH_THRESHOLD, PSD_THRESHOLD_REPETITIONS,
};
use crate::fft;
use crate::fixed_point::{self, FixedOverflow, Q16};
use num_complex::Complex;

const BINS: usize = FFT_SIZE + 1;

/// Accumulated power spectral density over `PSD_BLOCKS` FFT blocks.
#[derive(Clone)]
pub struct PsdAccumulator {
    bins: [Q16; BINS],
    overflow: bool,
}

impl Default for PsdAccumulator {
    fn default() -> Self {
        Self {
            bins: [Q16::ZERO; BINS],
            overflow: false,
        }
    }
}

impl PsdAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.bins = [Q16::ZERO; BINS];
        self.overflow = false;
    }

    pub fn overflow(&self) -> bool {
        self.overflow
    }

    pub fn bins(&self) -> &[Q16; BINS] {
        &self.bins
    }

    /// Add one FFT block's squared magnitude to the running PSD.
    pub fn accumulate(&mut self, spectrum: &[Complex<Q16>; BINS], ctx: &mut FixedOverflow) {
        for (bin, &sample) in self.bins.iter_mut().zip(spectrum.iter()) {
            let magnitude_squared = fixed_point::add(
                ctx,
                fixed_point::mul(ctx, sample.re, sample.re),
                fixed_point::mul(ctx, sample.im, sample.im),
            );
            *bin = fixed_point::add(ctx, *bin, magnitude_squared);
        }
        if ctx.occurred() {
            self.overflow = true;
        }
    }

    /// Peak bin and its bandwidth in FFT bins, found by walking out from
    /// the peak until `PSD_THRESHOLD_REPETITIONS` consecutive bins fall
    /// below `PSD_BANDWIDTH_THRESHOLD` of the peak.
    pub fn estimate_bandwidth(&self, ctx: &mut FixedOverflow) -> (usize, usize) {
        let mut max_bin = 0;
        let mut peak = Q16::ZERO;
        for (i, &v) in self.bins.iter().enumerate() {
            if v > peak {
                peak = v;
                max_bin = i;
            }
        }
        let threshold = fixed_point::mul(ctx, peak, Q16::from_num(PSD_BANDWIDTH_THRESHOLD));

        let mut below = 0;
        let mut left_bin = 0;
        for i in (0..=max_bin).rev() {
            if self.bins[i] < threshold {
                below += 1;
            } else {
                below = 0;
            }
            if below >= PSD_THRESHOLD_REPETITIONS {
                left_bin = i + PSD_THRESHOLD_REPETITIONS;
                break;
            }
        }

        let mut below = 0;
        let mut right_bin = FFT_SIZE;
        for i in max_bin..BINS {
            if self.bins[i] < threshold {
                below += 1;
            } else {
                below = 0;
            }
            if below >= PSD_THRESHOLD_REPETITIONS {
                right_bin = i - PSD_THRESHOLD_REPETITIONS;
                break;
            }
        }

        (max_bin, right_bin.saturating_sub(left_bin))
    }

    /// Correlogram via the Wiener-Khinchin theorem: inverse FFT of the
    /// accumulated PSD, real-valued by construction (the PSD is real and
    /// conjugate-symmetric once mirrored).
    pub fn autocorrelate(&self, ctx: &mut FixedOverflow) -> [Complex<Q16>; fft::N] {
        let full_spectrum = fft::mirror_real_spectrum(&self.bins);
        fft::inverse_fft(&full_spectrum, ctx)
    }

    /// Largest-magnitude autocorrelation amplitude at lags
    /// `AUTOCORR_START_LAG..=FFT_SIZE`, skipping the self-correlation peak
    /// near lag zero.
    pub fn find_maximum_autocorrelation(correlogram: &[Complex<Q16>; fft::N]) -> Q16 {
        let mut max = Q16::ZERO;
        for &c in &correlogram[AUTOCORR_START_LAG..=FFT_SIZE] {
            let sample = c.re.abs();
            if sample > max {
                max = sample;
            }
        }
        max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_spectrum(value: f64) -> [Complex<Q16>; BINS] {
        let mut out = [Complex::new(Q16::ZERO, Q16::ZERO); BINS];
        for bin in out.iter_mut() {
            bin.re = Q16::from_num(value);
        }
        out
    }

    #[test]
    fn clear_resets_bins_and_overflow() {
        let mut psd = PsdAccumulator::new();
        let mut ctx = FixedOverflow::new();
        psd.accumulate(&flat_spectrum(1.0), &mut ctx);
        psd.clear();
        assert!(!psd.overflow());
        assert!(psd.bins().iter().all(|&b| b == Q16::ZERO));
    }

    #[test]
    fn peaked_spectrum_reports_its_bin_as_bandwidth_center() {
        let mut psd = PsdAccumulator::new();
        let mut spectrum = [Complex::new(Q16::ZERO, Q16::ZERO); BINS];
        spectrum[40].re = Q16::from_num(100);
        let mut ctx = FixedOverflow::new();
        psd.accumulate(&spectrum, &mut ctx);
        let (max_bin, bandwidth) = psd.estimate_bandwidth(&mut ctx);
        assert_eq!(max_bin, 40);
        assert!(bandwidth < 10);
    }

    #[test]
    fn flat_spectrum_has_wide_bandwidth() {
        let mut psd = PsdAccumulator::new();
        let mut ctx = FixedOverflow::new();
        psd.accumulate(&flat_spectrum(10.0), &mut ctx);
        let (_max_bin, bandwidth) = psd.estimate_bandwidth(&mut ctx);
        assert!(bandwidth > FFT_SIZE / 2);
    }

    #[test]
    fn flat_psd_has_near_zero_autocorrelation_away_from_origin() {
        let mut psd = PsdAccumulator::new();
        let mut ctx = FixedOverflow::new();
        psd.accumulate(&flat_spectrum(1.0), &mut ctx);
        let correlogram = psd.autocorrelate(&mut ctx);
        assert!(!ctx.occurred());
        let max = PsdAccumulator::find_maximum_autocorrelation(&correlogram);
        assert!(max < Q16::from_num(1));
    }
}
