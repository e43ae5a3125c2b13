//! Histogram accumulator: bin counts over filtered samples, plus the
//! central moments and entropy estimate derived from them (`spec.md` §4.2).

use crate::config::histogram::{HISTOGRAM_NUM_BINS, SAMPLE_SCALE_DOWN};
use crate::fixed_point::{self, FixedOverflow, Q16};

/// Fixed-size bucketed frequency distribution of filtered samples.
#[derive(Clone)]
pub struct Histogram<const BINS: usize> {
    counts: [u32; BINS],
    overflow: bool,
}

impl<const BINS: usize> Default for Histogram<BINS> {
    fn default() -> Self {
        Self {
            counts: [0; BINS],
            overflow: false,
        }
    }
}

impl<const BINS: usize> Histogram<BINS> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero all bins and the overflow flag.
    pub fn clear(&mut self) {
        self.counts = [0; BINS];
        self.overflow = false;
    }

    /// Whether any bin count saturated since the last `clear`.
    pub fn overflow(&self) -> bool {
        self.overflow
    }

    /// Map `sample` to a bin and increment it, setting `overflow` if the
    /// counter saturates. The bin is the low bits of `sample / SAMPLE_SCALE_DOWN`
    /// (`spec.md` §4.2: "in practice the low bits").
    pub fn increment(&mut self, sample: u16) {
        let bin = Self::bin_of(sample);
        let count = &mut self.counts[bin];
        match count.checked_add(1) {
            Some(v) => *count = v,
            None => {
                self.overflow = true;
                *count = u32::MAX;
            }
        }
    }

    /// Bin index for a raw filtered sample.
    pub fn bin_of(sample: u16) -> usize {
        (i32::from(sample) / SAMPLE_SCALE_DOWN) as usize % BINS
    }

    /// Recentered bin value for a raw filtered sample: the same small,
    /// signed domain `central_moment` operates on. The PSD/FFT arm
    /// (`crate::psd`) runs on this same reduced value rather than the raw
    /// sample, so histogram variance and FFT-derived autocorrelation stay
    /// in comparable units (see DESIGN.md).
    pub fn recentered(sample: u16) -> i32 {
        Self::bin_center(Self::bin_of(sample))
    }

    fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// Recentered representative value for bin `i`: `i - BINS/2`.
    fn bin_center(i: usize) -> i32 {
        i as i32 - (BINS as i32) / 2
    }

    /// `sum_i p_i * (x_i - about)^order`, in Q16.16, where `x_i` is the
    /// recentered bin value. Sets `ctx`'s sticky flag on overflow.
    pub fn central_moment(&self, about: Q16, order: u32, ctx: &mut FixedOverflow) -> Q16 {
        let total = self.total();
        if total == 0 {
            return Q16::ZERO;
        }

        let mut accumulator = Q16::ZERO;
        for (i, &count) in self.counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let p = Q16::from_num(count) / Q16::from_num(total as u32);
            let x = Q16::from_num(Self::bin_center(i));
            let deviation = fixed_point::sub(ctx, x, about);
            // Fold `p_i` in before exponentiating rather than after, so the
            // running intermediate stays bounded by `p_i * deviation^k`
            // instead of a bare `deviation^order` (which overflows Q16.16
            // for a wide-order moment at an extreme bin well before its
            // probability weight ever gets applied).
            let mut term = p;
            for _ in 0..order {
                term = fixed_point::mul(ctx, term, deviation);
            }
            accumulator = fixed_point::add(ctx, accumulator, term);
        }
        accumulator
    }

    /// Shannon entropy in bits of the empirical distribution, skipping
    /// zero-count bins.
    pub fn estimate_entropy(&self, ctx: &mut FixedOverflow) -> Q16 {
        let total = self.total();
        if total == 0 {
            return Q16::ZERO;
        }

        let mut accumulator = Q16::ZERO;
        for &count in self.counts.iter() {
            if count == 0 {
                continue;
            }
            let p = Q16::from_num(count) / Q16::from_num(total as u32);
            let log2_p = fixed_point::log2(ctx, p);
            let term = fixed_point::mul(ctx, p, log2_p);
            accumulator = fixed_point::sub(ctx, accumulator, term);
        }
        accumulator
    }
}

pub type DefaultHistogram = Histogram<HISTOGRAM_NUM_BINS>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_resets_bins_and_overflow() {
        let mut h: Histogram<4> = Histogram::new();
        h.increment(0);
        h.clear();
        assert_eq!(h.total(), 0);
        assert!(!h.overflow());
    }

    #[test]
    fn increment_overflow_sets_sticky_flag() {
        let mut h: Histogram<4> = Histogram::new();
        h.counts[0] = u32::MAX;
        h.increment(0);
        assert!(h.overflow());
        assert_eq!(h.counts[0], u32::MAX);
    }

    #[test]
    fn single_bin_histogram_has_zero_entropy() {
        let mut h: Histogram<4> = Histogram::new();
        for _ in 0..100 {
            h.increment(0);
        }
        let mut ctx = FixedOverflow::new();
        let entropy = h.estimate_entropy(&mut ctx);
        assert!(entropy.abs() < Q16::from_num(1) / 100);
        assert!(!ctx.occurred());
    }

    #[test]
    fn uniform_histogram_has_log2_b_entropy() {
        let mut h: Histogram<64> = Histogram::new();
        for bin in 0..64u16 {
            for _ in 0..32 {
                h.increment(bin);
            }
        }
        let mut ctx = FixedOverflow::new();
        let entropy = h.estimate_entropy(&mut ctx);
        assert!((entropy - Q16::from_num(6)).abs() < Q16::from_num(1) / 20);
    }

    #[test]
    fn uniform_histogram_has_zero_mean_after_centering() {
        let mut h: Histogram<64> = Histogram::new();
        for bin in 0..64u16 {
            for _ in 0..32 {
                h.increment(bin);
            }
        }
        let mut ctx = FixedOverflow::new();
        let mean = h.central_moment(Q16::ZERO, 1, &mut ctx);
        assert!(mean.abs() < Q16::from_num(1) / 100);
    }

    #[test]
    fn constant_input_has_zero_variance() {
        let mut h: Histogram<64> = Histogram::new();
        for _ in 0..2048 {
            h.increment(32);
        }
        let mut ctx = FixedOverflow::new();
        let mean = h.central_moment(Q16::ZERO, 1, &mut ctx);
        let variance = h.central_moment(mean, 2, &mut ctx);
        assert_eq!(variance, Q16::ZERO);
    }
}
