//! FIR decimation filter (`spec.md` §4.1): circular convolution over an
//! oversampled ADC ring buffer, producing one filtered, decimated sample
//! per `OVERSAMPLE_RATIO` raw samples.
//!
//! Grounded in the teacher's `adc/window.rs` windowing convolution, which
//! walks a circular buffer with modular indexing the same way; the kernel
//! itself and the round-half-up convention come from
//! `original_source/pic32/hwrng.c`'s `fir_lowpass_coefficients` /
//! `doFilter` (fixed-point multiply-accumulate, rounded, not truncated).

use crate::config;
use crate::fixed_point::{self, FixedOverflow, Q16};

/// Symmetric FIR low-pass filter applied to a power-of-two-sized circular
/// ADC sample buffer, decimating by `config::adc::OVERSAMPLE_RATIO`.
pub struct FirDecimator<const HALF_ORDER: usize> {
    kernel: [Q16; 2 * HALF_ORDER + 1],
}

impl<const HALF_ORDER: usize> FirDecimator<HALF_ORDER> {
    pub fn new(kernel: [Q16; 2 * HALF_ORDER + 1]) -> Self {
        Self { kernel }
    }

    /// Convolve the kernel around `center`, treating `buffer` as a ring of
    /// length `buffer.len()` (which must be a power of two: indices are
    /// masked, not wrapped with `%`).
    fn convolve_at(&self, buffer: &[i16], center: usize, ctx: &mut FixedOverflow) -> Q16 {
        debug_assert!(buffer.len().is_power_of_two());
        let mask = buffer.len() - 1;
        let half = HALF_ORDER;

        let mut acc = Q16::ZERO;
        for (tap, &coeff) in self.kernel.iter().enumerate() {
            let offset = tap as isize - half as isize;
            let index = (center as isize + offset) as usize & mask;
            let sample = Q16::from_num(buffer[index]);
            acc = fixed_point::add(ctx, acc, fixed_point::mul(ctx, coeff, sample));
        }
        acc
    }

    /// Filter and decimate `buffer` (a full power-of-two ADC ring) into
    /// `out`, taking every `config::adc::OVERSAMPLE_RATIO`-th convolution
    /// center, rounded half-up to the nearest `i16`.
    pub fn decimate(
        &self,
        buffer: &[i16],
        out: &mut [i16],
        ctx: &mut FixedOverflow,
    ) {
        let ratio = config::adc::OVERSAMPLE_RATIO;
        debug_assert_eq!(out.len() * ratio, buffer.len());
        for (i, slot) in out.iter_mut().enumerate() {
            let filtered = self.convolve_at(buffer, i * ratio, ctx);
            *slot = round_to_i16(filtered);
        }
    }
}

/// Round-half-up to the nearest representable `i16`, saturating rather
/// than wrapping on overflow (the filtered signal is expected to stay
/// within `i16` range; saturation only bites on a misconfigured kernel).
fn round_to_i16(x: Q16) -> i16 {
    let half_up = (x + Q16::from_num(0.5)).floor();
    let as_i32 = half_up.to_num::<i32>();
    as_i32.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_kernel() -> [Q16; 3] {
        [Q16::ZERO, Q16::from_num(1), Q16::ZERO]
    }

    #[test]
    fn identity_kernel_passes_samples_through_decimated() {
        let filter: FirDecimator<1> = FirDecimator::new(identity_kernel());
        let buffer: [i16; 8] = [1, 2, 3, 4, 5, 6, 7, 8];
        let mut out = [0i16; 4];
        let mut ctx = FixedOverflow::new();
        filter.decimate(&buffer, &mut out, &mut ctx);
        assert!(!ctx.occurred());
        assert_eq!(out, [1, 3, 5, 7]);
    }

    #[test]
    fn averaging_kernel_smooths_alternating_samples() {
        // [1/4, 1/2, 1/4] averages a sample with its neighbors.
        let kernel = [
            Q16::from_num(1) / 4,
            Q16::from_num(1) / 2,
            Q16::from_num(1) / 4,
        ];
        let filter: FirDecimator<1> = FirDecimator::new(kernel);
        let buffer: [i16; 8] = [10, 10, 10, 10, 10, 10, 10, 10];
        let mut out = [0i16; 4];
        let mut ctx = FixedOverflow::new();
        filter.decimate(&buffer, &mut out, &mut ctx);
        assert!(!ctx.occurred());
        assert_eq!(out, [10, 10, 10, 10]);
    }

    #[test]
    fn full_kernel_matches_configured_half_order() {
        let filter = FirDecimator::new(config::filter::kernel());
        let buffer = [0i16; 32];
        let mut out = [0i16; 16];
        let mut ctx = FixedOverflow::new();
        filter.decimate(&buffer, &mut out, &mut ctx);
        assert!(!ctx.occurred());
        assert_eq!(out, [0i16; 16]);
    }
}
