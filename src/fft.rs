//! Fixed-point FFT over Q16.16 complex samples (`spec.md` §4.3).
//!
//! Grounded in the teacher's `fft/imp.rs` radix-2 decimation-in-time
//! routine (bit-reversal reorder, `N_LOG2` butterfly stages, twiddle
//! factors from a build-time sine table) but widened from `Complex<i16>`
//! (Q0.15, hand-rolled `i32` shifts) to `Complex<Q16>` (Q16.16), using the
//! `fixed` crate's checked arithmetic for every butterfly multiply/add
//! instead of manual bit shifts. The real-input FFT here runs a full
//! `N = 2 * FFT_SIZE`-point complex transform on the input samples (zero
//! imaginary part) rather than the teacher's two-real-per-complex packing
//! trick, trading one doubling of arithmetic for a much simpler, easier to
//! get right real/inverse pair (see DESIGN.md).

use crate::config;
use crate::fixed_point::{self, FixedOverflow, Q16};
use num_complex::Complex;

/// Size of the complex FFT this module is built for: twice the configured
/// number of non-redundant output bins.
pub const N: usize = 2 * config::fft::FFT_SIZE;
const N_LOG2: usize = usize::BITS as usize - 1 - N.leading_zeros() as usize;
const _: () = assert!(N.is_power_of_two(), "fft::N must be a power of two");

include!(concat!(env!("OUT_DIR"), "/fft_sin_table.rs"));

const _: () = assert!(
    SIN_TABLE.len() == N,
    "generated sin table length must match fft::N; keep build.rs COMPLEX_FFT_N in sync with config::fft::FFT_SIZE"
);

fn cos_q16(iw: usize) -> Q16 {
    Q16::from_bits(SIN_TABLE[(iw + N / 4) % N])
}

fn sin_q16(iw: usize) -> Q16 {
    Q16::from_bits(SIN_TABLE[iw % N])
}

fn isolate_highest_set_bit(x: usize) -> usize {
    (1 << (usize::BITS - 1)) >> x.leading_zeros()
}

/// Decimation-in-time reorder shared by the forward and inverse transform.
fn bit_reverse(f: &mut [Complex<Q16>; N]) {
    let mut mr = 0;
    for m in 1..N {
        let l = isolate_highest_set_bit(N - 1 - mr);
        mr = (mr & (l - 1)) + l;
        if mr > m {
            f.swap(m, mr);
        }
    }
}

/// In-place radix-2 FFT. `conjugate` selects the inverse-transform twiddle
/// sign. Every stage halves the running magnitude (the teacher's "fixed
/// scaling...distributed" comment), so both directions apply an overall
/// `1/N` factor: a true round trip must be rescaled by `N` by the caller.
fn radix2(f: &mut [Complex<Q16>; N], conjugate: bool, ctx: &mut FixedOverflow) {
    bit_reverse(f);

    for stage in 0..N_LOG2 {
        let inverse_stage = N_LOG2 - 1 - stage;
        let stride = 1usize << stage;
        let step = stride << 1;
        for m in 0..stride {
            let iw = m << inverse_stage;
            let wr = cos_q16(iw);
            let wi = if conjugate { sin_q16(iw) } else { -sin_q16(iw) };
            for i in (m..N).step_by(step) {
                let j = i + stride;
                let (fr_j, fi_j) = (f[j].re, f[j].im);
                let tr = fixed_point::sub(
                    ctx,
                    fixed_point::mul(ctx, wr, fr_j),
                    fixed_point::mul(ctx, wi, fi_j),
                );
                let ti = fixed_point::add(
                    ctx,
                    fixed_point::mul(ctx, wr, fi_j),
                    fixed_point::mul(ctx, wi, fr_j),
                );
                let qr = fixed_point::half(f[i].re);
                let qi = fixed_point::half(f[i].im);
                f[j].re = fixed_point::sub(ctx, qr, tr);
                f[j].im = fixed_point::sub(ctx, qi, ti);
                f[i].re = fixed_point::add(ctx, qr, tr);
                f[i].im = fixed_point::add(ctx, qi, ti);
            }
        }
    }
}

/// Forward transform of `2*FFT_SIZE` real samples, returning the
/// non-redundant bins `0..=FFT_SIZE` (DC through Nyquist) of a real input's
/// conjugate-symmetric spectrum.
pub fn real_fft(
    samples: &[Q16; N],
    ctx: &mut FixedOverflow,
) -> [Complex<Q16>; config::fft::FFT_SIZE + 1] {
    let mut buf = [Complex::new(Q16::ZERO, Q16::ZERO); N];
    for (b, &s) in buf.iter_mut().zip(samples.iter()) {
        b.re = s;
    }
    radix2(&mut buf, false, ctx);

    let mut out = [Complex::new(Q16::ZERO, Q16::ZERO); config::fft::FFT_SIZE + 1];
    out.copy_from_slice(&buf[..=config::fft::FFT_SIZE]);
    out
}

/// Inverse transform of a full complex spectrum back to the time domain.
/// Pairs with [`real_fft`]: `inverse_fft(&forward_spectrum(x))` reproduces
/// `x` scaled down by `N` (both directions apply `1/N`), so a literal
/// round trip must multiply the result by `N`.
pub fn inverse_fft(spectrum: &[Complex<Q16>; N], ctx: &mut FixedOverflow) -> [Complex<Q16>; N] {
    let mut buf = *spectrum;
    radix2(&mut buf, true, ctx);
    buf
}

/// Reconstruct a full `N`-point conjugate-symmetric spectrum from the
/// non-redundant real-valued bins (e.g. an accumulated PSD), suitable for
/// passing to [`inverse_fft`].
pub fn mirror_real_spectrum(bins: &[Q16; config::fft::FFT_SIZE + 1]) -> [Complex<Q16>; N] {
    let mut full = [Complex::new(Q16::ZERO, Q16::ZERO); N];
    for (k, &b) in bins.iter().enumerate() {
        full[k] = Complex::new(b, Q16::ZERO);
    }
    for k in 1..config::fft::FFT_SIZE {
        full[N - k] = Complex::new(bins[k], Q16::ZERO);
    }
    full
}
