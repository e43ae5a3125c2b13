//! Q16.16 fixed-point arithmetic with an explicit sticky-overflow context.
//!
//! The teacher codebase leans on the `fixed` crate for its Q-format types
//! and layers `ScaleBy`/`Truncate`-style helper traits on top (see its
//! `math.rs`); this module does the same, but every operation that can
//! saturate takes a `&mut FixedOverflow` instead of panicking or silently
//! wrapping, per the sticky-flag idiom `spec.md` §9 asks to preserve: "the
//! flag-clear/check pattern around each semantic group is the behavioral
//! contract to preserve."

use fixed::types::I16F16;

/// A Q16.16 fixed-point number.
pub type Q16 = I16F16;

/// Sticky overflow context, passed explicitly into arithmetic routines
/// instead of being a thread-global (`spec.md` §9, Design Note option (b)).
///
/// Clear it with [`FixedOverflow::clear`] before a semantic group of
/// computations (a set of central moments, an entropy estimate, an
/// autocorrelation), then inspect [`FixedOverflow::occurred`] immediately
/// after — sub-routines called in between may also set it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FixedOverflow(bool);

impl FixedOverflow {
    pub const fn new() -> Self {
        Self(false)
    }

    pub fn clear(&mut self) {
        self.0 = false;
    }

    pub fn occurred(&self) -> bool {
        self.0
    }

    fn set(&mut self) {
        self.0 = true;
    }
}

/// Checked Q16.16 multiply; sets `ctx` and saturates on overflow.
pub fn mul(ctx: &mut FixedOverflow, a: Q16, b: Q16) -> Q16 {
    match a.checked_mul(b) {
        Some(v) => v,
        None => {
            ctx.set();
            a.saturating_mul(b)
        }
    }
}

/// Checked Q16.16 add; sets `ctx` and saturates on overflow.
pub fn add(ctx: &mut FixedOverflow, a: Q16, b: Q16) -> Q16 {
    match a.checked_add(b) {
        Some(v) => v,
        None => {
            ctx.set();
            a.saturating_add(b)
        }
    }
}

/// Checked Q16.16 subtract; sets `ctx` and saturates on overflow.
pub fn sub(ctx: &mut FixedOverflow, a: Q16, b: Q16) -> Q16 {
    match a.checked_sub(b) {
        Some(v) => v,
        None => {
            ctx.set();
            a.saturating_sub(b)
        }
    }
}

/// Halve a Q16.16 value by shifting its raw bits, used to distribute FFT
/// normalization across butterfly stages (never overflows: halving can
/// only shrink magnitude).
pub fn half(x: Q16) -> Q16 {
    Q16::from_bits(x.to_bits() >> 1)
}

/// Base-2 logarithm of a positive Q16.16 value, in Q16.16.
///
/// `fixed` has no transcendental functions and nothing in this crate's
/// dependency stack provides `log2` for `I16F16`, so this is a direct
/// fixed-point implementation: normalize `x` into `[1, 2)` tracking the
/// integer exponent, then extract sixteen fractional bits by repeated
/// squaring (the standard fixed-point log2 algorithm).
///
/// `x` must be strictly positive; probabilities of zero-count bins must be
/// filtered out by the caller before this is reached.
pub fn log2(ctx: &mut FixedOverflow, x: Q16) -> Q16 {
    debug_assert!(x > Q16::ZERO, "log2 domain error");

    let mut bits = x.to_bits() as u32;
    if bits == 0 {
        ctx.set();
        return Q16::MIN;
    }

    // Normalize `bits` (interpreted as Q16.16) into [1.0, 2.0), i.e.
    // [1<<16, 1<<17), tracking the power-of-two exponent removed.
    let mut exponent: i32 = -16;
    while bits < (1 << 16) {
        bits <<= 1;
        exponent -= 1;
    }
    while bits >= (1 << 17) {
        bits >>= 1;
        exponent += 1;
    }

    let mut frac_bits: i32 = 0;
    let mut weight: i32 = 1 << 15;
    let mut y = u64::from(bits);
    for _ in 0..16 {
        y = (y * y) >> 16;
        if y >= (2 << 16) {
            y >>= 1;
            frac_bits += weight;
        }
        weight >>= 1;
    }

    let total_bits = exponent
        .checked_mul(1 << 16)
        .and_then(|v| v.checked_add(frac_bits));
    match total_bits {
        Some(v) => Q16::from_bits(v),
        None => {
            ctx.set();
            if exponent < 0 {
                Q16::MIN
            } else {
                Q16::MAX
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log2_of_one_is_zero() {
        let mut ctx = FixedOverflow::new();
        let result = log2(&mut ctx, Q16::from_num(1));
        assert!(!ctx.occurred());
        assert!(result.abs() < Q16::from_num(1) / 1000);
    }

    #[test]
    fn log2_of_two_is_one() {
        let mut ctx = FixedOverflow::new();
        let result = log2(&mut ctx, Q16::from_num(2));
        assert!((result - Q16::from_num(1)).abs() < Q16::from_num(1) / 100);
    }

    #[test]
    fn log2_of_eighth_is_negative_three() {
        let mut ctx = FixedOverflow::new();
        let result = log2(&mut ctx, Q16::from_num(1) / 8);
        assert!((result - Q16::from_num(-3)).abs() < Q16::from_num(1) / 50);
    }

    #[test]
    fn log2_of_sixty_four_is_six() {
        let mut ctx = FixedOverflow::new();
        let result = log2(&mut ctx, Q16::from_num(64));
        assert!((result - Q16::from_num(6)).abs() < Q16::from_num(1) / 50);
    }

    #[test]
    fn mul_saturates_and_sets_sticky_flag() {
        let mut ctx = FixedOverflow::new();
        let huge = Q16::from_num(20000);
        let _ = mul(&mut ctx, huge, huge);
        assert!(ctx.occurred());
    }

    #[test]
    fn clear_resets_sticky_flag() {
        let mut ctx = FixedOverflow::new();
        let huge = Q16::from_num(20000);
        let _ = mul(&mut ctx, huge, huge);
        assert!(ctx.occurred());
        ctx.clear();
        assert!(!ctx.occurred());
    }
}
