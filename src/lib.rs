//! Statistical qualification core for a hardware RNG.
//!
//! Converts a stream of oversampled ADC readings into a vetted pool of
//! random 16-bit words: FIR decimation, histogram + FFT based statistical
//! testing, and a pass/fail gate that never lets an untested sample out.
//! See `SPEC_FULL.md` for the full module map.
#![cfg_attr(not(test), no_std)]
#![allow(clippy::assertions_on_constants, clippy::needless_range_loop)]
#![warn(
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

pub mod collaborators;
pub mod config;
pub mod engine;
pub mod error;
pub mod fft;
pub mod filter;
pub mod fixed_point;
pub mod histogram;
pub mod pool;
pub mod psd;
pub mod verdict;

#[cfg(feature = "diagnostic")]
pub mod diagnostic;

pub use collaborators::{AdcSampleSource, IdlePowerControl, IndicatorSink};
pub use engine::{FailurePolicy, QualificationEngine};
pub use error::QualificationFailure;
pub use fixed_point::Q16;
pub use verdict::TestFailures;
