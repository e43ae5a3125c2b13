//! Pin assignments for the `stm32f1xx-hal` Hardware Abstraction Layer.

#[allow(non_camel_case_types)]
pub mod pins {
    use stm32f1xx_hal::gpio::{Analog, Output, Pin, PushPull};

    /// Noise source input, amplified and biased to mid-rail.
    pub type A0_ADC1C0 = Pin<'A', 0, Analog>;

    /// Ready/fail indicator LED.
    pub type C13_DEBUG_LED = Pin<'C', 13, Output<PushPull>>;
}
