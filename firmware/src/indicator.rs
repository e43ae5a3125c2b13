//! [`IndicatorSink`] driving the board's single debug LED, plus a `defmt`
//! trace of the full verdict (`spec.md` §4.8's "blink failure" concept,
//! simplified to a steady on/off state since this board has no free timer
//! left for a blink pattern once the original's PWM indicator banks are
//! gone). The LED is active-low, matching the teacher's own
//! `PinState::High` == "off" convention for `C13_DEBUG_LED`.

use hwrng_qual_core::verdict::TestFailures;
use hwrng_qual_core::IndicatorSink;
use stm32f1xx_hal::prelude::*;

use crate::hal::pins::C13_DEBUG_LED;

pub struct DebugLedIndicator {
    led: C13_DEBUG_LED,
}

impl DebugLedIndicator {
    pub fn new(led: C13_DEBUG_LED) -> Self {
        Self { led }
    }
}

impl IndicatorSink for DebugLedIndicator {
    fn report(&mut self, verdict: TestFailures) {
        defmt::info!("qualification verdict: {}", verdict);
        if verdict.is_pass() {
            self.led.set_low();
        } else {
            self.led.set_high();
        }
    }
}
