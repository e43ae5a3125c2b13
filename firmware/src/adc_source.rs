//! [`AdcSampleSource`] over a blocking single-channel ADC1 conversion,
//! grounded in the teacher's own blocking-read idiom (`control::Sample::new`
//! wrapping `adc2_controls.read(pin).unwrap_infallible()` in the original
//! `main.rs`): each decimator fill is `ADC_SAMPLE_BUFFER_SIZE` back-to-back
//! conversions rather than a DMA ring buffer, since the engine's contract is
//! already "block until this buffer is full" and there is no second
//! consumer racing the ADC for samples the way the teacher's control inputs
//! raced its noise channel.

use core::convert::Infallible;
use hwrng_qual_core::AdcSampleSource;
use stm32f1xx_hal::adc::Adc;
use stm32f1xx_hal::device::ADC1;
use stm32f1xx_hal::prelude::*;

use crate::config;
use crate::hal::pins::A0_ADC1C0;
use crate::panic::OptionalExt;

pub struct Adc1NoiseSource {
    adc: Adc<ADC1>,
    pin: A0_ADC1C0,
}

impl Adc1NoiseSource {
    pub fn new(mut adc: Adc<ADC1>, pin: A0_ADC1C0) -> Self {
        adc.set_sample_time(config::adc::SAMPLE);
        Self { adc, pin }
    }
}

impl<const N: usize> AdcSampleSource<N> for Adc1NoiseSource {
    type Error = Infallible;

    fn fill(&mut self, buffer: &mut [i16; N]) -> Result<(), Self::Error> {
        for slot in buffer.iter_mut() {
            let raw: u16 = self.adc.read(&mut self.pin).unwrap_infallible();
            // center the unsigned ADC reading at zero (`spec.md` §3's
            // `FilteredSample` is signed); saturate rather than panic on
            // the one-bit-past-full-scale edge case a noisy bias can cause.
            let centered = i32::from(raw) - config::adc::MIDPOINT;
            *slot = centered.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
        }
        Ok(())
    }
}
