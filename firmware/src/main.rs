#![no_main]
#![no_std]
#![allow(clippy::let_and_return, clippy::let_unit_value)]
#![warn(
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::ptr_as_ptr
)]

use defmt_rtt as _; // global logger
use stm32f1xx_hal as _; // memory layout

use panic_probe as _; // panicking-behavior

// same panicking *behavior* as `panic-probe` but doesn't print a panic message
// this prevents the panic message being printed *twice* when `defmt::panic` is invoked
#[defmt::panic_handler]
fn panic() -> ! {
    cortex_m::asm::udf()
}

mod adc_source;
mod config;
mod hal;
mod indicator;
mod panic;

#[rtic::app(device = stm32f1xx_hal::pac, peripherals = true, dispatchers = [USART1])]
mod app {
    use crate::adc_source::Adc1NoiseSource;
    use crate::config;
    use crate::hal::pins;
    use crate::indicator::DebugLedIndicator;
    use dwt_systick_monotonic::DwtSystick;
    use hwrng_qual_core::collaborators::NoIdlePowerControl;
    use hwrng_qual_core::{DefaultEngine, FailurePolicy};
    use stm32f1xx_hal::adc::Adc;
    use stm32f1xx_hal::gpio::PinState;
    use stm32f1xx_hal::prelude::*;

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        engine: DefaultEngine,
        adc: Adc1NoiseSource,
        indicator: DebugLedIndicator,
    }

    #[monotonic(binds = SysTick, priority = 1, default = true)]
    type DwtMono = DwtSystick<{ config::clk::SYSCLK_HZ }>;

    #[init]
    fn init(mut cx: init::Context) -> (Shared, Local, init::Monotonics) {
        defmt::info!("Starting init...");

        let mut flash = cx.device.FLASH.constrain();
        let mut gpioa = cx.device.GPIOA.split();
        let mut gpioc = cx.device.GPIOC.split();
        let rcc = cx.device.RCC.constrain();

        defmt::info!("Configuring clocks...");

        let clocks = rcc
            .cfgr
            .use_hse(config::clk::HSE_FREQ)
            .sysclk(config::clk::SYSCLK)
            .pclk1(config::clk::PCLK1)
            .pclk2(config::clk::PCLK2)
            .adcclk(config::clk::ADCCLK)
            .freeze(&mut flash.acr);

        assert!(config::clk::SYSCLK == clocks.sysclk());
        assert!(config::clk::PCLK1 == clocks.pclk1());
        assert!(config::clk::PCLK2 == clocks.pclk2());
        assert!(config::clk::ADCCLK == clocks.adcclk());

        defmt::info!("Configuring noise source ADC...");

        let adc1 = Adc::adc1(cx.device.ADC1, clocks);
        let noise_pin: pins::A0_ADC1C0 = gpioa.pa0.into_analog(&mut gpioa.crl);
        let adc = Adc1NoiseSource::new(adc1, noise_pin);

        defmt::info!("Configuring ready/fail indicator...");

        let led: pins::C13_DEBUG_LED = gpioc
            .pc13
            .into_push_pull_output_with_state(&mut gpioc.crh, PinState::High);
        let indicator = DebugLedIndicator::new(led);

        defmt::info!("Configuring monotonic timer...");

        let mono = DwtMono::new(
            &mut cx.core.DCB,
            cx.core.DWT,
            cx.core.SYST,
            clocks.sysclk().to_Hz(),
        );

        defmt::info!("Configuring qualification engine...");
        hwrng_qual_core::config::dump_to_log();

        let engine = DefaultEngine::new(
            hwrng_qual_core::filter::FirDecimator::new(hwrng_qual_core::config::filter::kernel()),
            FailurePolicy::Strict,
        );

        defmt::info!("Finished init.");

        qualify::spawn().ok();

        (Shared {}, Local { engine, adc, indicator }, init::Monotonics(mono))
    }

    /// Runs one qualification cycle and, on success, logs the yielded
    /// random block; reschedules itself either way so the RNG is kept
    /// continuously topped up (`spec.md` §6: `random32Bytes` is the sole
    /// production entry point, called back-to-back by whatever consumer
    /// wants fresh entropy; this firmware has no consumer of its own, so
    /// it just calls it in a loop and logs the result).
    #[task(local = [engine, adc, indicator], priority = 1)]
    fn qualify(cx: qualify::Context) {
        let mut power = NoIdlePowerControl;
        let mut out = [0u8; 32];

        match cx.local.engine.random_32_bytes(cx.local.adc, &mut power, cx.local.indicator, &mut out) {
            Ok(entropy_bits) => {
                if config::debug::LOG_RUNS {
                    defmt::info!("qualified {} bytes ({} bits entropy): {:02x}", out.len(), entropy_bits, out);
                }
            }
            Err(e) => {
                if config::debug::LOG_RUNS {
                    // `QualificationFailure`'s `Error` variant is generic over
                    // the ADC driver's error type, which isn't guaranteed to
                    // implement `defmt::Format` (e.g. `Infallible` here);
                    // `Display2Format` logs it via `core::fmt::Display` instead.
                    defmt::warn!("qualification failed: {}", defmt::Display2Format(&e));
                }
            }
        }

        qualify::spawn().ok();
    }

    #[idle]
    fn idle(_: idle::Context) -> ! {
        loop {
            continue;
        }
    }
}
