/// Clock configuration.
///
/// See clock tree in https://www.st.com/resource/en/datasheet/stm32f103c8.pdf
/// Rough layout:
///
///   SYSCLK -> AHB prescaler -> APB1 prescaler -> PCLK1
///              / 1,2..512   |   / 1,2,4,8,16
///                           |
///                           -> APB2 prescaler -> PCLK2
///                               / 1,2,4,8,16  |
///                                             |
///                                             -> ADC prescaler -> ADCCLK
///                                                 / 2,4,6,8
pub mod clk {
    use fugit::Rate;

    /// Use external oscillator (required to get max 72MHz sysclk)
    pub const HSE_FREQ: Rate<u32, 1, 1> = Rate::<u32, 1, 1>::MHz(8);

    /// PLLMUL @ x9 (max 72MHz)
    pub const SYSCLK: Rate<u32, 1, 1> = Rate::<u32, 1, 1>::MHz(72);
    pub const SYSCLK_HZ: u32 = SYSCLK.to_Hz();

    /// APB1 prescaler @ /8 (max 36MHz)
    pub const PCLK1: Rate<u32, 1, 1> = Rate::<u32, 1, 1>::MHz(9);
    /// APB2 prescaler @ /8 (max 72MHz)
    pub const PCLK2: Rate<u32, 1, 1> = Rate::<u32, 1, 1>::MHz(9);

    /// ADC prescaler @ /4 (max 14MHz, min 600kHz)
    pub const ADCCLK: Rate<u32, 1, 1> = Rate::<u32, 1, 1>::kHz(2250);
}

/// ADC configuration. The noise source is sampled single-ended,
/// single-channel, one blocking conversion at a time (`AdcSampleSource`'s
/// contract is just "fill this buffer"; there's no on-chip DMA ring buffer
/// to manage here, unlike the teacher's continuous dual-channel capture).
pub mod adc {
    use stm32f1xx_hal::adc::SampleTime;

    /// Fastest conversion time (ADCCLK / 1.5): the decimation filter, not
    /// this sample time, is what band-limits the noise source.
    pub const SAMPLE: SampleTime = SampleTime::T_1;

    /// ADC full-scale resolution in bits (stm32f103 ADC1 is always 12-bit).
    pub const RESOLUTION_BITS: u32 = 12;

    /// Midpoint of the unsigned ADC reading, subtracted off to center
    /// samples at zero before they reach the FIR decimator (`spec.md` §3's
    /// `FilteredSample` is signed; the ADC itself reads `0..=4095`).
    pub const MIDPOINT: i32 = 1 << (RESOLUTION_BITS - 1);
}

/// Debugging flags.
pub mod debug {
    /// Log every qualification run's verdict and entropy yield.
    pub const LOG_RUNS: bool = true;
}
