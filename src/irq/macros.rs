/// Declares a static global `RADIO` instance protected by a `critical_section` mutex.
///
/// The singleton is shared by the main loop and the radio interrupt handler.
///
/// # Arguments
/// - `$spi`: the concrete SPI device type (must implement `SpiDevice`)
/// - `$ce`: the concrete chip-enable pin type (must implement `OutputPin`)
/// - `$clk`: the millisecond clock type (must implement `Clock`)
/// - `$n`: optional per-pipe queue capacity, 64 bytes if omitted
///
/// # Example
/// ```rust,ignore
/// init_radio!(MySpiDevice, MyCePin, &'static MillisCounter);
/// ```
#[macro_export]
macro_rules! init_radio {
    ( $spi:ty, $ce:ty, $clk:ty ) => {
        pub static RADIO: $crate::irq::GlobalRadio<$spi, $ce, $clk> =
            $crate::irq::global_radio_init();
    };
    ( $spi:ty, $ce:ty, $clk:ty, $n:expr ) => {
        pub static RADIO: $crate::irq::GlobalRadio<$spi, $ce, $clk, $n> =
            $crate::irq::global_radio_init();
    };
}

/// Initializes the radio and stores it in the `RADIO` singleton declared by
/// [`init_radio!`].
///
/// Evaluates to the `Result` of [`global_radio_setup`](crate::irq::global_radio_setup).
///
/// # Example
/// ```rust,ignore
/// setup_radio!(spi, ce, &MILLIS, RadioConfig::default(), &mut delay)?;
/// ```
#[macro_export]
macro_rules! setup_radio {
    ( $spi:expr, $ce:expr, $clk:expr, $config:expr, $delay:expr ) => {
        $crate::irq::global_radio_setup(&RADIO, $spi, $ce, $clk, $config, $delay)
    };
}

/// Services the radio interrupt on the `RADIO` singleton declared by [`init_radio!`].
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn INT0() {
///     radio_irq!();
/// }
/// ```
#[macro_export]
macro_rules! radio_irq {
    () => {
        $crate::irq::global_radio_irq(&RADIO)
    };
}
