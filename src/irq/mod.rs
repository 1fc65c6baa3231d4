//! Sharing one driver between the main loop and the radio interrupt.
//!
//! The driver lives in a `critical_section::Mutex<RefCell<Option<..>>>`. Every access,
//! from the interrupt handler or the main loop, happens inside `critical_section::with`,
//! which also keeps the two contexts from interleaving SPI transactions.
//!
//! Sending is the only long running operation. [`global_radio_write`] polls
//! [`Nrf24::try_write_frame`] in a fresh critical section each time, so the radio
//! interrupt still gets serviced while a frame is in flight.

use crate::config::RadioConfig;
use crate::consts::PIPE_QUEUE_LEN;
use crate::driver::{Nrf24, RadioError};
use crate::error::Error;
use crate::frame::frame_chunks;
use crate::timer::Clock;
use core::cell::RefCell;
use critical_section::Mutex;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;
use nb::block;

mod macros;

/// A driver slot shareable with interrupt handlers.
pub type GlobalRadio<SPI, CE, CLK, const N: usize = PIPE_QUEUE_LEN> =
    Mutex<RefCell<Option<Nrf24<SPI, CE, CLK, N>>>>;

/// Creates an empty driver slot, usable in a `static` initializer.
///
/// # Example
/// ```rust,ignore
/// use nrf24_homespace::irq::{GlobalRadio, global_radio_init};
///
/// static RADIO: GlobalRadio<MySpi, MyPin, &'static MillisCounter> = global_radio_init();
/// ```
pub const fn global_radio_init<SPI, CE, CLK, const N: usize>() -> GlobalRadio<SPI, CE, CLK, N> {
    Mutex::new(RefCell::new(None))
}

/// Initializes a new driver and stores it in `global`, replacing any previous one.
///
/// Initialization runs before the driver is published, so an early interrupt finds the
/// slot empty and does nothing.
pub fn global_radio_setup<SPI, CE, CLK, D, const N: usize>(
    global: &GlobalRadio<SPI, CE, CLK, N>,
    spi: SPI,
    ce: CE,
    clock: CLK,
    config: RadioConfig,
    delay: &mut D,
) -> Result<(), RadioError<SPI, CE>>
where
    SPI: SpiDevice,
    CE: OutputPin,
    CLK: Clock,
    D: DelayNs,
{
    let mut radio = Nrf24::new(spi, ce, clock, config);
    radio.initialize(delay)?;
    critical_section::with(|cs| {
        let _ = global.borrow(cs).replace(Some(radio));
    });
    Ok(())
}

/// Services the radio interrupt. Call from the IRQ pin's falling edge handler.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn INT0() {
///     global_radio_irq(&RADIO);
/// }
/// ```
pub fn global_radio_irq<SPI, CE, CLK, const N: usize>(global: &GlobalRadio<SPI, CE, CLK, N>)
where
    SPI: SpiDevice,
    CE: OutputPin,
    CLK: Clock,
{
    critical_section::with(|cs| {
        if let Some(radio) = global.borrow(cs).borrow_mut().as_mut() {
            if radio.handle_irq().is_err() {
                error!("nrf24: bus error while servicing the interrupt");
            }
        }
    });
}

/// Runs `f` on the shared driver inside a critical section.
///
/// # Errors
/// [`Error::NotInitialized`] if the slot is empty.
pub fn with_global_radio<SPI, CE, CLK, R, const N: usize>(
    global: &GlobalRadio<SPI, CE, CLK, N>,
    f: impl FnOnce(&mut Nrf24<SPI, CE, CLK, N>) -> R,
) -> Result<R, RadioError<SPI, CE>>
where
    SPI: SpiDevice,
    CE: OutputPin,
    CLK: Clock,
{
    critical_section::with(|cs| {
        global
            .borrow(cs)
            .borrow_mut()
            .as_mut()
            .map(f)
            .ok_or(Error::NotInitialized)
    })
}

/// Sends `data` through the shared driver, split into frames like
/// [`Nrf24::write_payload`].
///
/// Interrupts are only masked while a frame is handed over, never while waiting for the
/// previous one to leave.
pub fn global_radio_write<SPI, CE, CLK, const N: usize>(
    global: &GlobalRadio<SPI, CE, CLK, N>,
    data: &[u8],
) -> Result<(), RadioError<SPI, CE>>
where
    SPI: SpiDevice,
    CE: OutputPin,
    CLK: Clock,
{
    for chunk in frame_chunks(data) {
        block!(critical_section::with(|cs| {
            match global.borrow(cs).borrow_mut().as_mut() {
                Some(radio) => radio.try_write_frame(chunk),
                None => Err(nb::Error::Other(Error::NotInitialized)),
            }
        }))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataPipe;
    use crate::driver::RadioMode;
    use crate::testing::{Chip, SimClock, SimPin, SimSpi, frame};
    use embedded_hal_mock::eh1::delay::NoopDelay;

    type SimGlobal = GlobalRadio<SimSpi, SimPin, SimClock>;

    fn setup(global: &SimGlobal) -> Chip {
        let chip = Chip::default();
        global_radio_setup(
            global,
            SimSpi(chip.clone()),
            SimPin(chip.clone()),
            SimClock::starting_at(0, 1),
            RadioConfig::default(),
            &mut NoopDelay,
        )
        .unwrap();
        chip
    }

    #[test]
    fn test_empty_slot_reports_not_initialized() {
        let global: SimGlobal = global_radio_init();
        global_radio_irq(&global);
        assert!(matches!(
            with_global_radio(&global, |radio| radio.mode()),
            Err(Error::NotInitialized)
        ));
        assert!(matches!(
            global_radio_write(&global, b"hi"),
            Err(Error::NotInitialized)
        ));
        assert!(global_radio_write(&global, &[]).is_ok());
    }

    #[test]
    fn test_irq_fills_shared_queues() {
        let global: SimGlobal = global_radio_init();
        let chip = setup(&global);

        chip.borrow_mut().inject(5, frame(b"abc"));
        global_radio_irq(&global);

        let mut buf = [0u8; 3];
        let read = with_global_radio(&global, |radio| radio.read_pipe(DataPipe::DP5, &mut buf));
        assert_eq!(read, Ok(3));
        assert_eq!(&buf, b"abc");
    }

    #[test]
    fn test_write_interleaves_with_irq() {
        let global: SimGlobal = global_radio_init();
        let chip = setup(&global);

        global_radio_write(&global, &[0x55; 45]).unwrap();
        assert_eq!(chip.borrow().sent.len(), 2);
        global_radio_irq(&global);
        assert_eq!(
            with_global_radio(&global, |radio| radio.mode()),
            Ok(RadioMode::Receiving)
        );
    }
}
