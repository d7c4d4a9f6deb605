use core::fmt::Debug;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Receiver;
use embassy_sync::mutex::Mutex;
use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::spi::SpiDevice;
use sx127x_async::conf::Config;
use sx127x_async::op::ReceivedPacket;
use sx127x_async::{SxError, SX127x as Device};

use crate::conf::GatewayConfig;
use crate::irq::{IrqEvent, ShutdownSignal};

/// A receive-only LoRa gateway around an SX1276.
///
/// The driver sits behind a mutex. Every operation takes the lock for its
/// whole duration, so the eight steps of a receive never interleave with
/// other register traffic.
pub struct LoraGateway<SPI, RST, DELAY> {
    radio: Mutex<CriticalSectionRawMutex, Device<SPI, RST, DELAY>>,
}

impl<SPI, RST, DELAY> LoraGateway<SPI, RST, DELAY> {
    /// Creates a new `LoraGateway`.
    ///
    /// # Arguments
    ///
    /// * `spi` - The SPI device of the radio.
    /// * `rst` - The NRESET output pin.
    /// * `delay` - Times the reset pulse, without holding the SPI bus.
    pub fn new(spi: SPI, rst: RST, delay: DELAY) -> Self {
        Self {
            radio: Mutex::new(Device::new(spi, rst, delay)),
        }
    }

    /// Releases the SPI device, reset pin and delay provider.
    pub fn release(self) -> (SPI, RST, DELAY) {
        self.radio.into_inner().release()
    }
}

impl<SPI, RST, DELAY, SPIERR, PINERR> LoraGateway<SPI, RST, DELAY>
where
    SPIERR: Debug,
    PINERR: Debug,
    SPI: SpiDevice<Error = SPIERR>,
    RST: OutputPin<Error = PINERR>,
    DELAY: DelayNs,
{
    /// Resets, identifies and configures the radio, leaving it in
    /// continuous reception with DIO0 signalling RxDone.
    pub async fn init(&self, config: &GatewayConfig) -> Result<(), SxError<SPIERR, PINERR>> {
        log::info!(
            "lora::init {} MHz, preset {}",
            config.frequency_mhz,
            config.preset
        );
        let mut radio = self.radio.lock().await;
        radio.init(&Config::from(config)).await.map_err(|err| {
            log::warn!("Error initializing radio: {err:?}");
            err
        })
    }

    /// Runs the receive pipeline for one interrupt.
    pub async fn handle_interrupt(
        &self,
        _event: IrqEvent,
    ) -> Result<Option<ReceivedPacket>, SxError<SPIERR, PINERR>> {
        let mut radio = self.radio.lock().await;
        radio.handle_interrupt().await
    }

    /// Consumes interrupt events until `shutdown` is raised, handing every
    /// received packet to `on_packet`.
    ///
    /// A failed reception is logged and the loop carries on with the next
    /// event. Shutdown is checked before the queue on every turn, so a steady
    /// stream of interrupts cannot hold it off. On shutdown the radio is put
    /// through reset and events still queued are left in the channel.
    pub async fn run<const N: usize, F>(
        &self,
        events: Receiver<'_, CriticalSectionRawMutex, IrqEvent, N>,
        shutdown: &ShutdownSignal,
        mut on_packet: F,
    ) -> Result<(), SxError<SPIERR, PINERR>>
    where
        F: FnMut(ReceivedPacket),
    {
        log::trace!("lora::run waiting for interrupts");
        loop {
            match select(shutdown.wait(), events.receive()).await {
                Either::First(()) => {
                    log::info!("lora::run shutting down");
                    return self.shutdown().await;
                }
                Either::Second(event) => match self.handle_interrupt(event).await {
                    Ok(Some(packet)) => {
                        log::info!("lora::rx {packet}");
                        on_packet(packet);
                    }
                    Ok(None) => {}
                    Err(err) => log::warn!("Error receiving lora message: {err}"),
                },
            }
        }
    }

    /// Drives the radio into reset, abandoning any reception in flight.
    pub async fn shutdown(&self) -> Result<(), SxError<SPIERR, PINERR>> {
        let mut radio = self.radio.lock().await;
        radio.reset().await
    }
}
