//! A shared SPI bus guarded by an async `Mutex`.
//!
//! [`SharedSpiDevice`] lets several drivers use one `SpiBus`. Each device owns
//! its chip select line; the bus lock is held from CS assertion until CS is
//! released, so frames of different devices never interleave.

use core::fmt::Debug;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::{Error, ErrorKind};
use embedded_hal::spi::{ErrorType, Operation};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::spi::{SpiBus, SpiDevice};

/// A `Mutex`-based shared bus [`SpiDevice`] implementation.
pub struct SharedSpiDevice<'a, M: RawMutex, BUS, CS, D> {
    bus: &'a Mutex<M, BUS>,
    cs: CS,
    delay: D,
}

impl<'a, M: RawMutex, BUS, CS, D> SharedSpiDevice<'a, M, BUS, CS, D>
where
    CS: OutputPin,
{
    /// Creates a new `SharedSpiDevice`, deasserting `cs`.
    ///
    /// # Arguments
    ///
    /// * `bus` - The SPI bus shared with the other devices.
    /// * `cs` - The active-low chip select pin of this device.
    /// * `delay` - Serves [`Operation::DelayNs`] inside transactions.
    #[inline]
    pub fn new(bus: &'a Mutex<M, BUS>, mut cs: CS, delay: D) -> Result<Self, CS::Error> {
        cs.set_high()?;
        Ok(Self { bus, cs, delay })
    }

    /// Releases the chip select pin and delay provider.
    pub fn release(self) -> (CS, D) {
        (self.cs, self.delay)
    }
}

impl<M, BUS, CS, D> ErrorType for SharedSpiDevice<'_, M, BUS, CS, D>
where
    M: RawMutex,
    BUS: ErrorType,
    CS: OutputPin,
{
    type Error = DeviceError<BUS::Error, CS::Error>;
}

impl<M, BUS, CS, D> SpiDevice<u8> for SharedSpiDevice<'_, M, BUS, CS, D>
where
    M: RawMutex,
    BUS: SpiBus<u8>,
    CS: OutputPin,
    D: DelayNs,
{
    /// Locks the bus, asserts CS, runs `operations` and deasserts CS.
    #[inline]
    async fn transaction(
        &mut self,
        operations: &mut [Operation<'_, u8>],
    ) -> Result<(), Self::Error> {
        let bus = &mut *self.bus.lock().await;

        let result = transaction(operations, bus, &mut self.delay, &mut self.cs).await;

        if let Err(err) = &result {
            log::warn!("Error communicating with the device: {err:?}");
        }

        result
    }
}

/// Runs `operations` on `bus` with `cs` asserted.
///
/// Stops at the first failed operation. The bus is flushed and CS deasserted
/// on every path; the operation error wins over a flush or CS error.
#[inline]
pub async fn transaction<Word, BUS, CS, D>(
    operations: &mut [Operation<'_, Word>],
    bus: &mut BUS,
    delay: &mut D,
    cs: &mut CS,
) -> Result<(), DeviceError<BUS::Error, CS::Error>>
where
    BUS: SpiBus<Word> + ErrorType,
    CS: OutputPin,
    D: DelayNs,
    Word: Copy + 'static,
{
    cs.set_low().map_err(DeviceError::Cs)?;

    let mut op_res = Ok(());
    for op in operations {
        if let Err(err) = process_op(bus, delay, op).await {
            op_res = Err(err);
            break;
        }
    }

    let flush_res = bus.flush().await;
    let cs_res = cs.set_high();

    op_res.map_err(DeviceError::Spi)?;
    flush_res.map_err(DeviceError::Spi)?;
    cs_res.map_err(DeviceError::Cs)?;

    Ok(())
}

/// An error type for `SharedSpiDevice` operations.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum DeviceError<BUS, CS> {
    /// An inner SPI bus operation failed.
    Spi(BUS),
    /// Asserting or deasserting the CS pin failed.
    Cs(CS),
}

impl<BUS, CS> Error for DeviceError<BUS, CS>
where
    BUS: Error + Debug,
    CS: Debug,
{
    #[inline]
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Spi(e) => e.kind(),
            Self::Cs(_) => ErrorKind::ChipSelectFault,
        }
    }
}

async fn process_op<BUS, D, Word>(
    bus: &mut BUS,
    delay: &mut D,
    op: &mut Operation<'_, Word>,
) -> Result<(), BUS::Error>
where
    BUS: SpiBus<Word> + ErrorType,
    D: DelayNs,
    Word: Copy + 'static,
{
    match op {
        Operation::Read(buf) => bus.read(buf).await,
        Operation::Write(buf) => bus.write(buf).await,
        Operation::Transfer(read, write) => bus.transfer(read, write).await,
        Operation::TransferInPlace(buf) => bus.transfer_in_place(buf).await,
        Operation::DelayNs(ns) => {
            bus.flush().await?;
            delay.delay_ns(*ns).await;
            Ok(())
        }
    }
}
