//! In-memory SX1276 for host-side tests.
//!
//! [`SimChip`] models the register file, the FIFO with its auto-incrementing
//! address pointer, write-one-to-clear IRQ flags and the reset line. The
//! handles borrowing it implement the traits the driver and the shared bus
//! need:
//!
//! - [`SimSpi`]: `SpiDevice` (chip select implied) and `SpiBus` (requires
//!   [`SimChipSelect`] to be low),
//! - [`SimResetPin`], [`SimChipSelect`]: `OutputPin`,
//! - [`SimDelay`]: `DelayNs`, accumulated instead of slept. Delays while
//!   chip select is asserted are also counted as bus hold time.
//!
//! Only two byte register frames are accepted.

use core::cell::RefCell;
use core::convert::Infallible;

use embedded_hal::digital;
use embedded_hal::spi::{self, ErrorKind, Operation};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::spi::{SpiBus, SpiDevice};

use crate::op::irq::IrqFlag;
use crate::op::packet::FIFO_SIZE;
use crate::reg::{Register, SX1276_VERSION, WRITE_MASK};

/// Accesses kept in the [`SimChip`] log.
pub const LOG_CAPACITY: usize = 2048;

/// Bus failures produced by the simulator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SimError {
    /// Access to a register marked with [`SimChip::fail_on`].
    Injected(u8),
    /// A frame that is not exactly two bytes.
    FrameLength(usize),
    /// `SpiBus` traffic while chip select is high.
    NotSelected,
    /// An SPI operation the chip never sees from this driver.
    Unsupported,
}

impl spi::Error for SimError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotSelected => ErrorKind::ChipSelectFault,
            _ => ErrorKind::Other,
        }
    }
}

/// One register frame as seen by the chip.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Access {
    /// Read of a register address.
    Read(u8),
    /// Write of a value to a register address.
    Write(u8, u8),
}

/// The simulated chip state.
pub struct SimChip {
    regs: [u8; 0x80],
    fifo: [u8; FIFO_SIZE],
    version: u8,
    next_rx_addr: u8,
    in_reset: bool,
    resets: u32,
    selected: bool,
    delayed_ns: u64,
    cs_held_ns: u64,
    fail_on: Option<u8>,
    log: heapless::Vec<Access, LOG_CAPACITY>,
}

impl Default for SimChip {
    fn default() -> Self {
        Self::new()
    }
}

impl SimChip {
    /// A chip in its power-on state, identifying as an SX1276.
    pub fn new() -> Self {
        let mut chip = Self {
            regs: [0; 0x80],
            fifo: [0; FIFO_SIZE],
            version: SX1276_VERSION,
            next_rx_addr: 0,
            in_reset: false,
            resets: 0,
            selected: false,
            delayed_ns: 0,
            cs_held_ns: 0,
            fail_on: None,
            log: heapless::Vec::new(),
        };
        chip.power_on();
        chip
    }

    /// A chip reporting a different silicon revision.
    pub fn with_version(version: u8) -> Self {
        let mut chip = Self::new();
        chip.version = version;
        chip.power_on();
        chip
    }

    fn power_on(&mut self) {
        self.regs = [0; 0x80];
        // FSK standby, low frequency mode.
        self.regs[Register::OpMode as usize] = 0x09;
        // 434 MHz.
        self.regs[Register::FrfMsb as usize] = 0x6C;
        self.regs[Register::FrfMid as usize] = 0x80;
        self.regs[Register::FifoTxBaseAddr as usize] = 0x80;
        self.regs[Register::ModemConfig1 as usize] = 0x72;
        self.regs[Register::ModemConfig2 as usize] = 0x70;
        self.regs[Register::Version as usize] = self.version;
        self.next_rx_addr = 0;
    }

    /// Makes every access to `register` fail, or none for `None`.
    pub fn fail_on(&mut self, register: Option<Register>) {
        self.fail_on = register.map(|reg| reg as u8);
    }

    /// Current content of a register.
    pub fn register(&self, register: Register) -> u8 {
        self.regs[register as usize]
    }

    /// Overwrites a register behind the driver's back.
    pub fn set_register(&mut self, register: Register, value: u8) {
        self.regs[register as usize] = value;
    }

    /// Raises IRQ flags as the modem would.
    pub fn raise(&mut self, flags: &[IrqFlag]) {
        for flag in flags {
            self.regs[Register::IrqFlags as usize] |= *flag as u8;
        }
    }

    /// Lands a packet in the FIFO and raises `RxDone | ValidHeader`.
    ///
    /// Consecutive packets are stored one after the other starting at
    /// `FifoRxBaseAddr`. `FifoAddrPtr` is left pointing past the packet, so
    /// the driver has to rewind it.
    pub fn receive(&mut self, data: &[u8], snr: u8, rssi: u8) {
        let start = self.regs[Register::FifoRxBaseAddr as usize].wrapping_add(self.next_rx_addr);
        for (offset, byte) in data.iter().enumerate() {
            self.fifo[start.wrapping_add(offset as u8) as usize] = *byte;
        }
        let len = data.len() as u8;
        self.next_rx_addr = self.next_rx_addr.wrapping_add(len);

        self.regs[Register::FifoRxCurrentAddr as usize] = start;
        self.regs[Register::RxNbBytes as usize] = len;
        self.regs[Register::FifoAddrPtr as usize] = start.wrapping_add(len);
        self.regs[Register::PktSnrValue as usize] = snr;
        self.regs[Register::PktRssiValue as usize] = rssi;
        self.bump(Register::RxHeaderCntValueMsb, Register::RxHeaderCntValueLsb);
        self.bump(Register::RxPacketCntValueMsb, Register::RxPacketCntValueLsb);
        self.raise(&[IrqFlag::RxDone, IrqFlag::ValidHeader]);
    }

    fn bump(&mut self, msb: Register, lsb: Register) {
        let count = u16::from_be_bytes([self.regs[msb as usize], self.regs[lsb as usize]]);
        let [hi, lo] = count.wrapping_add(1).to_be_bytes();
        self.regs[msb as usize] = hi;
        self.regs[lsb as usize] = lo;
    }

    /// Every register frame since the last [`SimChip::clear_log`].
    pub fn log(&self) -> &[Access] {
        &self.log
    }

    /// Register writes only, in order.
    pub fn writes(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.log.iter().filter_map(|access| match access {
            Access::Write(addr, value) => Some((*addr, *value)),
            Access::Read(_) => None,
        })
    }

    /// Forgets the recorded accesses.
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Completed NRESET pulses.
    pub fn resets(&self) -> u32 {
        self.resets
    }

    /// Whether NRESET is currently held low.
    pub fn in_reset(&self) -> bool {
        self.in_reset
    }

    /// Total delay requested, in nanoseconds.
    pub fn delayed_ns(&self) -> u64 {
        self.delayed_ns
    }

    /// Part of [`SimChip::delayed_ns`] spent with chip select asserted, that
    /// is with the bus held.
    pub fn cs_held_ns(&self) -> u64 {
        self.cs_held_ns
    }

    fn delay(&mut self, ns: u32, selected: bool) {
        self.delayed_ns += u64::from(ns);
        if selected {
            self.cs_held_ns += u64::from(ns);
        }
    }

    fn record(&mut self, access: Access) {
        let logged = self.log.push(access).is_ok();
        debug_assert!(logged, "access log full, call clear_log");
    }

    fn exchange(&mut self, frame: &mut [u8]) -> Result<(), SimError> {
        if frame.len() != 2 {
            return Err(SimError::FrameLength(frame.len()));
        }
        let addr = frame[0] & !WRITE_MASK;
        if self.fail_on == Some(addr) {
            return Err(SimError::Injected(addr));
        }
        if self.in_reset {
            frame.fill(0);
            return Ok(());
        }

        let reply = if frame[0] & WRITE_MASK != 0 {
            self.record(Access::Write(addr, frame[1]));
            self.write(addr, frame[1])
        } else {
            self.record(Access::Read(addr));
            self.read(addr)
        };
        frame[0] = 0;
        frame[1] = reply;
        Ok(())
    }

    fn read(&mut self, addr: u8) -> u8 {
        if addr == Register::Fifo as u8 {
            let ptr = self.advance_fifo_ptr();
            return self.fifo[ptr as usize];
        }
        self.regs[addr as usize]
    }

    fn write(&mut self, addr: u8, value: u8) -> u8 {
        let previous = self.regs[addr as usize];
        match addr {
            a if a == Register::Fifo as u8 => {
                let ptr = self.advance_fifo_ptr();
                self.fifo[ptr as usize] = value;
            }
            a if a == Register::IrqFlags as u8 => {
                self.regs[addr as usize] &= !value;
            }
            a if a == Register::Version as u8 => {}
            _ => self.regs[addr as usize] = value,
        }
        previous
    }

    fn advance_fifo_ptr(&mut self) -> u8 {
        let ptr = self.regs[Register::FifoAddrPtr as usize];
        self.regs[Register::FifoAddrPtr as usize] = ptr.wrapping_add(1);
        ptr
    }
}

/// SPI handle onto a [`SimChip`].
pub struct SimSpi<'a> {
    chip: &'a RefCell<SimChip>,
}

impl<'a> SimSpi<'a> {
    /// Creates a new `SimSpi`.
    pub fn new(chip: &'a RefCell<SimChip>) -> Self {
        Self { chip }
    }
}

impl spi::ErrorType for SimSpi<'_> {
    type Error = SimError;
}

impl SpiDevice<u8> for SimSpi<'_> {
    async fn transaction(
        &mut self,
        operations: &mut [Operation<'_, u8>],
    ) -> Result<(), Self::Error> {
        let mut chip = self.chip.borrow_mut();
        for op in operations {
            match op {
                Operation::TransferInPlace(frame) => chip.exchange(frame)?,
                Operation::DelayNs(ns) => chip.delay(*ns, true),
                _ => return Err(SimError::Unsupported),
            }
        }
        Ok(())
    }
}

impl SpiBus<u8> for SimSpi<'_> {
    async fn read(&mut self, _words: &mut [u8]) -> Result<(), Self::Error> {
        Err(SimError::Unsupported)
    }

    async fn write(&mut self, _words: &[u8]) -> Result<(), Self::Error> {
        Err(SimError::Unsupported)
    }

    async fn transfer(&mut self, _read: &mut [u8], _write: &[u8]) -> Result<(), Self::Error> {
        Err(SimError::Unsupported)
    }

    async fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let mut chip = self.chip.borrow_mut();
        if !chip.selected {
            return Err(SimError::NotSelected);
        }
        chip.exchange(words)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// NRESET line of a [`SimChip`]. Low holds the chip in reset and restores
/// its power-on registers.
pub struct SimResetPin<'a> {
    chip: &'a RefCell<SimChip>,
}

impl<'a> SimResetPin<'a> {
    /// Creates a new `SimResetPin`.
    pub fn new(chip: &'a RefCell<SimChip>) -> Self {
        Self { chip }
    }
}

impl digital::ErrorType for SimResetPin<'_> {
    type Error = Infallible;
}

impl digital::OutputPin for SimResetPin<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mut chip = self.chip.borrow_mut();
        chip.in_reset = true;
        chip.power_on();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut chip = self.chip.borrow_mut();
        if chip.in_reset {
            chip.in_reset = false;
            chip.resets += 1;
        }
        Ok(())
    }
}

/// Chip select line of a [`SimChip`], active low.
pub struct SimChipSelect<'a> {
    chip: &'a RefCell<SimChip>,
}

impl<'a> SimChipSelect<'a> {
    /// Creates a new `SimChipSelect`.
    pub fn new(chip: &'a RefCell<SimChip>) -> Self {
        Self { chip }
    }
}

impl digital::ErrorType for SimChipSelect<'_> {
    type Error = Infallible;
}

impl digital::OutputPin for SimChipSelect<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.chip.borrow_mut().selected = true;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.chip.borrow_mut().selected = false;
        Ok(())
    }
}

/// Delay provider that only records the requested time.
pub struct SimDelay<'a> {
    chip: &'a RefCell<SimChip>,
}

impl<'a> SimDelay<'a> {
    /// Creates a new `SimDelay`.
    pub fn new(chip: &'a RefCell<SimChip>) -> Self {
        Self { chip }
    }
}

impl DelayNs for SimDelay<'_> {
    async fn delay_ns(&mut self, ns: u32) {
        let mut chip = self.chip.borrow_mut();
        let selected = chip.selected;
        chip.delay(ns, selected);
    }
}
