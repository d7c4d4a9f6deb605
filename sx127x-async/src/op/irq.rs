//! Interrupt (IRQ) status decoding and DIO0 mapping.

use core::fmt;

/// Single bits of `RegIrqFlags`.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IrqFlag {
    /// Receive timeout.
    RxTimeout = 1 << 7,
    /// Packet reception complete.
    RxDone = 1 << 6,
    /// Payload CRC error.
    PayloadCrcError = 1 << 5,
    /// Valid header received in RX.
    ValidHeader = 1 << 4,
    /// FIFO payload transmission complete.
    TxDone = 1 << 3,
    /// Channel activity detection finished.
    CadDone = 1 << 2,
    /// FHSS change channel.
    FhssChangeChannel = 1 << 1,
    /// Channel activity detected during CAD.
    CadDetected = 1 << 0,
}

/// Value written to `RegIrqFlags` to acknowledge every pending interrupt.
pub const CLEAR_ALL: u8 = 0xFF;

/// A snapshot of `RegIrqFlags`.
///
/// Every predicate is computed on its own bit, so any combination of flags
/// decodes, including ones the datasheet never lists together.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct IrqStatus {
    inner: u8,
}

impl From<u8> for IrqStatus {
    fn from(status: u8) -> Self {
        Self { inner: status }
    }
}

impl From<IrqStatus> for u8 {
    fn from(val: IrqStatus) -> Self {
        val.inner
    }
}

impl IrqStatus {
    fn is_set(self, flag: IrqFlag) -> bool {
        self.inner & flag as u8 == flag as u8
    }

    /// `false` for an all-zero snapshot.
    ///
    /// The chip raises a second, empty interrupt after some receptions; those
    /// read back as zero and carry nothing to handle.
    pub fn valid(self) -> bool {
        self.inner != 0
    }

    /// Returns `true` if the `RxTimeout` flag is set.
    pub fn timeout(self) -> bool {
        self.is_set(IrqFlag::RxTimeout)
    }

    /// Returns `true` if the `RxDone` flag is set.
    pub fn rx_done(self) -> bool {
        self.is_set(IrqFlag::RxDone)
    }

    /// Returns `true` if the `PayloadCrcError` flag is set.
    pub fn payload_crc_error(self) -> bool {
        self.is_set(IrqFlag::PayloadCrcError)
    }

    /// Returns `true` if the `ValidHeader` flag is set.
    pub fn valid_header(self) -> bool {
        self.is_set(IrqFlag::ValidHeader)
    }

    /// Returns `true` if the `TxDone` flag is set.
    pub fn tx_done(self) -> bool {
        self.is_set(IrqFlag::TxDone)
    }

    /// Returns `true` if the `CadDone` flag is set.
    pub fn cad_done(self) -> bool {
        self.is_set(IrqFlag::CadDone)
    }

    /// Returns `true` if the `FhssChangeChannel` flag is set.
    pub fn fhss_channel_change(self) -> bool {
        self.is_set(IrqFlag::FhssChangeChannel)
    }

    /// Returns `true` if the `CadDetected` flag is set.
    pub fn cad_detected(self) -> bool {
        self.is_set(IrqFlag::CadDetected)
    }

    /// CAD finished without detecting activity.
    pub fn cad_clear(self) -> bool {
        self.cad_done() && !self.cad_detected()
    }
}

impl fmt::Debug for IrqStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IrqStatus")
            .field("raw", &self.inner)
            .field("valid", &self.valid())
            .field("timeout", &self.timeout())
            .field("rx_done", &self.rx_done())
            .field("payload_crc_error", &self.payload_crc_error())
            .field("valid_header", &self.valid_header())
            .field("tx_done", &self.tx_done())
            .field("cad_done", &self.cad_done())
            .field("fhss_channel_change", &self.fhss_channel_change())
            .field("cad_detected", &self.cad_detected())
            .field("cad_clear", &self.cad_clear())
            .finish()
    }
}

/// Renders the set flags as `RX_DONE | VALID_HEADER`.
impl fmt::Display for IrqStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (!self.valid(), "INVALID_INTERRUPT"),
            (self.timeout(), "TIMEOUT"),
            (self.rx_done(), "RX_DONE"),
            (self.payload_crc_error(), "CRC_ERROR"),
            (self.valid_header(), "VALID_HEADER"),
            (self.tx_done(), "TX_DONE"),
            (self.cad_done(), "CAD_DONE"),
            (self.fhss_channel_change(), "FHSS_CHANNEL_CHANGE"),
            (self.cad_detected(), "CAD_DETECTED"),
            (self.cad_clear(), "CAD_CLEAR"),
        ];
        let mut first = true;
        for (_, name) in names.iter().filter(|(set, _)| *set) {
            if !first {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
            first = false;
        }
        Ok(())
    }
}

/// Function of the DIO0 pin (`RegDioMapping1` bits 7-6) in LoRa mode.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Dio0Mapping {
    /// DIO0 rises on `RxDone`.
    RxDone = 0x00,
    /// DIO0 rises on `TxDone`.
    TxDone = 0x40,
    /// DIO0 rises on `CadDone`.
    CadDone = 0x80,
}
