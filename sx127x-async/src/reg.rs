//! LoRa-mode register map of the SX1276/77/78/79.

/// Set on the address byte of a register write.
pub const WRITE_MASK: u8 = 0x80;

/// Silicon revision reported by `RegVersion` on SX1276/RFM95 parts.
pub const SX1276_VERSION: u8 = 0x12;

/// Register addresses used by the driver (LoRa page).
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Register {
    /// FIFO read/write access, auto-increments `FifoAddrPtr`.
    Fifo = 0x00,
    /// Operating mode and LoRa/FSK selection.
    OpMode = 0x01,
    /// RF carrier frequency, MSB.
    FrfMsb = 0x06,
    /// RF carrier frequency, middle byte.
    FrfMid = 0x07,
    /// RF carrier frequency, LSB.
    FrfLsb = 0x08,
    /// SPI interface address pointer into the FIFO.
    FifoAddrPtr = 0x0D,
    /// Write base address in the FIFO for the TX modulator.
    FifoTxBaseAddr = 0x0E,
    /// Read base address in the FIFO for the RX demodulator.
    FifoRxBaseAddr = 0x0F,
    /// Start address of the last packet received.
    FifoRxCurrentAddr = 0x10,
    /// Interrupt flags, write 1 to clear.
    IrqFlags = 0x12,
    /// Number of payload bytes of the last packet received.
    RxNbBytes = 0x13,
    /// Valid headers received since the last transition into RX, MSB.
    RxHeaderCntValueMsb = 0x14,
    /// Valid headers received since the last transition into RX, LSB.
    RxHeaderCntValueLsb = 0x15,
    /// Valid packets received since the last transition into RX, MSB.
    RxPacketCntValueMsb = 0x16,
    /// Valid packets received since the last transition into RX, LSB.
    RxPacketCntValueLsb = 0x17,
    /// SNR estimate of the last packet, quarter-dB.
    PktSnrValue = 0x19,
    /// RSSI of the last packet.
    PktRssiValue = 0x1A,
    /// Bandwidth, coding rate, header mode.
    ModemConfig1 = 0x1D,
    /// Spreading factor, CRC enable.
    ModemConfig2 = 0x1E,
    /// DIO0..DIO3 function mapping.
    DioMapping1 = 0x40,
    /// Silicon revision.
    Version = 0x42,
}

impl Register {
    /// The address byte that reads this register.
    pub const fn read_addr(self) -> u8 {
        self as u8 & !WRITE_MASK
    }

    /// The address byte that writes this register.
    pub const fn write_addr(self) -> u8 {
        self as u8 | WRITE_MASK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_sets_high_bit_read_clears_it() {
        assert_eq!(Register::IrqFlags.read_addr(), 0x12);
        assert_eq!(Register::IrqFlags.write_addr(), 0x92);
        assert_eq!(Register::Version.read_addr(), 0x42);
        assert_eq!(Register::Fifo.write_addr(), 0x80);
    }
}
