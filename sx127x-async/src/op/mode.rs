//! Operating modes (`RegOpMode`).

/// `LongRangeMode` bit. Every mode write ORs it in; writing a mode without it
/// drops the chip back into FSK/OOK operation.
pub const LONG_RANGE_MODE: u8 = 0x80;

const MODE_MASK: u8 = 0x07;

/// The transceiver modes this driver moves between.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OperatingMode {
    /// Lowest power; FIFO not accessible. The only mode in which the
    /// LoRa/FSK selection can change.
    Sleep = 0x00,
    /// Oscillator and baseband blocks on.
    Standby = 0x01,
    /// Continuous receive; the chip stays in RX after each packet.
    RxContinuous = 0x05,
}

impl OperatingMode {
    /// The full `RegOpMode` value for this mode in LoRa operation.
    pub const fn register_value(self) -> u8 {
        self as u8 | LONG_RANGE_MODE
    }
}

/// A decoded `RegOpMode` read-back.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OpModeRegister {
    inner: u8,
}

impl From<u8> for OpModeRegister {
    fn from(inner: u8) -> Self {
        Self { inner }
    }
}

impl OpModeRegister {
    /// Raw register value.
    pub const fn raw(self) -> u8 {
        self.inner
    }

    /// Whether the chip is in LoRa (long range) operation.
    pub const fn long_range(self) -> bool {
        self.inner & LONG_RANGE_MODE != 0
    }

    /// The operating mode, or `None` for modes this driver never selects
    /// (FS, TX, single RX, CAD).
    pub const fn mode(self) -> Option<OperatingMode> {
        match self.inner & MODE_MASK {
            0x00 => Some(OperatingMode::Sleep),
            0x01 => Some(OperatingMode::Standby),
            0x05 => Some(OperatingMode::RxContinuous),
            _ => None,
        }
    }

    /// Whether the register holds exactly `mode` with LoRa selected.
    pub fn is(self, mode: OperatingMode) -> bool {
        self.long_range() && self.mode() == Some(mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_always_carry_lora_flag() {
        assert_eq!(OperatingMode::Sleep.register_value(), 0x80);
        assert_eq!(OperatingMode::Standby.register_value(), 0x81);
        assert_eq!(OperatingMode::RxContinuous.register_value(), 0x85);
    }

    #[test]
    fn decodes_read_back() {
        let sleep = OpModeRegister::from(0x80);
        assert!(sleep.long_range());
        assert!(sleep.is(OperatingMode::Sleep));

        // FSK standby, the power-on default.
        let fsk = OpModeRegister::from(0x09);
        assert!(!fsk.long_range());
        assert_eq!(fsk.mode(), Some(OperatingMode::Standby));
        assert!(!fsk.is(OperatingMode::Standby));

        // LoRa TX is not a mode this driver selects.
        assert_eq!(OpModeRegister::from(0x83).mode(), None);
    }
}
