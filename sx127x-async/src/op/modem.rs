//! LoRa modem configuration (`RegModemConfig1` / `RegModemConfig2`).
//!
//! Bit layout, MSB first:
//!
//! - `ModemConfig1`: `[bandwidth:4][coding rate:3][implicit header:1]`
//! - `ModemConfig2`: `[spreading factor:4][tx continuous:1][CRC on:1][symbol timeout msb:2]`
//!
//! The low nibble of `ModemConfig2` other than the CRC bit is left at zero.
//!
//! Each enum variant carries its already-shifted register bits as discriminant.

use core::fmt;
use core::str::FromStr;

const BANDWIDTH_MASK: u8 = 0xF0;
const CODING_RATE_MASK: u8 = 0x0E;
const HEADER_MODE_MASK: u8 = 0x01;
const SPREADING_FACTOR_MASK: u8 = 0xF0;
const CRC_ON: u8 = 0x04;

/// LoRa signal bandwidth.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Bandwidth {
    /// 7.8 kHz
    Bw7_8kHz = 0x00,
    /// 10.4 kHz
    Bw10_4kHz = 0x10,
    /// 15.6 kHz
    Bw15_6kHz = 0x20,
    /// 20.8 kHz
    Bw20_8kHz = 0x30,
    /// 31.25 kHz
    Bw31_25kHz = 0x40,
    /// 41.7 kHz
    Bw41_7kHz = 0x50,
    /// 62.5 kHz
    Bw62_5kHz = 0x60,
    /// 125 kHz
    Bw125kHz = 0x70,
    /// 250 kHz
    Bw250kHz = 0x80,
    /// 500 kHz, not supported in the 169 MHz band.
    Bw500kHz = 0x90,
}

impl Bandwidth {
    /// Bandwidth in Hz.
    pub const fn hz(self) -> u32 {
        match self {
            Self::Bw7_8kHz => 7_800,
            Self::Bw10_4kHz => 10_400,
            Self::Bw15_6kHz => 15_600,
            Self::Bw20_8kHz => 20_800,
            Self::Bw31_25kHz => 31_250,
            Self::Bw41_7kHz => 41_700,
            Self::Bw62_5kHz => 62_500,
            Self::Bw125kHz => 125_000,
            Self::Bw250kHz => 250_000,
            Self::Bw500kHz => 500_000,
        }
    }

    fn from_bits(bits: u8) -> Option<Self> {
        Some(match bits & BANDWIDTH_MASK {
            0x00 => Self::Bw7_8kHz,
            0x10 => Self::Bw10_4kHz,
            0x20 => Self::Bw15_6kHz,
            0x30 => Self::Bw20_8kHz,
            0x40 => Self::Bw31_25kHz,
            0x50 => Self::Bw41_7kHz,
            0x60 => Self::Bw62_5kHz,
            0x70 => Self::Bw125kHz,
            0x80 => Self::Bw250kHz,
            0x90 => Self::Bw500kHz,
            _ => return None,
        })
    }
}

/// LoRa forward error correction coding rate.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CodingRate {
    /// 4/5
    Cr4_5 = 0x02,
    /// 4/6
    Cr4_6 = 0x04,
    /// 4/7
    Cr4_7 = 0x06,
    /// 4/8
    Cr4_8 = 0x08,
}

impl CodingRate {
    fn from_bits(bits: u8) -> Option<Self> {
        Some(match bits & CODING_RATE_MASK {
            0x02 => Self::Cr4_5,
            0x04 => Self::Cr4_6,
            0x06 => Self::Cr4_7,
            0x08 => Self::Cr4_8,
            _ => return None,
        })
    }
}

/// LoRa header mode.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HeaderMode {
    /// Length, coding rate and CRC presence are sent in the packet header.
    Explicit = 0x00,
    /// No header; the receiver must be configured with the packet format.
    Implicit = 0x01,
}

/// LoRa spreading factor, `2^SF` chips per symbol.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SpreadingFactor {
    /// 64 chips/symbol.
    Sf6 = 0x60,
    /// 128 chips/symbol.
    Sf7 = 0x70,
    /// 256 chips/symbol.
    Sf8 = 0x80,
    /// 512 chips/symbol.
    Sf9 = 0x90,
    /// 1024 chips/symbol.
    Sf10 = 0xA0,
    /// 2048 chips/symbol.
    Sf11 = 0xB0,
    /// 4096 chips/symbol.
    Sf12 = 0xC0,
}

impl SpreadingFactor {
    /// The spreading factor as the base-2 logarithm of chips per symbol.
    pub const fn value(self) -> u8 {
        self as u8 >> 4
    }

    /// Chips per symbol.
    pub const fn chips_per_symbol(self) -> u16 {
        1 << self.value()
    }

    fn from_bits(bits: u8) -> Option<Self> {
        Some(match bits & SPREADING_FACTOR_MASK {
            0x60 => Self::Sf6,
            0x70 => Self::Sf7,
            0x80 => Self::Sf8,
            0x90 => Self::Sf9,
            0xA0 => Self::Sf10,
            0xB0 => Self::Sf11,
            0xC0 => Self::Sf12,
            _ => return None,
        })
    }
}

/// A builder for the two LoRa modem configuration registers.
///
/// The two registers are written one after the other with no atomicity
/// between them; a receiver active during the update briefly runs with a
/// mixed configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ModemConfig {
    bandwidth: Bandwidth,
    coding_rate: CodingRate,
    header_mode: HeaderMode,
    spreading_factor: SpreadingFactor,
    crc_enabled: bool,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            bandwidth: Bandwidth::Bw125kHz,
            coding_rate: CodingRate::Cr4_5,
            header_mode: HeaderMode::Explicit,
            spreading_factor: SpreadingFactor::Sf7,
            crc_enabled: true,
        }
    }
}

impl ModemConfig {
    /// Sets the bandwidth.
    pub const fn set_bandwidth(mut self, bandwidth: Bandwidth) -> Self {
        self.bandwidth = bandwidth;
        self
    }

    /// Sets the coding rate.
    pub const fn set_coding_rate(mut self, coding_rate: CodingRate) -> Self {
        self.coding_rate = coding_rate;
        self
    }

    /// Sets the header mode.
    pub const fn set_header_mode(mut self, header_mode: HeaderMode) -> Self {
        self.header_mode = header_mode;
        self
    }

    /// Sets the spreading factor.
    pub const fn set_spreading_factor(mut self, spreading_factor: SpreadingFactor) -> Self {
        self.spreading_factor = spreading_factor;
        self
    }

    /// Enables or disables the payload CRC.
    pub const fn set_crc_enabled(mut self, crc_enabled: bool) -> Self {
        self.crc_enabled = crc_enabled;
        self
    }

    /// The configured bandwidth.
    pub const fn bandwidth(&self) -> Bandwidth {
        self.bandwidth
    }

    /// The configured coding rate.
    pub const fn coding_rate(&self) -> CodingRate {
        self.coding_rate
    }

    /// The configured header mode.
    pub const fn header_mode(&self) -> HeaderMode {
        self.header_mode
    }

    /// The configured spreading factor.
    pub const fn spreading_factor(&self) -> SpreadingFactor {
        self.spreading_factor
    }

    /// Whether the payload CRC is enabled.
    pub const fn crc_enabled(&self) -> bool {
        self.crc_enabled
    }

    /// Packed `RegModemConfig1` value.
    pub const fn config1(&self) -> u8 {
        self.bandwidth as u8 | self.coding_rate as u8 | self.header_mode as u8
    }

    /// Packed `RegModemConfig2` value.
    pub const fn config2(&self) -> u8 {
        let crc = if self.crc_enabled { CRC_ON } else { 0x00 };
        self.spreading_factor as u8 | crc
    }
}

impl From<ModemConfig> for [u8; 2] {
    fn from(val: ModemConfig) -> Self {
        [val.config1(), val.config2()]
    }
}

/// The register pair holds a reserved bandwidth, coding rate or spreading factor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InvalidModemConfig {
    /// Raw `[RegModemConfig1, RegModemConfig2]`.
    pub raw: [u8; 2],
}

impl fmt::Display for InvalidModemConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reserved modem configuration 0x{:02X} 0x{:02X}",
            self.raw[0], self.raw[1]
        )
    }
}

impl TryFrom<[u8; 2]> for ModemConfig {
    type Error = InvalidModemConfig;

    fn try_from(raw: [u8; 2]) -> Result<Self, Self::Error> {
        let [config1, config2] = raw;
        let err = InvalidModemConfig { raw };
        let header_mode = if config1 & HEADER_MODE_MASK == 0 {
            HeaderMode::Explicit
        } else {
            HeaderMode::Implicit
        };
        Ok(Self {
            bandwidth: Bandwidth::from_bits(config1).ok_or(err)?,
            coding_rate: CodingRate::from_bits(config1).ok_or(err)?,
            header_mode,
            spreading_factor: SpreadingFactor::from_bits(config2).ok_or(err)?,
            crc_enabled: config2 & CRC_ON != 0,
        })
    }
}

/// Named modem configurations trading range for throughput.
///
/// All of them use an explicit header and CRC.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ModemPreset {
    /// Bw 125 kHz, Cr 4/5, SF7. Medium range.
    #[default]
    Default,
    /// Bw 500 kHz, Cr 4/5, SF7. Fast, short range.
    FastShort,
    /// Bw 31.25 kHz, Cr 4/8, SF9. Slow, long range.
    SlowLong1,
    /// Bw 125 kHz, Cr 4/8, SF12. Slow, long range.
    SlowLong2,
}

impl ModemPreset {
    /// Every preset, in declaration order.
    pub const ALL: [ModemPreset; 4] = [
        Self::Default,
        Self::FastShort,
        Self::SlowLong1,
        Self::SlowLong2,
    ];

    /// The configuration this preset stands for.
    pub const fn config(self) -> ModemConfig {
        let base = ModemConfig {
            bandwidth: Bandwidth::Bw125kHz,
            coding_rate: CodingRate::Cr4_5,
            header_mode: HeaderMode::Explicit,
            spreading_factor: SpreadingFactor::Sf7,
            crc_enabled: true,
        };
        match self {
            Self::Default => base,
            Self::FastShort => base.set_bandwidth(Bandwidth::Bw500kHz),
            Self::SlowLong1 => base
                .set_bandwidth(Bandwidth::Bw31_25kHz)
                .set_coding_rate(CodingRate::Cr4_8)
                .set_spreading_factor(SpreadingFactor::Sf9),
            Self::SlowLong2 => base
                .set_coding_rate(CodingRate::Cr4_8)
                .set_spreading_factor(SpreadingFactor::Sf12),
        }
    }

    /// The preset's configuration-surface name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::FastShort => "fast_short",
            Self::SlowLong1 => "slow_long_1",
            Self::SlowLong2 => "slow_long_2",
        }
    }
}

impl From<ModemPreset> for ModemConfig {
    fn from(val: ModemPreset) -> Self {
        val.config()
    }
}

impl fmt::Display for ModemPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The name does not match any [`ModemPreset`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ParsePresetError;

impl fmt::Display for ParsePresetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown modem preset, expected one of default, fast_short, slow_long_1, slow_long_2")
    }
}

impl FromStr for ModemPreset {
    type Err = ParsePresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name() == s)
            .ok_or(ParsePresetError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preset_encodes_to_0x72_0x74() {
        let config = ModemPreset::Default.config();
        assert_eq!(config.config1(), 0x72);
        assert_eq!(config.config2(), 0x74);
        assert_eq!(<[u8; 2]>::from(config), [0x72, 0x74]);
        assert_eq!(config, ModemConfig::default());
    }

    #[test]
    fn preset_register_values() {
        assert_eq!(<[u8; 2]>::from(ModemPreset::FastShort.config()), [0x92, 0x74]);
        assert_eq!(<[u8; 2]>::from(ModemPreset::SlowLong1.config()), [0x48, 0x94]);
        assert_eq!(<[u8; 2]>::from(ModemPreset::SlowLong2.config()), [0x78, 0xC4]);
    }

    #[test]
    fn implicit_header_and_crc_off() {
        let config = ModemConfig::default()
            .set_header_mode(HeaderMode::Implicit)
            .set_crc_enabled(false)
            .set_spreading_factor(SpreadingFactor::Sf6);
        assert_eq!(config.config1(), 0x73);
        assert_eq!(config.config2(), 0x60);
    }

    #[test]
    fn decodes_back_from_registers() {
        for preset in ModemPreset::ALL {
            let config = preset.config();
            let raw: [u8; 2] = config.into();
            assert_eq!(ModemConfig::try_from(raw), Ok(config));
        }
    }

    #[test]
    fn rejects_reserved_values() {
        // Bandwidth 0xA0 and coding rate 0 are reserved.
        assert!(ModemConfig::try_from([0xA2, 0x74]).is_err());
        assert!(ModemConfig::try_from([0x70, 0x74]).is_err());
        assert!(ModemConfig::try_from([0x72, 0x50]).is_err());
    }

    #[test]
    fn preset_names_parse() {
        assert_eq!("fast_short".parse(), Ok(ModemPreset::FastShort));
        assert_eq!("slow_long_2".parse(), Ok(ModemPreset::SlowLong2));
        assert_eq!("turbo".parse::<ModemPreset>(), Err(ParsePresetError));
        for preset in ModemPreset::ALL {
            assert_eq!(preset.to_string().parse(), Ok(preset));
        }
    }

    #[test]
    fn spreading_factor_chips() {
        assert_eq!(SpreadingFactor::Sf7.value(), 7);
        assert_eq!(SpreadingFactor::Sf12.chips_per_symbol(), 4096);
        assert_eq!(Bandwidth::Bw31_25kHz.hz(), 31_250);
    }
}
