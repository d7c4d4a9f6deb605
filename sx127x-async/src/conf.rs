//! Wrapper for modem configuration parameters.

use super::op::*;

/// Configuration parameters used to initialize the SX127x modem.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Config {
    /// Carrier frequency in MHz.
    pub frequency_mhz: f64,
    /// Bandwidth, coding rate, header mode, spreading factor and CRC.
    pub modem: ModemConfig,
    /// FIFO base address for transmitted payloads.
    pub tx_base_addr: u8,
    /// FIFO base address for received payloads.
    pub rx_base_addr: u8,
    /// What the DIO0 line signals once in receive mode.
    pub dio0_mapping: Dio0Mapping,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frequency_mhz: 868.0,
            modem: ModemPreset::Default.config(),
            tx_base_addr: 0x00,
            rx_base_addr: 0x00,
            dio0_mapping: Dio0Mapping::RxDone,
        }
    }
}
