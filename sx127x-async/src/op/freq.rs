//! Frequency synthesizer conversions.
//!
//! The carrier frequency is programmed as a 24-bit count of synthesizer steps,
//! `Frf = f_rf / F_STEP`, where `F_STEP = F_XOSC / 2^19` (about 61 Hz with the
//! 32 MHz reference crystal).

use core::fmt;

/// Reference crystal frequency in Hz.
pub const F_XOSC: f64 = 32_000_000.0;

/// Frequency synthesizer step in Hz.
pub const F_STEP: f64 = F_XOSC / (1u32 << 19) as f64;

/// Lowest carrier frequency the SX1276 synthesizer covers, in MHz.
pub const FREQ_MIN_MHZ: f64 = 137.0;

/// Highest carrier frequency the SX1276 synthesizer covers, in MHz.
pub const FREQ_MAX_MHZ: f64 = 1020.0;

/// A carrier frequency outside [`FREQ_MIN_MHZ`]..=[`FREQ_MAX_MHZ`], or NaN.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrequencyError {
    /// The rejected frequency in MHz.
    pub mhz: f64,
}

impl fmt::Display for FrequencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "carrier frequency {} MHz outside {FREQ_MIN_MHZ}..={FREQ_MAX_MHZ} MHz",
            self.mhz
        )
    }
}

/// Converts a carrier frequency in MHz to the 24-bit `Frf` register value.
///
/// The result is truncated, not rounded, so converting it back with
/// [`register_to_frequency`] may come out up to one [`F_STEP`] low.
pub fn frequency_to_register(mhz: f64) -> Result<u32, FrequencyError> {
    if !(FREQ_MIN_MHZ..=FREQ_MAX_MHZ).contains(&mhz) {
        return Err(FrequencyError { mhz });
    }
    Ok((mhz * 1_000_000.0 / F_STEP) as u32)
}

/// Converts the three `Frf` register bytes back to a carrier frequency in MHz.
pub fn register_to_frequency(msb: u8, mid: u8, lsb: u8) -> f64 {
    let frf = u32::from_be_bytes([0, msb, mid, lsb]);
    frf as f64 * F_STEP / 1_000_000.0
}

/// The `Frf` value split into the MSB, MID, LSB register bytes, in write order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Frf {
    inner: [u8; 3],
}

impl Frf {
    /// Computes the register bytes for a carrier frequency in MHz.
    pub fn from_mhz(mhz: f64) -> Result<Self, FrequencyError> {
        let [_, msb, mid, lsb] = frequency_to_register(mhz)?.to_be_bytes();
        Ok(Self {
            inner: [msb, mid, lsb],
        })
    }

    /// The carrier frequency these register bytes select, in MHz.
    pub fn mhz(self) -> f64 {
        let [msb, mid, lsb] = self.inner;
        register_to_frequency(msb, mid, lsb)
    }
}

impl From<[u8; 3]> for Frf {
    fn from(inner: [u8; 3]) -> Self {
        Self { inner }
    }
}

impl From<Frf> for [u8; 3] {
    fn from(val: Frf) -> Self {
        val.inner
    }
}
