//! Error types for the SX127x driver.

use core::fmt::{self, Debug, Display};

use crate::op::{FramingError, FrequencyError};

/// An error related to SPI communication.
pub enum SpiError<TSPIERR> {
    /// An error occurred during a register write.
    Write(TSPIERR),
    /// An error occurred during a register read.
    Transfer(TSPIERR),
}

impl<TSPIERR: Debug> Debug for SpiError<TSPIERR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write(err) => write!(f, "Write({err:?})"),
            Self::Transfer(err) => write!(f, "Transfer({err:?})"),
        }
    }
}

/// An error related to GPIO pin operations.
pub enum PinError<TPINERR> {
    /// An error occurred on an output pin.
    Output(TPINERR),
    /// An error occurred on an input pin.
    Input(TPINERR),
}

impl<TPINERR: Debug> Debug for PinError<TPINERR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Output(err) => write!(f, "Output({err:?})"),
            Self::Input(err) => write!(f, "Input({err:?})"),
        }
    }
}

/// The main error type for the SX127x driver.
pub enum SxError<TSPIERR, TPINERR> {
    /// An SPI-related error.
    Spi(SpiError<TSPIERR>),
    /// A pin-related error.
    Pin(PinError<TPINERR>),
    /// `RegVersion` did not identify an SX1276.
    UnknownVersion(u8),
    /// A received packet was too short for its header.
    Framing(FramingError),
    /// The requested carrier frequency is outside the synthesizer range.
    Frequency(FrequencyError),
}

impl<TSPIERR: Debug, TPINERR: Debug> Debug for SxError<TSPIERR, TPINERR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spi(err) => write!(f, "Spi({err:?})"),
            Self::Pin(err) => write!(f, "Pin({err:?})"),
            Self::UnknownVersion(version) => write!(f, "UnknownVersion(0x{version:02X})"),
            Self::Framing(err) => write!(f, "Framing({err:?})"),
            Self::Frequency(err) => write!(f, "Frequency({err:?})"),
        }
    }
}

impl<TSPIERR: Debug, TPINERR: Debug> Display for SxError<TSPIERR, TPINERR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spi(err) => write!(f, "SPI transfer failed: {err:?}"),
            Self::Pin(err) => write!(f, "GPIO failed: {err:?}"),
            Self::UnknownVersion(version) => {
                write!(f, "unknown device, version register reads 0x{version:02X}")
            }
            Self::Framing(err) => Display::fmt(err, f),
            Self::Frequency(err) => Display::fmt(err, f),
        }
    }
}

impl<TSPIERR, TPINERR> From<SpiError<TSPIERR>> for SxError<TSPIERR, TPINERR> {
    fn from(spi_err: SpiError<TSPIERR>) -> Self {
        SxError::Spi(spi_err)
    }
}

impl<TSPIERR, TPINERR> From<PinError<TPINERR>> for SxError<TSPIERR, TPINERR> {
    fn from(pin_err: PinError<TPINERR>) -> Self {
        SxError::Pin(pin_err)
    }
}

impl<TSPIERR, TPINERR> From<FramingError> for SxError<TSPIERR, TPINERR> {
    fn from(err: FramingError) -> Self {
        SxError::Framing(err)
    }
}

impl<TSPIERR, TPINERR> From<FrequencyError> for SxError<TSPIERR, TPINERR> {
    fn from(err: FrequencyError) -> Self {
        SxError::Frequency(err)
    }
}
