//! Received packet layout and link-quality conversions.

use core::fmt;

/// Size of the LoRa FIFO, the upper bound of any payload.
pub const FIFO_SIZE: usize = 256;

/// Length of the [`PacketHeader`] that prefixes every payload.
pub const HEADER_LEN: usize = 4;

/// Largest payload that fits in the FIFO after the header.
pub const MAX_PAYLOAD_LEN: usize = FIFO_SIZE - HEADER_LEN;

/// Offset between `RegPktRssiValue` and the packet RSSI in dBm.
pub const RSSI_OFFSET: i16 = -137;

/// The received bytes are too short to hold a [`PacketHeader`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FramingError {
    /// Number of bytes that were available.
    pub len: usize,
}

impl fmt::Display for FramingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "packet header needs {HEADER_LEN} bytes, got {}",
            self.len
        )
    }
}

/// The four byte addressing header in front of each payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PacketHeader {
    /// Sending node.
    pub source: u8,
    /// Addressed node.
    pub destination: u8,
    /// Sequence id.
    pub id: u8,
    /// Application flags.
    pub flags: u8,
}

impl PacketHeader {
    /// Splits `data` into its header and the payload following it.
    pub fn split(data: &[u8]) -> Result<(Self, &[u8]), FramingError> {
        if data.len() < HEADER_LEN {
            return Err(FramingError { len: data.len() });
        }
        let (header, payload) = data.split_at(HEADER_LEN);
        Ok((
            Self {
                source: header[0],
                destination: header[1],
                id: header[2],
                flags: header[3],
            },
            payload,
        ))
    }
}

impl TryFrom<&[u8]> for PacketHeader {
    type Error = FramingError;

    /// Takes the header from the first four bytes of `data`.
    fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
        Self::split(data).map(|(header, _)| header)
    }
}

impl fmt::Display for PacketHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PacketHeader(source={}, dest={}, id={}, flags={})",
            self.source, self.destination, self.id, self.flags
        )
    }
}

/// Sign-extends the low `bits` bits of `value`.
pub const fn twos_complement(value: u8, bits: u32) -> i16 {
    let mask = 1u8 << (bits - 1);
    -((value & mask) as i16) + (value & !mask) as i16
}

/// Converts `RegPktSnrValue` to quarter-dB.
///
/// Bit 7 is masked off and the remaining 7 bits are read as two's complement.
pub const fn snr_from_register(raw: u8) -> i8 {
    twos_complement(raw & 0x7F, 7) as i8
}

/// Converts `RegPktRssiValue` to dBm.
pub const fn rssi_from_register(raw: u8) -> i16 {
    raw as i16 + RSSI_OFFSET
}

/// A packet read out of the FIFO together with its link metrics.
#[derive(Clone, Debug, PartialEq)]
pub struct ReceivedPacket {
    /// Addressing header.
    pub header: PacketHeader,
    /// Bytes after the header.
    pub payload: heapless::Vec<u8, MAX_PAYLOAD_LEN>,
    /// SNR in quarter-dB.
    pub snr: i8,
    /// RSSI in dBm.
    pub rssi: i16,
    /// Valid headers received since entering RX.
    pub valid_header_count: u16,
    /// Valid packets received since entering RX.
    pub valid_packet_count: u16,
}

impl ReceivedPacket {
    /// SNR in dB.
    pub fn snr_db(&self) -> f32 {
        self.snr as f32 / 4.0
    }

    /// The payload as text, if it is valid UTF-8.
    pub fn payload_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.payload).ok()
    }
}

impl fmt::Display for ReceivedPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.header)?;
        match self.payload_str() {
            Some(text) => write!(f, "data {text:?}")?,
            None => write!(f, "data {:02X?}", self.payload.as_slice())?,
        }
        write!(
            f,
            " snr {} dB rssi {} dBm headers {} packets {}",
            self.snr_db(),
            self.rssi,
            self.valid_header_count,
            self.valid_packet_count
        )
    }
}
