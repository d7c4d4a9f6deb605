//! The core implementation of the SX127x driver.

pub mod err;

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::spi::SpiDevice;

use crate::conf::Config;
use crate::op::*;
use crate::reg::*;

pub use self::err::{PinError, SpiError, SxError};

const NOP: u8 = 0x00;

/// NRESET is held low at least this long.
const RESET_HOLD_NS: u32 = 150_000_000;
/// Time the chip needs after NRESET is released before it answers on SPI.
const RESET_SETTLE_NS: u32 = 100_000_000;
/// Time given to the mode sequencer after leaving FSK for LoRa sleep.
const MODE_SETTLE_NS: u32 = 10_000_000;

/// A wrapper around a Semtech SX1276 (HopeRF RFM95/96) LoRa modem.
///
/// The wrapper owns the bus handle; everything that talks to the chip goes
/// through `&mut self`, so sharing it between contexts means sharing it behind
/// a lock.
///
/// The reset and mode settle times run on `delay`, outside any SPI
/// transaction, so the bus stays free for other devices meanwhile.
pub struct SX127x<TSPI, TNRST, TDELAY> {
    spi: TSPI,
    nrst_pin: TNRST,
    delay: TDELAY,
    mode: Option<OperatingMode>,
}

impl<TSPI, TNRST, TDELAY> SX127x<TSPI, TNRST, TDELAY> {
    /// Creates a new `SX127x` driver instance.
    ///
    /// # Arguments
    ///
    /// * `spi` - An asynchronous SPI device, chip select handled by the device.
    /// * `nrst_pin` - The NRESET output pin.
    /// * `delay` - Timer for the reset pulse and mode transitions.
    pub fn new(spi: TSPI, nrst_pin: TNRST, delay: TDELAY) -> Self {
        Self {
            spi,
            nrst_pin,
            delay,
            mode: None,
        }
    }

    /// Releases the SPI device, reset pin and delay provider.
    pub fn release(self) -> (TSPI, TNRST, TDELAY) {
        (self.spi, self.nrst_pin, self.delay)
    }

    /// The mode last written by this driver, `None` after a reset.
    pub fn mode(&self) -> Option<OperatingMode> {
        self.mode
    }
}

impl<TSPI, TNRST, TDELAY, TSPIERR, TPINERR> SX127x<TSPI, TNRST, TDELAY>
where
    TSPIERR: core::fmt::Debug,
    TPINERR: core::fmt::Debug,
    TSPI: SpiDevice<Error = TSPIERR>,
    TNRST: OutputPin<Error = TPINERR>,
    TDELAY: DelayNs,
{
    /// Brings the modem from any state into continuous LoRa reception.
    ///
    /// Reset, identify, force sleep + LoRa, standby, FIFO bases, frequency,
    /// modem configuration, continuous RX, DIO0 mapping. A carrier frequency
    /// out of range fails before the chip is touched; an unexpected
    /// `RegVersion` aborts before any mode or frequency is written.
    pub async fn init(&mut self, conf: &Config) -> Result<(), SxError<TSPIERR, TPINERR>> {
        let frf = Frf::from_mhz(conf.frequency_mhz)?;
        log::trace!("lora::init start");
        self.reset().await?;
        log::trace!("lora::init reset done");

        let version = self.verify_version().await?;
        log::info!("lora::init found SX1276 RF95/96, version 0x{version:02X}");

        let mode = self.get_op_mode().await?;
        log::trace!("lora::init current mode 0x{:02X}", mode.raw());

        self.set_mode(OperatingMode::Sleep).await?;
        self.delay.delay_ns(MODE_SETTLE_NS).await;
        let mode = self.get_op_mode().await?;
        if mode.is(OperatingMode::Sleep) {
            log::trace!("lora::init sleep + LoRa set");
        } else {
            log::warn!(
                "lora::init mode reads 0x{:02X} after selecting sleep + LoRa",
                mode.raw()
            );
        }

        self.set_mode(OperatingMode::Standby).await?;
        log::trace!("lora::init standby set");

        self.set_fifo_base_addresses(conf.tx_base_addr, conf.rx_base_addr)
            .await?;
        log::trace!(
            "lora::init fifo base addresses set. tx: 0x{:02X}, rx: 0x{:02X}",
            conf.tx_base_addr,
            conf.rx_base_addr
        );

        let previous = self.get_frequency().await?;
        self.write_frf(frf).await?;
        log::trace!(
            "lora::init frequency set. was {previous} MHz, now {} MHz",
            self.get_frequency().await?
        );

        let [config1, config2] = self.get_modem_config().await?;
        log::trace!("lora::init modem config was 0x{config1:02X} 0x{config2:02X}");
        self.set_modem_config(&conf.modem).await?;
        verify_modem_config(&conf.modem, self.get_modem_config().await?);

        self.set_mode(OperatingMode::RxContinuous).await?;
        self.set_dio0_mapping(conf.dio0_mapping).await?;
        log::trace!("lora::init rx continuous set, dio0 -> {:?}", conf.dio0_mapping);

        log::trace!("lora::init done");
        Ok(())
    }

    /// Reads a single register.
    pub async fn read_register(
        &mut self,
        register: Register,
    ) -> Result<u8, SxError<TSPIERR, TPINERR>> {
        let mut frame = [register.read_addr(), NOP];
        self.spi
            .transfer_in_place(&mut frame)
            .await
            .map_err(SpiError::Transfer)?;
        Ok(frame[1])
    }

    /// Writes a single register, returning the byte clocked out during the
    /// data phase (the register's previous content on SX1276 silicon).
    pub async fn write_register(
        &mut self,
        register: Register,
        value: u8,
    ) -> Result<u8, SxError<TSPIERR, TPINERR>> {
        let mut frame = [register.write_addr(), value];
        self.spi
            .transfer_in_place(&mut frame)
            .await
            .map_err(SpiError::Write)?;
        Ok(frame[1])
    }

    /// Fills `result` with one single-byte read of `register` per byte.
    ///
    /// Used on [`Register::Fifo`], where the chip advances `FifoAddrPtr`
    /// after every access.
    pub async fn burst_read(
        &mut self,
        register: Register,
        result: &mut [u8],
    ) -> Result<(), SxError<TSPIERR, TPINERR>> {
        for byte in result.iter_mut() {
            *byte = self.read_register(register).await?;
        }
        Ok(())
    }

    /// Pulses NRESET: low for 150 ms, then high and 100 ms to come up.
    pub async fn reset(&mut self) -> Result<(), SxError<TSPIERR, TPINERR>> {
        self.nrst_pin.set_low().map_err(PinError::Output)?;
        self.delay.delay_ns(RESET_HOLD_NS).await;
        self.nrst_pin.set_high().map_err(PinError::Output)?;
        self.delay.delay_ns(RESET_SETTLE_NS).await;
        self.mode = None;
        Ok(())
    }

    /// Reads `RegVersion` and checks it identifies an SX1276.
    pub async fn verify_version(&mut self) -> Result<u8, SxError<TSPIERR, TPINERR>> {
        let version = self.read_register(Register::Version).await?;
        if version != SX1276_VERSION {
            log::warn!("lora::verify_version unknown device, version 0x{version:02X}");
            return Err(SxError::UnknownVersion(version));
        }
        Ok(version)
    }

    /// Reads back `RegOpMode`.
    pub async fn get_op_mode(&mut self) -> Result<OpModeRegister, SxError<TSPIERR, TPINERR>> {
        Ok(self.read_register(Register::OpMode).await?.into())
    }

    /// Switches operating mode with a full `RegOpMode` write, LoRa flag included.
    pub async fn set_mode(&mut self, mode: OperatingMode) -> Result<(), SxError<TSPIERR, TPINERR>> {
        self.write_register(Register::OpMode, mode.register_value())
            .await?;
        self.mode = Some(mode);
        Ok(())
    }

    /// Programs the carrier frequency, MSB first.
    ///
    /// Only meant to be called outside of receive mode. Frequencies outside
    /// [`FREQ_MIN_MHZ`]..=[`FREQ_MAX_MHZ`] fail with [`SxError::Frequency`]
    /// and leave the registers untouched.
    pub async fn set_frequency(&mut self, mhz: f64) -> Result<(), SxError<TSPIERR, TPINERR>> {
        let frf = Frf::from_mhz(mhz)?;
        if self.mode == Some(OperatingMode::RxContinuous) {
            log::warn!("lora::set_frequency called while in continuous RX");
        }
        self.write_frf(frf).await
    }

    async fn write_frf(&mut self, frf: Frf) -> Result<(), SxError<TSPIERR, TPINERR>> {
        let [msb, mid, lsb]: [u8; 3] = frf.into();
        self.write_register(Register::FrfMsb, msb).await?;
        self.write_register(Register::FrfMid, mid).await?;
        self.write_register(Register::FrfLsb, lsb).await?;
        Ok(())
    }

    /// Reads the carrier frequency back in MHz.
    pub async fn get_frequency(&mut self) -> Result<f64, SxError<TSPIERR, TPINERR>> {
        let msb = self.read_register(Register::FrfMsb).await?;
        let mid = self.read_register(Register::FrfMid).await?;
        let lsb = self.read_register(Register::FrfLsb).await?;
        Ok(register_to_frequency(msb, mid, lsb))
    }

    /// Writes `RegModemConfig1` then `RegModemConfig2`.
    pub async fn set_modem_config(
        &mut self,
        config: &ModemConfig,
    ) -> Result<(), SxError<TSPIERR, TPINERR>> {
        self.write_register(Register::ModemConfig1, config.config1())
            .await?;
        self.write_register(Register::ModemConfig2, config.config2())
            .await?;
        Ok(())
    }

    /// Reads the raw `[RegModemConfig1, RegModemConfig2]` pair.
    pub async fn get_modem_config(&mut self) -> Result<[u8; 2], SxError<TSPIERR, TPINERR>> {
        let config1 = self.read_register(Register::ModemConfig1).await?;
        let config2 = self.read_register(Register::ModemConfig2).await?;
        Ok([config1, config2])
    }

    /// Configures the base addresses for the TX and RX halves of the FIFO.
    pub async fn set_fifo_base_addresses(
        &mut self,
        tx_base_addr: u8,
        rx_base_addr: u8,
    ) -> Result<(), SxError<TSPIERR, TPINERR>> {
        self.write_register(Register::FifoRxBaseAddr, rx_base_addr)
            .await?;
        self.write_register(Register::FifoTxBaseAddr, tx_base_addr)
            .await?;
        Ok(())
    }

    /// Selects what DIO0 signals. DIO1..DIO3 are left at mapping 0.
    pub async fn set_dio0_mapping(
        &mut self,
        mapping: Dio0Mapping,
    ) -> Result<(), SxError<TSPIERR, TPINERR>> {
        self.write_register(Register::DioMapping1, mapping as u8)
            .await?;
        Ok(())
    }

    /// Gets the current IRQ status.
    pub async fn get_irq_status(&mut self) -> Result<IrqStatus, SxError<TSPIERR, TPINERR>> {
        Ok(self.read_register(Register::IrqFlags).await?.into())
    }

    /// Acknowledges every pending interrupt. Until this happens DIO0 stays
    /// asserted and no further reception is signalled.
    pub async fn clear_irq_status(&mut self) -> Result<(), SxError<TSPIERR, TPINERR>> {
        self.write_register(Register::IrqFlags, CLEAR_ALL).await?;
        Ok(())
    }

    /// Valid header and valid packet counters since entering RX.
    pub async fn get_rx_counters(&mut self) -> Result<(u16, u16), SxError<TSPIERR, TPINERR>> {
        let headers = self
            .read_u16(Register::RxHeaderCntValueMsb, Register::RxHeaderCntValueLsb)
            .await?;
        let packets = self
            .read_u16(Register::RxPacketCntValueMsb, Register::RxPacketCntValueLsb)
            .await?;
        Ok((headers, packets))
    }

    /// SNR of the last packet in quarter-dB.
    pub async fn get_packet_snr(&mut self) -> Result<i8, SxError<TSPIERR, TPINERR>> {
        Ok(snr_from_register(
            self.read_register(Register::PktSnrValue).await?,
        ))
    }

    /// RSSI of the last packet in dBm.
    pub async fn get_packet_rssi(&mut self) -> Result<i16, SxError<TSPIERR, TPINERR>> {
        Ok(rssi_from_register(
            self.read_register(Register::PktRssiValue).await?,
        ))
    }

    /// Reads the last received packet out of the FIFO, with its counters and
    /// link metrics.
    ///
    /// The FIFO pointer is moved back to the packet start first, as it may
    /// have advanced since. A packet shorter than its header fails with
    /// [`SxError::Framing`] before any counter is read.
    pub async fn read_packet(&mut self) -> Result<ReceivedPacket, SxError<TSPIERR, TPINERR>> {
        let len = self.read_register(Register::RxNbBytes).await? as usize;
        let start = self.read_register(Register::FifoRxCurrentAddr).await?;
        log::trace!("lora::read_packet len={len}, start=0x{start:02X}");
        self.write_register(Register::FifoAddrPtr, start).await?;

        let mut buffer = [NOP; FIFO_SIZE];
        let data = &mut buffer[..len];
        self.burst_read(Register::Fifo, data).await?;

        let (header, payload) = PacketHeader::split(data)?;
        let payload = payload.iter().copied().collect();

        let (valid_header_count, valid_packet_count) = self.get_rx_counters().await?;
        let snr = self.get_packet_snr().await?;
        let rssi = self.get_packet_rssi().await?;

        Ok(ReceivedPacket {
            header,
            payload,
            snr,
            rssi,
            valid_header_count,
            valid_packet_count,
        })
    }

    /// Services one DIO0 interrupt.
    ///
    /// Reads `RegIrqFlags`; on `RxDone` assembles the packet. The flags are
    /// cleared afterwards in every case, even when reading failed, so the
    /// interrupt line is released. Errors are not retried: the packet is lost.
    pub async fn handle_interrupt(
        &mut self,
    ) -> Result<Option<ReceivedPacket>, SxError<TSPIERR, TPINERR>> {
        let received = self.receive_on_irq().await;
        let cleared = self.clear_irq_status().await;
        if let Err(err) = &received {
            log::warn!("lora::handle_interrupt dropped packet: {err:?}");
        }
        let packet = received?;
        cleared?;
        Ok(packet)
    }

    async fn receive_on_irq(
        &mut self,
    ) -> Result<Option<ReceivedPacket>, SxError<TSPIERR, TPINERR>> {
        let status = self.get_irq_status().await?;
        log::debug!("lora::irq {status}");

        if !status.valid() {
            log::trace!("lora::irq empty interrupt");
            return Ok(None);
        }
        if !status.rx_done() {
            return Ok(None);
        }
        if status.payload_crc_error() {
            log::warn!("lora::irq payload CRC error flagged");
        }
        self.read_packet().await.map(Some)
    }

    async fn read_u16(
        &mut self,
        msb: Register,
        lsb: Register,
    ) -> Result<u16, SxError<TSPIERR, TPINERR>> {
        let msb = self.read_register(msb).await?;
        let lsb = self.read_register(lsb).await?;
        Ok(u16::from_be_bytes([msb, lsb]))
    }
}

/// Decodes the modem configuration read back after writing `expected` and
/// warns if the chip did not take it.
fn verify_modem_config(expected: &ModemConfig, raw: [u8; 2]) -> bool {
    match ModemConfig::try_from(raw) {
        Ok(actual) if actual == *expected => {
            log::trace!("lora::init modem config set. {actual:?}");
            true
        }
        Ok(actual) => {
            log::warn!("lora::init modem config reads back as {actual:?}, expected {expected:?}");
            false
        }
        Err(err) => {
            log::warn!("lora::init modem config read-back: {err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use core::cell::RefCell;

    use embassy_futures::block_on;

    use super::*;
    use crate::sim::{Access, SimChip, SimDelay, SimError, SimResetPin, SimSpi};

    const HELLO: [u8; 9] = [1, 2, 3, 4, b'H', b'e', b'l', b'l', b'o'];

    type Radio<'a> = SX127x<SimSpi<'a>, SimResetPin<'a>, SimDelay<'a>>;

    fn radio(chip: &RefCell<SimChip>) -> Radio<'_> {
        SX127x::new(
            SimSpi::new(chip),
            SimResetPin::new(chip),
            SimDelay::new(chip),
        )
    }

    fn ready(chip: &RefCell<SimChip>) -> Radio<'_> {
        let mut radio = radio(chip);
        block_on(radio.init(&Config::default())).unwrap();
        chip.borrow_mut().clear_log();
        radio
    }

    fn read(register: Register) -> Access {
        Access::Read(register as u8)
    }

    fn write(register: Register, value: u8) -> Access {
        Access::Write(register as u8, value)
    }

    #[test]
    fn init_enters_continuous_rx() {
        let chip = RefCell::new(SimChip::new());
        let mut radio = radio(&chip);
        block_on(radio.init(&Config::default())).unwrap();

        let chip = chip.borrow();
        assert_eq!(chip.resets(), 1);
        assert!(!chip.in_reset());
        assert!(chip.delayed_ns() >= 260_000_000);
        assert_eq!(radio.mode(), Some(OperatingMode::RxContinuous));

        assert_eq!(chip.register(Register::OpMode), 0x85);
        assert_eq!(chip.register(Register::FrfMsb), 0xD9);
        assert_eq!(chip.register(Register::FrfMid), 0x00);
        assert_eq!(chip.register(Register::FrfLsb), 0x00);
        assert_eq!(chip.register(Register::ModemConfig1), 0x72);
        assert_eq!(chip.register(Register::ModemConfig2), 0x74);
        assert_eq!(chip.register(Register::FifoTxBaseAddr), 0x00);
        assert_eq!(chip.register(Register::FifoRxBaseAddr), 0x00);
        assert_eq!(chip.register(Register::DioMapping1), 0x00);
    }

    #[test]
    fn init_writes_in_order() {
        let chip = RefCell::new(SimChip::new());
        let mut radio = radio(&chip);
        let conf = Config {
            frequency_mhz: 915.0,
            modem: ModemPreset::SlowLong1.config(),
            ..Config::default()
        };
        block_on(radio.init(&conf)).unwrap();

        let writes: Vec<Access> = chip
            .borrow()
            .writes()
            .map(|(addr, value)| Access::Write(addr, value))
            .collect();
        assert_eq!(
            writes,
            vec![
                write(Register::OpMode, 0x80),
                write(Register::OpMode, 0x81),
                write(Register::FifoRxBaseAddr, 0x00),
                write(Register::FifoTxBaseAddr, 0x00),
                write(Register::FrfMsb, 0xE4),
                write(Register::FrfMid, 0xC0),
                write(Register::FrfLsb, 0x00),
                write(Register::ModemConfig1, 0x48),
                write(Register::ModemConfig2, 0x94),
                write(Register::OpMode, 0x85),
                write(Register::DioMapping1, 0x00),
            ]
        );
    }

    #[test]
    fn init_reads_modem_config_back() {
        let chip = RefCell::new(SimChip::new());
        let mut radio = radio(&chip);
        block_on(radio.init(&Config::default())).unwrap();

        let modem: Vec<Access> = chip
            .borrow()
            .log()
            .iter()
            .copied()
            .filter(|access| {
                matches!(access, Access::Read(addr) | Access::Write(addr, _)
                    if *addr == Register::ModemConfig1 as u8 || *addr == Register::ModemConfig2 as u8)
            })
            .collect();
        assert_eq!(
            modem,
            vec![
                read(Register::ModemConfig1),
                read(Register::ModemConfig2),
                write(Register::ModemConfig1, 0x72),
                write(Register::ModemConfig2, 0x74),
                read(Register::ModemConfig1),
                read(Register::ModemConfig2),
            ]
        );
    }

    #[test]
    fn modem_read_back_is_verified() {
        let expected = ModemPreset::Default.config();
        assert!(verify_modem_config(&expected, [0x72, 0x74]));
        // CRC bit lost.
        assert!(!verify_modem_config(&expected, [0x72, 0x70]));
        // Reserved bandwidth.
        assert!(!verify_modem_config(&expected, [0xF2, 0x74]));
    }

    #[test]
    fn reset_delays_do_not_hold_the_bus() {
        let chip = RefCell::new(SimChip::new());
        let mut radio = radio(&chip);
        block_on(radio.init(&Config::default())).unwrap();

        assert!(chip.borrow().delayed_ns() >= 260_000_000);
        assert_eq!(chip.borrow().cs_held_ns(), 0);
    }

    #[test]
    fn init_verifies_version_before_writing() {
        let chip = RefCell::new(SimChip::with_version(0x22));
        let mut radio = radio(&chip);

        let err = block_on(radio.init(&Config::default())).unwrap_err();
        assert!(matches!(err, SxError::UnknownVersion(0x22)));
        assert_eq!(chip.borrow().writes().count(), 0);
        assert_eq!(radio.mode(), None);
    }

    #[test]
    fn init_rejects_frequency_out_of_band() {
        let chip = RefCell::new(SimChip::new());
        let mut radio = radio(&chip);
        let conf = Config {
            frequency_mhz: 1100.0,
            ..Config::default()
        };

        let err = block_on(radio.init(&conf)).unwrap_err();
        assert!(matches!(err, SxError::Frequency(FrequencyError { mhz }) if mhz == 1100.0));
        assert_eq!(chip.borrow().resets(), 0);
        assert!(chip.borrow().log().is_empty());
    }

    #[test]
    fn set_frequency_rejects_without_writing() {
        let chip = RefCell::new(SimChip::new());
        let mut radio = radio(&chip);

        for mhz in [f64::NAN, -5.0, 1100.0] {
            let err = block_on(radio.set_frequency(mhz)).unwrap_err();
            assert!(matches!(err, SxError::Frequency(_)));
        }
        assert_eq!(chip.borrow().writes().count(), 0);
        assert_eq!(chip.borrow().register(Register::FrfMsb), 0x6C);
    }

    #[test]
    fn frequency_reads_back() {
        let chip = RefCell::new(SimChip::new());
        let mut radio = radio(&chip);

        block_on(radio.set_frequency(915.0)).unwrap();
        let mhz = block_on(radio.get_frequency()).unwrap();
        assert!((mhz - 915.0).abs() < 1e-4);
    }

    #[test]
    fn write_register_returns_previous_value() {
        let chip = RefCell::new(SimChip::new());
        let mut radio = radio(&chip);

        assert_eq!(block_on(radio.write_register(Register::FrfLsb, 0x11)).unwrap(), 0x00);
        assert_eq!(block_on(radio.write_register(Register::FrfLsb, 0x22)).unwrap(), 0x11);
        assert_eq!(block_on(radio.read_register(Register::FrfLsb)).unwrap(), 0x22);
    }

    #[test]
    fn interrupt_yields_packet_and_clears_flags() {
        let chip = RefCell::new(SimChip::new());
        let mut radio = ready(&chip);
        // SNR +6 dB, RSSI -57 dBm.
        chip.borrow_mut().receive(&HELLO, 24, 80);

        let packet = block_on(radio.handle_interrupt()).unwrap().unwrap();
        assert_eq!(
            packet.header,
            PacketHeader {
                source: 1,
                destination: 2,
                id: 3,
                flags: 4
            }
        );
        assert_eq!(packet.payload_str(), Some("Hello"));
        assert_eq!(packet.snr, 24);
        assert_eq!(packet.snr_db(), 6.0);
        assert_eq!(packet.rssi, -57);
        assert_eq!(packet.valid_header_count, 1);
        assert_eq!(packet.valid_packet_count, 1);
        assert_eq!(chip.borrow().register(Register::IrqFlags), 0x00);
    }

    #[test]
    fn pipeline_accesses_in_order() {
        let chip = RefCell::new(SimChip::new());
        let mut radio = ready(&chip);
        chip.borrow_mut().receive(&HELLO, 0, 100);
        block_on(radio.handle_interrupt()).unwrap().unwrap();

        // Second packet lands behind the first, so the rewind is visible.
        chip.borrow_mut().clear_log();
        chip.borrow_mut().receive(&HELLO, 0, 100);
        let start = chip.borrow().register(Register::FifoRxCurrentAddr);
        assert_eq!(start, HELLO.len() as u8);
        block_on(radio.handle_interrupt()).unwrap().unwrap();

        let mut expected = vec![
            read(Register::IrqFlags),
            read(Register::RxNbBytes),
            read(Register::FifoRxCurrentAddr),
            write(Register::FifoAddrPtr, start),
        ];
        expected.extend([read(Register::Fifo); HELLO.len()]);
        expected.extend([
            read(Register::RxHeaderCntValueMsb),
            read(Register::RxHeaderCntValueLsb),
            read(Register::RxPacketCntValueMsb),
            read(Register::RxPacketCntValueLsb),
            read(Register::PktSnrValue),
            read(Register::PktRssiValue),
            write(Register::IrqFlags, CLEAR_ALL),
        ]);
        assert_eq!(chip.borrow().log(), expected.as_slice());
    }

    #[test]
    fn counters_combine_msb_and_lsb() {
        let chip = RefCell::new(SimChip::new());
        let mut radio = ready(&chip);
        chip.borrow_mut().set_register(Register::RxHeaderCntValueMsb, 0x01);
        chip.borrow_mut().set_register(Register::RxHeaderCntValueLsb, 0xFF);
        chip.borrow_mut().receive(&HELLO, 0, 100);

        let packet = block_on(radio.handle_interrupt()).unwrap().unwrap();
        assert_eq!(packet.valid_header_count, 0x0200);
        assert_eq!(packet.valid_packet_count, 1);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "access log full")]
    fn full_access_log_is_reported() {
        let chip = RefCell::new(SimChip::new());
        let mut radio = ready(&chip);

        for _ in 0..=crate::sim::LOG_CAPACITY {
            let _ = block_on(radio.read_register(Register::Version));
        }
    }

    #[test]
    fn consecutive_packets_rewind_fifo_pointer() {
        let chip = RefCell::new(SimChip::new());
        let mut radio = ready(&chip);

        chip.borrow_mut().receive(&HELLO, 0, 100);
        block_on(radio.handle_interrupt()).unwrap().unwrap();

        chip.borrow_mut().receive(&[9, 8, 7, 6, b'h', b'i'], 0, 100);
        let packet = block_on(radio.handle_interrupt()).unwrap().unwrap();
        assert_eq!(packet.header.source, 9);
        assert_eq!(packet.payload_str(), Some("hi"));
        assert_eq!(packet.valid_packet_count, 2);
    }

    #[test]
    fn header_only_packet_has_empty_payload() {
        let chip = RefCell::new(SimChip::new());
        let mut radio = ready(&chip);
        chip.borrow_mut().receive(&[1, 2, 3, 4], 0, 100);

        let packet = block_on(radio.handle_interrupt()).unwrap().unwrap();
        assert!(packet.payload.is_empty());
    }

    #[test]
    fn short_packet_is_a_framing_error_and_still_clears() {
        let chip = RefCell::new(SimChip::new());
        let mut radio = ready(&chip);
        chip.borrow_mut().receive(&[1, 2, 3], 0, 100);

        let err = block_on(radio.handle_interrupt()).unwrap_err();
        assert!(matches!(err, SxError::Framing(FramingError { len: 3 })));

        let chip = chip.borrow();
        assert_eq!(chip.register(Register::IrqFlags), 0x00);
        assert_eq!(chip.writes().last(), Some((Register::IrqFlags as u8, 0xFF)));
        assert!(!chip
            .log()
            .contains(&read(Register::RxPacketCntValueMsb)));
    }

    #[test]
    fn bus_failure_still_clears() {
        let chip = RefCell::new(SimChip::new());
        let mut radio = ready(&chip);
        chip.borrow_mut().receive(&HELLO, 0, 100);
        chip.borrow_mut().fail_on(Some(Register::RxNbBytes));

        let err = block_on(radio.handle_interrupt()).unwrap_err();
        assert!(matches!(
            err,
            SxError::Spi(SpiError::Transfer(SimError::Injected(0x13)))
        ));
        assert_eq!(chip.borrow().register(Register::IrqFlags), 0x00);
    }

    #[test]
    fn empty_interrupt_is_none() {
        let chip = RefCell::new(SimChip::new());
        let mut radio = ready(&chip);

        assert_eq!(block_on(radio.handle_interrupt()).unwrap(), None);
        assert_eq!(
            chip.borrow().log(),
            &[read(Register::IrqFlags), write(Register::IrqFlags, CLEAR_ALL)]
        );
    }

    #[test]
    fn non_rx_interrupt_is_none() {
        let chip = RefCell::new(SimChip::new());
        let mut radio = ready(&chip);
        chip.borrow_mut().raise(&[IrqFlag::ValidHeader]);

        assert_eq!(block_on(radio.handle_interrupt()).unwrap(), None);
        assert_eq!(chip.borrow().register(Register::IrqFlags), 0x00);
    }

    #[test]
    fn crc_error_packet_is_still_delivered() {
        let chip = RefCell::new(SimChip::new());
        let mut radio = ready(&chip);
        chip.borrow_mut().receive(&HELLO, 0, 100);
        chip.borrow_mut().raise(&[IrqFlag::PayloadCrcError]);

        let packet = block_on(radio.handle_interrupt()).unwrap().unwrap();
        assert_eq!(packet.payload_str(), Some("Hello"));
    }

    #[test]
    fn reset_forgets_mode() {
        let chip = RefCell::new(SimChip::new());
        let mut radio = ready(&chip);

        block_on(radio.reset()).unwrap();
        assert_eq!(radio.mode(), None);
        assert!(!chip.borrow().in_reset());
        assert_eq!(chip.borrow().register(Register::OpMode), 0x09);
        assert_eq!(chip.borrow().resets(), 2);
    }
}
