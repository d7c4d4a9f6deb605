//! An asynchronous, `no_std` LoRa receive gateway for RFM95/SX1276 modules.
//!
//! [`gateway::LoraGateway`] owns an `sx127x_async` driver behind a mutex,
//! brings it into continuous reception and turns every DIO0 interrupt into a
//! [`sx127x_async::op::ReceivedPacket`]. Interrupts reach it as
//! [`irq::IrqEvent`]s over a channel, fed either by an awaited `Wait` pin or
//! by a synchronous edge callback.
//!
//! # Usage
//!
//! ```ignore
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
//! use embassy_sync::mutex::Mutex;
//! use embedded_bus_async::spi::SharedSpiDevice;
//! use rfm95_gateway_async::conf::GatewayConfig;
//! use rfm95_gateway_async::gateway::LoraGateway;
//! use rfm95_gateway_async::irq::{IrqChannel, IrqLine, ShutdownSignal};
//!
//! static EVENTS: IrqChannel<8> = IrqChannel::new();
//! static SHUTDOWN: ShutdownSignal = ShutdownSignal::new();
//!
//! async fn gateway_task(spi_bus: SpiBus, cs: Output, rst: Output, mut dio0: Input, delay: Delay) {
//!     let bus = Mutex::<CriticalSectionRawMutex, _>::new(spi_bus);
//!     let spi = SharedSpiDevice::new(&bus, cs, delay.clone()).unwrap();
//!     let gateway = LoraGateway::new(spi, rst, delay);
//!
//!     let config = GatewayConfig {
//!         frequency_mhz: 868.1,
//!         preset: "slow_long_1".parse().unwrap(),
//!     };
//!     gateway.init(&config).await.unwrap();
//!
//!     let line = IrqLine::new(EVENTS.sender());
//!     embassy_futures::join::join(
//!         line.forward(&mut dio0),
//!         gateway.run(EVENTS.receiver(), &SHUTDOWN, |packet| {
//!             log::info!("{packet}");
//!         }),
//!     )
//!     .await;
//! }
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

/// Gateway configuration surface.
pub mod conf;
/// The receive gateway.
pub mod gateway;
/// Interrupt line forwarding and shutdown signalling.
pub mod irq;
