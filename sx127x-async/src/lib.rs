//! An asynchronous, `no_std` driver for the Semtech SX1276 family of LoRa transceivers
//! (HopeRF RFM95/96 modules).
//!
//! Unlike the command-based SX126x parts, the SX127x is configured through a flat
//! map of 8-bit registers. Every register access is a two byte SPI exchange:
//! `[address, 0x00]` for a read and `[address | 0x80, value]` for a write.
//!
//! The main entry point is the [`SX127x`] struct, which takes an async SPI device,
//! the reset pin and a delay provider. It covers:
//!
//! - register access, including FIFO burst reads ([`SX127x::read_register`],
//!   [`SX127x::write_register`], [`SX127x::burst_read`]),
//! - the frequency synthesizer math ([`op::freq`]),
//! - the modem configuration encoder and its named presets ([`op::modem`]),
//! - operating mode transitions ([`op::mode`]),
//! - interrupt flag decoding ([`op::irq`]),
//! - the receive pipeline that turns an RxDone interrupt into a
//!   [`op::packet::ReceivedPacket`] ([`SX127x::handle_interrupt`]).
//!
//! # Usage
//!
//! See the `rfm95-gateway-async` crate for a receive loop built on top of this
//! driver and a shared SPI bus.

#![cfg_attr(not(test), no_std)]

pub mod conf;
pub mod op;
pub mod reg;
#[cfg(any(test, feature = "sim"))]
pub mod sim;

mod sx;
pub use sx::*;
