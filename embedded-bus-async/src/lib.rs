#![cfg_attr(not(test), no_std)]
#![doc = "Asynchronous shared SPI bus for embedded-hal."]

// For the official Embassy implementation, see:
// - https://github.com/embassy-rs/embassy/tree/main/embassy-embedded-hal/src/shared_bus

pub mod spi;
