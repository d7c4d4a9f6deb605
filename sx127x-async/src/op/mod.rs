//! Register encodings and decoded values used by the driver.

pub mod freq;
pub mod irq;
pub mod mode;
pub mod modem;
pub mod packet;

pub use freq::*;
pub use irq::*;
pub use mode::*;
pub use modem::*;
pub use packet::*;
