// Licensed under the Apache-2.0 license

//! I2C controller driver.
//!
//! Controller-mode (formerly "master") write support for the on-chip I2C
//! peripherals, designed for bare-metal `no_std` use. The driver is
//! generic over the crate's register surface so the protocol engines run
//! unchanged against mock register banks on the host.

pub mod common;
pub mod controller;
pub mod regs;

pub use common::{Error, I2cInstance, I2cSpeed, TimingFields};
pub use controller::I2cController;
