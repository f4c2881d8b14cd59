// Licensed under the Apache-2.0 license

//! Reset and clock control (RCC).
//!
//! Peripheral clocks are gated off after reset; a peripheral's gate must be
//! opened before its registers respond. The I2C driver additionally pulses
//! the instance's APB1 reset line during initialization.

use crate::gpio::GpioPort;
use crate::i2c::I2cInstance;
use crate::regs::{register_map, Mmio, RegisterBank};

/// RCC register block base address.
pub const RCC_BASE: usize = 0x4002_1000;

register_map! {
    /// RCC registers used by this crate.
    pub enum RccReg {
        /// APB1 peripheral reset register
        Apb1rstr = 0x10,
        /// AHB peripheral clock enable register
        Ahbenr = 0x14,
        /// APB1 peripheral clock enable register
        Apb1enr = 0x1C,
    }
}

/// Reset and clock control unit.
pub struct Rcc<B: RegisterBank<Reg = RccReg>> {
    pub(crate) regs: B,
}

impl Rcc<Mmio<RccReg>> {
    /// Bind the RCC block at its fixed address.
    ///
    /// # Safety
    ///
    /// The caller must ensure this is the only live RCC handle; concurrent
    /// access from another context is undefined.
    #[must_use]
    pub unsafe fn new() -> Self {
        Self::from_bank(unsafe { Mmio::new(RCC_BASE) })
    }
}

impl<B: RegisterBank<Reg = RccReg>> Rcc<B> {
    /// Wrap an arbitrary register bank (mock banks in tests).
    pub fn from_bank(regs: B) -> Self {
        Self { regs }
    }

    /// Open the clock gate for a GPIO port.
    pub fn enable_gpio(&mut self, port: GpioPort) {
        self.regs
            .modify(RccReg::Ahbenr, |v| v | port.ahb_enable_mask());
    }

    /// Open the clock gate for an I2C instance.
    pub fn enable_i2c(&mut self, instance: I2cInstance) {
        self.regs
            .modify(RccReg::Apb1enr, |v| v | instance.apb1_mask());
    }

    /// Pulse the APB1 reset line for an I2C instance.
    pub fn reset_i2c(&mut self, instance: I2cInstance) {
        self.regs
            .modify(RccReg::Apb1rstr, |v| v | instance.apb1_mask());
        self.regs
            .modify(RccReg::Apb1rstr, |v| v & !instance.apb1_mask());
    }
}
