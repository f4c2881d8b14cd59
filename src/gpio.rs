// Licensed under the Apache-2.0 license

//! GPIO pin configuration.
//!
//! Field-level wrappers over a port's configuration registers: pin mode,
//! output type, pull resistors and alternate-function mapping. The I2C
//! bring-up path uses these to hand the bus pins to the peripheral
//! (open-drain, pull-up, AF4 on the F3 parts).

use crate::regs::{register_map, Mmio, RegisterBank};

register_map! {
    /// GPIO port registers used by this crate.
    pub enum GpioReg {
        /// Mode register
        Moder = 0x00,
        /// Output type register
        Otyper = 0x04,
        /// Pull-up/pull-down register
        Pupdr = 0x0C,
        /// Alternate function low register (pins 0..=7)
        Afrl = 0x20,
        /// Alternate function high register (pins 8..=15)
        Afrh = 0x24,
    }
}

/// GPIO ports A..=H.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GpioPort {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
}

impl GpioPort {
    /// Base address of the port's register block.
    #[must_use]
    pub const fn base(self) -> usize {
        0x4800_0000 + 0x400 * self as usize
    }

    /// The port's clock enable bit in RCC AHBENR.
    ///
    /// Port H sits below port A in this register (bit 16), the rest follow
    /// in order from bit 17.
    #[must_use]
    pub const fn ahb_enable_mask(self) -> u32 {
        match self {
            GpioPort::H => 1 << 16,
            _ => 1 << (17 + self as u32),
        }
    }
}

/// Pin mode field values (MODER, 2 bits per pin).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PinMode {
    Input = 0b00,
    Output = 0b01,
    Alternate = 0b10,
    Analog = 0b11,
}

/// Output driver field values (OTYPER, 1 bit per pin).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputType {
    PushPull = 0,
    OpenDrain = 1,
}

/// Pull resistor field values (PUPDR, 2 bits per pin).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Pull {
    None = 0b00,
    Up = 0b01,
    Down = 0b10,
}

/// Alternate function numbers (AFRL/AFRH, 4 bits per pin).
///
/// The discriminants are the exact field values, so the mapping from
/// function to bit pattern is the enum itself rather than a branch per
/// variant.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum AltFunction {
    Af0 = 0,
    Af1 = 1,
    Af2 = 2,
    Af3 = 3,
    Af4 = 4,
    Af5 = 5,
    Af6 = 6,
    Af7 = 7,
    Af8 = 8,
    Af9 = 9,
    Af10 = 10,
    Af11 = 11,
    Af12 = 12,
    Af13 = 13,
    Af14 = 14,
    Af15 = 15,
}

/// One GPIO port.
pub struct Gpio<B: RegisterBank<Reg = GpioReg>> {
    regs: B,
}

impl Gpio<Mmio<GpioReg>> {
    /// Bind a port's register block at its fixed address.
    ///
    /// # Safety
    ///
    /// The caller must ensure this is the only live handle for `port` and
    /// that the port clock is enabled before any configuration call.
    #[must_use]
    pub unsafe fn new(port: GpioPort) -> Self {
        Self::from_bank(unsafe { Mmio::new(port.base()) })
    }
}

impl<B: RegisterBank<Reg = GpioReg>> Gpio<B> {
    /// Wrap an arbitrary register bank (mock banks in tests).
    pub fn from_bank(regs: B) -> Self {
        Self { regs }
    }

    /// Set a pin's mode. `pin` must be 0..=15.
    pub fn set_mode(&mut self, pin: u8, mode: PinMode) {
        assert!(pin < 16);
        let shift = 2 * u32::from(pin);
        self.regs.modify(GpioReg::Moder, |v| {
            (v & !(0b11 << shift)) | (u32::from(mode as u8) << shift)
        });
    }

    /// Set a pin's output driver type. `pin` must be 0..=15.
    pub fn set_output_type(&mut self, pin: u8, ty: OutputType) {
        assert!(pin < 16);
        let shift = u32::from(pin);
        self.regs.modify(GpioReg::Otyper, |v| {
            (v & !(1 << shift)) | (u32::from(ty as u8) << shift)
        });
    }

    /// Set a pin's pull resistor. `pin` must be 0..=15.
    pub fn set_pull(&mut self, pin: u8, pull: Pull) {
        assert!(pin < 16);
        let shift = 2 * u32::from(pin);
        self.regs.modify(GpioReg::Pupdr, |v| {
            (v & !(0b11 << shift)) | (u32::from(pull as u8) << shift)
        });
    }

    /// Route a pin to an alternate function. `pin` must be 0..=15.
    ///
    /// Pins 0..=7 live in AFRL, pins 8..=15 in AFRH, one nibble each.
    pub fn set_alternate_function(&mut self, pin: u8, af: AltFunction) {
        assert!(pin < 16);
        let reg = if pin < 8 { GpioReg::Afrl } else { GpioReg::Afrh };
        let shift = 4 * u32::from(pin % 8);
        self.regs.modify(reg, |v| {
            (v & !(0xF << shift)) | (u32::from(af as u8) << shift)
        });
    }
}
