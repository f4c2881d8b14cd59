// Licensed under the Apache-2.0 license

//! I2C register map and bit-field constants.
//!
//! Only the registers the controller-mode write path touches are mapped.
//! The contract is bit-exact with the hardware: SADD/NBYTES placement,
//! RELOAD/AUTOEND/START control bits and the polled status flags.

use crate::regs::register_map;

register_map! {
    /// I2C registers used by this crate.
    pub enum I2cReg {
        /// Control register 1
        Cr1 = 0x00,
        /// Control register 2 (address phase, byte count, start control)
        Cr2 = 0x04,
        /// Timing register
        Timingr = 0x10,
        /// Interrupt and status register (read-only, polled)
        Isr = 0x18,
        /// Transmit data register
        Txdr = 0x28,
    }
}

/// CR1 bits.
pub mod cr1 {
    /// Peripheral enable
    pub const PE: u32 = 1 << 0;
}

/// CR2 bits and fields.
pub mod cr2 {
    /// Target address, SADD\[9:0\]. 7-bit addresses occupy SADD\[7:1\].
    pub const SADD_MASK: u32 = 0x3FF;
    /// Transfer direction; clear = write
    pub const RD_WRN: u32 = 1 << 10;
    /// 10-bit addressing select
    pub const ADD10: u32 = 1 << 11;
    /// 10-bit header-only select (read direction only; clear for writes)
    pub const HEAD10R: u32 = 1 << 12;
    /// Start generation
    pub const START: u32 = 1 << 13;
    /// Byte count field position, NBYTES\[7:0\] at bits 23:16
    pub const NBYTES_SHIFT: u32 = 16;
    /// Byte count field mask
    pub const NBYTES_MASK: u32 = 0xFF << NBYTES_SHIFT;
    /// Transfer continuation: a further NBYTES reload follows this segment
    pub const RELOAD: u32 = 1 << 24;
    /// Automatic STOP after the last byte of this segment
    pub const AUTOEND: u32 = 1 << 25;
}

/// ISR flags.
pub mod isr {
    /// Transmit buffer empty, ready for the next byte
    pub const TXIS: u32 = 1 << 1;
    /// NACK received
    pub const NACKF: u32 = 1 << 4;
}
