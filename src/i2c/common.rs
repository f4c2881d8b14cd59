// Licensed under the Apache-2.0 license

//! Common types for the I2C driver: instance identity, speed grades,
//! timing field constants and the driver error type.

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

/// The physical I2C controllers on the part.
///
/// Instance identity selects the register block base address and the
/// reset/enable bit positions in RCC, so driving the wrong instance is a
/// matter of passing the wrong variant, never of a stale global pointer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum I2cInstance {
    I2c1,
    I2c2,
    I2c3,
}

impl I2cInstance {
    /// Base address of the instance's register block.
    #[must_use]
    pub const fn base(self) -> usize {
        match self {
            I2cInstance::I2c1 => 0x4000_5400,
            I2cInstance::I2c2 => 0x4000_5800,
            I2cInstance::I2c3 => 0x4000_7800,
        }
    }

    /// The instance's bit in RCC APB1RSTR and APB1ENR.
    #[must_use]
    pub const fn apb1_mask(self) -> u32 {
        match self {
            I2cInstance::I2c1 => 1 << 21,
            I2cInstance::I2c2 => 1 << 22,
            I2cInstance::I2c3 => 1 << 30,
        }
    }
}

/// Bus speed grades. The discriminant is the SCL frequency in Hz.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum I2cSpeed {
    Standard = 100_000,
    Fast = 400_000,
    FastPlus = 500_000,
}

impl I2cSpeed {
    /// SCL frequency in Hz.
    #[must_use]
    pub const fn hertz(self) -> u32 {
        self as u32
    }

    /// Timing fields for this grade.
    ///
    /// Constants, not a runtime computation: the kernel clock is the fixed
    /// 8 MHz HSI, so each grade's fields are derived once (reference manual
    /// table 149 for an 8 MHz I2CCLK).
    #[must_use]
    pub const fn timing(self) -> TimingFields {
        match self {
            I2cSpeed::Standard => STANDARD_TIMING,
            I2cSpeed::Fast => FAST_TIMING,
            I2cSpeed::FastPlus => FAST_PLUS_TIMING,
        }
    }
}

/// The timing register field tuple.
///
/// Each field occupies a disjoint bit range of TIMINGR; periods are counted
/// in prescaled kernel clock ticks (125 ns at 8 MHz with PRESC = 0).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimingFields {
    /// Timing prescaler, PRESC\[3:0\]
    pub presc: u8,
    /// Data setup time, SCLDEL\[3:0\]
    pub scldel: u8,
    /// Data hold time, SDADEL\[3:0\]
    pub sdadel: u8,
    /// SCL high period, SCLH\[7:0\]
    pub sclh: u8,
    /// SCL low period, SCLL\[7:0\]
    pub scll: u8,
}

impl TimingFields {
    /// Pack the fields into a TIMINGR value.
    #[must_use]
    pub const fn register_value(self) -> u32 {
        (self.presc as u32) << 28
            | (self.scldel as u32) << 20
            | (self.sdadel as u32) << 16
            | (self.sclh as u32) << 8
            | self.scll as u32
    }
}

/// 100 kHz: 250 ns ticks, SCL low 5.0 us / high 4.0 us.
pub const STANDARD_TIMING: TimingFields = TimingFields {
    presc: 1,
    scldel: 4,
    sdadel: 2,
    sclh: 15,
    scll: 19,
};

/// 400 kHz: 125 ns ticks, SCL low 1.25 us / high 0.5 us.
pub const FAST_TIMING: TimingFields = TimingFields {
    presc: 0,
    scldel: 3,
    sdadel: 1,
    sclh: 3,
    scll: 9,
};

/// 500 kHz: 125 ns ticks, SCL low 875 ns / high 0.5 us.
pub const FAST_PLUS_TIMING: TimingFields = TimingFields {
    presc: 0,
    scldel: 1,
    sdadel: 0,
    sclh: 3,
    scll: 6,
};

/// Controller-mode write failures.
///
/// All failures are returned to the caller; the driver never retries
/// internally.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Target address above the 10-bit range; rejected before any register
    /// access.
    InvalidAddress,
    /// Target signalled NACK mid-transfer. Some prefix of the payload,
    /// possibly empty, was sent; the peripheral manages bus release.
    Nack,
    /// A handshake flag never arrived within the poll budget.
    Timeout,
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::Nack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            Error::InvalidAddress | Error::Timeout => ErrorKind::Other,
        }
    }
}
