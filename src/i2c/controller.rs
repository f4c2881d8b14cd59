// Licensed under the Apache-2.0 license

//! I2C controller-mode driver.
//!
//! Two engines over the register surface: initialization loads the timing
//! fields for a speed grade and enables the peripheral; the write path
//! drives a controller-mode transmit transaction, segmented to fit the
//! 8-bit NBYTES counter, with RELOAD continuation between segments and an
//! automatic STOP after the final one.

use crate::i2c::common::{Error, I2cInstance, I2cSpeed};
use crate::i2c::regs::{cr1, cr2, isr, I2cReg};
use crate::rcc::{Rcc, RccReg};
use crate::regs::{Mmio, RegisterBank};

/// Largest transfer segment NBYTES can describe.
pub const MAX_SEGMENT_BYTES: usize = 255;

/// Largest valid 10-bit target address.
pub const MAX_TARGET_ADDRESS: u16 = 0x3FF;

/// Largest 7-bit target address; anything above selects 10-bit addressing.
pub const MAX_SEVEN_BIT_ADDRESS: u16 = 0x7F;

/// Poll iterations allowed per handshake flag before giving up.
///
/// The handshake waits are busy loops; a stuck bus (endless clock
/// stretching, wiring fault) would otherwise hang the calling context
/// forever, so the wait is bounded and surfaces [`Error::Timeout`].
pub const POLL_BUDGET: u32 = 100_000;

/// One I2C controller instance.
pub struct I2cController<B: RegisterBank<Reg = I2cReg>> {
    pub(crate) regs: B,
    instance: I2cInstance,
}

macro_rules! instance_constructors {
    ($($inst:ident),* $(,)?) => {
        paste::paste! {
            impl I2cController<Mmio<I2cReg>> {
                $(
                    #[doc = concat!(
                        "Bind ", stringify!($inst),
                        " at its fixed register block address."
                    )]
                    ///
                    /// # Safety
                    ///
                    /// The caller must ensure this is the only live handle
                    /// for the instance; the driver provides no mutual
                    /// exclusion, so concurrent calls into one instance
                    /// from several contexts are undefined.
                    #[must_use]
                    pub unsafe fn [<$inst:lower>]() -> Self {
                        Self::new(
                            unsafe { Mmio::new(I2cInstance::$inst.base()) },
                            I2cInstance::$inst,
                        )
                    }
                )*
            }
        }
    };
}

instance_constructors!(I2c1, I2c2, I2c3);

impl<B: RegisterBank<Reg = I2cReg>> I2cController<B> {
    /// Wrap a register bank for `instance` (mock banks in tests).
    pub fn new(regs: B, instance: I2cInstance) -> Self {
        Self { regs, instance }
    }

    /// Which physical controller this handle drives.
    #[must_use]
    pub fn instance(&self) -> I2cInstance {
        self.instance
    }

    /// Initialize the controller for a speed grade.
    ///
    /// The instance's clock gate must already be open
    /// ([`Rcc::enable_i2c`]). Pulses the instance's APB1 reset line, loads
    /// the grade's timing fields and enables the peripheral.
    ///
    /// The timing register is written whole, never OR-ed into retained
    /// contents: re-initializing from one grade to another must not leave
    /// stale field bits behind.
    pub fn init<R: RegisterBank<Reg = RccReg>>(&mut self, rcc: &mut Rcc<R>, speed: I2cSpeed) {
        rcc.reset_i2c(self.instance);
        self.regs
            .write(I2cReg::Timingr, speed.timing().register_value());
        self.regs.modify(I2cReg::Cr1, |v| v | cr1::PE);
    }

    /// Controller-mode write of `data` to `addr`.
    ///
    /// `addr` is a 7-bit or 10-bit target address; values above 1023 are
    /// rejected before any register access. The payload is issued in
    /// segments of at most [`MAX_SEGMENT_BYTES`]; every segment re-asserts
    /// START with the address phase, RELOAD marks continuation, and the
    /// final segment (only) selects the automatic STOP. An empty payload
    /// issues a single zero-byte final segment.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidAddress`] for an out-of-range address,
    /// [`Error::Nack`] if the target rejects a byte (terminal for the
    /// call; retry belongs to the caller), [`Error::Timeout`] if a
    /// handshake flag never arrives within [`POLL_BUDGET`].
    pub fn write(&mut self, addr: u16, data: &[u8]) -> Result<(), Error> {
        let header = Self::address_phase(addr)?;

        if data.is_empty() {
            self.start_segment(header, 0, true);
            return Ok(());
        }

        let mut segments = data.chunks(MAX_SEGMENT_BYTES).peekable();
        while let Some(segment) = segments.next() {
            // A NACK for the final byte of the previous segment surfaces
            // before the next segment is issued.
            if self.regs.read(I2cReg::Isr) & isr::NACKF != 0 {
                return Err(Error::Nack);
            }

            let last = segments.peek().is_none();
            self.start_segment(header, segment.len() as u8, last);

            for &byte in segment {
                self.wait_transmit_ready()?;
                self.regs.write(I2cReg::Txdr, byte.into());
            }
        }

        Ok(())
    }

    /// CR2 address-phase bits for `addr`, direction fixed to write.
    fn address_phase(addr: u16) -> Result<u32, Error> {
        if addr > MAX_TARGET_ADDRESS {
            return Err(Error::InvalidAddress);
        }
        if addr <= MAX_SEVEN_BIT_ADDRESS {
            // 7-bit header: address in SADD[7:1], ADD10 clear
            Ok(u32::from(addr) << 1)
        } else {
            // complete 10-bit header: address in SADD[9:0]
            Ok(u32::from(addr) | cr2::ADD10)
        }
    }

    /// Issue one segment: byte count, continuation/stop policy, START.
    fn start_segment(&mut self, header: u32, len: u8, last: bool) {
        let policy = if last { cr2::AUTOEND } else { cr2::RELOAD };
        let value = header | (u32::from(len) << cr2::NBYTES_SHIFT) | policy | cr2::START;
        self.regs.write(I2cReg::Cr2, value);
    }

    /// Busy-wait until the transmit buffer is empty, watching for NACK.
    fn wait_transmit_ready(&mut self) -> Result<(), Error> {
        for _ in 0..POLL_BUDGET {
            let status = self.regs.read(I2cReg::Isr);
            if status & isr::NACKF != 0 {
                // Abort immediately; the peripheral releases the bus on
                // NACK by itself, no STOP is forced here.
                return Err(Error::Nack);
            }
            if status & isr::TXIS != 0 {
                return Ok(());
            }
        }
        Err(Error::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i2c::common::{FAST_PLUS_TIMING, FAST_TIMING, STANDARD_TIMING};
    use crate::regs::testing::MockBank;
    use hex_literal::hex;
    use std::collections::HashMap;

    /// Mock I2C register bank.
    ///
    /// TXIS reads as set unless the bus is configured as stuck; NACKF
    /// reads as set once the programmed number of bytes has entered TXDR.
    struct MockI2c {
        values: HashMap<I2cReg, u32>,
        writes: Vec<(I2cReg, u32)>,
        nack_at_byte: Option<usize>,
        txis_stuck: bool,
        tx_count: usize,
    }

    impl MockI2c {
        fn new() -> Self {
            Self {
                values: HashMap::new(),
                writes: Vec::new(),
                nack_at_byte: None,
                txis_stuck: false,
                tx_count: 0,
            }
        }

        /// Target NACKs the byte at index `k`.
        fn nack_at_byte(k: usize) -> Self {
            Self {
                nack_at_byte: Some(k),
                ..Self::new()
            }
        }

        /// Transmit-ready never asserts (stuck bus).
        fn stuck() -> Self {
            Self {
                txis_stuck: true,
                ..Self::new()
            }
        }

        fn writes_to(&self, reg: I2cReg) -> Vec<u32> {
            self.writes
                .iter()
                .filter(|(r, _)| *r == reg)
                .map(|(_, v)| *v)
                .collect()
        }

        fn tx_bytes(&self) -> Vec<u8> {
            self.writes_to(I2cReg::Txdr)
                .into_iter()
                .map(|v| v as u8)
                .collect()
        }
    }

    impl RegisterBank for MockI2c {
        type Reg = I2cReg;

        fn read(&self, reg: I2cReg) -> u32 {
            if reg == I2cReg::Isr {
                let mut status = 0;
                if !self.txis_stuck {
                    status |= isr::TXIS;
                }
                if let Some(k) = self.nack_at_byte {
                    if self.tx_count > k {
                        status |= isr::NACKF;
                    }
                }
                return status;
            }
            self.values.get(&reg).copied().unwrap_or(0)
        }

        fn write(&mut self, reg: I2cReg, value: u32) {
            self.writes.push((reg, value));
            self.values.insert(reg, value);
            if reg == I2cReg::Txdr {
                self.tx_count += 1;
            }
        }
    }

    fn controller(bank: MockI2c) -> I2cController<MockI2c> {
        I2cController::new(bank, I2cInstance::I2c1)
    }

    fn init_controller(speed: I2cSpeed) -> I2cController<MockI2c> {
        let mut rcc = Rcc::from_bank(MockBank::new());
        let mut i2c = controller(MockI2c::new());
        i2c.init(&mut rcc, speed);
        i2c
    }

    #[test]
    fn timing_values_per_grade() {
        for (speed, expected) in [
            (I2cSpeed::Standard, 0x1042_0F13),
            (I2cSpeed::Fast, 0x0031_0309),
            (I2cSpeed::FastPlus, 0x0010_0306),
        ] {
            let i2c = init_controller(speed);
            assert_eq!(i2c.regs.read(I2cReg::Timingr), expected);
        }
    }

    #[test]
    fn timing_constants_pack_to_documented_registers() {
        assert_eq!(STANDARD_TIMING.register_value(), 0x1042_0F13);
        assert_eq!(FAST_TIMING.register_value(), 0x0031_0309);
        assert_eq!(FAST_PLUS_TIMING.register_value(), 0x0010_0306);
    }

    #[test]
    fn init_enables_peripheral_last() {
        let i2c = init_controller(I2cSpeed::Fast);

        assert_eq!(i2c.regs.read(I2cReg::Cr1), cr1::PE);
        let order: Vec<I2cReg> = i2c.regs.writes.iter().map(|(r, _)| *r).collect();
        assert_eq!(order, vec![I2cReg::Timingr, I2cReg::Cr1]);
    }

    #[test]
    fn init_pulses_instance_reset() {
        let mut rcc = Rcc::from_bank(MockBank::new());
        let mut i2c = controller(MockI2c::new());
        i2c.init(&mut rcc, I2cSpeed::Standard);

        assert_eq!(rcc.regs.writes_to(RccReg::Apb1rstr), vec![1 << 21, 0]);
    }

    #[test]
    fn init_twice_is_idempotent() {
        let mut rcc = Rcc::from_bank(MockBank::new());
        let mut i2c = controller(MockI2c::new());

        i2c.init(&mut rcc, I2cSpeed::Fast);
        let once = i2c.regs.read(I2cReg::Timingr);
        i2c.init(&mut rcc, I2cSpeed::Fast);

        assert_eq!(i2c.regs.read(I2cReg::Timingr), once);
    }

    #[test]
    fn reinit_clears_stale_timing_fields() {
        // A retained Standard-grade value must not bleed into Fast; an
        // OR-only load would leave 0x1042_0F13 residue behind.
        let mut rcc = Rcc::from_bank(MockBank::new());
        let mut i2c = controller(MockI2c::new());

        i2c.init(&mut rcc, I2cSpeed::Standard);
        i2c.init(&mut rcc, I2cSpeed::Fast);

        assert_eq!(i2c.regs.read(I2cReg::Timingr), 0x0031_0309);
    }

    #[test]
    fn seven_bit_address_phase() {
        let mut i2c = controller(MockI2c::new());
        i2c.write(0x50, &[0xA5]).unwrap();

        let cr2 = i2c.regs.writes_to(I2cReg::Cr2)[0];
        assert_eq!(cr2 & cr2::SADD_MASK, 0x50 << 1);
        assert_eq!(cr2 & cr2::ADD10, 0);
        assert_eq!(cr2 & cr2::HEAD10R, 0);
        assert_eq!(cr2 & cr2::RD_WRN, 0); // write direction
        assert_ne!(cr2 & cr2::START, 0);
    }

    #[test]
    fn ten_bit_address_phase() {
        let mut i2c = controller(MockI2c::new());
        i2c.write(0x1A5, &[0x00]).unwrap();

        let cr2 = i2c.regs.writes_to(I2cReg::Cr2)[0];
        assert_eq!(cr2 & cr2::SADD_MASK, 0x1A5);
        assert_ne!(cr2 & cr2::ADD10, 0);
        assert_eq!(cr2 & cr2::RD_WRN, 0);
    }

    #[test]
    fn addressing_width_boundary() {
        let mut i2c = controller(MockI2c::new());
        i2c.write(127, &[0]).unwrap();
        i2c.write(128, &[0]).unwrap();
        i2c.write(1023, &[0]).unwrap();

        let cr2 = i2c.regs.writes_to(I2cReg::Cr2);
        assert_eq!(cr2[0] & cr2::ADD10, 0);
        assert_ne!(cr2[1] & cr2::ADD10, 0);
        assert_ne!(cr2[2] & cr2::ADD10, 0);
    }

    #[test]
    fn invalid_address_rejected_before_any_register_write() {
        let mut i2c = controller(MockI2c::new());

        assert_eq!(i2c.write(1024, &[0xFF]), Err(Error::InvalidAddress));
        assert_eq!(i2c.write(u16::MAX, &[]), Err(Error::InvalidAddress));
        assert!(i2c.regs.writes.is_empty());
    }

    #[test]
    fn empty_payload_issues_one_final_segment() {
        let mut i2c = controller(MockI2c::new());
        i2c.write(0x50, &[]).unwrap();

        let cr2 = i2c.regs.writes_to(I2cReg::Cr2);
        assert_eq!(cr2.len(), 1);
        assert_eq!(cr2[0] & cr2::NBYTES_MASK, 0);
        assert_ne!(cr2[0] & cr2::AUTOEND, 0);
        assert_eq!(cr2[0] & cr2::RELOAD, 0);
        assert_ne!(cr2[0] & cr2::START, 0);
        assert!(i2c.regs.tx_bytes().is_empty());
    }

    #[test]
    fn segment_count_and_flags_per_length() {
        for len in [1usize, 255, 256, 510, 511] {
            let mut i2c = controller(MockI2c::new());
            let payload = vec![0x5A; len];
            i2c.write(0x50, &payload).unwrap();

            let cr2 = i2c.regs.writes_to(I2cReg::Cr2);
            assert_eq!(cr2.len(), len.div_ceil(255), "length {len}");

            for (index, segment) in cr2.iter().enumerate() {
                let last = index == cr2.len() - 1;
                let nbytes = (segment & cr2::NBYTES_MASK) >> cr2::NBYTES_SHIFT;
                assert_ne!(segment & cr2::START, 0, "length {len} segment {index}");
                if last {
                    let tail = len - 255 * (cr2.len() - 1);
                    assert_eq!(nbytes as usize, tail);
                    assert_ne!(segment & cr2::AUTOEND, 0);
                    assert_eq!(segment & cr2::RELOAD, 0);
                } else {
                    assert_eq!(nbytes, 255);
                    assert_eq!(segment & cr2::AUTOEND, 0);
                    assert_ne!(segment & cr2::RELOAD, 0);
                }
            }
            assert_eq!(i2c.regs.tx_bytes(), payload);
        }
    }

    #[test]
    fn nack_aborts_after_offending_byte() {
        let mut i2c = controller(MockI2c::nack_at_byte(4));
        let payload = [0x11u8; 10];

        assert_eq!(i2c.write(0x50, &payload), Err(Error::Nack));
        // bytes 0..=4 went out, nothing after
        assert_eq!(i2c.regs.tx_bytes().len(), 5);
    }

    #[test]
    fn nack_at_first_byte() {
        let mut i2c = controller(MockI2c::nack_at_byte(0));

        assert_eq!(i2c.write(0x2A, &[1, 2, 3]), Err(Error::Nack));
        assert_eq!(i2c.regs.tx_bytes().len(), 1);
    }

    #[test]
    fn nack_on_segment_boundary_stops_reload() {
        // NACK for the last byte of the first segment: the second segment
        // must never be issued.
        let mut i2c = controller(MockI2c::nack_at_byte(254));
        let payload = vec![0xEE; 300];

        assert_eq!(i2c.write(0x50, &payload), Err(Error::Nack));
        assert_eq!(i2c.regs.writes_to(I2cReg::Cr2).len(), 1);
        assert_eq!(i2c.regs.tx_bytes().len(), 255);
    }

    #[test]
    fn stuck_bus_times_out() {
        let mut i2c = controller(MockI2c::stuck());

        assert_eq!(i2c.write(0x50, &[0xAB]), Err(Error::Timeout));
        assert!(i2c.regs.tx_bytes().is_empty());
    }

    #[test]
    fn write_300_bytes_end_to_end() {
        let mut i2c = controller(MockI2c::new());
        let payload = [0xAA; 300];

        i2c.write(0x50, &payload).unwrap();

        let cr2 = i2c.regs.writes_to(I2cReg::Cr2);
        let nbytes: Vec<u32> = cr2
            .iter()
            .map(|v| (v & cr2::NBYTES_MASK) >> cr2::NBYTES_SHIFT)
            .collect();
        assert_eq!(nbytes, vec![255, 45]);
        assert_eq!(i2c.regs.tx_bytes(), payload);
    }

    #[test]
    fn payload_bytes_sent_in_order() {
        let mut i2c = controller(MockI2c::new());
        let payload = hex!("00 10 de ad be ef");

        i2c.write(0x50, &payload).unwrap();

        assert_eq!(i2c.regs.tx_bytes(), payload);
    }
}
