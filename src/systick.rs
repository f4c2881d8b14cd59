// Licensed under the Apache-2.0 license

//! SysTick countdown timer.
//!
//! Blocking millisecond delay for bring-up and test sequencing. The counter
//! is programmed for one-millisecond periods off the 8 MHz core clock and
//! polled once per elapsed millisecond.

use crate::regs::{register_map, Mmio, RegisterBank};
use embedded_hal::delay::DelayNs;
use fugit::MillisDurationU32 as MilliSeconds;

/// SysTick register block base address.
pub const SYSTICK_BASE: usize = 0xE000_E010;

register_map! {
    /// SysTick registers.
    pub enum SysTickReg {
        /// Control and status register
        Ctrl = 0x0,
        /// Reload value register
        Load = 0x4,
        /// Current value register
        Val = 0x8,
    }
}

const CTRL_ENABLE: u32 = 1 << 0;
const CTRL_CLKSOURCE: u32 = 1 << 2;
const CTRL_COUNTFLAG: u32 = 1 << 16;

/// Core clock is the 8 MHz HSI, so one millisecond is 8000 ticks.
const TICKS_PER_MS: u32 = 8_000;

/// SysTick-based busy-wait delay.
pub struct SysTick<B: RegisterBank<Reg = SysTickReg>> {
    regs: B,
}

impl SysTick<Mmio<SysTickReg>> {
    /// Bind the SysTick block at its fixed address.
    ///
    /// # Safety
    ///
    /// The caller must ensure this is the only live SysTick handle and that
    /// nothing else (an RTOS tick, for instance) owns the counter.
    #[must_use]
    pub unsafe fn new() -> Self {
        Self::from_bank(unsafe { Mmio::new(SYSTICK_BASE) })
    }
}

impl<B: RegisterBank<Reg = SysTickReg>> SysTick<B> {
    /// Wrap an arbitrary register bank (mock banks in tests).
    pub fn from_bank(regs: B) -> Self {
        Self { regs }
    }

    /// Block for `duration`, counting whole milliseconds on the hardware
    /// counter. The counter is disabled again on return.
    pub fn delay(&mut self, duration: MilliSeconds) {
        self.regs.write(SysTickReg::Load, TICKS_PER_MS - 1);
        self.regs.write(SysTickReg::Val, 0);
        self.regs.write(SysTickReg::Ctrl, CTRL_CLKSOURCE);
        self.regs.modify(SysTickReg::Ctrl, |v| v | CTRL_ENABLE);

        for _ in 0..duration.ticks() {
            while self.regs.read(SysTickReg::Ctrl) & CTRL_COUNTFLAG == 0 {}
        }

        self.regs.write(SysTickReg::Ctrl, 0);
    }
}

impl<B: RegisterBank<Reg = SysTickReg>> DelayNs for SysTick<B> {
    fn delay_ns(&mut self, ns: u32) {
        // Millisecond granularity only; round up.
        self.delay(MilliSeconds::millis(ns.div_ceil(1_000_000)));
    }
}
