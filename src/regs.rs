// Licensed under the Apache-2.0 license

//! Typed views over fixed memory-mapped register blocks.
//!
//! Drivers in this crate are generic over a [`RegisterBank`] capability
//! instead of holding raw pointers directly. Production code binds a bank
//! to a fixed physical base address with [`Mmio`]; host tests substitute
//! mock banks that record register traffic.

use core::marker::PhantomData;
use core::ptr;

/// A register-name enum for one peripheral block.
///
/// Discriminants are the byte offset of each register within the block.
pub trait RegisterMap: Copy {
    /// Byte offset of the register within its block.
    fn offset(self) -> usize;
}

/// Read/write access to one peripheral register block.
pub trait RegisterBank {
    type Reg: RegisterMap;

    fn read(&self, reg: Self::Reg) -> u32;

    fn write(&mut self, reg: Self::Reg, value: u32);

    /// Read-modify-write of a single register.
    fn modify(&mut self, reg: Self::Reg, f: impl FnOnce(u32) -> u32) {
        let value = self.read(reg);
        self.write(reg, f(value));
    }
}

/// Volatile access to the register block at a fixed physical address.
pub struct Mmio<R: RegisterMap> {
    base: *mut u32,
    _registers: PhantomData<R>,
}

impl<R: RegisterMap> Mmio<R> {
    /// Bind the register block at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be the physical base address of the peripheral block
    /// described by `R`, and the returned bank must be the sole owner of
    /// that block: the drivers provide no mutual exclusion, so concurrent
    /// access from another context is undefined.
    #[must_use]
    pub const unsafe fn new(base: usize) -> Self {
        Self {
            base: base as *mut u32,
            _registers: PhantomData,
        }
    }
}

impl<R: RegisterMap> RegisterBank for Mmio<R> {
    type Reg = R;

    fn read(&self, reg: R) -> u32 {
        unsafe { ptr::read_volatile(self.base.byte_add(reg.offset())) }
    }

    fn write(&mut self, reg: R, value: u32) {
        unsafe { ptr::write_volatile(self.base.byte_add(reg.offset()), value) }
    }
}

/// Declares a [`RegisterMap`] enum from `Name = byte_offset` pairs.
macro_rules! register_map {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$reg_meta:meta])* $reg:ident = $offset:expr),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        #[repr(usize)]
        $vis enum $name {
            $($(#[$reg_meta])* $reg = $offset),*
        }

        impl $crate::regs::RegisterMap for $name {
            fn offset(self) -> usize {
                self as usize
            }
        }
    };
}

pub(crate) use register_map;
