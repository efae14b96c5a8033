// Copyright 2023 The gd32f4xx-hal-compat authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory-mapped GD32F4xx GPIO ports.

use volatile_register::{RO, RW, WO};

use super::ll::{set_fields, Af, Ctl, GpioPeriph, Omode, Ospd, Pupd};

/// GPIO register block as laid out in the GD32F4xx user manual.
#[repr(C)]
pub struct RegisterBlock {
    /// Port control (mode) register
    pub ctl: RW<u32>,
    /// Port output mode register
    pub omode: RW<u32>,
    /// Port output speed register
    pub ospd: RW<u32>,
    /// Port pull-up/pull-down register
    pub pud: RW<u32>,
    /// Port input status register
    pub istat: RO<u32>,
    /// Port output control register
    pub octl: RW<u32>,
    /// Port bit operate register
    pub bop: WO<u32>,
    /// Port configuration lock register
    pub lock: RW<u32>,
    /// Alternate function selected register 0 (pins 0-7)
    pub afsel0: RW<u32>,
    /// Alternate function selected register 1 (pins 8-15)
    pub afsel1: RW<u32>,
    /// Bit clear register
    pub bc: WO<u32>,
    /// Port bit toggle register
    pub tg: WO<u32>,
}

/// Handle to one GPIO port, identified by the base address of its register block.
///
/// The handle is a plain address; it does not own the port. Whoever holds a `Port` by `&mut`
/// is responsible for making sure nothing else writes the same registers concurrently.
#[derive(Debug, PartialEq, Eq)]
pub struct Port {
    base: usize,
}

const AHB1_GPIO_BASE: usize = 0x4002_0000;
const PORT_STRIDE: usize = 0x400;

impl Port {
    /// Creates a handle for the register block at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be the address of a GD32F4xx GPIO register block, and no other handle for the
    /// same block may be used while this one is alive.
    pub const unsafe fn from_addr(base: usize) -> Self {
        Self { base }
    }

    /// Creates a handle for port `letter`, or `None` if the part has no such port.
    ///
    /// # Safety
    ///
    /// See [`Port::from_addr`].
    pub const unsafe fn new(letter: char) -> Option<Self> {
        match letter {
            'A'..='I' => Some(Self::from_addr(
                AHB1_GPIO_BASE + (letter as usize - 'A' as usize) * PORT_STRIDE,
            )),
            _ => None,
        }
    }

    /// Base address of the register block.
    pub fn addr(&self) -> usize {
        self.base
    }

    #[inline(always)]
    fn regs(&self) -> &RegisterBlock {
        // NOTE(unsafe) the constructor contract guarantees a valid register block
        unsafe { &*(self.base as *const RegisterBlock) }
    }
}

macro_rules! ports {
    ($($name:ident: $index:expr,)+) => {
        impl Port {
            $(
                /// # Safety
                ///
                /// See [`Port::from_addr`].
                pub const unsafe fn $name() -> Self {
                    Self::from_addr(AHB1_GPIO_BASE + $index * PORT_STRIDE)
                }
            )+
        }
    };
}

ports! {
    gpioa: 0,
    gpiob: 1,
    gpioc: 2,
    gpiod: 3,
    gpioe: 4,
    gpiof: 5,
    gpiog: 6,
    gpioh: 7,
    gpioi: 8,
}

impl GpioPeriph for Port {
    fn mode_set(&mut self, mode: Ctl, pull: Pupd, pins: u16) {
        let regs = self.regs();
        // NOTE(unsafe) read-modify-write through an exclusive handle
        unsafe {
            regs.ctl
                .modify(|r| set_fields(r, pins, 2, mode as u32));
            regs.pud
                .modify(|r| set_fields(r, pins, 2, pull as u32));
        }
    }

    fn output_options_set(&mut self, otype: Omode, speed: Ospd, pins: u16) {
        let regs = self.regs();
        // NOTE(unsafe) read-modify-write through an exclusive handle
        unsafe {
            regs.omode
                .modify(|r| set_fields(r, pins, 1, otype as u32));
            regs.ospd
                .modify(|r| set_fields(r, pins, 2, speed as u32));
        }
    }

    fn af_set(&mut self, af: Af, pins: u16) {
        let regs = self.regs();
        let low = pins & 0x00FF;
        let high = pins >> 8;
        // NOTE(unsafe) read-modify-write through an exclusive handle
        unsafe {
            if low != 0 {
                regs.afsel0
                    .modify(|r| set_fields(r, low, 4, af.bits().into()));
            }
            if high != 0 {
                regs.afsel1
                    .modify(|r| set_fields(r, high, 4, af.bits().into()));
            }
        }
    }

    #[inline]
    fn input_bit_get(&self, pins: u16) -> bool {
        self.regs().istat.read() & u32::from(pins) != 0
    }

    #[inline]
    fn output_bit_get(&self, pins: u16) -> bool {
        self.regs().octl.read() & u32::from(pins) != 0
    }

    #[inline]
    fn bit_write(&mut self, pins: u16, value: bool) {
        let regs = self.regs();
        // NOTE(unsafe) atomic write to a stateless register
        unsafe {
            if value {
                regs.bop.write(u32::from(pins))
            } else {
                regs.bc.write(u32::from(pins))
            }
        }
    }

    #[inline]
    fn bit_toggle(&mut self, pins: u16) {
        // NOTE(unsafe) atomic write to a stateless register
        unsafe { self.regs().tg.write(u32::from(pins)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::size_of;

    #[test]
    fn register_block_matches_manual_offsets() {
        assert_eq!(size_of::<RegisterBlock>(), 0x30);
    }

    #[test]
    fn port_addresses() {
        let a = unsafe { Port::gpioa() };
        let i = unsafe { Port::gpioi() };
        assert_eq!(a.addr(), 0x4002_0000);
        assert_eq!(i.addr(), 0x4002_2000);
    }

    #[test]
    fn port_by_letter() {
        assert_eq!(unsafe { Port::new('C') }, Some(unsafe { Port::gpioc() }));
        assert_eq!(unsafe { Port::new('I') }.map(|p| p.addr()), Some(0x4002_2000));
        assert_eq!(unsafe { Port::new('J') }, None);
        assert_eq!(unsafe { Port::new('a') }, None);
    }
}
