// Copyright 2023 The gd32f4xx-hal-compat authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory-mapped GD32F4xx USARTs.

use volatile_register::RW;

use super::ll::{Flag, UsartPeriph};
use super::{Config, Direction, FlowControl, Oversampling, Parity, StopBits, WordLength};

/// USART register block as laid out in the GD32F4xx user manual.
#[repr(C)]
pub struct RegisterBlock {
    /// Status register 0
    pub stat0: RW<u32>,
    /// Data register
    pub data: RW<u32>,
    /// Baud rate register
    pub baud: RW<u32>,
    /// Control register 0
    pub ctl0: RW<u32>,
    /// Control register 1
    pub ctl1: RW<u32>,
    /// Control register 2
    pub ctl2: RW<u32>,
    /// Guard time and prescaler register
    pub gp: RW<u32>,
}

const CTL0_REN: u32 = 1 << 2;
const CTL0_TEN: u32 = 1 << 3;
const CTL0_PM: u32 = 1 << 9;
const CTL0_PCEN: u32 = 1 << 10;
const CTL0_WL: u32 = 1 << 12;
pub(crate) const CTL0_UEN: u32 = 1 << 13;
const CTL0_OVSMOD: u32 = 1 << 15;
const CTL0_CONFIG: u32 = CTL0_REN | CTL0_TEN | CTL0_PM | CTL0_PCEN | CTL0_WL | CTL0_OVSMOD;

const CTL1_STB_POS: u32 = 12;
const CTL1_STB: u32 = 0b11 << CTL1_STB_POS;

const CTL2_RTSEN: u32 = 1 << 8;
const CTL2_CTSEN: u32 = 1 << 9;

/// Computes the control register bits for `config`, as `(ctl0, ctl1, ctl2)`.
pub(crate) fn control_bits(config: &Config) -> (u32, u32, u32) {
    let mut ctl0 = 0;
    match config.direction {
        Direction::Tx => ctl0 |= CTL0_TEN,
        Direction::Rx => ctl0 |= CTL0_REN,
        Direction::TxRx => ctl0 |= CTL0_TEN | CTL0_REN,
    }
    match config.parity {
        Parity::ParityNone => {}
        Parity::ParityEven => ctl0 |= CTL0_PCEN,
        Parity::ParityOdd => ctl0 |= CTL0_PCEN | CTL0_PM,
    }
    if config.wordlength == WordLength::DataBits9 {
        ctl0 |= CTL0_WL;
    }
    if config.oversampling == Oversampling::Over8 {
        ctl0 |= CTL0_OVSMOD;
    }

    let stb = match config.stopbits {
        StopBits::STOP1 => 0b00,
        StopBits::STOP0P5 => 0b01,
        StopBits::STOP2 => 0b10,
        StopBits::STOP1P5 => 0b11,
    };
    let ctl1 = stb << CTL1_STB_POS;

    let ctl2 = match config.flow_control {
        FlowControl::None => 0,
        FlowControl::Rts => CTL2_RTSEN,
        FlowControl::Cts => CTL2_CTSEN,
        FlowControl::RtsCts => CTL2_RTSEN | CTL2_CTSEN,
    };
    (ctl0, ctl1, ctl2)
}

/// Handle to one USART, identified by the base address of its register block.
#[derive(Debug, PartialEq, Eq)]
pub struct Usart {
    base: usize,
}

impl Usart {
    /// Creates a handle for the register block at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be the address of a GD32F4xx USART register block, and no other handle for
    /// the same block may be used while this one is alive.
    pub const unsafe fn from_addr(base: usize) -> Self {
        Self { base }
    }

    /// # Safety
    ///
    /// See [`Usart::from_addr`].
    pub const unsafe fn usart0() -> Self {
        Self::from_addr(0x4001_1000)
    }

    /// # Safety
    ///
    /// See [`Usart::from_addr`].
    pub const unsafe fn usart1() -> Self {
        Self::from_addr(0x4000_4400)
    }

    /// # Safety
    ///
    /// See [`Usart::from_addr`].
    pub const unsafe fn usart2() -> Self {
        Self::from_addr(0x4000_4800)
    }

    /// # Safety
    ///
    /// See [`Usart::from_addr`].
    pub const unsafe fn usart5() -> Self {
        Self::from_addr(0x4001_1400)
    }

    /// # Safety
    ///
    /// See [`Usart::from_addr`].
    pub const unsafe fn uart3() -> Self {
        Self::from_addr(0x4000_4C00)
    }

    /// # Safety
    ///
    /// See [`Usart::from_addr`].
    pub const unsafe fn uart4() -> Self {
        Self::from_addr(0x4000_5000)
    }

    /// # Safety
    ///
    /// See [`Usart::from_addr`].
    pub const unsafe fn uart6() -> Self {
        Self::from_addr(0x4000_7800)
    }

    /// # Safety
    ///
    /// See [`Usart::from_addr`].
    pub const unsafe fn uart7() -> Self {
        Self::from_addr(0x4000_7C00)
    }

    pub fn addr(&self) -> usize {
        self.base
    }

    #[inline(always)]
    fn regs(&self) -> &RegisterBlock {
        // NOTE(unsafe) the constructor contract guarantees a valid register block
        unsafe { &*(self.base as *const RegisterBlock) }
    }
}

impl UsartPeriph for Usart {
    fn configure(&mut self, config: &Config) {
        let (ctl0, ctl1, ctl2) = control_bits(config);
        let regs = self.regs();
        // NOTE(unsafe) read-modify-write through an exclusive handle
        unsafe {
            regs.ctl0.modify(|r| (r & !CTL0_CONFIG) | ctl0);
            regs.ctl1.modify(|r| (r & !CTL1_STB) | ctl1);
            regs.ctl2
                .modify(|r| (r & !(CTL2_RTSEN | CTL2_CTSEN)) | ctl2);
        }
    }

    fn baudrate_set(&mut self, div: u16) {
        // NOTE(unsafe) exclusive handle
        unsafe { self.regs().baud.write(div.into()) }
    }

    fn enable(&mut self) {
        // NOTE(unsafe) read-modify-write through an exclusive handle
        unsafe { self.regs().ctl0.modify(|r| r | CTL0_UEN) }
    }

    fn disable(&mut self) {
        // NOTE(unsafe) read-modify-write through an exclusive handle
        unsafe { self.regs().ctl0.modify(|r| r & !CTL0_UEN) }
    }

    #[inline]
    fn flag_get(&self, flag: Flag) -> bool {
        self.regs().stat0.read() & flag.mask() != 0
    }

    fn flag_clear(&mut self, flag: Flag) {
        match flag {
            // Cleared by the STAT0 read in `flag_get` followed by the DATA read in
            // `data_receive`. Reading DATA here would drop the next frame.
            Flag::Perr | Flag::Ferr | Flag::Nerr | Flag::Orerr | Flag::Idle => {}
            // NOTE(unsafe) writing zero clears the flag, writing one has no effect
            Flag::Rbne | Flag::Tc => unsafe { self.regs().stat0.write(!flag.mask()) },
            // Cleared by writing DATA
            Flag::Tbe => {}
        }
    }

    #[inline]
    fn data_transmit(&mut self, data: u16) {
        // NOTE(unsafe) exclusive handle
        unsafe { self.regs().data.write(u32::from(data) & 0x1FF) }
    }

    #[inline]
    fn data_receive(&mut self) -> u16 {
        (self.regs().data.read() & 0x1FF) as u16
    }
}
