// Copyright 2023 The gd32f4xx-hal-compat authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory USART.
//!
//! [`SimUsart`] keeps the control registers of a GD32F4xx USART in plain memory, records every
//! transmitted frame and serves received frames from a queue filled by the test.

use heapless::{Deque, Vec};

use super::ll::{Flag, UsartPeriph};
use super::regs::{control_bits, CTL0_UEN};
use super::Config;

/// Capacity of the transmit log, in frames.
pub const TX_CAPACITY: usize = 256;
/// Capacity of the receive queue, in frames.
pub const RX_CAPACITY: usize = 64;

const ERROR_FLAGS: u32 = (1 << Flag::Perr as u8)
    | (1 << Flag::Ferr as u8)
    | (1 << Flag::Nerr as u8)
    | (1 << Flag::Orerr as u8);

/// Software model of one USART.
#[derive(Debug, Default)]
pub struct SimUsart {
    pub ctl0: u32,
    pub ctl1: u32,
    pub ctl2: u32,
    pub baud: u16,
    tx: Vec<u16, TX_CAPACITY>,
    /// Pending frames with the error flags that come with them.
    rx: Deque<(u16, u32), RX_CAPACITY>,
    tx_stalled: bool,
}

impl SimUsart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.ctl0 & CTL0_UEN != 0
    }

    /// Frames written so far.
    pub fn transmitted(&self) -> &[u16] {
        &self.tx
    }

    /// Queues bytes to be received, one frame each.
    ///
    /// Returns the number of bytes that fit in the queue.
    pub fn inject_rx(&mut self, data: &[u8]) -> usize {
        data.iter()
            .take_while(|&&byte| self.rx.push_back((byte.into(), 0)).is_ok())
            .count()
    }

    /// Queues one frame that arrives with `flag` raised.
    pub fn inject_rx_error(&mut self, data: u16, flag: Flag) -> bool {
        self.rx.push_back((data, flag.mask() & ERROR_FLAGS)).is_ok()
    }

    /// Frames still waiting to be read.
    pub fn pending_rx(&self) -> usize {
        self.rx.len()
    }

    /// While stalled, the transmit buffer never empties.
    pub fn stall_tx(&mut self, stalled: bool) {
        self.tx_stalled = stalled;
    }
}

impl UsartPeriph for SimUsart {
    fn configure(&mut self, config: &Config) {
        let (ctl0, ctl1, ctl2) = control_bits(config);
        self.ctl0 = (self.ctl0 & CTL0_UEN) | ctl0;
        self.ctl1 = ctl1;
        self.ctl2 = ctl2;
    }

    fn baudrate_set(&mut self, div: u16) {
        self.baud = div;
    }

    fn enable(&mut self) {
        self.ctl0 |= CTL0_UEN;
    }

    fn disable(&mut self) {
        self.ctl0 &= !CTL0_UEN;
    }

    fn flag_get(&self, flag: Flag) -> bool {
        match flag {
            Flag::Tbe | Flag::Tc => !self.tx_stalled,
            Flag::Rbne => !self.rx.is_empty(),
            Flag::Idle => false,
            Flag::Perr | Flag::Ferr | Flag::Nerr | Flag::Orerr => self
                .rx
                .front()
                .map_or(false, |&(_, errors)| errors & flag.mask() != 0),
        }
    }

    fn flag_clear(&mut self, flag: Flag) {
        if let Some((_, errors)) = self.rx.front_mut() {
            *errors &= !flag.mask();
        }
    }

    fn data_transmit(&mut self, data: u16) {
        // A full log drops frames, like a disconnected line
        let _ = self.tx.push(data & 0x1FF);
    }

    fn data_receive(&mut self) -> u16 {
        self.rx.pop_front().map_or(0, |(data, _)| data & 0x1FF)
    }
}
