// Copyright 2023 The gd32f4xx-hal-compat authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory GPIO port.
//!
//! [`SimPort`] keeps the same register fields as a GD32F4xx port, in plain memory, so the
//! translation layer can be exercised on a host. The input data register loops back the output
//! latch, except for pins that a test drives from outside with [`SimPort::drive`].

use super::ll::{set_fields, Af, Ctl, GpioPeriph, Omode, Ospd, Pupd};

/// Software model of one GPIO port register block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimPort {
    pub ctl: u32,
    pub omode: u32,
    pub ospd: u32,
    pub pud: u32,
    pub octl: u32,
    pub afsel0: u32,
    pub afsel1: u32,
    /// Pins whose level is forced from outside the port.
    external_mask: u16,
    /// Levels of the externally driven pins.
    external_level: u16,
}

impl SimPort {
    /// A port in its reset state, all registers zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drives pin `n` from outside the chip. Overrides the output latch on input reads.
    pub fn drive(&mut self, n: u8, high: bool) {
        let bit = 1u16 << (n & 0xF);
        self.external_mask |= bit;
        if high {
            self.external_level |= bit;
        } else {
            self.external_level &= !bit;
        }
    }

    /// Stops driving pin `n` from outside.
    pub fn release(&mut self, n: u8) {
        let bit = 1u16 << (n & 0xF);
        self.external_mask &= !bit;
        self.external_level &= !bit;
    }

    /// Value of the input status register.
    pub fn istat(&self) -> u32 {
        let latch = self.octl as u16 & !self.external_mask;
        u32::from(latch | (self.external_level & self.external_mask))
    }

    /// Decoded mode of pin `n`.
    pub fn mode(&self, n: u8) -> Ctl {
        Ctl::from_bits(self.ctl >> (2 * u32::from(n & 0xF)))
    }

    /// Decoded pull-up/pull-down setting of pin `n`.
    pub fn pull(&self, n: u8) -> Pupd {
        Pupd::from_bits(self.pud >> (2 * u32::from(n & 0xF)))
    }

    /// Decoded output type of pin `n`.
    pub fn output_type(&self, n: u8) -> Omode {
        Omode::from_bits(self.omode >> u32::from(n & 0xF))
    }

    /// Decoded output speed of pin `n`.
    pub fn speed(&self, n: u8) -> Ospd {
        Ospd::from_bits(self.ospd >> (2 * u32::from(n & 0xF)))
    }

    /// Alternate function selected for pin `n`.
    pub fn alternate(&self, n: u8) -> u8 {
        let n = n & 0xF;
        let reg = if n < 8 { self.afsel0 } else { self.afsel1 };
        ((reg >> (4 * u32::from(n % 8))) & 0xF) as u8
    }
}

impl GpioPeriph for SimPort {
    fn mode_set(&mut self, mode: Ctl, pull: Pupd, pins: u16) {
        self.ctl = set_fields(self.ctl, pins, 2, mode as u32);
        self.pud = set_fields(self.pud, pins, 2, pull as u32);
    }

    fn output_options_set(&mut self, otype: Omode, speed: Ospd, pins: u16) {
        self.omode = set_fields(self.omode, pins, 1, otype as u32);
        self.ospd = set_fields(self.ospd, pins, 2, speed as u32);
    }

    fn af_set(&mut self, af: Af, pins: u16) {
        self.afsel0 = set_fields(self.afsel0, pins & 0x00FF, 4, af.bits().into());
        self.afsel1 = set_fields(self.afsel1, pins >> 8, 4, af.bits().into());
    }

    fn input_bit_get(&self, pins: u16) -> bool {
        self.istat() & u32::from(pins) != 0
    }

    fn output_bit_get(&self, pins: u16) -> bool {
        self.octl & u32::from(pins) != 0
    }

    fn bit_write(&mut self, pins: u16, value: bool) {
        if value {
            self.octl |= u32::from(pins);
        } else {
            self.octl &= !u32::from(pins);
        }
    }

    fn bit_toggle(&mut self, pins: u16) {
        self.octl ^= u32::from(pins);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_loops_back_output_latch() {
        let mut port = SimPort::new();
        port.bit_write(1 << 4, true);
        assert!(port.input_bit_get(1 << 4));
        assert!(!port.input_bit_get(1 << 5));
    }

    #[test]
    fn external_drive_overrides_latch() {
        let mut port = SimPort::new();
        port.bit_write(1 << 4, true);
        port.drive(4, false);
        assert!(!port.input_bit_get(1 << 4));
        assert!(port.output_bit_get(1 << 4));
        port.release(4);
        assert!(port.input_bit_get(1 << 4));
    }

    #[test]
    fn af_set_splits_low_and_high_pins() {
        let mut port = SimPort::new();
        port.af_set(Af(5), 0x8001);
        assert_eq!(port.afsel0, 0x0000_0005);
        assert_eq!(port.afsel1, 0x5000_0000);
        assert_eq!(port.alternate(0), 5);
        assert_eq!(port.alternate(15), 5);
        assert_eq!(port.alternate(7), 0);
    }

    #[test]
    fn mode_set_leaves_other_pins_alone() {
        let mut port = SimPort::new();
        port.mode_set(Ctl::Analog, Pupd::None, 0xFFFF);
        port.mode_set(Ctl::Output, Pupd::PullUp, 1 << 9);
        assert_eq!(port.mode(9), Ctl::Output);
        assert_eq!(port.pull(9), Pupd::PullUp);
        assert_eq!(port.mode(8), Ctl::Analog);
        assert_eq!(port.mode(10), Ctl::Analog);
    }
}
