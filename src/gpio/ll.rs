// Copyright 2023 The gd32f4xx-hal-compat authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-level GPIO driver interface.
//!
//! This is the capability set the compatibility layer drives. Its vocabulary is the one of the
//! GD32F4xx firmware library: every call takes a pin mask and register field values exactly as
//! they appear in the port's `CTL`, `PUD`, `OMODE`, `OSPD` and `AFSELx` registers.

/// Values for the 2-bit `CTL` (mode) field of a pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Ctl {
    Input = 0b00,
    Output = 0b01,
    Alternate = 0b10,
    Analog = 0b11,
}

/// Values for the 2-bit `PUD` (pull-up/pull-down) field of a pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Pupd {
    None = 0b00,
    PullUp = 0b01,
    PullDown = 0b10,
}

/// Values for the 1-bit `OMODE` (output type) field of a pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Omode {
    PushPull = 0,
    OpenDrain = 1,
}

/// Values for the 2-bit `OSPD` (output speed) field of a pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Ospd {
    Mhz2 = 0b00,
    Mhz25 = 0b01,
    Mhz50 = 0b10,
    Mhz200 = 0b11,
}

/// Value for the 4-bit `AFSELx` field of a pin: alternate function 0 to 15.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Af(pub(crate) u8);

impl Af {
    /// Raw field value.
    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }
}

impl Ctl {
    pub(crate) fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0b00 => Ctl::Input,
            0b01 => Ctl::Output,
            0b10 => Ctl::Alternate,
            _ => Ctl::Analog,
        }
    }
}

impl Pupd {
    /// Decodes a register field. The reserved value `0b11` reads back as no pull.
    pub(crate) fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0b01 => Pupd::PullUp,
            0b10 => Pupd::PullDown,
            _ => Pupd::None,
        }
    }
}

impl Omode {
    pub(crate) fn from_bits(bits: u32) -> Self {
        if bits & 1 == 0 {
            Omode::PushPull
        } else {
            Omode::OpenDrain
        }
    }
}

impl Ospd {
    pub(crate) fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0b00 => Ospd::Mhz2,
            0b01 => Ospd::Mhz25,
            0b10 => Ospd::Mhz50,
            _ => Ospd::Mhz200,
        }
    }
}

/// Low-level driver for one GPIO port.
///
/// `pins` is a 16-bit mask; bit `n` selects pin `n` of the port. Implementations apply each
/// call to every selected pin and leave the others untouched.
pub trait GpioPeriph {
    /// Programs the mode and pull-up/pull-down fields.
    fn mode_set(&mut self, mode: Ctl, pull: Pupd, pins: u16);

    /// Programs the output type and output speed fields.
    fn output_options_set(&mut self, otype: Omode, speed: Ospd, pins: u16);

    /// Selects the alternate function routed to the pins.
    fn af_set(&mut self, af: Af, pins: u16);

    /// Whether any selected pin reads high on the input data register.
    fn input_bit_get(&self, pins: u16) -> bool;

    /// Whether any selected pin is set in the output control register.
    fn output_bit_get(&self, pins: u16) -> bool;

    /// Drives the selected pins high (`true`) or low (`false`).
    fn bit_write(&mut self, pins: u16, value: bool);

    /// Inverts the output level of the selected pins.
    fn bit_toggle(&mut self, pins: u16);
}

impl<T: GpioPeriph + ?Sized> GpioPeriph for &mut T {
    #[inline]
    fn mode_set(&mut self, mode: Ctl, pull: Pupd, pins: u16) {
        (**self).mode_set(mode, pull, pins)
    }

    #[inline]
    fn output_options_set(&mut self, otype: Omode, speed: Ospd, pins: u16) {
        (**self).output_options_set(otype, speed, pins)
    }

    #[inline]
    fn af_set(&mut self, af: Af, pins: u16) {
        (**self).af_set(af, pins)
    }

    #[inline]
    fn input_bit_get(&self, pins: u16) -> bool {
        (**self).input_bit_get(pins)
    }

    #[inline]
    fn output_bit_get(&self, pins: u16) -> bool {
        (**self).output_bit_get(pins)
    }

    #[inline]
    fn bit_write(&mut self, pins: u16, value: bool) {
        (**self).bit_write(pins, value)
    }

    #[inline]
    fn bit_toggle(&mut self, pins: u16) {
        (**self).bit_toggle(pins)
    }
}

/// Iterates over the pin numbers selected by `pins`, lowest first.
pub(crate) fn pins_of(pins: u16) -> impl Iterator<Item = u32> {
    (0..16u32).filter(move |n| pins & (1 << n) != 0)
}

/// Replaces the `width`-bit field of every selected pin in `reg` with `value`.
pub(crate) fn set_fields(reg: u32, pins: u16, width: u32, value: u32) -> u32 {
    let field = (1u32 << width) - 1;
    pins_of(pins)
        .filter(|n| n * width < 32)
        .fold(reg, |reg, n| {
            let offset = n * width;
            (reg & !(field << offset)) | ((value & field) << offset)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_fields_only_touches_selected_pins() {
        let reg = 0xFFFF_FFFF;
        assert_eq!(set_fields(reg, 0b0000_0000_0000_0101, 2, 0b01), 0xFFFF_FFDD);
        assert_eq!(set_fields(0, 0x8000, 2, 0b11), 0xC000_0000);
        assert_eq!(set_fields(0, 0x0020, 1, 1), 0x0000_0020);
    }

    #[test]
    fn four_bit_fields_ignore_upper_half() {
        // Pins 8-15 live in AFSEL1, the caller shifts them down.
        assert_eq!(set_fields(0, 0x0180, 4, 7), 0x7000_0000);
    }

    #[test]
    fn decode_reads_back_encoded_values() {
        assert_eq!(Ctl::from_bits(Ctl::Alternate as u32), Ctl::Alternate);
        assert_eq!(Pupd::from_bits(0b11), Pupd::None);
        assert_eq!(Ospd::from_bits(Ospd::Mhz50 as u32), Ospd::Mhz50);
        assert_eq!(Omode::from_bits(1), Omode::OpenDrain);
    }
}
