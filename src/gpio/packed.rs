// Copyright 2023 The gd32f4xx-hal-compat authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Packed pin descriptors.
//!
//! Code ported from the vendor-neutral C API describes pins with an init record of plain
//! integers, where the mode word also carries the output type and the external interrupt
//! settings. [`PinConfig::from_packed`] decodes such a record once, at the boundary, into the
//! typed [`PinConfig`]; the translator never sees the packed form.
//!
//! Speed and alternate function are only decoded for the modes that use them, so stale values
//! left in those fields for an input or analog pin are ignored rather than rejected.

use super::{AltFn, Edge, Exti, ExtiKind, GpioPeriph, Mode, OutputType, PinConfig, PinMask, Pull, Speed};
use crate::error::{Error, Result};

/// Mode field of the mode word.
pub const MODE_MASK: u32 = 0x0000_0003;
/// Open-drain output type bit of the mode word.
pub const OUTPUT_TYPE: u32 = 1 << OUTPUT_TYPE_POS;
/// Position of [`OUTPUT_TYPE`] in the mode word.
pub const OUTPUT_TYPE_POS: u32 = 4;
/// Set when an external interrupt or event is requested.
pub const EXTI_MODE: u32 = 0x1000_0000;
pub const EXTI_IT: u32 = 0x0001_0000;
pub const EXTI_EVT: u32 = 0x0002_0000;
pub const TRIGGER_RISING: u32 = 0x0010_0000;
pub const TRIGGER_FALLING: u32 = 0x0020_0000;

const KNOWN_BITS: u32 =
    MODE_MASK | OUTPUT_TYPE | EXTI_MODE | EXTI_IT | EXTI_EVT | TRIGGER_RISING | TRIGGER_FALLING;

pub const MODE_INPUT: u32 = 0x0000_0000;
pub const MODE_OUTPUT_PP: u32 = 0x0000_0001;
pub const MODE_OUTPUT_OD: u32 = 0x0000_0011;
pub const MODE_AF_PP: u32 = 0x0000_0002;
pub const MODE_AF_OD: u32 = 0x0000_0012;
pub const MODE_ANALOG: u32 = 0x0000_0003;
pub const MODE_IT_RISING: u32 = 0x1011_0000;
pub const MODE_IT_FALLING: u32 = 0x1021_0000;
pub const MODE_IT_RISING_FALLING: u32 = 0x1031_0000;
pub const MODE_EVT_RISING: u32 = 0x1012_0000;
pub const MODE_EVT_FALLING: u32 = 0x1022_0000;
pub const MODE_EVT_RISING_FALLING: u32 = 0x1032_0000;

pub const NOPULL: u32 = 0;
pub const PULLUP: u32 = 1;
pub const PULLDOWN: u32 = 2;

pub const SPEED_LOW: u32 = 0;
pub const SPEED_MEDIUM: u32 = 1;
pub const SPEED_HIGH: u32 = 2;
pub const SPEED_VERY_HIGH: u32 = 3;

/// Init record in the layout of the vendor-neutral API.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Packed {
    /// Pin mask, bit `n` selects pin `n`.
    pub pin: u32,
    /// One of the `MODE_*` words.
    pub mode: u32,
    /// `NOPULL`, `PULLUP` or `PULLDOWN`.
    pub pull: u32,
    /// One of the `SPEED_*` values.
    pub speed: u32,
    /// Alternate function number, only read in alternate mode.
    pub alternate: u32,
}

fn decode_exti(mode: u32) -> Result<Option<Exti>> {
    let exti_bits = mode & (EXTI_IT | EXTI_EVT | TRIGGER_RISING | TRIGGER_FALLING);
    if mode & EXTI_MODE == 0 {
        return if exti_bits == 0 {
            Ok(None)
        } else {
            Err(Error::InvalidArgument("EXTI bits set without EXTI mode"))
        };
    }

    let kind = match mode & (EXTI_IT | EXTI_EVT) {
        EXTI_IT => ExtiKind::Interrupt,
        EXTI_EVT => ExtiKind::Event,
        _ => return Err(Error::InvalidArgument("EXTI mode needs exactly one of interrupt or event")),
    };
    let edge = match mode & (TRIGGER_RISING | TRIGGER_FALLING) {
        TRIGGER_RISING => Edge::Rising,
        TRIGGER_FALLING => Edge::Falling,
        0 => return Err(Error::InvalidArgument("EXTI mode without trigger edge")),
        _ => Edge::RisingFalling,
    };
    Ok(Some(Exti { kind, edge }))
}

fn decode_pull(pull: u32) -> Result<Pull> {
    match pull {
        NOPULL => Ok(Pull::None),
        PULLUP => Ok(Pull::Up),
        PULLDOWN => Ok(Pull::Down),
        _ => Err(Error::InvalidArgument("unknown pull value")),
    }
}

fn decode_speed(speed: u32) -> Result<Speed> {
    match speed {
        SPEED_LOW => Ok(Speed::Low),
        SPEED_MEDIUM => Ok(Speed::Medium),
        SPEED_HIGH => Ok(Speed::High),
        SPEED_VERY_HIGH => Ok(Speed::VeryHigh),
        _ => Err(Error::InvalidArgument("unknown speed value")),
    }
}

fn decode_alternate(alternate: u32) -> Result<AltFn> {
    if alternate < 16 {
        AltFn::new(alternate as u8)
    } else {
        Err(Error::InvalidAlternateFunction(alternate))
    }
}

impl PinConfig {
    /// Decodes a packed init record.
    pub fn from_packed(packed: &Packed) -> Result<Self> {
        if packed.mode & !KNOWN_BITS != 0 {
            return Err(Error::InvalidArgument("unknown bits in mode word"));
        }
        let pins = PinMask::new(packed.pin)?;
        let pull = decode_pull(packed.pull)?;
        let exti = decode_exti(packed.mode)?;

        let otype = match (packed.mode & OUTPUT_TYPE) >> OUTPUT_TYPE_POS {
            0 => OutputType::PushPull,
            _ => OutputType::OpenDrain,
        };
        let (mode, speed) = match packed.mode & MODE_MASK {
            MODE_OUTPUT_PP => (Mode::Output(otype), decode_speed(packed.speed)?),
            MODE_AF_PP => (
                Mode::Alternate(decode_alternate(packed.alternate)?, otype),
                decode_speed(packed.speed)?,
            ),
            mode_bits => {
                if otype == OutputType::OpenDrain {
                    return Err(Error::InvalidArgument("output type set for a non-output mode"));
                }
                let mode = if mode_bits == MODE_ANALOG {
                    Mode::Analog
                } else {
                    Mode::Input
                };
                (mode, Speed::Low)
            }
        };

        Ok(PinConfig {
            pins,
            mode,
            pull,
            speed,
            exti,
        })
    }
}

impl core::convert::TryFrom<Packed> for PinConfig {
    type Error = Error;

    fn try_from(packed: Packed) -> Result<Self> {
        PinConfig::from_packed(&packed)
    }
}

/// Decodes `packed` and applies it to `port`.
///
/// Nothing is written to the port if the record does not decode.
pub fn init<P>(port: &mut P, packed: &Packed) -> Result<()>
where
    P: GpioPeriph + ?Sized,
{
    let config = PinConfig::from_packed(packed)?;
    super::configure(port, &config)
}

#[cfg(test)]
mod tests {
    use super::super::sim::SimPort;
    use super::*;

    fn packed(pin: u32, mode: u32) -> Packed {
        Packed {
            pin,
            mode,
            ..Packed::default()
        }
    }

    #[test]
    fn output_open_drain() {
        let config = PinConfig::from_packed(&Packed {
            speed: SPEED_HIGH,
            pull: PULLUP,
            ..packed(0x0020, MODE_OUTPUT_OD)
        })
        .unwrap();
        assert_eq!(config.mode, Mode::Output(OutputType::OpenDrain));
        assert_eq!(config.speed, Speed::High);
        assert_eq!(config.pull, Pull::Up);
        assert_eq!(config.pins.bits(), 0x0020);
        assert_eq!(config.exti, None);
    }

    #[test]
    fn output_type_bit_selects_open_drain() {
        assert_eq!(OUTPUT_TYPE, 0x0000_0010);
        assert_eq!(MODE_OUTPUT_OD, MODE_OUTPUT_PP | OUTPUT_TYPE);
        assert_eq!(MODE_AF_OD, MODE_AF_PP | (1 << OUTPUT_TYPE_POS));
        let push_pull = PinConfig::from_packed(&packed(0x0004, MODE_AF_PP)).unwrap();
        assert_eq!(
            push_pull.mode,
            Mode::Alternate(AltFn::new(0).unwrap(), OutputType::PushPull)
        );
    }

    #[test]
    fn alternate_carries_function_number() {
        let config = PinConfig::from_packed(&Packed {
            alternate: 7,
            speed: SPEED_MEDIUM,
            ..packed(0x0088, MODE_AF_OD)
        })
        .unwrap();
        assert_eq!(
            config.mode,
            Mode::Alternate(AltFn::new(7).unwrap(), OutputType::OpenDrain)
        );
    }

    #[test]
    fn input_ignores_speed_and_alternate() {
        let config = PinConfig::from_packed(&Packed {
            speed: 0xDEAD,
            alternate: 99,
            ..packed(0x0001, MODE_INPUT)
        })
        .unwrap();
        assert_eq!(config.mode, Mode::Input);
        assert_eq!(config.speed, Speed::Low);
    }

    #[test]
    fn interrupt_modes_decode_to_input_with_exti() {
        let config = PinConfig::from_packed(&packed(0x0001, MODE_IT_RISING_FALLING)).unwrap();
        assert_eq!(config.mode, Mode::Input);
        assert_eq!(
            config.exti,
            Some(Exti {
                kind: ExtiKind::Interrupt,
                edge: Edge::RisingFalling
            })
        );
        let config = PinConfig::from_packed(&packed(0x0001, MODE_EVT_FALLING)).unwrap();
        assert_eq!(
            config.exti,
            Some(Exti {
                kind: ExtiKind::Event,
                edge: Edge::Falling
            })
        );
    }

    #[test]
    fn malformed_records_are_rejected() {
        assert_eq!(
            PinConfig::from_packed(&packed(0, MODE_INPUT)),
            Err(Error::InvalidPinMask(0))
        );
        assert_eq!(
            PinConfig::from_packed(&packed(0x1_0000, MODE_INPUT)),
            Err(Error::InvalidPinMask(0x1_0000))
        );
        assert!(PinConfig::from_packed(&packed(1, 0x0000_0100)).is_err());
        assert!(PinConfig::from_packed(&packed(1, EXTI_MODE | EXTI_IT)).is_err());
        assert!(PinConfig::from_packed(&packed(1, EXTI_IT | TRIGGER_RISING)).is_err());
        assert!(PinConfig::from_packed(&packed(1, MODE_ANALOG | OUTPUT_TYPE)).is_err());
        assert_eq!(
            PinConfig::from_packed(&Packed {
                alternate: 16,
                ..packed(1, MODE_AF_PP)
            }),
            Err(Error::InvalidAlternateFunction(16))
        );
        assert!(PinConfig::from_packed(&Packed {
            pull: 3,
            ..packed(1, MODE_INPUT)
        })
        .is_err());
    }

    #[test]
    fn init_writes_nothing_for_bad_records() {
        let mut port = SimPort::new();
        let bad = Packed {
            speed: 9,
            ..packed(0xFFFF, MODE_OUTPUT_PP)
        };
        assert!(init(&mut port, &bad).is_err());
        assert_eq!(port, SimPort::new());
    }

    #[test]
    fn init_applies_analog() {
        let mut port = SimPort::new();
        init(&mut port, &packed(0x0003, MODE_ANALOG)).unwrap();
        assert_eq!(port.ctl, 0x0000_000F);
    }
}
