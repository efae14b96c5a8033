// Copyright 2023 The gd32f4xx-hal-compat authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Translation of pin configurations into low-level driver calls, checked against a driver that
//! records every call and against the in-memory register model.

use gd32f4xx_hal_compat::gpio::ll::{Af, Ctl, GpioPeriph, Omode, Ospd, Pupd};
use gd32f4xx_hal_compat::gpio::packed::{self, Packed};
use gd32f4xx_hal_compat::gpio::sim::SimPort;
use gd32f4xx_hal_compat::gpio::{
    self, AltFn, Edge, ExtiKind, Mode, OutputType, PinConfig, PinId, PinMask, PinState, Pull, Speed,
};
use gd32f4xx_hal_compat::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Call {
    ModeSet(Ctl, Pupd, u16),
    OutputOptionsSet(Omode, Ospd, u16),
    AfSet(u8, u16),
    BitWrite(u16, bool),
    BitToggle(u16),
}

/// Records driver calls in order and forwards them to a register model.
#[derive(Default)]
struct Recorder {
    calls: Vec<Call>,
    port: SimPort,
}

impl Recorder {
    fn position(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls.iter().position(pred)
    }
}

impl GpioPeriph for Recorder {
    fn mode_set(&mut self, mode: Ctl, pull: Pupd, pins: u16) {
        self.calls.push(Call::ModeSet(mode, pull, pins));
        self.port.mode_set(mode, pull, pins);
    }

    fn output_options_set(&mut self, otype: Omode, speed: Ospd, pins: u16) {
        self.calls.push(Call::OutputOptionsSet(otype, speed, pins));
        self.port.output_options_set(otype, speed, pins);
    }

    fn af_set(&mut self, af: Af, pins: u16) {
        self.calls.push(Call::AfSet(af.bits(), pins));
        self.port.af_set(af, pins);
    }

    fn input_bit_get(&self, pins: u16) -> bool {
        self.port.input_bit_get(pins)
    }

    fn output_bit_get(&self, pins: u16) -> bool {
        self.port.output_bit_get(pins)
    }

    fn bit_write(&mut self, pins: u16, value: bool) {
        self.calls.push(Call::BitWrite(pins, value));
        self.port.bit_write(pins, value);
    }

    fn bit_toggle(&mut self, pins: u16) {
        self.calls.push(Call::BitToggle(pins));
        self.port.bit_toggle(pins);
    }
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn pin(n: u8) -> PinId {
    PinId::new(n).unwrap()
}

fn af(n: u8) -> AltFn {
    AltFn::new(n).unwrap()
}

const ALL_PULLS: [Pull; 3] = [Pull::None, Pull::Up, Pull::Down];
const ALL_SPEEDS: [Speed; 4] = [Speed::Low, Speed::Medium, Speed::High, Speed::VeryHigh];
const ALL_TYPES: [OutputType; 2] = [OutputType::PushPull, OutputType::OpenDrain];

#[test]
fn output_push_pull_on_pin_5() {
    init_logger();
    let mut rec = Recorder::default();
    let config = PinConfig::new(pin(5).into(), Mode::Output(OutputType::PushPull))
        .pull(Pull::None)
        .speed(Speed::High);
    gpio::configure(&mut rec, &config).unwrap();
    assert_eq!(
        rec.calls,
        vec![
            Call::OutputOptionsSet(Omode::PushPull, Ospd::Mhz50, 0x0020),
            Call::ModeSet(Ctl::Output, Pupd::None, 0x0020),
        ]
    );
}

#[test]
fn alternate_open_drain_on_pins_3_and_7() {
    init_logger();
    let mut rec = Recorder::default();
    let config = PinConfig::new(pin(3) | pin(7), Mode::Alternate(af(7), OutputType::OpenDrain))
        .pull(Pull::Up)
        .speed(Speed::Medium);
    gpio::configure(&mut rec, &config).unwrap();
    assert_eq!(
        rec.calls,
        vec![
            Call::OutputOptionsSet(Omode::OpenDrain, Ospd::Mhz25, 0x0088),
            Call::AfSet(7, 0x0088),
            Call::ModeSet(Ctl::Alternate, Pupd::PullUp, 0x0088),
        ]
    );
    assert_eq!(rec.port.alternate(3), 7);
    assert_eq!(rec.port.alternate(7), 7);
}

#[test]
fn write_then_read_on_zeroed_port() {
    let mut port = SimPort::new();
    gpio::write_pin(&mut port, pin(2), PinState::Set);
    assert_eq!(gpio::read_pin(&port, pin(2)), PinState::Set);
}

#[test]
fn input_never_touches_output_options_or_af() {
    for &pull in ALL_PULLS.iter() {
        for &speed in ALL_SPEEDS.iter() {
            let mut rec = Recorder::default();
            let config = PinConfig::new(PinMask::ALL, Mode::Input).pull(pull).speed(speed);
            gpio::configure(&mut rec, &config).unwrap();
            assert_eq!(
                rec.calls,
                vec![Call::ModeSet(Ctl::Input, pull.into(), 0xFFFF)]
            );
            assert_eq!(rec.port.ospd, 0);
        }
    }
}

#[test]
fn analog_passes_pull_through() {
    for &pull in ALL_PULLS.iter() {
        let mut rec = Recorder::default();
        let config = PinConfig::new(pin(0) | pin(15), Mode::Analog)
            .pull(pull)
            .speed(Speed::VeryHigh);
        gpio::configure(&mut rec, &config).unwrap();
        assert_eq!(
            rec.calls,
            vec![Call::ModeSet(Ctl::Analog, pull.into(), 0x8001)]
        );
    }
}

#[test]
fn output_options_precede_mode_for_every_mask() {
    for bits in [0x0001u32, 0x0020, 0x0300, 0x8000, 0xFFFF].iter().copied() {
        for &otype in ALL_TYPES.iter() {
            for &speed in ALL_SPEEDS.iter() {
                let mut rec = Recorder::default();
                let pins = PinMask::new(bits).unwrap();
                let config = PinConfig::new(pins, Mode::Output(otype)).speed(speed);
                gpio::configure(&mut rec, &config).unwrap();

                let options = rec
                    .position(|c| *c == Call::OutputOptionsSet(otype.into(), speed.into(), pins.bits()))
                    .expect("output options applied");
                let mode = rec
                    .position(|c| matches!(c, Call::ModeSet(Ctl::Output, _, p) if *p == pins.bits()))
                    .expect("mode applied");
                assert!(options < mode);
                assert!(rec.position(|c| matches!(c, Call::AfSet(..))).is_none());

                for n in pins.iter() {
                    assert_eq!(rec.port.output_type(n.number()), Omode::from(otype));
                    assert_eq!(rec.port.speed(n.number()), Ospd::from(speed));
                    assert_eq!(rec.port.mode(n.number()), Ctl::Output);
                }
            }
        }
    }
}

#[test]
fn af_selection_precedes_final_mode_write() {
    for n in 0..16u8 {
        let mut rec = Recorder::default();
        let config = PinConfig::new(pin(n).into(), Mode::Alternate(af(n), OutputType::PushPull));
        gpio::configure(&mut rec, &config).unwrap();

        let af_at = rec
            .position(|c| matches!(c, Call::AfSet(..)))
            .expect("af applied");
        let last_mode = rec
            .calls
            .iter()
            .rposition(|c| matches!(c, Call::ModeSet(..)))
            .expect("mode applied");
        assert!(af_at < last_mode);
        assert_eq!(rec.calls[af_at], Call::AfSet(n, 1 << n));
        assert_eq!(rec.port.alternate(n), n);
        assert_eq!(rec.port.mode(n), Ctl::Alternate);
    }
}

#[test]
fn reconfiguring_one_pin_keeps_neighbours() {
    let mut port = SimPort::new();
    let out = PinConfig::new(PinMask::ALL, Mode::Output(OutputType::OpenDrain)).speed(Speed::VeryHigh);
    gpio::configure(&mut port, &out).unwrap();
    gpio::configure(&mut port, &PinConfig::new(pin(4).into(), Mode::Input).pull(Pull::Down)).unwrap();

    assert_eq!(port.mode(4), Ctl::Input);
    assert_eq!(port.pull(4), Pupd::PullDown);
    // Input mode does not reprogram the output options
    assert_eq!(port.speed(4), Ospd::Mhz200);
    assert_eq!(port.mode(3), Ctl::Output);
    assert_eq!(port.mode(5), Ctl::Output);
}

#[test]
fn exti_request_is_observable() {
    init_logger();
    for &kind in [ExtiKind::Interrupt, ExtiKind::Event].iter() {
        for &edge in [Edge::Rising, Edge::Falling, Edge::RisingFalling].iter() {
            let mut rec = Recorder::default();
            let config = PinConfig::new(pin(0).into(), Mode::Input).exti(kind, edge);
            let result = gpio::configure(&mut rec, &config);
            assert!(matches!(result, Err(Error::Unimplemented(_))));
            assert_eq!(rec.calls, vec![Call::ModeSet(Ctl::Input, Pupd::None, 0x0001)]);
        }
    }
}

#[test]
fn round_trip_on_every_pin() {
    let mut port = SimPort::new();
    for n in 0..16u8 {
        for &state in [PinState::Set, PinState::Reset, PinState::Set].iter() {
            gpio::write_pin(&mut port, pin(n), state);
            assert_eq!(gpio::read_pin(&port, pin(n)), state);
        }
    }
}

#[test]
fn toggling_twice_restores_state() {
    let mut port = SimPort::new();
    gpio::write_pin(&mut port, pin(11), PinState::Set);
    for n in 0..16u8 {
        let before = gpio::read_pin(&port, pin(n));
        gpio::toggle_pin(&mut port, pin(n));
        assert_eq!(gpio::read_pin(&port, pin(n)), !before);
        gpio::toggle_pin(&mut port, pin(n));
        assert_eq!(gpio::read_pin(&port, pin(n)), before);
    }
}

#[test]
fn accessors_address_a_single_bit() {
    let mut rec = Recorder::default();
    gpio::write_pin(&mut rec, pin(9), PinState::Reset);
    gpio::toggle_pin(&mut rec, pin(9));
    assert_eq!(
        rec.calls,
        vec![Call::BitWrite(0x0200, false), Call::BitToggle(0x0200)]
    );
}

#[test]
fn read_follows_external_level() {
    let mut port = SimPort::new();
    gpio::configure(&mut port, &PinConfig::new(pin(1).into(), Mode::Input).pull(Pull::Up)).unwrap();
    port.drive(1, false);
    assert_eq!(gpio::read_pin(&port, pin(1)), PinState::Reset);
    port.drive(1, true);
    assert_eq!(gpio::read_pin(&port, pin(1)), PinState::Set);
}

#[test]
fn out_of_range_arguments_fail_at_the_boundary() {
    assert_eq!(PinId::new(16), Err(Error::PinOutOfRange(16)));
    assert_eq!(PinMask::new(0x0002_0000), Err(Error::InvalidPinMask(0x0002_0000)));
    assert!(AltFn::new(16).unwrap_err().is_invalid_argument());
    assert!(!Error::Unimplemented("x").is_invalid_argument());
}

#[test]
fn packed_records_go_through_the_same_translation() {
    init_logger();
    let mut rec = Recorder::default();
    let record = Packed {
        pin: 0x0088,
        mode: packed::MODE_AF_OD,
        pull: packed::PULLUP,
        speed: packed::SPEED_MEDIUM,
        alternate: 7,
    };
    packed::init(&mut rec, &record).unwrap();
    assert_eq!(
        rec.calls,
        vec![
            Call::OutputOptionsSet(Omode::OpenDrain, Ospd::Mhz25, 0x0088),
            Call::AfSet(7, 0x0088),
            Call::ModeSet(Ctl::Alternate, Pupd::PullUp, 0x0088),
        ]
    );

    let mut rec = Recorder::default();
    let record = Packed {
        pin: 0x0001,
        mode: packed::MODE_IT_FALLING,
        ..Packed::default()
    };
    assert!(matches!(
        packed::init(&mut rec, &record),
        Err(Error::Unimplemented(_))
    ));
    assert_eq!(rec.calls, vec![Call::ModeSet(Ctl::Input, Pupd::None, 0x0001)]);
}
