// Copyright 2023 The gd32f4xx-hal-compat authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # General Purpose Input / Output
//!
//! Vendor-neutral pin configuration and pin I/O on top of a low-level GPIO driver.
//!
//! A [`PinConfig`] describes the desired configuration of one or more pins of a single port.
//! [`configure`] translates it into calls on a [`GpioPeriph`], the capability set of the
//! low-level driver. The translation keeps the ordering the hardware needs:
//!
//! - output type and speed are programmed before the mode register commits a pin to an output
//!   mode;
//! - the alternate function is selected before the mode register switches the pin to
//!   alternate-function mode;
//! - input and analog pins only get a mode and pull write.
//!
//! ```
//! use gd32f4xx_hal_compat::gpio::{self, sim::SimPort, Mode, OutputType, PinConfig, PinId, PinState, Speed};
//!
//! let mut port = SimPort::new();
//! let led = PinId::new(5)?;
//! gpio::configure(&mut port, &PinConfig::new(led.into(), Mode::Output(OutputType::PushPull)).speed(Speed::High))?;
//! gpio::write_pin(&mut port, led, PinState::Set);
//! assert_eq!(gpio::read_pin(&port, led), PinState::Set);
//! # Ok::<(), gd32f4xx_hal_compat::Error>(())
//! ```
//!
//! ## Concurrency
//!
//! Configuration is a sequence of separate read-modify-write operations on the port registers.
//! Nothing in this module masks interrupts. If an interrupt handler touches the same port,
//! either use [`configure_exclusive`] or otherwise keep the handler out while configuring.

use core::convert::{Infallible, TryFrom};
use core::ops::{BitOr, Not};

use embedded_hal::digital::v2::{InputPin, OutputPin, StatefulOutputPin, ToggleableOutputPin};
use log::{debug, trace, warn};

use crate::error::{Error, Result};

pub mod ll;
pub mod packed;
pub mod regs;
pub mod sim;

pub use ll::GpioPeriph;
use ll::{Af, Ctl, Omode, Ospd, Pupd};

/// Number of pins in a port.
pub const PINS_PER_PORT: u8 = 16;

/// A single pin of a port, 0 to 15.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PinId(u8);

impl PinId {
    /// Creates a pin id, returning an error if the number is out of range.
    pub fn new(n: u8) -> Result<Self> {
        if n < PINS_PER_PORT {
            Ok(PinId(n))
        } else {
            Err(Error::PinOutOfRange(n))
        }
    }

    /// Pin number.
    #[inline]
    pub fn number(self) -> u8 {
        self.0
    }

    /// Single-bit mask for register operations.
    #[inline]
    pub fn mask(self) -> u16 {
        1 << self.0
    }
}

impl TryFrom<u8> for PinId {
    type Error = Error;

    fn try_from(n: u8) -> Result<Self> {
        PinId::new(n)
    }
}

/// A non-empty set of pins of one port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PinMask(u16);

impl PinMask {
    /// All 16 pins of a port.
    pub const ALL: PinMask = PinMask(0xFFFF);

    /// Creates a mask from raw bits. Bit `n` selects pin `n`.
    ///
    /// Fails if no pin is selected or if bits above pin 15 are set.
    pub fn new(bits: u32) -> Result<Self> {
        match u16::try_from(bits) {
            Ok(bits) if bits != 0 => Ok(PinMask(bits)),
            _ => Err(Error::InvalidPinMask(bits)),
        }
    }

    /// Creates a mask from a list of pin numbers.
    pub fn from_pins(pins: &[u8]) -> Result<Self> {
        let bits = pins.iter().try_fold(0u16, |bits, &n| {
            PinId::new(n).map(|pin| bits | pin.mask())
        })?;
        PinMask::new(bits.into())
    }

    #[inline]
    pub fn bits(self) -> u16 {
        self.0
    }

    #[inline]
    pub fn contains(self, pin: PinId) -> bool {
        self.0 & pin.mask() != 0
    }

    /// Iterates over the selected pins, lowest first.
    pub fn iter(self) -> impl Iterator<Item = PinId> {
        (0..PINS_PER_PORT)
            .map(PinId)
            .filter(move |pin| self.contains(*pin))
    }
}

impl From<PinId> for PinMask {
    fn from(pin: PinId) -> Self {
        PinMask(pin.mask())
    }
}

impl BitOr for PinMask {
    type Output = PinMask;

    fn bitor(self, rhs: PinMask) -> PinMask {
        PinMask(self.0 | rhs.0)
    }
}

impl BitOr<PinId> for PinMask {
    type Output = PinMask;

    fn bitor(self, rhs: PinId) -> PinMask {
        PinMask(self.0 | rhs.mask())
    }
}

impl BitOr for PinId {
    type Output = PinMask;

    fn bitor(self, rhs: PinId) -> PinMask {
        PinMask(self.mask() | rhs.mask())
    }
}

/// Logic level of a pin
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PinState {
    Reset,
    Set,
}

impl From<bool> for PinState {
    fn from(high: bool) -> Self {
        if high {
            PinState::Set
        } else {
            PinState::Reset
        }
    }
}

impl From<PinState> for bool {
    fn from(state: PinState) -> bool {
        state == PinState::Set
    }
}

impl From<embedded_hal::digital::v2::PinState> for PinState {
    fn from(state: embedded_hal::digital::v2::PinState) -> Self {
        match state {
            embedded_hal::digital::v2::PinState::High => PinState::Set,
            embedded_hal::digital::v2::PinState::Low => PinState::Reset,
        }
    }
}

impl From<PinState> for embedded_hal::digital::v2::PinState {
    fn from(state: PinState) -> Self {
        match state {
            PinState::Set => embedded_hal::digital::v2::PinState::High,
            PinState::Reset => embedded_hal::digital::v2::PinState::Low,
        }
    }
}

impl Not for PinState {
    type Output = PinState;

    fn not(self) -> PinState {
        match self {
            PinState::Set => PinState::Reset,
            PinState::Reset => PinState::Set,
        }
    }
}

/// Internal pull resistor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pull {
    None,
    Up,
    Down,
}

/// Slew rates available for Output and Alternate pins
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Speed {
    /// 2 MHz
    Low,
    /// 25 MHz
    Medium,
    /// 50 MHz
    High,
    /// 200 MHz
    VeryHigh,
}

/// Output driver type
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputType {
    /// Drives both levels
    PushPull,
    /// Drives low only, relies on a pull resistor for high
    OpenDrain,
}

/// Alternate function number, AF0 to AF15.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AltFn(u8);

impl AltFn {
    pub fn new(n: u8) -> Result<Self> {
        if n < 16 {
            Ok(AltFn(n))
        } else {
            Err(Error::InvalidAlternateFunction(n.into()))
        }
    }

    #[inline]
    pub fn number(self) -> u8 {
        self.0
    }
}

/// Pin mode. The output type only exists for the modes where the hardware uses it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Input,
    Output(OutputType),
    Alternate(AltFn, OutputType),
    Analog,
}

/// Whether an external line raises an interrupt or only an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtiKind {
    Interrupt,
    Event,
}

/// A pulse edge, used to trigger interrupts and events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
    RisingFalling,
}

/// External interrupt/event sub-mode of a pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Exti {
    pub kind: ExtiKind,
    pub edge: Edge,
}

/// Desired configuration for one or more pins of a port.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinConfig {
    pub pins: PinMask,
    pub mode: Mode,
    pub pull: Pull,
    /// Only used in output and alternate modes.
    pub speed: Speed,
    pub exti: Option<Exti>,
}

impl PinConfig {
    /// Configuration for `pins` in `mode`, no pull, low speed, no external interrupt.
    pub fn new(pins: PinMask, mode: Mode) -> Self {
        Self {
            pins,
            mode,
            pull: Pull::None,
            speed: Speed::Low,
            exti: None,
        }
    }

    pub fn pull(mut self, pull: Pull) -> Self {
        self.pull = pull;
        self
    }

    pub fn speed(mut self, speed: Speed) -> Self {
        self.speed = speed;
        self
    }

    pub fn exti(mut self, kind: ExtiKind, edge: Edge) -> Self {
        self.exti = Some(Exti { kind, edge });
        self
    }
}

impl From<Pull> for Pupd {
    fn from(pull: Pull) -> Self {
        match pull {
            Pull::None => Pupd::None,
            Pull::Up => Pupd::PullUp,
            Pull::Down => Pupd::PullDown,
        }
    }
}

impl From<Speed> for Ospd {
    fn from(speed: Speed) -> Self {
        match speed {
            Speed::Low => Ospd::Mhz2,
            Speed::Medium => Ospd::Mhz25,
            Speed::High => Ospd::Mhz50,
            Speed::VeryHigh => Ospd::Mhz200,
        }
    }
}

impl From<OutputType> for Omode {
    fn from(otype: OutputType) -> Self {
        match otype {
            OutputType::PushPull => Omode::PushPull,
            OutputType::OpenDrain => Omode::OpenDrain,
        }
    }
}

impl From<AltFn> for Af {
    fn from(af: AltFn) -> Self {
        Af(af.0)
    }
}

/// Applies `config` to its pins on `port`.
///
/// The pin part of the configuration is always applied. A configuration that also asks for an
/// external interrupt or event returns [`Error::Unimplemented`] afterwards, since EXTI lines are
/// not wired up by this layer.
pub fn configure<P>(port: &mut P, config: &PinConfig) -> Result<()>
where
    P: GpioPeriph + ?Sized,
{
    let pins = config.pins.bits();
    let pull = Pupd::from(config.pull);
    debug!("gpio: configure pins 0x{:04X} as {:?}, pull {:?}", pins, config.mode, config.pull);

    match config.mode {
        Mode::Input => {
            trace!("gpio: mode_set({:?}, {:?})", Ctl::Input, pull);
            port.mode_set(Ctl::Input, pull, pins);
        }
        Mode::Output(otype) => {
            let (omode, ospd) = (Omode::from(otype), Ospd::from(config.speed));
            trace!("gpio: output_options_set({:?}, {:?})", omode, ospd);
            port.output_options_set(omode, ospd, pins);
            trace!("gpio: mode_set({:?}, {:?})", Ctl::Output, pull);
            port.mode_set(Ctl::Output, pull, pins);
        }
        Mode::Alternate(af, otype) => {
            let (omode, ospd) = (Omode::from(otype), Ospd::from(config.speed));
            trace!("gpio: output_options_set({:?}, {:?})", omode, ospd);
            port.output_options_set(omode, ospd, pins);
            trace!("gpio: af_set(AF{})", af.number());
            port.af_set(af.into(), pins);
            trace!("gpio: mode_set({:?}, {:?})", Ctl::Alternate, pull);
            port.mode_set(Ctl::Alternate, pull, pins);
        }
        Mode::Analog => {
            trace!("gpio: mode_set({:?}, {:?})", Ctl::Analog, pull);
            port.mode_set(Ctl::Analog, pull, pins);
        }
    }

    if let Some(exti) = config.exti {
        warn!(
            "gpio: pins 0x{:04X} request {:?} on {:?} edge, EXTI is not supported",
            pins, exti.kind, exti.edge
        );
        return Err(Error::Unimplemented("EXTI interrupt/event configuration"));
    }
    Ok(())
}

/// [`configure`] inside a critical section, for ports shared with interrupt handlers.
pub fn configure_exclusive<P>(port: &mut P, config: &PinConfig) -> Result<()>
where
    P: GpioPeriph + ?Sized,
{
    critical_section::with(|_| configure(port, config))
}

/// Reads the input level of one pin.
#[inline]
pub fn read_pin<P>(port: &P, pin: PinId) -> PinState
where
    P: GpioPeriph + ?Sized,
{
    if port.input_bit_get(pin.mask()) {
        PinState::Set
    } else {
        PinState::Reset
    }
}

/// Sets the output level of one pin.
#[inline]
pub fn write_pin<P>(port: &mut P, pin: PinId, state: PinState)
where
    P: GpioPeriph + ?Sized,
{
    port.bit_write(pin.mask(), state.into())
}

/// Inverts the output level of one pin.
#[inline]
pub fn toggle_pin<P>(port: &mut P, pin: PinId)
where
    P: GpioPeriph + ?Sized,
{
    port.bit_toggle(pin.mask())
}

/// One pin of a borrowed port, usable wherever embedded-hal digital pins are expected.
///
/// The pin is not reconfigured; call [`configure`] first.
pub struct PortPin<'a, P: GpioPeriph + ?Sized> {
    port: &'a mut P,
    pin: PinId,
}

impl<'a, P: GpioPeriph + ?Sized> PortPin<'a, P> {
    pub fn new(port: &'a mut P, pin: PinId) -> Self {
        Self { port, pin }
    }

    #[inline]
    pub fn pin(&self) -> PinId {
        self.pin
    }

    /// Level currently held in the output latch.
    #[inline]
    pub fn output_state(&self) -> PinState {
        self.port.output_bit_get(self.pin.mask()).into()
    }
}

impl<'a, P: GpioPeriph + ?Sized> InputPin for PortPin<'a, P> {
    type Error = Infallible;

    #[inline]
    fn is_high(&self) -> core::result::Result<bool, Self::Error> {
        Ok(read_pin(&*self.port, self.pin) == PinState::Set)
    }

    #[inline]
    fn is_low(&self) -> core::result::Result<bool, Self::Error> {
        self.is_high().map(|b| !b)
    }
}

impl<'a, P: GpioPeriph + ?Sized> OutputPin for PortPin<'a, P> {
    type Error = Infallible;

    #[inline]
    fn set_high(&mut self) -> core::result::Result<(), Self::Error> {
        write_pin(&mut *self.port, self.pin, PinState::Set);
        Ok(())
    }

    #[inline]
    fn set_low(&mut self) -> core::result::Result<(), Self::Error> {
        write_pin(&mut *self.port, self.pin, PinState::Reset);
        Ok(())
    }
}

impl<'a, P: GpioPeriph + ?Sized> StatefulOutputPin for PortPin<'a, P> {
    #[inline]
    fn is_set_high(&self) -> core::result::Result<bool, Self::Error> {
        Ok(self.output_state() == PinState::Set)
    }

    #[inline]
    fn is_set_low(&self) -> core::result::Result<bool, Self::Error> {
        Ok(self.output_state() == PinState::Reset)
    }
}

impl<'a, P: GpioPeriph + ?Sized> ToggleableOutputPin for PortPin<'a, P> {
    type Error = Infallible;

    #[inline(always)]
    fn toggle(&mut self) -> core::result::Result<(), Self::Error> {
        toggle_pin(&mut *self.port, self.pin);
        Ok(())
    }
}
