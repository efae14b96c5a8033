// Copyright 2023 The gd32f4xx-hal-compat authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Blocking UART
//!
//! A UART handle with the state model of the vendor-neutral API: a global (transmit) state and
//! a receive state, an accumulated error code and polled, timeout-bounded transfers.
//!
//! ```
//! use gd32f4xx_hal_compat::prelude::*;
//! use gd32f4xx_hal_compat::uart::{sim::SimUsart, Config, State, Uart};
//!
//! let mut uart = Uart::new(SimUsart::new(), || 0u32);
//! uart.init(&Config::default().baudrate(115_200.bps()), 60.mhz().into())?;
//! uart.transmit(b"hello", 10)?;
//! assert_eq!(uart.state(), State::Ready);
//! # Ok::<(), gd32f4xx_hal_compat::uart::Error>(())
//! ```
//!
//! Interrupt and DMA driven transfers are not provided.

use core::fmt;
use core::ops::BitOr;

use log::{debug, warn};
use thiserror::Error;

use crate::time::{Bps, Hertz, Tick, U32Ext};

pub mod ll;
pub mod regs;
pub mod sim;

use ll::{Flag, UsartPeriph};

/// Number of data bits in a frame, parity bit included
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WordLength {
    DataBits8,
    DataBits9,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parity {
    ParityNone,
    ParityEven,
    ParityOdd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopBits {
    /// 1 stop bit
    STOP1,
    /// 0.5 stop bits
    STOP0P5,
    /// 2 stop bits
    STOP2,
    /// 1.5 stop bits
    STOP1P5,
}

/// Enabled transfer directions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Tx,
    Rx,
    TxRx,
}

/// Hardware flow control
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowControl {
    None,
    Rts,
    Cts,
    RtsCts,
}

/// Receiver oversampling
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Oversampling {
    Over16,
    Over8,
}

/// UART communication parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    pub baudrate: Bps,
    pub wordlength: WordLength,
    pub parity: Parity,
    pub stopbits: StopBits,
    pub direction: Direction,
    pub flow_control: FlowControl,
    pub oversampling: Oversampling,
}

impl Config {
    pub fn baudrate(mut self, baudrate: Bps) -> Self {
        self.baudrate = baudrate;
        self
    }

    pub fn parity_none(mut self) -> Self {
        self.parity = Parity::ParityNone;
        self
    }

    pub fn parity_even(mut self) -> Self {
        self.parity = Parity::ParityEven;
        self
    }

    pub fn parity_odd(mut self) -> Self {
        self.parity = Parity::ParityOdd;
        self
    }

    pub fn wordlength_8bits(mut self) -> Self {
        self.wordlength = WordLength::DataBits8;
        self
    }

    pub fn wordlength_9bits(mut self) -> Self {
        self.wordlength = WordLength::DataBits9;
        self
    }

    pub fn stopbits(mut self, stopbits: StopBits) -> Self {
        self.stopbits = stopbits;
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn flow_control(mut self, flow_control: FlowControl) -> Self {
        self.flow_control = flow_control;
        self
    }

    pub fn oversampling(mut self, oversampling: Oversampling) -> Self {
        self.oversampling = oversampling;
        self
    }

    /// Whether a frame carries 9 data bits, and so takes two bytes of a buffer.
    fn wide_frames(&self) -> bool {
        self.wordlength == WordLength::DataBits9 && self.parity == Parity::ParityNone
    }

    /// Data bits of a received frame, parity bit masked out.
    fn data_mask(&self) -> u16 {
        match (self.wordlength, self.parity) {
            (WordLength::DataBits9, Parity::ParityNone) => 0x1FF,
            (WordLength::DataBits8, Parity::ParityNone) => 0xFF,
            (WordLength::DataBits9, _) => 0xFF,
            (WordLength::DataBits8, _) => 0x7F,
        }
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            baudrate: 115_200_u32.bps(),
            wordlength: WordLength::DataBits8,
            parity: Parity::ParityNone,
            stopbits: StopBits::STOP1,
            direction: Direction::TxRx,
            flow_control: FlowControl::None,
            oversampling: Oversampling::Over16,
        }
    }
}

/// Computes the `BAUD` register value for `baudrate` from peripheral clock `pclk`.
pub fn baud_divider(pclk: Hertz, baudrate: Bps, oversampling: Oversampling) -> Result<u16, Error> {
    if baudrate.0 == 0 {
        return Err(Error::InvalidArgument("baud rate must be non-zero"));
    }
    let clk = u64::from(pclk.0);
    let baud = u64::from(baudrate.0);
    let udiv = match oversampling {
        Oversampling::Over16 => (clk + baud / 2) / baud,
        Oversampling::Over8 => (2 * clk + baud / 2) / baud,
    };
    // Range checks apply to the full divider, before the fraction is packed
    if udiv < 0x10 {
        return Err(Error::InvalidArgument("baud rate too high for peripheral clock"));
    }
    let udiv = cast::u16(udiv)
        .map_err(|_| Error::InvalidArgument("baud rate too low for peripheral clock"))?;
    Ok(match oversampling {
        Oversampling::Over16 => udiv,
        Oversampling::Over8 => (udiv & 0xFFF0) | ((udiv & 0xF) >> 1),
    })
}

/// Handle state, for the global (transmit) side and the receive side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Not initialised
    Reset,
    /// Initialised and idle
    Ready,
    /// Being initialised
    Busy,
    BusyTx,
    BusyRx,
    /// Transmitting and receiving at once
    BusyTxRx,
    /// The last transfer timed out
    Timeout,
    /// The last transfer failed, see [`Uart::error`]
    Error,
}

impl State {
    /// Combined view of the global and receive states.
    pub fn combine(global: State, rx: State) -> State {
        match (global, rx) {
            (State::BusyTx, State::BusyRx) => State::BusyTxRx,
            (State::Ready, State::BusyRx) | (State::Timeout, State::BusyRx) => State::BusyRx,
            (global, _) => global,
        }
    }

    /// Whether a new transfer may start from this global state.
    fn is_idle(self) -> bool {
        matches!(self, State::Ready | State::Timeout | State::Error)
    }
}

/// Accumulated transfer error flags
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorCode(u32);

impl ErrorCode {
    pub const NONE: ErrorCode = ErrorCode(0x00);
    /// Parity error
    pub const PE: ErrorCode = ErrorCode(0x01);
    /// Noise error
    pub const NE: ErrorCode = ErrorCode(0x02);
    /// Frame error
    pub const FE: ErrorCode = ErrorCode(0x04);
    /// Overrun error
    pub const ORE: ErrorCode = ErrorCode(0x08);
    /// DMA transfer error
    pub const DMA: ErrorCode = ErrorCode(0x10);

    #[inline]
    pub fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn contains(self, other: ErrorCode) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ErrorCode {
    type Output = ErrorCode;

    fn bitor(self, rhs: ErrorCode) -> ErrorCode {
        ErrorCode(self.0 | rhs.0)
    }
}

impl fmt::Debug for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("NONE");
        }
        let names = [
            (ErrorCode::PE, "PE"),
            (ErrorCode::NE, "NE"),
            (ErrorCode::FE, "FE"),
            (ErrorCode::ORE, "ORE"),
            (ErrorCode::DMA, "DMA"),
        ];
        let mut first = true;
        for (_, name) in names.iter().filter(|(code, _)| self.contains(*code)) {
            if !first {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
            first = false;
        }
        Ok(())
    }
}

/// UART errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Another transfer is still in progress.
    #[error("UART busy")]
    Busy,
    /// The handle has not been initialised.
    #[error("UART not initialised")]
    NotReady,
    /// A flag did not reach the expected state within the timeout.
    #[error("UART timeout")]
    Timeout,
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// The receiver reported a line error.
    #[error("UART transfer error: {0:?}")]
    Transfer(ErrorCode),
}

/// Coarse outcome of a call, as reported by the vendor-neutral API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
    Busy,
    Timeout,
}

impl<T> From<&Result<T, Error>> for Status {
    fn from(result: &Result<T, Error>) -> Status {
        match result {
            Ok(_) => Status::Ok,
            Err(Error::Busy) => Status::Busy,
            Err(Error::Timeout) => Status::Timeout,
            Err(_) => Status::Error,
        }
    }
}

const LINE_ERRORS: [(Flag, ErrorCode); 4] = [
    (Flag::Perr, ErrorCode::PE),
    (Flag::Nerr, ErrorCode::NE),
    (Flag::Ferr, ErrorCode::FE),
    (Flag::Orerr, ErrorCode::ORE),
];

/// UART handle over a low-level USART driver `U`, timed by `T`.
pub struct Uart<U, T> {
    usart: U,
    tick: T,
    config: Config,
    g_state: State,
    rx_state: State,
    error_code: ErrorCode,
    tx_xfer_size: u16,
    tx_xfer_count: u16,
    rx_xfer_size: u16,
    rx_xfer_count: u16,
}

impl<U: UsartPeriph, T: Tick> Uart<U, T> {
    /// Wraps `usart`. The handle starts in [`State::Reset`]; call [`Uart::init`] next.
    pub fn new(usart: U, tick: T) -> Self {
        Self {
            usart,
            tick,
            config: Config::default(),
            g_state: State::Reset,
            rx_state: State::Reset,
            error_code: ErrorCode::NONE,
            tx_xfer_size: 0,
            tx_xfer_count: 0,
            rx_xfer_size: 0,
            rx_xfer_count: 0,
        }
    }

    /// Programs the USART from `config` and enables it.
    ///
    /// `pclk` is the clock of the bus the USART sits on.
    pub fn init(&mut self, config: &Config, pclk: Hertz) -> Result<(), Error> {
        if !(self.g_state == State::Reset || self.g_state.is_idle()) || self.rx_state == State::BusyRx {
            return Err(Error::Busy);
        }
        let div = baud_divider(pclk, config.baudrate, config.oversampling)?;

        let previous = self.g_state;
        self.g_state = State::Busy;
        debug!("uart: {:?} -> Busy, init {:?} divider 0x{:04X}", previous, config, div);

        self.usart.disable();
        self.usart.configure(config);
        self.usart.baudrate_set(div);
        self.usart.enable();

        self.config = *config;
        self.error_code = ErrorCode::NONE;
        self.g_state = State::Ready;
        self.rx_state = State::Ready;
        Ok(())
    }

    /// Disables the USART and returns the handle to [`State::Reset`].
    pub fn deinit(&mut self) -> Result<(), Error> {
        if matches!(self.g_state, State::Busy | State::BusyTx) || self.rx_state == State::BusyRx {
            return Err(Error::Busy);
        }
        self.usart.disable();
        self.error_code = ErrorCode::NONE;
        self.g_state = State::Reset;
        self.rx_state = State::Reset;
        debug!("uart: deinit");
        Ok(())
    }

    /// Current combined state.
    pub fn state(&self) -> State {
        State::combine(self.g_state, self.rx_state)
    }

    /// Error flags recorded by the last failed reception.
    pub fn error(&self) -> ErrorCode {
        self.error_code
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Frames queued and frames still to send in the last transmission.
    pub fn tx_progress(&self) -> (u16, u16) {
        (self.tx_xfer_size, self.tx_xfer_count)
    }

    /// Frames expected and frames still to receive in the last reception.
    pub fn rx_progress(&self) -> (u16, u16) {
        (self.rx_xfer_size, self.rx_xfer_count)
    }

    /// Releases the low-level driver and the tick source.
    pub fn free(self) -> (U, T) {
        (self.usart, self.tick)
    }

    /// Frames in a buffer of `len` bytes.
    fn frames(&self, len: usize) -> Result<u16, Error> {
        if len == 0 {
            return Err(Error::InvalidArgument("empty buffer"));
        }
        let frames = if self.config.wide_frames() {
            if len % 2 != 0 {
                return Err(Error::InvalidArgument(
                    "9-bit frames need an even number of bytes",
                ));
            }
            len / 2
        } else {
            len
        };
        cast::u16(frames).map_err(|_| Error::InvalidArgument("buffer longer than 65535 frames"))
    }

    /// Spins until `flag` reads `set`, or `timeout_ms` has passed since `start`.
    fn wait_flag(&self, flag: Flag, start: u32, timeout_ms: u32) -> Result<(), Error> {
        while !self.usart.flag_get(flag) {
            if self.tick.elapsed_ms(start) >= timeout_ms {
                return Err(Error::Timeout);
            }
        }
        Ok(())
    }

    /// Sends `data`, blocking until the last frame has left the shift register.
    pub fn transmit(&mut self, data: &[u8], timeout_ms: u32) -> Result<(), Error> {
        match self.g_state {
            State::Reset => return Err(Error::NotReady),
            state if !state.is_idle() => return Err(Error::Busy),
            _ => {}
        }
        if self.config.direction == Direction::Rx {
            return Err(Error::InvalidArgument("transmitter not enabled"));
        }
        let frames = self.frames(data.len())?;

        self.error_code = ErrorCode::NONE;
        self.g_state = State::BusyTx;
        self.tx_xfer_size = frames;
        self.tx_xfer_count = frames;
        let start = self.tick.now_ms();

        let wide = self.config.wide_frames();
        let step = if wide { 2 } else { 1 };
        for chunk in data.chunks(step) {
            if let Err(e) = self.wait_flag(Flag::Tbe, start, timeout_ms) {
                return Err(self.tx_timed_out(e));
            }
            let frame = if wide {
                u16::from_le_bytes([chunk[0], chunk[1]]) & 0x1FF
            } else {
                u16::from(chunk[0])
            };
            self.usart.data_transmit(frame);
            self.tx_xfer_count -= 1;
        }
        if let Err(e) = self.wait_flag(Flag::Tc, start, timeout_ms) {
            return Err(self.tx_timed_out(e));
        }

        self.g_state = State::Ready;
        Ok(())
    }

    fn tx_timed_out(&mut self, e: Error) -> Error {
        warn!(
            "uart: transmit timed out with {} of {} frames left",
            self.tx_xfer_count, self.tx_xfer_size
        );
        self.g_state = State::Timeout;
        e
    }

    /// Receives exactly `buf.len()` bytes, blocking until they have arrived.
    ///
    /// The parity bit, when enabled, is stripped from every frame.
    pub fn receive(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<(), Error> {
        self.rx_ready()?;
        let frames = self.frames(buf.len())?;

        self.error_code = ErrorCode::NONE;
        self.rx_state = State::BusyRx;
        self.rx_xfer_size = frames;
        self.rx_xfer_count = frames;
        let start = self.tick.now_ms();

        let wide = self.config.wide_frames();
        let mask = self.config.data_mask();
        let step = if wide { 2 } else { 1 };
        for chunk in buf.chunks_mut(step) {
            if let Err(e) = self.wait_flag(Flag::Rbne, start, timeout_ms) {
                warn!(
                    "uart: receive timed out with {} of {} frames left",
                    self.rx_xfer_count, self.rx_xfer_size
                );
                self.rx_state = State::Ready;
                if self.g_state.is_idle() {
                    self.g_state = State::Timeout;
                }
                return Err(e);
            }
            let errors = self.line_errors();
            let frame = self.usart.data_receive() & mask;
            if !errors.is_none() {
                return Err(self.rx_failed(errors));
            }
            if wide {
                chunk.copy_from_slice(&frame.to_le_bytes());
            } else {
                chunk[0] = frame as u8;
            }
            self.rx_xfer_count -= 1;
        }

        self.rx_state = State::Ready;
        Ok(())
    }

    /// Checks that a reception may start.
    fn rx_ready(&self) -> Result<(), Error> {
        if self.g_state == State::Reset {
            return Err(Error::NotReady);
        }
        if self.rx_state != State::Ready {
            return Err(Error::Busy);
        }
        if self.config.direction == Direction::Tx {
            return Err(Error::InvalidArgument("receiver not enabled"));
        }
        Ok(())
    }

    /// Records line errors of a received frame and ends the reception.
    fn rx_failed(&mut self, errors: ErrorCode) -> Error {
        warn!("uart: receive error {:?}", errors);
        self.error_code = errors;
        self.rx_state = State::Ready;
        if self.g_state.is_idle() {
            self.g_state = State::Error;
        }
        Error::Transfer(errors)
    }

    /// Collects and clears the line error flags of the frame at the head of the receiver.
    fn line_errors(&mut self) -> ErrorCode {
        let mut code = ErrorCode::NONE;
        for &(flag, bit) in LINE_ERRORS.iter() {
            if self.usart.flag_get(flag) {
                self.usart.flag_clear(flag);
                code = code | bit;
            }
        }
        code
    }
}

impl<U: UsartPeriph, T: Tick> embedded_hal::serial::Read<u8> for Uart<U, T> {
    type Error = Error;

    fn read(&mut self) -> nb::Result<u8, Error> {
        self.rx_ready()?;
        if !self.usart.flag_get(Flag::Rbne) {
            return Err(nb::Error::WouldBlock);
        }
        let errors = self.line_errors();
        let frame = self.usart.data_receive() & self.config.data_mask();
        if errors.is_none() {
            Ok(frame as u8)
        } else {
            Err(nb::Error::Other(self.rx_failed(errors)))
        }
    }
}

impl<U: UsartPeriph, T: Tick> embedded_hal::serial::Write<u8> for Uart<U, T> {
    type Error = Error;

    fn write(&mut self, word: u8) -> nb::Result<(), Error> {
        match self.g_state {
            State::Reset => return Err(nb::Error::Other(Error::NotReady)),
            State::BusyTx => {}
            state if !state.is_idle() => return Err(nb::Error::Other(Error::Busy)),
            _ => {}
        }
        if self.config.direction == Direction::Rx {
            return Err(nb::Error::Other(Error::InvalidArgument(
                "transmitter not enabled",
            )));
        }
        if !self.usart.flag_get(Flag::Tbe) {
            return Err(nb::Error::WouldBlock);
        }
        self.usart.data_transmit(word.into());
        self.g_state = State::BusyTx;
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Error> {
        if self.g_state != State::BusyTx {
            return Ok(());
        }
        if !self.usart.flag_get(Flag::Tc) {
            return Err(nb::Error::WouldBlock);
        }
        self.g_state = State::Ready;
        Ok(())
    }
}
