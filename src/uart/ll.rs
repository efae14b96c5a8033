// Copyright 2023 The gd32f4xx-hal-compat authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-level USART driver interface, in the vocabulary of the GD32F4xx firmware library.

use super::Config;

/// Status flags of the `STAT0` register, by bit position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Flag {
    /// Parity error
    Perr = 0,
    /// Frame error
    Ferr = 1,
    /// Noise error
    Nerr = 2,
    /// Overrun error
    Orerr = 3,
    /// Idle line detected
    Idle = 4,
    /// Read data buffer not empty
    Rbne = 5,
    /// Transmission complete
    Tc = 6,
    /// Transmit data buffer empty
    Tbe = 7,
}

impl Flag {
    #[inline]
    pub fn mask(self) -> u32 {
        1 << (self as u8)
    }
}

/// Low-level driver for one USART.
pub trait UsartPeriph {
    /// Programs word length, parity, stop bits, direction, flow control and oversampling.
    /// The baud rate divider and the enable bit are left alone.
    fn configure(&mut self, config: &Config);

    /// Writes the `BAUD` register.
    fn baudrate_set(&mut self, div: u16);

    /// Sets `UEN`.
    fn enable(&mut self);

    /// Clears `UEN`.
    fn disable(&mut self);

    fn flag_get(&self, flag: Flag) -> bool;

    /// Clears a status flag, using whatever sequence the hardware needs for it.
    ///
    /// Clearing a line error flag must not consume a received frame. Where the hardware clears
    /// those flags on the next `data_receive`, this may do nothing.
    fn flag_clear(&mut self, flag: Flag);

    /// Writes one frame to the transmit data buffer.
    fn data_transmit(&mut self, data: u16);

    /// Reads one frame from the receive data buffer.
    fn data_receive(&mut self) -> u16;
}
