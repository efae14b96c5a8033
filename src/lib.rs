// Copyright 2023 The gd32f4xx-hal-compat authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Vendor-neutral GPIO and UART layer for the GD32F4xx family of microcontrollers
//!
//! Code written against a vendor-neutral peripheral API (pin configuration descriptors, pin
//! read/write/toggle, blocking UART transfers) runs on GD32F4xx parts through this crate. Each
//! abstract request is translated into calls on a low-level driver, which in turn touches the
//! registers.
//!
//! The low-level drivers are traits, [`gpio::GpioPeriph`] and [`uart::ll::UsartPeriph`], with two
//! implementations each:
//!
//! - [`gpio::regs::Port`] and [`uart::regs::Usart`] write the memory-mapped registers;
//! - [`gpio::sim::SimPort`] and [`uart::sim::SimUsart`] keep the same registers in memory, for
//!   host tests.
//!
//! The crate keeps no global state. Every operation takes the port or USART it works on.
//!
//! ## Usage
//!
//! ```no_run
//! use gd32f4xx_hal_compat::gpio::{self, regs::Port, AltFn, Mode, OutputType, PinConfig, PinId, Speed};
//!
//! // NOTE(unsafe) nothing else uses GPIOA
//! let mut gpioa = unsafe { Port::gpioa() };
//!
//! // USART0 TX on PA9
//! let tx = PinConfig::new(
//!     PinId::new(9)?.into(),
//!     Mode::Alternate(AltFn::new(7)?, OutputType::PushPull),
//! )
//! .speed(Speed::High);
//! gpio::configure(&mut gpioa, &tx)?;
//! # Ok::<(), gd32f4xx_hal_compat::Error>(())
//! ```
//!
//! ## Logging
//!
//! Configuration steps and UART state changes are reported through the [`log`] facade. Install
//! a logger in the application to see them.
//!
//! [`log`]: https://crates.io/crates/log

#![cfg_attr(not(test), no_std)]
#![deny(rustdoc::broken_intra_doc_links)]

mod error;
pub mod gpio;
pub mod prelude;
pub mod time;
pub mod uart;

pub use error::{Error, Result};
