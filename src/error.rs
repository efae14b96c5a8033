// Copyright 2023 The gd32f4xx-hal-compat authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// Errors raised at the boundary of the GPIO compatibility layer.
///
/// Register writes themselves cannot fail; every variant here describes a caller contract
/// violation or a feature that is not available yet.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Pin number outside 0-15.
    #[error("pin {0} out of range (0-15)")]
    PinOutOfRange(u8),
    /// Pin mask is empty or selects bits above pin 15.
    #[error("pin mask 0x{0:08X} is empty or selects pins above 15")]
    InvalidPinMask(u32),
    /// Alternate function number outside AF0-AF15.
    #[error("alternate function {0} out of range (0-15)")]
    InvalidAlternateFunction(u32),
    /// Any other argument that cannot be translated, e.g. an unknown field in a packed
    /// descriptor word.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// The requested configuration is recognised but not supported yet.
    #[error("not implemented: {0}")]
    Unimplemented(&'static str),
}

impl Error {
    /// Whether this error reports a malformed argument, as opposed to a missing feature.
    pub fn is_invalid_argument(&self) -> bool {
        !matches!(self, Error::Unimplemented(_))
    }
}

/// Result type alias for GPIO compatibility operations.
pub type Result<T> = core::result::Result<T, Error>;
