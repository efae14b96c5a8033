// Copyright 2023 The gd32f4xx-hal-compat authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

pub use crate::gpio::GpioPeriph as _gd32f4xx_hal_compat_gpio_GpioPeriph;
pub use crate::time::Tick as _gd32f4xx_hal_compat_time_Tick;
pub use crate::time::U32Ext as _gd32f4xx_hal_compat_time_U32Ext;
pub use crate::uart::ll::UsartPeriph as _gd32f4xx_hal_compat_uart_ll_UsartPeriph;
pub use embedded_hal::prelude::*;
