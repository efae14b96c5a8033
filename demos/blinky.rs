//! Blinks an LED
//!
//! This assumes that an LED is connected to pb2 and that the core runs from the 16 MHz internal
//! oscillator selected at reset.

#![no_std]
#![no_main]

use panic_halt as _;

use cortex_m::delay::Delay;
use cortex_m_rt::entry;
use gd32f4xx_hal_compat::gpio::{self, regs::Port, Mode, OutputType, PinConfig, PinId, Speed};
use volatile_register::RW;

/// `RCU_AHB1EN`, clock enables of the AHB1 peripherals
const RCU_AHB1EN: usize = 0x4002_3830;
const RCU_AHB1EN_PBEN: u32 = 1 << 1;
const IRC16M: u32 = 16_000_000;

#[entry]
fn main() -> ! {
    let cp = cortex_m::Peripherals::take().unwrap();

    // NOTE(unsafe) single read-modify-write before anything else runs
    unsafe {
        let ahb1en = &*(RCU_AHB1EN as *const RW<u32>);
        ahb1en.modify(|r| r | RCU_AHB1EN_PBEN);
    }

    // NOTE(unsafe) nothing else uses GPIOB
    let mut gpiob = unsafe { Port::gpiob() };
    let led = PinId::new(2).unwrap();
    let config = PinConfig::new(led.into(), Mode::Output(OutputType::PushPull)).speed(Speed::Low);
    gpio::configure(&mut gpiob, &config).unwrap();

    let mut delay = Delay::new(cp.SYST, IRC16M);

    loop {
        gpio::toggle_pin(&mut gpiob, led);
        delay.delay_ms(500);
    }
}
