// Licensed under the Apache-2.0 license

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
mod bringup {
    use cortex_m_rt::entry;
    use fugit::MillisDurationU32 as MilliSeconds;
    use panic_halt as _;
    use stm32f3_ddk::gpio::{AltFunction, Gpio, GpioPort, OutputType, PinMode, Pull};
    use stm32f3_ddk::i2c::{I2cController, I2cSpeed};
    use stm32f3_ddk::rcc::Rcc;
    use stm32f3_ddk::systick::SysTick;

    const PROBE_TARGET: u16 = 0x50;
    const SCL_PIN: u8 = 6;
    const SDA_PIN: u8 = 7;

    #[entry]
    fn main() -> ! {
        // Sole owner of each peripheral for the whole program
        let mut rcc = unsafe { Rcc::new() };
        let mut port_b = unsafe { Gpio::new(GpioPort::B) };
        let mut i2c = unsafe { I2cController::i2c1() };
        let mut systick = unsafe { SysTick::new() };

        rcc.enable_gpio(GpioPort::B);
        rcc.enable_i2c(i2c.instance());

        // PB6/PB7 carry I2C1 SCL/SDA on AF4, open drain with pull-ups
        for pin in [SCL_PIN, SDA_PIN] {
            port_b.set_mode(pin, PinMode::Alternate);
            port_b.set_output_type(pin, OutputType::OpenDrain);
            port_b.set_pull(pin, Pull::Up);
            port_b.set_alternate_function(pin, AltFunction::Af4);
        }

        i2c.init(&mut rcc, I2cSpeed::Fast);
        systick.delay(MilliSeconds::millis(10));

        // One probe write; the outcome is visible on a bus analyzer
        let _ = i2c.write(PROBE_TARGET, &[0x00]);

        loop {
            cortex_m::asm::wfi();
        }
    }
}

#[cfg(not(target_os = "none"))]
fn main() {}
