use avr_device::atmega328p::USART0;
use core::convert::Infallible;

use crate::config::{CONSOLE_BAUD, CPU_FREQ_HZ};

// (F_CPU / (16 * baud)) - 1, 103 at 16MHz / 9600
const UBRR: u16 = (CPU_FREQ_HZ / (16 * CONSOLE_BAUD) - 1) as u16;

/// Blocking transmit-only serial console on USART0, 8N1.
pub struct Console {
    usart: USART0,
}

impl Console {
    pub fn new(usart: USART0) -> Self {
        unsafe {
            usart.ubrr0.write(|w| w.bits(UBRR));
            usart.ucsr0c.write(|w| w.bits(0x06));
            usart.ucsr0b.write(|w| w.txen0().set_bit());
        }
        Self { usart }
    }

    pub fn write_byte(&mut self, byte: u8) {
        while self.usart.ucsr0a.read().udre0().bit_is_clear() {}
        unsafe {
            self.usart.udr0.write(|w| w.bits(byte));
        }
    }
}

impl ufmt::uWrite for Console {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
        for byte in s.bytes() {
            self.write_byte(byte);
        }
        Ok(())
    }
}
