//! Configuration constants for the timer layer

/// CPU frequency in Hz, published by the build script
pub const CPU_FREQ_HZ: u32 = parse_hz(env!("MCU_FREQ_HZ"));

/// Console (USART0) baud rate
pub const CONSOLE_BAUD: u32 = 9600;

/// Clock division applied to Timer0 while it serves as the timebase
pub const CLOCK_PRESCALE: u32 = 64;

const fn parse_hz(s: &str) -> u32 {
    let bytes = s.as_bytes();
    let mut value = 0u32;
    let mut i = 0;
    while i < bytes.len() {
        value = value * 10 + (bytes[i] - b'0') as u32;
        i += 1;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_frequency() {
        assert_eq!(parse_hz("16000000"), 16_000_000);
        assert_eq!(parse_hz("8000000"), 8_000_000);
    }

    #[test]
    fn frequency_is_whole_megahertz() {
        // checked at compile time by the clock module as well
        assert_eq!(CPU_FREQ_HZ % 1_000_000, 0);
    }
}
