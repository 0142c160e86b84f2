//! Timer/Counter 0: 8-bit, two compare channels on PD6 (OC0A) and PD5 (OC0B).
//!
//! Waveform modes (datasheet table 15-8):
//!
//! | Mode | Operation         | TOP   | Update of OCR0x | TOV0 set on |
//! |------|-------------------|-------|-----------------|-------------|
//! | 0    | Normal            | 0xFF  | Immediate       | MAX         |
//! | 1    | Phase correct PWM | 0xFF  | TOP             | BOTTOM      |
//! | 2    | CTC               | OCR0A | Immediate       | MAX         |
//! | 3    | Fast PWM          | 0xFF  | BOTTOM          | MAX         |
//! | 4    | Reserved          | -     | -               | -           |
//! | 5    | Phase correct PWM | OCR0A | TOP             | BOTTOM      |
//! | 6    | Reserved          | -     | -               | -           |
//! | 7    | Fast PWM          | OCR0A | BOTTOM          | TOP         |

use super::gpio::{Port, PortPin};
use super::regs::Reg;
use super::timer::{prescaler, ChannelBinding, TimerDevice, TimerEngine};
use super::waveform::WaveformMode;

pub enum Tc0 {}

pub type WaveformMode0 = WaveformMode<Tc0>;
pub type Timer0<B> = TimerEngine<Tc0, B, 2>;

impl WaveformMode<Tc0> {
    pub const NORMAL: Self = Self::fixed(0x00, 0xFF);
    pub const PWM_PHASE_CORRECT: Self = Self::fixed(0x01, 0xFF);
    pub const CTC_OCR0A: Self = Self::register(0x02, Reg::Ocr0a);
    pub const PWM_FAST: Self = Self::fixed(0x03, 0xFF);
    pub const PWM_PHASE_CORRECT_OCR0A: Self = Self::register(0x05, Reg::Ocr0a);
    pub const PWM_FAST_OCR0A: Self = Self::register(0x07, Reg::Ocr0a);
}

prescaler! {
    /// Clock select for Timer0 (CS02:0)
    Prescaler0 {
        Stop = 0x00 => None,
        Div1 = 0x01 => Some(1),
        Div8 = 0x02 => Some(8),
        Div64 = 0x03 => Some(64),
        Div256 = 0x04 => Some(256),
        Div1024 = 0x05 => Some(1024),
        /// External clock on T0, falling edge
        ExtFalling = 0x06 => None,
        /// External clock on T0, rising edge
        ExtRising = 0x07 => None,
    }
}

impl TimerDevice for Tc0 {
    type Resolution = u8;
    type Prescaler = Prescaler0;

    const NAME: &'static str = "TC0";
    const CONTROL_A: Reg = Reg::Tccr0a;
    const CONTROL_B: Reg = Reg::Tccr0b;
    const CONTROL_C: Option<Reg> = None;
    const COUNTER: Reg = Reg::Tcnt0;
    const INTERRUPT_MASK: Reg = Reg::Timsk0;
    const INTERRUPT_FLAGS: Reg = Reg::Tifr0;
    const FORCE_OUTPUT: Reg = Reg::Tccr0b;

    // WGM02 sits in bit 3 of TCCR0B
    const WGM_B_MASK: u8 = 0x04;
    const FLAG_MASK: u8 = 0x07;

    const CHANNELS: &'static [ChannelBinding] = &[
        ChannelBinding {
            compare: Reg::Ocr0a,
            output_shift: 6,
            interrupt_bit: 1,
            force_bit: 7,
            pin: PortPin::new(Port::D, 6),
        },
        ChannelBinding {
            compare: Reg::Ocr0b,
            output_shift: 4,
            interrupt_bit: 2,
            force_bit: 6,
            pin: PortPin::new(Port::D, 5),
        },
    ];

    const WAVEFORM_MODES: &'static [WaveformMode<Self>] = &[
        WaveformMode0::NORMAL,
        WaveformMode0::PWM_PHASE_CORRECT,
        WaveformMode0::CTC_OCR0A,
        WaveformMode0::PWM_FAST,
        WaveformMode0::PWM_PHASE_CORRECT_OCR0A,
        WaveformMode0::PWM_FAST_OCR0A,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::timer::ClockSelect;
    use crate::Error;

    #[test]
    fn prescaler_matches_clock_select_table() {
        assert_eq!(Prescaler0::Div64.bits(), 0x03);
        assert_eq!(Prescaler0::ExtRising.bits(), 0x07);
        assert_eq!(Prescaler0::Div1024.divisor(), Some(1024));
        assert_eq!(Prescaler0::ExtFalling.divisor(), None);
        assert_eq!(Prescaler0::from_divisor(256), Ok(Prescaler0::Div256));
        assert_eq!(Prescaler0::from_divisor(32), Err(Error::UnsupportedDivisor(32)));
    }

    #[test]
    fn catalog_skips_reserved_modes() {
        let bits: Vec<u8> = WaveformMode0::catalog().iter().map(|m| m.mode()).collect();
        assert_eq!(bits, [0, 1, 2, 3, 5, 7]);
    }
}
