//! Timer/Counter 2: 8-bit, two compare channels on PB3 (OC2A) and PD3 (OC2B).
//!
//! Same waveform table as Timer0 with OCR2A as the register TOP. The clock
//! select table differs: Timer2 has /32 and /128 and no external clock input.

use super::gpio::{Port, PortPin};
use super::regs::Reg;
use super::timer::{prescaler, ChannelBinding, TimerDevice, TimerEngine};
use super::waveform::WaveformMode;

pub enum Tc2 {}

pub type WaveformMode2 = WaveformMode<Tc2>;
pub type Timer2<B> = TimerEngine<Tc2, B, 2>;

impl WaveformMode<Tc2> {
    pub const NORMAL: Self = Self::fixed(0x00, 0xFF);
    pub const PWM_PHASE_CORRECT: Self = Self::fixed(0x01, 0xFF);
    pub const CTC_OCR2A: Self = Self::register(0x02, Reg::Ocr2a);
    pub const PWM_FAST: Self = Self::fixed(0x03, 0xFF);
    pub const PWM_PHASE_CORRECT_OCR2A: Self = Self::register(0x05, Reg::Ocr2a);
    pub const PWM_FAST_OCR2A: Self = Self::register(0x07, Reg::Ocr2a);
}

prescaler! {
    /// Clock select for Timer2 (CS22:0)
    Prescaler2 {
        Stop = 0x00 => None,
        Div1 = 0x01 => Some(1),
        Div8 = 0x02 => Some(8),
        Div32 = 0x03 => Some(32),
        Div64 = 0x04 => Some(64),
        Div128 = 0x05 => Some(128),
        Div256 = 0x06 => Some(256),
        Div1024 = 0x07 => Some(1024),
    }
}

impl TimerDevice for Tc2 {
    type Resolution = u8;
    type Prescaler = Prescaler2;

    const NAME: &'static str = "TC2";
    const CONTROL_A: Reg = Reg::Tccr2a;
    const CONTROL_B: Reg = Reg::Tccr2b;
    const CONTROL_C: Option<Reg> = None;
    const COUNTER: Reg = Reg::Tcnt2;
    const INTERRUPT_MASK: Reg = Reg::Timsk2;
    const INTERRUPT_FLAGS: Reg = Reg::Tifr2;
    const FORCE_OUTPUT: Reg = Reg::Tccr2b;

    const WGM_B_MASK: u8 = 0x04;
    const FLAG_MASK: u8 = 0x07;

    const CHANNELS: &'static [ChannelBinding] = &[
        ChannelBinding {
            compare: Reg::Ocr2a,
            output_shift: 6,
            interrupt_bit: 1,
            force_bit: 7,
            pin: PortPin::new(Port::B, 3),
        },
        ChannelBinding {
            compare: Reg::Ocr2b,
            output_shift: 4,
            interrupt_bit: 2,
            force_bit: 6,
            pin: PortPin::new(Port::D, 3),
        },
    ];

    const WAVEFORM_MODES: &'static [WaveformMode<Self>] = &[
        WaveformMode2::NORMAL,
        WaveformMode2::PWM_PHASE_CORRECT,
        WaveformMode2::CTC_OCR2A,
        WaveformMode2::PWM_FAST,
        WaveformMode2::PWM_PHASE_CORRECT_OCR2A,
        WaveformMode2::PWM_FAST_OCR2A,
    ];
}
