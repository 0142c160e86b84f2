//! Timer/Counter 1: 16-bit, two compare channels on PB1 (OC1A) and PB2 (OC1B).
//!
//! Waveform modes (datasheet table 16-4):
//!
//! | Mode | Operation                   | TOP    | Update of OCR1x | TOV1 set on |
//! |------|-----------------------------|--------|-----------------|-------------|
//! | 0    | Normal                      | 0xFFFF | Immediate       | MAX         |
//! | 1    | Phase correct PWM, 8-bit    | 0x00FF | TOP             | BOTTOM      |
//! | 2    | Phase correct PWM, 9-bit    | 0x01FF | TOP             | BOTTOM      |
//! | 3    | Phase correct PWM, 10-bit   | 0x03FF | TOP             | BOTTOM      |
//! | 4    | CTC                         | OCR1A  | Immediate       | MAX         |
//! | 5    | Fast PWM, 8-bit             | 0x00FF | BOTTOM          | TOP         |
//! | 6    | Fast PWM, 9-bit             | 0x01FF | BOTTOM          | TOP         |
//! | 7    | Fast PWM, 10-bit            | 0x03FF | BOTTOM          | TOP         |
//! | 8    | Phase & freq. correct PWM   | ICR1   | BOTTOM          | BOTTOM      |
//! | 9    | Phase & freq. correct PWM   | OCR1A  | BOTTOM          | BOTTOM      |
//! | 10   | Phase correct PWM           | ICR1   | TOP             | BOTTOM      |
//! | 11   | Phase correct PWM           | OCR1A  | TOP             | BOTTOM      |
//! | 12   | CTC                         | ICR1   | Immediate       | MAX         |
//! | 13   | Reserved                    | -      | -               | -           |
//! | 14   | Fast PWM                    | ICR1   | BOTTOM          | TOP         |
//! | 15   | Fast PWM                    | OCR1A  | BOTTOM          | TOP         |
//!
//! In modes 9, 11, 14 and 15 a Toggle output mode on channel A toggles OC1A
//! on every compare match while OC1B stays disconnected. In the phase
//! correct modes Clear and Set swap meaning with the counting direction.

use super::gpio::{Port, PortPin};
use super::regs::Reg;
use super::timer::{prescaler, ChannelBinding, TimerDevice, TimerEngine};
use super::waveform::WaveformMode;

pub enum Tc1 {}

pub type WaveformMode1 = WaveformMode<Tc1>;
pub type Timer1<B> = TimerEngine<Tc1, B, 2>;

impl WaveformMode<Tc1> {
    pub const NORMAL: Self = Self::fixed(0x00, 0xFFFF);
    pub const PWM_PHASE_CORRECT_8BIT: Self = Self::fixed(0x01, 0x00FF);
    pub const PWM_PHASE_CORRECT_9BIT: Self = Self::fixed(0x02, 0x01FF);
    pub const PWM_PHASE_CORRECT_10BIT: Self = Self::fixed(0x03, 0x03FF);
    pub const CTC_OCR1A: Self = Self::register(0x04, Reg::Ocr1a);
    pub const PWM_FAST_8BIT: Self = Self::fixed(0x05, 0x00FF);
    pub const PWM_FAST_9BIT: Self = Self::fixed(0x06, 0x01FF);
    pub const PWM_FAST_10BIT: Self = Self::fixed(0x07, 0x03FF);
    pub const PWM_PHASE_FREQ_CORRECT_ICR1: Self = Self::register(0x08, Reg::Icr1);
    pub const PWM_PHASE_FREQ_CORRECT_OCR1A: Self = Self::register(0x09, Reg::Ocr1a);
    pub const PWM_PHASE_CORRECT_ICR1: Self = Self::register(0x0A, Reg::Icr1);
    pub const PWM_PHASE_CORRECT_OCR1A: Self = Self::register(0x0B, Reg::Ocr1a);
    pub const CTC_ICR1: Self = Self::register(0x0C, Reg::Icr1);
    pub const PWM_FAST_ICR1: Self = Self::register(0x0E, Reg::Icr1);
    pub const PWM_FAST_OCR1A: Self = Self::register(0x0F, Reg::Ocr1a);
}

prescaler! {
    /// Clock select for Timer1 (CS12:0)
    Prescaler1 {
        Stop = 0x00 => None,
        Div1 = 0x01 => Some(1),
        Div8 = 0x02 => Some(8),
        Div64 = 0x03 => Some(64),
        Div256 = 0x04 => Some(256),
        Div1024 = 0x05 => Some(1024),
        /// External clock on T1, falling edge
        ExtFalling = 0x06 => None,
        /// External clock on T1, rising edge
        ExtRising = 0x07 => None,
    }
}

impl TimerDevice for Tc1 {
    type Resolution = u16;
    type Prescaler = Prescaler1;

    const NAME: &'static str = "TC1";
    const CONTROL_A: Reg = Reg::Tccr1a;
    const CONTROL_B: Reg = Reg::Tccr1b;
    const CONTROL_C: Option<Reg> = Some(Reg::Tccr1c);
    const COUNTER: Reg = Reg::Tcnt1;
    const INTERRUPT_MASK: Reg = Reg::Timsk1;
    const INTERRUPT_FLAGS: Reg = Reg::Tifr1;
    const FORCE_OUTPUT: Reg = Reg::Tccr1c;

    // WGM13:12 sit in bits 4:3 of TCCR1B
    const WGM_B_MASK: u8 = 0x0C;
    // ICF1, OCF1B, OCF1A, TOV1
    const FLAG_MASK: u8 = 0x27;

    const CHANNELS: &'static [ChannelBinding] = &[
        ChannelBinding {
            compare: Reg::Ocr1a,
            output_shift: 6,
            interrupt_bit: 1,
            force_bit: 7,
            pin: PortPin::new(Port::B, 1),
        },
        ChannelBinding {
            compare: Reg::Ocr1b,
            output_shift: 4,
            interrupt_bit: 2,
            force_bit: 6,
            pin: PortPin::new(Port::B, 2),
        },
    ];

    const WAVEFORM_MODES: &'static [WaveformMode<Self>] = &[
        WaveformMode1::NORMAL,
        WaveformMode1::PWM_PHASE_CORRECT_8BIT,
        WaveformMode1::PWM_PHASE_CORRECT_9BIT,
        WaveformMode1::PWM_PHASE_CORRECT_10BIT,
        WaveformMode1::CTC_OCR1A,
        WaveformMode1::PWM_FAST_8BIT,
        WaveformMode1::PWM_FAST_9BIT,
        WaveformMode1::PWM_FAST_10BIT,
        WaveformMode1::PWM_PHASE_FREQ_CORRECT_ICR1,
        WaveformMode1::PWM_PHASE_FREQ_CORRECT_OCR1A,
        WaveformMode1::PWM_PHASE_CORRECT_ICR1,
        WaveformMode1::PWM_PHASE_CORRECT_OCR1A,
        WaveformMode1::CTC_ICR1,
        WaveformMode1::PWM_FAST_ICR1,
        WaveformMode1::PWM_FAST_OCR1A,
    ];
}
