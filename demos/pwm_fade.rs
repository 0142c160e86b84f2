//! Fades an LED on PB1 (Arduino D9) with Timer1 10-bit fast PWM and plays a
//! 440 Hz square wave on PB3 (D11) from Timer2 in CTC toggle mode. Timer0
//! keeps time for the fade. Register contents go out on USART0 at start-up.

#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]

use panic_halt as _;

use atmega328p_timers::clock::{self, Clock};
use atmega328p_timers::diagnostics;
use atmega328p_timers::hal::{
    ctc_top, Channel, CompareOutputMode, Console, Prescaler1, Prescaler2, Tc2, Timer1, Timer2,
    TimerBuses, WaveformMode1, WaveformMode2,
};
use avr_device::atmega328p::Peripherals;
use embedded_hal::blocking::delay::DelayMs;

const TONE_HZ: u32 = 440;
const FADE_STEP: u16 = 8;

#[avr_device::interrupt(atmega328p)]
fn TIMER0_OVF() {
    clock::TICKS.on_overflow();
}

#[avr_device::entry]
fn main() -> ! {
    let dp = Peripherals::take().unwrap();
    let mut console = Console::new(dp.USART0);
    let buses = TimerBuses::new(dp.TC0, dp.TC1, dp.TC2, dp.PORTB, dp.PORTD);

    let mut pwm = Timer1::new(buses.tc1, WaveformMode1::PWM_FAST_10BIT, Prescaler1::Div64);
    let mut tone = Timer2::new(buses.tc2, WaveformMode2::CTC_OCR2A, Prescaler2::Div128);
    let tone_top = ctc_top::<Tc2>(Prescaler2::Div128, TONE_HZ).unwrap_or(u8::MAX);

    let mut clock = critical_section::with(|cs| {
        let clock = Clock::start(cs, buses.tc0, &clock::TICKS);

        pwm.activate(cs, 0, false);
        pwm.activate_compare_channel(cs, Channel::A, 0, CompareOutputMode::Clear, false);

        tone.activate(cs, tone_top, false);
        tone.activate_compare_channel(cs, Channel::A, tone_top, CompareOutputMode::Toggle, false);
        clock
    });
    pwm.activate_output_pin(Channel::A);
    tone.activate_output_pin(Channel::A);

    diagnostics::dump(&mut console, &pwm).ok();
    diagnostics::dump(&mut console, &tone).ok();

    // Enable interrupts globally
    unsafe { avr_device::interrupt::enable() };

    let ceiling = pwm.waveform_mode().fixed_top().unwrap_or(0x3FF);
    let mut duty: u16 = 0;
    let mut rising = true;
    loop {
        pwm.update_compare_value(Channel::A, duty);
        if rising {
            duty = (duty + FADE_STEP).min(ceiling);
            rising = duty < ceiling;
        } else {
            duty = duty.saturating_sub(FADE_STEP);
            rising = duty == 0;
        }
        clock.delay_ms(5u16);
    }
}
