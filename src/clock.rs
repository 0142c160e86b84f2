//! System time kept on Timer0.
//!
//! Timer0 runs free in fast PWM with its fixed TOP of 0xFF and a /64
//! prescaler, so both of its compare channels stay usable for PWM while its
//! overflow interrupt counts time. The application owns the `TIMER0_OVF`
//! vector and calls [`TickState::on_overflow`] from it:
//!
//! ```ignore
//! #[avr_device::interrupt(atmega328p)]
//! fn TIMER0_OVF() {
//!     atmega328p_timers::clock::TICKS.on_overflow();
//! }
//! ```

use core::cell::Cell;

use critical_section::{CriticalSection, Mutex};
use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use embedded_hal::timer::{CountDown, Periodic};
use void::Void;

use crate::config::{CLOCK_PRESCALE, CPU_FREQ_HZ};
use crate::hal::{Prescaler0, RegisterBus, Timer0, WaveformMode0};

const CYCLES_PER_MICRO: u32 = CPU_FREQ_HZ / 1_000_000;

/// Whether one Timer0 count at `CLOCK_PRESCALE` is a whole number of
/// microseconds at `cpu_hz`.
const fn counts_whole_micros(cpu_hz: u32) -> bool {
    let cycles_per_micro = cpu_hz / 1_000_000;
    cpu_hz % 1_000_000 == 0 && cycles_per_micro != 0 && CLOCK_PRESCALE % cycles_per_micro == 0
}

const _: () = assert!(
    counts_whole_micros(CPU_FREQ_HZ),
    "Timer0 timebase needs a CPU clock of 1, 2, 4, 8, 16, 32 or 64 MHz"
);

/// Timer0 counts per microsecond are 1 / MICROS_PER_COUNT
const MICROS_PER_COUNT: u32 = CLOCK_PRESCALE / CYCLES_PER_MICRO;
const MICROS_PER_OVERFLOW: u32 = CLOCK_PRESCALE * 256 / CYCLES_PER_MICRO;

// Whole milliseconds per overflow, and the remainder in 1/8 ms steps so it
// fits a byte.
const MILLIS_INC: u32 = MICROS_PER_OVERFLOW / 1000;
const FRACT_INC: u8 = ((MICROS_PER_OVERFLOW % 1000) >> 3) as u8;
const FRACT_MAX: u8 = (1000 >> 3) as u8;

/// Time accumulated from Timer0 overflows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ticks {
    millis: u32,
    fract: u8,
    overflows: u32,
}

impl Ticks {
    pub const fn new() -> Self {
        Self {
            millis: 0,
            fract: 0,
            overflows: 0,
        }
    }

    /// Account for one counter overflow
    pub fn advance(&mut self) {
        let mut millis = self.millis.wrapping_add(MILLIS_INC);
        let mut fract = self.fract + FRACT_INC;
        if fract >= FRACT_MAX {
            fract -= FRACT_MAX;
            millis = millis.wrapping_add(1);
        }
        self.millis = millis;
        self.fract = fract;
        self.overflows = self.overflows.wrapping_add(1);
    }

    pub fn millis(&self) -> u32 {
        self.millis
    }

    pub fn overflows(&self) -> u32 {
        self.overflows
    }

    /// Microseconds given the current counter value and whether an overflow
    /// is latched but not yet accounted for.
    pub fn micros(&self, count: u8, overflow_pending: bool) -> u32 {
        let mut overflows = self.overflows;
        if overflow_pending && count < 255 {
            overflows = overflows.wrapping_add(1);
        }
        (overflows << 8)
            .wrapping_add(count as u32)
            .wrapping_mul(MICROS_PER_COUNT)
    }
}

/// [`Ticks`] shared between the overflow handler and the application.
pub struct TickState {
    inner: Mutex<Cell<Ticks>>,
}

impl TickState {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(Ticks::new())),
        }
    }

    /// Call from the TIMER0_OVF handler.
    pub fn on_overflow(&self) {
        critical_section::with(|cs| {
            let cell = self.inner.borrow(cs);
            let mut ticks = cell.get();
            ticks.advance();
            cell.set(ticks);
        })
    }

    pub fn snapshot(&self, cs: CriticalSection<'_>) -> Ticks {
        self.inner.borrow(cs).get()
    }
}

impl Default for TickState {
    fn default() -> Self {
        Self::new()
    }
}

/// Global tick state for the TIMER0_OVF handler
pub static TICKS: TickState = TickState::new();

/// Millisecond / microsecond clock driven by Timer0.
pub struct Clock<B: RegisterBus> {
    timer: Timer0<B>,
    ticks: &'static TickState,
}

impl<B: RegisterBus> Clock<B> {
    /// Take over Timer0 and start counting. Global interrupts must be enabled
    /// afterwards for time to advance.
    pub fn start(cs: CriticalSection<'_>, bus: B, ticks: &'static TickState) -> Self {
        let mut timer = Timer0::new(bus, WaveformMode0::PWM_FAST, Prescaler0::Div64);
        timer.activate(cs, 0xFF, true);
        Self { timer, ticks }
    }

    /// Timer0 itself, for driving its compare channels.
    ///
    /// Re-activating it with another mode or prescaler breaks the time base.
    pub fn timer(&mut self) -> &mut Timer0<B> {
        &mut self.timer
    }

    pub fn millis(&self) -> u32 {
        critical_section::with(|cs| self.ticks.snapshot(cs).millis())
    }

    pub fn micros(&self) -> u32 {
        critical_section::with(|cs| {
            let ticks = self.ticks.snapshot(cs);
            let count = self.timer.counter();
            ticks.micros(count, self.timer.overflow_pending())
        })
    }

    pub fn countdown(&self) -> Countdown<'_, B> {
        Countdown {
            clock: self,
            start: 0,
            period: 0,
        }
    }
}

impl<B: RegisterBus> DelayMs<u32> for Clock<B> {
    fn delay_ms(&mut self, ms: u32) {
        let start = self.millis();
        while self.millis().wrapping_sub(start) < ms {}
    }
}

impl<B: RegisterBus> DelayMs<u16> for Clock<B> {
    fn delay_ms(&mut self, ms: u16) {
        DelayMs::<u32>::delay_ms(self, ms as u32)
    }
}

impl<B: RegisterBus> DelayUs<u32> for Clock<B> {
    fn delay_us(&mut self, us: u32) {
        let start = self.micros();
        while self.micros().wrapping_sub(start) < us {}
    }
}

impl<B: RegisterBus> DelayUs<u16> for Clock<B> {
    fn delay_us(&mut self, us: u16) {
        DelayUs::<u32>::delay_us(self, us as u32)
    }
}

/// Periodic millisecond countdown on top of a [`Clock`].
pub struct Countdown<'a, B: RegisterBus> {
    clock: &'a Clock<B>,
    start: u32,
    period: u32,
}

impl<B: RegisterBus> CountDown for Countdown<'_, B> {
    type Time = u32;

    fn start<T>(&mut self, count: T)
    where
        T: Into<Self::Time>,
    {
        self.period = count.into();
        self.start = self.clock.millis();
    }

    fn wait(&mut self) -> nb::Result<(), Void> {
        let now = self.clock.millis();
        if now.wrapping_sub(self.start) < self.period {
            return Err(nb::Error::WouldBlock);
        }
        // keep the cadence, not the time we happened to poll
        self.start = self.start.wrapping_add(self.period);
        Ok(())
    }
}

impl<B: RegisterBus> Periodic for Countdown<'_, B> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::regs::mock::MockBus;
    use crate::hal::Reg;

    fn overflow(state: &TickState, times: u32) {
        for _ in 0..times {
            state.on_overflow();
        }
    }

    #[test]
    fn overflow_is_1024_microseconds_at_16mhz() {
        assert_eq!(MICROS_PER_OVERFLOW, 1024);
        assert_eq!(MILLIS_INC, 1);
        assert_eq!(FRACT_INC, 3);
        assert_eq!(FRACT_MAX, 125);
    }

    #[test]
    fn timebase_rejects_clocks_that_truncate_micros() {
        assert!(counts_whole_micros(CPU_FREQ_HZ));
        assert_eq!(MICROS_PER_COUNT * CYCLES_PER_MICRO, CLOCK_PRESCALE);
        for mhz in [1, 2, 4, 8, 16, 32, 64] {
            assert!(counts_whole_micros(mhz * 1_000_000), "{} MHz", mhz);
        }
        // 64 / 20 and 64 / 12 would truncate the count length
        assert!(!counts_whole_micros(20_000_000));
        assert!(!counts_whole_micros(12_000_000));
        assert!(!counts_whole_micros(14_745_600));
        assert!(!counts_whole_micros(500_000));
    }

    #[test]
    fn fractional_milliseconds_carry() {
        let mut ticks = Ticks::new();
        for _ in 0..42 {
            ticks.advance();
        }
        // 42 * 1.024 ms = 43.008 ms
        assert_eq!(ticks.millis(), 43);
        assert_eq!(ticks.overflows(), 42);

        for _ in 0..1000 - 42 {
            ticks.advance();
        }
        assert_eq!(ticks.millis(), 1024);
    }

    #[test]
    fn micros_accounts_for_a_latched_overflow() {
        let mut ticks = Ticks::new();
        ticks.advance();
        assert_eq!(ticks.micros(10, false), (256 + 10) * 4);
        assert_eq!(ticks.micros(10, true), (512 + 10) * 4);
        // count already wrapped to 255 means the flag belongs to the next overflow
        assert_eq!(ticks.micros(255, true), (256 + 255) * 4);
    }

    #[test]
    fn clock_starts_timer0_as_timebase() {
        static STATE: TickState = TickState::new();
        let clock = critical_section::with(|cs| Clock::start(cs, MockBus::new(), &STATE));

        let bus = clock.timer.bus();
        assert_eq!(bus.peek(Reg::Tccr0a), 0b0000_0011);
        assert_eq!(bus.peek(Reg::Tccr0b), 0b0000_0011);
        assert_eq!(bus.peek(Reg::Timsk0), 0b0000_0001);
    }

    #[test]
    fn clock_reads_ticks_and_counter() {
        static STATE: TickState = TickState::new();
        let mut bus = MockBus::new();
        let mut clock = critical_section::with(|cs| Clock::start(cs, MockBus::new(), &STATE));
        overflow(&STATE, 1000);
        assert_eq!(clock.millis(), 1024);

        bus.poke(Reg::Tcnt0, 100);
        bus.poke(Reg::Tifr0, 0b0000_0001);
        clock.timer = Timer0::new(bus, WaveformMode0::PWM_FAST, Prescaler0::Div64);
        assert_eq!(clock.micros(), ((1001 << 8) + 100) * 4);
    }

    #[test]
    fn countdown_keeps_its_cadence() {
        static STATE: TickState = TickState::new();
        let clock = critical_section::with(|cs| Clock::start(cs, MockBus::new(), &STATE));
        let mut countdown = clock.countdown();

        countdown.start(10u32);
        assert!(matches!(countdown.wait(), Err(nb::Error::WouldBlock)));
        overflow(&STATE, 10);
        assert!(countdown.wait().is_ok());
        assert!(matches!(countdown.wait(), Err(nb::Error::WouldBlock)));
        // 10.24 ms elapsed so far, the next period ends at 20 ms
        overflow(&STATE, 9);
        assert!(matches!(countdown.wait(), Err(nb::Error::WouldBlock)));
        overflow(&STATE, 1);
        assert!(countdown.wait().is_ok());
    }
}
