//! Generic timer/counter engine.
//!
//! One implementation drives all three timer units. Everything that differs
//! between TC0, TC1 and TC2 (register identities, waveform bit routing,
//! channel bit positions, output pins) is data supplied through
//! [`TimerDevice`]; the register sequences below are shared.
//!
//! # Interrupts
//!
//! [`TimerEngine::activate`] and [`TimerEngine::activate_compare_channel`]
//! write several registers in a row. An interrupt handler running in between
//! would observe a half-applied configuration, so both take a
//! [`CriticalSection`] token: the caller holds interrupts off for the whole
//! sequence, typically with `critical_section::with`.

use critical_section::CriticalSection;
use ufmt::derive::uDebug;

use super::gpio::PortPin;
use super::regs::{Reg, RegisterBus, Resolution};
use super::waveform::{Top, WaveformMode};
use crate::config::CPU_FREQ_HZ;
use crate::Error;

/// Clock select bits CSn2:0
const CLOCK_SELECT_MASK: u8 = 0x07;

/// Output-compare channel of a timer
#[derive(Debug, uDebug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    A,
    B,
    C,
    D,
}

impl Channel {
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for Channel {
    type Error = Error;

    fn try_from(index: u8) -> Result<Self, Error> {
        match index {
            0 => Ok(Channel::A),
            1 => Ok(Channel::B),
            2 => Ok(Channel::C),
            3 => Ok(Channel::D),
            _ => Err(Error::InvalidChannel(index)),
        }
    }
}

/// Effect of a compare match on the channel's output pin (COMnx1:0)
#[derive(Debug, uDebug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CompareOutputMode {
    Disconnected = 0x00,
    Toggle = 0x01,
    Clear = 0x02,
    Set = 0x03,
}

impl CompareOutputMode {
    #[inline]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0x00 => CompareOutputMode::Disconnected,
            0x01 => CompareOutputMode::Toggle,
            0x02 => CompareOutputMode::Clear,
            _ => CompareOutputMode::Set,
        }
    }
}

/// Clock source selection of a timer
pub trait ClockSelect: Copy + PartialEq + core::fmt::Debug {
    /// CSn2:0 field value
    fn bits(self) -> u8;
    /// Division factor, `None` when stopped or clocked externally
    fn divisor(self) -> Option<u16>;
    fn from_divisor(divisor: u16) -> Result<Self, Error>;
}

/// Declares a prescaler enum together with its [`ClockSelect`] table.
macro_rules! prescaler {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $bits:literal => $div:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, ufmt::derive::uDebug, Clone, Copy, PartialEq, Eq)]
        #[repr(u8)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $bits ),+
        }

        impl $crate::hal::timer::ClockSelect for $name {
            #[inline]
            fn bits(self) -> u8 {
                self as u8
            }

            fn divisor(self) -> Option<u16> {
                match self {
                    $( $name::$variant => $div ),+
                }
            }

            fn from_divisor(divisor: u16) -> Result<Self, $crate::Error> {
                $(
                    if $div == Some(divisor) {
                        return Ok($name::$variant);
                    }
                )+
                Err($crate::Error::UnsupportedDivisor(divisor))
            }
        }
    };
}
pub(crate) use prescaler;

/// Fixed wiring of one compare channel
#[derive(Debug, Clone, Copy)]
pub struct ChannelBinding {
    /// OCRnx
    pub compare: Reg,
    /// Position of COMnx1:0 in control register A
    pub output_shift: u8,
    /// OCIEnx in the mask register, OCFnx in the flag register
    pub interrupt_bit: u8,
    /// FOCnx
    pub force_bit: u8,
    /// OCnx pin
    pub pin: PortPin,
}

/// Register-level description of one timer/counter unit.
pub trait TimerDevice: Sized + 'static {
    type Resolution: Resolution;
    type Prescaler: ClockSelect;

    const NAME: &'static str;
    const CONTROL_A: Reg;
    const CONTROL_B: Reg;
    const CONTROL_C: Option<Reg>;
    const COUNTER: Reg;
    const INTERRUPT_MASK: Reg;
    const INTERRUPT_FLAGS: Reg;
    /// Register holding the FOCnx strobes
    const FORCE_OUTPUT: Reg;

    /// WGM bits kept in control register A
    const WGM_A_MASK: u8 = 0x03;
    /// WGM bits routed to control register B, one position up
    const WGM_B_MASK: u8;
    /// TOIEn / TOVn
    const OVERFLOW_BIT: u8 = 0;
    /// Every flag this unit can raise
    const FLAG_MASK: u8;

    const CHANNELS: &'static [ChannelBinding];
    const WAVEFORM_MODES: &'static [WaveformMode<Self>];
}

/// Per-channel state owned by the engine
#[derive(Debug, Clone, Copy)]
pub struct ChannelState {
    compare_register: Reg,
    output_mode: CompareOutputMode,
}

impl ChannelState {
    const fn new(compare_register: Reg) -> Self {
        Self {
            compare_register,
            output_mode: CompareOutputMode::Disconnected,
        }
    }

    pub fn compare_register(&self) -> Reg {
        self.compare_register
    }

    pub fn output_mode(&self) -> CompareOutputMode {
        self.output_mode
    }
}

/// A timer/counter configured from a waveform mode and a prescaler.
///
/// Construction only captures the values; nothing reaches the hardware
/// until [`activate`](Self::activate).
pub struct TimerEngine<D: TimerDevice, B: RegisterBus, const CHAN: usize> {
    bus: B,
    waveform_mode: WaveformMode<D>,
    prescaler: D::Prescaler,
    channels: [ChannelState; CHAN],
}

impl<D: TimerDevice, B: RegisterBus, const CHAN: usize> TimerEngine<D, B, CHAN> {
    const CHANNELS_FIT: () = assert!(
        CHAN <= D::CHANNELS.len(),
        "timer has fewer compare channels than requested"
    );

    pub fn new(bus: B, waveform_mode: WaveformMode<D>, prescaler: D::Prescaler) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CHANNELS_FIT;
        let bindings: &'static [ChannelBinding] = D::CHANNELS;

        Self {
            bus,
            waveform_mode,
            prescaler,
            channels: core::array::from_fn(|i| ChannelState::new(bindings[i].compare)),
        }
    }

    /// Replace mode and prescaler. Takes effect on the next `activate`.
    pub fn reconfigure(&mut self, waveform_mode: WaveformMode<D>, prescaler: D::Prescaler) {
        self.waveform_mode = waveform_mode;
        self.prescaler = prescaler;
    }

    /// Stop the timer, clear its configuration and start it again with the
    /// stored waveform mode and prescaler.
    ///
    /// `top` is written to the ceiling register when the mode has one and
    /// ignored otherwise. The write that selects the clock source starts the
    /// counter, so it is the last one.
    pub fn activate(
        &mut self,
        _cs: CriticalSection<'_>,
        top: D::Resolution,
        enable_overflow_interrupt: bool,
    ) {
        self.bus.write(D::CONTROL_A, 0);
        self.bus.write(D::CONTROL_B, 0);
        if let Some(control_c) = D::CONTROL_C {
            self.bus.write(control_c, 0);
        }
        D::Resolution::store(&mut self.bus, D::COUNTER, D::Resolution::default());
        self.bus.write(D::INTERRUPT_MASK, 0);
        // flags clear on writing one
        self.bus.write(D::INTERRUPT_FLAGS, D::FLAG_MASK);
        for channel in self.channels.iter_mut() {
            channel.output_mode = CompareOutputMode::Disconnected;
        }

        self.bus.write(
            D::INTERRUPT_MASK,
            (enable_overflow_interrupt as u8) << D::OVERFLOW_BIT,
        );
        self.update_timer_top(top);

        let wgm_a = self.waveform_mode.control_a_bits();
        self.bus.modify(D::CONTROL_A, |r| r | wgm_a);
        self.bus.write(
            D::CONTROL_B,
            self.waveform_mode.control_b_bits() | (self.prescaler.bits() & CLOCK_SELECT_MASK),
        );
    }

    /// Connect a compare channel on an activated timer.
    ///
    /// The COM bits are OR'ed into control register A, so channels can be
    /// activated in any order without disturbing each other. In modes that
    /// take TOP from OCRnA, channel A's compare register is the ceiling.
    pub fn activate_compare_channel(
        &mut self,
        _cs: CriticalSection<'_>,
        channel: Channel,
        compare_value: D::Resolution,
        output_mode: CompareOutputMode,
        enable_interrupt: bool,
    ) {
        let Some(idx) = Self::slot(channel) else {
            return;
        };
        let binding = &D::CHANNELS[idx];

        let com = output_mode.bits() << binding.output_shift;
        self.bus.modify(D::CONTROL_A, |r| r | com);
        let irq = 1 << binding.interrupt_bit;
        if enable_interrupt {
            self.bus.modify(D::INTERRUPT_MASK, |r| r | irq);
        } else {
            self.bus.modify(D::INTERRUPT_MASK, |r| r & !irq);
        }

        let state = &mut self.channels[idx];
        state.output_mode = CompareOutputMode::from_bits(state.output_mode.bits() | output_mode.bits());
        self.update_compare_value(channel, compare_value);
    }

    /// Make the channel's OCnx pin an output so the waveform reaches it.
    pub fn activate_output_pin(&mut self, channel: Channel) {
        if let Some(idx) = Self::slot(channel) {
            D::CHANNELS[idx].pin.make_output(&mut self.bus);
        }
    }

    /// Write a new TOP if the waveform mode takes TOP from a register.
    pub fn update_timer_top(&mut self, top: D::Resolution) {
        if let Top::Register(reg) = self.waveform_mode.top() {
            D::Resolution::store(&mut self.bus, reg, top);
        }
    }

    pub fn update_compare_value(&mut self, channel: Channel, value: D::Resolution) {
        if let Some(idx) = Self::slot(channel) {
            D::Resolution::store(&mut self.bus, self.channels[idx].compare_register, value);
        }
    }

    /// Strobe FOCnx. Only has an effect in non-PWM modes.
    pub fn force_output_compare(&mut self, channel: Channel) {
        if let Some(idx) = Self::slot(channel) {
            let foc = 1 << D::CHANNELS[idx].force_bit;
            self.bus.modify(D::FORCE_OUTPUT, |r| r | foc);
        }
    }

    pub fn counter(&self) -> D::Resolution {
        D::Resolution::load(&self.bus, D::COUNTER)
    }

    /// TOVn is set and its interrupt has not run yet
    pub fn overflow_pending(&self) -> bool {
        self.bus.read(D::INTERRUPT_FLAGS) & (1 << D::OVERFLOW_BIT) != 0
    }

    /// OCFnx is set
    pub fn compare_match_pending(&self, channel: Channel) -> bool {
        match Self::slot(channel) {
            Some(idx) => self.bus.read(D::INTERRUPT_FLAGS) & (1 << D::CHANNELS[idx].interrupt_bit) != 0,
            None => false,
        }
    }

    /// Configured output mode, `None` for channels this timer lacks
    pub fn output_mode(&self, channel: Channel) -> Option<CompareOutputMode> {
        Self::slot(channel).map(|idx| self.channels[idx].output_mode)
    }

    pub fn channel_state(&self, channel: Channel) -> Option<&ChannelState> {
        Self::slot(channel).map(|idx| &self.channels[idx])
    }

    pub fn waveform_mode(&self) -> WaveformMode<D> {
        self.waveform_mode
    }

    pub fn prescaler(&self) -> D::Prescaler {
        self.prescaler
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Give the bus back, leaving the hardware running as configured.
    pub fn release(self) -> B {
        self.bus
    }

    #[inline]
    fn slot(channel: Channel) -> Option<usize> {
        let idx = channel.index();
        if idx >= CHAN {
            return None;
        }
        Some(idx)
    }
}

/// TOP for a CTC toggle output of `output_hz`:
/// `f = F_CPU / (2 * N * (1 + TOP))`.
///
/// `None` if the prescaler has no fixed divisor or the result does not fit
/// the timer.
pub fn ctc_top<D: TimerDevice>(prescaler: D::Prescaler, output_hz: u32) -> Option<D::Resolution> {
    let divisor = prescaler.divisor()? as u32;
    let ticks = 2u32.checked_mul(divisor)?.checked_mul(output_hz)?;
    if ticks == 0 {
        return None;
    }
    let top = (CPU_FREQ_HZ / ticks).checked_sub(1)?;
    D::Resolution::narrow(top)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::regs::mock::{MockBus, Write};
    use crate::hal::timer0::{Prescaler0, Tc0, Timer0, WaveformMode0};
    use crate::hal::timer1::{Prescaler1, Tc1, Timer1, WaveformMode1};
    use crate::hal::timer2::{Prescaler2, Tc2, Timer2, WaveformMode2};

    fn dirty_bus() -> MockBus {
        let mut bus = MockBus::new();
        for reg in [
            Reg::Tccr1a,
            Reg::Tccr1b,
            Reg::Tccr1c,
            Reg::Timsk1,
            Reg::Tccr2a,
            Reg::Tccr2b,
            Reg::Timsk2,
        ] {
            bus.poke(reg, 0xFF);
        }
        for reg in [Reg::Tccr0a, Reg::Tccr0b, Reg::Timsk0] {
            bus.poke(reg, 0xFF);
        }
        bus.poke(Reg::Tcnt0, 0x9A);
        bus.poke(Reg::Tifr0, 0x07);
        bus.poke(Reg::Tcnt1, 0x1234);
        bus.poke(Reg::Tcnt2, 0x56);
        bus.poke(Reg::Icr1, 0xBEEF);
        bus.poke(Reg::Tifr1, 0x27);
        bus
    }

    #[test]
    fn fast_pwm_10bit_on_timer1() {
        let mut timer = Timer1::new(MockBus::new(), WaveformMode1::PWM_FAST_10BIT, Prescaler1::Div64);
        critical_section::with(|cs| timer.activate(cs, 0, false));

        let bus = timer.bus();
        assert_eq!(bus.peek(Reg::Tccr1a), 0b0000_0011);
        assert_eq!(bus.peek(Reg::Tccr1b), 0b0000_1000 | 0x03);
        assert_eq!(bus.peek(Reg::Tcnt1), 0);
        assert_eq!(bus.peek(Reg::Timsk1), 0);
    }

    #[test]
    fn ctc_with_icr1_writes_ceiling_and_overflow_enable() {
        let mut timer = Timer1::new(MockBus::new(), WaveformMode1::CTC_ICR1, Prescaler1::Div8);
        critical_section::with(|cs| timer.activate(cs, 500, true));

        let bus = timer.bus();
        assert_eq!(bus.peek(Reg::Icr1), 500);
        assert_eq!(bus.peek(Reg::Timsk1), 0b0000_0001);
        assert_eq!(bus.peek(Reg::Tccr1a), 0);
        assert_eq!(bus.peek(Reg::Tccr1b), 0b0001_1000 | 0x02);
    }

    #[test]
    fn activate_leaves_nothing_of_the_previous_configuration() {
        let mut timer = Timer1::new(dirty_bus(), WaveformMode1::PWM_PHASE_CORRECT_8BIT, Prescaler1::Div1);
        critical_section::with(|cs| timer.activate(cs, 0, false));

        let bus = timer.bus();
        assert_eq!(bus.peek(Reg::Tccr1a), 0b0000_0001);
        assert_eq!(bus.peek(Reg::Tccr1b), 0b0000_0001);
        assert_eq!(bus.peek(Reg::Tccr1c), 0);
        assert_eq!(bus.peek(Reg::Tcnt1), 0);
        assert_eq!(bus.peek(Reg::Timsk1), 0);
        assert_eq!(bus.peek(Reg::Tifr1), 0);

        let mut timer = Timer2::new(dirty_bus(), WaveformMode2::NORMAL, Prescaler2::Div128);
        critical_section::with(|cs| timer.activate(cs, 0, true));
        let bus = timer.bus();
        assert_eq!(bus.peek(Reg::Tccr2a), 0);
        assert_eq!(bus.peek(Reg::Tccr2b), 0x05);
        assert_eq!(bus.peek(Reg::Tcnt2), 0);
        assert_eq!(bus.peek(Reg::Timsk2), 0b0000_0001);
    }

    #[test]
    fn clock_select_is_the_last_write() {
        let mut timer = Timer0::new(MockBus::new(), WaveformMode0::CTC_OCR0A, Prescaler0::Div256);
        critical_section::with(|cs| timer.activate(cs, 99, false));

        let last = *timer.bus().writes.last().unwrap();
        assert_eq!(
            last,
            Write {
                reg: Reg::Tccr0b,
                value: 0x04
            }
        );
        // silenced before anything else
        assert_eq!(timer.bus().writes[0], Write { reg: Reg::Tccr0a, value: 0 });
        assert_eq!(timer.bus().writes[1], Write { reg: Reg::Tccr0b, value: 0 });
        assert_eq!(timer.bus().peek(Reg::Ocr0a), 99);
    }

    fn prescaler_div1<D: TimerDevice>() -> D::Prescaler {
        D::Prescaler::from_divisor(1).unwrap()
    }

    fn check_fixed_top_modes<D: TimerDevice>() {
        let catalog = WaveformMode::<D>::catalog();
        for &mode in catalog.iter().filter(|m| m.fixed_top().is_some()) {
            let mut timer = TimerEngine::<D, MockBus, 2>::new(MockBus::new(), mode, prescaler_div1::<D>());
            timer.update_timer_top(D::Resolution::MAX);
            timer.update_timer_top(D::Resolution::default());
            assert!(timer.bus().writes.is_empty(), "{} mode {}", D::NAME, mode.mode());

            critical_section::with(|cs| timer.activate(cs, D::Resolution::MAX, false));
            for reg in catalog.iter().filter_map(|m| m.top_register()) {
                assert!(timer.bus().writes_to(reg).is_empty(), "{} mode {}", D::NAME, mode.mode());
            }
        }
    }

    /// Returns the WGM patterns that take TOP from a register.
    fn check_register_top_modes<D: TimerDevice>() -> Vec<u8> {
        let mut modes = Vec::new();
        for &mode in WaveformMode::<D>::catalog() {
            let Some(reg) = mode.top_register() else { continue };
            let mut timer = TimerEngine::<D, MockBus, 2>::new(MockBus::new(), mode, prescaler_div1::<D>());
            timer.update_timer_top(D::Resolution::MAX);
            assert_eq!(
                timer.bus().writes,
                [Write {
                    reg,
                    value: D::Resolution::MAX.widen()
                }]
            );
            modes.push(mode.mode());
        }
        modes
    }

    #[test]
    fn fixed_top_modes_never_touch_a_ceiling_register() {
        check_fixed_top_modes::<Tc0>();
        check_fixed_top_modes::<Tc1>();
        check_fixed_top_modes::<Tc2>();
    }

    #[test]
    fn register_top_modes_write_exactly_the_value() {
        assert_eq!(check_register_top_modes::<Tc0>(), [2, 5, 7]);
        assert_eq!(check_register_top_modes::<Tc1>(), [4, 8, 9, 10, 11, 12, 14, 15]);
        assert_eq!(check_register_top_modes::<Tc2>(), [2, 5, 7]);

        let mut timer = Timer1::new(MockBus::new(), WaveformMode1::CTC_ICR1, Prescaler1::Div1);
        timer.update_timer_top(0x0321);
        assert_eq!(timer.bus().peek(Reg::Icr1), 0x0321);
    }

    #[test]
    fn activate_clears_a_dirty_timer0() {
        let mut timer = Timer0::new(dirty_bus(), WaveformMode0::PWM_FAST_OCR0A, Prescaler0::Div8);
        critical_section::with(|cs| timer.activate(cs, 0x80, false));

        let bus = timer.bus();
        assert_eq!(bus.peek(Reg::Tccr0a), 0b0000_0011);
        assert_eq!(bus.peek(Reg::Tccr0b), 0b0000_1010);
        assert_eq!(bus.peek(Reg::Timsk0), 0);
        assert_eq!(bus.peek(Reg::Tcnt0), 0);
        assert_eq!(bus.peek(Reg::Tifr0), 0);
        assert_eq!(bus.peek(Reg::Ocr0a), 0x80);
    }

    #[test]
    fn compare_channel_a_toggle_on_8bit_timer() {
        let mut timer = Timer2::new(MockBus::new(), WaveformMode2::CTC_OCR2A, Prescaler2::Div64);
        critical_section::with(|cs| {
            timer.activate(cs, 200, false);
            timer.activate_compare_channel(cs, Channel::A, 128, CompareOutputMode::Toggle, true);
        });

        let bus = timer.bus();
        assert_eq!(bus.peek(Reg::Tccr2a) & 0b1100_0000, 0b0100_0000);
        assert_eq!(bus.peek(Reg::Timsk2) & 0b0000_0010, 0b0000_0010);
        assert_eq!(bus.peek(Reg::Ocr2a), 128);
        assert_eq!(timer.output_mode(Channel::A), Some(CompareOutputMode::Toggle));
    }

    #[test]
    fn channels_use_disjoint_bits() {
        let mut one = Timer0::new(MockBus::new(), WaveformMode0::PWM_FAST, Prescaler0::Div8);
        let mut two = Timer0::new(MockBus::new(), WaveformMode0::PWM_FAST, Prescaler0::Div8);
        critical_section::with(|cs| {
            one.activate(cs, 0, false);
            one.activate_compare_channel(cs, Channel::A, 10, CompareOutputMode::Clear, false);
            one.activate_compare_channel(cs, Channel::B, 20, CompareOutputMode::Set, true);
            two.activate(cs, 0, false);
            two.activate_compare_channel(cs, Channel::B, 20, CompareOutputMode::Set, true);
            two.activate_compare_channel(cs, Channel::A, 10, CompareOutputMode::Clear, false);
        });

        for timer in [&one, &two] {
            let bus = timer.bus();
            assert_eq!(bus.peek(Reg::Tccr0a), 0b1011_0011);
            assert_eq!(bus.peek(Reg::Timsk0), 0b0000_0100);
            assert_eq!(bus.peek(Reg::Ocr0a), 10);
            assert_eq!(bus.peek(Reg::Ocr0b), 20);
        }
    }

    #[test]
    fn disabling_a_compare_interrupt_clears_only_its_bit() {
        let mut timer = Timer1::new(MockBus::new(), WaveformMode1::NORMAL, Prescaler1::Div1);
        critical_section::with(|cs| {
            timer.activate(cs, 0, true);
            timer.activate_compare_channel(cs, Channel::B, 7, CompareOutputMode::Disconnected, true);
            timer.activate_compare_channel(cs, Channel::B, 7, CompareOutputMode::Disconnected, false);
        });
        assert_eq!(timer.bus().peek(Reg::Timsk1), 0b0000_0001);
    }

    #[test]
    fn channel_at_the_channel_count_is_ignored() {
        let mut timer = Timer1::new(MockBus::new(), WaveformMode1::PWM_FAST_ICR1, Prescaler1::Div1);
        critical_section::with(|cs| {
            timer.activate_compare_channel(cs, Channel::C, 0x100, CompareOutputMode::Set, true);
            timer.activate_compare_channel(cs, Channel::D, 0x100, CompareOutputMode::Set, true);
        });
        timer.update_compare_value(Channel::C, 1);
        timer.activate_output_pin(Channel::C);
        timer.force_output_compare(Channel::D);
        assert!(timer.bus().writes.is_empty());
        assert_eq!(timer.output_mode(Channel::C), None);
    }

    #[test]
    fn narrower_channel_table_rejects_channel_b() {
        let mut timer: TimerEngine<Tc1, MockBus, 1> =
            TimerEngine::new(MockBus::new(), WaveformMode1::NORMAL, Prescaler1::Div1);
        critical_section::with(|cs| {
            timer.activate_compare_channel(cs, Channel::B, 9, CompareOutputMode::Toggle, true)
        });
        assert!(timer.bus().writes.is_empty());

        timer.update_compare_value(Channel::A, 9);
        assert_eq!(timer.bus().writes_to(Reg::Ocr1a), [9]);
    }

    #[test]
    fn activate_forgets_channel_output_modes() {
        let mut timer = Timer2::new(MockBus::new(), WaveformMode2::PWM_FAST, Prescaler2::Div1);
        critical_section::with(|cs| {
            timer.activate(cs, 0, false);
            timer.activate_compare_channel(cs, Channel::B, 1, CompareOutputMode::Clear, false);
        });
        assert_eq!(timer.output_mode(Channel::B), Some(CompareOutputMode::Clear));

        critical_section::with(|cs| timer.activate(cs, 0, false));
        assert_eq!(timer.output_mode(Channel::B), Some(CompareOutputMode::Disconnected));
        assert_eq!(timer.bus().peek(Reg::Tccr2a) & 0xF0, 0);
    }

    #[test]
    fn output_pins_follow_the_device_tables() {
        let mut t0 = Timer0::new(MockBus::new(), WaveformMode0::NORMAL, Prescaler0::Stop);
        t0.activate_output_pin(Channel::A);
        t0.activate_output_pin(Channel::B);
        assert_eq!(t0.bus().peek(Reg::Ddrd), 0b0110_0000);
        assert_eq!(t0.bus().peek(Reg::Ddrb), 0);

        let mut t1 = Timer1::new(MockBus::new(), WaveformMode1::NORMAL, Prescaler1::Stop);
        t1.activate_output_pin(Channel::A);
        t1.activate_output_pin(Channel::B);
        assert_eq!(t1.bus().peek(Reg::Ddrb), 0b0000_0110);

        let mut t2 = Timer2::new(MockBus::new(), WaveformMode2::NORMAL, Prescaler2::Stop);
        t2.activate_output_pin(Channel::A);
        t2.activate_output_pin(Channel::B);
        assert_eq!(t2.bus().peek(Reg::Ddrb), 0b0000_1000);
        assert_eq!(t2.bus().peek(Reg::Ddrd), 0b0000_1000);
    }

    #[test]
    fn force_output_compare_strobes_foc_bits() {
        let mut t1 = Timer1::new(MockBus::new(), WaveformMode1::CTC_OCR1A, Prescaler1::Div1);
        t1.force_output_compare(Channel::B);
        assert_eq!(t1.bus().writes, [Write { reg: Reg::Tccr1c, value: 0b0100_0000 }]);

        let mut t0 = Timer0::new(MockBus::new(), WaveformMode0::CTC_OCR0A, Prescaler0::Div1);
        t0.force_output_compare(Channel::A);
        assert_eq!(t0.bus().writes, [Write { reg: Reg::Tccr0b, value: 0b1000_0000 }]);
    }

    #[test]
    fn reconfigure_only_applies_on_activate() {
        let mut timer = Timer2::new(MockBus::new(), WaveformMode2::NORMAL, Prescaler2::Div1);
        timer.reconfigure(WaveformMode2::PWM_FAST_OCR2A, Prescaler2::Div32);
        assert!(timer.bus().writes.is_empty());
        assert_eq!(timer.waveform_mode(), WaveformMode2::PWM_FAST_OCR2A);

        critical_section::with(|cs| timer.activate(cs, 77, false));
        assert_eq!(timer.bus().peek(Reg::Ocr2a), 77);
        assert_eq!(timer.bus().peek(Reg::Tccr2a), 0b0000_0011);
        assert_eq!(timer.bus().peek(Reg::Tccr2b), 0b0000_1011);
    }

    #[test]
    fn pending_flags_are_read_from_the_flag_register() {
        let mut bus = MockBus::new();
        bus.poke(Reg::Tifr0, 0b0000_0101);
        let timer = Timer0::new(bus, WaveformMode0::NORMAL, Prescaler0::Div64);
        assert!(timer.overflow_pending());
        assert!(!timer.compare_match_pending(Channel::A));
        assert!(timer.compare_match_pending(Channel::B));
        assert!(!timer.compare_match_pending(Channel::C));
    }

    #[test]
    fn channels_parse_from_indices() {
        assert_eq!(Channel::try_from(1), Ok(Channel::B));
        assert_eq!(Channel::try_from(4), Err(Error::InvalidChannel(4)));
        assert_eq!(Channel::D.index(), 3);
    }

    #[test]
    fn ctc_top_for_audio_tone() {
        // 16 MHz / (2 * 128 * 142) ~= 440 Hz
        assert_eq!(ctc_top::<Tc2>(Prescaler2::Div128, 440), Some(141));
        assert_eq!(ctc_top::<Tc1>(Prescaler1::Div1, 1), None);
        assert_eq!(ctc_top::<Tc1>(Prescaler1::Div256, 1), Some(31_249));
        assert_eq!(ctc_top::<Tc2>(Prescaler2::Stop, 440), None);
        assert_eq!(ctc_top::<Tc2>(Prescaler2::Div1, 0), None);
    }
}
