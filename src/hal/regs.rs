//! Register map and bus access for the timer/counter units.
//!
//! Every register the timer layer touches is named in [`Reg`] together with
//! its data-space address from the ATmega328P datasheet (section 30,
//! "Register Summary"). The engine never touches a register itself; it
//! goes through a [`RegisterBus`], which on the chip is `Mmio` over the
//! avr-device PAC and in the unit tests is a recording mock.

/// A memory-mapped register used by the timer layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
    Pinb,
    Ddrb,
    Portb,
    Pind,
    Ddrd,
    Portd,
    Tifr0,
    Tifr1,
    Tifr2,
    Tccr0a,
    Tccr0b,
    Tcnt0,
    Ocr0a,
    Ocr0b,
    Timsk0,
    Timsk1,
    Timsk2,
    Tccr1a,
    Tccr1b,
    Tccr1c,
    Tcnt1,
    Icr1,
    Ocr1a,
    Ocr1b,
    Tccr2a,
    Tccr2b,
    Tcnt2,
    Ocr2a,
    Ocr2b,
}

impl Reg {
    /// Data-space address. For 16-bit registers this is the low byte; the
    /// high byte follows at `address + 1`.
    pub const fn address(self) -> u16 {
        match self {
            Reg::Pinb => 0x23,
            Reg::Ddrb => 0x24,
            Reg::Portb => 0x25,
            Reg::Pind => 0x29,
            Reg::Ddrd => 0x2A,
            Reg::Portd => 0x2B,
            Reg::Tifr0 => 0x35,
            Reg::Tifr1 => 0x36,
            Reg::Tifr2 => 0x37,
            Reg::Tccr0a => 0x44,
            Reg::Tccr0b => 0x45,
            Reg::Tcnt0 => 0x46,
            Reg::Ocr0a => 0x47,
            Reg::Ocr0b => 0x48,
            Reg::Timsk0 => 0x6E,
            Reg::Timsk1 => 0x6F,
            Reg::Timsk2 => 0x70,
            Reg::Tccr1a => 0x80,
            Reg::Tccr1b => 0x81,
            Reg::Tccr1c => 0x82,
            Reg::Tcnt1 => 0x84,
            Reg::Icr1 => 0x86,
            Reg::Ocr1a => 0x88,
            Reg::Ocr1b => 0x8A,
            Reg::Tccr2a => 0xB0,
            Reg::Tccr2b => 0xB1,
            Reg::Tcnt2 => 0xB2,
            Reg::Ocr2a => 0xB3,
            Reg::Ocr2b => 0xB4,
        }
    }

    /// Datasheet name
    pub const fn name(self) -> &'static str {
        match self {
            Reg::Pinb => "PINB",
            Reg::Ddrb => "DDRB",
            Reg::Portb => "PORTB",
            Reg::Pind => "PIND",
            Reg::Ddrd => "DDRD",
            Reg::Portd => "PORTD",
            Reg::Tifr0 => "TIFR0",
            Reg::Tifr1 => "TIFR1",
            Reg::Tifr2 => "TIFR2",
            Reg::Tccr0a => "TCCR0A",
            Reg::Tccr0b => "TCCR0B",
            Reg::Tcnt0 => "TCNT0",
            Reg::Ocr0a => "OCR0A",
            Reg::Ocr0b => "OCR0B",
            Reg::Timsk0 => "TIMSK0",
            Reg::Timsk1 => "TIMSK1",
            Reg::Timsk2 => "TIMSK2",
            Reg::Tccr1a => "TCCR1A",
            Reg::Tccr1b => "TCCR1B",
            Reg::Tccr1c => "TCCR1C",
            Reg::Tcnt1 => "TCNT1",
            Reg::Icr1 => "ICR1",
            Reg::Ocr1a => "OCR1A",
            Reg::Ocr1b => "OCR1B",
            Reg::Tccr2a => "TCCR2A",
            Reg::Tccr2b => "TCCR2B",
            Reg::Tcnt2 => "TCNT2",
            Reg::Ocr2a => "OCR2A",
            Reg::Ocr2b => "OCR2B",
        }
    }

    /// True for the 16-bit Timer1 data registers
    pub const fn is_wide(self) -> bool {
        matches!(self, Reg::Tcnt1 | Reg::Icr1 | Reg::Ocr1a | Reg::Ocr1b)
    }
}

impl ufmt::uDebug for Reg {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        f.write_str(self.name())
    }
}

/// Byte and word access to the register file.
pub trait RegisterBus {
    fn read(&self, reg: Reg) -> u8;
    fn write(&mut self, reg: Reg, value: u8);
    fn read_wide(&self, reg: Reg) -> u16;
    fn write_wide(&mut self, reg: Reg, value: u16);

    #[inline]
    fn modify<F: FnOnce(u8) -> u8>(&mut self, reg: Reg, f: F) {
        let value = self.read(reg);
        self.write(reg, f(value));
    }
}

/// Counter width of a timer: `u8` for TC0/TC2, `u16` for TC1.
pub trait Resolution: Copy + PartialEq + Default + core::fmt::Debug {
    const MAX: Self;

    fn load<B: RegisterBus>(bus: &B, reg: Reg) -> Self;
    fn store<B: RegisterBus>(bus: &mut B, reg: Reg, value: Self);
    fn widen(self) -> u16;
    fn narrow(value: u32) -> Option<Self>;
}

impl Resolution for u8 {
    const MAX: Self = u8::MAX;

    #[inline]
    fn load<B: RegisterBus>(bus: &B, reg: Reg) -> Self {
        bus.read(reg)
    }

    #[inline]
    fn store<B: RegisterBus>(bus: &mut B, reg: Reg, value: Self) {
        bus.write(reg, value)
    }

    fn widen(self) -> u16 {
        self as u16
    }

    fn narrow(value: u32) -> Option<Self> {
        u8::try_from(value).ok()
    }
}

impl Resolution for u16 {
    const MAX: Self = u16::MAX;

    #[inline]
    fn load<B: RegisterBus>(bus: &B, reg: Reg) -> Self {
        bus.read_wide(reg)
    }

    #[inline]
    fn store<B: RegisterBus>(bus: &mut B, reg: Reg, value: Self) {
        bus.write_wide(reg, value)
    }

    fn widen(self) -> u16 {
        self
    }

    fn narrow(value: u32) -> Option<Self> {
        u16::try_from(value).ok()
    }
}

#[cfg(target_arch = "avr")]
pub use self::mmio::{Mmio, TimerBuses};

#[cfg(target_arch = "avr")]
mod mmio {
    use avr_device::atmega328p::{Peripherals, PORTB, PORTD, TC0, TC1, TC2};

    use super::{Reg, RegisterBus};

    /// Register bus of one timer unit, backed by its PAC peripheral.
    ///
    /// Owns the timer's register block. Compare-output pins live on the
    /// shared ports, which [`TimerBuses::new`] claims once for all three
    /// buses. Registers of the other timers read as zero and ignore writes.
    pub struct Mmio<TC> {
        timer: TC,
    }

    impl<TC> Mmio<TC> {
        /// Give the PAC peripheral back.
        pub fn free(self) -> TC {
            self.timer
        }
    }

    /// One bus per timer unit.
    pub struct TimerBuses {
        pub tc0: Mmio<TC0>,
        pub tc1: Mmio<TC1>,
        pub tc2: Mmio<TC2>,
    }

    impl TimerBuses {
        /// Split the timer peripherals into per-unit buses. `PORTB` and
        /// `PORTD` are consumed because the OCnx pins are driven through them.
        pub fn new(tc0: TC0, tc1: TC1, tc2: TC2, _portb: PORTB, _portd: PORTD) -> Self {
            Self {
                tc0: Mmio { timer: tc0 },
                tc1: Mmio { timer: tc1 },
                tc2: Mmio { timer: tc2 },
            }
        }

        /// # Safety
        /// The caller must make sure no other code drives the timer or
        /// port registers while the buses are in use.
        pub unsafe fn steal() -> Self {
            let dp = Peripherals::steal();
            Self::new(dp.TC0, dp.TC1, dp.TC2, dp.PORTB, dp.PORTD)
        }
    }

    // Port registers are shared by the three buses. Each bus only touches the
    // bits of its own OCnx pins.
    #[allow(unused_unsafe)]
    fn read_port(reg: Reg) -> u8 {
        let (portb, portd) = unsafe { (&*PORTB::ptr(), &*PORTD::ptr()) };
        match reg {
            Reg::Pinb => portb.pinb.read().bits(),
            Reg::Ddrb => portb.ddrb.read().bits(),
            Reg::Portb => portb.portb.read().bits(),
            Reg::Pind => portd.pind.read().bits(),
            Reg::Ddrd => portd.ddrd.read().bits(),
            Reg::Portd => portd.portd.read().bits(),
            _ => 0,
        }
    }

    #[allow(unused_unsafe)]
    fn write_port(reg: Reg, value: u8) {
        let (portb, portd) = unsafe { (&*PORTB::ptr(), &*PORTD::ptr()) };
        match reg {
            Reg::Ddrb => portb.ddrb.write(|w| unsafe { w.bits(value) }),
            Reg::Portb => portb.portb.write(|w| unsafe { w.bits(value) }),
            Reg::Ddrd => portd.ddrd.write(|w| unsafe { w.bits(value) }),
            Reg::Portd => portd.portd.write(|w| unsafe { w.bits(value) }),
            _ => {}
        }
    }

    macro_rules! impl_mmio {
        ($TC:ident { $($reg:ident => $field:ident),+ $(,)? } $(wide { $($wreg:ident => $wfield:ident),+ $(,)? })?) => {
            impl RegisterBus for Mmio<$TC> {
                #[allow(unused_unsafe)]
                fn read(&self, reg: Reg) -> u8 {
                    match reg {
                        $( Reg::$reg => self.timer.$field.read().bits(), )+
                        $($( Reg::$wreg => self.read_wide(reg) as u8, )+)?
                        _ => read_port(reg),
                    }
                }

                #[allow(unused_unsafe)]
                fn write(&mut self, reg: Reg, value: u8) {
                    match reg {
                        $( Reg::$reg => self.timer.$field.write(|w| unsafe { w.bits(value) }), )+
                        $($( Reg::$wreg => self.write_wide(reg, value as u16), )+)?
                        _ => write_port(reg, value),
                    }
                }

                // The 16-bit registers share one TEMP latch, so an access
                // must not be split by an interrupt touching another one.
                #[allow(unused_unsafe)]
                fn read_wide(&self, reg: Reg) -> u16 {
                    match reg {
                        $($( Reg::$wreg => critical_section::with(|_| self.timer.$wfield.read().bits()), )+)?
                        _ => self.read(reg) as u16,
                    }
                }

                #[allow(unused_unsafe)]
                fn write_wide(&mut self, reg: Reg, value: u16) {
                    match reg {
                        $($( Reg::$wreg => critical_section::with(|_| {
                            self.timer.$wfield.write(|w| unsafe { w.bits(value) })
                        }), )+)?
                        _ => self.write(reg, value as u8),
                    }
                }
            }
        };
    }

    impl_mmio!(TC0 {
        Tccr0a => tccr0a,
        Tccr0b => tccr0b,
        Tcnt0 => tcnt0,
        Ocr0a => ocr0a,
        Ocr0b => ocr0b,
        Timsk0 => timsk0,
        Tifr0 => tifr0,
    });

    impl_mmio!(TC1 {
        Tccr1a => tccr1a,
        Tccr1b => tccr1b,
        Tccr1c => tccr1c,
        Timsk1 => timsk1,
        Tifr1 => tifr1,
    } wide {
        Tcnt1 => tcnt1,
        Icr1 => icr1,
        Ocr1a => ocr1a,
        Ocr1b => ocr1b,
    });

    impl_mmio!(TC2 {
        Tccr2a => tccr2a,
        Tccr2b => tccr2b,
        Tcnt2 => tcnt2,
        Ocr2a => ocr2a,
        Ocr2b => ocr2b,
        Timsk2 => timsk2,
        Tifr2 => tifr2,
    });
}
