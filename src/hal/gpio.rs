use super::regs::{Reg, RegisterBus};

/// I/O ports carrying timer compare outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    B,
    D,
}

impl Port {
    /// Pin input register (PINx)
    pub const fn input(self) -> Reg {
        match self {
            Port::B => Reg::Pinb,
            Port::D => Reg::Pind,
        }
    }

    /// Output value / pull-up register (PORTx)
    pub const fn data(self) -> Reg {
        match self {
            Port::B => Reg::Portb,
            Port::D => Reg::Portd,
        }
    }

    /// Data direction register (DDRx)
    pub const fn direction(self) -> Reg {
        match self {
            Port::B => Reg::Ddrb,
            Port::D => Reg::Ddrd,
        }
    }
}

/// A single pin of a port, e.g. PB1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortPin {
    pub port: Port,
    pub bit: u8,
}

impl PortPin {
    pub const fn new(port: Port, bit: u8) -> Self {
        Self { port, bit }
    }

    #[inline]
    const fn mask(self) -> u8 {
        1 << self.bit
    }

    /// Drive the pin as an output, starting low.
    ///
    /// The PORTx bit is cleared before DDRx is set so the pin never sees the
    /// pull-up (or a high level) while switching direction.
    pub fn make_output<B: RegisterBus>(self, bus: &mut B) {
        let mask = self.mask();
        bus.modify(self.port.data(), |r| r & !mask);
        bus.modify(self.port.direction(), |r| r | mask);
    }

    pub fn is_output<B: RegisterBus>(self, bus: &B) -> bool {
        bus.read(self.port.direction()) & self.mask() != 0
    }

    /// Level on the pin, including one driven by a compare output.
    pub fn is_high<B: RegisterBus>(self, bus: &B) -> bool {
        bus.read(self.port.input()) & self.mask() != 0
    }
}
