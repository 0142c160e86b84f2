pub mod gpio;
pub mod regs;
pub mod timer;
pub mod timer0;
pub mod timer1;
pub mod timer2;
pub mod waveform;

#[cfg(target_arch = "avr")]
pub mod console;

// Re-export commonly used types
pub use gpio::{Port, PortPin};
pub use regs::{Reg, RegisterBus, Resolution};
pub use timer::{ctc_top, Channel, ClockSelect, CompareOutputMode, TimerDevice, TimerEngine};
pub use timer0::{Prescaler0, Tc0, Timer0, WaveformMode0};
pub use timer1::{Prescaler1, Tc1, Timer1, WaveformMode1};
pub use timer2::{Prescaler2, Tc2, Timer2, WaveformMode2};
pub use waveform::{Top, WaveformMode};

#[cfg(target_arch = "avr")]
pub use console::Console;
#[cfg(target_arch = "avr")]
pub use regs::{Mmio, TimerBuses};
