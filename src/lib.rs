//! Declarative configuration of the ATmega328P timer/counter units.
//!
//! A timer is described by a [`WaveformMode`](hal::WaveformMode) and a
//! prescaler, then brought up with a fixed register sequence by the generic
//! [`TimerEngine`](hal::TimerEngine). [`Timer0`](hal::Timer0),
//! [`Timer1`](hal::Timer1) and [`Timer2`](hal::Timer2) bind the engine to
//! the three hardware units.
//!
//! Register access goes through [`RegisterBus`](hal::RegisterBus), so the
//! register sequences are unit tested on the host. On the target each timer
//! gets its own `Mmio` bus from `TimerBuses`.

#![cfg_attr(not(test), no_std)]

pub mod clock;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod hal;

#[cfg(target_arch = "avr")]
pub mod testing;

pub use error::Error;
