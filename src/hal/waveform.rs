//! Waveform generation modes.
//!
//! A mode is the WGM bit pattern plus where the counter's TOP comes from:
//! either a constant fixed by the silicon or a register the application
//! writes. Only the combinations listed in the datasheet exist; each device
//! module publishes them as associated constants (`WaveformMode1::CTC_ICR1`
//! and so on) and the constructors stay private to this crate.

use core::fmt;
use core::marker::PhantomData;

use ufmt::{uDebug, uWrite, Formatter};

use super::regs::{Reg, Resolution};
use super::timer::TimerDevice;
use crate::Error;

/// Source of the counting ceiling (TOP)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Top<W> {
    /// Architectural constant, e.g. 0xFF or 0x03FF
    Fixed(W),
    /// Held in a writable register, e.g. OCR1A or ICR1
    Register(Reg),
}

pub struct WaveformMode<D: TimerDevice> {
    mode: u8,
    top: Top<D::Resolution>,
    _device: PhantomData<D>,
}

impl<D: TimerDevice> WaveformMode<D> {
    pub(crate) const fn fixed(mode: u8, top: D::Resolution) -> Self {
        Self {
            mode,
            top: Top::Fixed(top),
            _device: PhantomData,
        }
    }

    pub(crate) const fn register(mode: u8, top: Reg) -> Self {
        Self {
            mode,
            top: Top::Register(top),
            _device: PhantomData,
        }
    }

    /// WGM bit pattern as numbered in the datasheet's mode table
    #[inline]
    pub const fn mode(&self) -> u8 {
        self.mode
    }

    #[inline]
    pub fn top(&self) -> Top<D::Resolution> {
        self.top
    }

    /// The constant TOP, if this mode has one
    pub fn fixed_top(&self) -> Option<D::Resolution> {
        match self.top {
            Top::Fixed(top) => Some(top),
            Top::Register(_) => None,
        }
    }

    /// The register holding TOP, if this mode takes it from a register
    pub fn top_register(&self) -> Option<Reg> {
        match self.top {
            Top::Fixed(_) => None,
            Top::Register(reg) => Some(reg),
        }
    }

    /// WGMn1:0, written to control register A
    #[inline]
    pub fn control_a_bits(&self) -> u8 {
        self.mode & D::WGM_A_MASK
    }

    /// Upper WGM bits, moved to their place in control register B
    #[inline]
    pub fn control_b_bits(&self) -> u8 {
        (self.mode & D::WGM_B_MASK) << 1
    }

    /// Every mode the device supports
    pub fn catalog() -> &'static [Self] {
        D::WAVEFORM_MODES
    }

    /// Look up the catalog entry for a WGM bit pattern.
    pub fn from_bits(bits: u8) -> Result<Self, Error> {
        D::WAVEFORM_MODES
            .iter()
            .find(|m| m.mode == bits)
            .copied()
            .ok_or(Error::ReservedMode(bits))
    }
}

impl<D: TimerDevice> Clone for WaveformMode<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: TimerDevice> Copy for WaveformMode<D> {}

/// Modes are identified by their WGM bits alone; the TOP source does not
/// take part in the comparison.
impl<D: TimerDevice> PartialEq for WaveformMode<D> {
    fn eq(&self, other: &Self) -> bool {
        self.mode == other.mode
    }
}

impl<D: TimerDevice> Eq for WaveformMode<D> {}

impl<D: TimerDevice> fmt::Debug for WaveformMode<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaveformMode")
            .field("mode", &self.mode)
            .field("top", &self.top)
            .finish()
    }
}

impl<D: TimerDevice> uDebug for WaveformMode<D> {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        match self.top {
            Top::Fixed(top) => f
                .debug_struct("WaveformMode")?
                .field("mode", &self.mode)?
                .field("top", &top.widen())?
                .finish(),
            Top::Register(reg) => f
                .debug_struct("WaveformMode")?
                .field("mode", &self.mode)?
                .field("top", &reg)?
                .finish(),
        }
    }
}
