//! Errors from the fallible conversions of the timer value types.
//!
//! The register operations themselves never fail: an out-of-range channel is
//! ignored. Only turning raw numbers into channels, waveform modes or
//! prescalers can be rejected.

use ufmt::derive::uDebug;

#[derive(Debug, uDebug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// No compare channel exists at this index
    InvalidChannel(u8),
    /// The waveform-generation bits select a reserved mode
    ReservedMode(u8),
    /// The prescaler cannot divide the clock by this factor
    UnsupportedDivisor(u16),
}
