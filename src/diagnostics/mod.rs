//! Register dumps for bring-up and debugging.
//!
//! Output goes to any `ufmt::uWrite` sink, one `[DBG] NAME: 0xHH` line per
//! value, so the same format comes out of the serial console and the tests.

use ufmt::uWrite;

use crate::hal::{Reg, RegisterBus, TimerDevice, TimerEngine, Top};

const HEX_CHARS: [u8; 16] = *b"0123456789ABCDEF";

fn write_hex<W: uWrite + ?Sized>(w: &mut W, val: u8) -> Result<(), W::Error> {
    let digits = [HEX_CHARS[(val >> 4) as usize], HEX_CHARS[(val & 0xF) as usize]];
    // both bytes are ASCII
    w.write_str(core::str::from_utf8(&digits).unwrap_or("??"))
}

/// `[DBG] msg: 0xHH`
pub fn debug<W: uWrite + ?Sized>(w: &mut W, msg: &str, val: u8) -> Result<(), W::Error> {
    w.write_str("[DBG] ")?;
    w.write_str(msg)?;
    w.write_str(": 0x")?;
    write_hex(w, val)?;
    w.write_str("\r\n")
}

/// `[DBG] msg: 0xHHHH`
pub fn debug_wide<W: uWrite + ?Sized>(w: &mut W, msg: &str, val: u16) -> Result<(), W::Error> {
    w.write_str("[DBG] ")?;
    w.write_str(msg)?;
    w.write_str(": 0x")?;
    let [lo, hi] = val.to_le_bytes();
    write_hex(w, hi)?;
    write_hex(w, lo)?;
    w.write_str("\r\n")
}

/// Print one register with the width it has.
pub fn register<W, B>(w: &mut W, bus: &B, reg: Reg) -> Result<(), W::Error>
where
    W: uWrite + ?Sized,
    B: RegisterBus,
{
    if reg.is_wide() {
        debug_wide(w, reg.name(), bus.read_wide(reg))
    } else {
        debug(w, reg.name(), bus.read(reg))
    }
}

/// Print every register of a timer: control, counter, interrupt mask and
/// flags, the compare register of each channel and the TOP register if the
/// waveform mode has one.
pub fn dump<W, D, B, const CHAN: usize>(w: &mut W, timer: &TimerEngine<D, B, CHAN>) -> Result<(), W::Error>
where
    W: uWrite + ?Sized,
    D: TimerDevice,
    B: RegisterBus,
{
    let bus = timer.bus();
    w.write_str("[DBG] --- ")?;
    w.write_str(D::NAME)?;
    w.write_str(" ---\r\n")?;

    register(w, bus, D::CONTROL_A)?;
    register(w, bus, D::CONTROL_B)?;
    if let Some(control_c) = D::CONTROL_C {
        register(w, bus, control_c)?;
    }
    register(w, bus, D::COUNTER)?;
    register(w, bus, D::INTERRUPT_MASK)?;
    register(w, bus, D::INTERRUPT_FLAGS)?;
    for binding in D::CHANNELS.iter().take(CHAN) {
        register(w, bus, binding.compare)?;
    }
    if let Top::Register(top) = timer.waveform_mode().top() {
        // OCRnA doubles as TOP in some modes and was printed above
        if !D::CHANNELS.iter().take(CHAN).any(|b| b.compare == top) {
            register(w, bus, top)?;
        }
    }
    Ok(())
}
