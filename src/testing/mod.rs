//! On-target checks of the timer hardware.
//!
//! Host tests cover the register sequences against a mock bus. These run on
//! the chip and verify the counters actually do what the registers say,
//! reporting over any `uWrite` sink.

use ufmt::{uDebug, uWrite, uwrite, Formatter};

use crate::hal::{
    Channel, CompareOutputMode, Port, PortPin, Prescaler0, Prescaler1, Prescaler2, Timer0, Timer1, Timer2,
    TimerBuses, WaveformMode0, WaveformMode1, WaveformMode2,
};

/// Busy-wait iterations before a condition counts as timed out
pub const DEFAULT_TIMEOUT: u16 = 10_000;

pub struct TestRunner<W: uWrite> {
    out: W,
    total_tests: u32,
    passed_tests: u32,
    current_suite: &'static str,
}

pub trait TestCase {
    fn run(&self) -> TestResult;
    fn name(&self) -> &'static str;
}

#[derive(Debug, ufmt::derive::uDebug, PartialEq, Eq)]
pub enum TestResult {
    Pass,
    Fail(TestError),
}

#[derive(Debug, PartialEq, Eq)]
pub enum TestError {
    AssertionFailed(&'static str),
    Timeout,
}

impl uDebug for TestError {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        match self {
            TestError::AssertionFailed(what) => {
                f.write_str("AssertionFailed(")?;
                f.write_str(what)?;
                f.write_str(")")
            }
            TestError::Timeout => f.write_str("Timeout"),
        }
    }
}

macro_rules! check_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            return TestResult::Fail(TestError::AssertionFailed(concat!(
                "`",
                stringify!($left),
                " == ",
                stringify!($right),
                "`"
            )));
        }
    };
}

macro_rules! check {
    ($cond:expr) => {
        if !$cond {
            return TestResult::Fail(TestError::AssertionFailed(concat!("`", stringify!($cond), "`")));
        }
    };
}

macro_rules! check_timeout {
    ($cond:expr, $timeout:expr) => {
        let mut remaining: u16 = $timeout;
        while !$cond {
            if remaining == 0 {
                return TestResult::Fail(TestError::Timeout);
            }
            remaining -= 1;
            avr_device::asm::nop();
        }
    };
}

impl<W: uWrite> TestRunner<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            total_tests: 0,
            passed_tests: 0,
            current_suite: "",
        }
    }

    pub fn run_suite(&mut self, name: &'static str, tests: &[&dyn TestCase]) {
        self.current_suite = name;
        uwrite!(self.out, "\r\n=== Test Suite: {} ===\r\n", name).ok();

        for test in tests {
            self.total_tests += 1;
            uwrite!(self.out, "Running {}: ", test.name()).ok();

            match test.run() {
                TestResult::Pass => {
                    self.passed_tests += 1;
                    self.out.write_str("PASS\r\n").ok();
                }
                TestResult::Fail(err) => {
                    uwrite!(self.out, "FAIL - {:?}\r\n", err).ok();
                }
            }
        }

        self.print_summary();
    }

    pub fn all_passed(&self) -> bool {
        self.passed_tests == self.total_tests
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn print_summary(&mut self) {
        let percent = if self.total_tests == 0 {
            100
        } else {
            self.passed_tests * 100 / self.total_tests
        };
        uwrite!(
            self.out,
            "\r\nTest Summary for {}:\r\nPassed: {}/{} ({}%)\r\n",
            self.current_suite,
            self.passed_tests,
            self.total_tests,
            percent
        )
        .ok();
    }
}

fn buses() -> TimerBuses {
    // the runner owns the chip while tests run
    unsafe { TimerBuses::steal() }
}

/// Timer1 in normal mode counts up from zero.
pub struct CounterRuns;

impl TestCase for CounterRuns {
    fn name(&self) -> &'static str {
        "Timer1 counter runs"
    }

    fn run(&self) -> TestResult {
        let mut timer = Timer1::new(buses().tc1, WaveformMode1::NORMAL, Prescaler1::Div1);
        critical_section::with(|cs| timer.activate(cs, 0, false));

        let start = timer.counter();
        for _ in 0..16 {
            avr_device::asm::nop();
        }
        let end = timer.counter();

        timer.reconfigure(WaveformMode1::NORMAL, Prescaler1::Stop);
        critical_section::with(|cs| timer.activate(cs, 0, false));
        check!(end > start);
        TestResult::Pass
    }
}

/// Timer2 in CTC mode never counts past OCR2A.
pub struct CtcCeiling;

impl TestCase for CtcCeiling {
    fn name(&self) -> &'static str {
        "Timer2 CTC ceiling"
    }

    fn run(&self) -> TestResult {
        const TOP: u8 = 99;
        let mut timer = Timer2::new(buses().tc2, WaveformMode2::CTC_OCR2A, Prescaler2::Div1);
        critical_section::with(|cs| timer.activate(cs, TOP, false));

        let mut highest: u8 = 0;
        for _ in 0..500 {
            highest = highest.max(timer.counter());
        }

        timer.reconfigure(WaveformMode2::CTC_OCR2A, Prescaler2::Stop);
        critical_section::with(|cs| timer.activate(cs, TOP, false));
        check!(highest <= TOP);
        check!(highest > 0);
        TestResult::Pass
    }
}

/// A compare match on Timer0 channel B raises OCF0B.
pub struct CompareFlag;

impl TestCase for CompareFlag {
    fn name(&self) -> &'static str {
        "Timer0 compare flag"
    }

    fn run(&self) -> TestResult {
        let mut timer = Timer0::new(buses().tc0, WaveformMode0::NORMAL, Prescaler0::Div8);
        critical_section::with(|cs| {
            timer.activate(cs, 0xFF, false);
            timer.activate_compare_channel(cs, Channel::B, 0x40, CompareOutputMode::Disconnected, false);
        });
        check_eq!(timer.output_mode(Channel::B), Some(CompareOutputMode::Disconnected));
        check_timeout!(timer.compare_match_pending(Channel::B), DEFAULT_TIMEOUT);

        timer.reconfigure(WaveformMode0::NORMAL, Prescaler0::Stop);
        critical_section::with(|cs| timer.activate(cs, 0xFF, false));
        TestResult::Pass
    }
}

/// The overflow flag sets after a full count and activation clears it.
pub struct OverflowFlag;

impl TestCase for OverflowFlag {
    fn name(&self) -> &'static str {
        "Timer0 overflow flag"
    }

    fn run(&self) -> TestResult {
        let mut timer = Timer0::new(buses().tc0, WaveformMode0::NORMAL, Prescaler0::Div1);
        critical_section::with(|cs| timer.activate(cs, 0xFF, false));
        check_timeout!(timer.overflow_pending(), DEFAULT_TIMEOUT);

        timer.reconfigure(WaveformMode0::NORMAL, Prescaler0::Stop);
        critical_section::with(|cs| timer.activate(cs, 0xFF, false));
        check!(!timer.overflow_pending());
        TestResult::Pass
    }
}

/// Strobing FOC2A in CTC toggle mode flips PB3.
pub struct ForcedCompare;

impl TestCase for ForcedCompare {
    fn name(&self) -> &'static str {
        "Timer2 forced compare"
    }

    fn run(&self) -> TestResult {
        let mut timer = Timer2::new(buses().tc2, WaveformMode2::CTC_OCR2A, Prescaler2::Stop);
        critical_section::with(|cs| {
            timer.activate(cs, 0xFF, false);
            timer.activate_compare_channel(cs, Channel::A, 0xFF, CompareOutputMode::Toggle, false);
        });
        timer.activate_output_pin(Channel::A);

        let pin = PortPin::new(Port::B, 3);
        let before = pin.is_high(timer.bus());
        timer.force_output_compare(Channel::A);
        // PINx lags the pin by one synchronizer cycle
        avr_device::asm::nop();
        let after = pin.is_high(timer.bus());

        critical_section::with(|cs| timer.activate(cs, 0xFF, false));
        check!(before != after);
        TestResult::Pass
    }
}

pub fn timer_suite() -> [&'static dyn TestCase; 5] {
    [&CounterRuns, &CtcCeiling, &CompareFlag, &OverflowFlag, &ForcedCompare]
}
