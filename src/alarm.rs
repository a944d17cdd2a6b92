//! Alarm register patterns for the DS3231.
//!
//! Alarm 1 occupies four consecutive registers (seconds, minutes, hours,
//! day/date). Bit 7 of each is an "always match" mask: when set, that field
//! is ignored when the chip compares the alarm against the current time.
//! Clearing masks from the seconds register outward narrows the alarm from
//! "every second" to "once at an exact date and time".
//!
//! Alarm 2 has no seconds register. Its three registers are immediately
//! followed by the control register, so the periodic alarm 2 patterns here
//! include the control byte that enables it.
//!
//! The functions in this module are pure; the drivers only move the bytes.

use bitfield::bitfield;

use crate::bcd;
use crate::registers::{
    AlarmDayDate, AlarmHours, AlarmMinutes, AlarmSeconds, Control, DayDateSelect, InterruptControl,
    Oscillator, SquareWaveFrequency, TimeRepresentation,
};

/// Control register value that enables alarm 1 interrupts on the INT pin.
pub(crate) fn alarm1_control() -> Control {
    let mut control = Control::default();
    control.set_oscillator_enable(Oscillator::Enabled);
    control.set_square_wave_frequency(SquareWaveFrequency::Hz8192);
    control.set_interrupt_control(InterruptControl::Interrupt);
    control.set_alarm1_interrupt_enable(true);
    control
}

/// Control register value written together with the alarm 2 registers.
pub(crate) fn alarm2_control() -> Control {
    let mut control = Control::default();
    control.set_interrupt_control(InterruptControl::Interrupt);
    control.set_alarm2_interrupt_enable(true);
    control
}

/// Bits of the control register that must be set for alarm 1 to fire.
pub(crate) const ALARM1_ENABLE_BITS: u8 = 0b0000_0101;

/// Fixed repetition rates for periodic interrupts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Periodicity {
    /// Once per second
    EverySecond = 0x01,
    /// At second 00 of every minute
    EveryMinute = 0x02,
    /// At minute 00, second 00 of every hour
    EveryHour = 0x03,
}

impl TryFrom<u8> for Periodicity {
    /// The rejected raw value
    type Error = u8;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0x01 => Ok(Periodicity::EverySecond),
            0x02 => Ok(Periodicity::EveryMinute),
            0x03 => Ok(Periodicity::EveryHour),
            other => Err(other),
        }
    }
}

impl Periodicity {
    /// Alarm 1 register bytes (seconds, minutes, hours, day/date) for this rate.
    ///
    /// Every value field is zero, so "every minute" fires at second 00 and
    /// "every hour" at 00:00.
    #[must_use]
    pub fn alarm1_pattern(self) -> [u8; 4] {
        let (seconds, minutes) = match self {
            Periodicity::EverySecond => (true, true),
            Periodicity::EveryMinute => (false, true),
            Periodicity::EveryHour => (false, false),
        };
        let mut s = AlarmSeconds::default();
        s.set_always_match(seconds);
        let mut m = AlarmMinutes::default();
        m.set_always_match(minutes);
        let mut h = AlarmHours::default();
        h.set_always_match(true);
        let mut dd = AlarmDayDate::default();
        dd.set_always_match(true);
        [s.into(), m.into(), h.into(), dd.into()]
    }

    /// Alarm 2 register bytes (minutes, hours, day/date, control) for this
    /// rate, or `None` for [`Periodicity::EverySecond`] which alarm 2 cannot
    /// produce.
    #[must_use]
    pub fn alarm2_pattern(self) -> Option<[u8; 4]> {
        let minutes = match self {
            Periodicity::EverySecond => return None,
            Periodicity::EveryMinute => true,
            Periodicity::EveryHour => false,
        };
        let mut m = AlarmMinutes::default();
        m.set_always_match(minutes);
        let mut h = AlarmHours::default();
        h.set_always_match(true);
        let mut dd = AlarmDayDate::default();
        dd.set_always_match(true);
        Some([m.into(), h.into(), dd.into(), alarm2_control().into()])
    }
}

/// Match policy for the general alarm 1 setup.
///
/// The discriminant is the chip's mask truth table: bits 0-3 set the
/// always-match bit of the seconds, minutes, hours and day/date registers and
/// bit 4 selects day-of-week matching.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmMatch {
    /// Fire every second
    EverySecond = 0x0F,
    /// Fire when the seconds match
    MatchSeconds = 0x0E,
    /// Fire when minutes and seconds match
    MatchMinutes = 0x0C,
    /// Fire when hours, minutes and seconds match
    MatchHours = 0x08,
    /// Fire when date, hours, minutes and seconds match
    MatchDate = 0x00,
    /// Fire when weekday, hours, minutes and seconds match
    MatchDay = 0x10,
}

impl AlarmMatch {
    /// Raw 5-bit policy value
    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    const fn has(self, bit: u8) -> bool {
        self.bits() & bit != 0
    }
}

/// Alarm 1 bytes that fire once a day at `hour:minute:second`.
pub(crate) fn alarm1_daily(hour: u8, minute: u8, second: u8) -> [u8; 4] {
    let s = AlarmSeconds::from(bcd::encode(second));
    let m = AlarmMinutes::from(bcd::encode(minute));
    let mut h = AlarmHours::from(bcd::encode(hour));
    h.set_time_representation(TimeRepresentation::TwentyFourHour);
    let mut dd = AlarmDayDate::default();
    dd.set_always_match(true);
    [s.into(), m.into(), h.into(), dd.into()]
}

/// Alarm 1 bytes for a general match policy.
///
/// Values are BCD encoded; mask bits are only ever added, never cleared.
pub(crate) fn alarm1_for_match(
    policy: AlarmMatch,
    day_date: u8,
    hour: u8,
    minute: u8,
    second: u8,
) -> [u8; 4] {
    let mut s = AlarmSeconds::from(bcd::encode(second));
    let mut m = AlarmMinutes::from(bcd::encode(minute));
    let mut h = AlarmHours::from(bcd::encode(hour));
    let mut dd = AlarmDayDate::from(bcd::encode(day_date));
    if policy.has(0x01) {
        s.set_always_match(true);
    }
    if policy.has(0x02) {
        m.set_always_match(true);
    }
    if policy.has(0x04) {
        h.set_always_match(true);
    }
    if policy.has(0x08) {
        dd.set_always_match(true);
    }
    if policy.has(0x10) {
        dd.set_day_date_select(DayDateSelect::Day);
    }
    [s.into(), m.into(), h.into(), dd.into()]
}

bitfield! {
    /// Result of reading back an alarm setup and comparing it to the expected
    /// pattern. Each set bit names a register that differs.
    ///
    /// A value of zero means the chip holds exactly the expected bytes.
    /// `0xFF` is reserved for a periodicity the alarm cannot produce.
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct AlarmMismatch(u8);
    impl Debug;
    /// Control register enable bits differ
    pub control, set_control: 0;
    /// Seconds register differs
    pub seconds, set_seconds: 1;
    /// Minutes register differs
    pub minutes, set_minutes: 2;
    /// Hours register differs
    pub hours, set_hours: 3;
    /// Day/date register differs
    pub day_date, set_day_date: 4;
}

impl AlarmMismatch {
    /// Sentinel for a periodicity the alarm does not support.
    pub const INVALID_PERIODICITY: AlarmMismatch = AlarmMismatch(0xFF);

    /// True when every checked register matched.
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.0 == 0
    }

    /// True for the [`AlarmMismatch::INVALID_PERIODICITY`] sentinel.
    #[must_use]
    pub fn is_invalid_periodicity(&self) -> bool {
        *self == Self::INVALID_PERIODICITY
    }

    /// Raw bitmask
    #[must_use]
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Compares a control register read back from alarm 1 setup.
    pub(crate) fn check_alarm1_control(&mut self, control: u8) {
        let enabled = control & ALARM1_ENABLE_BITS;
        debug!("alarm1 control {:#x} diff {}", enabled, enabled != ALARM1_ENABLE_BITS);
        if enabled != ALARM1_ENABLE_BITS {
            self.set_control(true);
        }
    }

    /// Compares the four alarm 1 registers against `expected`.
    pub(crate) fn check_alarm1_registers(&mut self, actual: &[u8; 4], expected: &[u8; 4]) {
        debug!("alarm1 registers {:?} expected {:?}", actual, expected);
        self.set_seconds(actual[0] != expected[0]);
        self.set_minutes(actual[1] != expected[1]);
        self.set_hours(actual[2] != expected[2]);
        self.set_day_date(actual[3] != expected[3]);
    }

    /// Compares alarm 2 minutes, hours, day/date and control against `expected`.
    pub(crate) fn check_alarm2_registers(&mut self, actual: &[u8; 4], expected: &[u8; 4]) {
        debug!("alarm2 registers {:?} expected {:?}", actual, expected);
        self.set_minutes(actual[0] != expected[0]);
        self.set_hours(actual[1] != expected[1]);
        self.set_day_date(actual[2] != expected[2]);
        self.set_control(actual[3] != expected[3]);
    }
}

impl From<AlarmMismatch> for u8 {
    fn from(v: AlarmMismatch) -> Self {
        v.0
    }
}
