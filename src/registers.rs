//! Register map and bitfield register types for the DS3231.
//!
//! Plain time and date registers hold packed BCD and are handled with
//! [`crate::bcd`]. Registers that mix flag bits with data are modelled as
//! `bitfield!` newtypes over the raw byte.

use bitfield::bitfield;

/// Register addresses for the DS3231 RTC.
#[allow(unused)]
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegAddr {
    /// Seconds register (0-59)
    Seconds = 0x00,
    /// Minutes register (0-59)
    Minutes = 0x01,
    /// Hours register (0-23 in 24-hour mode)
    Hours = 0x02,
    /// Day of week register (1-7)
    Day = 0x03,
    /// Date register (1-31)
    Date = 0x04,
    /// Month register (1-12)
    Month = 0x05,
    /// Year register (0-99, offset from 2000)
    Year = 0x06,
    /// Alarm 1 seconds register
    Alarm1Seconds = 0x07,
    /// Alarm 1 minutes register
    Alarm1Minutes = 0x08,
    /// Alarm 1 hours register
    Alarm1Hours = 0x09,
    /// Alarm 1 day/date register
    Alarm1DayDate = 0x0A,
    /// Alarm 2 minutes register
    Alarm2Minutes = 0x0B,
    /// Alarm 2 hours register
    Alarm2Hours = 0x0C,
    /// Alarm 2 day/date register
    Alarm2DayDate = 0x0D,
    /// Control register
    Control = 0x0E,
    /// Control/Status register
    ControlStatus = 0x0F,
    /// Aging offset register
    AgingOffset = 0x10,
    /// Temperature MSB register (whole degrees)
    MSBTemp = 0x11,
    /// Temperature LSB register (quarter degrees in bits 7:6)
    LSBTemp = 0x12,
}

/// Hour register format selected by bit 6 of the hours register.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeRepresentation {
    /// 24-hour format (0-23)
    TwentyFourHour = 0,
    /// 12-hour format (1-12 + AM/PM)
    TwelveHour = 1,
}
impl From<u8> for TimeRepresentation {
    fn from(v: u8) -> Self {
        if v & 0x01 == 0 {
            TimeRepresentation::TwentyFourHour
        } else {
            TimeRepresentation::TwelveHour
        }
    }
}
impl From<TimeRepresentation> for u8 {
    fn from(v: TimeRepresentation) -> Self {
        v as u8
    }
}

/// Oscillator control (the EOSC bit is active low).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oscillator {
    /// Oscillator runs on battery power
    Enabled = 0,
    /// Oscillator stops when running on battery power
    Disabled = 1,
}
impl From<u8> for Oscillator {
    fn from(v: u8) -> Self {
        if v & 0x01 == 0 {
            Oscillator::Enabled
        } else {
            Oscillator::Disabled
        }
    }
}
impl From<Oscillator> for u8 {
    fn from(v: Oscillator) -> Self {
        v as u8
    }
}

/// Function of the INT/SQW pin (INTCN bit).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptControl {
    /// Output square wave on INT/SQW pin
    SquareWave = 0,
    /// Output alarm interrupts on INT/SQW pin
    Interrupt = 1,
}
impl From<u8> for InterruptControl {
    fn from(v: u8) -> Self {
        if v & 0x01 == 0 {
            InterruptControl::SquareWave
        } else {
            InterruptControl::Interrupt
        }
    }
}
impl From<InterruptControl> for u8 {
    fn from(v: InterruptControl) -> Self {
        v as u8
    }
}

/// Square wave output frequency (RS2:RS1).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SquareWaveFrequency {
    /// 1 Hz
    Hz1 = 0b00,
    /// 1.024 kHz
    Hz1024 = 0b01,
    /// 4.096 kHz
    Hz4096 = 0b10,
    /// 8.192 kHz
    Hz8192 = 0b11,
}
impl From<u8> for SquareWaveFrequency {
    fn from(v: u8) -> Self {
        match v & 0b11 {
            0b00 => SquareWaveFrequency::Hz1,
            0b01 => SquareWaveFrequency::Hz1024,
            0b10 => SquareWaveFrequency::Hz4096,
            _ => SquareWaveFrequency::Hz8192,
        }
    }
}
impl From<SquareWaveFrequency> for u8 {
    fn from(v: SquareWaveFrequency) -> Self {
        v as u8
    }
}

/// DY/DT bit of an alarm day/date register.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DayDateSelect {
    /// Match against date of the month (1-31)
    Date = 0,
    /// Match against day of the week (1-7)
    Day = 1,
}
impl From<u8> for DayDateSelect {
    fn from(v: u8) -> Self {
        if v & 0x01 == 0 {
            DayDateSelect::Date
        } else {
            DayDateSelect::Day
        }
    }
}
impl From<DayDateSelect> for u8 {
    fn from(v: DayDateSelect) -> Self {
        v as u8
    }
}

// Generates the From<u8> and Into<u8> implementations for a register type
macro_rules! from_register_u8 {
    ($typ:ident) => {
        impl From<u8> for $typ {
            fn from(v: u8) -> Self {
                $typ(v)
            }
        }
        impl From<$typ> for u8 {
            fn from(v: $typ) -> Self {
                v.0
            }
        }
    };
}

bitfield! {
    /// Hours register: mode bits plus the BCD hour.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Hours(u8);
    impl Debug;
    /// 12/24 hour select
    pub from into TimeRepresentation, time_representation, set_time_representation: 6, 6;
    /// PM flag (12-hour) or 20-hour bit (24-hour)
    pub pm_or_twenty_hours, set_pm_or_twenty_hours: 5, 5;
    /// BCD hour, 24-hour layout
    pub bcd_hours, set_bcd_hours: 5, 0;
}
from_register_u8!(Hours);

bitfield! {
    /// Control register (0x0E).
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Control(u8);
    impl Debug;
    /// EOSC, active low
    pub from into Oscillator, oscillator_enable, set_oscillator_enable: 7, 7;
    /// BBSQW
    pub battery_backed_square_wave, set_battery_backed_square_wave: 6;
    /// CONV, set to force a temperature conversion; reads 1 while busy
    pub convert_temperature, set_convert_temperature: 5;
    /// RS2:RS1
    pub from into SquareWaveFrequency, square_wave_frequency, set_square_wave_frequency: 4, 3;
    /// INTCN
    pub from into InterruptControl, interrupt_control, set_interrupt_control: 2, 2;
    /// A2IE
    pub alarm2_interrupt_enable, set_alarm2_interrupt_enable: 1;
    /// A1IE
    pub alarm1_interrupt_enable, set_alarm1_interrupt_enable: 0;
}
from_register_u8!(Control);

bitfield! {
    /// Control/Status register (0x0F).
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Status(u8);
    impl Debug;
    /// OSF, oscillator was stopped at some point
    pub oscillator_stop_flag, set_oscillator_stop_flag: 7;
    /// EN32kHz
    pub enable_32khz_output, set_enable_32khz_output: 3;
    /// BSY, a temperature conversion is running
    pub busy, set_busy: 2;
    /// A2F
    pub alarm2_flag, set_alarm2_flag: 1;
    /// A1F
    pub alarm1_flag, set_alarm1_flag: 0;
}
from_register_u8!(Status);

bitfield! {
    /// Aging offset register, two's complement trim of the oscillator.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AgingOffset(u8);
    impl Debug;
    pub i8, aging_offset, set_aging_offset: 7, 0;
}
from_register_u8!(AgingOffset);

bitfield! {
    /// Alarm seconds register (alarm 1 only).
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AlarmSeconds(u8);
    impl Debug;
    /// A1M1: ignore seconds when set
    pub always_match, set_always_match: 7;
    pub bcd_seconds, set_bcd_seconds: 6, 0;
}
from_register_u8!(AlarmSeconds);

bitfield! {
    /// Alarm minutes register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AlarmMinutes(u8);
    impl Debug;
    /// A1M2/A2M2: ignore minutes when set
    pub always_match, set_always_match: 7;
    pub bcd_minutes, set_bcd_minutes: 6, 0;
}
from_register_u8!(AlarmMinutes);

bitfield! {
    /// Alarm hours register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AlarmHours(u8);
    impl Debug;
    /// A1M3/A2M3: ignore hours when set
    pub always_match, set_always_match: 7;
    pub from into TimeRepresentation, time_representation, set_time_representation: 6, 6;
    pub bcd_hours, set_bcd_hours: 5, 0;
}
from_register_u8!(AlarmHours);

bitfield! {
    /// Alarm day/date register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AlarmDayDate(u8);
    impl Debug;
    /// A1M4/A2M4: ignore day and date when set
    pub always_match, set_always_match: 7;
    /// DY/DT
    pub from into DayDateSelect, day_date_select, set_day_date_select: 6, 6;
    /// BCD date, or the weekday when DY/DT selects the day
    pub bcd_day_date, set_bcd_day_date: 5, 0;
}
from_register_u8!(AlarmDayDate);
