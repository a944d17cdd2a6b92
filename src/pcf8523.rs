//! Driver for the PCF8523 real-time clock.
//!
//! A reduced sibling of [`crate::DS3231`]: time keeping and the CLKOUT pin,
//! no alarms or temperature. The PCF8523 sits on the same 0x68 address, so a
//! board carries one or the other and application code picks the chip through
//! [`RealTimeClock`].

use embedded_hal::i2c::I2c;

use crate::bcd;
use crate::clock::RealTimeClock;
use crate::datetime::DateTime;
use crate::RtcError;

/// I2C address of the PCF8523.
pub const PCF8523_ADDRESS: u8 = 0x68;

const CONTROL_3: u8 = 0x02;
const SECONDS: u8 = 0x03;
const CLKOUT_CONTROL: u8 = 0x0F;

/// Power management bits of CONTROL_3 that read 0b111 when battery
/// switch-over is disabled, which is the reset state.
const BATTERY_SWITCHOVER_DISABLED: u8 = 0xE0;

/// CLKOUT pin frequency (COF bits of the CLKOUT control register).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pcf8523SquareWave {
    Hz32768 = 0,
    Hz16384 = 1,
    Hz8192 = 2,
    Hz4096 = 3,
    Hz1024 = 4,
    Hz32 = 5,
    Hz1 = 6,
    /// CLKOUT disabled
    Off = 7,
}

impl From<u8> for Pcf8523SquareWave {
    fn from(v: u8) -> Self {
        match v & 0x07 {
            0 => Pcf8523SquareWave::Hz32768,
            1 => Pcf8523SquareWave::Hz16384,
            2 => Pcf8523SquareWave::Hz8192,
            3 => Pcf8523SquareWave::Hz4096,
            4 => Pcf8523SquareWave::Hz1024,
            5 => Pcf8523SquareWave::Hz32,
            6 => Pcf8523SquareWave::Hz1,
            _ => Pcf8523SquareWave::Off,
        }
    }
}

impl From<Pcf8523SquareWave> for u8 {
    fn from(v: Pcf8523SquareWave) -> Self {
        v as u8
    }
}

/// PCF8523 Real-Time Clock driver.
pub struct Pcf8523<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> Pcf8523<I2C> {
    /// Creates a new driver on the fixed PCF8523 address.
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Destroys the driver and returns the bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Nothing to set up; the bus is ready once the driver exists.
    ///
    /// # Errors
    /// Never fails.
    pub fn begin(&mut self) -> Result<(), RtcError<I2C::Error>> {
        Ok(())
    }

    /// Whether the clock has been set since it lost power.
    ///
    /// Setting the time enables battery switch-over, so a chip still in its
    /// reset power mode has never been set.
    ///
    /// # Errors
    /// Returns an error if the bus transaction fails.
    pub fn is_initialized(&mut self) -> Result<bool, RtcError<I2C::Error>> {
        let mut data = [0; 1];
        self.i2c
            .write_read(PCF8523_ADDRESS, &[CONTROL_3], &mut data)?;
        Ok(data[0] & BATTERY_SWITCHOVER_DISABLED != BATTERY_SWITCHOVER_DISABLED)
    }

    /// Sets the date and time and switches to battery switch-over mode.
    ///
    /// # Errors
    /// Returns an error if a bus transaction fails.
    pub fn set_date_time(&mut self, datetime: &DateTime) -> Result<(), RtcError<I2C::Error>> {
        debug!("PCF8523: setting time to {}", datetime.y2k_seconds());
        self.i2c.write(
            PCF8523_ADDRESS,
            &[
                SECONDS,
                bcd::encode(datetime.second()),
                bcd::encode(datetime.minute()),
                bcd::encode(datetime.hour()),
                bcd::encode(datetime.date()),
                bcd::encode(datetime.day_of_week()),
                bcd::encode(datetime.month()),
                bcd::encode(datetime.year_offset()),
            ],
        )?;
        self.i2c.write(PCF8523_ADDRESS, &[CONTROL_3, 0x00])?;
        Ok(())
    }

    /// Reads the current date and time.
    ///
    /// # Errors
    /// Returns an error if the bus transaction fails.
    pub fn now(&mut self) -> Result<DateTime, RtcError<I2C::Error>> {
        let mut data = [0; 7];
        self.i2c
            .write_read(PCF8523_ADDRESS, &[SECONDS], &mut data)?;
        // bit 7 of seconds is the oscillator stop flag
        Ok(DateTime::new(
            2000 + u16::from(bcd::decode(data[6])),
            bcd::decode(data[5]),
            bcd::decode(data[3]),
            bcd::decode(data[2]),
            bcd::decode(data[1]),
            bcd::decode(data[0] & 0x7F),
            bcd::decode(data[4]),
        ))
    }

    /// Reads the CLKOUT frequency.
    ///
    /// # Errors
    /// Returns an error if the bus transaction fails.
    pub fn square_wave_mode(&mut self) -> Result<Pcf8523SquareWave, RtcError<I2C::Error>> {
        let mut data = [0; 1];
        self.i2c
            .write_read(PCF8523_ADDRESS, &[CLKOUT_CONTROL], &mut data)?;
        Ok(Pcf8523SquareWave::from(data[0] >> 3))
    }

    /// Sets the CLKOUT frequency. The timer bits of the register are cleared.
    ///
    /// # Errors
    /// Returns an error if the bus transaction fails.
    pub fn set_square_wave_mode(&mut self, mode: Pcf8523SquareWave) -> Result<(), RtcError<I2C::Error>> {
        self.i2c
            .write(PCF8523_ADDRESS, &[CLKOUT_CONTROL, u8::from(mode) << 3])?;
        Ok(())
    }
}

impl<I2C: I2c> RealTimeClock for Pcf8523<I2C> {
    type Error = RtcError<I2C::Error>;
    type SquareWaveMode = Pcf8523SquareWave;

    fn begin(&mut self) -> Result<(), Self::Error> {
        Pcf8523::begin(self)
    }

    fn now(&mut self) -> Result<DateTime, Self::Error> {
        Pcf8523::now(self)
    }

    fn set_date_time(&mut self, datetime: &DateTime) -> Result<(), Self::Error> {
        Pcf8523::set_date_time(self, datetime)
    }

    fn square_wave_mode(&mut self) -> Result<Pcf8523SquareWave, Self::Error> {
        Pcf8523::square_wave_mode(self)
    }

    fn set_square_wave_mode(&mut self, mode: Pcf8523SquareWave) -> Result<(), Self::Error> {
        Pcf8523::set_square_wave_mode(self, mode)
    }
}
