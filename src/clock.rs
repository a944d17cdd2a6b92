//! Capabilities shared by the supported RTC chips.

use crate::datetime::DateTime;

/// Common interface of a battery-backed clock chip.
///
/// Application code that only needs to keep wall-clock time can be written
/// against this trait and pick the chip through its type parameter.
pub trait RealTimeClock {
    /// Error returned by bus operations
    type Error;
    /// Chip specific square wave / clock output setting
    type SquareWaveMode;

    /// Brings the chip into its default operating state.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus transaction fails.
    fn begin(&mut self) -> Result<(), Self::Error>;

    /// Reads the current date and time.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus transaction fails.
    fn now(&mut self) -> Result<DateTime, Self::Error>;

    /// Writes a new date and time.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus transaction fails.
    fn set_date_time(&mut self, datetime: &DateTime) -> Result<(), Self::Error>;

    /// Sets the clock from Unix time, clamping instants before 2000 to
    /// 2000-01-01 00:00:00.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus transaction fails.
    fn set_epoch(&mut self, timestamp: u32) -> Result<(), Self::Error> {
        self.set_date_time(&DateTime::from_epoch(timestamp))
    }

    /// Reads the current square wave output setting.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus transaction fails.
    fn square_wave_mode(&mut self) -> Result<Self::SquareWaveMode, Self::Error>;

    /// Changes the square wave output setting.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus transaction fails.
    fn set_square_wave_mode(&mut self, mode: Self::SquareWaveMode) -> Result<(), Self::Error>;
}
