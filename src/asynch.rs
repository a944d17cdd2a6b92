//! Async implementation of the DS3231 driver.
//!
//! Same operations as the blocking [`crate::DS3231`], built on the
//! `embedded-hal-async` I2C and delay traits. Only available with the `async`
//! feature.
//!
//! # Example
//!
//! ```rust,ignore
//! use ds3231_rtc::asynch::DS3231;
//! use ds3231_rtc::{Periodicity, DEFAULT_ADDRESS};
//!
//! let mut rtc = DS3231::new(i2c, delay, DEFAULT_ADDRESS);
//! rtc.begin().await?;
//! rtc.enable_interrupts(Periodicity::EverySecond).await?;
//! let now = rtc.now().await?;
//! ```

use chrono::NaiveDateTime;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use paste::paste;

use crate::alarm::{self, AlarmMatch, AlarmMismatch, Periodicity};
use crate::datetime::DateTime;
use crate::{
    apply_square_wave_mode, decode_temperature, decode_time_registers, encode_time_registers,
    square_wave_mode_from_control, AgingOffset, Config, Control, Hours, RegAddr, RtcError,
    SquareWaveMode, Status, TimeRepresentation, CONVERSION_POLL_INTERVAL_MS,
    CONVERSION_POLL_LIMIT, SETTLE_DELAY_MS,
};

/// DS3231 Real-Time Clock async driver.
pub struct DS3231<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
}

impl<I2C: I2c, D: DelayNs> DS3231<I2C, D> {
    /// Creates a new async driver instance.
    ///
    /// # Arguments
    /// * `i2c` - The async I2C bus implementation
    /// * `delay` - Async delay provider
    /// * `address` - The I2C address of the device (normally 0x68)
    pub fn new(i2c: I2C, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
        }
    }

    /// Destroys the driver and returns the bus and delay.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    async fn read_registers<const N: usize>(
        &mut self,
        start: RegAddr,
    ) -> Result<[u8; N], RtcError<I2C::Error>> {
        let mut data = [0; N];
        self.i2c
            .write_read(self.address, &[start as u8], &mut data)
            .await?;
        Ok(data)
    }

    async fn write_register(&mut self, reg: RegAddr, value: u8) -> Result<(), RtcError<I2C::Error>> {
        self.i2c.write(self.address, &[reg as u8, value]).await?;
        Ok(())
    }

    async fn write_block(
        &mut self,
        start: RegAddr,
        data: &[u8; 4],
    ) -> Result<(), RtcError<I2C::Error>> {
        self.i2c
            .write(
                self.address,
                &[start as u8, data[0], data[1], data[2], data[3]],
            )
            .await?;
        Ok(())
    }

    /// Puts the chip in its default state. See [`crate::DS3231::begin`].
    ///
    /// # Errors
    /// Returns an error if a bus transaction fails.
    pub async fn begin(&mut self) -> Result<(), RtcError<I2C::Error>> {
        self.configure(&Config::default()).await
    }

    /// Writes the control register from `config` and selects 24-hour time.
    ///
    /// # Errors
    /// Returns an error if a bus transaction fails.
    pub async fn configure(&mut self, config: &Config) -> Result<(), RtcError<I2C::Error>> {
        let control = config.control();
        debug!("DS3231: writing control {:#x}", u8::from(control));
        self.set_control(control).await?;
        self.delay.delay_ms(SETTLE_DELAY_MS).await;

        let mut hours = self.hour().await?;
        hours.set_time_representation(TimeRepresentation::TwentyFourHour);
        self.set_hour(hours).await?;
        self.delay.delay_ms(SETTLE_DELAY_MS).await;
        Ok(())
    }

    /// Sets the date and time.
    ///
    /// # Errors
    /// Returns an error if the bus transaction fails.
    pub async fn set_date_time(&mut self, datetime: &DateTime) -> Result<(), RtcError<I2C::Error>> {
        self.i2c
            .write(self.address, &encode_time_registers(datetime))
            .await?;
        Ok(())
    }

    /// Sets the clock from Unix time, clamping instants before 2000.
    ///
    /// # Errors
    /// Returns an error if the bus transaction fails.
    pub async fn set_epoch(&mut self, timestamp: u32) -> Result<(), RtcError<I2C::Error>> {
        self.set_date_time(&DateTime::from_epoch(timestamp)).await
    }

    /// Reads the current date and time.
    ///
    /// # Errors
    /// Returns an error if the bus transaction fails.
    pub async fn now(&mut self) -> Result<DateTime, RtcError<I2C::Error>> {
        let data: [u8; 8] = self.read_registers(RegAddr::Seconds).await?;
        Ok(decode_time_registers(&data))
    }

    /// Reads the current date and time as a validated chrono value.
    ///
    /// # Errors
    /// Returns [`RtcError::DateTime`] if the registers do not hold a real
    /// date, or an error if the bus transaction fails.
    pub async fn datetime(&mut self) -> Result<NaiveDateTime, RtcError<I2C::Error>> {
        let now = self.now().await?;
        NaiveDateTime::try_from(now).map_err(RtcError::DateTime)
    }

    /// Sets the date and time from a chrono value (2000-2099).
    ///
    /// # Errors
    /// Returns [`RtcError::DateTime`] for years outside 2000-2099, or an error
    /// if the bus transaction fails.
    pub async fn set_datetime(
        &mut self,
        datetime: &NaiveDateTime,
    ) -> Result<(), RtcError<I2C::Error>> {
        let datetime = DateTime::try_from(datetime).map_err(RtcError::DateTime)?;
        self.set_date_time(&datetime).await
    }

    /// Enables a periodic alarm 1 interrupt.
    ///
    /// # Errors
    /// Returns an error if a bus transaction fails.
    pub async fn enable_interrupts(
        &mut self,
        periodicity: Periodicity,
    ) -> Result<(), RtcError<I2C::Error>> {
        self.set_control(alarm::alarm1_control()).await?;
        self.write_block(RegAddr::Alarm1Seconds, &periodicity.alarm1_pattern())
            .await
    }

    /// Enables a daily alarm 1 interrupt at `hour:minute:second`.
    ///
    /// # Errors
    /// Returns an error if a bus transaction fails.
    pub async fn enable_interrupts_at(
        &mut self,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<(), RtcError<I2C::Error>> {
        self.set_control(alarm::alarm1_control()).await?;
        self.write_block(
            RegAddr::Alarm1Seconds,
            &alarm::alarm1_daily(hour, minute, second),
        )
        .await
    }

    /// Enables an alarm 1 interrupt with an explicit match policy.
    ///
    /// # Errors
    /// Returns an error if a bus transaction fails.
    pub async fn enable_alarm(
        &mut self,
        policy: AlarmMatch,
        day_date: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<(), RtcError<I2C::Error>> {
        self.set_control(alarm::alarm1_control()).await?;
        self.write_block(
            RegAddr::Alarm1Seconds,
            &alarm::alarm1_for_match(policy, day_date, hour, minute, second),
        )
        .await
    }

    /// Disables both alarms.
    ///
    /// # Errors
    /// Returns an error if a bus transaction fails.
    pub async fn disable_interrupts(&mut self) -> Result<(), RtcError<I2C::Error>> {
        self.begin().await
    }

    /// Clears the alarm 1 flag.
    ///
    /// # Errors
    /// Returns an error if a bus transaction fails.
    pub async fn clear_int_status(&mut self) -> Result<(), RtcError<I2C::Error>> {
        let mut status = self.status().await?;
        status.set_alarm1_flag(false);
        self.set_status(status).await
    }

    /// Starts a temperature conversion, optionally waiting for it to finish.
    ///
    /// # Errors
    /// Returns [`RtcError::Timeout`] if the conversion does not finish, or an
    /// error if a bus transaction fails.
    pub async fn convert_temperature(&mut self, wait: bool) -> Result<(), RtcError<I2C::Error>> {
        let mut control = self.control().await?;
        control.set_convert_temperature(true);
        self.set_control(control).await?;
        if !wait {
            return Ok(());
        }

        for _ in 0..CONVERSION_POLL_LIMIT {
            if !self.control().await?.convert_temperature() {
                return Ok(());
            }
            self.delay.delay_ms(CONVERSION_POLL_INTERVAL_MS).await;
        }
        error!("DS3231: temperature conversion timed out");
        Err(RtcError::Timeout)
    }

    /// Reads the die temperature in degrees Celsius.
    ///
    /// # Errors
    /// Returns an error if the bus transaction fails.
    pub async fn temperature(&mut self) -> Result<f32, RtcError<I2C::Error>> {
        let [msb, lsb] = self.read_registers::<2>(RegAddr::MSBTemp).await?;
        Ok(decode_temperature(msb, lsb))
    }

    /// Verifies the alarm 1 setup for `periodicity`.
    ///
    /// # Errors
    /// Returns an error if a bus transaction fails.
    pub async fn check_alarm1(
        &mut self,
        periodicity: Periodicity,
    ) -> Result<AlarmMismatch, RtcError<I2C::Error>> {
        let mut mismatch = AlarmMismatch::default();
        let control = self.control().await?;
        mismatch.check_alarm1_control(control.into());

        let actual: [u8; 4] = self.read_registers(RegAddr::Alarm1Seconds).await?;
        mismatch.check_alarm1_registers(&actual, &periodicity.alarm1_pattern());
        Ok(mismatch)
    }

    /// Verifies the alarm 2 setup for `periodicity`.
    ///
    /// # Errors
    /// Returns an error if the bus transaction fails.
    pub async fn check_alarm2(
        &mut self,
        periodicity: Periodicity,
    ) -> Result<AlarmMismatch, RtcError<I2C::Error>> {
        let Some(expected) = periodicity.alarm2_pattern() else {
            warn!("DS3231: alarm 2 has no {:?} mode", periodicity);
            return Ok(AlarmMismatch::INVALID_PERIODICITY);
        };
        let actual: [u8; 4] = self.read_registers(RegAddr::Alarm2Minutes).await?;
        let mut mismatch = AlarmMismatch::default();
        mismatch.check_alarm2_registers(&actual, &expected);
        Ok(mismatch)
    }

    /// Programs alarm 2 for a periodic interrupt.
    /// [`Periodicity::EverySecond`] is ignored.
    ///
    /// # Errors
    /// Returns an error if the bus transaction fails.
    pub async fn enable_alarm2(&mut self, periodicity: Periodicity) -> Result<(), RtcError<I2C::Error>> {
        let Some(pattern) = periodicity.alarm2_pattern() else {
            warn!("DS3231: alarm 2 has no {:?} mode", periodicity);
            return Ok(());
        };
        self.write_block(RegAddr::Alarm2Minutes, &pattern).await
    }

    /// Reads what the INT/SQW pin is outputting.
    ///
    /// # Errors
    /// Returns an error if the bus transaction fails.
    pub async fn square_wave_mode(&mut self) -> Result<SquareWaveMode, RtcError<I2C::Error>> {
        let control = self.control().await?;
        Ok(square_wave_mode_from_control(control))
    }

    /// Switches the INT/SQW pin between interrupts and a square wave.
    ///
    /// # Errors
    /// Returns an error if a bus transaction fails.
    pub async fn set_square_wave_mode(
        &mut self,
        mode: SquareWaveMode,
    ) -> Result<(), RtcError<I2C::Error>> {
        let mut control = self.control().await?;
        apply_square_wave_mode(&mut control, mode);
        self.set_control(control).await
    }
}

// Register access implementations
macro_rules! impl_async_register_access {
    ($(($name:ident, $regaddr:expr, $typ:ident)),+) => {
        impl<I2C: I2c, D: DelayNs> DS3231<I2C, D> {
            $(
                paste! {
                    #[doc = concat!("Reads the ", stringify!($name), " register.")]
                    #[doc = "\n\n# Errors"]
                    #[doc = "Returns an error if the bus transaction fails."]
                    pub async fn $name(&mut self) -> Result<$typ, RtcError<I2C::Error>> {
                        let [value] = self.read_registers::<1>($regaddr).await?;
                        Ok($typ::from(value))
                    }

                    #[doc = concat!("Writes the ", stringify!($name), " register.")]
                    #[doc = "\n\n# Errors"]
                    #[doc = "Returns an error if the bus transaction fails."]
                    pub async fn [<set_ $name>](&mut self, value: $typ) -> Result<(), RtcError<I2C::Error>> {
                        self.write_register($regaddr, value.into()).await
                    }
                }
            )+
        }
    }
}

impl_async_register_access!(
    (hour, RegAddr::Hours, Hours),
    (control, RegAddr::Control, Control),
    (status, RegAddr::ControlStatus, Status),
    (aging_offset, RegAddr::AgingOffset, AgingOffset)
);
