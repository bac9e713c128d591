//! Bosch BME280 temperature, pressure and humidity sensor.

pub mod calibration;
pub mod compensation;
mod config;

pub use calibration::{parse_calibration, Calibration};
pub use compensation::{compensate, CompensatedData, RawSample};
pub use config::{Bme280Config, DeviceAddr, Filter, Oversampling, SamplingMode, Standby};

use crate::error::{Result, SensorError};
use crate::transport::{AddressWidth, RegisterDevice};
use crate::SensorReader;
use calibration::{HUMIDITY_CALIB_LEN, TEMP_PRESS_CALIB_LEN};
use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c;
use log::{debug, info, warn};

pub const CHIP_ID: u8 = 0x60;
const RESET_COMMAND: u8 = 0xB6;
const RESET_SETTLE_MS: u32 = 3;
const STATUS_POLL_MS: u32 = 2;
const STATUS_MEASURING: u8 = 0x08;

/// Standard atmosphere at sea level in hPa
pub const SEA_LEVEL_HPA: f64 = 1013.25;

mod reg {
    pub const CHIP_ID: u16 = 0xD0;
    pub const RESET: u16 = 0xE0;
    pub const STATUS: u16 = 0xF3;
    pub const CTRL_HUM: u16 = 0xF2;
    pub const CTRL_MEAS: u16 = 0xF4;
    pub const CONFIG: u16 = 0xF5;
    pub const DATA: u16 = 0xF7;
    pub const CALIB_TEMP_PRESS: u16 = 0x88;
    pub const CALIB_H1: u16 = 0xA1;
    pub const CALIB_HUM: u16 = 0xE1;
}

/// One compensated measurement. On a bus failure every value is NaN and `fault` says why.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    pub temperature: f64,
    pub pressure: f64,
    pub humidity: f64,
    pub fault: Option<SensorError>,
}

impl Reading {
    fn failed(error: SensorError) -> Self {
        Self {
            temperature: f64::NAN,
            pressure: f64::NAN,
            humidity: f64::NAN,
            fault: Some(error),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.fault.is_none()
    }
}

/// Splits Q24.8 pressure into whole and fractional pascals
pub fn split_pressure(pressure: f64) -> (f64, f64) {
    ((pressure / 256.0).floor(), (pressure % 256.0) / 256.0)
}

/// Barometric altitude in metres for a pressure in Pa against a sea level reference in hPa
pub fn altitude_from_pressure(pressure_pa: f64, sea_level_hpa: f64) -> f64 {
    44330.0 * (1.0 - ((pressure_pa / 100.0) / sea_level_hpa).powf(1.0 / 5.255))
}

/// The environmental sensor
#[derive(Clone, Debug)]
pub struct Bme280<I2C, D> {
    device: RegisterDevice<I2C>,
    delay: D,
    config: Bme280Config,
    calibration: Calibration,
}

impl<I2C, D> Bme280<I2C, D>
where
    I2C: i2c::WriteRead + i2c::Write,
    D: DelayMs<u32>,
{
    /// Resets the sensor, checks its identity, loads the trimming data and applies `config`
    pub fn new(i2c: I2C, mut delay: D, config: Bme280Config) -> Result<Self> {
        let mut device = RegisterDevice::new(i2c, config.address, AddressWidth::Bits8);

        device.write_u8(reg::RESET, RESET_COMMAND)?;
        delay.delay_ms(RESET_SETTLE_MS);

        let chip_id = device.read_u8(reg::CHIP_ID)?;
        if chip_id != CHIP_ID {
            return Err(SensorError::IdentityMismatch {
                expected: CHIP_ID as u16,
                found: chip_id as u16,
            });
        }

        let calibration = Self::read_calibration(&mut device)?;
        debug!("BME280 {:#x} calibration {:?}", config.address, calibration);

        let mut sensor = Self {
            device,
            delay,
            config,
            calibration,
        };
        sensor.write_acquisition_options()?;
        sensor.write_device_config()?;

        info!("BME280 ready at {:#x}", sensor.address());
        Ok(sensor)
    }

    fn read_calibration(device: &mut RegisterDevice<I2C>) -> Result<Calibration> {
        let mut temp_press = [0; TEMP_PRESS_CALIB_LEN];
        device.read_register(reg::CALIB_TEMP_PRESS, &mut temp_press)?;
        let h1 = device.read_u8(reg::CALIB_H1)?;
        let mut humidity = [0; HUMIDITY_CALIB_LEN];
        device.read_register(reg::CALIB_HUM, &mut humidity)?;

        Ok(parse_calibration(&temp_press, h1, &humidity))
    }

    /// ctrl_hum only latches once ctrl_meas is written, so the order matters
    fn write_acquisition_options(&mut self) -> Result<()> {
        self.device.write_u8(reg::CTRL_HUM, self.config.ctrl_hum())?;
        self.device.write_u8(reg::CTRL_MEAS, self.config.ctrl_meas())
    }

    fn write_device_config(&mut self) -> Result<()> {
        self.device.write_u8(reg::CONFIG, self.config.config())
    }

    /// Raw oversampling codes for temperature, pressure and humidity, invalid codes mean off
    pub fn set_oversampling(&mut self, temperature: u8, pressure: u8, humidity: u8) -> Result<()> {
        self.config = self.config.with_oversampling(temperature, pressure, humidity);
        self.write_acquisition_options()
    }

    /// Codes above 4 saturate at 16 coefficients
    pub fn set_filter(&mut self, code: u8) -> Result<()> {
        self.config = self.config.with_filter(code);
        self.write_device_config()
    }

    pub fn set_sampling_mode(&mut self, mode: SamplingMode) -> Result<()> {
        self.config = self.config.with_mode(mode);
        self.write_acquisition_options()?;
        self.write_device_config()
    }

    pub fn set_standby(&mut self, standby: Standby) -> Result<()> {
        self.config = self.config.with_standby(standby);
        self.write_device_config()
    }

    /// Triggers a measurement and waits for it, then returns the ADC codes
    pub fn read_raw_data(&mut self) -> Result<RawSample> {
        // A brown-out resets the acquisition registers, rewrite them every time
        self.write_acquisition_options()?;
        let settle_ms = self.measurement_time_ms().ceil() as u32;
        self.delay.delay_ms(settle_ms);

        let mut spins = 0u32;
        while self.device.read_u8(reg::STATUS)? & STATUS_MEASURING != 0 {
            spins += 1;
            self.delay.delay_ms(STATUS_POLL_MS);
        }
        if spins > 0 {
            debug!("BME280 still measuring after estimate, polled {} times", spins);
        }

        let mut data = [0; 8];
        self.device.read_register(reg::DATA, &mut data)?;
        Ok(RawSample::from_registers(data))
    }

    /// Compensated values in device units, propagating bus failures
    pub fn try_read_compensated_data(&mut self) -> Result<CompensatedData> {
        let raw = self.read_raw_data()?;
        Ok(compensate(&self.calibration, raw))
    }

    /// Temperature in 0.01 degC, pressure in Pa/256 and humidity in %RH/1024.
    /// A bus failure yields NaN values and the error in `fault`.
    pub fn read_compensated_data(&mut self) -> Reading {
        match self.try_read_compensated_data() {
            Ok(data) => Reading {
                temperature: data.temperature as f64,
                pressure: data.pressure as f64,
                humidity: data.humidity as f64,
                fault: None,
            },
            Err(error) => {
                warn!("BME280 at {:#x} read failed: {}", self.address(), error);
                Reading::failed(error)
            }
        }
    }

    /// Temperature in degC, pressure in Pa and humidity in %RH
    pub fn values(&mut self) -> Reading {
        let reading = self.read_compensated_data();
        Reading {
            temperature: reading.temperature / 100.0,
            pressure: reading.pressure / 256.0,
            humidity: reading.humidity / 1024.0,
            ..reading
        }
    }

    /// Whole and fractional pascals of a fresh pressure reading
    pub fn pressure_precision(&mut self) -> (f64, f64) {
        split_pressure(self.read_compensated_data().pressure)
    }

    /// Altitude in metres relative to `sea_level_hpa`, see [`SEA_LEVEL_HPA`]
    pub fn altitude(&mut self, sea_level_hpa: f64) -> f64 {
        let (whole, fraction) = self.pressure_precision();
        altitude_from_pressure(whole + fraction, sea_level_hpa)
    }
}

impl<I2C, D> Bme280<I2C, D> {
    pub fn address(&self) -> u8 {
        self.device.address()
    }

    pub fn config(&self) -> Bme280Config {
        self.config
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    /// Estimated duration of one forced measurement with the current oversampling
    pub fn measurement_time_ms(&self) -> f32 {
        self.config.measurement_time_ms()
    }

    pub fn release(self) -> (I2C, D) {
        (self.device.release(), self.delay)
    }
}

impl<I2C, D> SensorReader for Bme280<I2C, D>
where
    I2C: i2c::WriteRead + i2c::Write,
    D: DelayMs<u32>,
{
    type Reading = Reading;

    fn read(&mut self) -> Reading {
        self.values()
    }
}

#[cfg(test)]
mod test {
    use super::calibration::test::{HUMIDITY_BLOCK, H1, TEMP_PRESS_BLOCK};
    use super::*;
    use crate::error::ErrorKind;
    use embedded_hal_mock::eh0::delay::NoopDelay as MockNoop;
    use embedded_hal_mock::eh0::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
    use embedded_hal_mock::eh0::MockError;
    use std::io::ErrorKind as IoErrorKind;

    const ADDR: u8 = 0x77;
    // Raw codes 519888 / 415148 / 27000
    const DATA: [u8; 8] = [0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00, 0x69, 0x78];

    fn init_transactions(addr: u8, ctrl_hum: u8, ctrl_meas: u8, config: u8) -> Vec<I2cTransaction> {
        vec![
            I2cTransaction::write(addr, vec![0xE0, 0xB6]),
            I2cTransaction::write_read(addr, vec![0xD0], vec![CHIP_ID]),
            I2cTransaction::write_read(addr, vec![0x88], TEMP_PRESS_BLOCK.to_vec()),
            I2cTransaction::write_read(addr, vec![0xA1], vec![H1]),
            I2cTransaction::write_read(addr, vec![0xE1], HUMIDITY_BLOCK.to_vec()),
            I2cTransaction::write(addr, vec![0xF2, ctrl_hum]),
            I2cTransaction::write(addr, vec![0xF4, ctrl_meas]),
            I2cTransaction::write(addr, vec![0xF5, config]),
        ]
    }

    fn measurement_transactions() -> Vec<I2cTransaction> {
        vec![
            I2cTransaction::write(ADDR, vec![0xF2, 0x01]),
            I2cTransaction::write(ADDR, vec![0xF4, 0x25]),
            I2cTransaction::write_read(ADDR, vec![0xF3], vec![STATUS_MEASURING]),
            I2cTransaction::write_read(ADDR, vec![0xF3], vec![0x00]),
            I2cTransaction::write_read(ADDR, vec![0xF7], DATA.to_vec()),
        ]
    }

    fn sensor(extra: Vec<I2cTransaction>) -> (Bme280<I2cMock, MockNoop>, I2cMock) {
        let mut expectations = init_transactions(ADDR, 0x01, 0x25, 0x00);
        expectations.extend(extra);
        let i2c = I2cMock::new(&expectations);
        let bme = Bme280::new(i2c.clone(), MockNoop::new(), Bme280Config::new()).unwrap();
        (bme, i2c)
    }

    #[test]
    fn initialization() {
        let (bme, mut i2c) = sensor(vec![]);
        assert_eq!(bme.calibration(), super::calibration::test::golden());
        assert_eq!(bme.address(), ADDR);
        i2c.done();
    }

    #[test]
    fn initialization_clamps_requested_config() {
        let config = Bme280Config::new()
            .with_address(DeviceAddr::AD0)
            .with_oversampling(9, 5, 2)
            .with_filter(7)
            .with_mode(SamplingMode::Normal)
            .with_standby(Standby::Ms1000);
        let expectations = init_transactions(0x76, 0x02, 0b000_101_11, 0b101_100_00);
        let mut i2c = I2cMock::new(&expectations);

        let bme = Bme280::new(i2c.clone(), MockNoop::new(), config).unwrap();
        assert_eq!(bme.config().temperature, Oversampling::Off);
        assert_eq!(bme.config().filter, Filter::X16);
        i2c.done();
    }

    #[test]
    fn identity_mismatch_is_fatal() {
        let expectations = [
            I2cTransaction::write(ADDR, vec![0xE0, 0xB6]),
            I2cTransaction::write_read(ADDR, vec![0xD0], vec![0x58]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let error = Bme280::new(i2c.clone(), MockNoop::new(), Bme280Config::new()).err().unwrap();
        assert_eq!(
            error,
            SensorError::IdentityMismatch {
                expected: 0x60,
                found: 0x58
            }
        );
        assert_eq!(error.kind(), ErrorKind::IdentityMismatch);
        i2c.done();
    }

    #[test]
    fn identity_read_failure_is_transport() {
        let expectations = [
            I2cTransaction::write(ADDR, vec![0xE0, 0xB6]),
            I2cTransaction::write_read(ADDR, vec![0xD0], vec![0x00])
                .with_error(MockError::Io(IoErrorKind::Other)),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let error = Bme280::new(i2c.clone(), MockNoop::new(), Bme280Config::new()).err().unwrap();
        assert_eq!(error.kind(), ErrorKind::Transport);
        i2c.done();
    }

    #[test]
    fn calibration_failure_is_fatal() {
        let expectations = [
            I2cTransaction::write(ADDR, vec![0xE0, 0xB6]),
            I2cTransaction::write_read(ADDR, vec![0xD0], vec![CHIP_ID]),
            I2cTransaction::write_read(ADDR, vec![0x88], TEMP_PRESS_BLOCK.to_vec())
                .with_error(MockError::Io(IoErrorKind::Other)),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let error = Bme280::new(i2c.clone(), MockNoop::new(), Bme280Config::new()).err().unwrap();
        assert_eq!(error, SensorError::WriteReadI2CError { register: 0x88 });
        i2c.done();
    }

    #[test]
    fn raw_read_waits_for_measurement() {
        let (mut bme, mut i2c) = sensor(measurement_transactions());
        assert_eq!(
            bme.read_raw_data().unwrap(),
            RawSample {
                temperature: 519_888,
                pressure: 415_148,
                humidity: 27_000,
            }
        );
        i2c.done();
    }

    #[test]
    fn compensated_values() {
        let (mut bme, mut i2c) = sensor(measurement_transactions());

        let reading = bme.values();
        assert!(reading.is_valid());
        assert!((reading.temperature - 25.08).abs() < 1e-9);
        assert_eq!(reading.pressure, 100_653.25390625);
        assert_eq!(reading.humidity, 41.0087890625);
        i2c.done();
    }

    #[test]
    fn pressure_precision_splits_pascals() {
        let (mut bme, mut i2c) = sensor(measurement_transactions());
        assert_eq!(bme.pressure_precision(), (100_653.0, 0.25390625));
        i2c.done();
    }

    #[test]
    fn transport_failure_degrades_to_nan() {
        let (mut bme, mut i2c) = sensor(vec![I2cTransaction::write(ADDR, vec![0xF2, 0x01])
            .with_error(MockError::Io(IoErrorKind::Other))]);

        let reading = bme.read_compensated_data();
        assert!(reading.temperature.is_nan());
        assert!(reading.pressure.is_nan());
        assert!(reading.humidity.is_nan());
        assert_eq!(
            reading.fault,
            Some(SensorError::WriteI2CError { register: 0xF2 })
        );
        i2c.done();
    }

    #[test]
    fn failed_altitude_is_nan() {
        let mut extra = measurement_transactions();
        extra[4] = I2cTransaction::write_read(ADDR, vec![0xF7], DATA.to_vec())
            .with_error(MockError::Io(IoErrorKind::Other));
        let (mut bme, mut i2c) = sensor(extra);

        assert!(bme.altitude(SEA_LEVEL_HPA).is_nan());
        i2c.done();
    }

    #[test]
    fn runtime_configuration() {
        let (mut bme, mut i2c) = sensor(vec![
            I2cTransaction::write(ADDR, vec![0xF2, 0x00]),
            I2cTransaction::write(ADDR, vec![0xF4, 0b011_000_01]),
            I2cTransaction::write(ADDR, vec![0xF5, 0b000_011_00]),
            I2cTransaction::write(ADDR, vec![0xF2, 0x00]),
            I2cTransaction::write(ADDR, vec![0xF4, 0b011_000_11]),
            I2cTransaction::write(ADDR, vec![0xF5, 0b010_011_00]),
        ]);

        bme.set_oversampling(3, 6, 0).unwrap();
        bme.set_filter(3).unwrap();
        bme.set_sampling_mode(SamplingMode::Normal).unwrap();
        i2c.done();
    }

    #[test]
    fn sea_level_altitude_is_zero() {
        let (whole, fraction) = split_pressure(101_325.0 * 256.0);
        assert_eq!((whole, fraction), (101_325.0, 0.0));
        assert!(altitude_from_pressure(whole + fraction, SEA_LEVEL_HPA).abs() < 1e-9);
    }

    #[test]
    fn lower_pressure_is_higher() {
        let altitude = altitude_from_pressure(100_653.25, SEA_LEVEL_HPA);
        assert!(altitude > 55.0 && altitude < 58.0);
    }
}
