//! ST VL53L1X time-of-flight ranging sensor.

pub mod registers;
pub mod status;

pub use registers::DistanceMode;
pub use status::{RangeData, RangeReason, RangeStatus};

use crate::error::{Result, SensorError};
use crate::transport::{AddressWidth, RegisterDevice};
use crate::SensorReader;
use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c;
use log::{debug, info, warn};
use registers as reg;
use status::RESULT_BLOCK_LEN;

pub const DEFAULT_ADDRESS: u8 = 0x29;
pub const MODEL_ID: u16 = 0xEACC;

const RESET_LOW_MS: u32 = 100;
const RESET_HIGH_MS: u32 = 1;
const BOOT_POLL_MS: u32 = 2;
const INIT_DATA_READY_POLL_MS: u32 = 100;
const DATA_READY_POLL_MS: u32 = 1;
const ADDRESS_SETTLE_MS: u32 = 50;

const RANGING_START: u8 = 0x40;
const RANGING_STOP: u8 = 0x00;
const INTERRUPT_CLEAR: u8 = 0x01;
/// Budget in effect before the configured one is applied
const INITIAL_TIMING_BUDGET_MS: u16 = 200;

/// Settings applied once the device has booted
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Vl53l1xConfig {
    pub address: u8,
    pub distance_mode: DistanceMode,
    pub timing_budget_ms: u16,
}

impl Default for Vl53l1xConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            distance_mode: DistanceMode::Long,
            timing_budget_ms: 100,
        }
    }
}

impl Vl53l1xConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    pub fn with_distance_mode(mut self, mode: DistanceMode) -> Self {
        self.distance_mode = mode;
        self
    }

    pub fn with_timing_budget(mut self, budget_ms: u16) -> Self {
        self.timing_budget_ms = budget_ms;
        self
    }
}

/// Outcome of one distance read, `distance_mm` is -1 when the bus failed
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RangeReading {
    pub distance_mm: i32,
    pub status: RangeStatus,
    pub data: Option<RangeData>,
    pub fault: Option<SensorError>,
}

impl RangeReading {
    fn failed(error: SensorError) -> Self {
        Self {
            distance_mm: -1,
            status: RangeStatus::transport_error(),
            data: None,
            fault: Some(error),
        }
    }
}

/// The ranging sensor
#[derive(Clone, Debug)]
pub struct Vl53l1x<I2C, D> {
    device: RegisterDevice<I2C>,
    delay: D,
    timing_budget_ms: u16,
}

impl<I2C, D> Vl53l1x<I2C, D>
where
    I2C: i2c::WriteRead + i2c::Write,
    D: DelayMs<u32>,
{
    /// Resets and boots the sensor, loads the default configuration, applies
    /// `config` and leaves it ranging
    pub fn new(i2c: I2C, delay: D, config: Vl53l1xConfig) -> Result<Self> {
        let mut sensor = Self {
            device: RegisterDevice::new(i2c, config.address, AddressWidth::Bits16),
            delay,
            timing_budget_ms: INITIAL_TIMING_BUDGET_MS,
        };

        sensor.reset()?;
        let model_id = sensor.device.read_u16_be(reg::MODEL_ID)?;
        if model_id != MODEL_ID {
            return Err(SensorError::IdentityMismatch {
                expected: MODEL_ID,
                found: model_id,
            });
        }

        while sensor.device.read_u8(reg::FIRMWARE_SYSTEM_STATUS)? == 0 {
            sensor.delay.delay_ms(BOOT_POLL_MS);
        }
        debug!("VL53L1X {:#x} booted", config.address);

        sensor.sensor_init()?;
        sensor.set_distance_mode(config.distance_mode)?;
        sensor.set_timing_budget(config.timing_budget_ms)?;
        sensor.start_ranging()?;

        info!(
            "VL53L1X ready at {:#x}, {:?} mode, {}ms budget",
            config.address, config.distance_mode, config.timing_budget_ms
        );
        Ok(sensor)
    }

    fn reset(&mut self) -> Result<()> {
        self.device.write_u8(reg::RESET, 0x00)?;
        self.delay.delay_ms(RESET_LOW_MS);
        self.device.write_u8(reg::RESET, 0x01)?;
        self.delay.delay_ms(RESET_HIGH_MS);
        Ok(())
    }

    /// Loads the default configuration and runs one throwaway measurement
    fn sensor_init(&mut self) -> Result<()> {
        self.device
            .write_register(reg::DEFAULT_CONFIGURATION_START, &reg::DEFAULT_CONFIGURATION)?;

        self.start_ranging()?;
        self.wait_data_ready(INIT_DATA_READY_POLL_MS)?;
        self.clear_interrupt()?;
        self.stop_ranging()?;

        self.device.write_u8(reg::VHV_TIMEOUT_MACROP_LOOP_BOUND, 0x09)?;
        self.device.write_u8(reg::VHV_CONFIG_INIT, 0x00)
    }

    /// Current mode as read back from the device, None when the register matches neither mode
    pub fn distance_mode(&mut self) -> Result<Option<DistanceMode>> {
        let value = self.device.read_u8(reg::PHASECAL_TIMEOUT_MACROP)?;
        Ok(DistanceMode::from_phasecal_timeout(value))
    }

    /// Switches mode and reapplies the current timing budget, which fails if
    /// that budget doesn't exist in the new mode
    pub fn set_distance_mode(&mut self, mode: DistanceMode) -> Result<()> {
        let settings = mode.settings();
        self.device
            .write_u8(reg::PHASECAL_TIMEOUT_MACROP, settings.phasecal_timeout)?;
        self.device
            .write_u8(reg::RANGE_VCSEL_PERIOD_A, settings.vcsel_period_a)?;
        self.device
            .write_u8(reg::RANGE_VCSEL_PERIOD_B, settings.vcsel_period_b)?;
        self.device
            .write_u8(reg::RANGE_VALID_PHASE_HIGH, settings.valid_phase_high)?;
        self.device.write_u16_be(reg::SD_WOI_SD0, settings.woi_sd0)?;
        self.device
            .write_u16_be(reg::SD_INITIAL_PHASE_SD0, settings.initial_phase_sd0)?;
        debug!("VL53L1X {:#x} distance mode {:?}", self.address(), mode);

        self.set_timing_budget(self.timing_budget_ms)
    }

    pub fn set_timing_budget(&mut self, budget_ms: u16) -> Result<()> {
        let value = self.device.read_u8(reg::PHASECAL_TIMEOUT_MACROP)?;
        let mode = DistanceMode::from_phasecal_timeout(value)
            .ok_or(SensorError::IndeterminateDistanceMode(value))?;
        let (macrop_a, macrop_b) = mode
            .macro_periods(budget_ms)
            .ok_or(SensorError::InvalidTimingBudget {
                mode: mode as u8,
                budget_ms,
            })?;

        self.device.write_u16_be(reg::RANGE_TIMEOUT_MACROP_A, macrop_a)?;
        self.device.write_u16_be(reg::RANGE_TIMEOUT_MACROP_B, macrop_b)?;
        self.timing_budget_ms = budget_ms;
        debug!("VL53L1X {:#x} timing budget {}ms", self.address(), budget_ms);
        Ok(())
    }

    pub fn start_ranging(&mut self) -> Result<()> {
        self.device.write_u8(reg::SYSTEM_MODE_START, RANGING_START)
    }

    pub fn stop_ranging(&mut self) -> Result<()> {
        self.device.write_u8(reg::SYSTEM_MODE_START, RANGING_STOP)
    }

    pub fn clear_interrupt(&mut self) -> Result<()> {
        self.device
            .write_u8(reg::SYSTEM_INTERRUPT_CLEAR, INTERRUPT_CLEAR)
    }

    /// Level of GPIO1 that signals new data, 1 for active high
    pub fn interrupt_polarity(&mut self) -> Result<u8> {
        let mux = self.device.read_u8(reg::GPIO_HV_MUX_CTRL)?;
        Ok(if mux & 0x10 != 0 { 0 } else { 1 })
    }

    pub fn data_ready(&mut self) -> Result<bool> {
        let level = self.device.read_u8(reg::GPIO_TIO_HV_STATUS)? & 0x01;
        Ok(level == self.interrupt_polarity()?)
    }

    /// Blocks until a result is available, there is no timeout
    fn wait_data_ready(&mut self, poll_ms: u32) -> Result<()> {
        while !self.data_ready()? {
            self.delay.delay_ms(poll_ms);
        }
        Ok(())
    }

    fn read_range(&mut self) -> Result<RangeData> {
        self.wait_data_ready(DATA_READY_POLL_MS)?;

        let mut data = [0; RESULT_BLOCK_LEN];
        self.device.read_register(reg::RESULT_RANGE_STATUS, &mut data)?;
        Ok(RangeData::from_registers(data))
    }

    /// Waits for the next result and returns it. Bus failures are reported in the
    /// reading instead of returned; the interrupt is cleared either way.
    pub fn distance(&mut self) -> RangeReading {
        let range = self.read_range();
        let cleared = self.clear_interrupt();

        match (range, cleared) {
            (Ok(data), Ok(())) => RangeReading {
                distance_mm: data.range_mm as i32,
                status: data.status(),
                data: Some(data),
                fault: None,
            },
            (Err(error), _) | (Ok(_), Err(error)) => {
                warn!("VL53L1X at {:#x} read failed: {}", self.address(), error);
                RangeReading::failed(error)
            }
        }
    }

    /// Moves the device to a new 7 bit address and follows it there
    pub fn change_address(&mut self, new_address: u8) -> Result<()> {
        let new_address = new_address & 0x7F;
        self.device.write_u8(reg::I2C_ADDRESS, new_address)?;
        self.delay.delay_ms(ADDRESS_SETTLE_MS);
        self.device.set_address(new_address);
        info!("VL53L1X moved to {:#x}", new_address);
        Ok(())
    }
}

impl<I2C, D> Vl53l1x<I2C, D> {
    pub fn address(&self) -> u8 {
        self.device.address()
    }

    /// Last budget that was successfully applied
    pub fn timing_budget(&self) -> u16 {
        self.timing_budget_ms
    }

    pub fn release(self) -> (I2C, D) {
        (self.device.release(), self.delay)
    }
}

impl<I2C, D> SensorReader for Vl53l1x<I2C, D>
where
    I2C: i2c::WriteRead + i2c::Write,
    D: DelayMs<u32>,
{
    type Reading = RangeReading;

    fn read(&mut self) -> RangeReading {
        self.distance()
    }
}
