//! Blocking drivers for the BME280 environmental sensor and the VL53L1X
//! time-of-flight ranging sensor over `embedded-hal` I2C.

pub mod error;
pub mod transport;

#[cfg(feature = "bme280")]
pub mod bme280;
#[cfg(feature = "vl53l1x")]
pub mod vl53l1x;

pub mod prelude {
    pub use super::error::{ErrorKind, SensorError};
    pub use super::SensorReader;

    #[cfg(feature = "bme280")]
    pub use super::bme280::{
        Bme280, Bme280Config, DeviceAddr, Filter, Oversampling, Reading, SamplingMode, Standby,
        SEA_LEVEL_HPA,
    };
    #[cfg(feature = "vl53l1x")]
    pub use super::vl53l1x::{
        DistanceMode, RangeReading, RangeReason, RangeStatus, Vl53l1x, Vl53l1xConfig,
    };
}

/// Polls a sensor for one measurement. Readings carry their own failure
/// information, so a logging loop can keep going when the bus hiccups.
pub trait SensorReader {
    type Reading;

    fn read(&mut self) -> Self::Reading;
}

/// Merges two bytes so the result is both, ex merge_bytes(0x20, 0x33) = 0x2033
pub(crate) fn merge_bytes(a: u8, b: u8) -> u16 {
    ((a as u16) << 8) | b as u16
}
