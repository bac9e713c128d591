//! Integer compensation formulas from the BME280 datasheet (section 4.2.3).
//!
//! Intermediates are 64 bit. Multiplications in the pressure and humidity chains
//! wrap instead of panicking so adversarial raw codes can't abort a polling loop,
//! the humidity clamp then bounds whatever comes out.

use super::calibration::Calibration;

/// Largest humidity accumulator value, 100 %RH in Q22.10 before the final shift
pub const HUMIDITY_LIMIT: i64 = 419_430_400;

/// Uncompensated ADC codes of one measurement cycle
#[derive(Default, Copy, Clone, Debug, Eq, PartialEq)]
pub struct RawSample {
    pub temperature: u32,
    pub pressure: u32,
    pub humidity: u32,
}

impl RawSample {
    /// Unpacks the 8 data registers starting at 0xF7 (press msb..hum lsb)
    pub fn from_registers(data: [u8; 8]) -> Self {
        let twenty_bit = |msb: u8, lsb: u8, xlsb: u8| {
            ((msb as u32) << 16 | (lsb as u32) << 8 | xlsb as u32) >> 4
        };

        Self {
            pressure: twenty_bit(data[0], data[1], data[2]),
            temperature: twenty_bit(data[3], data[4], data[5]),
            humidity: crate::merge_bytes(data[6], data[7]) as u32,
        }
    }
}

/// Fixed point results of one measurement cycle
#[derive(Default, Copy, Clone, Debug, Eq, PartialEq)]
pub struct CompensatedData {
    /// Hundredths of a degree Celsius
    pub temperature: i32,
    /// Pascal in Q24.8
    pub pressure: u32,
    /// %RH in Q22.10
    pub humidity: u32,
}

/// Returns `(t_fine, temperature)`, temperature in 0.01 degC
pub fn compensate_temperature(calib: &Calibration, raw: u32) -> (i64, i32) {
    let adc = raw as i64;
    let t1 = calib.t1 as i64;

    let var1 = (((adc >> 3) - (t1 << 1)) * calib.t2 as i64) >> 11;
    let var2 = (((((adc >> 4) - t1) * ((adc >> 4) - t1)) >> 12) * calib.t3 as i64) >> 14;
    let t_fine = var1 + var2;

    (t_fine, ((t_fine * 5 + 128) >> 8) as i32)
}

/// Pressure in Pa as Q24.8, 0 when the calibration would divide by zero
pub fn compensate_pressure(calib: &Calibration, t_fine: i64, raw: u32) -> u32 {
    let mut var1 = t_fine.wrapping_sub(128_000);
    let mut var2 = var1.wrapping_mul(var1).wrapping_mul(calib.p6 as i64);
    var2 = var2.wrapping_add(var1.wrapping_mul(calib.p5 as i64) << 17);
    var2 = var2.wrapping_add((calib.p4 as i64) << 35);
    var1 = (var1.wrapping_mul(var1).wrapping_mul(calib.p3 as i64) >> 8)
        .wrapping_add(var1.wrapping_mul(calib.p2 as i64) << 12);
    var1 = ((1i64 << 47).wrapping_add(var1)).wrapping_mul(calib.p1 as i64) >> 33;

    if var1 == 0 {
        return 0;
    }

    let mut p = 1_048_576 - raw as i64;
    p = ((p << 31).wrapping_sub(var2))
        .wrapping_mul(3125)
        .wrapping_div(var1);
    var1 = (calib.p9 as i64).wrapping_mul(p >> 13).wrapping_mul(p >> 13) >> 25;
    var2 = (calib.p8 as i64).wrapping_mul(p) >> 19;

    ((p.wrapping_add(var1).wrapping_add(var2) >> 8) + ((calib.p7 as i64) << 4)) as u32
}

/// Relative humidity in %RH as Q22.10
pub fn compensate_humidity(calib: &Calibration, t_fine: i64, raw: u32) -> u32 {
    let h = t_fine.wrapping_sub(76_800);

    let x1 = (((raw as i64) << 14)
        .wrapping_sub((calib.h4 as i64) << 20)
        .wrapping_sub((calib.h5 as i64).wrapping_mul(h))
        .wrapping_add(16_384))
        >> 15;
    let x2 = (((h.wrapping_mul(calib.h6 as i64) >> 10)
        .wrapping_mul((h.wrapping_mul(calib.h3 as i64) >> 11) + 32_768)
        >> 10)
        .wrapping_add(2_097_152)
        .wrapping_mul(calib.h2 as i64)
        .wrapping_add(8_192))
        >> 14;

    let mut v = x1.wrapping_mul(x2);
    v = v.wrapping_sub(
        ((((v >> 15).wrapping_mul(v >> 15)) >> 7).wrapping_mul(calib.h1 as i64)) >> 4,
    );

    (v.clamp(0, HUMIDITY_LIMIT) >> 12) as u32
}

/// Runs the whole chain, t_fine is derived fresh from this sample's temperature
pub fn compensate(calib: &Calibration, raw: RawSample) -> CompensatedData {
    let (t_fine, temperature) = compensate_temperature(calib, raw.temperature);

    CompensatedData {
        temperature,
        pressure: compensate_pressure(calib, t_fine, raw.pressure),
        humidity: compensate_humidity(calib, t_fine, raw.humidity),
    }
}
