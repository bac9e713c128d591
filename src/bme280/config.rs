/// Per channel oversampling, code 0 skips the channel
#[allow(dead_code)]
#[derive(Default, Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq)]
pub enum Oversampling {
    Off = 0,
    #[default]
    X1 = 1,
    X2 = 2,
    X4 = 3,
    X8 = 4,
    X16 = 5,
}

impl Oversampling {
    /// Anything outside the known codes turns the channel off
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Oversampling::X1,
            2 => Oversampling::X2,
            3 => Oversampling::X4,
            4 => Oversampling::X8,
            5 => Oversampling::X16,
            _ => Oversampling::Off,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Number of IIR filter coefficients
#[allow(dead_code)]
#[derive(Default, Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq)]
pub enum Filter {
    #[default]
    Off = 0,
    X2 = 1,
    X4 = 2,
    X8 = 3,
    X16 = 4,
}

impl Filter {
    /// Codes above the maximum saturate at 16 coefficients
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Filter::Off,
            1 => Filter::X2,
            2 => Filter::X4,
            3 => Filter::X8,
            _ => Filter::X16,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

#[allow(dead_code)]
#[derive(Default, Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq)]
pub enum SamplingMode {
    Sleep = 0,
    #[default]
    Forced = 1,
    Normal = 3,
}

/// Inactive time between measurements in normal mode
#[allow(dead_code)]
#[derive(Default, Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq)]
pub enum Standby {
    Ms0_5 = 0,
    Ms62_5 = 1,
    #[default]
    Ms125 = 2,
    Ms250 = 3,
    Ms500 = 4,
    Ms1000 = 5,
    Ms10 = 6,
    Ms20 = 7,
}

impl Standby {
    /// Only the low three bits are meaningful
    pub fn from_code(code: u8) -> Self {
        match code & 0x07 {
            0 => Standby::Ms0_5,
            1 => Standby::Ms62_5,
            2 => Standby::Ms125,
            3 => Standby::Ms250,
            4 => Standby::Ms500,
            5 => Standby::Ms1000,
            6 => Standby::Ms10,
            _ => Standby::Ms20,
        }
    }
}

/// The two supported I2C addresses
#[allow(dead_code)]
#[derive(Default, Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq)]
pub enum DeviceAddr {
    AD0 = 0x76,
    #[default]
    AD1 = 0x77,
}

/// Acquisition settings persisted into ctrl_hum, ctrl_meas and config
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Bme280Config {
    pub address: u8,
    pub temperature: Oversampling,
    pub pressure: Oversampling,
    pub humidity: Oversampling,
    pub filter: Filter,
    pub mode: SamplingMode,
    pub standby: Standby,
}

impl Default for Bme280Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Bme280Config {
    pub fn new() -> Self {
        Self {
            address: DeviceAddr::default() as u8,
            temperature: Oversampling::default(),
            pressure: Oversampling::default(),
            humidity: Oversampling::default(),
            filter: Filter::default(),
            mode: SamplingMode::default(),
            standby: Standby::default(),
        }
    }

    pub fn with_address(mut self, address: DeviceAddr) -> Self {
        self.address = address as u8;
        self
    }

    /// Raw oversampling codes for temperature, pressure and humidity, invalid codes mean off
    pub fn with_oversampling(mut self, temperature: u8, pressure: u8, humidity: u8) -> Self {
        self.temperature = Oversampling::from_code(temperature);
        self.pressure = Oversampling::from_code(pressure);
        self.humidity = Oversampling::from_code(humidity);
        self
    }

    pub fn with_filter(mut self, code: u8) -> Self {
        self.filter = Filter::from_code(code);
        self
    }

    pub fn with_mode(mut self, mode: SamplingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_standby(mut self, standby: Standby) -> Self {
        self.standby = standby;
        self
    }

    /// Value for ctrl_hum
    pub fn ctrl_hum(&self) -> u8 {
        self.humidity.code()
    }

    /// Value for ctrl_meas: osrs_t[7:5] osrs_p[4:2] mode[1:0]
    pub fn ctrl_meas(&self) -> u8 {
        (self.temperature.code() << 5) | (self.pressure.code() << 2) | self.mode as u8
    }

    /// Value for config: t_sb[7:5] (normal mode only) filter[4:2]
    pub fn config(&self) -> u8 {
        let standby = match self.mode {
            SamplingMode::Normal => (self.standby as u8) << 5,
            _ => 0,
        };
        standby | (self.filter.code() << 2)
    }

    /// Upper bound in milliseconds for one forced measurement
    pub fn measurement_time_ms(&self) -> f32 {
        let term = |os: Oversampling| 2.3 * (1u32 << os.code()) as f32;
        1.25 + term(self.temperature)
            + term(self.pressure)
            + 0.575
            + term(self.humidity)
            + 0.575
    }
}
