use crate::error::SensorError;

pub const RESET: u16 = 0x0000;
pub const I2C_ADDRESS: u16 = 0x0001;
pub const VHV_TIMEOUT_MACROP_LOOP_BOUND: u16 = 0x0008;
pub const VHV_CONFIG_INIT: u16 = 0x000B;
pub const DEFAULT_CONFIGURATION_START: u16 = 0x002D;
pub const GPIO_HV_MUX_CTRL: u16 = 0x0030;
pub const GPIO_TIO_HV_STATUS: u16 = 0x0031;
pub const PHASECAL_TIMEOUT_MACROP: u16 = 0x004B;
pub const RANGE_TIMEOUT_MACROP_A: u16 = 0x005E;
pub const RANGE_VCSEL_PERIOD_A: u16 = 0x0060;
pub const RANGE_TIMEOUT_MACROP_B: u16 = 0x0061;
pub const RANGE_VCSEL_PERIOD_B: u16 = 0x0063;
pub const RANGE_VALID_PHASE_HIGH: u16 = 0x0069;
pub const SD_WOI_SD0: u16 = 0x0078;
pub const SD_INITIAL_PHASE_SD0: u16 = 0x007A;
pub const SYSTEM_INTERRUPT_CLEAR: u16 = 0x0086;
pub const SYSTEM_MODE_START: u16 = 0x0087;
pub const RESULT_RANGE_STATUS: u16 = 0x0089;
pub const FIRMWARE_SYSTEM_STATUS: u16 = 0x00E5;
pub const MODEL_ID: u16 = 0x010F;

/// Written from 0x2D up to 0x87 during initialization, ranging left stopped
pub const DEFAULT_CONFIGURATION: [u8; 91] = [
    0x00, // 0x2d fast plus mode off
    0x00, // 0x2e i2c pulled up at 1.8V
    0x00, // 0x2f gpio pulled up at 1.8V
    0x01, // 0x30 GPIO_HV_MUX_CTRL, bit 4 clear: active high interrupt
    0x02, // 0x31 GPIO_TIO_HV_STATUS
    0x00, 0x02, 0x08, 0x00, 0x08, 0x10, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0xff, 0x00, 0x0f,
    0x00, 0x00, 0x00, 0x00, 0x00, // 0x32..0x45
    0x20, // 0x46 interrupt on new sample ready
    0x0b, 0x00, 0x00, 0x02, // 0x47..0x4a
    0x0a, // 0x4b PHASECAL_TIMEOUT_MACROP
    0x21, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00, 0x00, 0xc8, 0x00, 0x00, 0x38, 0xff, 0x01, 0x00,
    0x08, 0x00, 0x00, // 0x4c..0x5d
    0x01, 0xcc, // 0x5e TIMEOUT_MACROP_A
    0x0f, // 0x60 VCSEL_PERIOD_A
    0x01, 0xf1, // 0x61 TIMEOUT_MACROP_B
    0x0d, // 0x63 VCSEL_PERIOD_B
    0x01, 0x68, // 0x64 sigma threshold, 90 mm in 14.2
    0x00, 0x80, // 0x66 min count rate in 9.7
    0x08, 0xb8, 0x00, 0x00, // 0x68..0x6b
    0x00, 0x00, 0x0f, 0x89, // 0x6c intermeasurement period
    0x00, 0x00, // 0x70..0x71
    0x00, 0x00, // 0x72 distance threshold high
    0x00, 0x00, // 0x74 distance threshold low
    0x00, 0x01, 0x0f, 0x0d, 0x0e, 0x0e, 0x00, 0x00, 0x02, // 0x76..0x7e
    0xc7, // 0x7f ROI center
    0xff, // 0x80 ROI size
    0x9b, 0x00, 0x00, 0x00, 0x01, // 0x81..0x85
    0x01, // 0x86 clear interrupt
    0x00, // 0x87 ranging stopped
];

/// Ranging regime, value matches the conventional 1 = short, 2 = long numbering
#[derive(Default, Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq)]
pub enum DistanceMode {
    Short = 1,
    #[default]
    Long = 2,
}

impl TryFrom<u8> for DistanceMode {
    type Error = SensorError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(DistanceMode::Short),
            2 => Ok(DistanceMode::Long),
            other => Err(SensorError::InvalidDistanceMode(other)),
        }
    }
}

/// Register values that put the device into one distance mode
pub(crate) struct ModeSettings {
    pub phasecal_timeout: u8,
    pub vcsel_period_a: u8,
    pub vcsel_period_b: u8,
    pub valid_phase_high: u8,
    pub woi_sd0: u16,
    pub initial_phase_sd0: u16,
}

impl DistanceMode {
    /// Decodes PHASECAL_TIMEOUT_MACROP, None when it holds neither mode's value
    pub fn from_phasecal_timeout(value: u8) -> Option<Self> {
        match value {
            0x14 => Some(DistanceMode::Short),
            0x0A => Some(DistanceMode::Long),
            _ => None,
        }
    }

    pub(crate) fn settings(self) -> ModeSettings {
        match self {
            DistanceMode::Short => ModeSettings {
                phasecal_timeout: 0x14,
                vcsel_period_a: 0x07,
                vcsel_period_b: 0x05,
                valid_phase_high: 0x38,
                woi_sd0: 0x0705,
                initial_phase_sd0: 0x0606,
            },
            DistanceMode::Long => ModeSettings {
                phasecal_timeout: 0x0A,
                vcsel_period_a: 0x0F,
                vcsel_period_b: 0x0D,
                valid_phase_high: 0xB8,
                woi_sd0: 0x0F0D,
                initial_phase_sd0: 0x0E0E,
            },
        }
    }

    /// Timing budgets in ms with their (MACROP_A, MACROP_B) timeouts
    pub fn timing_budgets(self) -> &'static [(u16, (u16, u16))] {
        match self {
            DistanceMode::Short => &SHORT_TIMING_BUDGETS,
            DistanceMode::Long => &LONG_TIMING_BUDGETS,
        }
    }

    pub fn macro_periods(self, budget_ms: u16) -> Option<(u16, u16)> {
        self.timing_budgets()
            .iter()
            .find(|(ms, _)| *ms == budget_ms)
            .map(|(_, periods)| *periods)
    }
}

const SHORT_TIMING_BUDGETS: [(u16, (u16, u16)); 7] = [
    (15, (0x001D, 0x0027)),
    (20, (0x0051, 0x006E)),
    (33, (0x00D6, 0x006E)),
    (50, (0x01AE, 0x01E8)),
    (100, (0x02E1, 0x0388)),
    (200, (0x03E1, 0x0496)),
    (500, (0x0591, 0x05C1)),
];

const LONG_TIMING_BUDGETS: [(u16, (u16, u16)); 6] = [
    (20, (0x001E, 0x0022)),
    (33, (0x0060, 0x006E)),
    (50, (0x00AD, 0x00C6)),
    (100, (0x01CC, 0x01EA)),
    (200, (0x02D9, 0x02F8)),
    (500, (0x048F, 0x04A4)),
];
