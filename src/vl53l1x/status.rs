use crate::merge_bytes;
use std::fmt;

/// Bytes read from RESULT__RANGE_STATUS onwards
pub const RESULT_BLOCK_LEN: usize = 17;

/// What the device reported about a ranging attempt
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum RangeReason {
    Ok,
    HardwareFail,
    MinRangeFail,
    SynchronizationInt,
    OutOfBoundsFail,
    SignalFail,
    WrapTargetFail,
    XtalkSignalFail,
    RangeValidMinRangeClipped,
    /// Valid range on the first sample after start, the wraparound check can't run yet
    RangeValidNoWrapCheckFail,
    /// The bus failed while fetching the result
    TransportError,
    /// A status code outside the documented set
    Unrecognised(u8),
}

impl fmt::Display for RangeReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RangeReason::Ok => write!(f, "OK"),
            RangeReason::Unrecognised(code) => write!(f, "Unrecognised({})", code),
            other => write!(f, "{:?}", other),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct RangeStatus {
    pub ok: bool,
    pub reason: RangeReason,
}

impl RangeStatus {
    /// Classifies RESULT__RANGE_STATUS. Status 9 stays `ok` even on the first
    /// sample of a stream, where the reason flags the skipped wrap check.
    pub fn decode(range_status: u8, stream_count: u8) -> Self {
        let reason = match range_status {
            17 | 2 | 1 | 3 => RangeReason::HardwareFail,
            13 => RangeReason::MinRangeFail,
            18 => RangeReason::SynchronizationInt,
            5 => RangeReason::OutOfBoundsFail,
            4 | 6 => RangeReason::SignalFail,
            7 => RangeReason::WrapTargetFail,
            12 => RangeReason::XtalkSignalFail,
            8 => RangeReason::RangeValidMinRangeClipped,
            9 if stream_count == 0 => RangeReason::RangeValidNoWrapCheckFail,
            9 => RangeReason::Ok,
            other => RangeReason::Unrecognised(other),
        };

        Self {
            ok: range_status == 9,
            reason,
        }
    }

    pub(crate) fn transport_error() -> Self {
        Self {
            ok: false,
            reason: RangeReason::TransportError,
        }
    }
}

/// The result block, multi-byte fields are big-endian
#[derive(Default, Copy, Clone, Debug, Eq, PartialEq)]
pub struct RangeData {
    pub range_status: u8,
    pub report_status: u8,
    pub stream_count: u8,
    pub dss_actual_effective_spads: u16,
    pub peak_signal_count_rate: u16,
    pub ambient_count_rate: u16,
    pub sigma: u16,
    pub phase: u16,
    pub range_mm: u16,
    pub corrected_signal_count_rate: u16,
}

impl RangeData {
    pub fn from_registers(data: [u8; RESULT_BLOCK_LEN]) -> Self {
        let word = |at: usize| merge_bytes(data[at], data[at + 1]);

        Self {
            range_status: data[0],
            report_status: data[1],
            stream_count: data[2],
            dss_actual_effective_spads: word(3),
            peak_signal_count_rate: word(5),
            ambient_count_rate: word(7),
            sigma: word(9),
            phase: word(11),
            range_mm: word(13),
            corrected_signal_count_rate: word(15),
        }
    }

    pub fn status(&self) -> RangeStatus {
        RangeStatus::decode(self.range_status, self.stream_count)
    }
}
