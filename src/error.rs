use thiserror::Error;

pub type Result<T> = core::result::Result<T, SensorError>;

/// Broad classification of a [`SensorError`]
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq)]
pub enum ErrorKind {
    /// The bus rejected or timed out a transaction
    Transport,
    /// The device answered with an unexpected chip id
    IdentityMismatch,
    /// A configuration value outside the accepted set
    InvalidArgument,
    /// The device is in a state the operation can't work from
    IndeterminateState,
}

#[derive(Error, Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq)]
pub enum SensorError {
    #[error("Write I2C Error on register {register:#06x}")]
    WriteI2CError { register: u16 },
    #[error("Write Read I2C Error on register {register:#06x}")]
    WriteReadI2CError { register: u16 },
    #[error("Chip id is {found:#x}, expected {expected:#x}")]
    IdentityMismatch { expected: u16, found: u16 },
    #[error("Unsupported distance mode {0}")]
    InvalidDistanceMode(u8),
    #[error("Timing budget of {budget_ms}ms is not available in distance mode {mode}")]
    InvalidTimingBudget { mode: u8, budget_ms: u16 },
    #[error("Distance mode register holds unknown value {0:#x}")]
    IndeterminateDistanceMode(u8),
}

impl SensorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SensorError::WriteI2CError { .. } | SensorError::WriteReadI2CError { .. } => {
                ErrorKind::Transport
            }
            SensorError::IdentityMismatch { .. } => ErrorKind::IdentityMismatch,
            SensorError::InvalidDistanceMode(_) | SensorError::InvalidTimingBudget { .. } => {
                ErrorKind::InvalidArgument
            }
            SensorError::IndeterminateDistanceMode(_) => ErrorKind::IndeterminateState,
        }
    }

    pub fn is_transport(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SensorError::WriteI2CError { register: 0xF4 }, ErrorKind::Transport)]
    #[case(SensorError::WriteReadI2CError { register: 0x0089 }, ErrorKind::Transport)]
    #[case(SensorError::IdentityMismatch { expected: 0x60, found: 0x58 }, ErrorKind::IdentityMismatch)]
    #[case(SensorError::InvalidDistanceMode(3), ErrorKind::InvalidArgument)]
    #[case(SensorError::InvalidTimingBudget { mode: 2, budget_ms: 15 }, ErrorKind::InvalidArgument)]
    #[case(SensorError::IndeterminateDistanceMode(0x33), ErrorKind::IndeterminateState)]
    fn error_kinds(#[case] error: SensorError, #[case] kind: ErrorKind) {
        assert_eq!(error.kind(), kind);
        assert_eq!(error.is_transport(), kind == ErrorKind::Transport);
    }

    #[test]
    fn messages() {
        assert_eq!(
            SensorError::IdentityMismatch { expected: 0x60, found: 0x58 }.to_string(),
            "Chip id is 0x58, expected 0x60"
        );
        assert_eq!(
            SensorError::WriteReadI2CError { register: 0x010F }.to_string(),
            "Write Read I2C Error on register 0x010f"
        );
    }
}
