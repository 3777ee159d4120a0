use std::fmt;
use std::process::ExitCode;

use serde::{Deserialize, Serialize};

/// Outcome of a pipeline stage, ordered from best to worst.
///
/// `LowFailure` means the job degraded but a usable mesh can still be saved;
/// `StrongFailure` means nothing else may be attempted, saving included.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ResultStatus {
    #[default]
    Success,
    LowFailure,
    StrongFailure,
}

impl ResultStatus {
    /// Combine two outcomes, keeping the worse one.
    pub fn worst(self, other: ResultStatus) -> ResultStatus {
        self.max(other)
    }

    /// Whether a save may still be attempted after this outcome.
    pub fn allows_save(self) -> bool {
        self < ResultStatus::StrongFailure
    }

    pub fn exit_code(self) -> u8 {
        match self {
            ResultStatus::Success => 0,
            ResultStatus::LowFailure => 1,
            ResultStatus::StrongFailure => 2,
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultStatus::Success => write!(f, "SUCCESS"),
            ResultStatus::LowFailure => write!(f, "LOW_FAILURE"),
            ResultStatus::StrongFailure => write!(f, "STRONG_FAILURE"),
        }
    }
}

impl From<ResultStatus> for ExitCode {
    fn from(status: ResultStatus) -> Self {
        ExitCode::from(status.exit_code())
    }
}
