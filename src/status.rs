//! Overall outcome of a run, shared by the provision, publish and load reports

use serde::{Deserialize, Serialize};

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every unit of work succeeded
    Succeeded,
    /// At least one unit failed; the rest were still attempted
    PartialFailure,
    /// Nothing was attempted (connection or setup failure)
    Aborted,
}

impl RunStatus {
    /// Derive the status from unit counts
    pub fn from_counts(failed: usize, fatal: bool) -> Self {
        if fatal {
            RunStatus::Aborted
        } else if failed > 0 {
            RunStatus::PartialFailure
        } else {
            RunStatus::Succeeded
        }
    }

    /// Process exit code: 0 success, 1 aborted, 2 partial failure
    pub fn exit_code(&self) -> i32 {
        match self {
            RunStatus::Succeeded => 0,
            RunStatus::Aborted => 1,
            RunStatus::PartialFailure => 2,
        }
    }

    /// The worse of two statuses, for multi-stage runs
    pub fn worst(self, other: RunStatus) -> RunStatus {
        fn rank(status: RunStatus) -> u8 {
            match status {
                RunStatus::Succeeded => 0,
                RunStatus::PartialFailure => 1,
                RunStatus::Aborted => 2,
            }
        }
        if rank(other) > rank(self) { other } else { self }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Succeeded => write!(f, "succeeded"),
            RunStatus::PartialFailure => write!(f, "partial failure"),
            RunStatus::Aborted => write!(f, "aborted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_counts() {
        assert_eq!(RunStatus::from_counts(0, false), RunStatus::Succeeded);
        assert_eq!(RunStatus::from_counts(3, false), RunStatus::PartialFailure);
        assert_eq!(RunStatus::from_counts(0, true), RunStatus::Aborted);
    }

    #[test]
    fn test_exit_codes_distinguish_partial_failure() {
        assert_eq!(RunStatus::Succeeded.exit_code(), 0);
        assert_eq!(RunStatus::Aborted.exit_code(), 1);
        assert_eq!(RunStatus::PartialFailure.exit_code(), 2);
    }

    #[test]
    fn test_worst() {
        assert_eq!(
            RunStatus::Succeeded.worst(RunStatus::PartialFailure),
            RunStatus::PartialFailure
        );
        assert_eq!(
            RunStatus::Aborted.worst(RunStatus::PartialFailure),
            RunStatus::Aborted
        );
    }
}
