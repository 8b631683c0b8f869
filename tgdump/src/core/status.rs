//! Session state enum.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The lifecycle state of a dump session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum SessionState {
    /// Targets are being registered.
    Preparing = 0,
    /// The transaction is being created.
    Starting = 1,
    /// The transaction is active and targets may be executed.
    Running = 2,
    /// The transaction is being committed.
    Committing = 3,
    /// The transaction was committed.
    Committed = 4,
    /// Starting or committing the transaction failed.
    Failed = 5,
    /// The session released its resources.
    Closed = 6,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Preparing
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preparing => write!(f, "PREPARING"),
            Self::Starting => write!(f, "STARTING"),
            Self::Running => write!(f, "RUNNING"),
            Self::Committing => write!(f, "COMMITTING"),
            Self::Committed => write!(f, "COMMITTED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Closed => write!(f, "CLOSED"),
        }
    }
}

impl SessionState {
    /// Returns the raw representation used for atomic storage.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Restores a state from its raw representation.
    ///
    /// Out-of-range values map to `Closed`.
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Preparing,
            1 => Self::Starting,
            2 => Self::Running,
            3 => Self::Committing,
            4 => Self::Committed,
            5 => Self::Failed,
            _ => Self::Closed,
        }
    }

    /// Returns true if no further transition except `close` is possible.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Committed | Self::Failed | Self::Closed)
    }
}
