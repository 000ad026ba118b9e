use thiserror::Error;

use crate::solver::SolveStatus;

/// Everything that can go wrong before or after a solve.
///
/// An infeasible roster is not in here: that is a [`SolveStatus`].
#[derive(Error, Debug)]
pub enum RosterError {
    #[error("Unknown manager {0}")]
    UnknownManager(String),

    #[error("Unknown night {0}")]
    UnknownNight(String),

    #[error("Manager {0} is listed more than once")]
    DuplicateManager(String),

    #[error("Night {0} is listed more than once")]
    DuplicateNight(String),

    #[error("Manager {manager} has {found} availability entries, expected {expected}")]
    RaggedAvailability {
        manager: String,
        expected: usize,
        found: usize,
    },

    #[error("Availability needs at least one manager and one night")]
    EmptyAvailability,

    #[error("min_nights ({min}) is greater than max_nights ({max})")]
    InvalidBounds { min: u32, max: u32 },

    #[error("shifts_per_night must be at least 1")]
    ZeroShiftsPerNight,

    #[error("Manager {0} cannot be kept apart from themselves")]
    SelfPairing(String),

    #[error("Previous schedule has value {value} for {manager} on {night}, expected 0 or 1")]
    InvalidPreviousValue {
        manager: String,
        night: String,
        value: u8,
    },

    #[error("No schedule to report, solver status was {0}")]
    NoSolution(SolveStatus),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, RosterError>;
