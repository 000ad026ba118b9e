pub mod availability;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod report;
pub mod roster;
pub mod solver;

#[cfg(test)]
mod test_support;

pub use availability::{Availability, AvailabilityMatrix, ManagerAvailability};
pub use config::{ObjectiveStrategy, RosterFile, SolveConfig};
pub use error::{Result, RosterError};
pub use model::ShiftModel;
pub use report::{RawSchedule, Report};
pub use roster::Roster;
pub use solver::{CbcSolver, ShiftAssignment, ShiftSolver, SolveResult, SolveStatus};
