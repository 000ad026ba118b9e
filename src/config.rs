use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::read_to_string;
use std::path::Path;

use crate::availability::{Availability, AvailabilityMatrix, ManagerAvailability};
use crate::error::{Result, RosterError};
use crate::report::RawSchedule;
use crate::roster::Roster;

/// How the two objective stages are handed to the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveStrategy {
    /// Solve once per stage; the second stage keeps the first stage's optimum.
    #[default]
    Lexicographic,
    /// Single solve where one IFNEEDBE assignment outweighs all agreement.
    Weighted,
}

/// Tunables for one solve. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolveConfig {
    /// Managers on call every night, exactly.
    pub shifts_per_night: u32,
    pub min_nights: u32,
    pub max_nights: u32,
    /// Nights that must pass between two shifts of the same manager.
    pub min_gap: u32,
    /// Anything below this level is treated as unavailable.
    pub availability_level: Availability,
    pub objective: ObjectiveStrategy,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            shifts_per_night: 2,
            min_nights: 1,
            max_nights: 2,
            min_gap: 2,
            availability_level: Availability::Yes,
            objective: ObjectiveStrategy::Lexicographic,
        }
    }
}

impl SolveConfig {
    pub fn validate(&self) -> Result<()> {
        if self.shifts_per_night == 0 {
            return Err(RosterError::ZeroShiftsPerNight);
        }
        if self.min_nights > self.max_nights {
            return Err(RosterError::InvalidBounds {
                min: self.min_nights,
                max: self.max_nights,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(night) => vec![night],
            OneOrMany::Many(nights) => nights,
        }
    }
}

/// The YAML input document: availability, configuration and side constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RosterFile {
    pub nights: Vec<String>,
    pub managers: Vec<ManagerAvailability>,
    #[serde(default)]
    pub config: SolveConfig,
    #[serde(default)]
    pub together: Vec<(String, String)>,
    #[serde(default)]
    pub apart: Vec<(String, String)>,
    #[serde(default)]
    pub pin: BTreeMap<String, OneOrMany>,
    #[serde(default)]
    pub prev: Option<RawSchedule>,
}

impl RosterFile {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let buf = read_to_string(path)?;
        Self::from_yaml_str(&buf)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load the matrix and register every side constraint, failing on the
    /// first bad reference.
    pub fn into_roster(self) -> Result<(Roster, SolveConfig)> {
        self.config.validate()?;

        let matrix = AvailabilityMatrix::new(self.nights, self.managers)?;
        let mut roster = Roster::new(matrix);

        for (a, b) in &self.together {
            roster.keep_together(a, b)?;
        }
        for (a, b) in &self.apart {
            roster.keep_apart(a, b)?;
        }
        for (manager, nights) in self.pin {
            for night in nights.into_vec() {
                roster.pin(&manager, &night)?;
            }
        }
        roster.set_previous(self.prev.as_ref())?;

        Ok((roster, self.config))
    }
}
