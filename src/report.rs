use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::availability::{Availability, AvailabilityMatrix};
use crate::error::{Result, RosterError};
use crate::solver::{SolveResult, SolveStatus};

/// manager → night → 0|1, the shape a later run accepts as its previous schedule.
pub type RawSchedule = BTreeMap<String, BTreeMap<String, u8>>;

/// A manager on a night, or a night for a manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub name: String,
    /// The manager only said "if need be" for this night.
    pub if_need_be: bool,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.if_need_be {
            write!(f, "{}(!)", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NightShifts {
    pub night: String,
    pub managers: Vec<Slot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagerShifts {
    pub manager: String,
    pub nights: Vec<Slot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub status: SolveStatus,
    pub by_night: Vec<NightShifts>,
    pub by_manager: Vec<ManagerShifts>,
    pub raw: RawSchedule,
}

impl Report {
    /// Fails with [`RosterError::NoSolution`] unless the solve found a schedule.
    pub fn new(result: &SolveResult, matrix: &AvailabilityMatrix) -> Result<Self> {
        let Some(assignment) = result.assignment() else {
            return Err(RosterError::NoSolution(result.status()));
        };
        let flagged = |m: usize, n: usize| matrix.level(m, n) == Availability::IfNeedBe;

        let by_night = (0..matrix.night_count())
            .map(|n| NightShifts {
                night: matrix.night_label(n).to_owned(),
                managers: assignment
                    .managers_on(n)
                    .map(|m| Slot {
                        name: matrix.manager_name(m).to_owned(),
                        if_need_be: flagged(m, n),
                    })
                    .collect(),
            })
            .collect();

        let by_manager = (0..matrix.manager_count())
            .map(|m| ManagerShifts {
                manager: matrix.manager_name(m).to_owned(),
                nights: assignment
                    .nights_of(m)
                    .map(|n| Slot {
                        name: matrix.night_label(n).to_owned(),
                        if_need_be: flagged(m, n),
                    })
                    .collect(),
            })
            .collect();

        let raw = (0..matrix.manager_count())
            .map(|m| {
                let nights = (0..matrix.night_count())
                    .map(|n| (matrix.night_label(n).to_owned(), assignment.works(m, n) as u8))
                    .collect();
                (matrix.manager_name(m).to_owned(), nights)
            })
            .collect();

        Ok(Self {
            status: result.status(),
            by_night,
            by_manager,
            raw,
        })
    }

    pub fn raw_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.raw)?)
    }
}

fn join(slots: &[Slot], separator: &str) -> String {
    slots
        .iter()
        .map(Slot::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Managers for each night:")?;
        for night in &self.by_night {
            writeln!(f, "{}: {}", night.night, join(&night.managers, " and "))?;
        }

        writeln!(f)?;
        writeln!(f, "Nights for each manager:")?;
        for manager in &self.by_manager {
            writeln!(f, "{}: {}", manager.manager, join(&manager.nights, ", "))?;
        }
        Ok(())
    }
}
