use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::availability::AvailabilityMatrix;
use crate::config::SolveConfig;
use crate::error::{Result, RosterError};
use crate::model::ShiftModel;
use crate::report::RawSchedule;
use crate::solver::{SolveResult, ShiftSolver};

/// Availability plus the side constraints registered against it.
///
/// Every registration checks its names right away, so a bad reference fails
/// the call that made it rather than the solve.
#[derive(Debug, Clone)]
pub struct Roster {
    matrix: AvailabilityMatrix,
    together: Vec<(usize, usize)>,
    apart: Vec<(usize, usize)>,
    pins: BTreeMap<usize, BTreeSet<usize>>,
    previous: Option<Vec<Vec<bool>>>,
}

impl Roster {
    pub fn new(matrix: AvailabilityMatrix) -> Self {
        Self {
            matrix,
            together: Vec::new(),
            apart: Vec::new(),
            pins: BTreeMap::new(),
            previous: None,
        }
    }

    pub fn matrix(&self) -> &AvailabilityMatrix {
        &self.matrix
    }

    pub fn together(&self) -> &[(usize, usize)] {
        &self.together
    }

    pub fn apart(&self) -> &[(usize, usize)] {
        &self.apart
    }

    /// Pinned nights per manager, night indices in calendar order.
    pub fn pins(&self) -> &BTreeMap<usize, BTreeSet<usize>> {
        &self.pins
    }

    pub fn previous(&self) -> Option<&[Vec<bool>]> {
        self.previous.as_deref()
    }

    /// The two managers are always on or off together.
    pub fn keep_together(&mut self, m1: &str, m2: &str) -> Result<()> {
        let pair = (self.matrix.manager_index(m1)?, self.matrix.manager_index(m2)?);
        self.together.push(pair);
        Ok(())
    }

    /// The two managers never share a night.
    pub fn keep_apart(&mut self, m1: &str, m2: &str) -> Result<()> {
        let pair = (self.matrix.manager_index(m1)?, self.matrix.manager_index(m2)?);
        if pair.0 == pair.1 {
            return Err(RosterError::SelfPairing(m1.to_owned()));
        }
        self.apart.push(pair);
        Ok(())
    }

    /// Force a manager onto a night. Repeatable per manager.
    pub fn pin(&mut self, manager: &str, night: &str) -> Result<()> {
        let m = self.matrix.manager_index(manager)?;
        let n = self.matrix.night_index(night)?;
        self.pins.entry(m).or_default().insert(n);
        Ok(())
    }

    /// Bias the next solve towards `previous`. Missing cells count as 0.
    pub fn set_previous(&mut self, previous: Option<&RawSchedule>) -> Result<()> {
        let Some(previous) = previous else {
            self.previous = None;
            return Ok(());
        };

        let mut grid = vec![vec![false; self.matrix.night_count()]; self.matrix.manager_count()];
        for (manager, nights) in previous {
            let m = self.matrix.manager_index(manager)?;
            for (night, &value) in nights {
                let n = self.matrix.night_index(night)?;
                grid[m][n] = match value {
                    0 => false,
                    1 => true,
                    _ => {
                        return Err(RosterError::InvalidPreviousValue {
                            manager: manager.clone(),
                            night: night.clone(),
                            value,
                        });
                    }
                };
            }
        }

        self.previous = Some(grid);
        Ok(())
    }

    pub fn build_model(&self, config: &SolveConfig) -> Result<ShiftModel> {
        config.validate()?;
        Ok(ShiftModel::build(self, config))
    }

    /// Build a fresh model and hand it to `solver`.
    pub fn solve(&self, config: &SolveConfig, solver: &impl ShiftSolver) -> Result<SolveResult> {
        let model = self.build_model(config)?;
        debug!(
            variables = model.manager_count() * model.night_count(),
            constraints = model.constraints().len(),
            "built shift model"
        );
        Ok(solver.solve(&model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::{Availability, ManagerAvailability};

    fn roster() -> Roster {
        let managers = ["Alice", "Bob", "Carol"]
            .into_iter()
            .map(|name| ManagerAvailability {
                name: name.to_owned(),
                availability: vec![Availability::Yes; 3],
            })
            .collect();
        let nights = vec!["6/14".to_owned(), "6/15".to_owned(), "6/16".to_owned()];
        Roster::new(AvailabilityMatrix::new(nights, managers).unwrap())
    }

    #[test]
    fn registrations_store_indices() {
        let mut roster = roster();
        roster.keep_together("Alice", "Carol").unwrap();
        roster.keep_apart("Bob", "Carol").unwrap();
        roster.pin("Bob", "6/16").unwrap();
        roster.pin("Bob", "6/14").unwrap();

        assert_eq!(roster.together(), &[(0, 2)]);
        assert_eq!(roster.apart(), &[(1, 2)]);
        let bob_pins: Vec<_> = roster.pins()[&1].iter().copied().collect();
        assert_eq!(bob_pins, vec![0, 2]);
    }

    #[test]
    fn unknown_references_fail_the_registration() {
        let mut roster = roster();
        assert!(matches!(
            roster.keep_together("Alice", "Dave"),
            Err(RosterError::UnknownManager(name)) if name == "Dave"
        ));
        assert!(matches!(
            roster.keep_apart("Eve", "Alice"),
            Err(RosterError::UnknownManager(name)) if name == "Eve"
        ));
        assert!(matches!(
            roster.pin("Alice", "6/17"),
            Err(RosterError::UnknownNight(night)) if night == "6/17"
        ));
        assert!(roster.together().is_empty());
        assert!(roster.apart().is_empty());
        assert!(roster.pins().is_empty());
    }

    #[test]
    fn apart_from_self_is_rejected() {
        let mut roster = roster();
        assert!(matches!(
            roster.keep_apart("Bob", "Bob"),
            Err(RosterError::SelfPairing(_))
        ));
    }

    #[test]
    fn previous_schedule_is_validated() {
        let mut roster = roster();

        let mut prev = RawSchedule::new();
        prev.entry("Carol".to_owned())
            .or_default()
            .insert("6/15".to_owned(), 1);
        roster.set_previous(Some(&prev)).unwrap();
        let grid = roster.previous().unwrap();
        assert!(grid[2][1]);
        assert_eq!(grid.iter().flatten().filter(|&&v| v).count(), 1);

        prev.entry("Alice".to_owned())
            .or_default()
            .insert("6/14".to_owned(), 2);
        assert!(matches!(
            roster.set_previous(Some(&prev)),
            Err(RosterError::InvalidPreviousValue { value: 2, .. })
        ));

        let mut unknown = RawSchedule::new();
        unknown
            .entry("Zed".to_owned())
            .or_default()
            .insert("6/14".to_owned(), 1);
        assert!(roster.set_previous(Some(&unknown)).is_err());

        roster.set_previous(None).unwrap();
        assert!(roster.previous().is_none());
    }
}
