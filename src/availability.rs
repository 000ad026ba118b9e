use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{Result, RosterError};

/// How willing a manager is to work a night. Ordered `No < IfNeedBe < Yes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Availability {
    #[serde(rename = "NO", alias = "")]
    No,
    #[serde(rename = "IFNEEDBE", alias = "(OK)")]
    IfNeedBe,
    #[serde(rename = "YES", alias = "OK")]
    Yes,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Availability::No => "NO",
            Availability::IfNeedBe => "IFNEEDBE",
            Availability::Yes => "YES",
        };
        f.write_str(name)
    }
}

/// One row of the poll: a manager and their answer for every night.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerAvailability {
    pub name: String,
    pub availability: Vec<Availability>,
}

/// Manager × night grid of availability levels.
///
/// Nights are kept in the order they were given, which the loader guarantees
/// to be chronological. Every manager has exactly one entry per night.
#[derive(Debug, Clone)]
pub struct AvailabilityMatrix {
    nights: Vec<String>,
    managers: Vec<ManagerAvailability>,
    manager_lookup: HashMap<String, usize>,
    night_lookup: HashMap<String, usize>,
}

impl AvailabilityMatrix {
    pub fn new(nights: Vec<String>, managers: Vec<ManagerAvailability>) -> Result<Self> {
        if nights.is_empty() || managers.is_empty() {
            return Err(RosterError::EmptyAvailability);
        }

        let mut night_lookup = HashMap::with_capacity(nights.len());
        for (n, night) in nights.iter().enumerate() {
            if night_lookup.insert(night.clone(), n).is_some() {
                return Err(RosterError::DuplicateNight(night.clone()));
            }
        }

        let mut manager_lookup = HashMap::with_capacity(managers.len());
        for (m, manager) in managers.iter().enumerate() {
            if manager.availability.len() != nights.len() {
                return Err(RosterError::RaggedAvailability {
                    manager: manager.name.clone(),
                    expected: nights.len(),
                    found: manager.availability.len(),
                });
            }
            if manager_lookup.insert(manager.name.clone(), m).is_some() {
                return Err(RosterError::DuplicateManager(manager.name.clone()));
            }
        }

        Ok(Self {
            nights,
            managers,
            manager_lookup,
            night_lookup,
        })
    }

    pub fn manager_count(&self) -> usize {
        self.managers.len()
    }

    pub fn night_count(&self) -> usize {
        self.nights.len()
    }

    pub fn manager_name(&self, manager: usize) -> &str {
        &self.managers[manager].name
    }

    pub fn night_label(&self, night: usize) -> &str {
        &self.nights[night]
    }

    pub fn manager_index(&self, name: &str) -> Result<usize> {
        self.manager_lookup
            .get(name)
            .copied()
            .ok_or_else(|| RosterError::UnknownManager(name.to_owned()))
    }

    pub fn night_index(&self, label: &str) -> Result<usize> {
        self.night_lookup
            .get(label)
            .copied()
            .ok_or_else(|| RosterError::UnknownNight(label.to_owned()))
    }

    pub fn level(&self, manager: usize, night: usize) -> Availability {
        self.managers[manager].availability[night]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Availability::*;

    fn row(name: &str, availability: Vec<Availability>) -> ManagerAvailability {
        ManagerAvailability {
            name: name.to_owned(),
            availability,
        }
    }

    fn nights(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn levels_are_ordered() {
        assert!(No < IfNeedBe);
        assert!(IfNeedBe < Yes);
        assert_eq!([Yes, No, IfNeedBe].iter().max(), Some(&Yes));
    }

    #[test]
    fn poll_markers_deserialize() {
        let parsed: Vec<Availability> =
            serde_yaml::from_str(r#"["", "(OK)", "OK", "NO", "IFNEEDBE", "YES"]"#).unwrap();
        assert_eq!(parsed, vec![No, IfNeedBe, Yes, No, IfNeedBe, Yes]);
    }

    #[test]
    fn lookups_follow_input_order() {
        let matrix = AvailabilityMatrix::new(
            nights(&["6/14", "6/15", "7/1"]),
            vec![row("Bob", vec![Yes, No, IfNeedBe]), row("Alice", vec![No, No, Yes])],
        )
        .unwrap();

        assert_eq!(matrix.manager_index("Bob").unwrap(), 0);
        assert_eq!(matrix.manager_index("Alice").unwrap(), 1);
        assert_eq!(matrix.night_index("7/1").unwrap(), 2);
        assert_eq!(matrix.level(0, 2), IfNeedBe);
        assert_eq!(matrix.night_label(1), "6/15");
    }

    #[test]
    fn unknown_names_are_rejected() {
        let matrix =
            AvailabilityMatrix::new(nights(&["6/14"]), vec![row("Bob", vec![Yes])]).unwrap();

        assert!(matches!(
            matrix.manager_index("Eve"),
            Err(RosterError::UnknownManager(name)) if name == "Eve"
        ));
        assert!(matches!(
            matrix.night_index("6/13"),
            Err(RosterError::UnknownNight(label)) if label == "6/13"
        ));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = AvailabilityMatrix::new(
            nights(&["6/14", "6/15"]),
            vec![row("Bob", vec![Yes, Yes]), row("Alice", vec![Yes])],
        )
        .unwrap_err();

        assert!(matches!(
            err,
            RosterError::RaggedAvailability { ref manager, expected: 2, found: 1 } if manager == "Alice"
        ));
    }

    #[test]
    fn duplicates_and_empty_input_are_rejected() {
        let err = AvailabilityMatrix::new(
            nights(&["6/14"]),
            vec![row("Bob", vec![Yes]), row("Bob", vec![No])],
        )
        .unwrap_err();
        assert!(matches!(err, RosterError::DuplicateManager(_)));

        let err = AvailabilityMatrix::new(nights(&["6/14", "6/14"]), vec![row("Bob", vec![Yes, Yes])])
            .unwrap_err();
        assert!(matches!(err, RosterError::DuplicateNight(_)));

        let err = AvailabilityMatrix::new(vec![], vec![]).unwrap_err();
        assert!(matches!(err, RosterError::EmptyAvailability));
    }
}
