//! Translation of a [`Roster`] and a [`SolveConfig`] into a linear model over
//! one boolean per (manager, night) cell.
//!
//! The model is solver-agnostic: constraints and objectives are plain integer
//! linear expressions over [`Cell`]s, and a [`ShiftSolver`](crate::solver::ShiftSolver)
//! turns them into whatever its backend understands. A new model is built for
//! every solve, so no variable identity outlives one call.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use tracing::debug;

use crate::availability::{Availability, AvailabilityMatrix};
use crate::config::{ObjectiveStrategy, SolveConfig};
use crate::roster::Roster;
use crate::solver::ShiftAssignment;

/// The decision "manager works night".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub manager: usize,
    pub night: usize,
}

impl Cell {
    pub fn new(manager: usize, night: usize) -> Self {
        Self { manager, night }
    }
}

/// `constant + Σ coefficient · cell`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearExpr {
    terms: Vec<(Cell, i64)>,
    constant: i64,
}

impl LinearExpr {
    pub fn sum(cells: impl IntoIterator<Item = Cell>) -> Self {
        Self {
            terms: cells.into_iter().map(|cell| (cell, 1)).collect(),
            constant: 0,
        }
    }

    pub fn term(mut self, cell: Cell, coefficient: i64) -> Self {
        self.terms.push((cell, coefficient));
        self
    }

    pub fn plus_constant(mut self, constant: i64) -> Self {
        self.constant += constant;
        self
    }

    pub fn plus(mut self, other: LinearExpr) -> Self {
        self.terms.extend(other.terms);
        self.constant += other.constant;
        self
    }

    pub fn scale(mut self, factor: i64) -> Self {
        self.terms.iter_mut().for_each(|(_, c)| *c *= factor);
        self.constant *= factor;
        self
    }

    pub fn terms(&self) -> &[(Cell, i64)] {
        &self.terms
    }

    pub fn constant(&self) -> i64 {
        self.constant
    }

    pub fn evaluate(&self, assignment: &ShiftAssignment) -> i64 {
        self.terms
            .iter()
            .filter(|(cell, _)| assignment.works(cell.manager, cell.night))
            .fold(self.constant, |sum, (_, coefficient)| sum + coefficient)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Eq,
    Le,
    Ge,
}

/// Which rule a constraint comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConstraintKind {
    Coverage,
    Workload,
    Availability,
    Together,
    Apart,
    Pin,
    MinGap,
    ObjectiveBound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearConstraint {
    pub kind: ConstraintKind,
    pub expr: LinearExpr,
    pub relation: Relation,
    pub rhs: i64,
}

impl LinearConstraint {
    pub fn new(kind: ConstraintKind, expr: LinearExpr, relation: Relation, rhs: i64) -> Self {
        Self {
            kind,
            expr,
            relation,
            rhs,
        }
    }

    pub fn is_satisfied(&self, assignment: &ShiftAssignment) -> bool {
        let lhs = self.expr.evaluate(assignment);
        match self.relation {
            Relation::Eq => lhs == self.rhs,
            Relation::Le => lhs <= self.rhs,
            Relation::Ge => lhs >= self.rhs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimise,
    Maximise,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectiveStage {
    pub sense: Sense,
    pub expr: LinearExpr,
}

/// Objectives in priority order: a later stage only breaks ties among
/// solutions that are optimal for every earlier one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexObjective {
    stages: Vec<ObjectiveStage>,
}

impl LexObjective {
    pub fn new(primary: ObjectiveStage) -> Self {
        Self {
            stages: vec![primary],
        }
    }

    pub fn then(mut self, stage: ObjectiveStage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stages(&self) -> &[ObjectiveStage] {
        &self.stages
    }

    /// Collapse every stage into one minimisation. `weight` must exceed the
    /// value range of everything after the first stage for the collapse to
    /// keep the lexicographic order.
    pub fn weighted(&self, weight: i64) -> ObjectiveStage {
        let expr = self
            .stages
            .iter()
            .fold(LinearExpr::default(), |acc, stage| {
                let signed = match stage.sense {
                    Sense::Minimise => stage.expr.clone(),
                    Sense::Maximise => stage.expr.clone().scale(-1),
                };
                acc.scale(weight).plus(signed)
            });

        ObjectiveStage {
            sense: Sense::Minimise,
            expr,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShiftModel {
    managers: usize,
    nights: usize,
    constraints: Vec<LinearConstraint>,
    objective: LexObjective,
    strategy: ObjectiveStrategy,
    gap_exempt: BTreeSet<usize>,
}

impl ShiftModel {
    pub(crate) fn build(roster: &Roster, config: &SolveConfig) -> Self {
        let matrix = roster.matrix();
        let gap = config.min_gap as usize;

        // Pins beat the gap rule, so find who has clashing pins first
        let gap_exempt = gap_exemptions(roster.pins(), gap);
        if !gap_exempt.is_empty() {
            debug!(exempt = ?gap_exempt, "gap rule lifted");
        }

        let objective = create_objective(matrix, roster.previous());
        let model = Self {
            managers: matrix.manager_count(),
            nights: matrix.night_count(),
            constraints: Vec::new(),
            objective,
            strategy: config.objective,
            gap_exempt,
        };

        let model = constrain_coverage(model, config.shifts_per_night);
        let model = constrain_workload(model, config.min_nights, config.max_nights);
        let model = constrain_availability(model, matrix, config.availability_level);
        let model = constrain_pairings(model, roster.together(), roster.apart());
        let model = constrain_pins(model, roster.pins());
        constrain_min_gap(model, gap)
    }

    pub fn with(mut self, constraint: LinearConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn manager_count(&self) -> usize {
        self.managers
    }

    pub fn night_count(&self) -> usize {
        self.nights
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LexObjective {
        &self.objective
    }

    pub fn strategy(&self) -> ObjectiveStrategy {
        self.strategy
    }

    /// Managers whose pins are too close for the gap rule; they get no gap
    /// constraints at all.
    pub fn gap_exempt(&self) -> &BTreeSet<usize> {
        &self.gap_exempt
    }

    /// Weight that makes one unit of the first stage outweigh any possible
    /// change in the later stages.
    pub fn dominating_weight(&self) -> i64 {
        (self.managers * self.nights) as i64 + 1
    }

    pub fn is_satisfied_by(&self, assignment: &ShiftAssignment) -> bool {
        self.constraints.iter().all(|c| c.is_satisfied(assignment))
    }

    fn cells_of_night(&self, night: usize) -> impl Iterator<Item = Cell> + use<> {
        (0..self.managers).map(move |m| Cell::new(m, night))
    }

    fn cells_of_manager(&self, manager: usize) -> impl Iterator<Item = Cell> + use<> {
        (0..self.nights).map(move |n| Cell::new(manager, n))
    }
}

/// Managers with two pinned nights at most `gap` nights apart.
pub fn gap_exemptions(pins: &BTreeMap<usize, BTreeSet<usize>>, gap: usize) -> BTreeSet<usize> {
    pins.iter()
        .filter(|(_, nights)| {
            nights
                .iter()
                .zip(nights.iter().skip(1))
                .any(|(earlier, later)| later - earlier <= gap)
        })
        .map(|(&manager, _)| manager)
        .collect()
}

/// Runs of `gap + 1` consecutive nights, clipped to the available nights.
pub fn gap_windows(nights: usize, gap: usize) -> Vec<Range<usize>> {
    if gap == 0 || nights < 2 {
        return Vec::new();
    }
    let width = gap + 1;
    if nights <= width {
        return vec![0..nights];
    }
    (0..=nights - width).map(|start| start..start + width).collect()
}

/// Primary: fewest IFNEEDBE shifts. Secondary: most cells matching `previous`.
fn create_objective(matrix: &AvailabilityMatrix, previous: Option<&[Vec<bool>]>) -> LexObjective {
    let if_need_be = (0..matrix.manager_count())
        .flat_map(|m| (0..matrix.night_count()).map(move |n| Cell::new(m, n)))
        .filter(|cell| matrix.level(cell.manager, cell.night) == Availability::IfNeedBe);

    let objective = LexObjective::new(ObjectiveStage {
        sense: Sense::Minimise,
        expr: LinearExpr::sum(if_need_be),
    });

    match previous {
        Some(previous) => objective.then(ObjectiveStage {
            sense: Sense::Maximise,
            expr: agreement(previous),
        }),
        None => objective,
    }
}

/// Number of cells equal to `previous`: `x` where it was 1, `1 - x` where it was 0.
fn agreement(previous: &[Vec<bool>]) -> LinearExpr {
    previous
        .iter()
        .enumerate()
        .flat_map(|(m, row)| row.iter().enumerate().map(move |(n, &was)| (Cell::new(m, n), was)))
        .fold(LinearExpr::default(), |expr, (cell, was)| {
            if was {
                expr.term(cell, 1)
            } else {
                expr.term(cell, -1).plus_constant(1)
            }
        })
}

fn constrain_coverage(model: ShiftModel, shifts_per_night: u32) -> ShiftModel {
    (0..model.nights).fold(model, |model, n| {
        let on_call = LinearExpr::sum(model.cells_of_night(n));
        model.with(LinearConstraint::new(
            ConstraintKind::Coverage,
            on_call,
            Relation::Eq,
            shifts_per_night as i64,
        ))
    })
}

fn constrain_workload(model: ShiftModel, min_nights: u32, max_nights: u32) -> ShiftModel {
    (0..model.managers).fold(model, |model, m| {
        let worked = LinearExpr::sum(model.cells_of_manager(m));
        model
            .with(LinearConstraint::new(
                ConstraintKind::Workload,
                worked.clone(),
                Relation::Ge,
                min_nights as i64,
            ))
            .with(LinearConstraint::new(
                ConstraintKind::Workload,
                worked,
                Relation::Le,
                max_nights as i64,
            ))
    })
}

fn constrain_availability(
    model: ShiftModel,
    matrix: &AvailabilityMatrix,
    minimum: Availability,
) -> ShiftModel {
    let unavailable: Vec<Cell> = (0..model.managers)
        .flat_map(|m| (0..model.nights).map(move |n| Cell::new(m, n)))
        .filter(|cell| matrix.level(cell.manager, cell.night) < minimum)
        .collect();

    unavailable.into_iter().fold(model, |model, cell| {
        model.with(LinearConstraint::new(
            ConstraintKind::Availability,
            LinearExpr::sum([cell]),
            Relation::Eq,
            0,
        ))
    })
}

fn constrain_pairings(
    model: ShiftModel,
    together: &[(usize, usize)],
    apart: &[(usize, usize)],
) -> ShiftModel {
    (0..model.nights).fold(model, |model, n| {
        let model = together.iter().fold(model, |model, &(a, b)| {
            let difference = LinearExpr::default()
                .term(Cell::new(a, n), 1)
                .term(Cell::new(b, n), -1);
            model.with(LinearConstraint::new(
                ConstraintKind::Together,
                difference,
                Relation::Eq,
                0,
            ))
        });

        apart.iter().fold(model, |model, &(a, b)| {
            let both = LinearExpr::sum([Cell::new(a, n), Cell::new(b, n)]);
            model.with(LinearConstraint::new(
                ConstraintKind::Apart,
                both,
                Relation::Le,
                1,
            ))
        })
    })
}

fn constrain_pins(model: ShiftModel, pins: &BTreeMap<usize, BTreeSet<usize>>) -> ShiftModel {
    pins.iter()
        .flat_map(|(&m, nights)| nights.iter().map(move |&n| Cell::new(m, n)))
        .fold(model, |model, cell| {
            model.with(LinearConstraint::new(
                ConstraintKind::Pin,
                LinearExpr::sum([cell]),
                Relation::Eq,
                1,
            ))
        })
}

fn constrain_min_gap(model: ShiftModel, gap: usize) -> ShiftModel {
    let windows = gap_windows(model.nights, gap);
    let bound: Vec<usize> = (0..model.managers)
        .filter(|m| !model.gap_exempt.contains(m))
        .collect();

    bound.into_iter().fold(model, |model, m| {
        windows.iter().fold(model, |model, window| {
            let in_window = LinearExpr::sum(window.clone().map(|n| Cell::new(m, n)));
            model.with(LinearConstraint::new(
                ConstraintKind::MinGap,
                in_window,
                Relation::Le,
                1,
            ))
        })
    })
}
