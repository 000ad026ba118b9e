use good_lp::Solution as LpSolution;
use good_lp::solvers::coin_cbc::{CoinCbcProblem, coin_cbc};
use good_lp::solvers::{ResolutionError, SolutionStatus};
use good_lp::{Expression, ProblemVariables, SolverModel, Variable, variable, variables};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::config::ObjectiveStrategy;
use crate::model::{
    ConstraintKind, LinearConstraint, LinearExpr, ObjectiveStage, Relation, Sense, ShiftModel,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    Unknown,
    ModelInvalid,
    Infeasible,
    Feasible,
    Optimal,
}

impl SolveStatus {
    /// Whether a schedule satisfying every hard constraint was found.
    pub fn is_solved(self) -> bool {
        matches!(self, SolveStatus::Feasible | SolveStatus::Optimal)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SolveStatus::Unknown => "UNKNOWN",
            SolveStatus::ModelInvalid => "MODEL_INVALID",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Optimal => "OPTIMAL",
        };
        f.write_str(name)
    }
}

/// Who works which night, indexed `[manager][night]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftAssignment {
    grid: Vec<Vec<bool>>,
}

impl ShiftAssignment {
    pub fn from_grid(grid: Vec<Vec<bool>>) -> Self {
        Self { grid }
    }

    pub fn works(&self, manager: usize, night: usize) -> bool {
        self.grid[manager][night]
    }

    pub fn manager_count(&self) -> usize {
        self.grid.len()
    }

    pub fn night_count(&self) -> usize {
        self.grid.first().map_or(0, Vec::len)
    }

    pub fn nights_of(&self, manager: usize) -> impl Iterator<Item = usize> + '_ {
        self.grid[manager]
            .iter()
            .enumerate()
            .filter_map(|(n, &on)| on.then_some(n))
    }

    pub fn managers_on(&self, night: usize) -> impl Iterator<Item = usize> + '_ {
        self.grid
            .iter()
            .enumerate()
            .filter_map(move |(m, row)| row[night].then_some(m))
    }
}

/// Outcome of one solve. The assignment is present exactly when the status
/// is FEASIBLE or OPTIMAL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveResult {
    status: SolveStatus,
    assignment: Option<ShiftAssignment>,
}

impl SolveResult {
    pub fn solved(status: SolveStatus, assignment: ShiftAssignment) -> Self {
        debug_assert!(status.is_solved());
        Self {
            status,
            assignment: Some(assignment),
        }
    }

    pub fn unsolved(status: SolveStatus) -> Self {
        Self {
            status,
            assignment: None,
        }
    }

    pub fn status(&self) -> SolveStatus {
        self.status
    }

    pub fn is_solved(&self) -> bool {
        self.status.is_solved()
    }

    pub fn assignment(&self) -> Option<&ShiftAssignment> {
        self.assignment.as_ref()
    }
}

/// The search engine behind a [`ShiftModel`].
///
/// FEASIBLE/OPTIMAL must only be reported for assignments satisfying every
/// constraint of the model; the objective only picks among those.
pub trait ShiftSolver {
    fn solve(&self, model: &ShiftModel) -> SolveResult;
}

/// MILP solve through `good_lp` and COIN-OR CBC.
#[derive(Debug, Clone, Default)]
pub struct CbcSolver {
    time_limit: Option<f64>,
}

impl CbcSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop each CBC run after `seconds`, keeping the best schedule found so far.
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    /// One CBC run per objective stage. Each finished stage is frozen as a
    /// bound on the next, so later stages only break ties.
    fn solve_lexicographic(&self, model: &ShiftModel) -> SolveResult {
        let mut bounds: Vec<LinearConstraint> = Vec::new();
        let mut best: Option<SolveResult> = None;

        for (index, stage) in model.objective().stages().iter().enumerate() {
            let result = self.solve_stage(model, stage, &bounds);
            let Some(assignment) = result.assignment() else {
                if let Some(best) = best {
                    warn!(stage = index, status = %result.status(), "tie-break stage failed, keeping earlier schedule");
                    return best;
                }
                return result;
            };

            let value = stage.expr.evaluate(assignment);
            debug!(stage = index, value, status = %result.status(), "objective stage solved");

            let relation = match stage.sense {
                Sense::Minimise => Relation::Le,
                Sense::Maximise => Relation::Ge,
            };
            bounds.push(LinearConstraint::new(
                ConstraintKind::ObjectiveBound,
                stage.expr.clone(),
                relation,
                value,
            ));

            best = Some(match best {
                Some(previous) if previous.status() < result.status() => {
                    SolveResult::solved(previous.status(), assignment.clone())
                }
                _ => result,
            });
        }

        best.unwrap_or_else(|| SolveResult::unsolved(SolveStatus::ModelInvalid))
    }

    fn solve_stage(
        &self,
        model: &ShiftModel,
        objective: &ObjectiveStage,
        bounds: &[LinearConstraint],
    ) -> SolveResult {
        let (variables, cells) = init_variables(model);
        let objective_expression = create_expression(&objective.expr, &cells);
        let problem = self.create_problem(variables, objective.sense, objective_expression);

        let problem = model
            .constraints()
            .iter()
            .chain(bounds)
            .fold(problem, |p, c| p.with(create_constraint(c, &cells)));

        match problem.solve() {
            Ok(solution) => {
                let status = match solution.status() {
                    SolutionStatus::Optimal => SolveStatus::Optimal,
                    _ => SolveStatus::Feasible,
                };
                checked_result(model, bounds, status, create_assignment(&solution, &cells))
            }
            Err(ResolutionError::Infeasible) => SolveResult::unsolved(SolveStatus::Infeasible),
            Err(ResolutionError::Unbounded) => SolveResult::unsolved(SolveStatus::ModelInvalid),
            Err(e) => {
                warn!(error = %e, "solver gave up");
                SolveResult::unsolved(SolveStatus::Unknown)
            }
        }
    }

    fn create_problem(
        &self,
        variables: ProblemVariables,
        sense: Sense,
        objective: Expression,
    ) -> CoinCbcProblem {
        let unsolved = match sense {
            Sense::Minimise => variables.minimise(objective),
            Sense::Maximise => variables.maximise(objective),
        };
        let mut problem = unsolved.using(coin_cbc);
        #[cfg(not(debug_assertions))]
        problem.set_parameter("loglevel", "0");
        if let Some(seconds) = self.time_limit {
            problem.set_parameter("seconds", &seconds.to_string());
        }
        problem
    }
}

impl ShiftSolver for CbcSolver {
    fn solve(&self, model: &ShiftModel) -> SolveResult {
        let result = match model.strategy() {
            ObjectiveStrategy::Lexicographic => self.solve_lexicographic(model),
            ObjectiveStrategy::Weighted => {
                let objective = model.objective().weighted(model.dominating_weight());
                self.solve_stage(model, &objective, &[])
            }
        };
        info!(status = %result.status(), "solve finished");
        result
    }
}

/// Only report a schedule if the rounded values really satisfy the model.
fn checked_result(
    model: &ShiftModel,
    bounds: &[LinearConstraint],
    status: SolveStatus,
    assignment: ShiftAssignment,
) -> SolveResult {
    let bounds_hold = bounds.iter().all(|c| c.is_satisfied(&assignment));
    if model.is_satisfied_by(&assignment) && bounds_hold {
        SolveResult::solved(status, assignment)
    } else {
        warn!(%status, "solver returned a schedule that breaks the model");
        SolveResult::unsolved(SolveStatus::Unknown)
    }
}

type CellVariables = Vec<Vec<Variable>>;

/// One binary per (manager, night)
fn init_variables(model: &ShiftModel) -> (ProblemVariables, CellVariables) {
    let mut problem_vars = variables!();
    let mut cells = Vec::with_capacity(model.manager_count());

    for _ in 0..model.manager_count() {
        let mut row = Vec::with_capacity(model.night_count());
        for _ in 0..model.night_count() {
            row.push(problem_vars.add(variable().binary()));
        }
        cells.push(row);
    }

    (problem_vars, cells)
}

fn create_expression(expr: &LinearExpr, cells: &CellVariables) -> Expression {
    expr.terms().iter().fold(
        Expression::from(expr.constant() as f64),
        |sum, &(cell, coefficient)| sum + cells[cell.manager][cell.night] * coefficient as f64,
    )
}

fn create_constraint(constraint: &LinearConstraint, cells: &CellVariables) -> good_lp::Constraint {
    let lhs = create_expression(&constraint.expr, cells);
    let rhs = constraint.rhs as f64;
    match constraint.relation {
        Relation::Eq => lhs.eq(rhs),
        Relation::Le => lhs.leq(rhs),
        Relation::Ge => lhs.geq(rhs),
    }
}

fn create_assignment(solution: &impl LpSolution, cells: &CellVariables) -> ShiftAssignment {
    let grid = cells
        .iter()
        .map(|row| row.iter().map(|&v| solution.value(v).round() as i64 == 1).collect())
        .collect();
    ShiftAssignment::from_grid(grid)
}
