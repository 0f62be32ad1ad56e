use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Whether the objective is maximized or minimized
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "maximization"))]
    Maximize,
    #[cfg_attr(feature = "serde", serde(rename = "minimization"))]
    Minimize,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Direction::Maximize => "Maximize",
            Direction::Minimize => "Minimize",
        }
    }
}

/// Comparison between a constraint's left-hand side and its right-hand side
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Relation {
    /// Less than or equal (<=)
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "<="))]
    Le,
    /// Equal (=)
    #[cfg_attr(feature = "serde", serde(rename = "="))]
    Eq,
    /// Greater than or equal (>=)
    #[cfg_attr(feature = "serde", serde(rename = ">="))]
    Ge,
}

impl Relation {
    pub fn as_str(self) -> &'static str {
        match self {
            Relation::Le => "<=",
            Relation::Eq => "=",
            Relation::Ge => ">=",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown relation '{0}' (expected <=, = or >=)")]
pub struct UnknownRelation(pub String);

impl FromStr for Relation {
    type Err = UnknownRelation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<=" | "≤" => Ok(Relation::Le),
            "=" | "==" => Ok(Relation::Eq),
            ">=" | "≥" => Ok(Relation::Ge),
            other => Err(UnknownRelation(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Coefficients for each variable, index-aligned with the objective
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub relation: Relation,
    /// Right-hand side value
    pub rhs: f64,
}

impl Constraint {
    pub fn new(coefficients: Vec<f64>, relation: Relation, rhs: f64) -> Self {
        Self {
            coefficients,
            relation,
            rhs,
        }
    }
}

/// Shape violations of a would-be [`ProblemRequest`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("the objective needs at least one variable")]
    NoVariables,
    #[error("at least one constraint is required")]
    NoConstraints,
    #[error("constraint {constraint} has {found} coefficients, expected {expected}")]
    Arity {
        constraint: usize,
        expected: usize,
        found: usize,
    },
    #[error("constraint columns disagree: {coefficients} coefficient rows, {relations} relations, {rhs} right-hand sides")]
    ColumnLengths {
        coefficients: usize,
        relations: usize,
        rhs: usize,
    },
}

/// The canonical, arity-consistent problem sent to the solver.
///
/// Every constraint has exactly as many coefficients as the objective and
/// there is at least one constraint. Both are checked on construction, so a
/// value of this type always satisfies them.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "wire::WireRequest", into = "wire::WireRequest")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemRequest {
    direction: Direction,
    objective: Vec<f64>,
    constraints: Vec<Constraint>,
}

impl ProblemRequest {
    pub fn new(
        direction: Direction,
        objective: Vec<f64>,
        constraints: Vec<Constraint>,
    ) -> Result<Self, ShapeError> {
        if objective.is_empty() {
            return Err(ShapeError::NoVariables);
        }
        if constraints.is_empty() {
            return Err(ShapeError::NoConstraints);
        }
        let n = objective.len();
        if let Some((i, c)) = constraints
            .iter()
            .enumerate()
            .find(|(_, c)| c.coefficients.len() != n)
        {
            return Err(ShapeError::Arity {
                constraint: i + 1,
                expected: n,
                found: c.coefficients.len(),
            });
        }
        Ok(Self {
            direction,
            objective,
            constraints,
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn objective(&self) -> &[f64] {
        &self.objective
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn num_variables(&self) -> usize {
        self.objective.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// A 2-D feasible region can be plotted
    pub fn is_plottable(&self) -> bool {
        self.num_variables() == 2
    }
}

#[cfg(feature = "serde")]
mod wire {
    use super::{Constraint, Direction, ProblemRequest, Relation, ShapeError};

    /// Column-oriented layout the solver service speaks
    #[derive(serde::Serialize, serde::Deserialize)]
    pub struct WireRequest {
        problem_type: Direction,
        #[serde(rename = "C")]
        objective: Vec<f64>,
        #[serde(rename = "LI")]
        coefficients: Vec<Vec<f64>>,
        #[serde(rename = "LD")]
        rhs: Vec<f64>,
        #[serde(rename = "O")]
        relations: Vec<Relation>,
    }

    impl From<ProblemRequest> for WireRequest {
        fn from(request: ProblemRequest) -> Self {
            let mut coefficients = Vec::with_capacity(request.constraints.len());
            let mut rhs = Vec::with_capacity(request.constraints.len());
            let mut relations = Vec::with_capacity(request.constraints.len());
            for c in request.constraints {
                coefficients.push(c.coefficients);
                rhs.push(c.rhs);
                relations.push(c.relation);
            }
            Self {
                problem_type: request.direction,
                objective: request.objective,
                coefficients,
                rhs,
                relations,
            }
        }
    }

    impl TryFrom<WireRequest> for ProblemRequest {
        type Error = ShapeError;

        fn try_from(wire: WireRequest) -> Result<Self, Self::Error> {
            let rows = wire.coefficients.len();
            if wire.rhs.len() != rows || wire.relations.len() != rows {
                return Err(ShapeError::ColumnLengths {
                    coefficients: rows,
                    relations: wire.relations.len(),
                    rhs: wire.rhs.len(),
                });
            }
            let constraints = wire
                .coefficients
                .into_iter()
                .zip(wire.relations)
                .zip(wire.rhs)
                .map(|((coefficients, relation), rhs)| Constraint::new(coefficients, relation, rhs))
                .collect();
            ProblemRequest::new(wire.problem_type, wire.objective, constraints)
        }
    }
}
