mod problem;
mod solution;

pub use problem::{Constraint, Direction, ProblemRequest, Relation, ShapeError, UnknownRelation};
pub use solution::{Cell, ResultShapeError, SolveResult, SolveStatus, Solution, Tableau};
