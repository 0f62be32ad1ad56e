use std::collections::BTreeMap;

use thiserror::Error;

/// Outcome reported by the solver service
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// An optimal solution was found
    #[cfg_attr(feature = "serde", serde(rename = "optimo", alias = "optimal"))]
    Optimal,
    /// The problem is infeasible (no solution exists)
    #[cfg_attr(feature = "serde", serde(rename = "infactible", alias = "infeasible"))]
    Infeasible,
    /// The problem is unbounded
    #[cfg_attr(feature = "serde", serde(rename = "no acotado", alias = "unbounded"))]
    Unbounded,
    /// Solver gave up or failed internally
    #[cfg_attr(
        feature = "serde",
        serde(rename = "error", alias = "max_iterations_reached")
    )]
    Error,
}

impl SolveStatus {
    pub fn is_optimal(self) -> bool {
        self == SolveStatus::Optimal
    }

    pub fn label(self) -> &'static str {
        match self {
            SolveStatus::Optimal => "Optimal",
            SolveStatus::Infeasible => "Infeasible",
            SolveStatus::Unbounded => "Unbounded",
            SolveStatus::Error => "Error",
        }
    }
}

/// Optimal point of a solved problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Optimal objective value
    #[cfg_attr(feature = "serde", serde(rename = "valor_optimo"))]
    pub objective_value: f64,
    /// Value of every variable the solver reports, slack variables included
    pub variables: BTreeMap<String, f64>,
}

/// A single cell of a simplex tableau
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

/// One iteration of the simplex method as reported by the solver
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Tableau {
    #[cfg_attr(feature = "serde", serde(rename = "titulo"))]
    pub title: String,
    pub headers: Vec<String>,
    #[cfg_attr(feature = "serde", serde(rename = "filas"))]
    pub rows: Vec<Vec<Cell>>,
    #[cfg_attr(feature = "serde", serde(rename = "fila_obj"))]
    pub objective_row: Vec<Cell>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResultShapeError {
    #[error("solver reported an optimal status without a solution")]
    MissingSolution,
}

/// The result of solving an LP problem.
///
/// The solution is only present when the status is optimal.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "wire::WireResult", into = "wire::WireResult")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct SolveResult {
    status: SolveStatus,
    solution: Option<Solution>,
    tableaux: Vec<Tableau>,
}

impl SolveResult {
    pub fn new(
        status: SolveStatus,
        solution: Option<Solution>,
        tableaux: Vec<Tableau>,
    ) -> Result<Self, ResultShapeError> {
        let solution = match (status, solution) {
            (SolveStatus::Optimal, None) => return Err(ResultShapeError::MissingSolution),
            (SolveStatus::Optimal, Some(s)) => Some(s),
            (_, _) => None,
        };
        Ok(Self {
            status,
            solution,
            tableaux,
        })
    }

    pub fn optimal(objective_value: f64, variables: BTreeMap<String, f64>) -> Self {
        Self {
            status: SolveStatus::Optimal,
            solution: Some(Solution {
                objective_value,
                variables,
            }),
            tableaux: Vec::new(),
        }
    }

    pub fn without_solution(status: SolveStatus) -> Self {
        Self {
            status,
            solution: None,
            tableaux: Vec::new(),
        }
    }

    pub fn with_tableaux(mut self, tableaux: Vec<Tableau>) -> Self {
        self.tableaux = tableaux;
        self
    }

    pub fn status(&self) -> SolveStatus {
        self.status
    }

    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }

    pub fn objective_value(&self) -> Option<f64> {
        self.solution.as_ref().map(|s| s.objective_value)
    }

    pub fn variable_values(&self) -> Option<&BTreeMap<String, f64>> {
        self.solution.as_ref().map(|s| &s.variables)
    }

    pub fn tableaux(&self) -> &[Tableau] {
        &self.tableaux
    }
}

#[cfg(feature = "serde")]
mod wire {
    use super::{ResultShapeError, SolveResult, SolveStatus, Solution, Tableau};

    #[derive(serde::Serialize, serde::Deserialize)]
    pub struct WireResult {
        status: SolveStatus,
        #[serde(rename = "tablas", default)]
        tableaux: Vec<Tableau>,
        #[serde(rename = "solucion", default)]
        solution: Option<Solution>,
    }

    impl From<SolveResult> for WireResult {
        fn from(result: SolveResult) -> Self {
            Self {
                status: result.status,
                tableaux: result.tableaux,
                solution: result.solution,
            }
        }
    }

    impl TryFrom<WireResult> for SolveResult {
        type Error = ResultShapeError;

        fn try_from(wire: WireResult) -> Result<Self, Self::Error> {
            SolveResult::new(wire.status, wire.solution, wire.tableaux)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solution_dropped_unless_optimal() {
        let solution = Solution {
            objective_value: 1.0,
            variables: BTreeMap::from([("x1".to_string(), 1.0)]),
        };
        let result = SolveResult::new(SolveStatus::Infeasible, Some(solution), vec![]).unwrap();
        assert!(result.solution().is_none());
        assert!(result.objective_value().is_none());
    }

    #[test]
    fn test_optimal_requires_solution() {
        assert_eq!(
            SolveResult::new(SolveStatus::Optimal, None, vec![]).unwrap_err(),
            ResultShapeError::MissingSolution
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_parse_solver_response() {
        let body = r#"{
            "status": "optimo",
            "tablas": [{
                "titulo": "Iteration 1",
                "headers": ["Base", "x1", "x2", "RHS"],
                "filas": [["s1", 1, 0, 4], ["s2", 0, 2, 12]],
                "fila_obj": ["Z", -3, -5, 0]
            }],
            "solucion": {"variables": {"x1": 2.0, "x2": 6.0, "s1": 2.0}, "valor_optimo": 36.0}
        }"#;
        let result: SolveResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.status(), SolveStatus::Optimal);
        assert_eq!(result.objective_value(), Some(36.0));
        assert_eq!(result.variable_values().unwrap()["x2"], 6.0);
        assert_eq!(result.tableaux()[0].rows[0][0], Cell::Text("s1".into()));
        assert_eq!(result.tableaux()[0].objective_row[1], Cell::Number(-3.0));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_status_aliases_and_unknown_status() {
        let r: SolveResult = serde_json::from_str(r#"{"status":"no acotado"}"#).unwrap();
        assert_eq!(r.status(), SolveStatus::Unbounded);
        let r: SolveResult = serde_json::from_str(r#"{"status":"max_iterations_reached"}"#).unwrap();
        assert_eq!(r.status(), SolveStatus::Error);
        let r: SolveResult = serde_json::from_str(r#"{"status":"infeasible"}"#).unwrap();
        assert_eq!(r.status(), SolveStatus::Infeasible);
        assert!(serde_json::from_str::<SolveResult>(r#"{"status":"pending"}"#).is_err());
        assert!(serde_json::from_str::<SolveResult>(r#"{"status":"optimo"}"#).is_err());
    }
}
