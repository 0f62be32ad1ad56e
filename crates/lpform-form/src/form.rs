use std::fmt;

use lpform_model::{Direction, ProblemRequest, Relation};
use thiserror::Error;

use crate::field::FieldModel;
use crate::validator::parse_variable_count;

pub const DEFAULT_VARIABLE_COUNT: usize = 2;
const DEFAULT_OBJECTIVE: &str = "1";
const DEFAULT_COEFFICIENT: &str = "1";
const DEFAULT_RHS: &str = "10";

/// Raw text of one constraint row as the user typed it
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintRow {
    /// One slot per decision variable, in variable order
    pub coefficients: Vec<String>,
    /// Relation symbol (`<=`, `=`, `>=`)
    pub relation: String,
    /// Right-hand side
    pub rhs: String,
}

impl ConstraintRow {
    pub fn with_arity(variables: usize) -> Self {
        Self {
            coefficients: vec![DEFAULT_COEFFICIENT.to_string(); variables],
            relation: Relation::default().as_str().to_string(),
            rhs: DEFAULT_RHS.to_string(),
        }
    }
}

/// Explicit, serializable state of the problem form.
///
/// Every field holds raw text; nothing is parsed until a request is built.
/// The UI renders from this structure and writes edits back through
/// [`FormState::apply`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub direction: Direction,
    pub variable_count: String,
    pub objective: Vec<String>,
    pub constraints: Vec<ConstraintRow>,
}

impl Default for FormState {
    fn default() -> Self {
        Self::with_variables(DEFAULT_VARIABLE_COUNT)
    }
}

/// A single user edit to the form. Indices are zero-based.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    SetDirection { direction: Direction },
    SetVariableCount { value: String },
    SetObjective { index: usize, value: String },
    SetCoefficient { row: usize, index: usize, value: String },
    SetRelation { row: usize, value: String },
    SetRhs { row: usize, value: String },
    AddConstraint,
    RemoveConstraint { row: usize },
}

impl FieldEdit {
    /// Edits that rebuild the shape of the form
    pub fn changes_arity(&self) -> bool {
        matches!(self, FieldEdit::SetVariableCount { .. })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("there is no constraint {0}")]
    UnknownRow(usize),
    #[error("there is no coefficient x{0}")]
    UnknownSlot(usize),
    #[error("cannot add a constraint while the number of variables is invalid ('{0}')")]
    InvalidVariableCount(String),
}

impl FormState {
    /// A fresh form with `variables` objective slots and one default row
    pub fn with_variables(variables: usize) -> Self {
        Self {
            direction: Direction::default(),
            variable_count: variables.to_string(),
            objective: vec![DEFAULT_OBJECTIVE.to_string(); variables],
            constraints: vec![ConstraintRow::with_arity(variables)],
        }
    }

    /// Repopulate the form from a previously submitted request
    pub fn from_request(request: &ProblemRequest) -> Self {
        Self {
            direction: request.direction(),
            variable_count: request.num_variables().to_string(),
            objective: request.objective().iter().map(f64::to_string).collect(),
            constraints: request
                .constraints()
                .iter()
                .map(|c| ConstraintRow {
                    coefficients: c.coefficients.iter().map(f64::to_string).collect(),
                    relation: c.relation.as_str().to_string(),
                    rhs: c.rhs.to_string(),
                })
                .collect(),
        }
    }

    pub fn fields(&self) -> FieldModel<'_> {
        FieldModel::new(self)
    }

    pub fn apply(&mut self, edit: FieldEdit) -> Result<(), EditError> {
        match edit {
            FieldEdit::SetDirection { direction } => self.direction = direction,
            FieldEdit::SetVariableCount { value } => {
                // An unparsable count is kept as typed; the fields stay put
                // until it becomes valid, and validation reports it.
                if let Some(n) = parse_variable_count(&value) {
                    self.objective = vec![DEFAULT_OBJECTIVE.to_string(); n];
                    self.constraints = vec![ConstraintRow::with_arity(n)];
                }
                self.variable_count = value;
            }
            FieldEdit::SetObjective { index, value } => {
                let slot = self
                    .objective
                    .get_mut(index)
                    .ok_or(EditError::UnknownSlot(index + 1))?;
                *slot = value;
            }
            FieldEdit::SetCoefficient { row, index, value } => {
                let slot = self
                    .row_mut(row)?
                    .coefficients
                    .get_mut(index)
                    .ok_or(EditError::UnknownSlot(index + 1))?;
                *slot = value;
            }
            FieldEdit::SetRelation { row, value } => self.row_mut(row)?.relation = value,
            FieldEdit::SetRhs { row, value } => self.row_mut(row)?.rhs = value,
            FieldEdit::AddConstraint => {
                let n = parse_variable_count(&self.variable_count)
                    .ok_or_else(|| EditError::InvalidVariableCount(self.variable_count.clone()))?;
                self.constraints.push(ConstraintRow::with_arity(n));
            }
            FieldEdit::RemoveConstraint { row } => {
                if row >= self.constraints.len() {
                    return Err(EditError::UnknownRow(row + 1));
                }
                self.constraints.remove(row);
            }
        }
        Ok(())
    }

    fn row_mut(&mut self, row: usize) -> Result<&mut ConstraintRow, EditError> {
        self.constraints
            .get_mut(row)
            .ok_or(EditError::UnknownRow(row + 1))
    }
}

/// A form rebuilt from a stored request. `warning` explains why the default
/// form was substituted when the stored request could not be used.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restored {
    pub form: FormState,
    pub warning: Option<String>,
}

impl Restored {
    pub fn from_stored<E: fmt::Display>(stored: Option<Result<ProblemRequest, E>>) -> Self {
        match stored {
            Some(Ok(request)) => Self {
                form: FormState::from_request(&request),
                warning: None,
            },
            Some(Err(e)) => Self {
                form: FormState::default(),
                warning: Some(format!("Ignoring stored request: {}", e)),
            },
            None => Self {
                form: FormState::default(),
                warning: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lpform_model::Constraint;

    #[test]
    fn test_default_form_matches_initial_layout() {
        let form = FormState::default();
        assert_eq!(form.direction, Direction::Maximize);
        assert_eq!(form.variable_count, "2");
        assert_eq!(form.objective, vec!["1", "1"]);
        assert_eq!(form.constraints.len(), 1);
        assert_eq!(form.constraints[0].coefficients, vec!["1", "1"]);
        assert_eq!(form.constraints[0].relation, "<=");
        assert_eq!(form.constraints[0].rhs, "10");
    }

    #[test]
    fn test_changing_variable_count_resets_rows() {
        let mut form = FormState::default();
        form.apply(FieldEdit::AddConstraint).unwrap();
        form.apply(FieldEdit::SetVariableCount { value: "3".into() }).unwrap();
        assert_eq!(form.objective.len(), 3);
        assert_eq!(form.constraints.len(), 1);
        assert_eq!(form.constraints[0].coefficients.len(), 3);
    }

    #[test]
    fn test_invalid_variable_count_keeps_fields() {
        let mut form = FormState::default();
        form.apply(FieldEdit::SetVariableCount { value: "0".into() }).unwrap();
        assert_eq!(form.variable_count, "0");
        assert_eq!(form.objective.len(), 2);
        assert_eq!(
            form.apply(FieldEdit::AddConstraint),
            Err(EditError::InvalidVariableCount("0".into()))
        );
    }

    #[test]
    fn test_edits_out_of_range_are_rejected() {
        let mut form = FormState::default();
        assert_eq!(
            form.apply(FieldEdit::SetRhs { row: 4, value: "1".into() }),
            Err(EditError::UnknownRow(5))
        );
        assert_eq!(
            form.apply(FieldEdit::SetCoefficient { row: 0, index: 2, value: "1".into() }),
            Err(EditError::UnknownSlot(3))
        );
        assert_eq!(
            form.apply(FieldEdit::RemoveConstraint { row: 1 }),
            Err(EditError::UnknownRow(2))
        );
    }

    #[test]
    fn test_remove_last_constraint_leaves_empty_list() {
        let mut form = FormState::default();
        form.apply(FieldEdit::RemoveConstraint { row: 0 }).unwrap();
        assert!(form.constraints.is_empty());
    }

    #[test]
    fn test_from_request_restores_rows_in_order() {
        let request = ProblemRequest::new(
            Direction::Minimize,
            vec![2.5, -1.0],
            vec![
                Constraint::new(vec![1.0, 1.0], Relation::Ge, 4.0),
                Constraint::new(vec![0.5, 0.0], Relation::Eq, 1.5),
            ],
        )
        .unwrap();
        let form = FormState::from_request(&request);
        assert_eq!(form.direction, Direction::Minimize);
        assert_eq!(form.variable_count, "2");
        assert_eq!(form.objective, vec!["2.5", "-1"]);
        assert_eq!(form.constraints[0].relation, ">=");
        assert_eq!(form.constraints[1].coefficients, vec!["0.5", "0"]);
        assert_eq!(form.constraints[1].rhs, "1.5");
    }

    #[test]
    fn test_restored_reports_unusable_request() {
        let restored = Restored::from_stored(Some(Err("missing field `C`")));
        assert_eq!(restored.form, FormState::default());
        assert_eq!(
            restored.warning.as_deref(),
            Some("Ignoring stored request: missing field `C`")
        );

        let fresh = Restored::from_stored::<String>(None);
        assert_eq!(fresh.form, FormState::default());
        assert!(fresh.warning.is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_form_json_layout() {
        let json = serde_json::to_value(FormState::default()).unwrap();
        assert_eq!(json["direction"], "maximization");
        assert_eq!(json["variable_count"], "2");
        assert_eq!(json["constraints"][0]["relation"], "<=");

        let back: FormState = serde_json::from_value(json).unwrap();
        assert_eq!(back, FormState::default());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_edits_are_tagged_by_kind() {
        let edit: FieldEdit =
            serde_json::from_str(r#"{"kind":"set_rhs","row":0,"value":"5"}"#).unwrap();
        assert_eq!(
            edit,
            FieldEdit::SetRhs {
                row: 0,
                value: "5".into()
            }
        );

        let add = serde_json::to_value(FieldEdit::AddConstraint).unwrap();
        assert_eq!(add, serde_json::json!({"kind": "add_constraint"}));

        let direction: FieldEdit =
            serde_json::from_str(r#"{"kind":"set_direction","direction":"minimization"}"#)
                .unwrap();
        let mut form = FormState::default();
        form.apply(direction).unwrap();
        assert_eq!(form.direction, Direction::Minimize);
    }
}
