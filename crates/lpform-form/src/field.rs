use std::fmt;

use lpform_model::Direction;

use crate::form::{ConstraintRow, FormState};

/// Identifies one input of the form. Indices are zero-based; `Display` is
/// one-based, the way the form labels them.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "field", rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldId {
    VariableCount,
    Objective { index: usize },
    Coefficient { constraint: usize, index: usize },
    Relation { constraint: usize },
    Rhs { constraint: usize },
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            FieldId::VariableCount => write!(f, "number of variables"),
            FieldId::Objective { index } => write!(f, "objective coefficient of x{}", index + 1),
            FieldId::Coefficient { constraint, index } => {
                write!(f, "constraint {}, coefficient of x{}", constraint + 1, index + 1)
            }
            FieldId::Relation { constraint } => write!(f, "constraint {}, relation", constraint + 1),
            FieldId::Rhs { constraint } => write!(f, "constraint {}, right-hand side", constraint + 1),
        }
    }
}

/// Read-only projection over a [`FormState`].
#[derive(Debug, Clone, Copy)]
pub struct FieldModel<'a> {
    form: &'a FormState,
}

impl<'a> FieldModel<'a> {
    pub fn new(form: &'a FormState) -> Self {
        Self { form }
    }

    pub fn direction(&self) -> Direction {
        self.form.direction
    }

    pub fn raw_variable_count(&self) -> &'a str {
        &self.form.variable_count
    }

    pub fn objective(&self) -> &'a [String] {
        &self.form.objective
    }

    pub fn rows(&self) -> &'a [ConstraintRow] {
        &self.form.constraints
    }

    /// Every field that must hold a number, in form order: the objective,
    /// then each row's coefficients followed by its right-hand side.
    pub fn numeric_fields(&self) -> impl Iterator<Item = (FieldId, &'a str)> + use<'a> {
        let form = self.form;
        let objective = form
            .objective
            .iter()
            .enumerate()
            .map(|(index, v)| (FieldId::Objective { index }, v.as_str()));
        let rows = form
            .constraints
            .iter()
            .enumerate()
            .flat_map(|(constraint, row)| {
                row.coefficients
                    .iter()
                    .enumerate()
                    .map(move |(index, v)| (FieldId::Coefficient { constraint, index }, v.as_str()))
                    .chain(std::iter::once((FieldId::Rhs { constraint }, row.rhs.as_str())))
            });
        objective.chain(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_fields_in_form_order() {
        let form = FormState::default();
        let ids: Vec<FieldId> = form.fields().numeric_fields().map(|(id, _)| id).collect();
        assert_eq!(
            ids,
            vec![
                FieldId::Objective { index: 0 },
                FieldId::Objective { index: 1 },
                FieldId::Coefficient { constraint: 0, index: 0 },
                FieldId::Coefficient { constraint: 0, index: 1 },
                FieldId::Rhs { constraint: 0 },
            ]
        );
    }

    #[test]
    fn test_field_labels_are_one_based() {
        assert_eq!(
            FieldId::Coefficient { constraint: 1, index: 0 }.to_string(),
            "constraint 2, coefficient of x1"
        );
        assert_eq!(FieldId::Rhs { constraint: 0 }.to_string(), "constraint 1, right-hand side");
    }
}
