use lpform_model::{Constraint, ProblemRequest, Relation, ShapeError};

use crate::field::{FieldId, FieldModel};
use crate::validator::{ValidationError, parse_number, parse_variable_count};

/// Assemble the canonical request from the current form.
///
/// Coefficients are read by their slot in the row, never by position among
/// all inputs, so the right-hand side can't be mistaken for a coefficient.
/// Arity is checked strictly: a row with too few or too many coefficients
/// is an error, never padded or truncated.
pub fn build_request(fields: &FieldModel<'_>) -> Result<ProblemRequest, ValidationError> {
    let n = parse_variable_count(fields.raw_variable_count()).ok_or_else(|| {
        ValidationError::InvalidVariableCount(fields.raw_variable_count().to_string())
    })?;

    if fields.objective().len() != n {
        return Err(ValidationError::ObjectiveArityMismatch {
            expected: n,
            found: fields.objective().len(),
        });
    }
    let objective = fields
        .objective()
        .iter()
        .enumerate()
        .map(|(index, raw)| number(FieldId::Objective { index }, raw))
        .collect::<Result<Vec<_>, _>>()?;

    let mut constraints = Vec::with_capacity(fields.rows().len());
    for (constraint, row) in fields.rows().iter().enumerate() {
        if row.coefficients.len() != n {
            return Err(ValidationError::ArityMismatch {
                constraint: constraint + 1,
                expected: n,
                found: row.coefficients.len(),
            });
        }
        let coefficients = row
            .coefficients
            .iter()
            .enumerate()
            .map(|(index, raw)| number(FieldId::Coefficient { constraint, index }, raw))
            .collect::<Result<Vec<_>, _>>()?;
        let relation = row.relation.parse::<Relation>().map_err(|_| {
            ValidationError::MalformedInput {
                field: FieldId::Relation { constraint },
                value: row.relation.clone(),
            }
        })?;
        let rhs = number(FieldId::Rhs { constraint }, &row.rhs)?;
        constraints.push(Constraint::new(coefficients, relation, rhs));
    }

    ProblemRequest::new(fields.direction(), objective, constraints).map_err(|e| match e {
        ShapeError::NoConstraints => ValidationError::NoConstraints,
        other => ValidationError::Shape(other),
    })
}

fn number(field: FieldId, raw: &str) -> Result<f64, ValidationError> {
    parse_number(raw).ok_or_else(|| ValidationError::MalformedInput {
        field,
        value: raw.to_string(),
    })
}
