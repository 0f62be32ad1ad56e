use lpform_model::ShapeError;
use thiserror::Error;

use crate::field::{FieldId, FieldModel};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("The number of variables must be a whole number of at least 1 (got '{0}').")]
    InvalidVariableCount(String),
    #[error("{count} field(s) hold invalid values; check {first} ('{value}') first.")]
    InvalidFields {
        first: FieldId,
        value: String,
        count: usize,
    },
    #[error("Add at least one constraint to the problem.")]
    NoConstraints,
    #[error("The {field} is not valid: '{value}'.")]
    MalformedInput { field: FieldId, value: String },
    #[error("Constraint {constraint} has {found} coefficient(s) but the objective has {expected} variable(s).")]
    ArityMismatch {
        constraint: usize,
        expected: usize,
        found: usize,
    },
    #[error("The objective has {found} coefficient(s) but {expected} variable(s) were declared.")]
    ObjectiveArityMismatch { expected: usize, found: usize },
    #[error("{0}")]
    Shape(ShapeError),
}

/// Parse a numeric field.
///
/// The value must be non-empty, finite, and must not end in a bare decimal
/// point: `"3."` is what a user has half-typed, not a number.
pub fn parse_number(raw: &str) -> Option<f64> {
    let value = raw.trim();
    if value.is_empty() || value.ends_with('.') {
        return None;
    }
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_variable_count(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|&n| n >= 1)
}

pub fn variable_count_valid(fields: &FieldModel<'_>) -> Result<(), ValidationError> {
    match parse_variable_count(fields.raw_variable_count()) {
        Some(_) => Ok(()),
        None => Err(ValidationError::InvalidVariableCount(
            fields.raw_variable_count().to_string(),
        )),
    }
}

pub fn all_fields_numeric(fields: &FieldModel<'_>) -> Result<(), ValidationError> {
    let mut invalid = fields
        .numeric_fields()
        .filter(|(_, value)| parse_number(value).is_none());
    let Some((first, value)) = invalid.next() else {
        return Ok(());
    };
    Err(ValidationError::InvalidFields {
        first,
        value: value.to_string(),
        count: 1 + invalid.count(),
    })
}

pub fn at_least_one_constraint(fields: &FieldModel<'_>) -> Result<(), ValidationError> {
    if fields.rows().is_empty() {
        Err(ValidationError::NoConstraints)
    } else {
        Ok(())
    }
}

/// Run every submit-time check, stopping at the first failure
pub fn validate(fields: &FieldModel<'_>) -> Result<(), ValidationError> {
    variable_count_valid(fields)?;
    all_fields_numeric(fields)?;
    at_least_one_constraint(fields)
}

/// Every submit-time check, each reported independently
pub fn diagnostics(fields: &FieldModel<'_>) -> Vec<ValidationError> {
    [
        variable_count_valid(fields),
        all_fields_numeric(fields),
        at_least_one_constraint(fields),
    ]
    .into_iter()
    .filter_map(Result::err)
    .collect()
}

/// Result of cleaning a numeric field after a keystroke
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    pub value: String,
    /// Cursor position (in characters) in the cleaned value
    pub cursor: usize,
    /// The cleaned value is a complete number
    pub complete: bool,
}

/// Strip everything but digits, a single leading minus and the first
/// decimal point. `cursor` is a character offset into `value`.
pub fn sanitize(value: &str, cursor: usize) -> Sanitized {
    let mut cleaned = String::with_capacity(value.len());
    let mut seen_point = false;
    let mut removed_before_cursor = 0;

    for (i, c) in value.chars().enumerate() {
        let keep = match c {
            '0'..='9' => true,
            '-' => cleaned.is_empty(),
            '.' if !seen_point => {
                seen_point = true;
                true
            }
            _ => false,
        };
        if keep {
            cleaned.push(c);
        } else if i < cursor {
            removed_before_cursor += 1;
        }
    }

    let cursor = cursor.min(value.chars().count()) - removed_before_cursor;
    let complete = parse_number(&cleaned).is_some();
    Sanitized {
        value: cleaned,
        cursor,
        complete,
    }
}
