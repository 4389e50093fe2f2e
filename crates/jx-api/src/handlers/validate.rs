//! Field checks shared by the mutating handlers. Limits mirror the column
//! widths in `jx_core::schema`.

use crate::error::ApiError;

/// A required text field: non-blank and within its column.
pub fn required_within(value: &str, max_chars: usize, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{field} must not be empty")));
    }

    within(value, max_chars, field)
}

/// An optional text field: within its column when present.
pub fn optional_within(
    value: Option<&String>,
    max_chars: usize,
    field: &str,
) -> Result<(), ApiError> {
    match value {
        Some(value) => within(value, max_chars, field),
        None => Ok(()),
    }
}

fn within(value: &str, max_chars: usize, field: &str) -> Result<(), ApiError> {
    if value.chars().count() > max_chars {
        return Err(ApiError::BadRequest(format!(
            "{field} must be at most {max_chars} characters"
        )));
    }

    Ok(())
}
