//! Validation error types and shared field checks

use std::fmt;

/// Validation error for restaurant input
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Text field is empty (or only whitespace)
    Empty { field: &'static str },

    /// Field was sent as `null` but the column is required
    Null { field: &'static str },

    /// String doesn't match required format (e.g., email)
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Numeric field outside its closed range
    OutOfRange { field: &'static str, min: f64, max: f64 },

    /// Floating point field is NaN or infinite
    NotFinite { field: &'static str },

    /// A single row of a bulk request failed validation
    Row { index: usize, source: Box<ValidationError> },
}

impl ValidationError {
    /// Wrap an error with the index of the bulk row that produced it.
    pub fn at_row(self, index: usize) -> Self {
        Self::Row {
            index,
            source: Box::new(self),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::Null { field } => write!(f, "{} cannot be null", field),
            Self::InvalidFormat { field, reason } => write!(f, "{}: {}", field, reason),
            Self::OutOfRange { field, min, max } => {
                write!(f, "{} must be between {} and {}", field, min, max)
            }
            Self::NotFinite { field } => write!(f, "{} must be a finite number", field),
            Self::Row { index, source } => write!(f, "row {}: {}", index, source),
        }
    }
}

impl std::error::Error for ValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Row { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Reject empty or whitespace-only text.
pub fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(())
}

/// Reject non-finite values and values outside `[min, max]`.
pub fn require_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }
    if value < min || value > max {
        return Err(ValidationError::OutOfRange { field, min, max });
    }
    Ok(())
}
