//! Error kinds raised by the projection engine.

use thiserror::Error;

/// Validation failures of the projection engine.
///
/// Every engine call validates its own arguments and fails fast with one of
/// these; no partial grids or rows are ever returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Invalid rate: {0}")]
    InvalidRate(String),

    /// Non-fatal: callers leave the ratio field empty instead of raising it.
    #[error("Undefined ratio: reference market cap is zero")]
    UndefinedRatio,
}

pub type Result<T> = std::result::Result<T, ProjectionError>;

/// Ratio of `value` to `reference`, undefined when the reference is zero.
pub fn ratio(value: f64, reference: f64) -> Result<f64> {
    if reference == 0.0 {
        return Err(ProjectionError::UndefinedRatio);
    }
    Ok(value / reference)
}

/// Checks that a rate is usable for currency conversion.
pub fn validate_rate(rate: f64) -> Result<()> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(ProjectionError::InvalidRate(format!(
            "rate must be a finite number greater than zero, got {rate}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_with_zero_reference_is_undefined() {
        assert_eq!(ratio(10.0, 0.0), Err(ProjectionError::UndefinedRatio));
        assert_eq!(ratio(10.0, 4.0), Ok(2.5));
    }

    #[test]
    fn test_validate_rate() {
        assert!(validate_rate(0.92).is_ok());
        assert!(matches!(validate_rate(0.0), Err(ProjectionError::InvalidRate(_))));
        assert!(matches!(validate_rate(-1.0), Err(ProjectionError::InvalidRate(_))));
        assert!(matches!(
            validate_rate(f64::NAN),
            Err(ProjectionError::InvalidRate(_))
        ));
        assert!(matches!(
            validate_rate(f64::INFINITY),
            Err(ProjectionError::InvalidRate(_))
        ));
    }
}
