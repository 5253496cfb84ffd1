//! Shape validation for stage inputs.

use super::error::ValidationError;

/// Reject empty or whitespace-only required fields.
pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_non_empty() {
        assert!(require("id", "b1").is_ok());
    }

    #[test]
    fn rejects_blank() {
        assert_eq!(
            require("id", "   "),
            Err(ValidationError::EmptyField { field: "id" })
        );
        assert_eq!(
            require("name", ""),
            Err(ValidationError::EmptyField { field: "name" })
        );
    }
}
