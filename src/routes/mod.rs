pub mod categories;
pub mod events;
pub mod statistics;
pub mod tags;
pub mod users;

use crate::error::AppError;

/// Reject `value` unless it is `min..=max` characters long.
pub(crate) fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), AppError> {
    let len = value.chars().count();
    if len < min {
        return Err(AppError::Validation(format!(
            "\"{field}\" length must be at least {min} characters long"
        )));
    }
    if len > max {
        return Err(AppError::Validation(format!(
            "\"{field}\" length must be less than or equal to {max} characters long"
        )));
    }
    Ok(())
}

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_length_counts_characters() {
        assert!(check_length("name", "héllo", 5, 30).is_ok());
        assert!(check_length("name", "abcd", 5, 30).is_err());
        assert!(check_length("name", &"x".repeat(31), 5, 30).is_err());
    }

    #[test]
    fn check_length_names_the_field() {
        let Err(AppError::Validation(msg)) = check_length("password", "short", 8, 500) else {
            panic!("expected a validation error");
        };
        assert!(msg.contains("\"password\""));
    }
}
