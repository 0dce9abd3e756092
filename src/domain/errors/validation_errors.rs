/// Validation errors for domain value objects
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyAccountId,
    AccountIdTooLong { actual: usize, max: usize },
    InvalidAccountIdCharacter(char),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyAccountId => write!(f, "Account ID cannot be empty"),
            ValidationError::AccountIdTooLong { actual, max } => {
                write!(
                    f,
                    "Account ID too long: {} characters (max: {})",
                    actual, max
                )
            }
            ValidationError::InvalidAccountIdCharacter(c) => {
                write!(f, "Invalid character in account ID: '{}'", c)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ValidationError::EmptyAccountId.to_string(),
            "Account ID cannot be empty"
        );
        assert_eq!(
            ValidationError::AccountIdTooLong { actual: 70, max: 64 }.to_string(),
            "Account ID too long: 70 characters (max: 64)"
        );
        assert_eq!(
            ValidationError::InvalidAccountIdCharacter('/').to_string(),
            "Invalid character in account ID: '/'"
        );
    }
}
