use crate::domain::errors::ValidationError;

/// Identifier of the account (tenant) whose keys live under `<id>/` in a
/// shared bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountId(String);

impl AccountId {
    const MAX_LEN: usize = 128;

    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::EmptyAccountId);
        }

        if value.len() > Self::MAX_LEN {
            return Err(ValidationError::AccountIdTooLong {
                actual: value.len(),
                max: Self::MAX_LEN,
            });
        }

        // '/' would let one account reach into another's key space
        if let Some(c) = value.chars().find(|c| *c == '/' || c.is_control()) {
            return Err(ValidationError::InvalidAccountIdCharacter(c));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key prefix of this account inside a shared bucket
    pub fn key_prefix(&self) -> String {
        format!("{}/", self.0)
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for AccountId {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        AccountId::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_account_id() {
        let id = AccountId::new("account1").unwrap();
        assert_eq!(id.as_str(), "account1");
        assert_eq!(id.key_prefix(), "account1/");
    }

    #[test]
    fn test_invalid_account_id() {
        assert_eq!(AccountId::new(""), Err(ValidationError::EmptyAccountId));
        assert_eq!(
            AccountId::new("a/b"),
            Err(ValidationError::InvalidAccountIdCharacter('/'))
        );
        assert!(matches!(
            AccountId::new("x".repeat(129)),
            Err(ValidationError::AccountIdTooLong { actual: 129, max: 128 })
        ));
    }
}
