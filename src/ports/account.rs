use crate::domain::value_objects::AccountId;

/// Port resolving the account a request acts for.
///
/// Resolved on every call, so one bucket handle can serve many tenants when
/// the implementation reads request-scoped state.
pub trait AccountContext: Send + Sync + 'static {
    fn current_account(&self) -> AccountId;
}

/// Always answers with the same account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticAccountContext {
    account: AccountId,
}

impl StaticAccountContext {
    pub fn new(account: AccountId) -> Self {
        Self { account }
    }
}

impl AccountContext for StaticAccountContext {
    fn current_account(&self) -> AccountId {
        self.account.clone()
    }
}
