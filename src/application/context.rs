use std::sync::Arc;

use crate::{
    application::repos::Repositories,
    cache::CacheHandler,
    config::AccountSettings,
    domain::accounts::names_match,
};

/// Who is issuing a command or query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Principal {
    #[default]
    Anonymous,
    User(String),
}

impl Principal {
    pub fn user(name: impl Into<String>) -> Self {
        Self::User(name.into())
    }

    pub fn user_name(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::User(name) => Some(name.as_str()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::User(_))
    }

    /// Whether this principal is the account named `user_name`.
    pub fn is(&self, user_name: &str) -> bool {
        self.user_name()
            .is_some_and(|name| names_match(name, user_name))
    }
}

/// Rules applied when an account is deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPolicy {
    pub deletion_lockout: time::Duration,
    pub deleted_badge: String,
    pub deleted_with_recovery_badge: String,
}

impl Default for AccountPolicy {
    fn default() -> Self {
        Self {
            deletion_lockout: time::Duration::days(90),
            deleted_badge: "deleted".to_string(),
            deleted_with_recovery_badge: "deleted2".to_string(),
        }
    }
}

impl From<&AccountSettings> for AccountPolicy {
    fn from(settings: &AccountSettings) -> Self {
        Self {
            deletion_lockout: time::Duration::days(i64::from(settings.deletion_lockout_days)),
            deleted_badge: settings.deleted_badge.clone(),
            deleted_with_recovery_badge: settings.deleted_with_recovery_badge.clone(),
        }
    }
}

/// Process-wide services shared by every request.
#[derive(Clone)]
pub struct AppContext {
    pub repositories: Repositories,
    pub cache: Arc<CacheHandler>,
    pub accounts: AccountPolicy,
}

impl AppContext {
    pub fn new(repositories: Repositories, cache: Arc<CacheHandler>) -> Self {
        Self {
            repositories,
            cache,
            accounts: AccountPolicy::default(),
        }
    }

    pub fn with_account_policy(mut self, accounts: AccountPolicy) -> Self {
        self.accounts = accounts;
        self
    }

    pub fn request(&self, principal: Principal) -> RequestContext {
        RequestContext {
            app: self.clone(),
            principal,
        }
    }

    pub fn anonymous(&self) -> RequestContext {
        self.request(Principal::Anonymous)
    }
}

/// Execution context of a single command or query.
#[derive(Clone)]
pub struct RequestContext {
    app: AppContext,
    principal: Principal,
}

impl RequestContext {
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn repos(&self) -> &Repositories {
        &self.app.repositories
    }

    pub fn cache(&self) -> &CacheHandler {
        &self.app.cache
    }

    pub fn accounts(&self) -> &AccountPolicy {
        &self.app.accounts
    }
}
