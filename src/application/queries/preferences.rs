use async_trait::async_trait;

use crate::{
    application::{
        context::RequestContext,
        query::{CacheableQuery, Query},
        repos::RepoError,
    },
    cache::{CachePolicy, CachingKey},
    domain::entities::UserPreferences,
};

const POLICY: CachePolicy = CachePolicy::minutes(5, 1);

/// A user's preferences, falling back to defaults when none were stored.
#[derive(Debug, Clone)]
pub struct QueryUserPreferences {
    user_name: String,
}

impl QueryUserPreferences {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
        }
    }
}

#[async_trait]
impl Query for QueryUserPreferences {
    type Output = UserPreferences;

    async fn fetch(&self, ctx: &RequestContext) -> Result<Self::Output, RepoError> {
        let user_name = self.user_name.trim();
        let stored = ctx.repos().preferences.find_preferences(user_name).await?;
        Ok(stored.unwrap_or_else(|| UserPreferences::defaults_for(user_name)))
    }
}

impl CacheableQuery for QueryUserPreferences {
    fn cache_key(&self, _ctx: &RequestContext) -> Option<String> {
        Some(CachingKey::user_preferences(&self.user_name))
    }

    fn policy(&self) -> CachePolicy {
        POLICY
    }
}
