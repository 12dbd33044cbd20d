use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::{
        context::RequestContext,
        query::{CacheableQuery, Query},
        repos::RepoError,
    },
    cache::{CachePolicy, CachingKey},
    domain::entities::UserInformation,
};

const POLICY: CachePolicy = CachePolicy::minutes(5, 1);

/// Public profile summary; `None` for unknown users.
#[derive(Debug, Clone)]
pub struct QueryUserInformation {
    user_name: String,
}

impl QueryUserInformation {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
        }
    }
}

#[async_trait]
impl Query for QueryUserInformation {
    type Output = Option<UserInformation>;

    async fn fetch(&self, ctx: &RequestContext) -> Result<Self::Output, RepoError> {
        let repos = ctx.repos();
        let Some(account) = repos.accounts.find_account(self.user_name.trim()).await? else {
            return Ok(None);
        };

        let preferences = repos.preferences.find_preferences(&account.user_name).await?;
        let badges = repos.profiles.badges_for_user(&account.user_name).await?;
        let moderates = repos
            .profiles
            .moderated_subverses(&account.user_name)
            .await?;
        let (bio, profile_picture) = preferences
            .map(|prefs| (prefs.bio, prefs.avatar))
            .unwrap_or_default();

        Ok(Some(UserInformation {
            user_name: account.user_name,
            registration_date: account.registration_date,
            bio,
            profile_picture,
            badges,
            moderates,
            generation_date: OffsetDateTime::now_utc(),
        }))
    }
}

impl CacheableQuery for QueryUserInformation {
    fn cache_key(&self, _ctx: &RequestContext) -> Option<String> {
        Some(CachingKey::user_information(&self.user_name))
    }

    fn policy(&self) -> CachePolicy {
        POLICY
    }

    fn should_cache(&self, output: &Self::Output) -> bool {
        output.is_some()
    }
}
