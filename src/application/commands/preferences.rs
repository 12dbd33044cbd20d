use async_trait::async_trait;
use tracing::info;

use crate::{
    application::{
        command::{Command, CommandFailure},
        context::RequestContext,
    },
    cache::CachingKey,
    domain::{
        entities::UserPreferences,
        error::{ensure_max_len, ensure_non_empty},
        preferences::{AVATAR_MAX_LEN, BIO_MAX_LEN, UserPreferenceUpdate},
    },
};

use super::require_user;

/// Applies a partial preference update for the current principal.
#[derive(Debug, Clone)]
pub struct UpdateUserPreferencesCommand {
    update: UserPreferenceUpdate,
}

impl UpdateUserPreferencesCommand {
    pub fn new(update: UserPreferenceUpdate) -> Self {
        Self { update }
    }
}

#[async_trait]
impl Command for UpdateUserPreferencesCommand {
    type Output = UserPreferences;

    const NAME: &'static str = "update_user_preferences";

    async fn validate(&self, ctx: &RequestContext) -> Result<(), CommandFailure> {
        require_user(ctx)?;
        if let Some(Some(bio)) = &self.update.bio {
            ensure_max_len(bio, BIO_MAX_LEN, "bio")?;
        }
        if let Some(Some(avatar)) = &self.update.avatar {
            ensure_max_len(avatar, AVATAR_MAX_LEN, "avatar")?;
        }
        if let Some(language) = &self.update.language {
            ensure_non_empty(language, "language")?;
        }
        Ok(())
    }

    async fn apply(self, ctx: &RequestContext) -> Result<Self::Output, CommandFailure> {
        let user_name = require_user(ctx)?;
        let updated = ctx
            .repos()
            .preferences
            .update_preferences(&user_name, &self.update)
            .await?;

        ctx.cache().remove(&CachingKey::user_preferences(&user_name));
        ctx.cache().remove(&CachingKey::user_information(&user_name));
        info!(user = %user_name, "User preferences updated");
        Ok(updated)
    }
}
