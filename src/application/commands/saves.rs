use async_trait::async_trait;
use tracing::info;

use crate::{
    application::{
        command::{Command, CommandFailure},
        context::RequestContext,
    },
    cache::CachingKey,
    domain::{error::DomainError, types::ContentType},
};

use super::require_user;

/// Toggles whether the current principal has saved an item.
///
/// The payload is the state after the toggle: `true` when the item is now
/// saved.
#[derive(Debug, Clone, Copy)]
pub struct SaveCommand {
    content_type: ContentType,
    content_id: i64,
}

impl SaveCommand {
    pub fn new(content_type: ContentType, content_id: i64) -> Self {
        Self {
            content_type,
            content_id,
        }
    }
}

#[async_trait]
impl Command for SaveCommand {
    type Output = bool;

    const NAME: &'static str = "save";

    async fn validate(&self, ctx: &RequestContext) -> Result<(), CommandFailure> {
        require_user(ctx)?;
        let exists = ctx
            .repos()
            .content
            .content_exists(self.content_type, self.content_id)
            .await?;
        if !exists {
            let entity = match self.content_type {
                ContentType::Submission => "submission",
                ContentType::Comment => "comment",
            };
            return Err(DomainError::not_found(entity).into());
        }
        Ok(())
    }

    async fn apply(self, ctx: &RequestContext) -> Result<Self::Output, CommandFailure> {
        let user_name = require_user(ctx)?;
        let saved = ctx
            .repos()
            .saves
            .toggle_saved(&user_name, self.content_type, self.content_id)
            .await?;

        ctx.cache()
            .remove(&CachingKey::user_saved_items(self.content_type, &user_name));
        info!(
            user = %user_name,
            content_type = %self.content_type,
            content_id = self.content_id,
            saved,
            "Save toggled"
        );
        Ok(saved)
    }
}
