use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::{
    application::{
        context::RequestContext,
        query::{CacheableQuery, Query},
        repos::RepoError,
    },
    cache::{CachePolicy, CachingKey},
    domain::types::ContentType,
};

const POLICY: CachePolicy = CachePolicy::minutes(10, 2);

/// Ids of the content the current principal has saved.
///
/// Anonymous callers get an empty set that is never cached.
#[derive(Debug, Clone, Copy)]
pub struct QueryUserSaves {
    content_type: ContentType,
}

impl QueryUserSaves {
    pub fn new(content_type: ContentType) -> Self {
        Self { content_type }
    }
}

#[async_trait]
impl Query for QueryUserSaves {
    type Output = BTreeSet<i64>;

    async fn fetch(&self, ctx: &RequestContext) -> Result<Self::Output, RepoError> {
        match ctx.principal().user_name() {
            Some(user_name) => {
                ctx.repos()
                    .saves
                    .list_saved(user_name, self.content_type)
                    .await
            }
            None => Ok(BTreeSet::new()),
        }
    }
}

impl CacheableQuery for QueryUserSaves {
    fn cache_key(&self, ctx: &RequestContext) -> Option<String> {
        ctx.principal()
            .user_name()
            .map(|user_name| CachingKey::user_saved_items(self.content_type, user_name))
    }

    fn policy(&self) -> CachePolicy {
        POLICY
    }
}

/// Whether the current principal has saved the given item.
pub async fn is_saved(
    ctx: &RequestContext,
    content_type: ContentType,
    content_id: i64,
) -> Result<bool, RepoError> {
    if !ctx.principal().is_authenticated() {
        return Ok(false);
    }
    let saved = QueryUserSaves::new(content_type).cached().execute(ctx).await?;
    Ok(saved.contains(&content_id))
}
