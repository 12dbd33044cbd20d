use async_trait::async_trait;

use crate::{
    application::{
        context::RequestContext,
        query::{CacheableQuery, Query},
        repos::RepoError,
    },
    cache::{CachePolicy, CachingKey},
    domain::entities::SubverseRecord,
};

const POLICY: CachePolicy = CachePolicy::minutes(30, 2);

/// Subverse metadata by name; unknown names are not cached.
#[derive(Debug, Clone)]
pub struct QuerySubverse {
    name: String,
}

impl QuerySubverse {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Query for QuerySubverse {
    type Output = Option<SubverseRecord>;

    async fn fetch(&self, ctx: &RequestContext) -> Result<Self::Output, RepoError> {
        ctx.repos().subverses.find_subverse(self.name.trim()).await
    }
}

impl CacheableQuery for QuerySubverse {
    fn cache_key(&self, _ctx: &RequestContext) -> Option<String> {
        Some(CachingKey::subverse(&self.name))
    }

    fn policy(&self) -> CachePolicy {
        POLICY
    }

    fn should_cache(&self, output: &Self::Output) -> bool {
        output.is_some()
    }
}
