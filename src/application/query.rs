//! Read-side contract and the caching decorator.

use async_trait::async_trait;
use tracing::debug;

use crate::{
    application::{context::RequestContext, repos::RepoError},
    cache::CachePolicy,
};

/// A side-effect free read.
#[async_trait]
pub trait Query: Send + Sync {
    type Output: Clone + Send + Sync + 'static;

    async fn fetch(&self, ctx: &RequestContext) -> Result<Self::Output, RepoError>;
}

/// A query whose result may be memoized.
pub trait CacheableQuery: Query + Sized {
    /// Key of the result for this request; `None` bypasses the cache.
    fn cache_key(&self, ctx: &RequestContext) -> Option<String>;

    fn policy(&self) -> CachePolicy;

    fn should_cache(&self, _output: &Self::Output) -> bool {
        true
    }

    fn cached(self) -> CachedQuery<Self> {
        CachedQuery::new(self)
    }
}

/// Serves a query from the cache, fetching and storing on a miss.
///
/// Fetch errors are returned as-is and leave the cache untouched.
pub struct CachedQuery<Q> {
    inner: Q,
}

impl<Q: CacheableQuery> CachedQuery<Q> {
    pub fn new(inner: Q) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &Q {
        &self.inner
    }

    pub async fn execute(&self, ctx: &RequestContext) -> Result<Q::Output, RepoError> {
        let Some(key) = self.inner.cache_key(ctx) else {
            return self.inner.fetch(ctx).await;
        };

        if let Some(hit) = ctx.cache().get::<Q::Output>(&key) {
            debug!(key = %key, "Query served from cache");
            return Ok(hit);
        }

        let value = self.inner.fetch(ctx).await?;
        if self.inner.should_cache(&value) {
            ctx.cache().set(key, value.clone(), self.inner.policy());
        }
        Ok(value)
    }
}

#[async_trait]
impl<Q: CacheableQuery> Query for CachedQuery<Q> {
    type Output = Q::Output;

    async fn fetch(&self, ctx: &RequestContext) -> Result<Self::Output, RepoError> {
        self.execute(ctx).await
    }
}
