//! Repository traits describing persistence adapters.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::credentials::PasswordHash;
use crate::domain::entities::{
    AccountRecord, CommentRecord, SubmissionRecord, SubverseModeratorRecord, SubverseRecord,
    UserBadgeRecord, UserPreferences,
};
use crate::domain::preferences::UserPreferenceUpdate;
use crate::domain::types::{ContentType, SubmissionType};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[async_trait]
pub trait SubverseRepo: Send + Sync {
    async fn find_subverse(&self, name: &str) -> Result<Option<SubverseRecord>, RepoError>;
}

#[async_trait]
pub trait SavesRepo: Send + Sync {
    async fn list_saved(
        &self,
        user_name: &str,
        content_type: ContentType,
    ) -> Result<BTreeSet<i64>, RepoError>;

    /// Saves the item when it is not saved and unsaves it otherwise, as one
    /// atomic step. Returns the new state.
    async fn toggle_saved(
        &self,
        user_name: &str,
        content_type: ContentType,
        content_id: i64,
    ) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait ContentRepo: Send + Sync {
    async fn content_exists(
        &self,
        content_type: ContentType,
        content_id: i64,
    ) -> Result<bool, RepoError>;

    async fn comments_by_user(&self, user_name: &str) -> Result<Vec<CommentRecord>, RepoError>;

    async fn submissions_by_user(
        &self,
        user_name: &str,
    ) -> Result<Vec<SubmissionRecord>, RepoError>;
}

#[async_trait]
pub trait PreferencesRepo: Send + Sync {
    async fn find_preferences(&self, user_name: &str)
    -> Result<Option<UserPreferences>, RepoError>;

    /// Applies `update`, creating the preference row from defaults if needed.
    async fn update_preferences(
        &self,
        user_name: &str,
        update: &UserPreferenceUpdate,
    ) -> Result<UserPreferences, RepoError>;
}

#[async_trait]
pub trait AccountsRepo: Send + Sync {
    async fn find_account(&self, user_name: &str) -> Result<Option<AccountRecord>, RepoError>;
}

#[async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn badges_for_user(&self, user_name: &str) -> Result<Vec<UserBadgeRecord>, RepoError>;

    async fn moderated_subverses(
        &self,
        user_name: &str,
    ) -> Result<Vec<SubverseModeratorRecord>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct UpdateAccountParams {
    pub user_name: String,
    pub email: Option<String>,
    pub lockout_end: Option<OffsetDateTime>,
    pub password: PasswordHash,
}

/// Write scope spanning several tables.
///
/// Nothing is visible to other readers until [`UnitOfWork::commit`]; dropping
/// the unit without committing discards every change made through it.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Reads the account and holds it against concurrent writers until the
    /// unit ends.
    async fn lock_account(&mut self, user_name: &str) -> Result<Option<AccountRecord>, RepoError>;

    async fn delete_comments(&mut self, user_name: &str) -> Result<u64, RepoError>;

    async fn anonymize_comments(&mut self, user_name: &str) -> Result<u64, RepoError>;

    async fn delete_submissions(
        &mut self,
        user_name: &str,
        submission_type: SubmissionType,
    ) -> Result<u64, RepoError>;

    async fn anonymize_submissions(
        &mut self,
        user_name: &str,
        submission_type: SubmissionType,
    ) -> Result<u64, RepoError>;

    /// Clears bio and avatar.
    async fn clear_profile(&mut self, user_name: &str) -> Result<(), RepoError>;

    async fn update_account(&mut self, params: UpdateAccountParams) -> Result<(), RepoError>;

    /// Returns false when the user already held the badge.
    async fn award_badge(&mut self, user_name: &str, badge_id: &str) -> Result<bool, RepoError>;

    async fn commit(self: Box<Self>) -> Result<(), RepoError>;
}

#[async_trait]
pub trait TransactionalRepo: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepoError>;
}

/// Every repository a command or query may reach, behind trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub subverses: Arc<dyn SubverseRepo>,
    pub saves: Arc<dyn SavesRepo>,
    pub content: Arc<dyn ContentRepo>,
    pub preferences: Arc<dyn PreferencesRepo>,
    pub accounts: Arc<dyn AccountsRepo>,
    pub profiles: Arc<dyn ProfileRepo>,
    pub transactions: Arc<dyn TransactionalRepo>,
}

impl Repositories {
    /// Wires every role to one adapter implementing all of them.
    pub fn from_adapter<R>(adapter: Arc<R>) -> Self
    where
        R: SubverseRepo
            + SavesRepo
            + ContentRepo
            + PreferencesRepo
            + AccountsRepo
            + ProfileRepo
            + TransactionalRepo
            + 'static,
    {
        Self {
            subverses: adapter.clone(),
            saves: adapter.clone(),
            content: adapter.clone(),
            preferences: adapter.clone(),
            accounts: adapter.clone(),
            profiles: adapter.clone(),
            transactions: adapter,
        }
    }

    pub async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepoError> {
        self.transactions.begin().await
    }
}
