//! In-process repository adapter.
//!
//! Backs the test suite and embedded use. A unit of work holds the write lock
//! for its whole lifetime and edits a staged copy of the state, which replaces
//! the live state on commit.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::{
    application::repos::{
        AccountsRepo, ContentRepo, PreferencesRepo, ProfileRepo, RepoError, SavesRepo,
        SubverseRepo, TransactionalRepo, UnitOfWork, UpdateAccountParams,
    },
    domain::{
        accounts::normalize_name,
        credentials::{CredentialError, PasswordHash},
        entities::{
            AccountRecord, BadgeRecord, CommentRecord, SubmissionRecord, SubverseModeratorRecord,
            SubverseRecord, UserBadgeRecord, UserPreferences,
        },
        preferences::UserPreferenceUpdate,
        types::{ContentType, SubmissionType},
    },
};

#[derive(Debug, Clone, Default)]
struct State {
    next_id: i64,
    subverses: BTreeMap<String, SubverseRecord>,
    accounts: BTreeMap<String, AccountRecord>,
    preferences: BTreeMap<String, UserPreferences>,
    comments: BTreeMap<i64, CommentRecord>,
    submissions: BTreeMap<i64, SubmissionRecord>,
    saves: BTreeSet<(String, ContentType, i64)>,
    badges: BTreeMap<String, BadgeRecord>,
    user_badges: BTreeMap<(String, String), OffsetDateTime>,
    moderators: Vec<SubverseModeratorRecord>,
}

impl State {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn owns(record_owner: &str, user_name: &str) -> bool {
        normalize_name(record_owner) == normalize_name(user_name)
    }

    fn mark_comments(&mut self, user_name: &str, mark: impl Fn(&mut CommentRecord)) -> u64 {
        let mut touched = 0;
        for comment in self.comments.values_mut() {
            if Self::owns(&comment.user_name, user_name) {
                mark(comment);
                touched += 1;
            }
        }
        touched
    }

    fn mark_submissions(
        &mut self,
        user_name: &str,
        submission_type: SubmissionType,
        mark: impl Fn(&mut SubmissionRecord),
    ) -> u64 {
        let mut touched = 0;
        for submission in self.submissions.values_mut() {
            if submission.submission_type == submission_type
                && Self::owns(&submission.user_name, user_name)
            {
                mark(submission);
                touched += 1;
            }
        }
        touched
    }
}

#[derive(Clone, Default)]
pub struct MemoryRepositories {
    state: Arc<RwLock<State>>,
}

impl MemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_subverse(&self, name: &str, title: &str) -> SubverseRecord {
        let mut state = self.state.write().await;
        let record = SubverseRecord {
            id: state.allocate_id(),
            name: name.to_string(),
            title: title.to_string(),
            description: None,
            side_bar: None,
            is_adult: false,
            is_private: false,
            subscriber_count: 0,
            created_by: None,
            creation_date: OffsetDateTime::now_utc(),
        };
        state.subverses.insert(normalize_name(name), record.clone());
        record
    }

    pub async fn insert_account(
        &self,
        user_name: &str,
        password: &str,
    ) -> Result<AccountRecord, CredentialError> {
        let record = AccountRecord {
            user_name: user_name.to_string(),
            email: Some(format!("{}@example.com", normalize_name(user_name))),
            lockout_end: None,
            password: PasswordHash::derive(password)?,
            registration_date: OffsetDateTime::now_utc(),
        };
        self.state
            .write()
            .await
            .accounts
            .insert(normalize_name(user_name), record.clone());
        Ok(record)
    }

    pub async fn insert_submission(
        &self,
        subverse: &str,
        user_name: &str,
        submission_type: SubmissionType,
        title: &str,
    ) -> i64 {
        let mut state = self.state.write().await;
        let id = state.allocate_id();
        let (content, url) = match submission_type {
            SubmissionType::Text => (Some(format!("{title} body")), None),
            SubmissionType::Link => (None, Some(format!("https://example.com/{id}"))),
        };
        state.submissions.insert(
            id,
            SubmissionRecord {
                id,
                subverse: subverse.to_string(),
                user_name: user_name.to_string(),
                submission_type,
                title: title.to_string(),
                content,
                url,
                is_deleted: false,
                is_anonymized: false,
            },
        );
        id
    }

    pub async fn insert_comment(&self, submission_id: i64, user_name: &str, content: &str) -> i64 {
        let mut state = self.state.write().await;
        let id = state.allocate_id();
        state.comments.insert(
            id,
            CommentRecord {
                id,
                submission_id,
                user_name: user_name.to_string(),
                content: content.to_string(),
                is_deleted: false,
                is_anonymized: false,
            },
        );
        id
    }

    pub async fn insert_badge(&self, id: &str, name: &str) {
        self.state.write().await.badges.insert(
            id.to_string(),
            BadgeRecord {
                id: id.to_string(),
                name: name.to_string(),
                graphic: format!("{id}.png"),
                title: name.to_string(),
            },
        );
    }

    pub async fn grant_badge(&self, user_name: &str, badge_id: &str) {
        self.state.write().await.user_badges.insert(
            (normalize_name(user_name), badge_id.to_string()),
            OffsetDateTime::now_utc(),
        );
    }

    pub async fn insert_moderator(&self, subverse: &str, user_name: &str, power: i32) {
        self.state
            .write()
            .await
            .moderators
            .push(SubverseModeratorRecord {
                subverse: subverse.to_string(),
                user_name: user_name.to_string(),
                power,
            });
    }
}

#[async_trait]
impl SubverseRepo for MemoryRepositories {
    async fn find_subverse(&self, name: &str) -> Result<Option<SubverseRecord>, RepoError> {
        Ok(self
            .state
            .read()
            .await
            .subverses
            .get(&normalize_name(name))
            .cloned())
    }
}

#[async_trait]
impl SavesRepo for MemoryRepositories {
    async fn list_saved(
        &self,
        user_name: &str,
        content_type: ContentType,
    ) -> Result<BTreeSet<i64>, RepoError> {
        let user = normalize_name(user_name);
        Ok(self
            .state
            .read()
            .await
            .saves
            .iter()
            .filter(|(owner, kind, _)| *owner == user && *kind == content_type)
            .map(|(_, _, id)| *id)
            .collect())
    }

    async fn toggle_saved(
        &self,
        user_name: &str,
        content_type: ContentType,
        content_id: i64,
    ) -> Result<bool, RepoError> {
        let entry = (normalize_name(user_name), content_type, content_id);
        let mut state = self.state.write().await;
        if state.saves.remove(&entry) {
            return Ok(false);
        }
        state.saves.insert(entry);
        Ok(true)
    }
}

#[async_trait]
impl ContentRepo for MemoryRepositories {
    async fn content_exists(
        &self,
        content_type: ContentType,
        content_id: i64,
    ) -> Result<bool, RepoError> {
        let state = self.state.read().await;
        Ok(match content_type {
            ContentType::Submission => state.submissions.contains_key(&content_id),
            ContentType::Comment => state.comments.contains_key(&content_id),
        })
    }

    async fn comments_by_user(&self, user_name: &str) -> Result<Vec<CommentRecord>, RepoError> {
        Ok(self
            .state
            .read()
            .await
            .comments
            .values()
            .filter(|comment| State::owns(&comment.user_name, user_name))
            .cloned()
            .collect())
    }

    async fn submissions_by_user(
        &self,
        user_name: &str,
    ) -> Result<Vec<SubmissionRecord>, RepoError> {
        Ok(self
            .state
            .read()
            .await
            .submissions
            .values()
            .filter(|submission| State::owns(&submission.user_name, user_name))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PreferencesRepo for MemoryRepositories {
    async fn find_preferences(
        &self,
        user_name: &str,
    ) -> Result<Option<UserPreferences>, RepoError> {
        Ok(self
            .state
            .read()
            .await
            .preferences
            .get(&normalize_name(user_name))
            .cloned())
    }

    async fn update_preferences(
        &self,
        user_name: &str,
        update: &UserPreferenceUpdate,
    ) -> Result<UserPreferences, RepoError> {
        let mut state = self.state.write().await;
        let prefs = state
            .preferences
            .entry(normalize_name(user_name))
            .or_insert_with(|| UserPreferences::defaults_for(user_name));
        update.apply(prefs);
        Ok(prefs.clone())
    }
}

#[async_trait]
impl AccountsRepo for MemoryRepositories {
    async fn find_account(&self, user_name: &str) -> Result<Option<AccountRecord>, RepoError> {
        Ok(self
            .state
            .read()
            .await
            .accounts
            .get(&normalize_name(user_name))
            .cloned())
    }
}

#[async_trait]
impl ProfileRepo for MemoryRepositories {
    async fn badges_for_user(&self, user_name: &str) -> Result<Vec<UserBadgeRecord>, RepoError> {
        let user = normalize_name(user_name);
        let state = self.state.read().await;
        Ok(state
            .user_badges
            .iter()
            .filter(|((owner, _), _)| *owner == user)
            .filter_map(|((_, badge_id), awarded_at)| {
                state.badges.get(badge_id).map(|badge| UserBadgeRecord {
                    badge: badge.clone(),
                    awarded_at: *awarded_at,
                })
            })
            .collect())
    }

    async fn moderated_subverses(
        &self,
        user_name: &str,
    ) -> Result<Vec<SubverseModeratorRecord>, RepoError> {
        Ok(self
            .state
            .read()
            .await
            .moderators
            .iter()
            .filter(|moderator| State::owns(&moderator.user_name, user_name))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TransactionalRepo for MemoryRepositories {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepoError> {
        let guard = Arc::clone(&self.state).write_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, staged }))
    }
}

struct MemoryUnitOfWork {
    guard: OwnedRwLockWriteGuard<State>,
    staged: State,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn lock_account(&mut self, user_name: &str) -> Result<Option<AccountRecord>, RepoError> {
        Ok(self
            .staged
            .accounts
            .get(&normalize_name(user_name))
            .cloned())
    }

    async fn delete_comments(&mut self, user_name: &str) -> Result<u64, RepoError> {
        Ok(self
            .staged
            .mark_comments(user_name, |comment| comment.is_deleted = true))
    }

    async fn anonymize_comments(&mut self, user_name: &str) -> Result<u64, RepoError> {
        Ok(self
            .staged
            .mark_comments(user_name, |comment| comment.is_anonymized = true))
    }

    async fn delete_submissions(
        &mut self,
        user_name: &str,
        submission_type: SubmissionType,
    ) -> Result<u64, RepoError> {
        Ok(self
            .staged
            .mark_submissions(user_name, submission_type, |submission| {
                submission.is_deleted = true
            }))
    }

    async fn anonymize_submissions(
        &mut self,
        user_name: &str,
        submission_type: SubmissionType,
    ) -> Result<u64, RepoError> {
        Ok(self
            .staged
            .mark_submissions(user_name, submission_type, |submission| {
                submission.is_anonymized = true
            }))
    }

    async fn clear_profile(&mut self, user_name: &str) -> Result<(), RepoError> {
        if let Some(prefs) = self.staged.preferences.get_mut(&normalize_name(user_name)) {
            prefs.bio = None;
            prefs.avatar = None;
        }
        Ok(())
    }

    async fn update_account(&mut self, params: UpdateAccountParams) -> Result<(), RepoError> {
        let account = self
            .staged
            .accounts
            .get_mut(&normalize_name(&params.user_name))
            .ok_or(RepoError::NotFound)?;
        account.email = params.email;
        account.lockout_end = params.lockout_end;
        account.password = params.password;
        Ok(())
    }

    async fn award_badge(&mut self, user_name: &str, badge_id: &str) -> Result<bool, RepoError> {
        if !self.staged.badges.contains_key(badge_id) {
            return Err(RepoError::InvalidInput {
                message: format!("badge `{badge_id}` is not defined"),
            });
        }
        let key = (normalize_name(user_name), badge_id.to_string());
        if self.staged.user_badges.contains_key(&key) {
            return Ok(false);
        }
        self.staged
            .user_badges
            .insert(key, OffsetDateTime::now_utc());
        Ok(true)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        let MemoryUnitOfWork { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn uncommitted_work_is_discarded() {
        let repos = MemoryRepositories::new();
        let submission = repos
            .insert_submission("news", "alice", SubmissionType::Text, "hello")
            .await;
        repos.insert_comment(submission, "alice", "first").await;

        {
            let mut uow = repos.begin().await.expect("begin");
            assert_eq!(uow.delete_comments("alice").await.expect("delete"), 1);
        }

        let comments = repos.comments_by_user("alice").await.expect("comments");
        assert!(!comments[0].is_deleted);
    }

    #[tokio::test]
    async fn committed_work_is_visible() {
        let repos = MemoryRepositories::new();
        repos
            .insert_submission("news", "Alice", SubmissionType::Link, "a link")
            .await;
        repos
            .insert_submission("news", "alice", SubmissionType::Text, "a post")
            .await;

        let mut uow = repos.begin().await.expect("begin");
        let touched = uow
            .anonymize_submissions("ALICE", SubmissionType::Link)
            .await
            .expect("anonymize");
        uow.commit().await.expect("commit");

        assert_eq!(touched, 1);
        let submissions = repos.submissions_by_user("alice").await.expect("list");
        let link = submissions
            .iter()
            .find(|s| s.submission_type == SubmissionType::Link)
            .expect("link");
        let text = submissions
            .iter()
            .find(|s| s.submission_type == SubmissionType::Text)
            .expect("text");
        assert!(link.is_anonymized);
        assert!(!text.is_anonymized);
    }

    #[tokio::test]
    async fn awarding_requires_a_defined_badge_and_is_idempotent() {
        let repos = MemoryRepositories::new();
        let mut uow = repos.begin().await.expect("begin");
        assert!(matches!(
            uow.award_badge("alice", "deleted").await,
            Err(RepoError::InvalidInput { .. })
        ));
        drop(uow);

        repos.insert_badge("deleted", "Deleted").await;
        let mut uow = repos.begin().await.expect("begin");
        assert!(uow.award_badge("alice", "deleted").await.expect("award"));
        assert!(!uow.award_badge("Alice", "deleted").await.expect("award"));
        uow.commit().await.expect("commit");

        assert_eq!(repos.badges_for_user("alice").await.expect("badges").len(), 1);
    }

    #[tokio::test]
    async fn saves_are_per_user_and_type() {
        let repos = MemoryRepositories::new();
        assert!(
            repos
                .toggle_saved("alice", ContentType::Comment, 5)
                .await
                .expect("save")
        );

        assert_eq!(
            repos
                .list_saved("ALICE", ContentType::Comment)
                .await
                .expect("list"),
            BTreeSet::from([5])
        );
        assert!(
            repos
                .list_saved("alice", ContentType::Submission)
                .await
                .expect("list")
                .is_empty()
        );
        assert!(
            repos
                .list_saved("bob", ContentType::Comment)
                .await
                .expect("list")
                .is_empty()
        );
    }

    #[tokio::test]
    async fn toggling_twice_restores_the_original_state() {
        let repos = MemoryRepositories::new();
        assert!(
            repos
                .toggle_saved("alice", ContentType::Submission, 9)
                .await
                .expect("save")
        );
        assert!(
            !repos
                .toggle_saved("ALICE", ContentType::Submission, 9)
                .await
                .expect("unsave")
        );
        assert!(
            repos
                .list_saved("alice", ContentType::Submission)
                .await
                .expect("list")
                .is_empty()
        );
    }
}
