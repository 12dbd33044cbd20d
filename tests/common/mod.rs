#![allow(dead_code)]

use std::sync::Arc;

use quorum::{
    application::{
        context::{AppContext, Principal, RequestContext},
        repos::{PreferencesRepo, Repositories},
    },
    cache::{CacheConfig, CacheHandler},
    domain::{preferences::UserPreferenceUpdate, types::SubmissionType},
    infra::memory::MemoryRepositories,
};

pub const PASSWORD: &str = "correct horse battery staple";

/// In-memory application wired the way the binary wires Postgres.
pub struct Fixture {
    pub repos: Arc<MemoryRepositories>,
    pub cache: Arc<CacheHandler>,
    pub app: AppContext,
}

impl Fixture {
    pub async fn new() -> Self {
        let fixture = Self::bare(CacheConfig::default());
        fixture.repos.insert_badge("deleted", "Account Deleted").await;
        fixture
            .repos
            .insert_badge("deleted2", "Account Deleted")
            .await;
        fixture
    }

    /// No badges defined and a caller-supplied cache configuration.
    pub fn bare(config: CacheConfig) -> Self {
        let repos = Arc::new(MemoryRepositories::new());
        let cache = Arc::new(CacheHandler::new(config));
        let app = AppContext::new(
            Repositories::from_adapter(Arc::clone(&repos)),
            Arc::clone(&cache),
        );
        Self { repos, cache, app }
    }

    pub fn as_user(&self, user_name: &str) -> RequestContext {
        self.app.request(Principal::user(user_name))
    }

    pub fn anonymous(&self) -> RequestContext {
        self.app.anonymous()
    }
}

/// Ids of content seeded for one user.
pub struct SeededContent {
    pub submission: i64,
    pub comments: Vec<i64>,
    pub text_submission: i64,
    pub link_submission: i64,
}

/// Seeds an account with two comments, one text and one link submission,
/// plus a profile with bio and avatar.
pub async fn seed_user(fixture: &Fixture, user_name: &str) -> SeededContent {
    let repos = &fixture.repos;
    repos.insert_subverse("unit", "Unit testing").await;
    repos
        .insert_account(user_name, PASSWORD)
        .await
        .expect("seed account");

    let text_submission = repos
        .insert_submission("unit", user_name, SubmissionType::Text, "A text post")
        .await;
    let link_submission = repos
        .insert_submission("unit", user_name, SubmissionType::Link, "A link post")
        .await;
    let submission = repos
        .insert_submission("unit", "someone_else", SubmissionType::Text, "Host post")
        .await;
    let comments = vec![
        repos.insert_comment(submission, user_name, "first").await,
        repos.insert_comment(submission, user_name, "second").await,
    ];

    repos
        .update_preferences(
            user_name,
            &UserPreferenceUpdate {
                bio: Some(Some("I like tests".to_string())),
                avatar: Some(Some("avatar.png".to_string())),
                ..Default::default()
            },
        )
        .await
        .expect("seed preferences");

    SeededContent {
        submission,
        comments,
        text_submission,
        link_submission,
    }
}
