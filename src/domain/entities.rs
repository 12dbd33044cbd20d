//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::credentials::PasswordHash;
use crate::domain::types::SubmissionType;

/// Community ("subverse") metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubverseRecord {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub side_bar: Option<String>,
    pub is_adult: bool,
    pub is_private: bool,
    pub subscriber_count: i64,
    pub created_by: Option<String>,
    pub creation_date: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserPreferences {
    pub user_name: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub language: String,
    pub night_mode: bool,
    pub open_in_new_window: bool,
    pub enable_adult_content: bool,
    pub display_subscriptions: bool,
}

impl UserPreferences {
    /// Preferences applied to a user who never saved any.
    pub fn defaults_for(user_name: &str) -> Self {
        Self {
            user_name: user_name.to_string(),
            bio: None,
            avatar: None,
            language: "en".to_string(),
            night_mode: false,
            open_in_new_window: false,
            enable_adult_content: false,
            display_subscriptions: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountRecord {
    pub user_name: String,
    pub email: Option<String>,
    pub lockout_end: Option<OffsetDateTime>,
    pub password: PasswordHash,
    pub registration_date: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentRecord {
    pub id: i64,
    pub submission_id: i64,
    pub user_name: String,
    pub content: String,
    pub is_deleted: bool,
    pub is_anonymized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionRecord {
    pub id: i64,
    pub subverse: String,
    pub user_name: String,
    pub submission_type: SubmissionType,
    pub title: String,
    pub content: Option<String>,
    pub url: Option<String>,
    pub is_deleted: bool,
    pub is_anonymized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeRecord {
    pub id: String,
    pub name: String,
    pub graphic: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserBadgeRecord {
    pub badge: BadgeRecord,
    pub awarded_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubverseModeratorRecord {
    pub subverse: String,
    pub user_name: String,
    pub power: i32,
}

/// Public profile summary for a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserInformation {
    pub user_name: String,
    pub registration_date: OffsetDateTime,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub badges: Vec<UserBadgeRecord>,
    pub moderates: Vec<SubverseModeratorRecord>,
    /// When this summary was assembled.
    pub generation_date: OffsetDateTime,
}
