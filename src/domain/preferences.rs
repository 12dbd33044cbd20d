//! Partial updates to a user's preference record.

use serde::{Deserialize, Deserializer};

use crate::domain::entities::UserPreferences;

pub const BIO_MAX_LEN: usize = 100;
pub const AVATAR_MAX_LEN: usize = 50;

/// A sparse preference change.
///
/// `None` leaves a field untouched. For nullable fields `Some(None)` clears the
/// stored value, which is how an explicit JSON `null` deserializes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserPreferenceUpdate {
    #[serde(deserialize_with = "present")]
    pub bio: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub avatar: Option<Option<String>>,
    pub language: Option<String>,
    pub night_mode: Option<bool>,
    pub open_in_new_window: Option<bool>,
    pub enable_adult_content: Option<bool>,
    pub display_subscriptions: Option<bool>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UserPreferenceUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply(&self, target: &mut UserPreferences) {
        if let Some(bio) = &self.bio {
            target.bio = bio.clone();
        }
        if let Some(avatar) = &self.avatar {
            target.avatar = avatar.clone();
        }
        if let Some(language) = &self.language {
            target.language = language.clone();
        }
        if let Some(value) = self.night_mode {
            target.night_mode = value;
        }
        if let Some(value) = self.open_in_new_window {
            target.open_in_new_window = value;
        }
        if let Some(value) = self.enable_adult_content {
            target.enable_adult_content = value;
        }
        if let Some(value) = self.display_subscriptions {
            target.display_subscriptions = value;
        }
    }
}
