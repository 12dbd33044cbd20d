use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{AccountsRepo, PreferencesRepo, ProfileRepo, RepoError},
    domain::{
        credentials::PasswordHash,
        entities::{
            AccountRecord, BadgeRecord, SubverseModeratorRecord, UserBadgeRecord, UserPreferences,
        },
        preferences::UserPreferenceUpdate,
    },
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
pub(super) struct AccountRow {
    user_name: String,
    email: Option<String>,
    lockout_end: Option<OffsetDateTime>,
    password_hash: String,
    registration_date: OffsetDateTime,
}

impl From<AccountRow> for AccountRecord {
    fn from(row: AccountRow) -> Self {
        Self {
            user_name: row.user_name,
            email: row.email,
            lockout_end: row.lockout_end,
            password: PasswordHash::from_phc(row.password_hash),
            registration_date: row.registration_date,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PreferencesRow {
    user_name: String,
    bio: Option<String>,
    avatar: Option<String>,
    language: String,
    night_mode: bool,
    open_in_new_window: bool,
    enable_adult_content: bool,
    display_subscriptions: bool,
}

impl From<PreferencesRow> for UserPreferences {
    fn from(row: PreferencesRow) -> Self {
        Self {
            user_name: row.user_name,
            bio: row.bio,
            avatar: row.avatar,
            language: row.language,
            night_mode: row.night_mode,
            open_in_new_window: row.open_in_new_window,
            enable_adult_content: row.enable_adult_content,
            display_subscriptions: row.display_subscriptions,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserBadgeRow {
    id: String,
    name: String,
    graphic: String,
    title: String,
    awarded_at: OffsetDateTime,
}

#[derive(sqlx::FromRow)]
struct ModeratorRow {
    subverse: String,
    user_name: String,
    power: i32,
}

const PREFERENCES_COLUMNS: &str = "user_name, bio, avatar, language, night_mode, \
    open_in_new_window, enable_adult_content, display_subscriptions";

#[async_trait]
impl AccountsRepo for PostgresRepositories {
    async fn find_account(&self, user_name: &str) -> Result<Option<AccountRecord>, RepoError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT user_name, email, lockout_end, password_hash, registration_date
            FROM accounts
            WHERE LOWER(user_name) = LOWER($1)
            "#,
        )
        .bind(user_name)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(AccountRecord::from))
    }
}

#[async_trait]
impl PreferencesRepo for PostgresRepositories {
    async fn find_preferences(
        &self,
        user_name: &str,
    ) -> Result<Option<UserPreferences>, RepoError> {
        let sql = format!(
            "SELECT {PREFERENCES_COLUMNS} FROM user_preferences WHERE LOWER(user_name) = LOWER($1)"
        );
        let row = sqlx::query_as::<_, PreferencesRow>(&sql)
            .bind(user_name)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(UserPreferences::from))
    }

    async fn update_preferences(
        &self,
        user_name: &str,
        update: &UserPreferenceUpdate,
    ) -> Result<UserPreferences, RepoError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        let select = format!(
            "SELECT {PREFERENCES_COLUMNS} FROM user_preferences \
             WHERE LOWER(user_name) = LOWER($1) FOR UPDATE"
        );
        let mut prefs = sqlx::query_as::<_, PreferencesRow>(&select)
            .bind(user_name)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .map(UserPreferences::from)
            .unwrap_or_else(|| UserPreferences::defaults_for(user_name));
        update.apply(&mut prefs);

        let upsert = format!(
            r#"
            INSERT INTO user_preferences ({PREFERENCES_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT ((LOWER(user_name))) DO UPDATE SET
                bio = EXCLUDED.bio,
                avatar = EXCLUDED.avatar,
                language = EXCLUDED.language,
                night_mode = EXCLUDED.night_mode,
                open_in_new_window = EXCLUDED.open_in_new_window,
                enable_adult_content = EXCLUDED.enable_adult_content,
                display_subscriptions = EXCLUDED.display_subscriptions
            RETURNING {PREFERENCES_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PreferencesRow>(&upsert)
            .bind(&prefs.user_name)
            .bind(&prefs.bio)
            .bind(&prefs.avatar)
            .bind(&prefs.language)
            .bind(prefs.night_mode)
            .bind(prefs.open_in_new_window)
            .bind(prefs.enable_adult_content)
            .bind(prefs.display_subscriptions)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(row.into())
    }
}

#[async_trait]
impl ProfileRepo for PostgresRepositories {
    async fn badges_for_user(&self, user_name: &str) -> Result<Vec<UserBadgeRecord>, RepoError> {
        let rows = sqlx::query_as::<_, UserBadgeRow>(
            r#"
            SELECT b.id, b.name, b.graphic, b.title, ub.awarded_at
            FROM user_badges ub
            INNER JOIN badges b ON b.id = ub.badge_id
            WHERE LOWER(ub.user_name) = LOWER($1)
            ORDER BY ub.awarded_at, b.id
            "#,
        )
        .bind(user_name)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| UserBadgeRecord {
                badge: BadgeRecord {
                    id: row.id,
                    name: row.name,
                    graphic: row.graphic,
                    title: row.title,
                },
                awarded_at: row.awarded_at,
            })
            .collect())
    }

    async fn moderated_subverses(
        &self,
        user_name: &str,
    ) -> Result<Vec<SubverseModeratorRecord>, RepoError> {
        let rows = sqlx::query_as::<_, ModeratorRow>(
            r#"
            SELECT subverse, user_name, power
            FROM subverse_moderators
            WHERE LOWER(user_name) = LOWER($1)
            ORDER BY power, subverse
            "#,
        )
        .bind(user_name)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| SubverseModeratorRecord {
                subverse: row.subverse,
                user_name: row.user_name,
                power: row.power,
            })
            .collect())
    }
}
