use std::collections::BTreeSet;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{ContentRepo, RepoError, SavesRepo, SubverseRepo},
    domain::{
        entities::{CommentRecord, SubmissionRecord, SubverseRecord},
        types::{ContentType, SubmissionType},
    },
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct SubverseRow {
    id: i64,
    name: String,
    title: String,
    description: Option<String>,
    side_bar: Option<String>,
    is_adult: bool,
    is_private: bool,
    subscriber_count: i64,
    created_by: Option<String>,
    creation_date: OffsetDateTime,
}

impl From<SubverseRow> for SubverseRecord {
    fn from(row: SubverseRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            title: row.title,
            description: row.description,
            side_bar: row.side_bar,
            is_adult: row.is_adult,
            is_private: row.is_private,
            subscriber_count: row.subscriber_count,
            created_by: row.created_by,
            creation_date: row.creation_date,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    submission_id: i64,
    user_name: String,
    content: String,
    is_deleted: bool,
    is_anonymized: bool,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            submission_id: row.submission_id,
            user_name: row.user_name,
            content: row.content,
            is_deleted: row.is_deleted,
            is_anonymized: row.is_anonymized,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SubmissionRow {
    id: i64,
    subverse: String,
    user_name: String,
    submission_type: SubmissionType,
    title: String,
    content: Option<String>,
    url: Option<String>,
    is_deleted: bool,
    is_anonymized: bool,
}

impl From<SubmissionRow> for SubmissionRecord {
    fn from(row: SubmissionRow) -> Self {
        Self {
            id: row.id,
            subverse: row.subverse,
            user_name: row.user_name,
            submission_type: row.submission_type,
            title: row.title,
            content: row.content,
            url: row.url,
            is_deleted: row.is_deleted,
            is_anonymized: row.is_anonymized,
        }
    }
}

#[async_trait]
impl SubverseRepo for PostgresRepositories {
    async fn find_subverse(&self, name: &str) -> Result<Option<SubverseRecord>, RepoError> {
        let row = sqlx::query_as::<_, SubverseRow>(
            r#"
            SELECT id, name, title, description, side_bar, is_adult, is_private,
                   subscriber_count, created_by, creation_date
            FROM subverses
            WHERE LOWER(name) = LOWER($1)
            "#,
        )
        .bind(name)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(SubverseRecord::from))
    }
}

#[async_trait]
impl SavesRepo for PostgresRepositories {
    async fn list_saved(
        &self,
        user_name: &str,
        content_type: ContentType,
    ) -> Result<BTreeSet<i64>, RepoError> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT content_id
            FROM saves
            WHERE user_name = LOWER($1) AND content_type = $2
            "#,
        )
        .bind(user_name)
        .bind(content_type)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(ids.into_iter().collect())
    }

    async fn toggle_saved(
        &self,
        user_name: &str,
        content_type: ContentType,
        content_id: i64,
    ) -> Result<bool, RepoError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        // Serializes toggles of one (user, item) pair until commit.
        sqlx::query(
            "SELECT pg_advisory_xact_lock(hashtext(LOWER($1) || ':' || $2::text || ':' || $3::text))",
        )
        .bind(user_name)
        .bind(content_type)
        .bind(content_id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let saved = sqlx::query_scalar::<_, bool>(
            r#"
            WITH removed AS (
                DELETE FROM saves
                WHERE user_name = LOWER($1) AND content_type = $2 AND content_id = $3
                RETURNING content_id
            ), inserted AS (
                INSERT INTO saves (user_name, content_type, content_id)
                SELECT LOWER($1), $2, $3
                WHERE NOT EXISTS (SELECT 1 FROM removed)
                RETURNING content_id
            )
            SELECT EXISTS (SELECT 1 FROM inserted)
            "#,
        )
        .bind(user_name)
        .bind(content_type)
        .bind(content_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(saved)
    }
}

#[async_trait]
impl ContentRepo for PostgresRepositories {
    async fn content_exists(
        &self,
        content_type: ContentType,
        content_id: i64,
    ) -> Result<bool, RepoError> {
        let sql = match content_type {
            ContentType::Submission => "SELECT EXISTS (SELECT 1 FROM submissions WHERE id = $1)",
            ContentType::Comment => "SELECT EXISTS (SELECT 1 FROM comments WHERE id = $1)",
        };

        sqlx::query_scalar::<_, bool>(sql)
            .bind(content_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn comments_by_user(&self, user_name: &str) -> Result<Vec<CommentRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, submission_id, user_name, content, is_deleted, is_anonymized
            FROM comments
            WHERE LOWER(user_name) = LOWER($1)
            ORDER BY id
            "#,
        )
        .bind(user_name)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CommentRecord::from).collect())
    }

    async fn submissions_by_user(
        &self,
        user_name: &str,
    ) -> Result<Vec<SubmissionRecord>, RepoError> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, subverse, user_name, submission_type, title, content, url,
                   is_deleted, is_anonymized
            FROM submissions
            WHERE LOWER(user_name) = LOWER($1)
            ORDER BY id
            "#,
        )
        .bind(user_name)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(SubmissionRecord::from).collect())
    }
}
