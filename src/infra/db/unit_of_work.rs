use async_trait::async_trait;
use sqlx::{Postgres, Transaction};

use crate::{
    application::repos::{RepoError, UnitOfWork, UpdateAccountParams},
    domain::{entities::AccountRecord, types::SubmissionType},
};

use super::{accounts::AccountRow, map_sqlx_error};

/// A unit of work over one database transaction; dropping it rolls back.
pub(super) struct PostgresUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl PostgresUnitOfWork {
    pub(super) fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }

    async fn execute(&mut self, sql: &'static str, user_name: &str) -> Result<u64, RepoError> {
        sqlx::query(sql)
            .bind(user_name)
            .execute(&mut *self.tx)
            .await
            .map(|result| result.rows_affected())
            .map_err(map_sqlx_error)
    }

    async fn execute_for_type(
        &mut self,
        sql: &'static str,
        user_name: &str,
        submission_type: SubmissionType,
    ) -> Result<u64, RepoError> {
        sqlx::query(sql)
            .bind(user_name)
            .bind(submission_type)
            .execute(&mut *self.tx)
            .await
            .map(|result| result.rows_affected())
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn lock_account(&mut self, user_name: &str) -> Result<Option<AccountRecord>, RepoError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT user_name, email, lockout_end, password_hash, registration_date
            FROM accounts
            WHERE LOWER(user_name) = LOWER($1)
            FOR UPDATE
            "#,
        )
        .bind(user_name)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(AccountRecord::from))
    }

    async fn delete_comments(&mut self, user_name: &str) -> Result<u64, RepoError> {
        self.execute(
            "UPDATE comments SET is_deleted = TRUE WHERE LOWER(user_name) = LOWER($1)",
            user_name,
        )
        .await
    }

    async fn anonymize_comments(&mut self, user_name: &str) -> Result<u64, RepoError> {
        self.execute(
            "UPDATE comments SET is_anonymized = TRUE WHERE LOWER(user_name) = LOWER($1)",
            user_name,
        )
        .await
    }

    async fn delete_submissions(
        &mut self,
        user_name: &str,
        submission_type: SubmissionType,
    ) -> Result<u64, RepoError> {
        self.execute_for_type(
            "UPDATE submissions SET is_deleted = TRUE \
             WHERE LOWER(user_name) = LOWER($1) AND submission_type = $2",
            user_name,
            submission_type,
        )
        .await
    }

    async fn anonymize_submissions(
        &mut self,
        user_name: &str,
        submission_type: SubmissionType,
    ) -> Result<u64, RepoError> {
        self.execute_for_type(
            "UPDATE submissions SET is_anonymized = TRUE \
             WHERE LOWER(user_name) = LOWER($1) AND submission_type = $2",
            user_name,
            submission_type,
        )
        .await
    }

    async fn clear_profile(&mut self, user_name: &str) -> Result<(), RepoError> {
        self.execute(
            "UPDATE user_preferences SET bio = NULL, avatar = NULL \
             WHERE LOWER(user_name) = LOWER($1)",
            user_name,
        )
        .await
        .map(|_| ())
    }

    async fn update_account(&mut self, params: UpdateAccountParams) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET email = $2, lockout_end = $3, password_hash = $4
            WHERE LOWER(user_name) = LOWER($1)
            "#,
        )
        .bind(&params.user_name)
        .bind(&params.email)
        .bind(params.lockout_end)
        .bind(params.password.as_phc())
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn award_badge(&mut self, user_name: &str, badge_id: &str) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_badges (user_name, badge_id)
            VALUES ($1, $2)
            ON CONFLICT ((LOWER(user_name)), badge_id) DO NOTHING
            "#,
        )
        .bind(user_name)
        .bind(badge_id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }
}
