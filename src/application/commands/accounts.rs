use async_trait::async_trait;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::info;

use crate::{
    application::{
        command::{Command, CommandFailure},
        context::RequestContext,
        error::AppError,
        repos::{RepoError, UnitOfWork, UpdateAccountParams},
    },
    cache::CachingKey,
    domain::{
        accounts::{DeleteAccountOptions, is_plausible_email, names_match},
        credentials::PasswordHash,
        entities::AccountRecord,
        error::DomainError,
        types::{DeleteOption, SubmissionType},
    },
};

/// What an account deletion touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionSummary {
    pub user_name: String,
    pub comments: u64,
    pub text_submissions: u64,
    pub link_submissions: u64,
    pub badge: String,
    pub recovery_enabled: bool,
}

/// Closes the principal's own account.
///
/// Content is deleted or anonymized per option, the profile is wiped, the
/// password replaced and a deletion badge awarded, all in one unit of work.
#[derive(Debug, Clone)]
pub struct DeleteAccountCommand {
    options: DeleteAccountOptions,
}

impl DeleteAccountCommand {
    pub fn new(options: DeleteAccountOptions) -> Self {
        Self { options }
    }

    async fn load_account(&self, ctx: &RequestContext) -> Result<AccountRecord, CommandFailure> {
        ctx.repos()
            .accounts
            .find_account(self.options.user_name.trim())
            .await?
            .ok_or_else(|| DomainError::not_found("account").into())
    }
}

#[async_trait]
impl Command for DeleteAccountCommand {
    type Output = DeletionSummary;

    const NAME: &'static str = "delete_account";

    async fn validate(&self, ctx: &RequestContext) -> Result<(), CommandFailure> {
        let options = &self.options;
        if !ctx.principal().is(&options.user_name) {
            return Err(DomainError::unauthorized("You can only delete your own account").into());
        }
        if !names_match(&options.confirm_user_name, &options.user_name) {
            return Err(DomainError::validation(
                "confirm_user_name",
                "Confirmation user name does not match",
            )
            .into());
        }

        let account = self.load_account(ctx).await?;
        if !account.password.verify(&options.current_password) {
            return Err(incorrect_password().into());
        }

        if options.recovery_requested() {
            if !options.recovery_confirmed() {
                return Err(DomainError::validation(
                    "confirm_recovery_email_address",
                    "Recovery email addresses do not match",
                )
                .into());
            }
            if !options.recovery_email().is_some_and(is_plausible_email) {
                return Err(DomainError::validation(
                    "recovery_email_address",
                    "Recovery email address is not valid",
                )
                .into());
            }
        }
        Ok(())
    }

    async fn apply(self, ctx: &RequestContext) -> Result<Self::Output, CommandFailure> {
        let options = &self.options;
        let policy = ctx.accounts();

        // Verified again under the row lock; the password may have changed since.
        let mut uow = ctx.repos().begin().await?;
        let account = uow
            .lock_account(options.user_name.trim())
            .await?
            .ok_or_else(|| CommandFailure::from(DomainError::not_found("account")))?;
        if !account.password.verify(&options.current_password) {
            return Err(incorrect_password().into());
        }
        let user_name = account.user_name;

        let (email, lockout_end, badge) = match options.recovery_email() {
            Some(address) => {
                let lockout_end = OffsetDateTime::now_utc()
                    .checked_add(policy.deletion_lockout)
                    .ok_or_else(|| AppError::unexpected("account lockout end is out of range"))?;
                (
                    Some(address.to_string()),
                    Some(lockout_end),
                    policy.deleted_with_recovery_badge.clone(),
                )
            }
            None => (None, None, policy.deleted_badge.clone()),
        };
        let recovery_enabled = email.is_some();
        let password =
            PasswordHash::unusable().map_err(|err| AppError::unexpected(err.to_string()))?;

        let comments = match options.comments {
            DeleteOption::Delete => uow.delete_comments(&user_name).await?,
            DeleteOption::Anonymize => uow.anonymize_comments(&user_name).await?,
        };
        let text_submissions = dispose_submissions(
            uow.as_mut(),
            &user_name,
            SubmissionType::Text,
            options.text_submissions,
        )
        .await?;
        let link_submissions = dispose_submissions(
            uow.as_mut(),
            &user_name,
            SubmissionType::Link,
            options.link_submissions,
        )
        .await?;

        uow.clear_profile(&user_name).await?;
        uow.update_account(UpdateAccountParams {
            user_name: user_name.clone(),
            email,
            lockout_end,
            password,
        })
        .await?;
        let newly_awarded = uow.award_badge(&user_name, &badge).await?;
        uow.commit().await?;

        let purged = ctx
            .cache()
            .invalidate_bucket(&CachingKey::user_bucket(&user_name));

        info!(
            user = %user_name,
            reason = options.reason.as_deref().unwrap_or_default(),
            comments,
            text_submissions,
            link_submissions,
            badge = %badge,
            newly_awarded,
            recovery_enabled,
            purged,
            "Account deleted"
        );

        Ok(DeletionSummary {
            user_name,
            comments,
            text_submissions,
            link_submissions,
            badge,
            recovery_enabled,
        })
    }
}

fn incorrect_password() -> DomainError {
    DomainError::validation("current_password", "Current password is incorrect")
}

async fn dispose_submissions(
    uow: &mut dyn UnitOfWork,
    user_name: &str,
    submission_type: SubmissionType,
    option: DeleteOption,
) -> Result<u64, RepoError> {
    match option {
        DeleteOption::Delete => uow.delete_submissions(user_name, submission_type).await,
        DeleteOption::Anonymize => uow.anonymize_submissions(user_name, submission_type).await,
    }
}
