//! Write-side contract shared by every command.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{Instrument, debug, info_span, warn};

use crate::{
    application::{context::RequestContext, error::AppError, repos::RepoError},
    domain::error::DomainError,
};

const RETRY_MESSAGE: &str = "The operation could not be completed; please try again";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Success,
    Denied,
    Invalid,
    NotFound,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Outcome of a command.
///
/// A failed response always carries a message; a successful one never
/// carries field errors.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResponse<T> {
    status: CommandStatus,
    message: String,
    errors: Vec<FieldError>,
    payload: Option<T>,
}

impl<T> CommandResponse<T> {
    pub fn successful(payload: T) -> Self {
        Self {
            status: CommandStatus::Success,
            message: String::new(),
            errors: Vec::new(),
            payload: Some(payload),
        }
    }

    pub fn failed(status: CommandStatus, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = RETRY_MESSAGE.to_string();
        }
        let status = match status {
            CommandStatus::Success => CommandStatus::Error,
            other => other,
        };
        Self {
            status,
            message,
            errors: Vec::new(),
            payload: None,
        }
    }

    pub fn denied(message: impl Into<String>) -> Self {
        Self::failed(CommandStatus::Denied, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::failed(CommandStatus::NotFound, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::failed(CommandStatus::Error, message)
    }

    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut response = Self::failed(CommandStatus::Invalid, message.clone());
        response.errors.push(FieldError {
            field: field.into(),
            message,
        });
        response
    }

    pub fn from_domain(err: &DomainError) -> Self {
        match err {
            DomainError::Validation { field, message } => Self::invalid(*field, message.clone()),
            DomainError::NotFound { .. } => Self::not_found(err.to_string()),
            DomainError::Unauthorized { message } => Self::denied(message.clone()),
        }
    }

    pub fn from_repo(err: &RepoError) -> Self {
        match err {
            RepoError::NotFound => Self::not_found("The requested record does not exist"),
            RepoError::InvalidInput { message } => Self::failed(CommandStatus::Invalid, message.clone()),
            RepoError::Duplicate { .. }
            | RepoError::Integrity { .. }
            | RepoError::Persistence(_)
            | RepoError::Timeout => Self::error(RETRY_MESSAGE),
        }
    }

    pub fn success(&self) -> bool {
        self.status == CommandStatus::Success
    }

    pub fn status(&self) -> CommandStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    pub fn into_payload(self) -> Option<T> {
        self.payload
    }
}

/// Why a command stopped before producing its output.
#[derive(Debug, Error)]
pub enum CommandFailure {
    #[error(transparent)]
    Rejected(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Fatal(#[from] AppError),
}

/// A single-use state change.
///
/// `validate` runs first and must not mutate anything; `apply` performs the
/// change and invalidates whatever cache entries it made stale.
#[async_trait]
pub trait Command: Send + Sync + Sized {
    type Output: Send;

    const NAME: &'static str;

    async fn validate(&self, ctx: &RequestContext) -> Result<(), CommandFailure>;

    async fn apply(self, ctx: &RequestContext) -> Result<Self::Output, CommandFailure>;

    /// Validates and applies the command.
    ///
    /// Rejections and repository failures become failure responses;
    /// only unexpected errors are returned as `Err`.
    async fn execute(
        self,
        ctx: &RequestContext,
    ) -> Result<CommandResponse<Self::Output>, AppError> {
        let span = info_span!(
            "command",
            command = Self::NAME,
            user = ctx.principal().user_name().unwrap_or("<anonymous>")
        );

        async move {
            let outcome = match self.validate(ctx).await {
                Ok(()) => self.apply(ctx).await,
                Err(failure) => Err(failure),
            };

            match outcome {
                Ok(payload) => {
                    debug!("Command succeeded");
                    Ok(CommandResponse::successful(payload))
                }
                Err(CommandFailure::Rejected(err)) => {
                    debug!(error = %err, "Command rejected");
                    Ok(CommandResponse::from_domain(&err))
                }
                Err(CommandFailure::Repo(err)) => {
                    warn!(error = %err, "Command failed in repository");
                    Ok(CommandResponse::from_repo(&err))
                }
                Err(CommandFailure::Fatal(err)) => Err(err),
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_always_carry_a_message() {
        let response = CommandResponse::<()>::error("  ");
        assert!(!response.success());
        assert!(!response.message().is_empty());
        assert!(response.payload().is_none());
    }

    #[test]
    fn success_has_no_field_errors() {
        let response = CommandResponse::successful(7_u8);
        assert!(response.success());
        assert!(response.errors().is_empty());
        assert_eq!(response.into_payload(), Some(7));
    }

    #[test]
    fn failed_cannot_forge_success() {
        let response = CommandResponse::<()>::failed(CommandStatus::Success, "nope");
        assert_eq!(response.status(), CommandStatus::Error);
    }

    #[test]
    fn validation_errors_map_to_field_errors() {
        let err = DomainError::validation("bio", "bio must be at most 100 characters");
        let response = CommandResponse::<()>::from_domain(&err);
        assert_eq!(response.status(), CommandStatus::Invalid);
        assert_eq!(response.errors()[0].field, "bio");
        assert_eq!(response.message(), "bio must be at most 100 characters");
    }

    #[test]
    fn repository_failures_map_to_statuses() {
        assert_eq!(
            CommandResponse::<()>::from_repo(&RepoError::NotFound).status(),
            CommandStatus::NotFound
        );
        assert_eq!(
            CommandResponse::<()>::from_repo(&RepoError::Timeout).status(),
            CommandStatus::Error
        );
        assert_eq!(
            CommandResponse::<()>::from_domain(&DomainError::unauthorized("no")).status(),
            CommandStatus::Denied
        );
    }
}
