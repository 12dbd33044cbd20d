//! State-changing commands.

mod accounts;
mod preferences;
mod saves;

pub use accounts::DeleteAccountCommand;
pub use preferences::UpdateUserPreferencesCommand;
pub use saves::SaveCommand;

use crate::{application::context::RequestContext, domain::error::DomainError};

/// Name of the authenticated principal, or a denial.
fn require_user(ctx: &RequestContext) -> Result<String, DomainError> {
    ctx.principal()
        .user_name()
        .map(str::to_string)
        .ok_or_else(|| DomainError::unauthorized("You must be logged in to do that"))
}
