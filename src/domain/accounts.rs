//! Account identity rules and the account deletion request.

use serde::Deserialize;

use crate::domain::types::DeleteOption;

/// Canonical form of a user or subverse name; identities are case-insensitive.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Same identity under [`normalize_name`]; a blank name matches nothing.
pub fn names_match(left: &str, right: &str) -> bool {
    !left.trim().is_empty() && normalize_name(left) == normalize_name(right)
}

/// Cheap shape check; deliverability is not our concern.
pub fn is_plausible_email(value: &str) -> bool {
    let value = value.trim();
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeleteAccountOptions {
    pub user_name: String,
    pub confirm_user_name: String,
    pub current_password: String,
    pub comments: DeleteOption,
    pub text_submissions: DeleteOption,
    pub link_submissions: DeleteOption,
    pub recovery_email_address: Option<String>,
    pub confirm_recovery_email_address: Option<String>,
    pub reason: Option<String>,
}

impl DeleteAccountOptions {
    /// Recovery address when one was supplied (blank input counts as absent).
    pub fn recovery_email(&self) -> Option<&str> {
        self.recovery_email_address
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn recovery_requested(&self) -> bool {
        self.recovery_email().is_some()
            || self
                .confirm_recovery_email_address
                .as_deref()
                .is_some_and(|value| !value.trim().is_empty())
    }

    pub fn recovery_confirmed(&self) -> bool {
        let confirm = self
            .confirm_recovery_email_address
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();
        match self.recovery_email() {
            Some(address) => address.eq_ignore_ascii_case(confirm),
            None => confirm.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_compare_case_insensitively() {
        assert!(names_match("TestUser", "testuser"));
        assert!(names_match(" TestUser", "TESTUSER "));
        assert!(!names_match("TestUser", "Tom"));
        assert!(!names_match("", ""));
        assert!(names_match("Émile", "émile"));
        assert!(names_match("ÖSTERREICH", "österreich"));
        assert!(!names_match("Émile", "Emile"));
    }

    #[test]
    fn normalize_lowercases_and_trims() {
        assert_eq!(normalize_name("  NewsBot "), "newsbot");
    }

    #[test]
    fn email_shape_check() {
        assert!(is_plausible_email("someone@example.com"));
        assert!(!is_plausible_email("someone@localhost"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("some one@example.com"));
    }

    #[test]
    fn recovery_confirmation_requires_both_fields() {
        let mut options = DeleteAccountOptions {
            recovery_email_address: Some("a@b.com".to_string()),
            ..Default::default()
        };
        assert!(options.recovery_requested());
        assert!(!options.recovery_confirmed());

        options.confirm_recovery_email_address = Some("A@B.com".to_string());
        assert!(options.recovery_confirmed());

        let blank = DeleteAccountOptions {
            recovery_email_address: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(!blank.recovery_requested());
        assert!(blank.recovery_confirmed());
    }
}
