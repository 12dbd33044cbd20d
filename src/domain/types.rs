//! Shared domain enumerations aligned with persisted database enums.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of user content that can be saved, voted on or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "content_type", rename_all = "snake_case")]
pub enum ContentType {
    Submission,
    Comment,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submission => "submission",
            Self::Comment => "comment",
        }
    }

    pub fn all() -> &'static [ContentType] {
        &[Self::Submission, Self::Comment]
    }
}

impl Display for ContentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "submission" => Ok(Self::Submission),
            "comment" => Ok(Self::Comment),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "submission_type", rename_all = "snake_case")]
pub enum SubmissionType {
    Text,
    Link,
}

impl SubmissionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Link => "link",
        }
    }
}

impl Display for SubmissionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens to a departing user's content of one kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOption {
    /// Keep the content visible but strip the author attribution.
    #[default]
    Anonymize,
    /// Hide the content; attribution stays on the hidden row.
    Delete,
}

impl DeleteOption {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anonymize => "anonymize",
            Self::Delete => "delete",
        }
    }
}

impl Display for DeleteOption {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeleteOption {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anonymize" => Ok(Self::Anonymize),
            "delete" => Ok(Self::Delete),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_parses_case_insensitively() {
        assert_eq!("Submission".parse::<ContentType>(), Ok(ContentType::Submission));
        assert_eq!(" comment ".parse::<ContentType>(), Ok(ContentType::Comment));
        assert!("vote".parse::<ContentType>().is_err());
    }

    #[test]
    fn delete_option_defaults_to_anonymize() {
        assert_eq!(DeleteOption::default(), DeleteOption::Anonymize);
        assert_eq!("DELETE".parse::<DeleteOption>(), Ok(DeleteOption::Delete));
    }
}
