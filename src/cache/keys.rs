//! Cache key construction.
//!
//! Keys are `:`-separated paths ordered from the most general segment to the
//! most specific one, e.g. `user:alice:saves:comment`. Invalidation buckets
//! are prefixes of that path, so dropping `user:alice` reaches every entry
//! describing that user.

use crate::domain::accounts::normalize_name;
use crate::domain::types::ContentType;

const SEPARATOR: char = ':';

/// Builders for every cache key the query layer uses.
pub struct CachingKey;

impl CachingKey {
    pub fn subverse(name: &str) -> String {
        join(&["subverse", &name_segment(name), "info"])
    }

    pub fn user_saved_items(content_type: ContentType, user_name: &str) -> String {
        join(&[
            "user",
            &name_segment(user_name),
            "saves",
            content_type.as_str(),
        ])
    }

    pub fn user_preferences(user_name: &str) -> String {
        join(&["user", &name_segment(user_name), "preferences"])
    }

    pub fn user_information(user_name: &str) -> String {
        join(&["user", &name_segment(user_name), "info"])
    }

    /// Bucket shared by every per-user entry with at least one bucket.
    pub fn user_bucket(user_name: &str) -> String {
        join(&["user", &name_segment(user_name)])
    }

    /// Bucket shared by every subverse entry with two buckets.
    pub fn subverse_family() -> String {
        "subverse".to_string()
    }

    /// Buckets a key joins, most specific first.
    ///
    /// Bucket `i` is the key with its last `i + 1` segments removed. The
    /// leading (family) segment is never removed, so a key of `n` segments has
    /// at most `n - 1` buckets regardless of `count`.
    pub fn buckets(key: &str, count: usize) -> Vec<String> {
        let boundaries: Vec<usize> = key
            .char_indices()
            .filter(|(_, ch)| *ch == SEPARATOR)
            .map(|(index, _)| index)
            .collect();

        boundaries
            .iter()
            .rev()
            .take(count)
            .map(|end| key[..*end].to_string())
            .collect()
    }
}

fn join(segments: &[&str]) -> String {
    let mut key = String::new();
    for (index, segment) in segments.iter().enumerate() {
        if index > 0 {
            key.push(SEPARATOR);
        }
        key.push_str(segment);
    }
    key
}

/// Case-folds a name and escapes characters that would break segmentation.
fn name_segment(name: &str) -> String {
    let normalized = normalize_name(name);
    let mut escaped = String::with_capacity(normalized.len());
    for ch in normalized.chars() {
        match ch {
            '%' => escaped.push_str("%25"),
            ':' => escaped.push_str("%3a"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_case_normalized() {
        assert_eq!(CachingKey::subverse("News"), CachingKey::subverse("news"));
        assert_eq!(
            CachingKey::user_saved_items(ContentType::Comment, "Alice"),
            "user:alice:saves:comment"
        );
        assert_eq!(
            CachingKey::user_preferences(" ALICE "),
            CachingKey::user_preferences("alice")
        );
    }

    #[test]
    fn distinct_inputs_produce_distinct_keys() {
        let comment = CachingKey::user_saved_items(ContentType::Comment, "alice");
        let submission = CachingKey::user_saved_items(ContentType::Submission, "alice");
        let other_user = CachingKey::user_saved_items(ContentType::Comment, "bob");
        assert_ne!(comment, submission);
        assert_ne!(comment, other_user);
        assert_ne!(
            CachingKey::user_preferences("alice"),
            CachingKey::user_information("alice")
        );
    }

    #[test]
    fn separators_inside_names_cannot_collide() {
        // "a:saves" must not alias the saves path of user "a".
        let crafted = CachingKey::user_preferences("a:saves:comment");
        let genuine = CachingKey::user_saved_items(ContentType::Comment, "a");
        assert_ne!(crafted, genuine);
        assert_eq!(crafted, "user:a%3asaves%3acomment:preferences");
        assert_ne!(
            CachingKey::subverse("a%3ab"),
            CachingKey::subverse("a:b")
        );
    }

    #[test]
    fn buckets_are_prefixes_most_specific_first() {
        let key = CachingKey::user_saved_items(ContentType::Submission, "alice");
        assert_eq!(
            CachingKey::buckets(&key, 2),
            vec!["user:alice:saves".to_string(), "user:alice".to_string()]
        );
        assert_eq!(CachingKey::buckets(&key, 1), vec!["user:alice:saves".to_string()]);
        assert!(CachingKey::buckets(&key, 0).is_empty());
    }

    #[test]
    fn buckets_never_drop_family_segment() {
        let key = CachingKey::subverse("news");
        assert_eq!(
            CachingKey::buckets(&key, 10),
            vec!["subverse:news".to_string(), CachingKey::subverse_family()]
        );
        assert!(CachingKey::buckets("flat", 3).is_empty());
    }

    #[test]
    fn user_bucket_covers_all_user_keys() {
        let bucket = CachingKey::user_bucket("Alice");
        for key in [
            CachingKey::user_preferences("alice"),
            CachingKey::user_information("alice"),
            CachingKey::user_saved_items(ContentType::Comment, "alice"),
        ] {
            assert!(CachingKey::buckets(&key, 3).contains(&bucket), "{key}");
        }
    }
}
