//! Unique test data built on ULIDs so parallel tests never collide.

use ulid::Ulid;

/// `{prefix}-{ulid}`
///
/// ```
/// use backend_test_support::unique_helpers::unique_str;
///
/// let a = unique_str("deck");
/// assert_ne!(a, unique_str("deck"));
/// assert!(a.starts_with("deck-"));
/// ```
pub fn unique_str(prefix: &str) -> String {
    format!("{}-{}", prefix, Ulid::new())
}

/// A nickname short enough to read in logs but still unique.
pub fn unique_nickname(prefix: &str) -> String {
    let ulid = Ulid::new().to_string();
    format!("{prefix}-{}", &ulid[ulid.len() - 6..])
}
