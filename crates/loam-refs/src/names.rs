//! Branch name validation following git-style conventions.
//!
//! Valid branch names:
//! - Must be non-empty
//! - Must not contain a path separator (`/` or `\`)
//! - Must not contain whitespace, `~`, `^`, `:`, `?`, `*`, `[`
//! - Must not contain `..` or `@{`
//! - Must not start or end with `.`
//! - Must not end with `.lock`

use crate::error::{RefError, RefResult};

/// Characters that are forbidden anywhere in a branch name.
const FORBIDDEN_CHARS: &[char] = &['/', '\\', '~', '^', ':', '?', '*', '['];

fn invalid(name: &str, reason: impl Into<String>) -> RefError {
    RefError::InvalidBranchName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a branch name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use loam_refs::names::validate_branch_name;
///
/// assert!(validate_branch_name("main").is_ok());
/// assert!(validate_branch_name("feature-auth").is_ok());
/// assert!(validate_branch_name("feature/auth").is_err());
/// assert!(validate_branch_name("").is_err());
/// ```
pub fn validate_branch_name(name: &str) -> RefResult<()> {
    if name.is_empty() {
        return Err(invalid(name, "branch name must not be empty"));
    }

    if let Some(ch) = name.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid(name, format!("contains whitespace or control character: {ch:?}")));
    }

    if let Some(ch) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
    }

    if name.contains("..") {
        return Err(invalid(name, "must not contain '..'"));
    }

    if name.contains("@{") {
        return Err(invalid(name, "must not contain '@{'"));
    }

    if name.starts_with('.') || name.ends_with('.') {
        return Err(invalid(name, "must not start or end with '.'"));
    }

    if name.ends_with(".lock") {
        return Err(invalid(name, "must not end with '.lock'"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn valid_simple_names() {
        assert!(validate_branch_name("main").is_ok());
        assert!(validate_branch_name("develop").is_ok());
        assert!(validate_branch_name("my-branch").is_ok());
        assert!(validate_branch_name("v1.0").is_ok());
        assert!(validate_branch_name("feat_2").is_ok());
    }

    #[test]
    fn reject_separators() {
        assert!(validate_branch_name("feature/auth").is_err());
        assert!(validate_branch_name("a\\b").is_err());
    }

    #[test]
    fn reject_empty_name() {
        assert!(validate_branch_name("").is_err());
    }

    #[test]
    fn reject_double_dot() {
        assert!(validate_branch_name("bad..name").is_err());
    }

    #[test]
    fn reject_whitespace() {
        assert!(validate_branch_name("has space").is_err());
        assert!(validate_branch_name("has\ttab").is_err());
        assert!(validate_branch_name("has\nnewline").is_err());
    }

    #[test]
    fn reject_forbidden_chars() {
        for name in ["a~b", "a^b", "a:b", "a?b", "a*b", "a[b"] {
            assert!(validate_branch_name(name).is_err(), "{name}");
        }
    }

    #[test]
    fn reject_dot_boundaries_and_lock() {
        assert!(validate_branch_name(".hidden").is_err());
        assert!(validate_branch_name("trailing.").is_err());
        assert!(validate_branch_name("main.lock").is_err());
        assert!(validate_branch_name("ref@{0}").is_err());
    }

    proptest! {
        #[test]
        fn any_name_with_a_separator_is_rejected(
            left in "[a-z]{0,6}",
            sep in prop_oneof![Just('/'), Just('\\')],
            right in "[a-z]{0,6}",
        ) {
            let name = format!("{left}{sep}{right}");
            prop_assert!(validate_branch_name(&name).is_err());
        }

        #[test]
        fn plain_identifiers_are_accepted(name in "[a-z][a-z0-9_-]{0,15}") {
            prop_assert!(validate_branch_name(&name).is_ok());
        }
    }
}
