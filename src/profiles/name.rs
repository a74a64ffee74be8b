//! Profile name validation.
use crate::config::DEFAULT_NAME_CHARACTERS;
use crate::error::ProfileError;

/// Characters that can never appear in a profile name, whatever the
/// configured allow-list says, because names become directory names.
const FORBIDDEN: &[char] = &['/', '\\', '\0'];

/// The identifier-like naming rule for profiles.
///
/// A valid name is non-empty, does not start with a digit, consists of
/// alphanumerics, `_`, and the configured extra characters, and contains at
/// least one letter or `_`.
///
/// # Examples
///
/// ```
/// use konfsave::profiles::name::NameRule;
///
/// let rule = NameRule::default();
/// assert!(rule.is_valid("work"));
/// assert!(rule.is_valid("kde-dark(2)"));
/// assert!(!rule.is_valid("2fast"));
/// assert!(!rule.is_valid("a b"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRule {
    extra: String,
}

impl Default for NameRule {
    fn default() -> Self {
        Self::new(DEFAULT_NAME_CHARACTERS)
    }
}

impl NameRule {
    /// A rule accepting `extra` characters besides alphanumerics and `_`.
    #[must_use]
    pub fn new(extra: &str) -> Self {
        Self {
            extra: extra.chars().filter(|c| !FORBIDDEN.contains(c)).collect(),
        }
    }

    /// Return `true` if `name` satisfies the rule.
    #[must_use]
    pub fn is_valid(&self, name: &str) -> bool {
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        if first.is_numeric() {
            return false;
        }
        let allowed = |c: char| c.is_alphanumeric() || c == '_' || self.extra.contains(c);
        name.chars().all(allowed) && name.chars().any(|c| c.is_alphabetic() || c == '_')
    }

    /// Validate `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::InvalidName`] if the rule is violated.
    pub fn validate(&self, name: &str) -> Result<(), ProfileError> {
        if self.is_valid(name) {
            Ok(())
        } else {
            Err(ProfileError::InvalidName(name.to_string()))
        }
    }
}
