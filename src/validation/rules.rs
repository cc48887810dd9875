//! Rule interpreter for [`crate::types::Rule`].

use std::sync::LazyLock;

use regex::Regex;

use crate::types::Rule;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex must compile")
});

/// Returns the violation message for `rule`, or `None` if `value` satisfies it.
///
/// `value` is expected to be trimmed already.
pub fn check(rule: &Rule, field: &str, value: &str) -> Option<String> {
    match rule {
        Rule::NonEmpty if value.is_empty() => Some(format!("{field}: is required")),
        Rule::MinLength(min) if value.chars().count() < *min => {
            Some(format!("{field}: must be at least {min} characters"))
        }
        Rule::MaxLength(max) if value.chars().count() > *max => {
            Some(format!("{field}: must be at most {max} characters"))
        }
        Rule::Email if !is_email(value) => Some(format!("{field}: must be a valid email address")),
        _ => None,
    }
}

pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}
