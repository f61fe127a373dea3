//! Built-in rules for string values.

use regex::Regex;

use super::Rule;

impl Rule {
    /// Require the field to be non-empty.
    pub fn required(message: impl Into<String>) -> Self {
        Self::new(|v, _| !v.trim().is_empty(), message)
    }

    /// Require minimum length (in characters).
    pub fn min_length(min: usize, message: impl Into<String>) -> Self {
        Self::new(move |v, _| v.chars().count() >= min, message)
    }

    /// Require maximum length (in characters).
    pub fn max_length(max: usize, message: impl Into<String>) -> Self {
        Self::new(move |v, _| v.chars().count() <= max, message)
    }

    /// Require the value to match a regex pattern.
    pub fn pattern(re: Regex, message: impl Into<String>) -> Self {
        Self::new(move |v, _| re.is_match(v), message)
    }

    /// Require a valid email address.
    ///
    /// Empty is valid; combine with [`Rule::required`] for non-empty.
    pub fn email(message: impl Into<String>) -> Self {
        Self::new(
            |v, _| v.is_empty() || email_address::EmailAddress::is_valid(v),
            message,
        )
    }

    /// Require the value to contain a substring.
    pub fn contains(substr: impl Into<String>, message: impl Into<String>) -> Self {
        let substr = substr.into();
        Self::new(move |v, _| v.contains(&substr), message)
    }

    /// Require the value to equal another field's current value.
    ///
    /// The other field is declared as a dependency, so the check is skipped
    /// until that field is itself valid.
    pub fn equals_field(other: impl Into<String>, message: impl Into<String>) -> Self {
        let other = other.into();
        let dependency = other.clone();
        Self::new(
            move |v, cx| cx.fields().get(&other).is_some_and(|o| o == v),
            message,
        )
        .depends_on([dependency])
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::host::MemoryForm;
    use crate::rules::RuleContext;

    async fn passes(rule: &Rule, form: MemoryForm, field: &str) -> bool {
        let form = Arc::new(form);
        let value = crate::host::FormHost::field_value(form.as_ref(), field).unwrap_or_default();
        let cx = RuleContext::new(field, value.clone(), form, CancellationToken::new());
        rule.evaluate(value, cx).await.unwrap()
    }

    async fn check(rule: Rule, value: &str) -> bool {
        passes(&rule, MemoryForm::new().with_field("f", value), "f").await
    }

    #[tokio::test]
    async fn test_required() {
        assert!(check(Rule::required("x"), "a").await);
        assert!(!check(Rule::required("x"), "").await);
        assert!(!check(Rule::required("x"), "   ").await);
    }

    #[tokio::test]
    async fn test_length_counts_characters() {
        assert!(check(Rule::min_length(3, "x"), "äöü").await);
        assert!(!check(Rule::min_length(3, "x"), "ab").await);
        assert!(check(Rule::max_length(2, "x"), "ab").await);
        assert!(!check(Rule::max_length(2, "x"), "abc").await);
    }

    #[tokio::test]
    async fn test_pattern() {
        let digits = Regex::new(r"^\d+$").unwrap();
        assert!(check(Rule::pattern(digits.clone(), "x"), "12345").await);
        assert!(!check(Rule::pattern(digits, "x"), "12a45").await);
    }

    #[tokio::test]
    async fn test_email_allows_empty() {
        assert!(check(Rule::email("x"), "").await);
        assert!(check(Rule::email("x"), "a@b.com").await);
        assert!(!check(Rule::email("x"), "not-an-email").await);
    }

    #[tokio::test]
    async fn test_contains() {
        assert!(check(Rule::contains("@", "x"), "a@b").await);
        assert!(!check(Rule::contains("@", "x"), "ab").await);
    }

    #[tokio::test]
    async fn test_equals_field_reads_other_value() {
        let rule = Rule::equals_field("password", "x");
        assert_eq!(rule.dependencies(), ["password"]);

        let same = MemoryForm::new()
            .with_field("password", "hunter22")
            .with_field("confirm", "hunter22");
        assert!(passes(&rule, same, "confirm").await);

        let different = MemoryForm::new()
            .with_field("password", "hunter22")
            .with_field("confirm", "hunter23");
        assert!(!passes(&rule, different, "confirm").await);

        let missing = MemoryForm::new().with_field("confirm", "hunter22");
        assert!(!passes(&rule, missing, "confirm").await);
    }
}
