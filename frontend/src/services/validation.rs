//! # Validation Module
//!
//! Stateless checks applied to form fields before anything is sent to the
//! data service. Every check returns a value; nothing here panics on user
//! input. Failures are shown inline next to the offending field.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::date_utils::{self, DateError};
use shared::MoneyValue;

/// Characters that satisfy the special character password rule
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*()_+{}[]:;<>,.?~";

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Longest accepted email address
pub const MAX_EMAIL_LENGTH: usize = 256;

/// Longest accepted entry detail / category / ledger name
pub const MAX_NAME_LENGTH: usize = 256;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});

/// Field-level validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("This field is required.")]
    Required,
    #[error("Please enter a valid email address.")]
    InvalidEmail,
    #[error("Password must satisfy: {}", describe_rules(.0))]
    WeakPassword(Vec<PasswordRule>),
    #[error("Please enter a valid amount.")]
    InvalidAmount,
    #[error("{0}")]
    InvalidDate(DateError),
    #[error("Must be at most {max} characters")]
    TooLong { max: usize },
}

impl From<DateError> for ValidationError {
    fn from(error: DateError) -> Self {
        ValidationError::InvalidDate(error)
    }
}

/// Individual rules of the password policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PasswordRule {
    MinLength,
    UpperCase,
    LowerCase,
    Digit,
    SpecialChar,
    NoSpace,
}

impl PasswordRule {
    pub const ALL: [PasswordRule; 6] = [
        PasswordRule::MinLength,
        PasswordRule::UpperCase,
        PasswordRule::LowerCase,
        PasswordRule::Digit,
        PasswordRule::SpecialChar,
        PasswordRule::NoSpace,
    ];

    /// Policy key used by the password requirement checklist
    pub fn name(&self) -> &'static str {
        match self {
            PasswordRule::MinLength => "minLength",
            PasswordRule::UpperCase => "upperCase",
            PasswordRule::LowerCase => "lowerCase",
            PasswordRule::Digit => "digit",
            PasswordRule::SpecialChar => "specialChar",
            PasswordRule::NoSpace => "noSpace",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PasswordRule::MinLength => "be at least 8 characters long",
            PasswordRule::UpperCase => "contain at least one uppercase letter",
            PasswordRule::LowerCase => "contain at least one lowercase letter",
            PasswordRule::Digit => "contain at least one digit",
            PasswordRule::SpecialChar => "contain at least one special character",
            PasswordRule::NoSpace => "not contain whitespace",
        }
    }

    pub fn check(&self, value: &str) -> bool {
        match self {
            PasswordRule::MinLength => min_length(value, MIN_PASSWORD_LENGTH),
            PasswordRule::UpperCase => has_upper_case(value),
            PasswordRule::LowerCase => has_lower_case(value),
            PasswordRule::Digit => has_digit(value),
            PasswordRule::SpecialChar => has_special_char(value),
            PasswordRule::NoSpace => no_whitespace(value),
        }
    }
}

impl fmt::Display for PasswordRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn describe_rules(rules: &[PasswordRule]) -> String {
    rules
        .iter()
        .map(PasswordRule::description)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Outcome of every password rule for one candidate value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordPolicyReport {
    results: BTreeMap<PasswordRule, bool>,
}

impl PasswordPolicyReport {
    pub fn get(&self, rule: PasswordRule) -> bool {
        self.results.get(&rule).copied().unwrap_or(false)
    }

    /// Aggregate validity: every rule passed
    pub fn is_valid(&self) -> bool {
        self.results.values().all(|passed| *passed)
    }

    pub fn failed_rules(&self) -> Vec<PasswordRule> {
        self.results
            .iter()
            .filter(|(_, passed)| !**passed)
            .map(|(rule, _)| *rule)
            .collect()
    }

    /// Rule results keyed by policy name
    pub fn to_map(&self) -> BTreeMap<&'static str, bool> {
        self.results
            .iter()
            .map(|(rule, passed)| (rule.name(), *passed))
            .collect()
    }
}

pub fn has_upper_case(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_uppercase())
}

pub fn has_lower_case(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_lowercase())
}

pub fn has_digit(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_digit())
}

pub fn has_special_char(value: &str) -> bool {
    value.chars().any(|c| SPECIAL_CHARACTERS.contains(c))
}

pub fn no_whitespace(value: &str) -> bool {
    !value.chars().any(char::is_whitespace)
}

/// Length in characters, not bytes
pub fn min_length(value: &str, n: usize) -> bool {
    value.chars().count() >= n
}

/// Evaluate every password rule
pub fn validate_password_policy(value: &str) -> PasswordPolicyReport {
    let results = PasswordRule::ALL
        .iter()
        .map(|rule| (*rule, rule.check(value)))
        .collect();
    PasswordPolicyReport { results }
}

/// A rule counts as fulfilled only once the field has some input
pub fn is_condition_fulfilled(value: &str, condition: bool) -> bool {
    condition && !value.is_empty()
}

pub fn is_valid_email(value: &str) -> bool {
    !value.is_empty() && value.len() <= MAX_EMAIL_LENGTH && EMAIL_REGEX.is_match(value)
}

pub fn is_valid_currency_amount(value: &str) -> bool {
    MoneyValue::is_valid_amount(value)
}

/// Normalize a date field; see [`date_utils::normalize_date_string`]
pub fn normalize_date_string(value: &str) -> Result<String, DateError> {
    date_utils::normalize_date_string(value)
}

/// Required email field
pub fn validate_email_field(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required);
    }
    if !is_valid_email(value) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

/// Required password field checked against the full policy
pub fn validate_new_password_field(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Required);
    }
    let report = validate_password_policy(value);
    if report.is_valid() {
        Ok(())
    } else {
        Err(ValidationError::WeakPassword(report.failed_rules()))
    }
}

/// Required, length-limited text field (entry detail, category or ledger name)
pub fn validate_name_field(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required);
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong { max: MAX_NAME_LENGTH });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_password_passes_every_rule() {
        let report = validate_password_policy("Abcdef1!");
        assert!(report.is_valid());
        for rule in PasswordRule::ALL {
            assert!(report.get(rule), "{} should pass", rule);
        }
    }

    #[test]
    fn test_password_missing_upper_and_special() {
        let report = validate_password_policy("abcdefg1");
        assert!(!report.is_valid());
        assert!(!report.get(PasswordRule::UpperCase));
        assert!(!report.get(PasswordRule::SpecialChar));
        assert!(report.get(PasswordRule::MinLength));
        assert!(report.get(PasswordRule::LowerCase));
        assert!(report.get(PasswordRule::Digit));
        assert!(report.get(PasswordRule::NoSpace));
        assert_eq!(
            report.failed_rules(),
            vec![PasswordRule::UpperCase, PasswordRule::SpecialChar]
        );
    }

    #[test]
    fn test_short_password_fails_min_length() {
        let report = validate_password_policy("short1!");
        assert!(!report.get(PasswordRule::MinLength));
        assert_eq!(report.to_map()["minLength"], false);
    }

    #[test]
    fn test_whitespace_is_rejected() {
        let report = validate_password_policy("Abc def1!");
        assert!(!report.get(PasswordRule::NoSpace));
        assert!(!report.is_valid());
    }

    #[test]
    fn test_condition_requires_input() {
        assert!(!is_condition_fulfilled("", true));
        assert!(is_condition_fulfilled("a", true));
        assert!(!is_condition_fulfilled("a", false));
    }

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("first.last+tag@mail.example.org"));
        assert!(!is_valid_email("alice@example"));
        assert!(!is_valid_email("alice example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email(""));

        let too_long = format!("{}@example.com", "a".repeat(250));
        assert!(!is_valid_email(&too_long));
    }

    #[test]
    fn test_currency_amount_examples() {
        assert!(is_valid_currency_amount("12.5"));
        assert!(!is_valid_currency_amount("12."));
        assert!(!is_valid_currency_amount("abc.12"));
        assert!(!is_valid_currency_amount("12.100"));
        assert!(is_valid_currency_amount("0.00"));
    }

    #[test]
    fn test_field_validators() {
        assert_eq!(validate_email_field("  "), Err(ValidationError::Required));
        assert_eq!(validate_email_field("nope"), Err(ValidationError::InvalidEmail));
        assert_eq!(validate_email_field("a@b.co"), Ok(()));

        assert_eq!(validate_new_password_field(""), Err(ValidationError::Required));
        assert_eq!(
            validate_new_password_field("abcdefg1"),
            Err(ValidationError::WeakPassword(vec![
                PasswordRule::UpperCase,
                PasswordRule::SpecialChar
            ]))
        );

        assert_eq!(validate_name_field(""), Err(ValidationError::Required));
        assert_eq!(
            validate_name_field(&"x".repeat(MAX_NAME_LENGTH + 1)),
            Err(ValidationError::TooLong { max: MAX_NAME_LENGTH })
        );
        assert_eq!(validate_name_field("Groceries"), Ok(()));
    }

    #[test]
    fn test_weak_password_message_lists_rules() {
        let error = ValidationError::WeakPassword(vec![PasswordRule::Digit]);
        assert_eq!(
            error.to_string(),
            "Password must satisfy: contain at least one digit"
        );
    }
}
