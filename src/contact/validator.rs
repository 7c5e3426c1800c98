//! Contact submission screening and validation.
//!
//! Screening (honeypot, timing) runs before rate limiting so bots never
//! consume a real client's budget. Field validation runs after it.

use std::time::Duration;

use chrono::{DateTime, Utc};
use lettre::Address;
use thiserror::Error;

use crate::config::ContactConfig;
use crate::contact::types::ContactSubmission;
use crate::security::headers::contains_crlf;

/// Why a submission was turned away. The display text is user-facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContactRejection {
    #[error("Please try again")]
    TooFast,

    #[error("Please try again")]
    Stale,

    #[error("Please enter your name")]
    Name,

    #[error("Please enter a valid email")]
    Email,

    #[error("Subject is too long")]
    SubjectTooLong,

    #[error("Please enter a message (at least 10 characters)")]
    MessageTooShort,

    #[error("Message is too long")]
    MessageTooLong,

    #[error("Invalid characters in input")]
    HeaderInjection,
}

impl ContactRejection {
    /// Stable label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            ContactRejection::TooFast => "too_fast",
            ContactRejection::Stale => "stale",
            ContactRejection::Name => "invalid_name",
            ContactRejection::Email => "invalid_email",
            ContactRejection::SubjectTooLong => "subject_too_long",
            ContactRejection::MessageTooShort => "message_too_short",
            ContactRejection::MessageTooLong => "message_too_long",
            ContactRejection::HeaderInjection => "header_injection",
        }
    }
}

/// Outcome of screening a submission that was not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screening {
    /// Looks human; continue with rate limiting and validation.
    Proceed,
    /// Honeypot was filled: answer as if delivered, do nothing else.
    Bot,
}

/// Tunable limits for contact submissions.
#[derive(Debug, Clone)]
pub struct ContactPolicy {
    pub min_age: Duration,
    pub max_age: Duration,
    pub min_name_chars: usize,
    pub max_subject_chars: usize,
    pub min_message_chars: usize,
    pub max_message_chars: usize,
}

impl Default for ContactPolicy {
    fn default() -> Self {
        Self {
            min_age: Duration::from_secs(2),
            max_age: Duration::from_secs(2 * 60 * 60),
            min_name_chars: 2,
            max_subject_chars: 140,
            min_message_chars: 10,
            max_message_chars: 5000,
        }
    }
}

impl ContactPolicy {
    pub fn from_config(config: &ContactConfig) -> Self {
        Self {
            min_age: config.min_age(),
            max_age: config.max_age(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContactValidator {
    policy: ContactPolicy,
}

impl ContactValidator {
    pub fn new(policy: ContactPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ContactPolicy {
        &self.policy
    }

    /// Honeypot and timing heuristics.
    pub fn screen(
        &self,
        submission: &ContactSubmission,
        now: DateTime<Utc>,
    ) -> Result<Screening, ContactRejection> {
        if !submission.website.trim().is_empty() {
            return Ok(Screening::Bot);
        }

        // Zero and negative stamps are treated as "not sent".
        if let Some(created_ms) = submission.created_at.filter(|ts| *ts > 0) {
            let age_ms = now.timestamp_millis().saturating_sub(created_ms);
            if age_ms < millis(self.policy.min_age) {
                return Err(ContactRejection::TooFast);
            }
            if age_ms > millis(self.policy.max_age) {
                return Err(ContactRejection::Stale);
            }
        }

        Ok(Screening::Proceed)
    }

    /// Field rules, then header-injection defense, then the address must be
    /// one the relay can put in Reply-To.
    pub fn validate(&self, submission: &ContactSubmission) -> Result<(), ContactRejection> {
        let policy = &self.policy;
        let name = submission.name.trim();
        let email = submission.email.trim();
        let subject = submission.subject.trim();
        let message = submission.message.trim();

        if name.chars().count() < policy.min_name_chars {
            return Err(ContactRejection::Name);
        }
        if !looks_like_email(email) {
            return Err(ContactRejection::Email);
        }
        if subject.chars().count() > policy.max_subject_chars {
            return Err(ContactRejection::SubjectTooLong);
        }

        let message_chars = message.chars().count();
        if message_chars < policy.min_message_chars {
            return Err(ContactRejection::MessageTooShort);
        }
        if message_chars > policy.max_message_chars {
            return Err(ContactRejection::MessageTooLong);
        }

        if contains_crlf(name) || contains_crlf(email) || contains_crlf(subject) {
            return Err(ContactRejection::HeaderInjection);
        }

        if email.parse::<Address>().is_err() {
            return Err(ContactRejection::Email);
        }

        Ok(())
    }
}

fn millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

/// Lightweight structural check, not RFC 5322.
pub fn looks_like_email(candidate: &str) -> bool {
    let s = candidate.trim();
    if s.len() < 6 || s.len() > 254 {
        return false;
    }

    let at = match s.find('@') {
        Some(at) if at > 0 && s.rfind('@') == Some(at) => at,
        _ => return false,
    };

    match s.rfind('.') {
        Some(dot) => dot > at + 1 && dot < s.len() - 1,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn stamped(age_ms: i64) -> ContactSubmission {
        ContactSubmission {
            created_at: Some(now().timestamp_millis() - age_ms),
            ..valid()
        }
    }

    fn valid() -> ContactSubmission {
        ContactSubmission {
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            subject: "Engines".into(),
            message: "I would like to talk about engines.".into(),
            website: String::new(),
            created_at: None,
        }
    }

    #[test]
    fn honeypot_short_circuits_everything() {
        let validator = ContactValidator::default();
        let bot = ContactSubmission {
            website: "http://spam.example".into(),
            message: String::new(),
            created_at: Some(now().timestamp_millis()),
            ..ContactSubmission::default()
        };
        assert_eq!(validator.screen(&bot, now()), Ok(Screening::Bot));
    }

    #[test]
    fn whitespace_honeypot_is_not_a_bot() {
        let validator = ContactValidator::default();
        let human = ContactSubmission {
            website: "   ".into(),
            ..valid()
        };
        assert_eq!(validator.screen(&human, now()), Ok(Screening::Proceed));
    }

    #[test]
    fn timing_bounds_are_inclusive() {
        let validator = ContactValidator::default();
        let two_hours = 2 * 60 * 60 * 1000;

        assert_eq!(
            validator.screen(&stamped(1_900), now()),
            Err(ContactRejection::TooFast)
        );
        assert_eq!(validator.screen(&stamped(2_000), now()), Ok(Screening::Proceed));
        assert_eq!(validator.screen(&stamped(two_hours), now()), Ok(Screening::Proceed));
        assert_eq!(
            validator.screen(&stamped(two_hours + 1), now()),
            Err(ContactRejection::Stale)
        );
    }

    #[test]
    fn future_stamp_counts_as_too_fast() {
        let validator = ContactValidator::default();
        assert_eq!(
            validator.screen(&stamped(-60_000), now()),
            Err(ContactRejection::TooFast)
        );
    }

    #[test]
    fn missing_or_zero_stamp_skips_timing() {
        let validator = ContactValidator::default();
        assert_eq!(validator.screen(&valid(), now()), Ok(Screening::Proceed));

        let zero = ContactSubmission {
            created_at: Some(0),
            ..valid()
        };
        assert_eq!(validator.screen(&zero, now()), Ok(Screening::Proceed));
    }

    #[test]
    fn configured_bounds_replace_defaults() {
        let validator = ContactValidator::new(ContactPolicy {
            min_age: Duration::from_secs(5),
            ..ContactPolicy::default()
        });
        assert_eq!(
            validator.screen(&stamped(4_999), now()),
            Err(ContactRejection::TooFast)
        );
    }

    #[test]
    fn email_structure() {
        assert!(looks_like_email("a@b.co"));
        assert!(looks_like_email("  first.last@sub.example.org "));
        assert!(!looks_like_email("a@b.c"));
        assert!(!looks_like_email("noatsign.com"));
        assert!(!looks_like_email("two@at@signs.com"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("user@.example"));
        assert!(!looks_like_email("user@example."));
        assert!(!looks_like_email("user.name@localhost"));
        assert!(!looks_like_email(&format!("{}@example.com", "a".repeat(250))));
    }

    #[test]
    fn field_rules_in_order() {
        let validator = ContactValidator::default();
        assert_eq!(validator.validate(&valid()), Ok(()));

        let cases = [
            (ContactSubmission { name: " A ".into(), ..valid() }, ContactRejection::Name),
            (ContactSubmission { email: "nope".into(), ..valid() }, ContactRejection::Email),
            (
                ContactSubmission { subject: "s".repeat(141), ..valid() },
                ContactRejection::SubjectTooLong,
            ),
            (
                ContactSubmission { message: "  too short ".trim_end().into(), ..valid() },
                ContactRejection::MessageTooShort,
            ),
            (
                ContactSubmission { message: "m".repeat(5001), ..valid() },
                ContactRejection::MessageTooLong,
            ),
        ];
        for (submission, expected) in cases {
            assert_eq!(validator.validate(&submission), Err(expected));
        }
    }

    #[test]
    fn length_limits_are_inclusive() {
        let validator = ContactValidator::default();
        let edge = ContactSubmission {
            name: "Al".into(),
            subject: "s".repeat(140),
            message: "m".repeat(5000),
            ..valid()
        };
        assert_eq!(validator.validate(&edge), Ok(()));

        let ten = ContactSubmission {
            message: "0123456789".into(),
            ..valid()
        };
        assert_eq!(validator.validate(&ten), Ok(()));
    }

    #[test]
    fn rejects_header_injection() {
        let validator = ContactValidator::default();
        let evil = ContactSubmission {
            name: "Evil\r\nBcc: x@y.com".into(),
            ..valid()
        };
        assert_eq!(validator.validate(&evil), Err(ContactRejection::HeaderInjection));

        let evil_subject = ContactSubmission {
            subject: "Hello\nBcc: x@y.com".into(),
            ..valid()
        };
        assert_eq!(
            validator.validate(&evil_subject),
            Err(ContactRejection::HeaderInjection)
        );
    }

    #[test]
    fn rejects_addresses_the_relay_cannot_use() {
        let validator = ContactValidator::default();
        for email in ["ada lovelace@example.com", "ada@exa mple.com", "a\"b@example.com"] {
            assert!(looks_like_email(email), "{email}");
            let submission = ContactSubmission { email: email.into(), ..valid() };
            assert_eq!(
                validator.validate(&submission),
                Err(ContactRejection::Email),
                "{email}"
            );
        }

        let plus = ContactSubmission { email: "ada+site@example.com".into(), ..valid() };
        assert_eq!(validator.validate(&plus), Ok(()));
    }

    #[test]
    fn line_breaks_in_the_message_are_fine() {
        let validator = ContactValidator::default();
        let multiline = ContactSubmission {
            message: "Line one\r\nLine two\nLine three".into(),
            ..valid()
        };
        assert_eq!(validator.validate(&multiline), Ok(()));
    }
}
