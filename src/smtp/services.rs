//! Capabilities injected into every session worker

use std::sync::LazyLock;

use regex::Regex;

static ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s<>]+@[^@\s<>]+$").expect("address pattern is valid")
});

/// Decides whether a MAIL FROM / RCPT TO address is acceptable.
pub trait EmailValidator: Send + Sync {
    fn validate_email_address(&self, address: &str) -> bool;
}

/// Cleans text captured from a client before it is handed downstream.
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, input: &str) -> String;
}

/// Accepts `local@domain` with exactly one `@` and no whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicEmailValidator;

impl EmailValidator for BasicEmailValidator {
    fn validate_email_address(&self, address: &str) -> bool {
        ADDRESS.is_match(address)
    }
}

/// Strips scripts and markup that could run when captured mail is displayed.
#[derive(Debug, Clone, Copy, Default)]
pub struct XssSanitizer;

impl Sanitizer for XssSanitizer {
    fn sanitize(&self, input: &str) -> String {
        ammonia::clean(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_validator() {
        let validator = BasicEmailValidator;

        assert!(validator.validate_email_address("user@example.com"));
        assert!(validator.validate_email_address("first.last+tag@test.local"));

        assert!(!validator.validate_email_address("invalid"));
        assert!(!validator.validate_email_address("@example.com"));
        assert!(!validator.validate_email_address("user@"));
        assert!(!validator.validate_email_address("a@b@c"));
        assert!(!validator.validate_email_address("user name@example.com"));
    }

    #[test]
    fn test_sanitizer_removes_scripts() {
        let sanitizer = XssSanitizer;
        assert_eq!(sanitizer.sanitize("<script>alert(1)</script>Hi"), "Hi");
        assert_eq!(sanitizer.sanitize("Plain subject"), "Plain subject");
    }
}
