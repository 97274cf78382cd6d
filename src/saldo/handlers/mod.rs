//! Route handlers and shared request validation.

pub mod accounts;
pub mod entries;
pub mod health;
pub mod login;
pub mod root;

use regex::Regex;

// bcrypt only reads the first 72 bytes of input; longer passwords would
// silently truncate, so the upper bound is enforced here.
const PASSWORD_MIN_LENGTH: usize = 8;
const PASSWORD_MAX_LENGTH: usize = 72;

/// Lightweight email sanity check used before lookups and inserts.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Password length bounds; content is unconstrained.
pub fn valid_password(password: &str) -> bool {
    (PASSWORD_MIN_LENGTH..=PASSWORD_MAX_LENGTH).contains(&password.len())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_accepts_simple() {
        assert!(valid_email("user@example.com"));
    }

    #[test]
    fn valid_email_rejects_missing_at() {
        assert!(!valid_email("user.example.com"));
    }

    #[test]
    fn valid_email_rejects_spaces() {
        assert!(!valid_email("user name@example.com"));
    }

    #[test]
    fn valid_password_accepts_in_range() {
        assert!(valid_password("hunter2hunter2"));
        assert!(valid_password(&"a".repeat(72)));
    }

    #[test]
    fn valid_password_rejects_short() {
        assert!(!valid_password("hunter2"));
    }

    #[test]
    fn valid_password_rejects_past_bcrypt_limit() {
        assert!(!valid_password(&"a".repeat(73)));
    }

    #[test]
    fn normalize_email_lowercases_and_trims() {
        assert_eq!(normalize_email("  Ana@Example.COM "), "ana@example.com");
    }
}
