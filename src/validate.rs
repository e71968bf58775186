//! Email and password rules shared by the client forms and the server.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    static ref PASSWORD_CHARSET_RE: Regex = Regex::new(r"^[A-Za-z\d!@#$%^&*]*$").unwrap();
    static ref LOWER_RE: Regex = Regex::new(r"[a-z]").unwrap();
    static ref UPPER_RE: Regex = Regex::new(r"[A-Z]").unwrap();
    static ref DIGIT_RE: Regex = Regex::new(r"\d").unwrap();
    static ref SPECIAL_RE: Regex = Regex::new(r"[!@#$%^&*]").unwrap();
}

pub const EMAIL_ERROR: &str = "Please enter a valid email address.";
pub const PASSWORD_ERROR: &str = "Password does not meet complexity requirements.";

const MIN_PASSWORD_LEN: usize = 8;

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// One line of the password guideline list shown next to the password field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRule {
    MinLength,
    Uppercase,
    Lowercase,
    Digit,
    Special,
    AllowedCharacters,
}

impl PasswordRule {
    pub const GUIDELINES: [PasswordRule; 5] = [
        PasswordRule::MinLength,
        PasswordRule::Uppercase,
        PasswordRule::Lowercase,
        PasswordRule::Digit,
        PasswordRule::Special,
    ];

    pub fn describe(self) -> &'static str {
        match self {
            PasswordRule::MinLength => "At least 8 characters",
            PasswordRule::Uppercase => "At least one uppercase letter (A-Z)",
            PasswordRule::Lowercase => "At least one lowercase letter (a-z)",
            PasswordRule::Digit => "At least one number (0-9)",
            PasswordRule::Special => "At least one special character (!@#$%^&*)",
            PasswordRule::AllowedCharacters => {
                "Only letters, digits and !@#$%^&* are allowed"
            }
        }
    }
}

/// Returns the rules `password` breaks; empty means the password is acceptable.
pub fn unmet_password_rules(password: &str) -> Vec<PasswordRule> {
    let mut unmet = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LEN {
        unmet.push(PasswordRule::MinLength);
    }
    if !UPPER_RE.is_match(password) {
        unmet.push(PasswordRule::Uppercase);
    }
    if !LOWER_RE.is_match(password) {
        unmet.push(PasswordRule::Lowercase);
    }
    if !DIGIT_RE.is_match(password) {
        unmet.push(PasswordRule::Digit);
    }
    if !SPECIAL_RE.is_match(password) {
        unmet.push(PasswordRule::Special);
    }
    if !PASSWORD_CHARSET_RE.is_match(password) {
        unmet.push(PasswordRule::AllowedCharacters);
    }
    unmet
}

pub fn is_strong_password(password: &str) -> bool {
    unmet_password_rules(password).is_empty()
}

/// Trimmed, lower-cased form used as the lookup key for accounts.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
