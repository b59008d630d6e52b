//! One-time-passcode extraction from message text.
//!
//! This module is a pure function over text: it applies an ordered list of
//! heuristic patterns and returns the digit run from the first pattern that
//! matches anywhere in the input.
//!
//! # Example
//!
//! ```
//! use mailwatch::extractor::extract_otp;
//!
//! assert_eq!(extract_otp("Your code is 123456.").as_deref(), Some("123456"));
//! assert_eq!(extract_otp("PIN: 123"), None); // too short
//! ```

use regex::Regex;
use std::sync::LazyLock;

/// Minimum accepted passcode length in digits.
pub const MIN_OTP_DIGITS: usize = 4;

/// Ordered heuristic patterns. Earlier patterns take priority.
static OTP_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b\d{4,6}\b",                  // bare 4-6 digit run
        r"(?i)code[:\s]*(\d{4,6})",      // Code: 123456
        r"(?i)otp[:\s]*(\d{4,6})",       // OTP: 123456
        r"(?i)verification[:\s]*(\d{4,6})", // Verification: 123456
        r"(?i)(\d{4,6})\s*is your code", // 123456 is your code
        r"(?i)your code is\s*(\d{4,6})", // Your code is 123456
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid OTP pattern"))
    .collect()
});

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid digit run pattern"));

/// Extracts a one-time passcode from free-form text.
///
/// Patterns are tried in a fixed order and the first one that matches wins.
/// The returned value is the first digit run inside the matched fragment,
/// accepted only if it is at least [`MIN_OTP_DIGITS`] long; a shorter run does
/// not short-circuit the remaining patterns.
///
/// Returns `None` if no pattern yields an acceptable code. Purely functional:
/// no side effects, no failure modes beyond "no code found".
#[must_use]
pub fn extract_otp(text: &str) -> Option<String> {
    for pattern in OTP_PATTERNS.iter() {
        let Some(found) = pattern.find(text) else {
            continue;
        };

        if let Some(run) = DIGIT_RUN.find(found.as_str()) {
            if run.as_str().len() >= MIN_OTP_DIGITS {
                return Some(run.as_str().to_string());
            }
        }
    }

    None
}
