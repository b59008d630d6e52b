//! Normalized inbox messages.

use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;

/// Subject used when the provider reports none.
pub const DEFAULT_SUBJECT: &str = "No Subject";

/// One normalized inbox item.
///
/// Immutable once constructed; lives only for the duration of a fetch response
/// unless forwarded to a subscriber. The `id` is unique within an address, not
/// globally.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Provider-assigned message id (unique per address).
    pub id: u64,
    /// Sender address as reported by the provider.
    pub from: String,
    /// Subject line, defaulted to [`DEFAULT_SUBJECT`] when absent.
    pub subject: String,
    /// Plain-text body (falls back to HTML body if the text part is empty).
    pub body: String,
    /// Provider timestamp, verbatim.
    pub date: String,
    /// Milliseconds since the Unix epoch derived from `date` (0 if unparseable).
    pub timestamp: i64,
    /// Extracted one-time passcode, if any pattern matched.
    pub otp: Option<String>,
}

/// Derives epoch milliseconds from a provider date string.
///
/// Accepts RFC 3339 or the provider's `YYYY-MM-DD HH:MM:SS` form; anything
/// else yields 0 rather than failing the message.
#[must_use]
pub fn parse_timestamp_ms(date: &str) -> i64 {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return dt.timestamp_millis();
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S") {
        return naive.and_utc().timestamp_millis();
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider_format() {
        let ms = parse_timestamp_ms("2024-03-01 12:00:00");
        assert_eq!(ms, 1_709_294_400_000);
    }

    #[test]
    fn test_parse_rfc3339() {
        let ms = parse_timestamp_ms("2024-03-01T12:00:00Z");
        assert_eq!(ms, 1_709_294_400_000);
    }

    #[test]
    fn test_parse_garbage_is_zero() {
        assert_eq!(parse_timestamp_ms("yesterday-ish"), 0);
        assert_eq!(parse_timestamp_ms(""), 0);
    }

    #[test]
    fn test_serializes_with_expected_fields() {
        let msg = Message {
            id: 7,
            from: "noreply@example.com".into(),
            subject: DEFAULT_SUBJECT.into(),
            body: "Your code is 123456".into(),
            date: "2024-03-01 12:00:00".into(),
            timestamp: 1_709_294_400_000,
            otp: Some("123456".into()),
        };

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["subject"], "No Subject");
        assert_eq!(json["otp"], "123456");
    }
}
