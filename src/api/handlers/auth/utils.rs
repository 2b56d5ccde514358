//! Small helpers for credential validation and request metadata.

use regex::Regex;

/// Usernames: 3-48 chars, lowercase letters/digits/`.`/`_`/`-`.
const USERNAME_PATTERN: &str = r"^[a-z0-9._-]{3,48}$";

pub(super) const PASSWORD_MIN_CHARS: usize = 10;
pub(super) const PASSWORD_MAX_CHARS: usize = 128;

/// Normalize a username for lookup/uniqueness checks.
///
/// Uniqueness is case-insensitive, so every lookup and every stored value
/// goes through this first.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Username format check on already-normalized input.
pub fn valid_username(username_normalized: &str) -> bool {
    Regex::new(USERNAME_PATTERN).is_ok_and(|regex| regex.is_match(username_normalized))
}

/// Password length policy; no charset restriction.
pub fn valid_password(password: &str) -> bool {
    let chars = password.chars().count();
    (PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&chars)
}

/// Current wall clock in epoch milliseconds, the unit token payloads carry.
pub(super) fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Extract a client IP for rate limiting and audit rows from common proxy headers.
pub(super) fn extract_client_ip(headers: &axum::http::HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
