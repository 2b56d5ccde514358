//! Cookie transport for session tokens.
//!
//! The token travels either as `Authorization: Bearer <token>` or in the
//! `raporti_session` cookie. Extraction prefers the bearer header so API
//! clients never depend on cookie semantics.

use axum::http::{
    HeaderMap, HeaderValue,
    header::{AUTHORIZATION, COOKIE, InvalidHeaderValue},
};
use percent_encoding::percent_decode_str;

pub(crate) const SESSION_COOKIE_NAME: &str = "raporti_session";

/// Build the `Set-Cookie` value carrying a freshly issued token.
///
/// `Max-Age` and `Expires` are set as a pair matching the token TTL; the
/// `Secure` flag is appended only when the connection is confirmed HTTPS.
pub(super) fn session_cookie(
    token: &str,
    ttl_seconds: i64,
    expires_at_ms: i64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={ttl_seconds}"
    );
    if let Some(expires) = http_date(expires_at_ms) {
        cookie.push_str("; Expires=");
        cookie.push_str(&expires);
    }
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Build the `Set-Cookie` value that clears the session cookie.
pub(super) fn clear_session_cookie(secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Extract the session token from a request.
///
/// Prefers the bearer header; falls back to the named cookie. Cookie values
/// that fail percent-decoding are passed through raw rather than dropped.
pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME {
            let decoded = percent_decode_str(val)
                .decode_utf8()
                .map_or_else(|_| val.to_string(), |cow| cow.into_owned());
            return Some(decoded);
        }
    }
    None
}

/// Whether the request arrived over HTTPS: either the deployment itself is
/// HTTPS-fronted, or a proxy says so via `x-forwarded-proto`.
pub(super) fn connection_is_secure(headers: &HeaderMap, deployment_secure: bool) -> bool {
    if deployment_secure {
        return true;
    }
    headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .is_some_and(|proto| proto.eq_ignore_ascii_case("https"))
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn http_date(epoch_ms: i64) -> Option<String> {
    chrono::DateTime::from_timestamp_millis(epoch_ms)
        .map(|when| when.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
}
