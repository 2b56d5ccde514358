//! Login, session, and logout endpoints.

use axum::{
    Json,
    extract::Extension,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{RETRY_AFTER, SET_COOKIE, USER_AGENT},
    },
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info};

use super::audit::{AuthEvent, AuthEventKind, record_auth_event};
use super::cookie::{clear_session_cookie, connection_is_secure, session_cookie};
use super::error::AuthError;
use super::gateway::{authenticate, authorize, issue_session};
use super::rate_limit::RateLimitDecision;
use super::state::AuthState;
use super::types::{LoginRequest, LoginResponse, SessionResponse};
use super::utils::{extract_client_ip, normalize_username};

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated; session token issued", body = LoginResponse),
        (status = 400, description = "Missing payload or failed CAPTCHA", body = String),
        (status = 401, description = "Invalid credentials", body = String),
        (status = 429, description = "Rate limited", body = String)
    ),
    tag = "auth"
)]
pub async fn login(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let username = normalize_username(&request.username);
    let client_ip = extract_client_ip(&headers);

    // Rate-limit before CAPTCHA and credential work to keep abuse cheap to
    // reject: one bucket per source address, one per address+username.
    let ip_key = client_ip.clone().unwrap_or_else(|| "unknown".to_string());
    for key in [ip_key.clone(), format!("{ip_key}:{username}")] {
        if let RateLimitDecision::Blocked { retry_after } = auth_state.limiter().check(&key) {
            return error_response(&AuthError::RateLimited {
                retry_after_seconds: retry_after_seconds(retry_after),
            });
        }
    }

    if !auth_state
        .captcha()
        .verify(&request.captcha_token, client_ip.as_deref())
        .await
    {
        return (StatusCode::BAD_REQUEST, "CAPTCHA verification failed".to_string())
            .into_response();
    }

    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok());

    let outcome = match authenticate(&pool, &auth_state, &username, &request.password).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!("Login failed: {err}");
            return error_response(&err);
        }
    };

    let identity = match outcome {
        Ok(identity) => identity,
        Err(denial) => {
            record_auth_event(
                &pool,
                AuthEvent {
                    kind: AuthEventKind::LoginFailure,
                    user_id: None,
                    username: &username,
                    source_addr: client_ip.as_deref(),
                    user_agent,
                    detail: denial.detail(),
                },
            )
            .await;
            return error_response(&denial.into_error());
        }
    };

    let (token, expires_at) = match issue_session(&auth_state, &identity) {
        Ok(issued) => issued,
        Err(err) => {
            error!("Failed to issue session token: {err}");
            return error_response(&err);
        }
    };

    record_auth_event(
        &pool,
        AuthEvent {
            kind: AuthEventKind::LoginSuccess,
            user_id: Some(identity.user_id),
            username: &username,
            source_addr: client_ip.as_deref(),
            user_agent,
            detail: "login ok",
        },
    )
    .await;
    info!(username = %identity.username, "login succeeded");

    let secure = connection_is_secure(&headers, auth_state.config().session_cookie_secure());
    let mut response_headers = HeaderMap::new();
    match session_cookie(
        &token,
        auth_state.config().session_ttl_seconds(),
        expires_at,
        secure,
    ) {
        Ok(cookie) => {
            // Append rather than insert so unrelated Set-Cookie headers survive.
            response_headers.append(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build session cookie: {err}"),
    }

    (
        StatusCode::OK,
        response_headers,
        Json(LoginResponse { token, expires_at }),
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Session is active", body = SessionResponse),
        (status = 401, description = "No valid session", body = String)
    ),
    tag = "auth"
)]
pub async fn session(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    match authorize(&headers, &pool, &auth_state).await {
        Ok((identity, claims)) => {
            let response = SessionResponse {
                user_id: identity.user_id,
                username: identity.username,
                full_name: identity.full_name,
                role: identity.role,
                group_number: identity.group_number,
                expires_at: claims.expires_at,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Session cookie cleared")
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    // Tokens are stateless; logout only clears the cookie and is idempotent.
    let secure = connection_is_secure(&headers, auth_state.config().session_cookie_secure());
    let mut response_headers = HeaderMap::new();
    match clear_session_cookie(secure) {
        Ok(cookie) => {
            response_headers.append(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build clearing cookie: {err}"),
    }
    (StatusCode::NO_CONTENT, response_headers).into_response()
}

fn error_response(err: &AuthError) -> Response {
    if err.status() == StatusCode::INTERNAL_SERVER_ERROR {
        error!("auth failure: {err}");
    }
    if let AuthError::RateLimited {
        retry_after_seconds,
    } = err
    {
        return rate_limited_response(*retry_after_seconds);
    }
    (err.status(), err.public_message().to_string()).into_response()
}

fn rate_limited_response(retry_after_seconds: u64) -> Response {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&retry_after_seconds.to_string()) {
        headers.insert(RETRY_AFTER, value);
    }
    (
        StatusCode::TOO_MANY_REQUESTS,
        headers,
        "Rate limited".to_string(),
    )
        .into_response()
}

fn retry_after_seconds(retry_after: std::time::Duration) -> u64 {
    let seconds = retry_after.as_secs();
    if retry_after.subsec_millis() > 0 {
        seconds.saturating_add(1)
    } else {
        seconds
    }
}
