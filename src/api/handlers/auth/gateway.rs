//! Identity orchestration: credential checks, token issue, and request
//! authorization.
//!
//! A verified token proves who the caller is, not what they may currently
//! do. Before any privileged decision the account's role and active flag are
//! re-read from storage, so deactivating an account or demoting a role takes
//! effect immediately even for unexpired tokens.

use axum::http::HeaderMap;
use sqlx::PgPool;
use tracing::warn;

use super::cookie::extract_session_token;
use super::error::AuthError;
use super::password::verify_password;
use super::state::AuthState;
use super::storage::{AuthorityRecord, fetch_authority, lookup_credential};
use super::token::SessionClaims;
use super::types::Role;
use super::utils::{normalize_username, now_epoch_ms};

/// Authenticated identity view. Never carries the stored password hash.
#[derive(Clone, Debug)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub group_number: Option<i32>,
}

impl Identity {
    /// Pure role predicate; call only on a freshly fetched identity.
    #[must_use]
    pub fn is_elevated(&self) -> bool {
        self.role == Role::Elevated
    }
}

/// Tagged login denial. The tag reaches logs and the audit detail field;
/// the client always sees the same uniform unauthorized response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum LoginDenial {
    EmptyInput,
    UnknownAccount,
    InactiveAccount,
    WrongPassword,
    UnusableRecord,
}

impl LoginDenial {
    pub(super) fn detail(self) -> &'static str {
        match self {
            Self::EmptyInput => "empty username or password",
            Self::UnknownAccount => "unknown account",
            Self::InactiveAccount => "account inactive",
            Self::WrongPassword => "password mismatch",
            Self::UnusableRecord => "unusable credential record",
        }
    }

    pub(super) fn into_error(self) -> AuthError {
        match self {
            Self::InactiveAccount => AuthError::InactiveAccount,
            _ => AuthError::InvalidCredentials,
        }
    }
}

/// Validate a username/password pair against the stored credential.
///
/// The outer `Result` is a storage failure; the inner one is the
/// authentication decision with its tagged denial reason.
pub(super) async fn authenticate(
    pool: &PgPool,
    state: &AuthState,
    username: &str,
    password: &str,
) -> Result<Result<Identity, LoginDenial>, AuthError> {
    let username = normalize_username(username);
    if username.is_empty() || password.is_empty() {
        return Ok(Err(LoginDenial::EmptyInput));
    }

    let Some(record) = lookup_credential(pool, &username)
        .await
        .map_err(AuthError::Storage)?
    else {
        return Ok(Err(LoginDenial::UnknownAccount));
    };

    if !record.is_active {
        return Ok(Err(LoginDenial::InactiveAccount));
    }

    if !verify_password(password, state.config().password_pepper(), &record.password_hash) {
        return Ok(Err(LoginDenial::WrongPassword));
    }

    let Some(role) = Role::parse(&record.role) else {
        warn!(username = %record.username, "credential row carries an unknown role");
        return Ok(Err(LoginDenial::UnusableRecord));
    };

    Ok(Ok(Identity {
        user_id: record.user_id,
        username: record.username,
        full_name: record.full_name,
        role,
        group_number: record.group_number,
    }))
}

/// Issue a signed session token for an authenticated identity.
pub(super) fn issue_session(
    state: &AuthState,
    identity: &Identity,
) -> Result<(String, i64), AuthError> {
    let issued_at = now_epoch_ms();
    let expires_at = issued_at.saturating_add(state.config().session_ttl_ms());
    let claims = SessionClaims {
        user_id: identity.user_id,
        username: identity.username.clone(),
        full_name: identity.full_name.clone(),
        role: identity.role,
        group_number: identity.group_number,
        issued_at,
        expires_at,
    };
    let token = state.codec().issue(&claims)?;
    Ok((token, expires_at))
}

/// Authorize a request: extract the token, verify it, and re-read the
/// account's current authority from storage.
///
/// # Errors
/// Any token or account failure collapses to a uniform unauthorized outcome
/// for the caller; the tagged variant is for logs only.
pub async fn authorize(
    headers: &HeaderMap,
    pool: &PgPool,
    state: &AuthState,
) -> Result<(Identity, SessionClaims), AuthError> {
    let Some(token) = extract_session_token(headers) else {
        return Err(AuthError::MalformedToken);
    };

    let claims = state.codec().verify(&token, now_epoch_ms())?;

    let authority = fetch_authority(pool, claims.user_id)
        .await
        .map_err(AuthError::Storage)?;
    let identity = refresh_identity(&claims, authority)?;
    Ok((identity, claims))
}

/// Rebuild the identity from the fresh authority row.
///
/// Token claims are deliberately discarded for everything but the user id:
/// a deactivated or deleted account fails here even with a valid, unexpired
/// token, and a changed role takes effect without re-issuing the token.
pub(super) fn refresh_identity(
    claims: &SessionClaims,
    authority: Option<AuthorityRecord>,
) -> Result<Identity, AuthError> {
    let Some(authority) = authority else {
        return Err(AuthError::InactiveAccount);
    };
    if !authority.is_active {
        return Err(AuthError::InactiveAccount);
    }
    let Some(role) = Role::parse(&authority.role) else {
        return Err(AuthError::InactiveAccount);
    };
    Ok(Identity {
        user_id: claims.user_id,
        username: authority.username,
        full_name: authority.full_name,
        role,
        group_number: authority.group_number,
    })
}

/// Gate for handlers that require the elevated role.
///
/// # Errors
/// Returns `InsufficientRole` for scoped identities.
pub fn require_elevated(identity: &Identity) -> Result<(), AuthError> {
    if identity.is_elevated() {
        Ok(())
    } else {
        Err(AuthError::InsufficientRole)
    }
}
