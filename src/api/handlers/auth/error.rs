//! Auth failure taxonomy.
//!
//! Internally every failure is tagged so logs and the audit trail can tell
//! an expired token from a bad signature. Externally the variants collapse:
//! callers see a uniform 401/403/429/500 with a generic body, and a client
//! can never distinguish wrong-password from unknown-username.

use axum::http::StatusCode;

use super::token::TokenError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account is inactive")]
    InactiveAccount,
    #[error("malformed token")]
    MalformedToken,
    #[error("expired token")]
    ExpiredToken,
    #[error("bad token signature")]
    BadSignature,
    #[error("insufficient role")]
    InsufficientRole,
    #[error("rate limited, retry in {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },
    #[error("missing configuration: {0}")]
    ConfigurationMissing(&'static str),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl AuthError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials
            | Self::InactiveAccount
            | Self::MalformedToken
            | Self::ExpiredToken
            | Self::BadSignature => StatusCode::UNAUTHORIZED,
            Self::InsufficientRole => StatusCode::FORBIDDEN,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::ConfigurationMissing(_) | Self::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Generic body for the client; the tagged variant stays in logs.
    #[must_use]
    pub fn public_message(&self) -> &'static str {
        match self.status() {
            StatusCode::FORBIDDEN => "Forbidden",
            StatusCode::TOO_MANY_REQUESTS => "Rate limited",
            StatusCode::INTERNAL_SERVER_ERROR => "Internal error",
            _ => "Unauthorized",
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Unconfigured => Self::ConfigurationMissing("session signing secret"),
            TokenError::Malformed => Self::MalformedToken,
            TokenError::BadSignature => Self::BadSignature,
            TokenError::Expired => Self::ExpiredToken,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failures_collapse_to_unauthorized() {
        for err in [
            AuthError::InvalidCredentials,
            AuthError::InactiveAccount,
            AuthError::MalformedToken,
            AuthError::ExpiredToken,
            AuthError::BadSignature,
        ] {
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(err.public_message(), "Unauthorized");
        }
    }

    #[test]
    fn role_and_rate_failures_keep_distinct_statuses() {
        assert_eq!(AuthError::InsufficientRole.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::RateLimited {
                retry_after_seconds: 30
            }
            .status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn configuration_missing_is_loud() {
        let err = AuthError::ConfigurationMissing("password pepper");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal error");
    }

    #[test]
    fn token_errors_map_onto_taxonomy() {
        assert!(matches!(
            AuthError::from(TokenError::Expired),
            AuthError::ExpiredToken
        ));
        assert!(matches!(
            AuthError::from(TokenError::Unconfigured),
            AuthError::ConfigurationMissing(_)
        ));
    }
}
