//! Stateless session tokens: `base64url(JSON claims) + "." + base64url(HMAC)`.
//!
//! Tokens are signed with a single static deployment secret and verified
//! without any server-side session store. Verification failures carry a
//! tagged reason for logs and tests only; callers collapse every reason to
//! one uniform "invalid" outcome so the client never learns why a token was
//! rejected.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::types::Role;

type HmacSha256 = Hmac<Sha256>;

/// Claims embedded in a session token. Immutable once issued; role and group
/// changes require re-authentication or the storage freshness re-check.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub group_number: Option<i32>,
    /// Issue time in epoch milliseconds.
    pub issued_at: i64,
    /// Expiry in epoch milliseconds, always `issued_at` + the fixed TTL.
    pub expires_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub(crate) enum TokenError {
    #[error("session signing secret is not configured")]
    Unconfigured,
    #[error("malformed token")]
    Malformed,
    #[error("bad token signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
}

/// Signs and verifies session tokens with the deployment secret.
pub(crate) struct TokenCodec {
    secret: SecretString,
}

impl TokenCodec {
    pub(crate) fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Serialize and sign `claims`.
    pub(crate) fn issue(&self, claims: &SessionClaims) -> Result<String, TokenError> {
        let payload = serde_json::to_vec(claims).map_err(|_| TokenError::Malformed)?;
        let body = Base64UrlUnpadded::encode_string(&payload);
        let signature = self.sign(body.as_bytes())?;
        Ok(format!(
            "{body}.{}",
            Base64UrlUnpadded::encode_string(&signature)
        ))
    }

    /// Verify signature and expiry, returning the embedded claims.
    pub(crate) fn verify(&self, token: &str, now_ms: i64) -> Result<SessionClaims, TokenError> {
        let mut parts = token.split('.');
        let (Some(body), Some(signature), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(TokenError::Malformed);
        };
        if body.is_empty() || signature.is_empty() {
            return Err(TokenError::Malformed);
        }

        let expected = self.sign(body.as_bytes())?;
        let supplied =
            Base64UrlUnpadded::decode_vec(signature).map_err(|_| TokenError::Malformed)?;
        if !bool::from(expected.ct_eq(&supplied)) {
            return Err(TokenError::BadSignature);
        }

        let payload = Base64UrlUnpadded::decode_vec(body).map_err(|_| TokenError::Malformed)?;
        let claims: SessionClaims =
            serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

        if now_ms > claims.expires_at {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn sign(&self, body: &[u8]) -> Result<Vec<u8>, TokenError> {
        let secret = self.secret.expose_secret();
        if secret.is_empty() {
            return Err(TokenError::Unconfigured);
        }
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| TokenError::Unconfigured)?;
        mac.update(body);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}
