//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account role. `Elevated` administrators see everything; `Scoped`
/// administrators are confined to their assigned group.
#[derive(ToSchema, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Elevated,
    Scoped,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Elevated => "elevated",
            Self::Scoped => "scoped",
        }
    }

    /// Parse the database representation; unknown values map to `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "elevated" => Some(Self::Elevated),
            "scoped" => Some(Self::Scoped),
            _ => None,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// Response token from the third-party CAPTCHA widget.
    #[serde(default)]
    pub captcha_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// Token expiry in epoch milliseconds.
    pub expires_at: i64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub group_number: Option<i32>,
    pub expires_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn role_round_trips_lowercase() -> Result<()> {
        assert_eq!(serde_json::to_string(&Role::Elevated)?, "\"elevated\"");
        assert_eq!(serde_json::from_str::<Role>("\"scoped\"")?, Role::Scoped);
        Ok(())
    }

    #[test]
    fn role_parse_rejects_unknown() {
        assert_eq!(Role::parse("elevated"), Some(Role::Elevated));
        assert_eq!(Role::parse("scoped"), Some(Role::Scoped));
        assert_eq!(Role::parse("root"), None);
    }

    #[test]
    fn login_request_tolerates_missing_captcha_field() -> Result<()> {
        let decoded: LoginRequest =
            serde_json::from_str(r#"{"username":"alice","password":"secret"}"#)?;
        assert_eq!(decoded.username, "alice");
        assert!(decoded.captcha_token.is_empty());
        Ok(())
    }

    #[test]
    fn session_response_uses_camel_case() -> Result<()> {
        let response = SessionResponse {
            user_id: 7,
            username: "alice".to_string(),
            full_name: "Alice Admin".to_string(),
            role: Role::Scoped,
            group_number: Some(3),
            expires_at: 1_000,
        };
        let value = serde_json::to_value(&response)?;
        assert_eq!(value.get("userId"), Some(&serde_json::json!(7)));
        assert_eq!(value.get("groupNumber"), Some(&serde_json::json!(3)));
        Ok(())
    }
}
