//! Auth state and configuration.

use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;

use super::captcha::CaptchaVerifier;
use super::rate_limit::{FixedWindowLimiter, RateLimitSettings};
use super::token::TokenCodec;

// Sessions are valid for a fixed 12 hours from issue.
const DEFAULT_SESSION_TTL_SECONDS: i64 = 12 * 60 * 60;
const DEFAULT_LOGIN_RATE_LIMIT: u32 = 5;
const DEFAULT_LOGIN_RATE_WINDOW_SECONDS: u64 = 60;
const DEFAULT_LOGIN_BLOCK_SECONDS: u64 = 15 * 60;

#[derive(Clone)]
pub struct AuthConfig {
    frontend_base_url: String,
    session_ttl_seconds: i64,
    session_secret: SecretString,
    password_pepper: SecretString,
    login_rate_limit: u32,
    login_rate_window_seconds: u64,
    login_block_seconds: u64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(
        frontend_base_url: String,
        session_secret: SecretString,
        password_pepper: SecretString,
    ) -> Self {
        Self {
            frontend_base_url,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            session_secret,
            password_pepper,
            login_rate_limit: DEFAULT_LOGIN_RATE_LIMIT,
            login_rate_window_seconds: DEFAULT_LOGIN_RATE_WINDOW_SECONDS,
            login_block_seconds: DEFAULT_LOGIN_BLOCK_SECONDS,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_login_rate_limit(mut self, limit: u32) -> Self {
        self.login_rate_limit = limit;
        self
    }

    #[must_use]
    pub fn with_login_rate_window_seconds(mut self, seconds: u64) -> Self {
        self.login_rate_window_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_login_block_seconds(mut self, seconds: u64) -> Self {
        self.login_block_seconds = seconds;
        self
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    pub(super) fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    pub(super) fn session_ttl_ms(&self) -> i64 {
        self.session_ttl_seconds.saturating_mul(1000)
    }

    /// Only mark cookies secure when the deployment is served over HTTPS.
    pub(super) fn session_cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }

    pub(super) fn session_secret(&self) -> &SecretString {
        &self.session_secret
    }

    pub(super) fn password_pepper(&self) -> &SecretString {
        &self.password_pepper
    }

    fn rate_limit_settings(&self) -> RateLimitSettings {
        RateLimitSettings {
            limit: self.login_rate_limit,
            window: Duration::from_secs(self.login_rate_window_seconds),
            block: (self.login_block_seconds > 0)
                .then(|| Duration::from_secs(self.login_block_seconds)),
            ..RateLimitSettings::default()
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("frontend_base_url", &self.frontend_base_url)
            .field("session_ttl_seconds", &self.session_ttl_seconds)
            .field("session_secret", &"***")
            .field("password_pepper", &"***")
            .field("login_rate_limit", &self.login_rate_limit)
            .field("login_rate_window_seconds", &self.login_rate_window_seconds)
            .field("login_block_seconds", &self.login_block_seconds)
            .finish()
    }
}

pub struct AuthState {
    config: AuthConfig,
    codec: TokenCodec,
    limiter: FixedWindowLimiter,
    captcha: Arc<dyn CaptchaVerifier>,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, captcha: Arc<dyn CaptchaVerifier>) -> Self {
        let codec = TokenCodec::new(config.session_secret().clone());
        let limiter = FixedWindowLimiter::new(config.rate_limit_settings());
        Self {
            config,
            codec,
            limiter,
            captcha,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(super) fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub(super) fn limiter(&self) -> &FixedWindowLimiter {
        &self.limiter
    }

    pub(super) fn captcha(&self) -> &dyn CaptchaVerifier {
        self.captcha.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::super::captcha::NoopCaptchaVerifier;
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::new(
            "https://raporti.dev".to_string(),
            SecretString::from("session-secret".to_string()),
            SecretString::from("pepper".to_string()),
        )
    }

    #[test]
    fn defaults_and_overrides() {
        let config = config();
        assert_eq!(
            config.session_ttl_seconds(),
            super::DEFAULT_SESSION_TTL_SECONDS
        );
        assert_eq!(config.session_ttl_ms(), 12 * 60 * 60 * 1000);
        assert_eq!(config.login_rate_limit, super::DEFAULT_LOGIN_RATE_LIMIT);

        let config = config
            .with_session_ttl_seconds(600)
            .with_login_rate_limit(3)
            .with_login_rate_window_seconds(30)
            .with_login_block_seconds(120);
        assert_eq!(config.session_ttl_seconds(), 600);
        assert_eq!(config.login_rate_limit, 3);
        assert_eq!(config.login_rate_window_seconds, 30);
        assert_eq!(config.login_block_seconds, 120);
    }

    #[test]
    fn cookie_secure_follows_frontend_scheme() {
        assert!(config().session_cookie_secure());
        let http = AuthConfig::new(
            "http://localhost:3000".to_string(),
            SecretString::from("s".to_string()),
            SecretString::from("p".to_string()),
        );
        assert!(!http.session_cookie_secure());
    }

    #[test]
    fn debug_redacts_secrets() {
        let rendered = format!("{:?}", config());
        assert!(rendered.contains("***"));
        assert!(!rendered.contains("session-secret"));
        assert!(!rendered.contains("pepper\""));
    }

    #[test]
    fn zero_block_seconds_means_window_remainder() {
        let settings = config().with_login_block_seconds(0).rate_limit_settings();
        assert!(settings.block.is_none());
    }

    #[test]
    fn auth_state_exposes_parts() {
        let state = AuthState::new(config(), Arc::new(NoopCaptchaVerifier));
        assert!(state.config().session_cookie_secure());
        assert!(!state.limiter().check("key").is_limited());
    }
}
