use crate::api;
use crate::api::handlers::auth::{
    AuthConfig, CaptchaVerifier, NoopCaptchaVerifier, RemoteCaptchaVerifier,
};
use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub frontend_base_url: String,
    pub session_secret: SecretString,
    pub password_pepper: SecretString,
    pub session_ttl_seconds: i64,
    pub login_rate_limit: u32,
    pub login_rate_window_seconds: u64,
    pub login_block_seconds: u64,
    pub captcha_verify_url: Option<String>,
    pub captcha_secret: Option<SecretString>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the CAPTCHA client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config = AuthConfig::new(
        args.frontend_base_url,
        args.session_secret,
        args.password_pepper,
    )
    .with_session_ttl_seconds(args.session_ttl_seconds)
    .with_login_rate_limit(args.login_rate_limit)
    .with_login_rate_window_seconds(args.login_rate_window_seconds)
    .with_login_block_seconds(args.login_block_seconds);

    debug!("Auth config: {:?}", auth_config);

    let captcha: Arc<dyn CaptchaVerifier> = match (args.captcha_verify_url, args.captcha_secret) {
        (Some(url), Some(secret)) => Arc::new(RemoteCaptchaVerifier::new(url, secret)?),
        _ => {
            warn!("CAPTCHA verification is not configured; accepting all tokens");
            Arc::new(NoopCaptchaVerifier)
        }
    };

    api::new(args.port, args.dsn, auth_config, captcha).await
}
