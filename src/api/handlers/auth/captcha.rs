//! Third-party CAPTCHA verification boundary.
//!
//! The provider is an external collaborator: login hands it the widget
//! response token and acts on a yes/no answer. The remote implementation
//! speaks the `secret`/`response`/`remoteip` form-post dialect shared by the
//! common providers; deployments without a configured provider fall back to
//! the no-op verifier.

use anyhow::{Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::warn;

#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// Whether `token` is a valid CAPTCHA response for this request.
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> bool;
}

/// Accepts every token; used when no provider is configured and in tests.
#[derive(Clone, Debug)]
pub struct NoopCaptchaVerifier;

#[async_trait]
impl CaptchaVerifier for NoopCaptchaVerifier {
    async fn verify(&self, _token: &str, _remote_ip: Option<&str>) -> bool {
        true
    }
}

#[derive(Deserialize)]
struct VerifyResponse {
    success: bool,
}

/// Verifies tokens against a provider's siteverify endpoint.
pub struct RemoteCaptchaVerifier {
    client: reqwest::Client,
    verify_url: String,
    secret: SecretString,
}

impl RemoteCaptchaVerifier {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(verify_url: String, secret: SecretString) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()
            .context("failed to build CAPTCHA HTTP client")?;
        Ok(Self {
            client,
            verify_url,
            secret,
        })
    }
}

#[async_trait]
impl CaptchaVerifier for RemoteCaptchaVerifier {
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> bool {
        if token.is_empty() {
            return false;
        }

        let mut form = vec![
            ("secret", self.secret.expose_secret().to_string()),
            ("response", token.to_string()),
        ];
        if let Some(ip) = remote_ip {
            form.push(("remoteip", ip.to_string()));
        }

        let response = match self.client.post(&self.verify_url).form(&form).send().await {
            Ok(response) => response,
            Err(err) => {
                // Provider outages fail closed for logins; the operator sees why here.
                warn!("CAPTCHA verification request failed: {err}");
                return false;
            }
        };

        match response.json::<VerifyResponse>().await {
            Ok(body) => body.success,
            Err(err) => {
                warn!("CAPTCHA verification response unreadable: {err}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_verifier_accepts_anything() {
        let verifier = NoopCaptchaVerifier;
        assert!(verifier.verify("", None).await);
        assert!(verifier.verify("any-token", Some("10.0.0.1")).await);
    }

    #[tokio::test]
    async fn remote_verifier_rejects_empty_token_without_network() -> Result<()> {
        let verifier = RemoteCaptchaVerifier::new(
            "https://captcha.example.test/siteverify".to_string(),
            SecretString::from("secret".to_string()),
        )?;
        assert!(!verifier.verify("", Some("10.0.0.1")).await);
        Ok(())
    }
}
