use anyhow::{Context, Result};
use clap::{Arg, Command};
use secrecy::SecretString;

pub fn with_args(command: Command) -> Command {
    let command = with_session_args(command);
    let command = with_rate_limit_args(command);
    with_captcha_args(command)
}

fn with_session_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("frontend-base-url")
                .long("frontend-base-url")
                .help("Frontend base URL used for CORS and cookie security")
                .env("RAPORTI_FRONTEND_BASE_URL")
                .default_value("https://raporti.dev"),
        )
        .arg(
            Arg::new("session-secret")
                .long("session-secret")
                .help("Secret used to sign session tokens")
                .env("RAPORTI_SESSION_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new("password-pepper")
                .long("password-pepper")
                .help("Server-side secret mixed into every password hash")
                .env("RAPORTI_PASSWORD_PEPPER")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new("session-ttl-seconds")
                .long("session-ttl-seconds")
                .help("Session token TTL in seconds")
                .env("RAPORTI_SESSION_TTL_SECONDS")
                .default_value("43200")
                .value_parser(clap::value_parser!(i64)),
        )
}

fn with_rate_limit_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("login-rate-limit")
                .long("login-rate-limit")
                .help("Login attempts allowed per window and key")
                .env("RAPORTI_LOGIN_RATE_LIMIT")
                .default_value("5")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("login-rate-window-seconds")
                .long("login-rate-window-seconds")
                .help("Login rate-limit window in seconds")
                .env("RAPORTI_LOGIN_RATE_WINDOW_SECONDS")
                .default_value("60")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("login-block-seconds")
                .long("login-block-seconds")
                .help("Block duration after the limit is exceeded (0 = remainder of the window)")
                .env("RAPORTI_LOGIN_BLOCK_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(u64)),
        )
}

fn with_captcha_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("captcha-verify-url")
                .long("captcha-verify-url")
                .help("CAPTCHA provider siteverify endpoint; unset disables verification")
                .env("RAPORTI_CAPTCHA_VERIFY_URL"),
        )
        .arg(
            Arg::new("captcha-secret")
                .long("captcha-secret")
                .help("CAPTCHA provider secret key")
                .env("RAPORTI_CAPTCHA_SECRET")
                .hide_env_values(true),
        )
}

pub struct Options {
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

impl Options {
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        Ok(Self {
            frontend_base_url: matches
                .get_one::<String>("frontend-base-url")
                .cloned()
                .context("missing required argument: --frontend-base-url")?,
            session_secret: matches
                .get_one::<String>("session-secret")
                .cloned()
                .map(SecretString::from)
                .context("missing required argument: --session-secret")?,
            password_pepper: matches
                .get_one::<String>("password-pepper")
                .cloned()
                .map(SecretString::from)
                .context("missing required argument: --password-pepper")?,
            session_ttl_seconds: matches
                .get_one::<i64>("session-ttl-seconds")
                .copied()
                .unwrap_or(43_200),
            login_rate_limit: matches
                .get_one::<u32>("login-rate-limit")
                .copied()
                .unwrap_or(5),
            login_rate_window_seconds: matches
                .get_one::<u64>("login-rate-window-seconds")
                .copied()
                .unwrap_or(60),
            login_block_seconds: matches
                .get_one::<u64>("login-block-seconds")
                .copied()
                .unwrap_or(900),
            captcha_verify_url: matches.get_one::<String>("captcha-verify-url").cloned(),
            captcha_secret: matches
                .get_one::<String>("captcha-secret")
                .cloned()
                .map(SecretString::from),
        })
    }
}
