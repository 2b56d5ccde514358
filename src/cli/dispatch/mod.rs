//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action, such as starting the API server with its full configuration state.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::auth;
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    // Validate CAPTCHA arguments as a pair
    crate::cli::commands::validate(matches).map_err(|e| anyhow::anyhow!(e))?;

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        frontend_base_url: auth_opts.frontend_base_url,
        session_secret: auth_opts.session_secret,
        password_pepper: auth_opts.password_pepper,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        login_rate_limit: auth_opts.login_rate_limit,
        login_rate_window_seconds: auth_opts.login_rate_window_seconds,
        login_block_seconds: auth_opts.login_block_seconds,
        captcha_verify_url: auth_opts.captcha_verify_url,
        captcha_secret: auth_opts.captcha_secret,
    }))
}
