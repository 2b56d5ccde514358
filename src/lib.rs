//! # Raporti (Reporting Backend)
//!
//! `raporti` is the backend of a small reporting application: report, group,
//! and person CRUD rendered by a separate frontend, behind the
//! authentication and session subsystem this crate centers on.
//!
//! ## Authentication & Sessions
//!
//! Passwords are stored as salted, peppered PBKDF2-HMAC-SHA256 records.
//! Sessions are stateless HMAC-signed tokens carried in an `HttpOnly` cookie
//! or a bearer header, so any instance can verify a request without a shared
//! session store.
//!
//! - **Freshness Re-check:** A token proves identity only. Role and active
//!   state are re-read from storage before privileged decisions, so
//!   deactivation takes effect immediately even for unexpired tokens.
//! - **Uniform Failures:** All credential and token failures collapse to
//!   generic unauthorized/forbidden responses; internal reasons reach only
//!   logs and the audit trail.
//!
//! ## Brute-force Mitigation
//!
//! Login attempts pass a fixed-window rate limiter (per source address and
//! per address+username) that escalates to a timed block. The table is
//! process-local; instances do not share counters.
//!
//! ## Roles
//!
//! Exactly two: `elevated` administrators and group-`scoped` administrators.
//! Scoped accounts carry their group assignment; elevated accounts have none.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        // Should be a hex string (full SHA-1 is 40 chars, but could be short)
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
