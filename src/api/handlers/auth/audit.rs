//! Security audit trail for login attempts.
//!
//! Free-text fields are normalized (whitespace collapsed, length capped)
//! before the append-only insert. This is purely a logging sink: a failed
//! write is logged and swallowed, it never changes the authentication
//! outcome.

use sqlx::PgPool;
use tracing::error;

use super::storage::insert_auth_activity;

const USERNAME_CAP: usize = 64;
const SOURCE_ADDR_CAP: usize = 64;
const USER_AGENT_CAP: usize = 256;
const DETAIL_CAP: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum AuthEventKind {
    LoginSuccess,
    LoginFailure,
}

impl AuthEventKind {
    // The row value space is exactly these two strings; the enum is the only
    // way to construct an event, so no other kind can reach storage.
    pub(super) fn as_str(self) -> &'static str {
        match self {
            Self::LoginSuccess => "login_success",
            Self::LoginFailure => "login_failure",
        }
    }
}

pub(super) struct AuthEvent<'a> {
    pub(super) kind: AuthEventKind,
    pub(super) user_id: Option<i64>,
    pub(super) username: &'a str,
    pub(super) source_addr: Option<&'a str>,
    pub(super) user_agent: Option<&'a str>,
    pub(super) detail: &'a str,
}

/// Append one normalized audit row; never fails the caller.
pub(super) async fn record_auth_event(pool: &PgPool, event: AuthEvent<'_>) {
    let username = normalize_field(event.username, USERNAME_CAP);
    let source_addr = normalize_field(event.source_addr.unwrap_or_default(), SOURCE_ADDR_CAP);
    let user_agent = normalize_field(event.user_agent.unwrap_or_default(), USER_AGENT_CAP);
    let detail = normalize_field(event.detail, DETAIL_CAP);

    if let Err(err) = insert_auth_activity(
        pool,
        event.kind.as_str(),
        event.user_id,
        &username,
        &source_addr,
        &user_agent,
        &detail,
    )
    .await
    {
        error!("Failed to record auth activity: {err}");
    }
}

/// Collapse runs of whitespace to single spaces and cap the length.
fn normalize_field(value: &str, cap: usize) -> String {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(cap).collect()
}
