//! Database helpers for credential, authority, and audit state.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;

/// Full credential row used during login. The hash never leaves this module
/// family; handlers only ever see the derived identity view.
pub(super) struct CredentialRecord {
    pub(super) user_id: i64,
    pub(super) username: String,
    pub(super) full_name: String,
    pub(super) password_hash: String,
    pub(super) role: String,
    pub(super) group_number: Option<i32>,
    pub(super) is_active: bool,
}

/// Current authority for a user, re-read on every privileged request so a
/// token issued before a deactivation or role change stops working.
pub(super) struct AuthorityRecord {
    pub(super) username: String,
    pub(super) full_name: String,
    pub(super) role: String,
    pub(super) group_number: Option<i32>,
    pub(super) is_active: bool,
}

/// Look up a credential record by normalized username.
pub(super) async fn lookup_credential(
    pool: &PgPool,
    username: &str,
) -> Result<Option<CredentialRecord>> {
    let query = r"
        SELECT id, username, full_name, password_hash, role, group_number, is_active
        FROM users
        WHERE username = $1
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup credential record")?;

    Ok(row.map(|row| CredentialRecord {
        user_id: row.get("id"),
        username: row.get("username"),
        full_name: row.get("full_name"),
        password_hash: row.get("password_hash"),
        role: row.get("role"),
        group_number: row.get("group_number"),
        is_active: row.get("is_active"),
    }))
}

/// Re-read role/group/active state for a user id.
pub(super) async fn fetch_authority(
    pool: &PgPool,
    user_id: i64,
) -> Result<Option<AuthorityRecord>> {
    let query = r"
        SELECT username, full_name, role, group_number, is_active
        FROM users
        WHERE id = $1
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch account authority")?;

    Ok(row.map(|row| AuthorityRecord {
        username: row.get("username"),
        full_name: row.get("full_name"),
        role: row.get("role"),
        group_number: row.get("group_number"),
        is_active: row.get("is_active"),
    }))
}

/// Append one audit row. Rows are never updated or deleted by this service.
pub(super) async fn insert_auth_activity(
    pool: &PgPool,
    event_kind: &str,
    user_id: Option<i64>,
    username: &str,
    source_addr: &str,
    user_agent: &str,
    detail: &str,
) -> Result<()> {
    let query = r"
        INSERT INTO auth_activity
            (event_kind, user_id, username, source_addr, user_agent, detail)
        VALUES ($1, $2, $3, $4, $5, $6)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(event_kind)
        .bind(user_id)
        .bind(username)
        .bind(source_addr)
        .bind(user_agent)
        .bind(detail)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to insert auth activity row")?;
    Ok(())
}
