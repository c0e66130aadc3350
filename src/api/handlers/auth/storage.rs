//! Database helpers for users, verification tokens, and account lifecycle.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::state::AuthConfig;
use super::utils::{
    build_verify_url, generate_verification_token, hash_verification_token, is_unique_violation,
};
use crate::api::email::{verification_message, EmailMessage};

/// Outcome when attempting to create a new user + verification record.
#[derive(Debug)]
pub(super) enum SignupOutcome {
    Created {
        user_id: Uuid,
        email: EmailMessage,
    },
    Conflict,
}

/// Outcome for a resend request (always 204 to avoid account probing).
#[derive(Debug)]
pub(super) enum ResendOutcome {
    Queued(EmailMessage),
    Cooldown,
    Noop,
}

/// A persisted user row, as seen by auth and profile code.
#[derive(Clone, Debug)]
pub(crate) struct UserRecord {
    pub(crate) id: Uuid,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password_hash: String,
    pub(crate) timezone: String,
    pub(crate) roles: Vec<String>,
    pub(crate) email_verified: bool,
    pub(crate) is_pending_deletion: bool,
    pub(crate) scheduled_deletion_date: Option<DateTime<Utc>>,
}

const USER_COLUMNS: &str = r"
    id, username, email, password_hash, timezone, roles,
    email_verified, is_pending_deletion, scheduled_deletion_date
";

fn user_from_row(row: &PgRow) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        timezone: row.get("timezone"),
        roles: row.get("roles"),
        email_verified: row.get("email_verified"),
        is_pending_deletion: row.get("is_pending_deletion"),
        scheduled_deletion_date: row.get("scheduled_deletion_date"),
    }
}

/// Look up a user for login. The identifier matches username or email.
pub(super) async fn lookup_login_record(
    pool: &PgPool,
    identifier: &str,
) -> Result<Option<UserRecord>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = $1 LIMIT 1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(identifier)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup login record")?;

    Ok(row.as_ref().map(user_from_row))
}

/// Look up a user by id (per-request principal hydration and profile reads).
pub(crate) async fn lookup_user(pool: &PgPool, user_id: Uuid) -> Result<Option<UserRecord>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user")?;

    Ok(row.as_ref().map(user_from_row))
}

pub(super) async fn insert_user_and_verification(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
    timezone: &str,
    config: &AuthConfig,
) -> Result<SignupOutcome> {
    // Transaction keeps the user row and its verification token consistent.
    let mut tx = pool.begin().await.context("begin signup transaction")?;

    let query = r"
        INSERT INTO users (username, email, password_hash, timezone)
        VALUES ($1, $2, $3, $4)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(timezone)
        .fetch_one(&mut *tx)
        .instrument(span)
        .await;

    let user_id: Uuid = match row {
        Ok(row) => row.get("id"),
        Err(err) => {
            if is_unique_violation(&err) {
                let _ = tx.rollback().await;
                return Ok(SignupOutcome::Conflict);
            }
            return Err(err).context("failed to insert user");
        }
    };

    let token = insert_verification_token(&mut tx, user_id, config).await?;

    tx.commit().await.context("commit signup transaction")?;

    let verify_url = build_verify_url(config.frontend_base_url(), &token);
    let email = verification_message(email, &verify_url)?;

    Ok(SignupOutcome::Created { user_id, email })
}

pub(super) async fn insert_verification_token(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: Uuid,
    config: &AuthConfig,
) -> Result<String> {
    // Generate a raw token for the email link and store only its hash.
    let token = generate_verification_token()?;
    let token_hash = hash_verification_token(&token);

    let query = r"
        INSERT INTO email_verification_tokens
            (user_id, token_hash, expires_at)
        VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(token_hash)
        .bind(config.verification_token_ttl_seconds())
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to insert email verification token")?;

    Ok(token)
}

pub(super) async fn consume_verification_token(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    token_hash: &[u8],
) -> Result<bool> {
    // Mark the token consumed if still valid; then flip the user's flag in the
    // same transaction.
    let query = r"
        UPDATE email_verification_tokens
        SET consumed_at = NOW()
        WHERE token_hash = $1
          AND consumed_at IS NULL
          AND expires_at > NOW()
        RETURNING user_id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(&mut **tx)
        .instrument(span)
        .await
        .context("failed to consume verification token")?;

    let Some(row) = row else {
        return Ok(false);
    };

    let user_id: Uuid = row.get("user_id");
    let query = r"
        UPDATE users
        SET email_verified = TRUE
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to mark email verified")?;

    Ok(true)
}

pub(super) async fn enqueue_resend_verification(
    pool: &PgPool,
    email: &str,
    config: &AuthConfig,
) -> Result<ResendOutcome> {
    // Resend is intentionally opaque: callers always get 204 to avoid account probing.
    let mut tx = pool.begin().await.context("begin resend transaction")?;

    let query = r"
        SELECT id, email, email_verified
        FROM users
        WHERE email = $1
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(&mut *tx)
        .instrument(span)
        .await
        .context("failed to lookup user for resend")?;

    let Some(row) = row else {
        tx.commit().await.context("commit resend noop")?;
        return Ok(ResendOutcome::Noop);
    };

    let email_verified: bool = row.get("email_verified");
    if email_verified {
        tx.commit().await.context("commit resend noop")?;
        return Ok(ResendOutcome::Noop);
    }

    let user_id: Uuid = row.get("id");
    if resend_cooldown_active(&mut tx, user_id, config.resend_cooldown_seconds()).await? {
        tx.commit().await.context("commit resend cooldown")?;
        return Ok(ResendOutcome::Cooldown);
    }

    let email: String = row.get("email");
    let token = insert_verification_token(&mut tx, user_id, config).await?;
    tx.commit().await.context("commit resend enqueue")?;

    let verify_url = build_verify_url(config.frontend_base_url(), &token);
    let message = verification_message(&email, &verify_url)?;
    Ok(ResendOutcome::Queued(message))
}

async fn resend_cooldown_active(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: Uuid,
    cooldown_seconds: i64,
) -> Result<bool> {
    let query = r"
        SELECT EXISTS (
            SELECT 1 FROM email_verification_tokens
            WHERE user_id = $1
              AND created_at > NOW() - ($2 * INTERVAL '1 second')
        ) AS active
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .bind(cooldown_seconds)
        .fetch_one(&mut **tx)
        .instrument(span)
        .await
        .context("failed to check resend cooldown")?;

    Ok(row.get("active"))
}

/// Flag the account for deletion and return the scheduled purge date.
///
/// Idempotent: a second request keeps the original date.
pub(crate) async fn schedule_user_deletion(
    pool: &PgPool,
    user_id: Uuid,
    grace_days: i64,
) -> Result<Option<DateTime<Utc>>> {
    let query = r"
        UPDATE users
        SET is_pending_deletion = TRUE,
            scheduled_deletion_date =
                COALESCE(scheduled_deletion_date, NOW() + ($2 * INTERVAL '1 day'))
        WHERE id = $1
        RETURNING scheduled_deletion_date
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .bind(grace_days)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to schedule account deletion")?;

    Ok(row.map(|row| row.get("scheduled_deletion_date")))
}

/// Clear the pending-deletion flag within the grace window.
///
/// Returns `false` when the account was not pending deletion.
pub(crate) async fn cancel_user_deletion(pool: &PgPool, user_id: Uuid) -> Result<bool> {
    let query = r"
        UPDATE users
        SET is_pending_deletion = FALSE,
            scheduled_deletion_date = NULL
        WHERE id = $1
          AND is_pending_deletion = TRUE
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(user_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to cancel account deletion")?;

    Ok(result.rows_affected() > 0)
}
