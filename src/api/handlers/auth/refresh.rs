//! Refresh token store.
//!
//! Raw refresh tokens are opaque UUIDv4 strings handed to the client once.
//! The database only ever sees an HMAC-SHA256 keyed hash, so a leaked dump
//! cannot be replayed without the server key. Consumption is a single
//! conditional `UPDATE`, which makes every token single-use even across
//! concurrent server instances: whichever request wins the row update gets
//! the user id, everyone else gets nothing.

use anyhow::{anyhow, Context, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Keyed hash of a raw refresh token.
///
/// # Errors
/// Fails only when the key is unusable, which is a configuration error and
/// should abort the request with a 500, never a 401.
pub(super) fn hash_refresh_token(key: &[u8], raw: &str) -> Result<Vec<u8>> {
    let mut mac =
        HmacSha256::new_from_slice(key).context("refresh token hash key is not usable")?;
    mac.update(raw.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Issue a new refresh token for the user and return the raw value.
///
/// The raw token is a canonical UUIDv4 string; collisions are effectively
/// impossible but the insert still retries on a unique violation.
pub async fn issue_refresh_token(
    pool: &PgPool,
    user_id: Uuid,
    hash_key: &[u8],
    ttl_ms: i64,
) -> Result<String> {
    let query = r"
        INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
        VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 millisecond'))
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );

    for _ in 0..3 {
        let raw = Uuid::new_v4().to_string();
        let token_hash = hash_refresh_token(hash_key, &raw)?;
        let result = sqlx::query(query)
            .bind(user_id)
            .bind(&token_hash)
            .bind(ttl_ms)
            .execute(pool)
            .instrument(span.clone())
            .await;

        match result {
            Ok(_) => return Ok(raw),
            Err(err) if super::utils::is_unique_violation(&err) => {}
            Err(err) => return Err(err).context("failed to insert refresh token"),
        }
    }

    Err(anyhow!("failed to generate unique refresh token"))
}

/// Atomically consume a refresh token: the row is flipped to revoked and the
/// owning user id returned only if the token was live and unexpired.
///
/// Returns `Ok(None)` for unknown, expired, and already-consumed tokens alike.
pub async fn validate_and_consume(
    pool: &PgPool,
    raw: &str,
    hash_key: &[u8],
) -> Result<Option<Uuid>> {
    let token_hash = hash_refresh_token(hash_key, raw)?;

    let query = r"
        UPDATE refresh_tokens
        SET revoked = TRUE, revoked_at = NOW()
        WHERE token_hash = $1
          AND revoked = FALSE
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
        .bind(&token_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to consume refresh token")?;

    Ok(row.map(|row| row.get("user_id")))
}

/// Revoke a refresh token. Idempotent: revoking an unknown or already revoked
/// token is a no-op.
pub async fn revoke_refresh_token(pool: &PgPool, raw: &str, hash_key: &[u8]) -> Result<()> {
    let token_hash = hash_refresh_token(hash_key, raw)?;

    let query = r"
        UPDATE refresh_tokens
        SET revoked = TRUE, revoked_at = NOW()
        WHERE token_hash = $1
          AND revoked = FALSE
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(&token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to revoke refresh token")?;

    Ok(())
}

/// Revoke every live refresh token a user holds (used on account deletion).
pub async fn revoke_all_for_user(pool: &PgPool, user_id: Uuid) -> Result<u64> {
    let query = r"
        UPDATE refresh_tokens
        SET revoked = TRUE, revoked_at = NOW()
        WHERE user_id = $1
          AND revoked = FALSE
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
        .context("failed to revoke user refresh tokens")?;

    Ok(result.rows_affected())
}

/// Delete refresh tokens past their expiry. Returns the purge count.
pub async fn cleanup_expired(pool: &PgPool) -> Result<u64> {
    let query = "DELETE FROM refresh_tokens WHERE expires_at < NOW()";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to purge expired refresh tokens")?;

    Ok(result.rows_affected())
}

/// Delete revoked refresh tokens older than the retention window. The window
/// keeps recent revocations visible for audit. Returns the purge count.
pub async fn cleanup_revoked(pool: &PgPool, retention_days: i64) -> Result<u64> {
    let query = r"
        DELETE FROM refresh_tokens
        WHERE revoked = TRUE
          AND revoked_at < NOW() - ($1 * INTERVAL '1 day')
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(retention_days)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to purge revoked refresh tokens")?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic_per_key() {
        let a = hash_refresh_token(b"key", "token").unwrap();
        let b = hash_refresh_token(b"key", "token").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn hash_differs_across_keys_and_tokens() {
        let base = hash_refresh_token(b"key", "token").unwrap();
        assert_ne!(base, hash_refresh_token(b"other-key", "token").unwrap());
        assert_ne!(base, hash_refresh_token(b"key", "other-token").unwrap());
    }

    #[test]
    fn raw_token_shape_is_canonical_uuid() {
        let raw = Uuid::new_v4().to_string();
        assert_eq!(raw.len(), 36);
        assert!(Uuid::parse_str(&raw).is_ok());
    }
}
