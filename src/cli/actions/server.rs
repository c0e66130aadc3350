use crate::{
    api::{self, cleanup::CleanupConfig, handlers::auth::state::AuthConfig},
    cli::globals::GlobalArgs,
};
use anyhow::Result;
use secrecy::SecretString;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub jwt_secret: SecretString,
    pub refresh_hash_key: Option<SecretString>,
    pub frontend_base_url: String,
    pub access_token_ttl_ms: i64,
    pub refresh_token_ttl_ms: i64,
    pub verification_token_ttl_seconds: i64,
    pub verification_resend_cooldown_seconds: i64,
    pub deletion_grace_days: i64,
    pub cleanup_expired_enabled: bool,
    pub cleanup_expired_interval_seconds: u64,
    pub cleanup_revoked_enabled: bool,
    pub cleanup_revoked_interval_seconds: u64,
    pub cleanup_revoked_retention_days: i64,
    pub cleanup_unverified_enabled: bool,
    pub cleanup_unverified_interval_seconds: u64,
    pub cleanup_unverified_max_age_hours: i64,
    pub cleanup_pending_enabled: bool,
    pub cleanup_pending_interval_seconds: u64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    info!(
        port = args.port,
        frontend_base_url = %args.frontend_base_url,
        "Starting server"
    );

    let globals = GlobalArgs::new(args.jwt_secret, args.refresh_hash_key);

    let auth_config = AuthConfig::new(args.frontend_base_url)
        .with_access_token_ttl_ms(args.access_token_ttl_ms)
        .with_refresh_token_ttl_ms(args.refresh_token_ttl_ms)
        .with_verification_token_ttl_seconds(args.verification_token_ttl_seconds)
        .with_resend_cooldown_seconds(args.verification_resend_cooldown_seconds)
        .with_deletion_grace_days(args.deletion_grace_days);

    let cleanup_config = CleanupConfig::new()
        .with_expired_enabled(args.cleanup_expired_enabled)
        .with_expired_interval_seconds(args.cleanup_expired_interval_seconds)
        .with_revoked_enabled(args.cleanup_revoked_enabled)
        .with_revoked_interval_seconds(args.cleanup_revoked_interval_seconds)
        .with_revoked_retention_days(args.cleanup_revoked_retention_days)
        .with_unverified_enabled(args.cleanup_unverified_enabled)
        .with_unverified_interval_seconds(args.cleanup_unverified_interval_seconds)
        .with_unverified_max_age_hours(args.cleanup_unverified_max_age_hours)
        .with_pending_enabled(args.cleanup_pending_enabled)
        .with_pending_interval_seconds(args.cleanup_pending_interval_seconds)
        .normalize();

    api::new(args.port, args.dsn, &globals, auth_config, cleanup_config).await
}
