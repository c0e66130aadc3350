//! Auth configuration and shared state.

use super::token::AccessTokenCodec;

const DEFAULT_ACCESS_TOKEN_TTL_MS: i64 = 15 * 60 * 1000;
const DEFAULT_REFRESH_TOKEN_TTL_MS: i64 = 30 * 24 * 60 * 60 * 1000;
const DEFAULT_VERIFICATION_TOKEN_TTL_SECONDS: i64 = 30 * 60;
const DEFAULT_RESEND_COOLDOWN_SECONDS: i64 = 60;
const DEFAULT_DELETION_GRACE_DAYS: i64 = 30;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    access_token_ttl_ms: i64,
    refresh_token_ttl_ms: i64,
    verification_token_ttl_seconds: i64,
    resend_cooldown_seconds: i64,
    deletion_grace_days: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            access_token_ttl_ms: DEFAULT_ACCESS_TOKEN_TTL_MS,
            refresh_token_ttl_ms: DEFAULT_REFRESH_TOKEN_TTL_MS,
            verification_token_ttl_seconds: DEFAULT_VERIFICATION_TOKEN_TTL_SECONDS,
            resend_cooldown_seconds: DEFAULT_RESEND_COOLDOWN_SECONDS,
            deletion_grace_days: DEFAULT_DELETION_GRACE_DAYS,
        }
    }

    #[must_use]
    pub fn with_access_token_ttl_ms(mut self, ttl_ms: i64) -> Self {
        self.access_token_ttl_ms = ttl_ms;
        self
    }

    #[must_use]
    pub fn with_refresh_token_ttl_ms(mut self, ttl_ms: i64) -> Self {
        self.refresh_token_ttl_ms = ttl_ms;
        self
    }

    #[must_use]
    pub fn with_verification_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.verification_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_resend_cooldown_seconds(mut self, seconds: i64) -> Self {
        self.resend_cooldown_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_deletion_grace_days(mut self, days: i64) -> Self {
        self.deletion_grace_days = days;
        self
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn access_token_ttl_ms(&self) -> i64 {
        self.access_token_ttl_ms
    }

    pub(super) fn refresh_token_ttl_ms(&self) -> i64 {
        self.refresh_token_ttl_ms
    }

    pub(super) fn verification_token_ttl_seconds(&self) -> i64 {
        self.verification_token_ttl_seconds
    }

    pub(super) fn resend_cooldown_seconds(&self) -> i64 {
        self.resend_cooldown_seconds
    }

    pub(in crate::api::handlers) fn deletion_grace_days(&self) -> i64 {
        self.deletion_grace_days
    }
}

/// Shared auth state injected into handlers.
pub struct AuthState {
    config: AuthConfig,
    codec: AccessTokenCodec,
    refresh_hash_key: Vec<u8>,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, codec: AccessTokenCodec, refresh_hash_key: Vec<u8>) -> Self {
        Self {
            config,
            codec,
            refresh_hash_key,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(crate) fn codec(&self) -> &AccessTokenCodec {
        &self.codec
    }

    pub(super) fn refresh_hash_key(&self) -> &[u8] {
        &self.refresh_hash_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = AuthConfig::new("https://almanac.dev".to_string());
        assert_eq!(config.access_token_ttl_ms(), 900_000);
        assert_eq!(config.refresh_token_ttl_ms(), 2_592_000_000);
        assert_eq!(config.verification_token_ttl_seconds(), 1800);
        assert_eq!(config.resend_cooldown_seconds(), 60);
        assert_eq!(config.deletion_grace_days(), 30);
    }

    #[test]
    fn test_config_builders() {
        let config = AuthConfig::new("https://almanac.dev".to_string())
            .with_access_token_ttl_ms(60_000)
            .with_refresh_token_ttl_ms(86_400_000)
            .with_verification_token_ttl_seconds(600)
            .with_resend_cooldown_seconds(30)
            .with_deletion_grace_days(7);

        assert_eq!(config.access_token_ttl_ms(), 60_000);
        assert_eq!(config.refresh_token_ttl_ms(), 86_400_000);
        assert_eq!(config.verification_token_ttl_seconds(), 600);
        assert_eq!(config.resend_cooldown_seconds(), 30);
        assert_eq!(config.deletion_grace_days(), 7);
        assert_eq!(config.frontend_base_url(), "https://almanac.dev");
    }
}
