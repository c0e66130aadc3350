//! Access token codec.
//!
//! Access tokens are HS256 JWTs whose subject is the user id. There is no
//! revocation list: an issued token stays valid until its embedded expiry, so
//! logout and account deletion only cut off the refresh path. Exposure is
//! bounded by the short access TTL.
//!
//! Verification failures are detailed internally (for logs) but callers must
//! surface them as one generic 401; clients never learn why a token was
//! rejected.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Time source for issue/verify. Injected so expiry is testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time, used by the server.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Serialize, Deserialize, Debug)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Why a token was rejected. Logged server-side only.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("missing bearer token")]
    Missing,
    #[error("malformed or badly signed token: {0}")]
    Malformed(#[source] jsonwebtoken::errors::Error),
    #[error("token is expired")]
    Expired,
    #[error("token subject is not a valid user id")]
    Subject,
}

pub struct AccessTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_ms: i64,
    clock: Arc<dyn Clock>,
}

impl AccessTokenCodec {
    #[must_use]
    pub fn new(secret: &[u8], ttl_ms: i64, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked manually against the injected clock, strictly:
        // a token at its exact expiry instant is already invalid.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl_ms,
            clock,
        }
    }

    /// Issue a signed token for the user.
    /// # Errors
    /// Returns an error if signing fails.
    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = self.clock.now();
        let expires_at = now + Duration::milliseconds(self.ttl_ms);
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| anyhow::anyhow!("failed to sign access token: {err}"))
    }

    /// Verify a token and return its subject.
    /// # Errors
    /// Returns a [`TokenError`] describing the rejection cause.
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::Missing);
        }

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(TokenError::Malformed)?;

        if data.claims.exp <= self.clock.now().timestamp() {
            return Err(TokenError::Expired);
        }

        Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::Subject)
    }
}

/// Pull the raw token out of an `Authorization: Bearer <token>` header.
///
/// The prefix match is case-sensitive; anything else is treated as no
/// credentials at all.
pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::TimeZone;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn fixed(secs: i64) -> Arc<FixedClock> {
        Arc::new(FixedClock(Utc.timestamp_opt(secs, 0).unwrap()))
    }

    fn codec_at(secret: &[u8], ttl_ms: i64, secs: i64) -> AccessTokenCodec {
        AccessTokenCodec::new(secret, ttl_ms, fixed(secs))
    }

    #[test]
    fn round_trip_preserves_subject() {
        let codec = codec_at(b"secret", 900_000, 1_700_000_000);
        let user_id = Uuid::new_v4();
        let token = codec.issue(user_id).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(codec.verify(&token).unwrap(), user_id);
    }

    #[test]
    fn token_at_exact_expiry_is_rejected() {
        let issued = codec_at(b"secret", 1_000, 1_700_000_000);
        let token = issued.issue(Uuid::new_v4()).unwrap();

        // exp = issue + 1s; verifying exactly at exp must fail
        let at_expiry = codec_at(b"secret", 1_000, 1_700_000_001);
        assert!(matches!(
            at_expiry.verify(&token),
            Err(TokenError::Expired)
        ));

        // one instant before expiry still verifies
        let before_expiry = codec_at(b"secret", 1_000, 1_700_000_000);
        assert!(before_expiry.verify(&token).is_ok());
    }

    #[test]
    fn tampered_token_is_malformed() {
        let codec = codec_at(b"secret", 900_000, 1_700_000_000);
        let token = codec.issue(Uuid::new_v4()).unwrap();
        let mut tampered = token.clone();
        tampered.push('x');
        assert!(matches!(
            codec.verify(&tampered),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let issuer = codec_at(b"secret-a", 900_000, 1_700_000_000);
        let verifier = codec_at(b"secret-b", 900_000, 1_700_000_000);
        let token = issuer.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(
            verifier.verify(&token),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn empty_token_is_missing() {
        let codec = codec_at(b"secret", 900_000, 1_700_000_000);
        assert!(matches!(codec.verify("  "), Err(TokenError::Missing)));
    }

    #[test]
    fn extract_bearer_token_happy_path() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(
            extract_bearer_token(&headers).as_deref(),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn extract_bearer_token_prefix_is_case_sensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer abc"));
        assert!(extract_bearer_token(&headers).is_none());
    }

    #[test]
    fn extract_bearer_token_rejects_empty_and_missing() {
        let mut headers = HeaderMap::new();
        assert!(extract_bearer_token(&headers).is_none());
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(extract_bearer_token(&headers).is_none());
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert!(extract_bearer_token(&headers).is_none());
    }
}
