//! Per-request authentication.
//!
//! [`authenticate`] is called explicitly by handlers that care about
//! identity; there is no ambient request context. It fails open to
//! anonymous: any problem with the bearer token, the lookup, or the account
//! state is logged and the request simply proceeds without a principal.
//! Endpoints that require identity call [`require_auth`], which turns the
//! anonymous case into a generic 401.

use axum::http::{HeaderMap, StatusCode};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

use super::state::AuthState;
use super::storage::{lookup_user, UserRecord};
use super::token::extract_bearer_token;

/// Roles a user can hold. Unknown database values are dropped with a warning
/// rather than failing the request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Role {
    User,
    Admin,
}

impl Role {
    pub(crate) fn authority(self) -> &'static str {
        match self {
            Self::User => "ROLE_USER",
            Self::Admin => "ROLE_ADMIN",
        }
    }

    pub(crate) fn from_db(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// The authenticated caller, rebuilt from the user row on every request.
#[derive(Clone, Debug)]
pub(crate) struct Principal {
    pub(crate) user_id: Uuid,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) timezone: String,
    roles: Vec<Role>,
    enabled: bool,
}

impl Principal {
    pub(crate) fn from_record(record: &UserRecord) -> Self {
        let roles = record
            .roles
            .iter()
            .filter_map(|role| {
                let parsed = Role::from_db(role);
                if parsed.is_none() {
                    warn!(role = %role, "ignoring unknown role on user {}", record.id);
                }
                parsed
            })
            .collect();

        Self {
            user_id: record.id,
            username: record.username.clone(),
            email: record.email.clone(),
            timezone: record.timezone.clone(),
            roles,
            // An account pending deletion cannot act until restored.
            enabled: !record.is_pending_deletion,
        }
    }

    /// Authority strings in the fixed `ROLE_` form clients expect.
    pub(crate) fn authorities(&self) -> Vec<String> {
        self.roles
            .iter()
            .map(|role| role.authority().to_string())
            .collect()
    }

    pub(crate) fn enabled(&self) -> bool {
        self.enabled
    }
}

/// Resolve the request's bearer token into a [`Principal`].
///
/// Every failure path yields `None` (anonymous); the concrete cause is only
/// logged. Infrastructure failures also yield `None` so a flaky database
/// never turns into an authenticated request.
pub(crate) async fn authenticate(
    headers: &HeaderMap,
    pool: &PgPool,
    auth_state: &Arc<AuthState>,
) -> Option<Principal> {
    let token = extract_bearer_token(headers)?;

    let user_id = match auth_state.codec().verify(&token) {
        Ok(user_id) => user_id,
        Err(err) => {
            warn!("rejected access token: {err}");
            return None;
        }
    };

    let record = match lookup_user(pool, user_id).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            warn!(%user_id, "access token references a missing user");
            return None;
        }
        Err(err) => {
            error!("failed to load user for access token: {err:#}");
            return None;
        }
    };

    let principal = Principal::from_record(&record);
    if !principal.enabled() {
        warn!(%user_id, "rejected access token for disabled account");
        return None;
    }

    Some(principal)
}

/// Like [`authenticate`] but anonymous callers get a generic 401.
pub(crate) async fn require_auth(
    headers: &HeaderMap,
    pool: &PgPool,
    auth_state: &Arc<AuthState>,
) -> Result<Principal, StatusCode> {
    authenticate(headers, pool, auth_state)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(roles: Vec<&str>, pending_deletion: bool) -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "hash".to_string(),
            timezone: "UTC".to_string(),
            roles: roles.into_iter().map(str::to_string).collect(),
            email_verified: true,
            is_pending_deletion: pending_deletion,
            scheduled_deletion_date: None,
        }
    }

    #[test]
    fn authorities_are_role_prefixed() {
        let principal = Principal::from_record(&record(vec!["user", "admin"], false));
        assert_eq!(principal.authorities(), vec!["ROLE_USER", "ROLE_ADMIN"]);
    }

    #[test]
    fn unknown_roles_are_dropped() {
        let principal = Principal::from_record(&record(vec!["user", "superuser"], false));
        assert_eq!(principal.authorities(), vec!["ROLE_USER"]);
    }

    #[test]
    fn pending_deletion_disables_the_account() {
        assert!(Principal::from_record(&record(vec!["user"], false)).enabled());
        assert!(!Principal::from_record(&record(vec!["user"], true)).enabled());
    }
}
