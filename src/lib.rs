//! # Almanac (Calendar & Event Planning API)
//!
//! `almanac` is the backend for a calendar and event-planning application:
//! user accounts with email verification, JWT + refresh-token authentication,
//! user-owned calendar resources (events, labels), and scheduled cleanup jobs.
//!
//! ## Authentication
//!
//! Access tokens are short-lived HS256 JWTs carried as `Authorization: Bearer`.
//! Refresh tokens are opaque, single-use values rotated on every refresh; the
//! database stores only a keyed hash, never the raw value.
//!
//! - **Fail-open to anonymous:** a missing or invalid bearer token never aborts
//!   the request pipeline; the request simply proceeds unauthenticated and the
//!   endpoint's own authorization check answers with a generic `401`.
//! - **Generic failures:** clients never learn *why* a credential was rejected;
//!   the concrete cause is only logged server-side.
//!
//! ## Ownership
//!
//! Every mutation of a user-owned resource fetches the row first and asserts
//! the acting user is its creator, returning a resource-tagged `403` otherwise.
//!
//! ## Background jobs
//!
//! Independent tokio tasks purge expired and revoked refresh tokens, stale
//! unverified accounts, and accounts whose deletion grace period has passed.
//! Each job is idempotent and isolated; a failing cycle is retried on the next
//! tick.

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
