//! Request/response types for auth endpoints. Wire shapes are camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub timezone: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyEmailRequest {
    pub token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResendVerificationRequest {
    pub email: String,
}

/// The `username` field also accepts the account email.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub timezone: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    pub refresh_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub timezone: String,
    pub authorities: Vec<String>,
    pub email_verified: bool,
    pub pending_deletion: bool,
    pub scheduled_deletion_date: Option<DateTime<Utc>>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DeletionScheduledResponse {
    pub scheduled_deletion_date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn login_response_uses_camel_case_keys() -> Result<()> {
        let response = LoginResponse {
            token: "jwt".to_string(),
            refresh_token: "raw".to_string(),
            user_id: "id".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            timezone: "UTC".to_string(),
        };
        let value = serde_json::to_value(&response)?;
        value.get("refreshToken").context("missing refreshToken")?;
        value.get("userId").context("missing userId")?;
        assert!(value.get("refresh_token").is_none());
        Ok(())
    }

    #[test]
    fn refresh_round_trips() -> Result<()> {
        let request: RefreshRequest = serde_json::from_value(serde_json::json!({
            "refreshToken": "raw-token"
        }))?;
        assert_eq!(request.refresh_token, "raw-token");

        let response = RefreshResponse {
            access_token: "jwt".to_string(),
            refresh_token: "raw".to_string(),
        };
        let value = serde_json::to_value(&response)?;
        value.get("accessToken").context("missing accessToken")?;
        Ok(())
    }

    #[test]
    fn register_request_timezone_is_optional() -> Result<()> {
        let request: RegisterRequest = serde_json::from_value(serde_json::json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "correct-horse",
        }))?;
        assert!(request.timezone.is_none());
        Ok(())
    }

    #[test]
    fn profile_response_serializes_deletion_fields() -> Result<()> {
        let response = ProfileResponse {
            id: "id".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            timezone: "UTC".to_string(),
            authorities: vec!["ROLE_USER".to_string()],
            email_verified: true,
            pending_deletion: false,
            scheduled_deletion_date: None,
        };
        let value = serde_json::to_value(&response)?;
        assert_eq!(value["pendingDeletion"], false);
        assert!(value["scheduledDeletionDate"].is_null());
        Ok(())
    }
}
