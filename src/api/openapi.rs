//! `OpenAPI` document for the HTTP surface.
//!
//! Endpoints are listed here explicitly; `#[utoipa::path]` on each handler
//! provides the method, path, and response documentation. Title, version,
//! and description come from Cargo metadata.

use utoipa::OpenApi;

use crate::api::handlers::auth::types::{
    DeletionScheduledResponse, LoginRequest, LoginResponse, LogoutRequest, ProfileResponse,
    RefreshRequest, RefreshResponse, RegisterRequest, RegisterResponse,
    ResendVerificationRequest, VerifyEmailRequest,
};
use crate::api::handlers::events::{CreateEventRequest, EventResponse, UpdateEventRequest};
use crate::api::handlers::health::Health;
use crate::api::handlers::labels::{CreateLabelRequest, LabelResponse, UpdateLabelRequest};
use crate::api::handlers::{auth, events, health, labels, me};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::signup::register,
        auth::verification::verify_email,
        auth::verification::resend_verification,
        auth::login::login,
        auth::session::refresh,
        auth::session::logout,
        me::profile,
        me::delete_account,
        me::restore_account,
        events::list_events,
        events::create_event,
        events::get_event,
        events::update_event,
        events::delete_event,
        labels::list_labels,
        labels::create_label,
        labels::get_label,
        labels::update_label,
        labels::delete_label,
    ),
    components(schemas(
        Health,
        RegisterRequest,
        RegisterResponse,
        VerifyEmailRequest,
        ResendVerificationRequest,
        LoginRequest,
        LoginResponse,
        RefreshRequest,
        RefreshResponse,
        LogoutRequest,
        ProfileResponse,
        DeletionScheduledResponse,
        CreateEventRequest,
        UpdateEventRequest,
        EventResponse,
        CreateLabelRequest,
        UpdateLabelRequest,
        LabelResponse,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "auth", description = "Registration, verification, and token lifecycle"),
        (name = "me", description = "Profile and account lifecycle"),
        (name = "events", description = "Calendar events"),
        (name = "labels", description = "Event labels"),
    )
)]
pub(crate) struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_covers_auth_and_calendar_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| p.as_str() == "/v1/auth/login"));
        assert!(paths.iter().any(|p| p.as_str() == "/v1/auth/refresh"));
        assert!(paths.iter().any(|p| p.as_str() == "/v1/events/{id}"));
        assert!(paths.iter().any(|p| p.as_str() == "/health"));
    }

    #[test]
    fn item_paths_expose_get_patch_and_delete() {
        let doc = ApiDoc::openapi();
        for path in ["/v1/events/{id}", "/v1/labels/{id}"] {
            let item = doc.paths.paths.get(path).unwrap();
            assert!(item.get.is_some(), "{path} is missing GET");
            assert!(item.patch.is_some(), "{path} is missing PATCH");
            assert!(item.delete.is_some(), "{path} is missing DELETE");
        }
    }
}
