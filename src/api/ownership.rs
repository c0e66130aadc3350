//! Ownership checks for user-owned resources.
//!
//! Every mutating handler fetches the target row first, then calls
//! [`ensure_owner`] before touching it. The check is pure so it can sit in
//! front of any storage call and stays trivially testable.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Kinds of resources that participate in ownership validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Event,
    RecurringEvent,
    Label,
    Badge,
    User,
}

impl ResourceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::RecurringEvent => "recurring event",
            Self::Label => "label",
            Self::Badge => "badge",
            Self::User => "user",
        }
    }

    /// Machine-readable code included in 403 bodies so clients can react
    /// per resource kind without parsing prose.
    #[must_use]
    pub fn violation_code(self) -> &'static str {
        match self {
            Self::Event => "event_ownership_violation",
            Self::RecurringEvent => "recurring_event_ownership_violation",
            Self::Label => "label_ownership_violation",
            Self::Badge => "badge_ownership_violation",
            Self::User => "user_ownership_violation",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{} {resource_id} does not belong to user {actor_id}", .kind.as_str())]
pub struct OwnershipError {
    pub kind: ResourceKind,
    pub resource_id: Uuid,
    pub actor_id: Uuid,
}

impl IntoResponse for OwnershipError {
    fn into_response(self) -> Response {
        let body = json!({
            "code": self.kind.violation_code(),
            "message": format!("You do not have access to this {}", self.kind.as_str()),
        });
        (StatusCode::FORBIDDEN, Json(body)).into_response()
    }
}

/// Assert that `actor_id` owns the resource.
/// # Errors
/// Returns an [`OwnershipError`] when the owner differs from the actor.
pub fn ensure_owner(
    kind: ResourceKind,
    resource_id: Uuid,
    owner_id: Uuid,
    actor_id: Uuid,
) -> Result<(), OwnershipError> {
    if owner_id == actor_id {
        Ok(())
    } else {
        Err(OwnershipError {
            kind,
            resource_id,
            actor_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_passes() {
        let id = Uuid::new_v4();
        let owner = Uuid::new_v4();
        assert!(ensure_owner(ResourceKind::Event, id, owner, owner).is_ok());
    }

    #[test]
    fn non_owner_is_rejected() {
        let id = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let actor = Uuid::new_v4();
        let err = ensure_owner(ResourceKind::Label, id, owner, actor).unwrap_err();
        assert_eq!(err.kind, ResourceKind::Label);
        assert_eq!(err.resource_id, id);
        assert_eq!(err.actor_id, actor);
    }

    #[test]
    fn violation_codes_are_kind_specific() {
        assert_eq!(
            ResourceKind::Event.violation_code(),
            "event_ownership_violation"
        );
        assert_eq!(
            ResourceKind::RecurringEvent.violation_code(),
            "recurring_event_ownership_violation"
        );
        assert_eq!(
            ResourceKind::Badge.violation_code(),
            "badge_ownership_violation"
        );
        assert_eq!(
            ResourceKind::User.violation_code(),
            "user_ownership_violation"
        );
    }

    #[test]
    fn error_message_names_the_kind() {
        let id = Uuid::new_v4();
        let err = ensure_owner(ResourceKind::Event, id, Uuid::new_v4(), Uuid::new_v4())
            .unwrap_err();
        assert!(err.to_string().starts_with("event "));
    }
}
