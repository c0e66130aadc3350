//! Event CRUD. Every mutation fetches the row first and runs the ownership
//! check before touching it.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, PgPool, Row};
use std::sync::Arc;
use tracing::{error, Instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::handlers::auth::{principal::require_auth, state::AuthState};
use crate::api::ownership::{ensure_owner, OwnershipError, ResourceKind};

const MAX_TITLE_LENGTH: usize = 200;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    /// Absent keeps the current description; an explicit `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

/// Keeps `null` distinguishable from an absent field: the outer `Option` is
/// presence, the inner one is the value.
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

struct EventRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    description: Option<String>,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl EventRow {
    fn from_row(row: &PgRow) -> Self {
        Self {
            id: row.get("id"),
            user_id: row.get("user_id"),
            title: row.get("title"),
            description: row.get("description"),
            starts_at: row.get("starts_at"),
            ends_at: row.get("ends_at"),
            created_at: row.get("created_at"),
        }
    }

    fn into_response_body(self) -> EventResponse {
        EventResponse {
            id: self.id.to_string(),
            title: self.title,
            description: self.description,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            created_at: self.created_at,
        }
    }
}

enum EventError {
    Ownership(OwnershipError),
    NotFound,
    Validation(&'static str),
    Database(anyhow::Error),
}

impl From<OwnershipError> for EventError {
    fn from(err: OwnershipError) -> Self {
        Self::Ownership(err)
    }
}

impl IntoResponse for EventError {
    fn into_response(self) -> Response {
        match self {
            Self::Ownership(err) => err.into_response(),
            Self::NotFound => (StatusCode::NOT_FOUND, "Event not found".to_string()).into_response(),
            Self::Validation(message) => {
                (StatusCode::BAD_REQUEST, message.to_string()).into_response()
            }
            Self::Database(err) => {
                error!("event storage error: {err:#}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

fn validate_window(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Result<(), EventError> {
    if ends_at <= starts_at {
        return Err(EventError::Validation("Event must end after it starts"));
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<(), EventError> {
    if title.is_empty() {
        return Err(EventError::Validation("Title must not be empty"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(EventError::Validation("Title is too long"));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/v1/events",
    responses(
        (status = 200, description = "Events owned by the caller", body = [EventResponse]),
        (status = 401, description = "Not authenticated")
    ),
    tag = "events"
)]
pub async fn list_events(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool, &auth_state).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    match list_for_user(&pool, principal.user_id).await {
        Ok(events) => {
            let body: Vec<EventResponse> =
                events.into_iter().map(EventRow::into_response_body).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => EventError::Database(err).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Invalid title or time window", body = String),
        (status = 401, description = "Not authenticated")
    ),
    tag = "events"
)]
pub async fn create_event(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<CreateEventRequest>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool, &auth_state).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    let request: CreateEventRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let title = request.title.trim().to_string();
    if let Err(err) = validate_title(&title) {
        return err.into_response();
    }
    if let Err(err) = validate_window(request.starts_at, request.ends_at) {
        return err.into_response();
    }

    match insert_event(&pool, principal.user_id, &title, &request).await {
        Ok(event) => (StatusCode::CREATED, Json(event.into_response_body())).into_response(),
        Err(err) => EventError::Database(err).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/v1/events/{id}",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "The event", body = EventResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Event belongs to another user"),
        (status = 404, description = "Event not found")
    ),
    tag = "events"
)]
pub async fn get_event(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool, &auth_state).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    match fetch_owned(&pool, id, principal.user_id).await {
        Ok(event) => (StatusCode::OK, Json(event.into_response_body())).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    patch,
    path = "/v1/events/{id}",
    params(("id" = Uuid, Path, description = "Event id")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Updated event", body = EventResponse),
        (status = 400, description = "Invalid title or time window", body = String),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Event belongs to another user"),
        (status = 404, description = "Event not found")
    ),
    tag = "events"
)]
pub async fn update_event(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Path(id): Path<Uuid>,
    payload: Option<Json<UpdateEventRequest>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool, &auth_state).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    let request: UpdateEventRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let current = match fetch_owned(&pool, id, principal.user_id).await {
        Ok(event) => event,
        Err(err) => return err.into_response(),
    };

    let title = match request.title {
        Some(title) => {
            let title = title.trim().to_string();
            if let Err(err) = validate_title(&title) {
                return err.into_response();
            }
            title
        }
        None => current.title.clone(),
    };
    let description = match request.description {
        Some(description) => description,
        None => current.description.clone(),
    };
    let starts_at = request.starts_at.unwrap_or(current.starts_at);
    let ends_at = request.ends_at.unwrap_or(current.ends_at);
    if let Err(err) = validate_window(starts_at, ends_at) {
        return err.into_response();
    }

    match apply_update(&pool, id, &title, description.as_deref(), starts_at, ends_at).await {
        Ok(event) => (StatusCode::OK, Json(event.into_response_body())).into_response(),
        Err(err) => EventError::Database(err).into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/v1/events/{id}",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Event belongs to another user"),
        (status = 404, description = "Event not found")
    ),
    tag = "events"
)]
pub async fn delete_event(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool, &auth_state).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    if let Err(err) = fetch_owned(&pool, id, principal.user_id).await {
        return err.into_response();
    }

    let query = "DELETE FROM events WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    match sqlx::query(query).bind(id).execute(&pool.0).instrument(span).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => EventError::Database(err.into()).into_response(),
    }
}

/// Fetch the event and assert ownership in one step.
async fn fetch_owned(pool: &PgPool, id: Uuid, actor_id: Uuid) -> Result<EventRow, EventError> {
    let query = r"
        SELECT id, user_id, title, description, starts_at, ends_at, created_at
        FROM events
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .map_err(|err| EventError::Database(err.into()))?;

    let Some(row) = row else {
        return Err(EventError::NotFound);
    };

    let event = EventRow::from_row(&row);
    ensure_owner(ResourceKind::Event, event.id, event.user_id, actor_id)?;
    Ok(event)
}

async fn list_for_user(pool: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<EventRow>> {
    let query = r"
        SELECT id, user_id, title, description, starts_at, ends_at, created_at
        FROM events
        WHERE user_id = $1
        ORDER BY starts_at
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(user_id)
        .fetch_all(pool)
        .instrument(span)
        .await?;

    Ok(rows.iter().map(EventRow::from_row).collect())
}

async fn insert_event(
    pool: &PgPool,
    user_id: Uuid,
    title: &str,
    request: &CreateEventRequest,
) -> anyhow::Result<EventRow> {
    let query = r"
        INSERT INTO events (user_id, title, description, starts_at, ends_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, title, description, starts_at, ends_at, created_at
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .bind(title)
        .bind(request.description.as_deref())
        .bind(request.starts_at)
        .bind(request.ends_at)
        .fetch_one(pool)
        .instrument(span)
        .await?;

    Ok(EventRow::from_row(&row))
}

async fn apply_update(
    pool: &PgPool,
    id: Uuid,
    title: &str,
    description: Option<&str>,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
) -> anyhow::Result<EventRow> {
    let query = r"
        UPDATE events
        SET title = $2, description = $3, starts_at = $4, ends_at = $5
        WHERE id = $1
        RETURNING id, user_id, title, description, starts_at, ends_at, created_at
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(starts_at)
        .bind(ends_at)
        .fetch_one(pool)
        .instrument(span)
        .await?;

    Ok(EventRow::from_row(&row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn window_must_end_after_start() {
        assert!(validate_window(at(100), at(200)).is_ok());
        assert!(validate_window(at(200), at(200)).is_err());
        assert!(validate_window(at(300), at(200)).is_err());
    }

    #[test]
    fn title_bounds() {
        assert!(validate_title("Standup").is_ok());
        assert!(validate_title("").is_err());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LENGTH + 1)).is_err());
    }

    #[test]
    fn update_request_tells_null_from_absent_description() {
        let explicit: UpdateEventRequest =
            serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(explicit.description, Some(None));

        let set: UpdateEventRequest =
            serde_json::from_str(r#"{"description": "standup notes"}"#).unwrap();
        assert_eq!(set.description, Some(Some("standup notes".to_string())));

        let absent: UpdateEventRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.description, None);
    }

    #[test]
    fn event_response_is_camel_case() {
        let response = EventResponse {
            id: "id".to_string(),
            title: "Standup".to_string(),
            description: None,
            starts_at: at(100),
            ends_at: at(200),
            created_at: at(50),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("startsAt").is_some());
        assert!(value.get("endsAt").is_some());
        assert!(value.get("createdAt").is_some());
    }
}
