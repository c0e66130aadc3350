//! Label CRUD. Same fetch-then-check shape as events.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, PgPool, Row};
use std::sync::Arc;
use tracing::{error, Instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::handlers::auth::{principal::require_auth, state::AuthState};
use crate::api::handlers::auth::utils::is_unique_violation;
use crate::api::ownership::{ensure_owner, OwnershipError, ResourceKind};

const MAX_NAME_LENGTH: usize = 60;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CreateLabelRequest {
    pub name: String,
    pub color: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UpdateLabelRequest {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LabelResponse {
    pub id: String,
    pub name: String,
    pub color: String,
}

struct LabelRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    color: String,
}

impl LabelRow {
    fn from_row(row: &PgRow) -> Self {
        Self {
            id: row.get("id"),
            user_id: row.get("user_id"),
            name: row.get("name"),
            color: row.get("color"),
        }
    }

    fn into_response_body(self) -> LabelResponse {
        LabelResponse {
            id: self.id.to_string(),
            name: self.name,
            color: self.color,
        }
    }
}

enum LabelError {
    Ownership(OwnershipError),
    NotFound,
    Conflict,
    Validation(&'static str),
    Database(anyhow::Error),
}

impl From<OwnershipError> for LabelError {
    fn from(err: OwnershipError) -> Self {
        Self::Ownership(err)
    }
}

impl IntoResponse for LabelError {
    fn into_response(self) -> Response {
        match self {
            Self::Ownership(err) => err.into_response(),
            Self::NotFound => (StatusCode::NOT_FOUND, "Label not found".to_string()).into_response(),
            Self::Conflict => {
                (StatusCode::CONFLICT, "Label name already in use".to_string()).into_response()
            }
            Self::Validation(message) => {
                (StatusCode::BAD_REQUEST, message.to_string()).into_response()
            }
            Self::Database(err) => {
                error!("label storage error: {err:#}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

fn validate_name(name: &str) -> Result<(), LabelError> {
    if name.is_empty() {
        return Err(LabelError::Validation("Name must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(LabelError::Validation("Name is too long"));
    }
    Ok(())
}

fn validate_color(color: &str) -> Result<(), LabelError> {
    let ok = Regex::new(r"^#[0-9a-fA-F]{6}$").is_ok_and(|regex| regex.is_match(color));
    if ok {
        Ok(())
    } else {
        Err(LabelError::Validation("Color must be a #rrggbb value"))
    }
}

#[utoipa::path(
    get,
    path = "/v1/labels",
    responses(
        (status = 200, description = "Labels owned by the caller", body = [LabelResponse]),
        (status = 401, description = "Not authenticated")
    ),
    tag = "labels"
)]
pub async fn list_labels(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool, &auth_state).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    let query = "SELECT id, user_id, name, color FROM labels WHERE user_id = $1 ORDER BY name";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    match sqlx::query(query)
        .bind(principal.user_id)
        .fetch_all(&pool.0)
        .instrument(span)
        .await
    {
        Ok(rows) => {
            let body: Vec<LabelResponse> = rows
                .iter()
                .map(LabelRow::from_row)
                .map(LabelRow::into_response_body)
                .collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => LabelError::Database(err.into()).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/labels",
    request_body = CreateLabelRequest,
    responses(
        (status = 201, description = "Label created", body = LabelResponse),
        (status = 400, description = "Invalid name or color", body = String),
        (status = 401, description = "Not authenticated"),
        (status = 409, description = "Label name already in use", body = String)
    ),
    tag = "labels"
)]
pub async fn create_label(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<CreateLabelRequest>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool, &auth_state).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    let request: CreateLabelRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let name = request.name.trim().to_string();
    if let Err(err) = validate_name(&name) {
        return err.into_response();
    }
    if let Err(err) = validate_color(&request.color) {
        return err.into_response();
    }

    let query = r"
        INSERT INTO labels (user_id, name, color)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, name, color
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    match sqlx::query(query)
        .bind(principal.user_id)
        .bind(&name)
        .bind(&request.color)
        .fetch_one(&pool.0)
        .instrument(span)
        .await
    {
        Ok(row) => {
            let label = LabelRow::from_row(&row);
            (StatusCode::CREATED, Json(label.into_response_body())).into_response()
        }
        Err(err) if is_unique_violation(&err) => LabelError::Conflict.into_response(),
        Err(err) => LabelError::Database(err.into()).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/v1/labels/{id}",
    params(("id" = Uuid, Path, description = "Label id")),
    responses(
        (status = 200, description = "The label", body = LabelResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Label belongs to another user"),
        (status = 404, description = "Label not found")
    ),
    tag = "labels"
)]
pub async fn get_label(
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
        Ok(label) => (StatusCode::OK, Json(label.into_response_body())).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    patch,
    path = "/v1/labels/{id}",
    params(("id" = Uuid, Path, description = "Label id")),
    request_body = UpdateLabelRequest,
    responses(
        (status = 200, description = "Updated label", body = LabelResponse),
        (status = 400, description = "Invalid name or color", body = String),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Label belongs to another user"),
        (status = 404, description = "Label not found")
    ),
    tag = "labels"
)]
pub async fn update_label(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Path(id): Path<Uuid>,
    payload: Option<Json<UpdateLabelRequest>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool, &auth_state).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    let request: UpdateLabelRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let current = match fetch_owned(&pool, id, principal.user_id).await {
        Ok(label) => label,
        Err(err) => return err.into_response(),
    };

    let name = match request.name {
        Some(name) => {
            let name = name.trim().to_string();
            if let Err(err) = validate_name(&name) {
                return err.into_response();
            }
            name
        }
        None => current.name.clone(),
    };
    let color = match request.color {
        Some(color) => {
            if let Err(err) = validate_color(&color) {
                return err.into_response();
            }
            color
        }
        None => current.color.clone(),
    };

    let query = r"
        UPDATE labels
        SET name = $2, color = $3
        WHERE id = $1
        RETURNING id, user_id, name, color
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    match sqlx::query(query)
        .bind(id)
        .bind(&name)
        .bind(&color)
        .fetch_one(&pool.0)
        .instrument(span)
        .await
    {
        Ok(row) => {
            let label = LabelRow::from_row(&row);
            (StatusCode::OK, Json(label.into_response_body())).into_response()
        }
        Err(err) if is_unique_violation(&err) => LabelError::Conflict.into_response(),
        Err(err) => LabelError::Database(err.into()).into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/v1/labels/{id}",
    params(("id" = Uuid, Path, description = "Label id")),
    responses(
        (status = 204, description = "Label deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Label belongs to another user"),
        (status = 404, description = "Label not found")
    ),
    tag = "labels"
)]
pub async fn delete_label(
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

    let query = "DELETE FROM labels WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    match sqlx::query(query).bind(id).execute(&pool.0).instrument(span).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => LabelError::Database(err.into()).into_response(),
    }
}

async fn fetch_owned(pool: &PgPool, id: Uuid, actor_id: Uuid) -> Result<LabelRow, LabelError> {
    let query = "SELECT id, user_id, name, color FROM labels WHERE id = $1";
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
        .map_err(|err| LabelError::Database(err.into()))?;

    let Some(row) = row else {
        return Err(LabelError::NotFound);
    };

    let label = LabelRow::from_row(&row);
    ensure_owner(ResourceKind::Label, label.id, label.user_id, actor_id)?;
    Ok(label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_bounds() {
        assert!(validate_name("work").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn color_must_be_hex_rgb() {
        assert!(validate_color("#aabbcc").is_ok());
        assert!(validate_color("#AABBCC").is_ok());
        assert!(validate_color("aabbcc").is_err());
        assert!(validate_color("#abc").is_err());
        assert!(validate_color("#gghhii").is_err());
    }
}
