// Notification inbox routes: list + mark-read.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use aria_contracts::delivery::NotificationRecord;
use aria_storage::NotificationRow;

use crate::common::ListResponse;
use crate::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/users/:user_id/notifications", get(list_notifications))
        .route(
            "/v1/users/:user_id/notifications/:id/read",
            post(mark_read),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ListNotificationsParams {
    #[serde(default)]
    unread_only: bool,
}

fn to_record(row: NotificationRow) -> NotificationRecord {
    NotificationRecord {
        id: row.id,
        user_id: row.user_id,
        notification_type: row.notification_type,
        title: row.title,
        message: row.message,
        link: row.link,
        metadata: row.metadata,
        created_at: row.created_at,
        read_at: row.read_at,
    }
}

/// GET /v1/users/{user_id}/notifications
#[utoipa::path(
    get,
    path = "/v1/users/{user_id}/notifications",
    params(
        ("user_id" = String, Path, description = "User ID"),
        ("unread_only" = Option<bool>, Query, description = "Only return unread notifications"),
    ),
    responses((status = 200, description = "Notifications for the user", body = ListResponse<NotificationRecord>)),
    tag = "notifications"
)]
async fn list_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<ListNotificationsParams>,
) -> Result<Json<ListResponse<NotificationRecord>>, StatusCode> {
    let rows = state
        .db
        .list_notifications_for_user(&user_id, params.unread_only)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(rows.into_iter().map(to_record).collect::<Vec<_>>().into()))
}

/// POST /v1/users/{user_id}/notifications/{id}/read
#[utoipa::path(
    post,
    path = "/v1/users/{user_id}/notifications/{id}/read",
    params(
        ("user_id" = String, Path, description = "User ID"),
        ("id" = Uuid, Path, description = "Notification ID"),
    ),
    responses(
        (status = 204, description = "Marked read"),
        (status = 404, description = "Not found or already read"),
    ),
    tag = "notifications"
)]
async fn mark_read(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(String, Uuid)>,
) -> StatusCode {
    match state.db.mark_notification_read(id, &user_id).await {
        Ok(true) => StatusCode::NO_CONTENT,
        Ok(false) => StatusCode::NOT_FOUND,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
