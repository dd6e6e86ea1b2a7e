use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    map_db_error, map_lookup_error, parse_uuid, ApiError, ApiResponse, AppState, ResponseMeta,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct NotificationItem {
    id: Uuid,
    #[serde(rename = "type")]
    kind: String,
    message: String,
    student_email: Option<String>,
    subject: Option<String>,
    min_lectures: Option<i32>,
    current_lectures: Option<i32>,
    link: Option<String>,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl From<tutordesk_db::NotificationRow> for NotificationItem {
    fn from(row: tutordesk_db::NotificationRow) -> Self {
        Self {
            id: row.id,
            kind: row.kind,
            message: row.message,
            student_email: row.student_email,
            subject: row.subject,
            min_lectures: row.min_lectures,
            current_lectures: row.current_lectures,
            link: row.link,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct MarkReadData {
    updated: u64,
}

#[derive(Debug, Serialize)]
pub(super) struct DeletedData {
    deleted: Uuid,
}

async fn resolve_volunteer(
    state: &AppState,
    req_id: &str,
    raw_id: &str,
) -> Result<Uuid, ApiError> {
    let volunteer_id = parse_uuid(req_id, raw_id, "volunteer id")?;
    tutordesk_db::get_volunteer(&state.pool, volunteer_id)
        .await
        .map_err(|e| map_lookup_error(req_id.to_string(), &e, "volunteer"))?;
    Ok(volunteer_id)
}

pub(super) async fn list_notifications(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<NotificationItem>>>, ApiError> {
    let volunteer_id = resolve_volunteer(&state, &req_id.0, &id).await?;

    let rows = tutordesk_db::list_notifications(&state.pool, volunteer_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(NotificationItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn mark_notifications_read(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MarkReadData>>, ApiError> {
    let volunteer_id = resolve_volunteer(&state, &req_id.0, &id).await?;

    let updated = tutordesk_db::mark_all_notifications_read(&state.pool, volunteer_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: MarkReadData { updated },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn delete_notification(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((id, notification_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<DeletedData>>, ApiError> {
    let volunteer_id = parse_uuid(&req_id.0, &id, "volunteer id")?;
    let notification_id = parse_uuid(&req_id.0, &notification_id, "notification id")?;

    tutordesk_db::delete_notification(&state.pool, volunteer_id, notification_id)
        .await
        .map_err(|e| map_lookup_error(req_id.0.clone(), &e, "notification"))?;

    Ok(Json(ApiResponse {
        data: DeletedData {
            deleted: notification_id,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
