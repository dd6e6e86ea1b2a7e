use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct ComplianceRunsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct ComplianceRunItem {
    compliance_run_id: Uuid,
    mode: String,
    trigger_source: String,
    status: String,
    week_start: Option<DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    members_flagged: i32,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<tutordesk_db::ComplianceRunRow> for ComplianceRunItem {
    fn from(row: tutordesk_db::ComplianceRunRow) -> Self {
        Self {
            compliance_run_id: row.public_id,
            mode: row.mode,
            trigger_source: row.trigger_source,
            status: row.status,
            week_start: row.week_start,
            started_at: row.started_at,
            completed_at: row.completed_at,
            members_flagged: row.records_processed,
            error_message: row.error_message,
            created_at: row.created_at,
        }
    }
}

pub(super) async fn list_compliance_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ComplianceRunsQuery>,
) -> Result<Json<ApiResponse<Vec<ComplianceRunItem>>>, ApiError> {
    let rows = tutordesk_db::list_compliance_runs(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(ComplianceRunItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::ComplianceRunItem;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn compliance_run_item_is_serializable() {
        let item = ComplianceRunItem {
            compliance_run_id: Uuid::new_v4(),
            mode: "scheduled".to_string(),
            trigger_source: "scheduler".to_string(),
            status: "succeeded".to_string(),
            week_start: Some(Utc::now()),
            started_at: Some(Utc::now()),
            completed_at: Some(Utc::now()),
            members_flagged: 3,
            error_message: None,
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(item).expect("serialize");
        assert_eq!(value["mode"], "scheduled");
        assert_eq!(value["members_flagged"], 3);
        assert!(value["error_message"].is_null());
    }
}
