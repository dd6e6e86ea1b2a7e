//! The weekly low-lecture report.
//!
//! These two routes keep the report's own response shape (`success`,
//! `message`, `members`, `debug`) instead of the `{ data, meta }` envelope.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tutordesk_core::{FlaggedMember, WeeklyReport};

use crate::middleware::RequestId;

use super::{map_compliance_error, ApiError, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ReportDebug {
    total_users_processed: i32,
    week_start: DateTime<Utc>,
    week_end: DateTime<Utc>,
    members_with_low_lectures: i32,
}

#[derive(Debug, Serialize)]
pub(super) struct LowLectureReportResponse {
    success: bool,
    message: String,
    members: Vec<FlaggedMember>,
    debug: ReportDebug,
    meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub(super) struct RemoveMemberResponse {
    success: bool,
    message: String,
    meta: ResponseMeta,
}

impl LowLectureReportResponse {
    fn from_report(report: WeeklyReport, meta: ResponseMeta) -> Self {
        let message = report.summary_message();
        Self {
            success: true,
            message,
            debug: ReportDebug {
                total_users_processed: report.total_users_processed,
                week_start: report.week_start,
                week_end: report.week_end,
                members_with_low_lectures: report.members_with_low_lectures,
            },
            members: report.members,
            meta,
        }
    }
}

pub(super) async fn get_low_lecture_members(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<LowLectureReportResponse>, ApiError> {
    let report = tutordesk_compliance::current_report(&state.pool, Utc::now(), state.calendar)
        .await
        .map_err(|e| map_compliance_error(req_id.0.clone(), &e))?;

    Ok(Json(LowLectureReportResponse::from_report(
        report,
        ResponseMeta::new(req_id.0),
    )))
}

pub(super) async fn remove_low_lecture_member(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(member_id): Path<String>,
) -> Result<Json<RemoveMemberResponse>, ApiError> {
    tutordesk_compliance::remove_member(&state.pool, Utc::now(), state.calendar, &member_id)
        .await
        .map_err(|e| map_compliance_error(req_id.0.clone(), &e))?;

    Ok(Json(RemoveMemberResponse {
        success: true,
        message: "Member removed from low lecture report".to_string(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn report_response_uses_camel_case_debug_block() {
        let start = Utc.with_ymd_and_hms(2026, 10, 9, 21, 0, 0).unwrap();
        let report = WeeklyReport {
            id: 1,
            week_start: start,
            week_end: start + chrono::Duration::days(7) - chrono::Duration::milliseconds(1),
            members: Vec::new(),
            total_users_processed: 4,
            members_with_low_lectures: 0,
            created_at: start,
            updated_at: start,
        };

        let response =
            LowLectureReportResponse::from_report(report, ResponseMeta::new("req-1".to_string()));
        let json = serde_json::to_value(&response).expect("serialize");

        assert_eq!(json["success"], true);
        assert_eq!(
            json["message"],
            "All members meet the minimum weekly lecture requirements"
        );
        assert_eq!(json["debug"]["totalUsersProcessed"], 4);
        assert_eq!(json["debug"]["membersWithLowLectures"], 0);
        assert!(json["debug"]["weekStart"].is_string());
        assert!(json["members"].as_array().is_some_and(Vec::is_empty));
        assert_eq!(json["meta"]["request_id"], "req-1");
    }
}
