//! HTTP handlers for reports

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use shared::DateRange;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, Permission};
use crate::services::reporting::ReportFilter;
use crate::services::ReportingService;
use crate::AppState;

/// Payroll for a date range as JSON or CSV
pub async fn get_payroll_report(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ReportFilter>,
) -> AppResult<Response> {
    user.require(Permission::View)?;
    let range = DateRange::resolve(query.start, query.end, state.config.schedule.today());
    let report = ReportingService::new(state.db).payroll(range).await?;

    if query.wants_csv() {
        let csv = ReportingService::export_to_csv(&report.lines)?;
        let disposition = format!(
            "attachment; filename=\"payroll_{}_{}.csv\"",
            report.start, report.end
        );
        Ok((
            [(header::CONTENT_TYPE, "text/csv".to_string()), (header::CONTENT_DISPOSITION, disposition)],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(report).into_response())
    }
}
