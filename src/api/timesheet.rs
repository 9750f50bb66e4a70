use actix_web::http::header;
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::engine::aggregate::{AggregationEngine, TimesheetRow};
use crate::error::HrError;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct TimesheetQuery {
    #[param(example = "2026-01-01")]
    pub start_date: NaiveDate,
    #[param(example = "2026-01-31")]
    pub end_date: NaiveDate,
    /// Status filter; accepts UI aliases like "on-time" or "half day"
    #[param(example = "on-time")]
    pub status: Option<String>,
    /// Narrow team/company views to one employee
    #[param(example = 1000)]
    pub employee_id: Option<u64>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct TeamSummaryQuery {
    #[param(example = "2026-01-05")]
    pub date: NaiveDate,
}

#[derive(Deserialize, ToSchema)]
pub struct ExportEmployeeBody {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-31", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "on-time", nullable = true)]
    pub status: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ExportTeamBody {
    #[schema(example = 7)]
    pub hr_id: u64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-31", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "late", nullable = true)]
    pub status: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ExportCompanyBody {
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-31", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "absent", nullable = true)]
    pub status: Option<String>,
}

const CSV_HEADER: [&str; 8] = [
    "Employee ID",
    "Employee Name",
    "Reporting HR",
    "Date",
    "Check-in Time",
    "Checkout Time",
    "Working Hours",
    "Status",
];

fn build_csv(rows: &[TimesheetRow]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for row in rows {
        writer.write_record([
            row.employee_id.to_string(),
            row.employee_name.clone(),
            row.hr_id.map(|id| id.to_string()).unwrap_or_default(),
            row.date.to_string(),
            row.check_in.map(|t| t.to_string()).unwrap_or_default(),
            row.check_out.map(|t| t.to_string()).unwrap_or_default(),
            row.working_hours
                .map(|h| format!("{h:.2}"))
                .unwrap_or_default(),
            row.status.clone(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

fn csv_response(rows: &[TimesheetRow], filename: &str) -> Result<HttpResponse, actix_web::Error> {
    let bytes = build_csv(rows).map_err(|e| {
        error!(error = %e, filename, "failed to build CSV export");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok()
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ))
        .content_type("text/csv; charset=utf-8")
        .body(bytes))
}

/// Blank status filters mean "no filter", matching the UI's empty dropdown.
fn status_filter(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// One employee's timesheet rows for a date range
#[utoipa::path(
    get,
    path = "/api/v1/timesheet/employee/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        TimesheetQuery
    ),
    responses(
        (status = 200, description = "Timesheet rows, newest date first", body = [TimesheetRow]),
        (status = 400, description = "Invalid date range"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Timesheet"
)]
pub async fn employee_timesheet(
    aggregation: web::Data<AggregationEngine>,
    path: web::Path<u64>,
    query: web::Query<TimesheetQuery>,
) -> Result<HttpResponse, HrError> {
    let rows = aggregation
        .employee_timesheet(
            path.into_inner(),
            query.start_date,
            query.end_date,
            status_filter(query.status.as_deref()),
        )
        .await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Timesheet rows for all records marked by one HR
#[utoipa::path(
    get,
    path = "/api/v1/timesheet/team/{hr_id}",
    params(
        ("hr_id" = u64, Path, description = "HR ID"),
        TimesheetQuery
    ),
    responses(
        (status = 200, description = "Timesheet rows, newest date first then employee name", body = [TimesheetRow]),
        (status = 400, description = "Invalid date range"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Timesheet"
)]
pub async fn team_timesheet(
    aggregation: web::Data<AggregationEngine>,
    path: web::Path<u64>,
    query: web::Query<TimesheetQuery>,
) -> Result<HttpResponse, HrError> {
    let rows = aggregation
        .team_timesheet(
            path.into_inner(),
            query.start_date,
            query.end_date,
            status_filter(query.status.as_deref()),
            query.employee_id,
        )
        .await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Company-wide timesheet rows
#[utoipa::path(
    get,
    path = "/api/v1/timesheet/company",
    params(TimesheetQuery),
    responses(
        (status = 200, description = "Timesheet rows, newest date first then employee name", body = [TimesheetRow]),
        (status = 400, description = "Invalid date range"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Timesheet"
)]
pub async fn company_timesheet(
    aggregation: web::Data<AggregationEngine>,
    query: web::Query<TimesheetQuery>,
) -> Result<HttpResponse, HrError> {
    let rows = aggregation
        .company_timesheet(
            query.start_date,
            query.end_date,
            status_filter(query.status.as_deref()),
            query.employee_id,
        )
        .await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Single-date roll-up for one HR's team
#[utoipa::path(
    get,
    path = "/api/v1/timesheet/team/summary/{hr_id}",
    params(
        ("hr_id" = u64, Path, description = "HR ID"),
        TeamSummaryQuery
    ),
    responses(
        (status = 200, description = "Team summary", body = crate::engine::aggregate::TeamSummary),
        (status = 500, description = "Internal server error")
    ),
    tag = "Timesheet"
)]
pub async fn team_summary(
    aggregation: web::Data<AggregationEngine>,
    path: web::Path<u64>,
    query: web::Query<TeamSummaryQuery>,
) -> Result<HttpResponse, HrError> {
    let summary = aggregation
        .team_summary(path.into_inner(), query.date)
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Export one employee's timesheet as CSV
#[utoipa::path(
    post,
    path = "/api/v1/timesheet/export",
    request_body = ExportEmployeeBody,
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv"),
        (status = 400, description = "Invalid date range"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Timesheet"
)]
pub async fn export_employee_timesheet(
    aggregation: web::Data<AggregationEngine>,
    payload: web::Json<ExportEmployeeBody>,
) -> Result<HttpResponse, actix_web::Error> {
    let rows = aggregation
        .employee_timesheet(
            payload.employee_id,
            payload.start_date,
            payload.end_date,
            status_filter(payload.status.as_deref()),
        )
        .await?;
    csv_response(&rows, "timesheet_employee.csv")
}

/// Export a team timesheet as CSV
#[utoipa::path(
    post,
    path = "/api/v1/timesheet/team/export",
    request_body = ExportTeamBody,
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv"),
        (status = 400, description = "Invalid date range"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Timesheet"
)]
pub async fn export_team_timesheet(
    aggregation: web::Data<AggregationEngine>,
    payload: web::Json<ExportTeamBody>,
) -> Result<HttpResponse, actix_web::Error> {
    let rows = aggregation
        .team_timesheet(
            payload.hr_id,
            payload.start_date,
            payload.end_date,
            status_filter(payload.status.as_deref()),
            None,
        )
        .await?;
    csv_response(&rows, "timesheet_team.csv")
}

/// Export the company timesheet as CSV
#[utoipa::path(
    post,
    path = "/api/v1/timesheet/company/export",
    request_body = ExportCompanyBody,
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv"),
        (status = 400, description = "Invalid date range"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Timesheet"
)]
pub async fn export_company_timesheet(
    aggregation: web::Data<AggregationEngine>,
    payload: web::Json<ExportCompanyBody>,
) -> Result<HttpResponse, actix_web::Error> {
    let rows = aggregation
        .company_timesheet(
            payload.start_date,
            payload.end_date,
            status_filter(payload.status.as_deref()),
            None,
        )
        .await?;
    csv_response(&rows, "timesheet_company.csv")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn csv_has_the_fixed_header_and_blank_cells_for_missing_values() {
        let rows = vec![
            TimesheetRow {
                employee_id: 1000,
                employee_name: "John Doe".into(),
                hr_id: Some(7),
                hr_name: Some("Jane Smith".into()),
                date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
                check_in: NaiveTime::from_hms_opt(9, 30, 0),
                check_out: NaiveTime::from_hms_opt(18, 0, 0),
                working_hours: Some(8.5),
                status: "PRESENT".into(),
            },
            TimesheetRow {
                employee_id: 1001,
                employee_name: "Alice".into(),
                hr_id: None,
                hr_name: None,
                date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
                check_in: None,
                check_out: None,
                working_hours: None,
                status: "LEAVE".into(),
            },
        ];

        let bytes = build_csv(&rows).unwrap();
        let csv = String::from_utf8(bytes).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next().unwrap(),
            "Employee ID,Employee Name,Reporting HR,Date,Check-in Time,Checkout Time,Working Hours,Status"
        );
        assert_eq!(
            lines.next().unwrap(),
            "1000,John Doe,7,2026-01-05,09:30:00,18:00:00,8.50,PRESENT"
        );
        assert_eq!(lines.next().unwrap(), "1001,Alice,,2026-01-05,,,,LEAVE");
    }

    #[test]
    fn blank_status_filters_are_dropped() {
        assert_eq!(status_filter(Some("  ")), None);
        assert_eq!(status_filter(Some("late")), Some("late"));
        assert_eq!(status_filter(None), None);
    }
}
