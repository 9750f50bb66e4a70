use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::engine::aggregate::AggregationEngine;
use crate::engine::reconcile::{MarkAttendance, ReconciliationEngine};
use crate::error::HrError;
use crate::model::attendance::AttendanceStatus;

#[derive(Deserialize, ToSchema)]
pub struct MarkAttendanceBody {
    #[schema(example = 1000)]
    pub employee_id: u64,
    /// Marking HR; defaults to the employee's assigned HR.
    #[schema(example = 7, nullable = true)]
    pub hr_id: Option<u64>,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    /// Explicit status assertion; omitted for time-based derivation.
    #[schema(example = "WORK_FROM_HOME", nullable = true)]
    pub status: Option<AttendanceStatus>,
    #[schema(example = "09:30:00", value_type = String, nullable = true)]
    pub check_in: Option<NaiveTime>,
}

#[derive(Deserialize, ToSchema)]
pub struct CheckoutBody {
    #[schema(example = 1000)]
    pub employee_id: u64,
    /// Explicit checkout time. If omitted, the current server time is used.
    #[schema(example = "18:00:00", value_type = String, nullable = true)]
    pub checkout_time: Option<NaiveTime>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct SummaryQuery {
    /// Calendar month, 1-12
    #[param(example = 1)]
    pub month: u32,
    #[param(example = 2026)]
    pub year: i32,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PerformanceQuery {
    /// Trailing calendar months to report, newest month inclusive
    #[param(example = 6)]
    pub months: Option<u32>,
}

/// Mark attendance for an employee
#[utoipa::path(
    post,
    path = "/api/v1/attendance",
    request_body = MarkAttendanceBody,
    responses(
        (status = 200, description = "Attendance marked", body = crate::model::attendance::AttendanceRecord),
        (status = 400, description = "Future date", body = Object, example = json!({
            "message": "future attendance is not allowed"
        })),
        (status = 404, description = "Employee or HR not found"),
        (status = 409, description = "Attendance already marked for this date"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    engine: web::Data<ReconciliationEngine>,
    payload: web::Json<MarkAttendanceBody>,
) -> Result<HttpResponse, HrError> {
    let body = payload.into_inner();
    let record = engine
        .mark_attendance(MarkAttendance {
            employee_id: body.employee_id,
            hr_id: body.hr_id,
            date: body.date,
            status: body.status,
            check_in: body.check_in,
        })
        .await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Check out for today
#[utoipa::path(
    put,
    path = "/api/v1/attendance",
    request_body = CheckoutBody,
    responses(
        (status = 200, description = "Checked out", body = crate::model::attendance::AttendanceRecord),
        (status = 400, description = "Not checked in, already checked out, or invalid time", body = Object, example = json!({
            "message": "employee has already checked out for today"
        })),
        (status = 404, description = "No attendance record for today"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn checkout(
    engine: web::Data<ReconciliationEngine>,
    payload: web::Json<CheckoutBody>,
) -> Result<HttpResponse, HrError> {
    let record = engine
        .checkout(payload.employee_id, payload.checkout_time)
        .await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Today's attendance record, if any
#[utoipa::path(
    get,
    path = "/api/v1/attendance/today/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Today's record", body = crate::model::attendance::AttendanceRecord),
        (status = 204, description = "No record for today"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn today_status(
    engine: web::Data<ReconciliationEngine>,
    path: web::Path<u64>,
) -> Result<HttpResponse, HrError> {
    match engine.today_status(path.into_inner()).await? {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        None => Ok(HttpResponse::NoContent().finish()),
    }
}

/// Full attendance history for an employee, newest first
#[utoipa::path(
    get,
    path = "/api/v1/attendance/employee/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Attendance records", body = [crate::model::attendance::AttendanceRecord]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn attendance_history(
    engine: web::Data<ReconciliationEngine>,
    path: web::Path<u64>,
) -> Result<HttpResponse, HrError> {
    let records = engine.attendance_for_employee(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(records))
}

/// Monthly attendance summary
#[utoipa::path(
    get,
    path = "/api/v1/attendance/summary/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        SummaryQuery
    ),
    responses(
        (status = 200, description = "Monthly summary", body = crate::engine::aggregate::MonthlySummary),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn monthly_summary(
    aggregation: web::Data<AggregationEngine>,
    path: web::Path<u64>,
    query: web::Query<SummaryQuery>,
) -> Result<HttpResponse, HrError> {
    let summary = aggregation
        .monthly_summary(path.into_inner(), query.month, query.year)
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Trailing-month performance metrics
#[utoipa::path(
    get,
    path = "/api/v1/attendance/performance/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        PerformanceQuery
    ),
    responses(
        (status = 200, description = "Per-month metrics, oldest first", body = [crate::engine::aggregate::PerformanceMetric]),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn performance(
    aggregation: web::Data<AggregationEngine>,
    path: web::Path<u64>,
    query: web::Query<PerformanceQuery>,
) -> Result<HttpResponse, HrError> {
    let metrics = aggregation
        .performance(path.into_inner(), query.months.unwrap_or(6))
        .await?;
    Ok(HttpResponse::Ok().json(metrics))
}
