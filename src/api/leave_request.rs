use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::engine::reconcile::{ApplyLeave, LeaveDecision, ReconciliationEngine};
use crate::error::HrError;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::store::LeaveQuery;

#[derive(Deserialize, ToSchema)]
pub struct ApplyLeaveBody {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2026-01-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-12", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "sick")]
    pub category: String,
    #[schema(example = "flu", nullable = true)]
    pub sub_category: Option<String>,
    #[schema(example = "Down with a fever")]
    pub reason: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct DecideQuery {
    /// HR resolving the request
    #[param(example = 7)]
    pub hr_id: u64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by employee ID
    #[param(example = 1000)]
    pub employee_id: Option<u64>,
    /// Filter by leave status
    #[param(example = "PENDING")]
    pub status: Option<LeaveStatus>,
    /// Pagination page number (start with 1)
    #[param(example = 1)]
    pub page: Option<u64>,
    /// Pagination per page number
    #[param(example = 10)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/// Apply for leave
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body = ApplyLeaveBody,
    responses(
        (status = 200, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Invalid date range", body = Object, example = json!({
            "message": "start_date cannot be after end_date"
        })),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    engine: web::Data<ReconciliationEngine>,
    payload: web::Json<ApplyLeaveBody>,
) -> Result<HttpResponse, HrError> {
    let body = payload.into_inner();
    let leave = engine
        .apply_leave(ApplyLeave {
            employee_id: body.employee_id,
            start_date: body.start_date,
            end_date: body.end_date,
            category: body.category,
            sub_category: body.sub_category,
            reason: body.reason,
        })
        .await?;
    Ok(HttpResponse::Ok().json(leave))
}

/// Approve a pending leave; backfills LEAVE attendance for uncovered days
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve"),
        DecideQuery
    ),
    responses(
        (status = 200, description = "Leave approved", body = LeaveRequest),
        (status = 400, description = "Already processed", body = Object, example = json!({
            "message": "leave request already processed"
        })),
        (status = 404, description = "Leave request or HR not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    engine: web::Data<ReconciliationEngine>,
    path: web::Path<u64>,
    query: web::Query<DecideQuery>,
) -> Result<HttpResponse, HrError> {
    let leave = engine
        .decide_leave(path.into_inner(), LeaveDecision::Approve, query.hr_id)
        .await?;
    Ok(HttpResponse::Ok().json(leave))
}

/// Reject a pending leave
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject"),
        DecideQuery
    ),
    responses(
        (status = 200, description = "Leave rejected", body = LeaveRequest),
        (status = 400, description = "Already processed"),
        (status = 404, description = "Leave request or HR not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    engine: web::Data<ReconciliationEngine>,
    path: web::Path<u64>,
    query: web::Query<DecideQuery>,
) -> Result<HttpResponse, HrError> {
    let leave = engine
        .decide_leave(path.into_inner(), LeaveDecision::Reject, query.hr_id)
        .await?;
    Ok(HttpResponse::Ok().json(leave))
}

/// Fetch one leave request
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    engine: web::Data<ReconciliationEngine>,
    path: web::Path<u64>,
) -> Result<HttpResponse, HrError> {
    let leave = engine
        .leave(path.into_inner())
        .await?
        .ok_or(HrError::NotFound("Leave request"))?;
    Ok(HttpResponse::Ok().json(leave))
}

/// Paginated leave list with optional employee/status filters
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    engine: web::Data<ReconciliationEngine>,
    query: web::Query<LeaveFilter>,
) -> Result<HttpResponse, HrError> {
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);

    let (data, total) = engine
        .list_leaves(&LeaveQuery {
            employee_id: query.employee_id,
            status: query.status,
            page,
            per_page,
        })
        .await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}
