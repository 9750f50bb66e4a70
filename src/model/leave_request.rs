use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, IntoStaticStr};
use utoipa::ToSchema;

/// Leave lifecycle. PENDING transitions exactly once, to APPROVED or
/// REJECTED.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 1000,
    "start_date": "2026-01-10",
    "end_date": "2026-01-12",
    "category": "sick",
    "sub_category": "flu",
    "reason": "Down with a fever",
    "status": "PENDING",
    "hr_id": null,
    "created_at": "2026-01-08T09:00:00Z"
}))]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1000)]
    pub employee_id: u64,

    /// Inclusive range.
    #[schema(example = "2026-01-10", value_type = String, format = "date")]
    pub start_date: NaiveDate,

    #[schema(example = "2026-01-12", value_type = String, format = "date")]
    pub end_date: NaiveDate,

    /// Free-form classification, not validated against a fixed catalog.
    #[schema(example = "sick")]
    pub category: String,

    #[schema(example = "flu", nullable = true)]
    pub sub_category: Option<String>,

    #[schema(example = "Down with a fever")]
    pub reason: String,

    pub status: LeaveStatus,

    /// HR who resolved the request. Set on approval or rejection.
    #[schema(example = 7, nullable = true)]
    pub hr_id: Option<u64>,

    #[schema(example = "2026-01-08T09:00:00Z", format = "date-time", value_type = String, nullable = true)]
    pub created_at: Option<DateTime<Utc>>,
}
