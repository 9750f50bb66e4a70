use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, IntoStaticStr};
use utoipa::ToSchema;

/// Daily attendance status. PRESENT, LATE and HALF_DAY are derived from the
/// check-in time or the worked duration; ABSENT, LEAVE, WORK_FROM_HOME and
/// HOLIDAY are asserted by HR or by leave approval.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Late,
    HalfDay,
    Absent,
    Leave,
    WorkFromHome,
    Holiday,
}

/// One attendance observation per (employee, date). The attendance table
/// carries a unique key on that pair; the stores surface violations as
/// duplicate-record errors.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 1000,
    "hr_id": 7,
    "date": "2026-01-05",
    "status": "PRESENT",
    "check_in": "09:30:00",
    "check_out": "18:00:00",
    "total_hours": 8.5
}))]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1000)]
    pub employee_id: u64,

    /// HR who marked the record. Falls back to the employee's assigned HR
    /// when no marking HR is given explicitly.
    #[schema(example = 7, nullable = true)]
    pub hr_id: Option<u64>,

    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub date: NaiveDate,

    pub status: AttendanceStatus,

    /// Absent for HR-marked LEAVE/ABSENT/HOLIDAY rows.
    #[schema(example = "09:30:00", value_type = String, nullable = true)]
    pub check_in: Option<NaiveTime>,

    /// Set exactly once, at checkout. Never before check_in.
    #[schema(example = "18:00:00", value_type = String, nullable = true)]
    pub check_out: Option<NaiveTime>,

    /// Worked hours between check-in and check-out, rounded half-up to two
    /// decimals at checkout.
    #[schema(example = 8.5, nullable = true)]
    pub total_hours: Option<f64>,
}
