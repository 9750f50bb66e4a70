use crate::api::attendance::{
    CheckoutBody, MarkAttendanceBody, PerformanceQuery, SummaryQuery,
};
use crate::api::leave_request::{ApplyLeaveBody, DecideQuery, LeaveFilter, LeaveListResponse};
use crate::api::timesheet::{
    ExportCompanyBody, ExportEmployeeBody, ExportTeamBody, TeamSummaryQuery, TimesheetQuery,
};
use crate::engine::aggregate::{MonthlySummary, PerformanceMetric, TeamSummary, TimesheetRow};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Operations API",
        version = "1.0.0",
        description = r#"
## HR Operations Backend

This API powers the attendance and leave reconciliation engine of an HR
operations system.

### 🔹 Key Features
- **Attendance**
  - HR-marked attendance with time-based status derivation
  - Daily checkout with worked-hours computation
- **Leave**
  - Apply, approve and reject leave requests
  - Approved leaves backfill LEAVE attendance days automatically
- **Timesheets & Reporting**
  - Employee, team and company timesheets with CSV export
  - Monthly summaries, team roll-ups and trailing performance metrics

### 📦 Response Format
- JSON-based RESTful responses
- CSV attachments for timesheet exports

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::mark_attendance,
        crate::api::attendance::checkout,
        crate::api::attendance::today_status,
        crate::api::attendance::attendance_history,
        crate::api::attendance::monthly_summary,
        crate::api::attendance::performance,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::leave_list,

        crate::api::timesheet::employee_timesheet,
        crate::api::timesheet::team_timesheet,
        crate::api::timesheet::company_timesheet,
        crate::api::timesheet::team_summary,
        crate::api::timesheet::export_employee_timesheet,
        crate::api::timesheet::export_team_timesheet,
        crate::api::timesheet::export_company_timesheet
    ),
    components(
        schemas(
            AttendanceRecord,
            AttendanceStatus,
            MarkAttendanceBody,
            CheckoutBody,
            SummaryQuery,
            PerformanceQuery,
            MonthlySummary,
            PerformanceMetric,
            LeaveRequest,
            LeaveStatus,
            ApplyLeaveBody,
            DecideQuery,
            LeaveFilter,
            LeaveListResponse,
            TimesheetQuery,
            TeamSummaryQuery,
            TimesheetRow,
            TeamSummary,
            ExportEmployeeBody,
            ExportTeamBody,
            ExportCompanyBody
        )
    ),
    tags(
        (name = "Attendance", description = "Attendance marking, checkout and summaries"),
        (name = "Leave", description = "Leave application and resolution"),
        (name = "Timesheet", description = "Timesheet views, roll-ups and CSV export"),
    )
)]
pub struct ApiDoc;
